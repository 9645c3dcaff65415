use ab_glyph::{point, Font, FontVec, Glyph, PxScale, ScaleFont};
use std::path::{Path, PathBuf};
use tiny_skia::{Pixmap, PremultipliedColorU8};

/// Places the HUD font is looked for when none is given explicitly.
const FONT_CANDIDATES: &[&str] = &[
    "assets/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Loads the font at `explicit`, or the first candidate that parses.
/// Returns `None` when no usable font exists; text is then skipped.
pub fn load_font(explicit: Option<&Path>) -> Option<FontVec> {
    let candidates: Vec<PathBuf> = match explicit {
        Some(p) => vec![p.to_path_buf()],
        None => FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
    };
    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                log::info!("Using font {}", path.display());
                return Some(font);
            }
            Err(e) => log::warn!("Ignoring font {}: {}", path.display(), e),
        }
    }
    log::warn!("No usable font found; on-screen text disabled");
    None
}

/// Rasterizes one line of text into a tight, premultiplied pixmap.
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: [u8; 4],
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    if outlines.is_empty() {
        return None;
    }

    // Line box: full ascent/descent height so lines of the same size align.
    let w = pen_x.ceil().max(1.0) as u32;
    let h = (sf.ascent() - sf.descent()).ceil().max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = x as i32 + b.min.x as i32;
            let iy = y as i32 + b.min.y as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            let a = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a * 255.0) as u8;
            // Overlapping glyph edges keep the stronger coverage.
            if sa <= dst[i].alpha() {
                return;
            }
            let premul = |c: u8| (c as f32 * a) as u8;
            if let Some(px) = PremultipliedColorU8::from_rgba(
                premul(color[0]),
                premul(color[1]),
                premul(color[2]),
                sa,
            ) {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}
