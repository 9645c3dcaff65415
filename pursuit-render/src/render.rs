use crate::text::render_text_pixmap;
use ab_glyph::FontVec;
use anyhow::{anyhow, bail, Result};
use pursuit_core::{LookaheadDot, ScreenPoint, Trail};
use pursuit_timing::Timer;
use std::collections::HashMap;
use std::time::Duration;
use tiny_skia::{
    Color, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

const BACKGROUND: [u8; 4] = [30, 30, 30, 255];
const INTAKE_BACKGROUND: [u8; 4] = [20, 20, 20, 255];
const TRAIL_COLOR: [u8; 4] = [100, 200, 250, 255];
const AXIS_COLOR: [u8; 4] = [80, 80, 80, 255];
const LOOKAHEAD_RGB: [u8; 3] = [150, 200, 250];
pub const TARGET_COLOR: [u8; 4] = [220, 50, 50, 255];
pub const CURSOR_COLOR: [u8; 4] = [255, 230, 50, 255];
const HUD_COLOR: [u8; 4] = [200, 200, 200, 255];
const HINT_COLOR: [u8; 4] = [150, 150, 150, 255];
const FIELD_COLOR: [u8; 4] = [200, 200, 200, 255];
const ACTIVE_FIELD_COLOR: [u8; 4] = [255, 255, 0, 255];

const TARGET_RADIUS: f32 = 10.0;
const CURSOR_RADIUS: f32 = 6.0;
const LOOKAHEAD_RADIUS: f32 = 3.0;
const TRAIL_WIDTH: f32 = 2.0;
const HUD_SIZE: f32 = 16.0;
const FORM_SIZE: f32 = 28.0;

pub const TRACKING_HINT: &str = "SPACE: pause  C: clear trail  ESC or close window: quit";
pub const INTAKE_HINT: &str = "TAB = switch fields   ENTER = start";

/// Everything drawn in one tracking frame.
pub struct TrackingScene<'a> {
    pub trail: &'a Trail,
    pub lookahead: &'a [LookaheadDot],
    pub target: ScreenPoint,
    pub cursor: Option<ScreenPoint>,
    pub axis_y: i32,
    pub hud: Option<&'a str>,
    pub paused: bool,
}

/// One row of the participant-info form.
pub struct FormField<'a> {
    pub label: &'a str,
    pub value: &'a str,
    pub active: bool,
}

pub struct FrameStats {
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
}

fn paint(color: [u8; 4]) -> Paint<'static> {
    let mut p = Paint::default();
    p.set_color_rgba8(color[0], color[1], color[2], color[3]);
    p.anti_alias = true;
    p
}

type LabelKey = (String, u32, [u8; 4]);

fn label_key(text: &str, size: f32, color: [u8; 4]) -> LabelKey {
    (text.to_string(), size.to_bits(), color)
}

fn cached_label<'a>(
    cache: &'a mut HashMap<LabelKey, Pixmap>,
    font: Option<&FontVec>,
    text: &str,
    size: f32,
    color: [u8; 4],
) -> Option<&'a Pixmap> {
    let font = font?;
    let key = label_key(text, size, color);
    if !cache.contains_key(&key) {
        let pm = render_text_pixmap(text, size, font, color)?;
        cache.insert(key.clone(), pm);
    }
    cache.get(&key)
}

/// Software renderer for the tracking task and intake form.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    canvas: Pixmap,
    font: Option<FontVec>,
    // Labels that never change, rendered once per size and colour.
    label_cache: HashMap<LabelKey, Pixmap>,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, font: Option<FontVec>) -> Result<Self> {
        let canvas = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("invalid canvas size {}x{}", width, height))?;
        Ok(Self {
            width,
            height,
            canvas,
            font,
            label_cache: HashMap::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("invalid canvas size {}x{}", width, height))?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn clear(&mut self, color: [u8; 4]) {
        self.canvas
            .fill(Color::from_rgba8(color[0], color[1], color[2], color[3]));
    }

    fn fill_circle(&mut self, center: ScreenPoint, radius: f32, color: [u8; 4]) {
        if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius) {
            self.canvas.fill_path(
                &path,
                &paint(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    fn stroke_polyline<'p>(
        &mut self,
        points: impl Iterator<Item = &'p ScreenPoint>,
        width: f32,
        color: [u8; 4],
    ) {
        let mut pb = PathBuilder::new();
        let mut count = 0;
        for p in points {
            if count == 0 {
                pb.move_to(p.x as f32, p.y as f32);
            } else {
                pb.line_to(p.x as f32, p.y as f32);
            }
            count += 1;
        }
        if count < 2 {
            return;
        }
        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width,
                ..Stroke::default()
            };
            self.canvas
                .stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
        }
    }

    fn draw_text(&mut self, text: &str, size: f32, color: [u8; 4], x: i32, y: i32) {
        let Some(font) = &self.font else {
            return;
        };
        if let Some(pm) = render_text_pixmap(text, size, font, color) {
            self.canvas.draw_pixmap(
                x,
                y,
                pm.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
    }

    fn draw_label(&mut self, text: &str, size: f32, color: [u8; 4], x: i32, y: i32) {
        let cached = cached_label(&mut self.label_cache, self.font.as_ref(), text, size, color);
        let Some(pm) = cached else {
            return;
        };
        self.canvas.draw_pixmap(
            x,
            y,
            pm.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    fn label_width(&mut self, text: &str, size: f32, color: [u8; 4]) -> u32 {
        cached_label(&mut self.label_cache, self.font.as_ref(), text, size, color)
            .map_or(0, |pm| pm.width())
    }

    /// Draws the tracking scene: lookahead first so the trail and target overlay it.
    pub fn draw_tracking(&mut self, scene: &TrackingScene) {
        self.clear(BACKGROUND);

        for dot in scene.lookahead.iter().filter(|d| d.alpha > 0) {
            let [r, g, b] = LOOKAHEAD_RGB;
            self.fill_circle(dot.point, LOOKAHEAD_RADIUS, [r, g, b, dot.alpha]);
        }

        self.stroke_polyline(scene.trail.iter(), TRAIL_WIDTH, TRAIL_COLOR);

        let axis = [
            ScreenPoint::new(0, scene.axis_y),
            ScreenPoint::new(self.width as i32, scene.axis_y),
        ];
        self.stroke_polyline(axis.iter(), 1.0, AXIS_COLOR);

        self.fill_circle(scene.target, TARGET_RADIUS, TARGET_COLOR);

        if let Some(cursor) = scene.cursor {
            self.fill_circle(cursor, CURSOR_RADIUS, CURSOR_COLOR);
        }

        if let Some(hud) = scene.hud {
            self.draw_text(hud, HUD_SIZE, HUD_COLOR, 10, 10);
        }
        if scene.paused {
            let w = self.label_width("PAUSED", FORM_SIZE, HUD_COLOR) as i32;
            let x = (self.width as i32 - w) / 2;
            self.draw_label("PAUSED", FORM_SIZE, HUD_COLOR, x, 40);
        }
        self.draw_label(TRACKING_HINT, HUD_SIZE, HINT_COLOR, 10, self.height as i32 - 24);
    }

    /// Draws the participant-info form with the active field highlighted.
    pub fn draw_intake(&mut self, fields: &[FormField]) {
        self.clear(INTAKE_BACKGROUND);

        let title = "Enter Participant Info";
        let w = self.label_width(title, FORM_SIZE, [255, 255, 255, 255]) as i32;
        let x = (self.width as i32 - w) / 2;
        self.draw_label(title, FORM_SIZE, [255, 255, 255, 255], x, 80);

        let mut y = 180;
        for field in fields {
            let color = if field.active {
                ACTIVE_FIELD_COLOR
            } else {
                FIELD_COLOR
            };
            let line = format!("{}: {}", field.label, field.value);
            self.draw_text(&line, FORM_SIZE, color, 200, y);
            if field.active && !self.has_font() {
                // Without text, mark the active row so the form is still navigable.
                self.fill_circle(ScreenPoint::new(180, y + 12), 5.0, color);
            }
            y += 60;
        }

        self.draw_label(INTAKE_HINT, FORM_SIZE, HINT_COLOR, 200, y + 20);
    }

    /// Copies the canvas into an RGBA frame buffer of the same size.
    pub fn present(&self, frame_buffer: &mut [u8]) -> Result<()> {
        let src = self.canvas.data();
        if frame_buffer.len() != src.len() {
            bail!(
                "frame buffer is {} bytes, canvas is {} bytes",
                frame_buffer.len(),
                src.len()
            );
        }
        frame_buffer.copy_from_slice(src);
        Ok(())
    }

    /// Draws and presents a tracking frame, timing each stage with `timer`.
    pub fn render_frame<T: Timer>(
        &mut self,
        scene: &TrackingScene,
        frame_buffer: &mut [u8],
        timer: &T,
    ) -> Result<FrameStats> {
        let t_draw = {
            let t = timer.now();
            self.draw_tracking(scene);
            timer.elapsed(t)
        };
        let t_copy = {
            let t = timer.now();
            self.present(frame_buffer)?;
            timer.elapsed(t)
        };
        Ok(FrameStats {
            draw: t_draw,
            copy: t_copy,
            total: t_draw + t_copy,
        })
    }
}
