use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use pursuit_core::{Lookahead, LookaheadDot, ScreenMapping, Trail, Trajectory};
use pursuit_render::{SkiaRenderer, TrackingScene};
use pursuit_timing::HighPrecisionTimer;

const WIDTH: u32 = 1500;
const HEIGHT: u32 = 1000;

fn harness() -> (SkiaRenderer, Trail, Vec<LookaheadDot>, Vec<u8>, HighPrecisionTimer) {
    let r = SkiaRenderer::new(WIDTH, HEIGHT, pursuit_render::load_font(None)).unwrap();
    let traj = Trajectory::new(10.0);
    let map = ScreenMapping::new(WIDTH, HEIGHT, 12.0, true);

    // Full trail, as seen after the first ~27 seconds at 30 fps.
    let mut trail = Trail::default();
    for i in 0..trail.capacity() {
        trail.push_wrapped(map.to_screen(&traj.sample(i as f64 / 30.0)), WIDTH);
    }
    let t = trail.capacity() as f64 / 30.0;
    let dots = Lookahead::default().dots(t, &traj, &map).collect();
    let fb = vec![0u8; (WIDTH * HEIGHT * 4) as usize];
    (r, trail, dots, fb, HighPrecisionTimer::new())
}

pub fn bench_tracking_frame(c: &mut Criterion) {
    let mut g = c.benchmark_group("render_frame");
    g.sample_size(40);

    g.bench_function("tracking_frame", |b| {
        b.iter_batched(
            harness,
            |(mut r, trail, dots, mut fb, timer)| {
                let scene = TrackingScene {
                    trail: &trail,
                    lookahead: &dots,
                    target: trail.last().copied().unwrap_or(pursuit_core::ScreenPoint::new(0, 500)),
                    cursor: Some(pursuit_core::ScreenPoint::new(700, 480)),
                    axis_y: (HEIGHT / 2) as i32,
                    hud: Some("t=26.67s  x=266.67u  y=3.21u  mouse=(58.33u,-1.67u)  FPS=30"),
                    paused: false,
                };
                let stats = r.render_frame(&scene, &mut fb, &timer);
                black_box(stats).ok();
            },
            BatchSize::SmallInput,
        )
    });

    g.finish();
}

criterion_group!(benches, bench_tracking_frame);
criterion_main!(benches);
