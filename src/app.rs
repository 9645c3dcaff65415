use anyhow::{anyhow, Result};
use pixels::{Pixels, SurfaceTexture};
use pursuit_core::{Participant, TrackingEvent};
use pursuit_experiment::{
    FrameSample, IntakeField, IntakeForm, TrackingConfig, TrackingLog, TrackingSession,
};
use pursuit_render::{load_font, FormField, SkiaRenderer, TrackingScene, VideoRecorder};
use pursuit_timing::{FramePacer, FrameStatistics, HighPrecisionTimer, Timer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

enum Screen {
    Intake(IntakeForm),
    Tracking,
    Done,
}

/// What a windowed session leaves behind for the manifest.
pub struct GuiOutcome {
    pub participant: Option<Participant>,
    pub trials: usize,
    pub stats: FrameStatistics,
    /// A log write that failed mid-session. Rows before it are on disk.
    pub log_error: Option<anyhow::Error>,
}

/// Trials ended so far and how many of them ran their full duration.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct TrialTally {
    ended: usize,
    completed: usize,
}

impl TrialTally {
    /// Records the end of a trial and returns the index of the next one, if any.
    fn close(&mut self, completed: bool, stop: bool, num_runs: usize) -> Option<usize> {
        self.ended += 1;
        if completed {
            self.completed += 1;
        }
        (!stop && self.ended < num_runs).then_some(self.ended)
    }
}

pub struct App<'a> {
    config: TrackingConfig,
    font_path: Option<PathBuf>,
    fullscreen: bool,
    log: &'a mut TrackingLog,

    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    scale_factor: f64,
    refresh_rate: Option<f64>,

    screen: Screen,
    participant: Option<Participant>,
    session: Option<TrackingSession<HighPrecisionTimer>>,
    pacer: FramePacer,
    cursor: Option<(f64, f64)>,
    recorder: Option<VideoRecorder>,
    tally: TrialTally,
    quit_requested: bool,

    init_error: Option<anyhow::Error>,
    log_error: Option<anyhow::Error>,
    should_exit: bool,
}

impl<'a> App<'a> {
    pub fn new(
        config: TrackingConfig,
        participant: Option<Participant>,
        font_path: Option<PathBuf>,
        fullscreen: bool,
        log: &'a mut TrackingLog,
    ) -> Self {
        let pacer = FramePacer::new(config.fps, Instant::now());
        Self {
            config,
            font_path,
            fullscreen,
            log,
            window: None,
            pixels: None,
            renderer: None,
            scale_factor: 1.0,
            refresh_rate: None,
            screen: Screen::Intake(IntakeForm::new()),
            participant,
            session: None,
            pacer,
            cursor: None,
            recorder: None,
            tally: TrialTally::default(),
            quit_requested: false,
            init_error: None,
            log_error: None,
            should_exit: false,
        }
    }

    /// Runs the windowed session. Fails only if no window could be brought up.
    pub fn run(mut self) -> Result<GuiOutcome> {
        let event_loop = EventLoop::new()?;
        event_loop.run_app(&mut self)?;

        if let Some(e) = self.init_error.take() {
            return Err(e);
        }
        if let Some(rec) = self.recorder.take() {
            rec.finish();
        }
        Ok(GuiOutcome {
            participant: self.participant.take(),
            trials: self.tally.completed,
            stats: self
                .session
                .as_ref()
                .map(|s| s.timer.frame_stats())
                .unwrap_or_default(),
            log_error: self.log_error.take(),
        })
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());

        self.refresh_rate = monitor
            .as_ref()
            .and_then(|m| m.refresh_rate_millihertz())
            .map(|rate| rate as f64 / 1000.0);

        let mut window_attributes = Window::default_attributes()
            .with_title("Participant Info")
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(false);
        if self.fullscreen {
            let monitor = monitor.ok_or_else(|| anyhow!("No monitor available"))?;
            window_attributes =
                window_attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))));
        }

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.scale_factor = window.scale_factor();

        println!("Display Configuration:");
        println!(
            "  Physical size: {}×{}",
            physical_size.width, physical_size.height
        );
        println!("  Scale factor: {:.2}", self.scale_factor);
        if let Some(refresh_rate) = self.refresh_rate {
            println!("  Refresh rate: {:.1} Hz", refresh_rate);
        }

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);

        let font = load_font(self.font_path.as_deref());
        self.renderer = Some(SkiaRenderer::new(
            physical_size.width,
            physical_size.height,
            font,
        )?);

        self.window = Some(window);

        if let Some(participant) = self.participant.clone() {
            self.start_tracking(participant);
        }
        self.request_redraw();
        Ok(())
    }

    fn canvas_size(&self) -> (u32, u32) {
        self.renderer
            .as_ref()
            .map_or((self.config.width, self.config.height), |r| r.size())
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn start_tracking(&mut self, participant: Participant) {
        println!(
            "Participant {} ({}), age {}: {} trial(s) of {}s",
            participant.id,
            participant.name,
            participant.age,
            self.config.num_runs,
            self.config.duration_s
        );
        let (w, h) = self.canvas_size();
        self.session = Some(TrackingSession::new(
            &self.config,
            self.config.mapping_for(w, h),
            HighPrecisionTimer::new(),
            0,
        ));
        self.participant = Some(participant);
        self.screen = Screen::Tracking;
        self.open_recorder(0);
        self.pacer.reset(Instant::now());

        if let Some(window) = &self.window {
            window.set_title("Pursuit Tracking");
            window.set_cursor_visible(false);
        }
    }

    fn open_recorder(&mut self, trial: usize) {
        let (w, h) = self.canvas_size();
        self.recorder = self
            .config
            .video_path_for_trial(trial)
            .and_then(|path| VideoRecorder::open(&path, w, h, self.config.fps));
    }

    fn redraw(&mut self) {
        let result = match self.screen {
            Screen::Intake(_) => self.draw_intake(),
            Screen::Tracking => self.tick(),
            Screen::Done => Ok(()),
        };
        if let Err(e) = result {
            log::warn!("Render error: {:#}", e);
        }
    }

    fn draw_intake(&mut self) -> Result<()> {
        let Screen::Intake(form) = &self.screen else {
            return Ok(());
        };
        let (Some(pixels), Some(renderer)) = (&mut self.pixels, &mut self.renderer) else {
            return Ok(());
        };
        let fields: Vec<FormField> = IntakeField::ALL
            .iter()
            .map(|&field| FormField {
                label: field.label(),
                value: form.value(field),
                active: form.active() == field,
            })
            .collect();
        renderer.draw_intake(&fields);
        renderer.present(pixels.frame_mut())?;
        pixels.render()?;
        Ok(())
    }

    /// One tracking frame: advance, log, draw, capture.
    fn tick(&mut self) -> Result<()> {
        let now = Instant::now();
        let since_last = self.pacer.begin_frame(now);

        let (Some(session), Some(pixels), Some(renderer)) =
            (&mut self.session, &mut self.pixels, &mut self.renderer)
        else {
            return Ok(());
        };
        if let Some(dt) = since_last {
            session.timer.record_frame(dt);
        }

        let Some(frame) = session.update(self.cursor).cloned() else {
            return Ok(());
        };

        if session.should_log() {
            let participant = self.participant.as_ref().ok_or_else(|| anyhow!("no participant"))?;
            if let Some(record) = session.log_record(participant) {
                if let Err(e) = self.log.append(&record) {
                    log::error!("Stopping: {:#}", e);
                    self.log_error = Some(e);
                    self.quit_requested = true;
                    self.should_exit = true;
                }
            }
        }

        let fps = session.timer.frame_stats().effective_fps;
        let hud = hud_line(&frame, fps);
        let dots = session.lookahead_dots();
        let scene = TrackingScene {
            trail: session.trail(),
            lookahead: &dots,
            target: frame.target,
            cursor: frame.cursor,
            axis_y: session.mapping().center_y() as i32,
            hud: Some(&hud),
            paused: session.is_paused(),
        };
        let stats = renderer.render_frame(&scene, pixels.frame_mut(), &session.timer)?;
        log::trace!(
            "frame {}: draw {:.3}ms, copy {:.3}ms",
            frame.frame,
            stats.draw.as_secs_f64() * 1e3,
            stats.copy.as_secs_f64() * 1e3
        );

        if let Some(recorder) = &mut self.recorder {
            recorder.capture(pixels.frame());
        }
        pixels.render()?;

        if session.is_finished() {
            self.finish_trial();
        }
        Ok(())
    }

    fn finish_trial(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };
        if let Some(rec) = self.recorder.take() {
            rec.finish();
        }
        let completed = session.completed();
        if completed {
            println!("Trial {} finished", session.trial);
        } else {
            println!("Trial {} stopped early", session.trial);
        }

        let next = self.tally.close(completed, self.quit_requested, self.config.num_runs);
        match next {
            Some(trial) => {
                session.restart(trial);
                self.open_recorder(trial);
                self.pacer.reset(Instant::now());
            }
            None => self.cleanup_and_exit(),
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        match &mut self.screen {
            Screen::Intake(form) => {
                match code {
                    KeyCode::Tab => form.next_field(),
                    KeyCode::Backspace => form.backspace(),
                    KeyCode::Enter | KeyCode::NumpadEnter => {
                        if let Some(participant) = form.submit() {
                            self.start_tracking(participant);
                        }
                    }
                    KeyCode::Escape => self.cleanup_and_exit(),
                    _ => {
                        if let Some(text) = &event.text {
                            form.insert_text(text);
                        }
                    }
                }
                self.request_redraw();
            }
            Screen::Tracking => match code {
                KeyCode::Space => self.send(TrackingEvent::TogglePause),
                KeyCode::KeyC => self.send(TrackingEvent::ClearTrail),
                KeyCode::Escape => self.quit(),
                _ => {}
            },
            Screen::Done => {}
        }
    }

    fn send(&mut self, event: TrackingEvent) {
        if let Some(session) = &mut self.session {
            session.handle_event(event);
        }
    }

    /// Ends the current trial and skips the rest.
    fn quit(&mut self) {
        self.quit_requested = true;
        match self.screen {
            Screen::Tracking => {
                self.send(TrackingEvent::Quit);
                self.finish_trial();
            }
            _ => self.cleanup_and_exit(),
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                log::warn!("Failed to resize surface: {}", e);
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                log::warn!("Failed to resize buffer: {}", e);
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                log::warn!("Failed to resize canvas: {:#}", e);
            }
        }
        if let Some(session) = &mut self.session {
            session.set_mapping(self.config.mapping_for(new_size.width, new_size.height));
        }
        println!("Display resized to: {}×{}", new_size.width, new_size.height);
        self.request_redraw();
    }

    fn cleanup_and_exit(&mut self) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        self.screen = Screen::Done;
        println!(
            "\nSession completed: {} of {} trial(s) ran to the end, {} rows logged.",
            self.tally.completed,
            self.tally.ended,
            self.log.rows()
        );
        self.should_exit = true;
    }
}

fn hud_line(frame: &FrameSample, fps: f64) -> String {
    let mouse = match frame.cursor_units {
        Some((x, y)) => format!("({:.2}u,{:.2}u)", x, y),
        None => "(-,-)".to_string(),
    };
    format!(
        "t={:.2}s  x={:.2}u  y={:.2}u  mouse={}  FPS={:.0}",
        frame.sample.time, frame.target_units.0, frame.target_units.1, mouse, fps
    )
}

impl ApplicationHandler for App<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                log::error!("Failed to create window and surface: {:#}", e);
                self.init_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.quit(),
            WindowEvent::RedrawRequested => self.redraw(),
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                self.handle_key(&event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some((position.x, position.y));
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
        if self.should_exit {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
            return;
        }
        match self.screen {
            Screen::Tracking => {
                if self.pacer.is_due(Instant::now()) {
                    self.request_redraw();
                }
                event_loop.set_control_flow(ControlFlow::WaitUntil(self.pacer.next_deadline()));
            }
            _ => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pursuit_core::{ScreenPoint, Trajectory};

    #[test]
    fn test_hud_line_formats_units() {
        let frame = FrameSample {
            frame: 3,
            sample: Trajectory::new(1.0).sample(1.5),
            target: ScreenPoint::new(18, 500),
            target_units: (1.5, -2.25),
            cursor: Some(ScreenPoint::new(24, 512)),
            cursor_units: Some((2.0, 1.0)),
        };
        assert_eq!(
            hud_line(&frame, 29.7),
            "t=1.50s  x=1.50u  y=-2.25u  mouse=(2.00u,1.00u)  FPS=30"
        );
    }

    #[test]
    fn test_quit_trial_is_not_counted_as_completed() {
        let mut tally = TrialTally::default();
        assert_eq!(tally.close(true, false, 3), Some(1));
        assert_eq!(tally.close(false, true, 3), None);
        assert_eq!(tally.ended, 2);
        assert_eq!(tally.completed, 1);
    }

    #[test]
    fn test_tally_stops_after_last_run() {
        let mut tally = TrialTally::default();
        assert_eq!(tally.close(true, false, 2), Some(1));
        assert_eq!(tally.close(true, false, 2), None);
        assert_eq!(tally.completed, 2);
    }

    #[test]
    fn test_hud_line_without_cursor() {
        let frame = FrameSample {
            frame: 0,
            sample: Trajectory::new(1.0).sample(0.0),
            target: ScreenPoint::new(0, 500),
            target_units: (0.0, 0.0),
            cursor: None,
            cursor_units: None,
        };
        assert!(hud_line(&frame, 0.0).contains("mouse=(-,-)"));
    }
}
