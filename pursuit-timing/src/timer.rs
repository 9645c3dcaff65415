use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for the clocks driving the tracking loop
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    fn sleep(&self, d: Duration);
    fn record_frame(&mut self, d: Duration);
    fn frame_stats(&self) -> FrameStatistics;

    fn elapsed_secs(&self, ts: Self::Timestamp) -> f64 {
        self.elapsed(ts).as_secs_f64()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStatistics {
    pub frame_count: usize,
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

impl FrameStatistics {
    pub fn from_frame_times<'a>(frames: impl Iterator<Item = &'a Duration>) -> Self {
        let times: Vec<f64> = frames.map(|d| d.as_nanos() as f64).collect();
        if times.is_empty() {
            return Self::default();
        }
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            frame_count: times.len(),
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

/// Bounded window of recent frame durations.
#[derive(Debug, Clone)]
struct FrameWindow {
    times: VecDeque<Duration>,
    max_samples: usize,
}

impl FrameWindow {
    fn new(max_samples: usize) -> Self {
        Self {
            times: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    fn push(&mut self, d: Duration) {
        if self.times.len() >= self.max_samples {
            self.times.pop_front();
        }
        self.times.push_back(d);
    }

    fn stats(&self) -> FrameStatistics {
        FrameStatistics::from_frame_times(self.times.iter())
    }
}

/// Wall-clock timer with platform-specific sub-millisecond sleeps.
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    start: Instant,
    frames: FrameWindow,
}

impl Timer for HighPrecisionTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    fn sleep(&self, d: Duration) {
        platform::sleep(d)
    }
    fn record_frame(&mut self, d: Duration) {
        self.frames.push(d);
    }
    fn frame_stats(&self) -> FrameStatistics {
        self.frames.stats()
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frames: FrameWindow::new(1000),
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulated clock. `sleep` advances time instantly; clones share the clock.
#[derive(Debug, Clone)]
pub struct ManualTimer {
    now_ns: Arc<AtomicU64>,
    frames: FrameWindow,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self {
            now_ns: Arc::new(AtomicU64::new(0)),
            frames: FrameWindow::new(1000),
        }
    }

    pub fn advance(&self, d: Duration) {
        self.now_ns
            .fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for ManualTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
    fn record_frame(&mut self, d: Duration) {
        self.frames.push(d);
    }
    fn frame_stats(&self) -> FrameStatistics {
        self.frames.stats()
    }
}

/// OS sleeps accurate to well under a millisecond.
mod platform {
    use std::time::Duration;

    #[cfg(target_os = "linux")]
    pub(super) fn sleep(duration: Duration) {
        let mut deadline = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        unsafe {
            libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut deadline);
        }
        let nanos = deadline.tv_nsec as u64 + duration.subsec_nanos() as u64;
        deadline.tv_sec += (duration.as_secs() + nanos / 1_000_000_000) as libc::time_t;
        deadline.tv_nsec = (nanos % 1_000_000_000) as libc::c_long;

        // Absolute deadline: a signal-interrupted sleep resumes without drift.
        loop {
            let rc = unsafe {
                libc::clock_nanosleep(
                    libc::CLOCK_MONOTONIC,
                    libc::TIMER_ABSTIME,
                    &deadline,
                    std::ptr::null_mut(),
                )
            };
            if rc != libc::EINTR {
                break;
            }
        }
    }

    #[cfg(target_os = "macos")]
    pub(super) fn sleep(duration: Duration) {
        use mach2::mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t};

        const SPIN: Duration = Duration::from_micros(500);

        let now = || unsafe { mach_absolute_time() };
        let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
        unsafe {
            mach_timebase_info(&mut timebase);
        }
        let start = now();
        if timebase.numer == 0 {
            std::thread::sleep(duration);
            return;
        }
        let ticks = duration.as_nanos() as u64 * timebase.denom as u64 / timebase.numer as u64;

        // Coarse sleep, then spin out the last slice.
        if let Some(coarse) = duration.checked_sub(SPIN) {
            std::thread::sleep(coarse);
        }
        while now() - start < ticks {
            std::hint::spin_loop();
        }
    }

    #[cfg(target_os = "windows")]
    pub(super) fn sleep(duration: Duration) {
        use windows::core::PCWSTR;
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{
            CreateWaitableTimerW, SetWaitableTimer, WaitForSingleObject,
        };

        let Ok(timer) = (unsafe { CreateWaitableTimerW(None, true, PCWSTR::null()) }) else {
            std::thread::sleep(duration);
            return;
        };
        // Relative due time, in 100ns units.
        let due = -((duration.as_nanos() / 100) as i64);
        unsafe {
            if SetWaitableTimer(timer, &due, 0, None, None, false).is_ok() {
                WaitForSingleObject(timer, u32::MAX);
            } else {
                std::thread::sleep(duration);
            }
            let _ = CloseHandle(timer);
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    pub(super) fn sleep(duration: Duration) {
        std::thread::sleep(duration);
    }
}
