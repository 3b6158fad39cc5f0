//! Frame timing.

use std::time::{Duration, Instant};

/// Wall clock started at application launch.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the total elapsed time since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Seconds since start. This is the `time` value fed to the shaders.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame rate averaged over one reporting interval.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FpsSample {
    /// Frames per second over the interval.
    pub fps: f32,
    /// Average milliseconds per frame over the interval.
    pub frame_ms: f32,
}

/// Counts frames and yields an [`FpsSample`] once per interval.
#[derive(Debug)]
pub struct FpsCounter {
    interval: Duration,
    window_start: Instant,
    frames: u32,
}

impl FpsCounter {
    /// Creates a counter that reports every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_start: Instant::now(),
            frames: 0,
        }
    }

    /// Records one frame at the current time.
    pub fn frame(&mut self) -> Option<FpsSample> {
        self.frame_at(Instant::now())
    }

    /// Records one frame at `now`. Returns a sample when the interval has elapsed.
    pub fn frame_at(&mut self, now: Instant) -> Option<FpsSample> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }

        let secs = elapsed.as_secs_f32();
        let sample = FpsSample {
            fps: self.frames as f32 / secs,
            frame_ms: secs * 1000.0 / self.frames as f32,
        };
        self.frames = 0;
        self.window_start = now;
        Some(sample)
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_elapsed_is_monotonic() {
        let timer = Timer::new();
        let a = timer.elapsed_secs();
        let b = timer.elapsed_secs();
        assert!(b >= a);
    }

    #[test]
    fn test_fps_counter_reports_once_per_interval() {
        let mut counter = FpsCounter::new(Duration::from_secs(1));
        let start = counter.window_start;

        for i in 1..60 {
            assert!(counter.frame_at(start + Duration::from_millis(i * 16)).is_none());
        }

        let sample = counter
            .frame_at(start + Duration::from_secs(1))
            .expect("interval elapsed");
        assert!((sample.fps - 60.0).abs() < 0.01);
        assert!((sample.frame_ms - 1000.0 / 60.0).abs() < 0.01);

        // Window restarts after a report.
        assert!(counter.frame_at(start + Duration::from_millis(1500)).is_none());
    }
}
