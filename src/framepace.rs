use std::time::{Duration, Instant};

/// Frame timing with an optional fixed-framerate cap.
pub struct Framepacer {
    frame_start: Instant,
    last_frametime: f32,
    smoothed_frametime: f32,
}

impl Framepacer {
    pub fn new() -> Self {
        Self {
            frame_start: Instant::now(),
            last_frametime: 0.0,
            smoothed_frametime: 0.0,
        }
    }

    pub fn begin_frame(&mut self) {
        self.frame_start = Instant::now();
    }

    /// Sleeps out the remainder of the frame when a cap is set, then
    /// spins out the last fraction of a millisecond for accuracy.
    pub fn end_frame(&mut self, limit_frametime: f32) {
        if limit_frametime > f32::EPSILON && limit_frametime.is_finite() {
            const ACCURACY: f32 = 0.0001; // 100 microseconds
            let sleep_time = limit_frametime - self.frame_start.elapsed().as_secs_f32() - ACCURACY;

            if sleep_time > 0.0 {
                std::thread::sleep(Duration::from_secs_f32(sleep_time));

                while self.frame_start.elapsed().as_secs_f32() < limit_frametime {
                    std::thread::yield_now();
                }
            }
        }

        self.last_frametime = self.frame_start.elapsed().as_secs_f32();
        self.smoothed_frametime = if self.smoothed_frametime == 0.0 {
            self.last_frametime
        } else {
            self.smoothed_frametime * 0.95 + self.last_frametime * 0.05
        };
    }

    pub fn framerate(&self) -> f32 {
        if self.smoothed_frametime > 0.0 {
            1.0 / self.smoothed_frametime
        } else {
            0.0
        }
    }
}
