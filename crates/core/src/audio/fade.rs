use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

/// Linear volume ramp driven from the scheduler tick.
#[derive(Debug, Clone, Copy)]
pub struct ManualFade {
    direction: FadeDirection,
    start_wall_time: Instant,
    duration_seconds: f64,
}

impl ManualFade {
    pub fn new(direction: FadeDirection, start_wall_time: Instant, duration_seconds: f64) -> Self {
        Self {
            direction,
            start_wall_time,
            duration_seconds: duration_seconds.max(0.0),
        }
    }

    pub fn fade_in(now: Instant, duration_seconds: f64) -> Self {
        Self::new(FadeDirection::In, now, duration_seconds)
    }

    pub fn fade_out(now: Instant, duration_seconds: f64) -> Self {
        Self::new(FadeDirection::Out, now, duration_seconds)
    }

    pub fn direction(&self) -> FadeDirection {
        self.direction
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn elapsed(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.start_wall_time)
            .as_secs_f64()
    }

    /// Fraction of the fade completed, in `0.0..=1.0`.
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration_seconds <= 0.0 {
            return 1.0;
        }
        (self.elapsed(now) / self.duration_seconds).clamp(0.0, 1.0)
    }

    pub fn volume(&self, now: Instant) -> f32 {
        let progress = self.progress(now) as f32;
        match self.direction {
            FadeDirection::In => progress,
            FadeDirection::Out => 1.0 - progress,
        }
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.duration_seconds
    }

    pub fn terminal_volume(&self) -> f32 {
        match self.direction {
            FadeDirection::In => 1.0,
            FadeDirection::Out => 0.0,
        }
    }

    /// Push the start forward, used to skip time spent paused.
    pub fn delay(&mut self, by: std::time::Duration) {
        self.start_wall_time += by;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_fade_in_ramps_linearly() {
        let t0 = Instant::now();
        let fade = ManualFade::fade_in(t0, 2.0);

        assert_relative_eq!(fade.volume(t0), 0.0);
        assert_relative_eq!(fade.volume(t0 + Duration::from_millis(500)), 0.25);
        assert_relative_eq!(fade.volume(t0 + Duration::from_secs(1)), 0.5);
        assert_relative_eq!(fade.volume(t0 + Duration::from_secs(5)), 1.0);
    }

    #[test]
    fn test_fade_out_ramps_linearly() {
        let t0 = Instant::now();
        let fade = ManualFade::fade_out(t0, 2.0);

        assert_relative_eq!(fade.volume(t0), 1.0);
        assert_relative_eq!(fade.volume(t0 + Duration::from_secs(1)), 0.5);
        assert!(!fade.is_complete(t0 + Duration::from_millis(1999)));
        assert!(fade.is_complete(t0 + Duration::from_secs(2)));
        assert_eq!(fade.terminal_volume(), 0.0);
    }

    #[test]
    fn test_zero_duration_is_already_complete() {
        let t0 = Instant::now();
        let fade = ManualFade::fade_out(t0, 0.0);

        assert!(fade.is_complete(t0));
        assert_eq!(fade.volume(t0), 0.0);
    }

    #[test]
    fn test_delay_shifts_progress() {
        let t0 = Instant::now();
        let mut fade = ManualFade::fade_in(t0, 4.0);
        fade.delay(Duration::from_secs(2));

        assert_relative_eq!(fade.volume(t0 + Duration::from_secs(3)), 0.25);
    }
}
