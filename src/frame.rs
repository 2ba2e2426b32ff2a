use std::time::{Duration, Instant};

/// Elapsed time since the render loop started.
pub struct FrameClock {
    start: Instant,
}

impl FrameClock {
    pub fn start() -> Self {
        FrameClock {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn our_color(&self) -> [f32; 4] {
        our_color(self.elapsed().as_secs_f32())
    }
}

/// Oscillates through [0, 1] with a period of 2π seconds.
pub fn green_channel(seconds: f32) -> f32 {
    seconds.sin() / 2.0 + 0.5
}

pub fn our_color(seconds: f32) -> [f32; 4] {
    [0.5, green_channel(seconds), 0.0, 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn green_follows_sine() {
        for i in 0..2000 {
            let t = i as f32 * 0.037;
            let green = green_channel(t);
            assert!((green - (t.sin() / 2.0 + 0.5)).abs() < 1e-6);
            assert!(green >= 0.0 && green <= 1.0, "green {} at t={}", green, t);
        }
    }

    #[test]
    fn green_extremes() {
        assert!((green_channel(0.0) - 0.5).abs() < 1e-6);
        assert!((green_channel(PI / 2.0) - 1.0).abs() < 1e-6);
        assert!(green_channel(3.0 * PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn color_fixes_red_blue_alpha() {
        let color = our_color(12.5);
        assert_eq!(color[0], 0.5);
        assert_eq!(color[2], 0.0);
        assert_eq!(color[3], 1.0);
        assert_eq!(color[1], green_channel(12.5));
    }

    #[test]
    fn clock_moves_forward() {
        let clock = FrameClock::start();
        let first = clock.elapsed();
        std::thread::sleep(Duration::from_millis(2));
        assert!(clock.elapsed() > first);
    }
}
