use gfx_hal::window::Extent2D;

/// Startup parameters. Defaults reproduce the LearnOpenGL window.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub dims: Extent2D,
    /// Smallest inner size the window may be resized to, in logical pixels.
    pub min_size: (f64, f64),
    pub frames_in_flight: usize,
    pub clear_color: [f32; 4],
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            title: "LearnOpenGL".to_owned(),
            dims: Extent2D {
                width: 800,
                height: 600,
            },
            min_size: (64.0, 64.0),
            frames_in_flight: 2,
            clear_color: [0.2, 0.3, 0.3, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.title, "LearnOpenGL");
        assert_eq!((config.dims.width, config.dims.height), (800, 600));
        assert_eq!(config.clear_color, [0.2, 0.3, 0.3, 1.0]);
        assert!(config.frames_in_flight > 0);
    }
}
