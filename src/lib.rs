//! A colored triangle on gfx-hal whose green channel follows `sin(t)`.

pub mod config;
pub mod debug;
pub mod frame;
pub mod input;
pub mod renderer;

pub use config::AppConfig;
pub use renderer::Renderer;
