use gfx_hal::window::Extent2D;
use winit::event::{ElementState, KeyboardInput, VirtualKeyCode, WindowEvent};

/// Window-side state shared between the event handler and the render loop.
#[derive(Debug, Default)]
pub struct WindowState {
    pub should_close: bool,
    resize: Option<Extent2D>,
}

impl WindowState {
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.should_close = true,
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        virtual_keycode,
                        state,
                        ..
                    },
                ..
            } => self.handle_key(*virtual_keycode, *state),
            WindowEvent::Resized(size) => {
                self.resize = Some(Extent2D {
                    width: size.width,
                    height: size.height,
                })
            }
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: Option<VirtualKeyCode>, state: ElementState) {
        if key == Some(VirtualKeyCode::Escape) && state == ElementState::Pressed {
            self.should_close = true;
        }
    }

    /// Latest size reported since the last call, if any.
    pub fn take_resize(&mut self) -> Option<Extent2D> {
        self.resize.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;

    #[test]
    fn escape_press_closes() {
        let mut state = WindowState::default();
        state.handle_key(Some(VirtualKeyCode::Escape), ElementState::Pressed);
        assert!(state.should_close);
    }

    #[test]
    fn other_keys_do_not_close() {
        let mut state = WindowState::default();
        for &key in &[
            VirtualKeyCode::Q,
            VirtualKeyCode::Space,
            VirtualKeyCode::Return,
            VirtualKeyCode::F4,
        ] {
            state.handle_key(Some(key), ElementState::Pressed);
        }
        state.handle_key(None, ElementState::Pressed);
        state.handle_key(Some(VirtualKeyCode::Escape), ElementState::Released);
        assert!(!state.should_close);
    }

    #[test]
    fn close_request_closes() {
        let mut state = WindowState::default();
        state.handle_event(&WindowEvent::CloseRequested);
        assert!(state.should_close);
    }

    #[test]
    fn resize_keeps_latest_size() {
        let mut state = WindowState::default();
        state.handle_event(&WindowEvent::Resized(PhysicalSize::new(1024, 768)));
        state.handle_event(&WindowEvent::Resized(PhysicalSize::new(640, 480)));
        let dims = state.take_resize().unwrap();
        assert_eq!((dims.width, dims.height), (640, 480));
        assert!(state.take_resize().is_none());
        assert!(!state.should_close);
    }
}
