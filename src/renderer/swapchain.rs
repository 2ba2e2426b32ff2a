use anyhow::anyhow;
use gfx_hal::{adapter::Adapter, format as f, prelude::*, pso, window, Backend};

pub struct Swapchain<'a, B: Backend> {
    device: &'a B::Device,
    adapter: &'a Adapter<B>,
    pub viewport: pso::Viewport,
    /// Size last reported by the window.
    pub dims: window::Extent2D,
    /// Size the surface was actually configured with.
    pub extent: window::Extent2D,
    pub surface: &'a mut B::Surface,
    pub format: f::Format,
    configured: bool,
}

impl<'a, B: Backend> Swapchain<'a, B> {
    pub fn new(
        device: &'a B::Device,
        surface: &'a mut B::Surface,
        adapter: &'a Adapter<B>,
        dims: window::Extent2D,
    ) -> anyhow::Result<Self> {
        let formats = surface.supported_formats(&adapter.physical_device);
        let format = formats.map_or(f::Format::Rgba8Srgb, |formats| {
            formats
                .iter()
                .find(|format| format.base_format().1 == f::ChannelType::Srgb)
                .copied()
                .unwrap_or(formats[0])
        });

        let mut swapchain = Swapchain {
            device,
            surface,
            adapter,
            viewport: viewport_for(dims),
            format,
            dims,
            extent: dims,
            configured: false,
        };

        swapchain.recreate()?;
        Ok(swapchain)
    }

    /// Tracks a new window size. The viewport follows the reported size
    /// exactly; the surface is reconfigured unless the window is empty.
    pub fn resize(&mut self, dims: window::Extent2D) -> anyhow::Result<()> {
        self.dims = dims;
        self.viewport = viewport_for(dims);
        if self.is_empty() {
            return Ok(());
        }
        self.recreate()
    }

    pub fn is_empty(&self) -> bool {
        self.dims.width == 0 || self.dims.height == 0
    }

    pub fn recreate(&mut self) -> anyhow::Result<()> {
        let caps = self.surface.capabilities(&self.adapter.physical_device);

        let mut swap_config = window::SwapchainConfig::from_caps(&caps, self.format, self.dims);
        swap_config.present_mode = window::PresentMode::FIFO;
        let extent = swap_config.extent;
        unsafe {
            self.surface
                .configure_swapchain(self.device, swap_config)
                .map_err(|e| anyhow!("can't create swapchain: {:?}", e))?;
        }
        self.configured = true;
        self.extent = extent;
        log::debug!(
            "swapchain configured at {}x{} for window {}x{}",
            extent.width,
            extent.height,
            self.dims.width,
            self.dims.height
        );
        Ok(())
    }
}

/// Viewport covering exactly `dims`, with no aspect correction.
pub fn viewport_for(dims: window::Extent2D) -> pso::Viewport {
    pso::Viewport {
        rect: pso::Rect {
            x: 0,
            y: 0,
            w: dims.width as _,
            h: dims.height as _,
        },
        depth: 0.0..1.0,
    }
}

impl<'a, B: Backend> Drop for Swapchain<'a, B> {
    fn drop(&mut self) {
        if self.configured {
            unsafe { self.surface.unconfigure_swapchain(self.device) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_matches_reported_size() {
        for &(width, height) in &[(800, 600), (1920, 1080), (333, 1), (0, 0)] {
            let viewport = viewport_for(window::Extent2D { width, height });
            assert_eq!(viewport.rect.x, 0);
            assert_eq!(viewport.rect.y, 0);
            assert_eq!(viewport.rect.w as u32, width);
            assert_eq!(viewport.rect.h as u32, height);
        }
    }

    #[test]
    fn viewport_keeps_full_depth_range() {
        let viewport = viewport_for(window::Extent2D {
            width: 800,
            height: 600,
        });
        assert_eq!(viewport.depth, 0.0..1.0);
    }
}
