use anyhow::{anyhow, Context};
use gfx_hal::{
    adapter, buffer as b, command, format as f, image as i, pass, pool,
    prelude::*,
    pso,
    queue::{family::QueueFamilyId, Submission},
    window, Backend, IndexType,
};

use std::borrow::Borrow;
use std::iter;
use std::mem::ManuallyDrop;
use std::ptr;

mod buffer;
mod memory;
mod pipeline;
pub mod shader;
mod swapchain;
pub mod vertex;

use crate::config::AppConfig;
use crate::debug::{DebugHook, DebugMessage, DebugSeverity, DebugSource, DebugType};
use crate::frame::FrameClock;
use buffer::Buffer;
use memory::Memory;
use pipeline::Pipeline;
use shader::{ShaderStage, FRAGMENT_SHADER_SOURCE, VERTEX_SHADER_SOURCE};
use swapchain::Swapchain;
use vertex::{Vertex, INDICES, TRIANGLE};

pub use swapchain::viewport_for;

/// Ids of the messages the renderer hands to its debug hook.
pub mod message_id {
    pub const SWAPCHAIN_REBUILT: u32 = 1;
    pub const ACQUIRE_FAILED: u32 = 2;
    pub const PRESENT_FAILED: u32 = 3;
}

pub struct Renderer<'a, B: Backend> {
    frame: usize,
    device: &'a B::Device,
    frames_in_flight: usize,
    clear_color: [f32; 4],
    clock: FrameClock,
    fps: fps_counter::FPSCounter,
    debug_hook: Option<DebugHook>,
    command_buffers: Vec<B::CommandBuffer>,
    submission_complete_semaphores: Vec<B::Semaphore>,
    submission_complete_fences: Vec<B::Fence>,
    framebuffers: Vec<Option<B::Framebuffer>>,
    command_pool: ManuallyDrop<B::CommandPool>,
    vertices: ManuallyDrop<Memory<'a, B, Vertex>>,
    indices: ManuallyDrop<Memory<'a, B, u32>>,
    swapchain: ManuallyDrop<Swapchain<'a, B>>,
    render_pass: ManuallyDrop<B::RenderPass>,
    pipeline: ManuallyDrop<Pipeline<'a, B>>,
}

impl<'a, B> Renderer<'a, B>
where
    B: Backend,
{
    pub fn new(
        surface: &'a mut B::Surface,
        adapter: &'a adapter::Adapter<B>,
        device: &'a B::Device,
        family: QueueFamilyId,
        config: &AppConfig,
    ) -> anyhow::Result<Self> {
        let vs_spirv = shader::compile(ShaderStage::Vertex, VERTEX_SHADER_SOURCE)?;
        let fs_spirv = shader::compile(ShaderStage::Fragment, FRAGMENT_SHADER_SOURCE)?;

        let memory_types = adapter.physical_device.memory_properties().memory_types;
        let limits = adapter.physical_device.limits();

        let vertex_buffer = Buffer::new(device, &TRIANGLE, b::Usage::VERTEX, &limits)?;
        let vertices = Memory::new(vertex_buffer, &memory_types).context("vertex upload failed")?;
        let index_buffer = Buffer::new(device, &INDICES, b::Usage::INDEX, &limits)?;
        let indices = Memory::new(index_buffer, &memory_types).context("index upload failed")?;

        let swapchain = Swapchain::new(device, surface, adapter, config.dims)?;
        let render_pass = Self::create_render_pass(device, swapchain.format)?;
        let pipeline = match Pipeline::new(device, &vs_spirv, &fs_spirv, &render_pass) {
            Ok(pipeline) => pipeline,
            Err(err) => {
                unsafe { device.destroy_render_pass(render_pass) };
                return Err(err);
            }
        };

        let frames_in_flight = config.frames_in_flight;
        let mut command_pool = Self::create_command_pool(device, family)?;
        let command_buffers = Self::allocate_command_buffers(&mut command_pool, frames_in_flight);
        let submission_complete_semaphores = Self::create_semaphores(device, frames_in_flight)?;
        let submission_complete_fences = Self::create_fences(device, frames_in_flight)?;

        log::info!(
            "renderer ready: {}x{}, {:?}, {} frames in flight",
            config.dims.width,
            config.dims.height,
            swapchain.format,
            frames_in_flight
        );

        Ok(Renderer {
            device,
            submission_complete_semaphores,
            submission_complete_fences,
            framebuffers: (0..frames_in_flight).map(|_| None).collect(),
            frames_in_flight,
            clear_color: config.clear_color,
            clock: FrameClock::start(),
            fps: fps_counter::FPSCounter::new(),
            debug_hook: None,
            command_pool: ManuallyDrop::new(command_pool),
            vertices: ManuallyDrop::new(vertices),
            indices: ManuallyDrop::new(indices),
            swapchain: ManuallyDrop::new(swapchain),
            render_pass: ManuallyDrop::new(render_pass),
            pipeline: ManuallyDrop::new(pipeline),
            command_buffers,
            frame: 0,
        })
    }

    pub fn set_debug_hook(&mut self, hook: DebugHook) {
        self.debug_hook = Some(hook);
    }

    pub fn viewport(&self) -> &pso::Viewport {
        &self.swapchain.viewport
    }

    /// Follows a window resize. The viewport takes the new size verbatim.
    pub fn resize(&mut self, dims: window::Extent2D) -> anyhow::Result<()> {
        self.wait_idle()?;
        self.swapchain.resize(dims)?;
        if !self.swapchain.is_empty() {
            self.emit(DebugMessage::new(
                DebugSource::WindowSystem,
                DebugType::Performance,
                DebugSeverity::Low,
                message_id::SWAPCHAIN_REBUILT,
                format!("swapchain rebuilt for {}x{}", dims.width, dims.height),
            ));
        }
        Ok(())
    }

    pub fn render(&mut self, queue: &mut B::CommandQueue) -> anyhow::Result<()> {
        if self.swapchain.is_empty() {
            return Ok(());
        }

        let frame_idx = self.frame % self.frames_in_flight;

        unsafe {
            let fence = &self.submission_complete_fences[frame_idx];
            self.device
                .wait_for_fence(fence, !0)
                .map_err(|e| anyhow!("can't wait for fence: {:?}", e))?;
            if let Some(framebuffer) = self.framebuffers[frame_idx].take() {
                self.device.destroy_framebuffer(framebuffer);
            }
        }

        let surface_image = match unsafe { self.swapchain.surface.acquire_image(!0) } {
            Ok((image, _)) => image,
            Err(err) => {
                self.emit(DebugMessage::new(
                    DebugSource::WindowSystem,
                    DebugType::Error,
                    DebugSeverity::Medium,
                    message_id::ACQUIRE_FAILED,
                    format!("acquire failed: {:?}", err),
                ));
                self.rebuild_swapchain()?;
                return Ok(());
            }
        };

        let extent = self.swapchain.extent;
        let framebuffer = unsafe {
            self.device.create_framebuffer(
                &self.render_pass,
                iter::once(Borrow::<B::ImageView>::borrow(&surface_image)),
                i::Extent {
                    width: extent.width,
                    height: extent.height,
                    depth: 1,
                },
            )
        }
        .map_err(|e| anyhow!("can't create framebuffer: {:?}", e))?;

        let render_area = viewport_for(extent).rect;
        let our_color = self.clock.our_color();
        let uniform = [
            our_color[0].to_bits(),
            our_color[1].to_bits(),
            our_color[2].to_bits(),
            our_color[3].to_bits(),
        ];

        let present = unsafe {
            self.device
                .reset_fence(&self.submission_complete_fences[frame_idx])
                .map_err(|e| anyhow!("can't reset fence: {:?}", e))?;

            let cmd_buffer = &mut self.command_buffers[frame_idx];
            cmd_buffer.reset(false);
            cmd_buffer.begin_primary(command::CommandBufferFlags::ONE_TIME_SUBMIT);
            cmd_buffer.set_viewports(0, &[self.swapchain.viewport.clone()]);
            cmd_buffer.set_scissors(0, &[render_area]);
            cmd_buffer.bind_graphics_pipeline(&self.pipeline.pipeline);
            cmd_buffer.bind_vertex_buffers(
                0,
                iter::once((&*self.vertices.buffer.buf, b::SubRange::WHOLE)),
            );
            cmd_buffer.bind_index_buffer(b::IndexBufferView {
                buffer: &*self.indices.buffer.buf,
                range: b::SubRange::WHOLE,
                index_type: IndexType::U32,
            });
            cmd_buffer.push_graphics_constants(
                &self.pipeline.pipeline_layout,
                pso::ShaderStageFlags::FRAGMENT,
                0,
                &uniform,
            );
            cmd_buffer.begin_render_pass(
                &self.render_pass,
                &framebuffer,
                render_area,
                &[command::ClearValue {
                    color: command::ClearColor {
                        float32: self.clear_color,
                    },
                }],
                command::SubpassContents::Inline,
            );
            cmd_buffer.draw_indexed(0..INDICES.len() as u32, 0, 0..1);
            cmd_buffer.end_render_pass();
            cmd_buffer.finish();

            let submission = Submission {
                command_buffers: iter::once(&*cmd_buffer),
                wait_semaphores: iter::empty::<(&B::Semaphore, pso::PipelineStage)>(),
                signal_semaphores: iter::once(&self.submission_complete_semaphores[frame_idx]),
            };

            queue.submit(
                submission,
                Some(&self.submission_complete_fences[frame_idx]),
            );

            queue.present_surface(
                &mut *self.swapchain.surface,
                surface_image,
                Some(&self.submission_complete_semaphores[frame_idx]),
            )
        };
        self.framebuffers[frame_idx] = Some(framebuffer);

        match present {
            Ok(None) => {}
            Ok(Some(_)) => self.rebuild_swapchain()?,
            Err(err) => {
                self.emit(DebugMessage::new(
                    DebugSource::WindowSystem,
                    DebugType::Error,
                    DebugSeverity::Medium,
                    message_id::PRESENT_FAILED,
                    format!("present failed: {:?}", err),
                ));
                self.rebuild_swapchain()?;
            }
        }

        log::trace!("fps: {}", self.fps.tick());
        self.frame += 1;
        Ok(())
    }

    fn rebuild_swapchain(&mut self) -> anyhow::Result<()> {
        self.wait_idle()?;
        self.swapchain.recreate()?;
        let extent = self.swapchain.extent;
        self.emit(DebugMessage::new(
            DebugSource::WindowSystem,
            DebugType::Performance,
            DebugSeverity::Low,
            message_id::SWAPCHAIN_REBUILT,
            format!("swapchain rebuilt for {}x{}", extent.width, extent.height),
        ));
        Ok(())
    }

    fn wait_idle(&self) -> anyhow::Result<()> {
        self.device
            .wait_idle()
            .map_err(|e| anyhow!("can't wait for device: {:?}", e))
    }

    fn emit(&mut self, message: DebugMessage) {
        log::debug!("{}: {}", message.source, message.text);
        if let Some(hook) = self.debug_hook.as_mut() {
            hook(&message);
        }
    }

    fn create_render_pass(device: &B::Device, format: f::Format) -> anyhow::Result<B::RenderPass> {
        let attachment = pass::Attachment {
            format: Some(format),
            samples: 1,
            ops: pass::AttachmentOps::new(
                pass::AttachmentLoadOp::Clear,
                pass::AttachmentStoreOp::Store,
            ),
            stencil_ops: pass::AttachmentOps::DONT_CARE,
            layouts: i::Layout::Undefined..i::Layout::Present,
        };

        let subpass = pass::SubpassDesc {
            colors: &[(0, i::Layout::ColorAttachmentOptimal)],
            depth_stencil: None,
            inputs: &[],
            resolves: &[],
            preserves: &[],
        };

        unsafe { device.create_render_pass(&[attachment], &[subpass], &[]) }
            .map_err(|e| anyhow!("can't create render pass: {:?}", e))
    }

    fn create_command_pool(device: &B::Device, family: QueueFamilyId) -> anyhow::Result<B::CommandPool> {
        unsafe { device.create_command_pool(family, pool::CommandPoolCreateFlags::RESET_INDIVIDUAL) }
            .map_err(|e| anyhow!("can't create command pool: {:?}", e))
    }

    fn allocate_command_buffers(
        command_pool: &mut B::CommandPool,
        frames_in_flight: usize,
    ) -> Vec<B::CommandBuffer> {
        (0..frames_in_flight)
            .map(|_| unsafe { command_pool.allocate_one(command::Level::Primary) })
            .collect()
    }

    fn create_semaphores(device: &B::Device, frames_in_flight: usize) -> anyhow::Result<Vec<B::Semaphore>> {
        (0..frames_in_flight)
            .map(|_| {
                device
                    .create_semaphore()
                    .map_err(|e| anyhow!("can't create semaphore: {:?}", e))
            })
            .collect()
    }

    fn create_fences(device: &B::Device, frames_in_flight: usize) -> anyhow::Result<Vec<B::Fence>> {
        (0..frames_in_flight)
            .map(|_| {
                device
                    .create_fence(true)
                    .map_err(|e| anyhow!("can't create fence: {:?}", e))
            })
            .collect()
    }
}

impl<'a, B: Backend> Drop for Renderer<'a, B> {
    fn drop(&mut self) {
        let device = self.device;
        if let Err(err) = device.wait_idle() {
            log::error!("device did not go idle before teardown: {:?}", err);
        }
        unsafe {
            for framebuffer in self.framebuffers.drain(..).flatten() {
                device.destroy_framebuffer(framebuffer);
            }
            ManuallyDrop::drop(&mut self.vertices);
            ManuallyDrop::drop(&mut self.indices);
            device.destroy_command_pool(ManuallyDrop::into_inner(ptr::read(&self.command_pool)));
            for s in self.submission_complete_semaphores.drain(..) {
                device.destroy_semaphore(s);
            }
            for f in self.submission_complete_fences.drain(..) {
                device.destroy_fence(f);
            }

            ManuallyDrop::drop(&mut self.pipeline);
            device.destroy_render_pass(ManuallyDrop::into_inner(ptr::read(&self.render_pass)));
            ManuallyDrop::drop(&mut self.swapchain);
        }
        log::debug!("renderer released after {} frames", self.frame);
    }
}
