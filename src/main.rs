#[cfg(feature = "metal")]
use gfx_backend_metal as back;

#[cfg(feature = "vulkan")]
use gfx_backend_vulkan as back;

use anyhow::anyhow;
use gfx_hal::{prelude::*, Backend, Features};
use std::process;
use winit::event::Event;
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::desktop::EventLoopExtDesktop;

use learn_triangle::{debug, input::WindowState, AppConfig, Renderer};

type Surface = <back::Backend as Backend>::Surface;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::default();
    let mut event_loop = EventLoop::new();
    let window = winit::window::WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(winit::dpi::Size::Physical(winit::dpi::PhysicalSize::new(
            config.dims.width,
            config.dims.height,
        )))
        .with_min_inner_size(winit::dpi::Size::Logical(winit::dpi::LogicalSize::new(
            config.min_size.0,
            config.min_size.1,
        )))
        .with_resizable(true)
        .build(&event_loop);
    let window = match window {
        Ok(window) => window,
        Err(err) => {
            println!("Failed to create window: {}", err);
            process::exit(-1);
        }
    };

    let code = match run(&config, &mut event_loop, &window) {
        Ok(()) => 0,
        Err(err) => {
            println!("{:#}", err);
            -1
        }
    };
    log::info!("exiting with code {}", code);
    process::exit(code);
}

fn run(
    config: &AppConfig,
    event_loop: &mut EventLoop<()>,
    window: &winit::window::Window,
) -> anyhow::Result<()> {
    let instance = back::Instance::create(&config.title, 1)
        .map_err(|e| anyhow!("Failed to initialize graphics backend: {:?}", e))?;
    let mut surface = unsafe { instance.create_surface(window) }
        .map_err(|e| anyhow!("Failed to initialize graphics backend: {:?}", e))?;

    let result = render_until_closed(config, event_loop, &instance, &mut surface);

    unsafe {
        instance.destroy_surface(surface);
    }
    result
}

fn render_until_closed(
    config: &AppConfig,
    event_loop: &mut EventLoop<()>,
    instance: &back::Instance,
    surface: &mut Surface,
) -> anyhow::Result<()> {
    let (adapter, family_index) = instance
        .enumerate_adapters()
        .into_iter()
        .find_map(|adapter| {
            let index = adapter.queue_families.iter().position(|family| {
                surface.supports_queue_family(family) && family.queue_type().supports_graphics()
            })?;
            Some((adapter, index))
        })
        .ok_or_else(|| anyhow!("Failed to initialize graphics backend: no adapter can draw to the window"))?;
    log::info!("using adapter {}", adapter.info.name);

    let family = &adapter.queue_families[family_index];
    let mut gpu = unsafe {
        adapter
            .physical_device
            .open(&[(family, &[1.0])], Features::empty())
    }
    .map_err(|e| anyhow!("Failed to initialize graphics backend: {:?}", e))?;

    let mut queue_group = gpu
        .queue_groups
        .pop()
        .ok_or_else(|| anyhow!("Failed to initialize graphics backend: no queue group"))?;
    let device = gpu.device;

    let mut renderer = Renderer::new(surface, &adapter, &device, queue_group.family, config)?;
    if log::log_enabled!(log::Level::Debug) {
        renderer.set_debug_hook(debug::stdout_hook());
    }

    let queue = &mut queue_group.queues[0];
    let mut state = WindowState::default();
    let mut failure = None;

    event_loop.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            Event::WindowEvent { event, .. } => state.handle_event(&event),
            Event::MainEventsCleared => {
                if let Err(err) = draw_frame(&mut renderer, queue, &mut state) {
                    failure = Some(err);
                    state.should_close = true;
                }
            }
            _ => {}
        }
        if state.should_close {
            *control_flow = ControlFlow::Exit;
        }
    });

    failure.map_or(Ok(()), Err)
}

fn draw_frame(
    renderer: &mut Renderer<back::Backend>,
    queue: &mut <back::Backend as Backend>::CommandQueue,
    state: &mut WindowState,
) -> anyhow::Result<()> {
    if let Some(dims) = state.take_resize() {
        renderer.resize(dims)?;
    }
    renderer.render(queue)
}
