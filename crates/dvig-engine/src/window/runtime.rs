use anyhow::{Context, Result};

use crate::config::AppSpec;
use crate::core::{App, FrameDriver};
use crate::device::{GpuInit, WgpuBackend};
use crate::input::{InputContext, WinitPlatform};
use crate::render::Renderer;

/// Entry point for windowed applications.
pub struct Runtime;

impl Runtime {
    /// Opens the window, creates the device and core resources, then runs `app`
    /// until it closes.
    pub fn run<A>(mut spec: AppSpec, mut app: A) -> Result<()>
    where
        A: App<WgpuBackend>,
    {
        spec.validate().context("invalid application spec")?;

        let mut platform = WinitPlatform::new(&spec)?;
        let window = platform
            .window()
            .cloned()
            .context("platform did not create a window")?;
        (spec.width, spec.height) = platform.drawable_size();

        let gpu_init = GpuInit::default().with_vsync(spec.vsync_interval);
        let backend = pollster::block_on(WgpuBackend::new(window, gpu_init))
            .context("GPU initialization failed")?;
        log::info!(
            "surface {:?}, {}x{}",
            backend.surface_format(),
            spec.width,
            spec.height
        );

        let mut renderer = Renderer::new(backend, spec.error_policy);
        renderer
            .create_core_resources(&spec.core_shader_dir)
            .context("failed to create core resources")?;

        let mut input = InputContext::new();
        let mut driver = FrameDriver::new(&spec)?;
        driver.run(&mut app, &mut renderer, &mut input, &mut platform)
    }
}
