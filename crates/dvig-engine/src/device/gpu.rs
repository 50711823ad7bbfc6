use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::diagnostics::DeviceError;
use crate::render::BufferUsage;

use super::backend::{Backend, BufferDesc, BufferKind, PassDesc, PipelineDesc, ShaderDesc};
use super::conversions;
use super::init::GpuInit;
use super::surface::{self, SurfaceErrorAction};

/// First uncaptured device error since the last `take`.
#[derive(Clone, Default)]
struct ErrorSlot(Arc<Mutex<Option<wgpu::Error>>>);

impl ErrorSlot {
    fn install(&self, device: &wgpu::Device) {
        device.on_uncaptured_error(Arc::new(self.handler()));
    }

    /// Keeps the first error and drops later ones until the slot is taken.
    fn handler(&self) -> impl Fn(wgpu::Error) + Send + Sync + 'static {
        let slot = self.clone();
        move |err| {
            log::debug!("device error: {err}");
            let mut guard = slot.0.lock().unwrap_or_else(PoisonError::into_inner);
            if guard.is_none() {
                *guard = Some(err);
            }
        }
    }

    fn take_raw(&self) -> Option<wgpu::Error> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    fn take(&self) -> Result<(), DeviceError> {
        match self.take_raw() {
            Some(err) => Err(conversions::device_error(err)),
            None => Ok(()),
        }
    }
}

/// Swapchain image held between the first submit of a frame and `present`.
struct AcquiredFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// [`Backend`] over a wgpu device bound to a window surface.
///
/// Owns Device/Queue and the configured Surface. The surface texture is
/// acquired lazily on the first submit of a frame and released by `present`.
pub struct WgpuBackend {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    vsync_interval: u32,

    /// Layout of the single vertex-stage uniform buffer (group 0, binding 0).
    uniform_layout: wgpu::BindGroupLayout,
    frame: Option<AcquiredFrame>,
    errors: ErrorSlot,
}

impl WgpuBackend {
    /// Creates the device and configures a surface for `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // `Arc<Window>` makes the surface 'static.
        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("dvig device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let errors = ErrorSlot::default();
        errors.install(&device);

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: surface::present_mode_for(init.vsync_interval),
            alpha_mode: surface::choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("dvig vertex uniforms"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            vsync_interval: init.vsync_interval,
            uniform_layout,
            frame: None,
            errors,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Acquires the frame's surface texture if not yet held.
    ///
    /// `Ok(false)` means the frame is skipped (zero size or transient error).
    fn acquire(&mut self) -> Result<bool, DeviceError> {
        if self.frame.is_some() {
            return Ok(true);
        }
        if self.size.width == 0 || self.size.height == 0 {
            return Ok(false);
        }

        match self.surface.get_current_texture() {
            Ok(texture) => {
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.frame = Some(AcquiredFrame { texture, view });
                Ok(true)
            }
            Err(err) => {
                let action = surface::map_surface_error(
                    &self.surface,
                    &self.device,
                    &self.config,
                    self.size,
                    err,
                );
                match action {
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        log::warn!("surface unavailable ({action:?}); skipping frame");
                        Ok(false)
                    }
                    SurfaceErrorAction::Fatal => Err(DeviceError::OutOfMemory),
                }
            }
        }
    }
}

impl Backend for WgpuBackend {
    type Buffer = wgpu::Buffer;
    type Shader = wgpu::ShaderModule;
    type Pipeline = wgpu::RenderPipeline;
    type Binding = wgpu::BindGroup;

    fn surface_size(&self) -> (u32, u32) {
        (self.size.width, self.size.height)
    }

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<wgpu::Buffer, DeviceError> {
        let mut usage = match desc.kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Uniform => wgpu::BufferUsages::UNIFORM,
        };
        if desc.usage != BufferUsage::Static {
            usage |= wgpu::BufferUsages::COPY_DST;
        }

        let size = conversions::aligned_size(desc.size);
        let buffer = match desc.contents {
            Some(contents) if !contents.is_empty() => {
                let mut padded = contents.to_vec();
                padded.resize(size as usize, 0);
                self.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(desc.label),
                        contents: &padded,
                        usage,
                    })
            }
            _ => self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(desc.label),
                size,
                usage,
                mapped_at_creation: false,
            }),
        };

        self.errors.take()?;
        Ok(buffer)
    }

    fn write_buffer(
        &mut self,
        buffer: &wgpu::Buffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        if data.is_empty() {
            return Ok(());
        }

        let padded_len = conversions::aligned_size(data.len() as u64);
        if offset + padded_len > buffer.size() {
            return Err(DeviceError::InvalidArgument(format!(
                "write of {} bytes at {offset} overruns {}-byte buffer",
                data.len(),
                buffer.size()
            )));
        }

        if padded_len == data.len() as u64 {
            self.queue.write_buffer(buffer, offset, data);
        } else {
            let mut padded = data.to_vec();
            padded.resize(padded_len as usize, 0);
            self.queue.write_buffer(buffer, offset, &padded);
        }

        self.errors.take()
    }

    fn compile_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<wgpu::ShaderModule, String> {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(desc.label),
                source: wgpu::ShaderSource::Wgsl(desc.source.into()),
            });

        match self.errors.take_raw() {
            Some(err) => Err(err.to_string()),
            None => Ok(module),
        }
    }

    fn create_uniform_binding(&mut self, buffer: &wgpu::Buffer) -> Result<wgpu::BindGroup, DeviceError> {
        let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("dvig uniform binding"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        self.errors.take()?;
        Ok(group)
    }

    fn create_pipeline(
        &mut self,
        desc: &PipelineDesc<'_, Self>,
    ) -> Result<wgpu::RenderPipeline, DeviceError> {
        let uniform_layouts = [&self.uniform_layout];
        let bind_group_layouts: &[&wgpu::BindGroupLayout] = if desc.uses_uniforms {
            &uniform_layouts
        } else {
            &[]
        };

        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(desc.label),
                bind_group_layouts,
                immediate_size: 0,
            });

        let attributes: Vec<wgpu::VertexAttribute> = desc
            .layout
            .attributes
            .iter()
            .map(conversions::vertex_attribute)
            .collect();

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: desc.vertex,
                    entry_point: Some(desc.vertex_entry),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: desc.layout.stride,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: desc.pixel,
                    entry_point: Some(desc.pixel_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: conversions::topology(desc.topology),
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        self.errors.take()?;
        Ok(pipeline)
    }

    fn submit(&mut self, pass: &PassDesc<'_, Self>) -> Result<(), DeviceError> {
        if !self.acquire()? {
            return Ok(());
        }
        let Some(frame) = self.frame.as_ref() else {
            return Ok(());
        };

        let load = match pass.clear {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("dvig pass encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("dvig pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for draw in pass.draws {
                // Off-target parts are clipped by the rasterizer; only empty viewports are skipped.
                let vp = draw.viewport;
                if !vp.is_valid() {
                    continue;
                }
                rpass.set_viewport(vp.x, vp.y, vp.width, vp.height, 0.0, 1.0);
                rpass.set_pipeline(draw.pipeline);
                if let Some(binding) = draw.uniforms {
                    rpass.set_bind_group(0, binding, &[]);
                }
                rpass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
                rpass.draw(draw.vertices.clone(), 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.errors.take()
    }

    fn present(&mut self, vsync_interval: u32) -> Result<(), DeviceError> {
        // A frame with no submitted work still presents a cleared image.
        if self.frame.is_none() && !self.acquire()? {
            return Ok(());
        }

        if let Some(frame) = self.frame.take() {
            self.window.pre_present_notify();
            drop(frame.view);
            frame.texture.present();
        }

        if vsync_interval != self.vsync_interval {
            self.vsync_interval = vsync_interval;
            let mode = surface::present_mode_for(vsync_interval);
            if mode != self.config.present_mode {
                self.config.present_mode = mode;
                if self.size.width > 0 && self.size.height > 0 {
                    self.surface.configure(&self.device, &self.config);
                }
            }
        }

        self.errors.take()
    }

    fn resize(&mut self, width: u32, height: u32) {
        // The surface cannot be reconfigured while a texture is outstanding.
        self.frame = None;
        surface::apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            PhysicalSize::new(width, height),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(description: &str) -> wgpu::Error {
        wgpu::Error::Validation {
            source: Box::new(std::io::Error::other(description.to_owned())),
            description: description.to_owned(),
        }
    }

    #[test]
    fn error_slot_keeps_the_first_error_until_taken() {
        let slot = ErrorSlot::default();
        let handler = slot.handler();

        handler(validation("first"));
        handler(validation("second"));
        assert_eq!(
            slot.take().unwrap_err(),
            DeviceError::InvalidArgument("first".into())
        );
        assert!(slot.take().is_ok());

        handler(validation("third"));
        assert!(slot.take().is_err());
    }
}
