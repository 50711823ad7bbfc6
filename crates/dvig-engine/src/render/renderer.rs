use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use std::rc::Rc;

use bytemuck::Pod;
use glam::{Vec2, Vec4};

use crate::device::{Backend, BufferDesc, BufferKind, DrawCall, PassDesc, PipelineDesc, ShaderDesc};
use crate::diagnostics::{AssetError, ErrorPolicy, RenderError, RenderResult};

use super::quad::CoreResources;
use super::resources::{PixelShader, UniformSlot, VertexBuffer, VertexShader};
use super::shader;
use super::types::{BufferUsage, ShaderStage, Topology, VertexLayout, Viewport};
use super::uniform::NamedUniformBuffer;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    vertex: u64,
    pixel: u64,
    topology: Topology,
}

/// Device state selected by the `bind_*` calls.
struct BindState<B: Backend> {
    vertex_buffer: Option<VertexBuffer<B>>,
    vertex_shader: Option<VertexShader<B>>,
    pixel_shader: Option<PixelShader<B>>,
    topology: Topology,
}

impl<B: Backend> Default for BindState<B> {
    fn default() -> Self {
        Self {
            vertex_buffer: None,
            vertex_shader: None,
            pixel_shader: None,
            topology: Topology::default(),
        }
    }
}

/// A recorded draw waiting for the next flush.
///
/// Holds handle clones so resources outlive the recording.
struct PendingDraw<B: Backend> {
    pipeline: Rc<B::Pipeline>,
    vertex_buffer: VertexBuffer<B>,
    vertex_shader: VertexShader<B>,
    vertices: Range<u32>,
    viewport: Viewport,
}

impl<B: Backend> PendingDraw<B> {
    fn references(&self, buffer_id: u64) -> bool {
        self.vertex_buffer.id() == buffer_id
            || self
                .vertex_shader
                .uniforms()
                .is_some_and(|slot| slot.id == buffer_id)
    }
}

/// Resource factory and stateful bind/draw front end over a [`Backend`].
///
/// Draws are recorded and submitted in order at [`Renderer::present`]. Writing a
/// buffer that a recorded draw still reads submits the recorded draws first, so
/// every draw observes the contents that were current when it was issued.
pub struct Renderer<B: Backend> {
    backend: B,
    policy: ErrorPolicy,
    next_id: u64,
    bound: BindState<B>,
    /// Never evicted; entries live as long as the renderer. Handles are not
    /// recycled, so a key outlives the shaders it names at the cost of one
    /// pipeline object per (vs, ps, topology) combination ever drawn.
    pipelines: HashMap<PipelineKey, Rc<B::Pipeline>>,
    pending: Vec<PendingDraw<B>>,
    clear: Option<[f32; 4]>,
    viewport: Viewport,
    pub(super) core: Option<CoreResources<B>>,
}

impl<B: Backend> Renderer<B> {
    pub fn new(backend: B, policy: ErrorPolicy) -> Self {
        let (width, height) = backend.surface_size();
        Self {
            backend,
            policy,
            next_id: 0,
            bound: BindState::default(),
            pipelines: HashMap::new(),
            pending: Vec::new(),
            clear: None,
            viewport: Viewport::new(0.0, 0.0, width as f32, height as f32),
            core: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of cached pipelines.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn topology(&self) -> Topology {
        self.bound.topology
    }

    /// Number of draws recorded since the last flush.
    pub fn pending_draws(&self) -> usize {
        self.pending.len()
    }

    /// Logs `err` and applies the failure policy.
    #[track_caller]
    pub(crate) fn fail<T>(&self, err: impl Into<RenderError>) -> RenderResult<T> {
        Err(self.policy.escalate(err.into()))
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Applies to every draw issued after this call.
    pub fn set_viewport(&mut self, origin: Vec2, size: Vec2) {
        self.viewport = Viewport::new(origin.x, origin.y, size.x, size.y);
    }

    /// Clears the render target. Draws issued earlier in the frame are submitted first.
    pub fn clear_color(&mut self, color: Vec4) -> RenderResult<()> {
        if !self.pending.is_empty() {
            self.flush()?;
        }
        self.clear = Some(color.to_array());
        Ok(())
    }

    /// Submits outstanding work and presents the frame.
    pub fn present(&mut self, vsync_interval: u32) -> RenderResult<()> {
        self.flush()?;
        match self.backend.present(vsync_interval) {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    /// Resizes the render target and resets the viewport to cover it.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.flush()?;
        self.backend.resize(width, height);
        self.viewport = Viewport::new(0.0, 0.0, width as f32, height as f32);
        log::debug!("render target resized to {width}x{height}");
        Ok(())
    }

    fn flush(&mut self) -> RenderResult<()> {
        if self.pending.is_empty() && self.clear.is_none() {
            return Ok(());
        }

        let pending = std::mem::take(&mut self.pending);
        let draws: Vec<DrawCall<'_, B>> = pending
            .iter()
            .map(|d| DrawCall {
                pipeline: d.pipeline.as_ref(),
                vertex_buffer: d.vertex_buffer.raw(),
                uniforms: d.vertex_shader.uniforms().map(|slot| &slot.binding),
                vertices: d.vertices.clone(),
                viewport: d.viewport,
            })
            .collect();

        let pass = PassDesc {
            clear: self.clear.take(),
            draws: &draws,
        };
        match self.backend.submit(&pass) {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    fn is_referenced(&self, buffer_id: u64) -> bool {
        self.pending.iter().any(|d| d.references(buffer_id))
    }

    /// Creates a vertex buffer of `stride * count` bytes.
    ///
    /// `Static` buffers require `data`; when given, `data` must be exactly
    /// `stride * count` bytes.
    pub fn create_vertex_buffer(
        &mut self,
        data: Option<&[u8]>,
        stride: u64,
        count: u32,
        usage: BufferUsage,
    ) -> RenderResult<VertexBuffer<B>> {
        let Some(size) = stride.checked_mul(u64::from(count)) else {
            return self.fail(RenderError::contract(format!(
                "vertex buffer size {stride} * {count} overflows"
            )));
        };

        if usage == BufferUsage::Static && data.is_none() {
            return self.fail(RenderError::contract(
                "static vertex buffer requires initial contents",
            ));
        }
        if let Some(data) = data
            && data.len() as u64 != size
        {
            return self.fail(RenderError::contract(format!(
                "vertex data is {} bytes, expected {stride} * {count} = {size}",
                data.len()
            )));
        }

        let desc = BufferDesc {
            label: "vertex buffer",
            kind: BufferKind::Vertex,
            usage,
            size,
            contents: data,
        };
        let raw = match self.backend.create_buffer(&desc) {
            Ok(raw) => raw,
            Err(err) => return self.fail(err),
        };

        let id = self.next_id();
        log::debug!("vertex buffer {id}: {count} x {stride} bytes ({usage:?})");
        Ok(VertexBuffer::new(id, raw, usage, stride, count, size))
    }

    /// Typed form of [`Renderer::create_vertex_buffer`].
    pub fn create_vertex_buffer_from<T: Pod>(
        &mut self,
        vertices: &[T],
        usage: BufferUsage,
    ) -> RenderResult<VertexBuffer<B>> {
        self.create_vertex_buffer(
            Some(bytemuck::cast_slice(vertices)),
            size_of::<T>() as u64,
            vertices.len() as u32,
            usage,
        )
    }

    /// Replaces the contents of a `Dynamic` buffer and its recorded count.
    ///
    /// The new payload may shrink or grow but never beyond the capacity the
    /// buffer was created with.
    pub fn update(
        &mut self,
        buffer: &VertexBuffer<B>,
        data: &[u8],
        stride: u64,
        count: u32,
    ) -> RenderResult<()> {
        if !buffer.usage().allows_cpu_writes() {
            return self.fail(RenderError::contract(format!(
                "vertex buffer {} is {:?}; only Dynamic buffers accept updates",
                buffer.id(),
                buffer.usage()
            )));
        }

        let Some(size) = stride.checked_mul(u64::from(count)) else {
            return self.fail(RenderError::contract(format!(
                "vertex buffer size {stride} * {count} overflows"
            )));
        };
        if data.len() as u64 != size {
            return self.fail(RenderError::contract(format!(
                "vertex data is {} bytes, expected {stride} * {count} = {size}",
                data.len()
            )));
        }
        if size > buffer.capacity() {
            return self.fail(RenderError::contract(format!(
                "update of {size} bytes exceeds vertex buffer {} capacity of {}",
                buffer.id(),
                buffer.capacity()
            )));
        }

        if self.is_referenced(buffer.id()) {
            self.flush()?;
        }
        if let Err(err) = self.backend.write_buffer(buffer.raw(), 0, data) {
            return self.fail(err);
        }

        buffer.set_contents_shape(stride, count);
        Ok(())
    }

    /// Typed form of [`Renderer::update`].
    pub fn update_vertex_buffer<T: Pod>(
        &mut self,
        buffer: &VertexBuffer<B>,
        vertices: &[T],
    ) -> RenderResult<()> {
        self.update(
            buffer,
            bytemuck::cast_slice(vertices),
            size_of::<T>() as u64,
            vertices.len() as u32,
        )
    }

    /// Compiles the vertex stage of the WGSL file at `path`.
    ///
    /// With `uniform_size`, a zero-initialized uniform buffer of that many bytes is
    /// created and bound to group 0, binding 0 whenever this shader is drawn.
    pub fn compile_vertex_shader(
        &mut self,
        path: impl AsRef<Path>,
        layout: VertexLayout,
        uniform_size: Option<u64>,
        entry: &str,
    ) -> RenderResult<VertexShader<B>> {
        let path = path.as_ref();
        let raw = self.compile(path, ShaderStage::Vertex, entry)?;

        let uniforms = match uniform_size {
            Some(0) => {
                return self.fail(RenderError::contract("uniform buffer size must be non-zero"));
            }
            Some(size) => Some(self.create_uniform_slot(size)?),
            None => None,
        };

        let id = self.next_id();
        log::info!("compiled vertex shader '{}' ({entry})", path.display());
        Ok(VertexShader::new(id, raw, entry.to_string(), layout, uniforms))
    }

    /// Compiles the pixel stage of the WGSL file at `path`.
    pub fn compile_pixel_shader(
        &mut self,
        path: impl AsRef<Path>,
        entry: &str,
    ) -> RenderResult<PixelShader<B>> {
        let path = path.as_ref();
        let raw = self.compile(path, ShaderStage::Pixel, entry)?;

        let id = self.next_id();
        log::info!("compiled pixel shader '{}' ({entry})", path.display());
        Ok(PixelShader::new(id, raw, entry.to_string()))
    }

    fn compile(&mut self, path: &Path, stage: ShaderStage, entry: &str) -> RenderResult<B::Shader> {
        let source = match shader::load(path, stage, entry) {
            Ok(source) => source,
            Err(err) => return self.fail(err),
        };

        let label = path.display().to_string();
        let desc = ShaderDesc {
            label: &label,
            source: &source,
            stage,
            entry_point: entry,
        };
        match self.backend.compile_shader(&desc) {
            Ok(raw) => Ok(raw),
            Err(message) => self.fail(AssetError::Compile {
                path: path.to_path_buf(),
                message,
            }),
        }
    }

    fn create_uniform_slot(&mut self, size: u64) -> RenderResult<UniformSlot<B>> {
        let desc = BufferDesc {
            label: "vertex uniforms",
            kind: BufferKind::Uniform,
            usage: BufferUsage::Dynamic,
            size,
            contents: None,
        };
        let buffer = match self.backend.create_buffer(&desc) {
            Ok(buffer) => buffer,
            Err(err) => return self.fail(err),
        };
        let binding = match self.backend.create_uniform_binding(&buffer) {
            Ok(binding) => binding,
            Err(err) => return self.fail(err),
        };

        Ok(UniformSlot {
            id: self.next_id(),
            buffer,
            binding,
            size,
        })
    }

    /// Writes `bytes` to the start of `shader`'s uniform buffer.
    pub fn update_uniforms(&mut self, shader: &VertexShader<B>, bytes: &[u8]) -> RenderResult<()> {
        let Some(slot) = shader.uniforms() else {
            return self.fail(RenderError::contract(format!(
                "vertex shader {} has no uniform buffer",
                shader.id()
            )));
        };
        if bytes.len() as u64 > slot.size {
            return self.fail(RenderError::contract(format!(
                "uniform payload of {} bytes exceeds buffer size {}",
                bytes.len(),
                slot.size
            )));
        }

        if self.is_referenced(slot.id) {
            self.flush()?;
        }
        match self.backend.write_buffer(&slot.buffer, 0, bytes) {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    /// Uploads `layout` if it changed since the last sync.
    pub fn sync_uniforms(
        &mut self,
        shader: &VertexShader<B>,
        layout: &mut NamedUniformBuffer,
    ) -> RenderResult<()> {
        if !layout.is_dirty() {
            return Ok(());
        }
        self.update_uniforms(shader, layout.as_bytes())?;
        layout.mark_clean();
        Ok(())
    }

    pub fn bind_vertex_buffer(&mut self, buffer: &VertexBuffer<B>) {
        self.bound.vertex_buffer = Some(buffer.clone());
    }

    /// Binds the program, its input layout and its uniform buffer.
    pub fn bind_vertex_shader(&mut self, shader: &VertexShader<B>) {
        self.bound.vertex_shader = Some(shader.clone());
    }

    pub fn bind_pixel_shader(&mut self, shader: &PixelShader<B>) {
        self.bound.pixel_shader = Some(shader.clone());
    }

    pub fn set_topology(&mut self, topology: Topology) {
        self.bound.topology = topology;
    }

    /// Draws vertices `[start, start + count)` of the bound vertex buffer with the
    /// bound shaders and topology.
    pub fn draw(&mut self, count: u32, start: u32) -> RenderResult<()> {
        if count == 0 {
            return Ok(());
        }

        let (Some(vb), Some(vs), Some(ps)) = (
            self.bound.vertex_buffer.clone(),
            self.bound.vertex_shader.clone(),
            self.bound.pixel_shader.clone(),
        ) else {
            return self.fail(RenderError::contract(
                "draw requires a bound vertex buffer, vertex shader and pixel shader",
            ));
        };

        let end = start.checked_add(count).unwrap_or(u32::MAX);
        if end > vb.count() {
            return self.fail(RenderError::contract(format!(
                "draw of vertices {start}..{end} exceeds vertex buffer {} count of {}",
                vb.id(),
                vb.count()
            )));
        }

        let pipeline = self.pipeline_for(&vs, &ps)?;
        self.pending.push(PendingDraw {
            pipeline,
            vertex_buffer: vb,
            vertex_shader: vs,
            vertices: start..end,
            viewport: self.viewport,
        });
        Ok(())
    }

    fn pipeline_for(
        &mut self,
        vs: &VertexShader<B>,
        ps: &PixelShader<B>,
    ) -> RenderResult<Rc<B::Pipeline>> {
        let key = PipelineKey {
            vertex: vs.id(),
            pixel: ps.id(),
            topology: self.bound.topology,
        };
        if let Some(pipeline) = self.pipelines.get(&key) {
            return Ok(Rc::clone(pipeline));
        }

        let desc = PipelineDesc {
            label: "dvig pipeline",
            vertex: vs.raw(),
            vertex_entry: vs.entry_point(),
            layout: vs.layout(),
            pixel: ps.raw(),
            pixel_entry: ps.entry_point(),
            topology: key.topology,
            uses_uniforms: vs.uniforms().is_some(),
        };
        let pipeline = match self.backend.create_pipeline(&desc) {
            Ok(pipeline) => Rc::new(pipeline),
            Err(err) => return self.fail(err),
        };

        log::debug!(
            "pipeline for vs {} / ps {} / {:?}",
            key.vertex,
            key.pixel,
            key.topology
        );
        self.pipelines.insert(key, Rc::clone(&pipeline));
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CORE_SHADER_DIR;
    use crate::device::HeadlessBackend;
    use crate::diagnostics::{DeviceError, ErrorCategory};
    use crate::render::VertexFormat;
    use crate::render::shader::{DEFAULT_PIXEL_ENTRY, DEFAULT_VERTEX_ENTRY};

    fn renderer() -> Renderer<HeadlessBackend> {
        Renderer::new(HeadlessBackend::new(640, 480), ErrorPolicy::propagate_all())
    }

    fn mesh2d() -> std::path::PathBuf {
        Path::new(CORE_SHADER_DIR).join("mesh2d.wgsl")
    }

    fn shaders(
        r: &mut Renderer<HeadlessBackend>,
        uniforms: Option<u64>,
    ) -> (VertexShader<HeadlessBackend>, PixelShader<HeadlessBackend>) {
        let layout = VertexLayout::packed(&[VertexFormat::Float32x2]);
        let vs = r
            .compile_vertex_shader(mesh2d(), layout, uniforms, DEFAULT_VERTEX_ENTRY)
            .unwrap();
        let ps = r.compile_pixel_shader(mesh2d(), DEFAULT_PIXEL_ENTRY).unwrap();
        (vs, ps)
    }

    fn contract(err: RenderError) -> bool {
        err.category() == ErrorCategory::Contract
    }

    #[test]
    fn static_buffer_without_data_is_rejected() {
        let mut r = renderer();
        let err = r.create_vertex_buffer(None, 8, 3, BufferUsage::Static).unwrap_err();
        assert!(contract(err));
    }

    #[test]
    #[should_panic(expected = "static vertex buffer requires initial contents")]
    fn default_policy_aborts_on_contract_violation() {
        let mut r = Renderer::new(HeadlessBackend::default(), ErrorPolicy::default());
        let _ = r.create_vertex_buffer(None, 8, 3, BufferUsage::Static);
    }

    #[test]
    fn data_length_must_match_stride_times_count() {
        let mut r = renderer();
        let err = r
            .create_vertex_buffer(Some(&[0u8; 12]), 8, 2, BufferUsage::Default)
            .unwrap_err();
        assert!(contract(err));
    }

    #[test]
    fn zero_count_dynamic_buffer_is_valid_but_not_drawable() {
        let mut r = renderer();
        let (vs, ps) = shaders(&mut r, None);
        let vb = r.create_vertex_buffer(None, 8, 0, BufferUsage::Dynamic).unwrap();
        assert_eq!(vb.count(), 0);
        assert_eq!(vb.capacity(), 0);

        r.bind_vertex_buffer(&vb);
        r.bind_vertex_shader(&vs);
        r.bind_pixel_shader(&ps);

        // Nothing to draw is fine; anything else is out of range.
        r.draw(0, 0).unwrap();
        assert!(contract(r.draw(3, 0).unwrap_err()));
        assert_eq!(r.pending_draws(), 0);
    }

    #[test]
    fn update_requires_dynamic_usage() {
        let mut r = renderer();
        let data = [0u8; 16];
        let vb = r
            .create_vertex_buffer(Some(&data), 8, 2, BufferUsage::Static)
            .unwrap();
        assert!(contract(r.update(&vb, &data, 8, 2).unwrap_err()));
    }

    #[test]
    fn update_shrinks_and_regrows_within_capacity() {
        let mut r = renderer();
        let vb = r.create_vertex_buffer(None, 8, 4, BufferUsage::Dynamic).unwrap();

        r.update_vertex_buffer(&vb, &[[1.0f32, 2.0]]).unwrap();
        assert_eq!(vb.count(), 1);
        r.update_vertex_buffer(&vb, &[[0.0f32; 2]; 4]).unwrap();
        assert_eq!(vb.count(), 4);

        let err = r.update_vertex_buffer(&vb, &[[0.0f32; 2]; 5]).unwrap_err();
        assert!(contract(err));
        assert_eq!(vb.count(), 4);
    }

    #[test]
    fn draw_requires_full_bind_state() {
        let mut r = renderer();
        let vb = r
            .create_vertex_buffer_from(&[[0.0f32; 2]; 3], BufferUsage::Default)
            .unwrap();
        r.bind_vertex_buffer(&vb);
        assert!(contract(r.draw(3, 0).unwrap_err()));
    }

    #[test]
    fn draws_are_submitted_in_order_on_present() {
        let mut r = renderer();
        let (vs, ps) = shaders(&mut r, None);
        let vb = r
            .create_vertex_buffer_from(&[[0.0f32; 2]; 6], BufferUsage::Default)
            .unwrap();

        r.clear_color(Vec4::new(0.1, 0.2, 0.3, 1.0)).unwrap();
        r.bind_vertex_buffer(&vb);
        r.bind_vertex_shader(&vs);
        r.bind_pixel_shader(&ps);
        r.draw(3, 0).unwrap();
        r.set_topology(Topology::LineList);
        r.draw(2, 4).unwrap();
        r.present(1).unwrap();

        let b = r.backend();
        assert_eq!(b.passes().len(), 1);
        assert_eq!(b.passes()[0].clear, Some([0.1, 0.2, 0.3, 1.0]));
        let draws: Vec<_> = b.draws().map(|d| (d.topology, d.vertices.clone())).collect();
        assert_eq!(
            draws,
            vec![(Topology::TriangleList, 0..3), (Topology::LineList, 4..6)]
        );
        assert_eq!(b.presents(), &[1]);
    }

    #[test]
    fn pipelines_are_cached_per_shader_pair_and_topology() {
        let mut r = renderer();
        let (vs, ps) = shaders(&mut r, None);
        let vb = r
            .create_vertex_buffer_from(&[[0.0f32; 2]; 3], BufferUsage::Default)
            .unwrap();
        r.bind_vertex_buffer(&vb);
        r.bind_vertex_shader(&vs);
        r.bind_pixel_shader(&ps);

        r.draw(3, 0).unwrap();
        r.draw(3, 0).unwrap();
        r.set_topology(Topology::PointList);
        r.draw(3, 0).unwrap();
        r.present(0).unwrap();

        let ids: Vec<u64> = r.backend().draws().map(|d| d.pipeline_id).collect();
        assert_eq!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
    }

    #[test]
    fn overwriting_a_drawn_buffer_flushes_first() {
        let mut r = renderer();
        let (vs, ps) = shaders(&mut r, None);
        let vb = r.create_vertex_buffer(None, 8, 3, BufferUsage::Dynamic).unwrap();
        r.bind_vertex_buffer(&vb);
        r.bind_vertex_shader(&vs);
        r.bind_pixel_shader(&ps);

        r.update_vertex_buffer(&vb, &[[1.0f32; 2]; 3]).unwrap();
        r.draw(3, 0).unwrap();
        r.update_vertex_buffer(&vb, &[[2.0f32; 2]; 3]).unwrap();
        r.draw(3, 0).unwrap();
        r.present(1).unwrap();

        let snapshots: Vec<Vec<u8>> = r.backend().draws().map(|d| d.vertex_bytes.clone()).collect();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0], bytemuck::cast_slice::<f32, u8>(&[1.0; 6]));
        assert_eq!(snapshots[1], bytemuck::cast_slice::<f32, u8>(&[2.0; 6]));
        assert_eq!(r.backend().passes().len(), 2);
    }

    #[test]
    fn uniform_updates_respect_declared_size() {
        let mut r = renderer();
        let (vs, _) = shaders(&mut r, Some(16));
        assert_eq!(vs.uniform_size(), Some(16));

        r.update_uniforms(&vs, &[1u8; 16]).unwrap();
        assert!(contract(r.update_uniforms(&vs, &[1u8; 20]).unwrap_err()));

        let (plain, _) = shaders(&mut r, None);
        assert!(contract(r.update_uniforms(&plain, &[0u8; 4]).unwrap_err()));
    }

    #[test]
    fn sync_uploads_only_dirty_layouts() {
        let mut r = renderer();
        let (vs, _) = shaders(&mut r, Some(16));
        let mut layout = NamedUniformBuffer::new();
        layout.add_data("tint", &[0.5f32; 4]);

        let before = r.backend().buffer_writes();
        r.sync_uniforms(&vs, &mut layout).unwrap();
        assert!(!layout.is_dirty());
        r.sync_uniforms(&vs, &mut layout).unwrap();
        assert_eq!(r.backend().buffer_writes(), before + 1);
    }

    #[test]
    fn missing_shader_file_is_an_asset_error() {
        let mut r = renderer();
        let err = r
            .compile_pixel_shader("/no/such/shader.wgsl", DEFAULT_PIXEL_ENTRY)
            .unwrap_err();
        assert!(matches!(err, RenderError::Asset(AssetError::NotFound { .. })));
    }

    #[test]
    fn wrong_entry_point_is_a_compile_error() {
        let mut r = renderer();
        let err = r.compile_pixel_shader(mesh2d(), "fragment_main").unwrap_err();
        assert!(matches!(err, RenderError::Asset(AssetError::Compile { .. })));
    }

    #[test]
    fn device_failures_surface_as_device_errors() {
        let mut r = renderer();
        r.backend_mut().fail_next(DeviceError::OutOfMemory);
        let err = r
            .create_vertex_buffer(None, 8, 3, BufferUsage::Dynamic)
            .unwrap_err();
        assert!(matches!(err, RenderError::Device(DeviceError::OutOfMemory)));
    }

    #[test]
    fn viewport_tracks_explicit_sets_and_resizes() {
        let mut r = renderer();
        assert_eq!(r.viewport(), Viewport::new(0.0, 0.0, 640.0, 480.0));

        r.set_viewport(Vec2::new(10.0, 20.0), Vec2::new(100.0, 50.0));
        assert_eq!(r.viewport(), Viewport::new(10.0, 20.0, 100.0, 50.0));

        r.resize(800, 600).unwrap();
        assert_eq!(r.viewport(), Viewport::new(0.0, 0.0, 800.0, 600.0));
        assert_eq!(r.backend().surface_size(), (800, 600));
    }

    #[test]
    fn oversized_vertex_buffer_is_a_contract_error() {
        let mut r = renderer();
        let err = r
            .create_vertex_buffer(None, u64::MAX / 2 + 1, 2, BufferUsage::Dynamic)
            .unwrap_err();
        assert!(contract(err));

        let vb = r.create_vertex_buffer(None, 8, 2, BufferUsage::Dynamic).unwrap();
        assert!(contract(r.update(&vb, &[], u64::MAX, 2).unwrap_err()));
        assert_eq!(vb.count(), 2);
    }

    #[test]
    fn offscreen_viewport_reaches_the_backend_unchanged() {
        let mut r = renderer();
        let (vs, ps) = shaders(&mut r, None);
        let vb = r
            .create_vertex_buffer_from(&[[0.0f32; 2]; 3], BufferUsage::Default)
            .unwrap();
        r.bind_vertex_buffer(&vb);
        r.bind_vertex_shader(&vs);
        r.bind_pixel_shader(&ps);

        r.set_viewport(Vec2::new(-100.0, 0.0), Vec2::new(800.0, 600.0));
        r.draw(3, 0).unwrap();
        r.present(0).unwrap();

        let draw = r.backend().draws().next().unwrap();
        assert_eq!(draw.viewport, Viewport::new(-100.0, 0.0, 800.0, 600.0));
    }

    #[test]
    fn pipeline_cache_holds_one_entry_per_combination() {
        let mut r = renderer();
        let (vs, ps) = shaders(&mut r, None);
        let vb = r
            .create_vertex_buffer_from(&[[0.0f32; 2]; 3], BufferUsage::Default)
            .unwrap();
        r.bind_vertex_buffer(&vb);
        r.bind_vertex_shader(&vs);
        r.bind_pixel_shader(&ps);

        for _ in 0..4 {
            r.draw(3, 0).unwrap();
            r.present(0).unwrap();
        }
        assert_eq!(r.pipeline_count(), 1);

        r.set_topology(Topology::PointList);
        r.draw(3, 0).unwrap();
        r.present(0).unwrap();
        assert_eq!(r.pipeline_count(), 2);
    }

    #[test]
    fn resource_handles_format_without_device_objects() {
        let mut r = renderer();
        let (vs, ps) = shaders(&mut r, Some(64));
        let vb = r.create_vertex_buffer(None, 8, 4, BufferUsage::Dynamic).unwrap();

        let text = format!("{vb:?}");
        assert!(text.starts_with("VertexBuffer"));
        assert!(text.contains("capacity: 32"));
        assert!(format!("{vs:?}").contains("uniform_size: Some(64)"));
        assert!(format!("{ps:?}").contains(DEFAULT_PIXEL_ENTRY));
    }
}
