use std::ops::Range;

use crate::diagnostics::DeviceError;
use crate::render::{BufferUsage, ShaderStage, Topology, VertexLayout, Viewport};

/// What a buffer is bound as.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferKind {
    Vertex,
    Uniform,
}

/// Buffer creation parameters.
#[derive(Debug, Clone)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub kind: BufferKind,
    pub usage: BufferUsage,
    /// Capacity in bytes.
    pub size: u64,
    /// Initial contents; when present its length equals `size`.
    pub contents: Option<&'a [u8]>,
}

/// Shader compilation parameters.
#[derive(Debug, Clone)]
pub struct ShaderDesc<'a> {
    pub label: &'a str,
    pub source: &'a str,
    pub stage: ShaderStage,
    pub entry_point: &'a str,
}

/// Everything a backend needs to build a pipeline for one bind-state combination.
pub struct PipelineDesc<'a, B: Backend> {
    pub label: &'a str,
    pub vertex: &'a B::Shader,
    pub vertex_entry: &'a str,
    pub layout: &'a VertexLayout,
    pub pixel: &'a B::Shader,
    pub pixel_entry: &'a str,
    pub topology: Topology,
    pub uses_uniforms: bool,
}

/// One non-indexed draw, resolved to backend objects.
pub struct DrawCall<'a, B: Backend> {
    pub pipeline: &'a B::Pipeline,
    pub vertex_buffer: &'a B::Buffer,
    pub uniforms: Option<&'a B::Binding>,
    pub vertices: Range<u32>,
    pub viewport: Viewport,
}

/// Work submitted to the default render target in one go.
pub struct PassDesc<'a, B: Backend> {
    /// Clear color applied before the draws, if any.
    pub clear: Option<[f32; 4]>,
    pub draws: &'a [DrawCall<'a, B>],
}

/// Graphics device seam.
///
/// Resource types are owned handles; dropping the last one releases the device
/// object. Calls are synchronous from the caller's point of view.
pub trait Backend: Sized {
    type Buffer;
    type Shader;
    type Pipeline;
    /// Uniform buffer attached to the vertex stage.
    type Binding;

    /// Drawable size of the default render target in physical pixels.
    fn surface_size(&self) -> (u32, u32);

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<Self::Buffer, DeviceError>;

    fn write_buffer(
        &mut self,
        buffer: &Self::Buffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), DeviceError>;

    /// Compiles `desc.source`. `Err` carries the compiler's full message.
    fn compile_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<Self::Shader, String>;

    fn create_uniform_binding(&mut self, buffer: &Self::Buffer) -> Result<Self::Binding, DeviceError>;

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_, Self>) -> Result<Self::Pipeline, DeviceError>;

    /// Executes `pass` against the current frame's render target.
    fn submit(&mut self, pass: &PassDesc<'_, Self>) -> Result<(), DeviceError>;

    /// Presents the current frame. `vsync_interval >= 1` waits for vertical sync.
    fn present(&mut self, vsync_interval: u32) -> Result<(), DeviceError>;

    /// Resizes the default render target. Zero sizes are recorded but deferred.
    fn resize(&mut self, width: u32, height: u32);
}
