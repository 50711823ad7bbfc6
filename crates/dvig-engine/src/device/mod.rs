//! Graphics device seam and its implementations.
//!
//! - [`Backend`]: the trait the renderer talks to
//! - [`WgpuBackend`]: wgpu device + window surface
//! - [`HeadlessBackend`]: in-memory recorder used without a GPU

mod backend;
mod conversions;
mod gpu;
mod headless;
mod init;
mod surface;

pub use backend::{Backend, BufferDesc, BufferKind, DrawCall, PassDesc, PipelineDesc, ShaderDesc};
pub use gpu::WgpuBackend;
pub use headless::{
    HeadlessBackend, HeadlessBinding, HeadlessBuffer, HeadlessPipeline, HeadlessShader,
    RecordedDraw, RecordedPass,
};
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
