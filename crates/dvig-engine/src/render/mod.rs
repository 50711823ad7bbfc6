//! Resource factory, named uniforms and the bind/draw protocol.
//!
//! Convention:
//! - Positions handed to `draw_quad`/`draw_rect` go through the caller's transform;
//!   the core shader does no further projection.
//! - Viewports are in physical pixels with a top-left origin.

mod quad;
mod renderer;
mod resources;
mod shader;
mod types;
mod uniform;

pub use quad::{MESH2D_SHADER, Mesh2dUniform, Vertex2D};
pub use renderer::Renderer;
pub use resources::{PixelShader, VertexBuffer, VertexShader};
pub use shader::{DEFAULT_PIXEL_ENTRY, DEFAULT_VERTEX_ENTRY};
pub use types::{
    BufferUsage, ShaderStage, Topology, VertexAttribute, VertexFormat, VertexLayout, Viewport,
};
pub use uniform::{NamedUniformBuffer, UniformEntry};
