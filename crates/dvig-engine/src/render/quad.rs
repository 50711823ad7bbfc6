use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec4};

use crate::device::Backend;
use crate::diagnostics::{AssetError, RenderError, RenderResult};

use super::renderer::Renderer;
use super::resources::{PixelShader, VertexBuffer, VertexShader};
use super::shader::{DEFAULT_PIXEL_ENTRY, DEFAULT_VERTEX_ENTRY};
use super::types::{BufferUsage, Topology, VertexFormat, VertexLayout};

/// File name of the 2D mesh shader inside the core shader directory.
pub const MESH2D_SHADER: &str = "mesh2d.wgsl";

/// Vertex of the shared quad buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex2D {
    pub pos: [f32; 2],
}

/// Uniform block of `mesh2d.wgsl` (WGSL layout: vec4 then mat4x4, 80 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Mesh2dUniform {
    pub color: [f32; 4],
    pub transform: [[f32; 4]; 4],
}

/// Shader pair and scratch buffer behind [`Renderer::draw_quad`].
pub(crate) struct CoreResources<B: Backend> {
    vertex: VertexShader<B>,
    pixel: PixelShader<B>,
    quad: VertexBuffer<B>,
}

impl<B: Backend> Clone for CoreResources<B> {
    fn clone(&self) -> Self {
        Self {
            vertex: self.vertex.clone(),
            pixel: self.pixel.clone(),
            quad: self.quad.clone(),
        }
    }
}

impl<B: Backend> Renderer<B> {
    /// Compiles the core shaders found in `dir` and allocates the quad buffer.
    pub fn create_core_resources(&mut self, dir: impl AsRef<Path>) -> RenderResult<()> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return self.fail(AssetError::NotFound {
                path: dir.to_path_buf(),
            });
        }

        let path = dir.join(MESH2D_SHADER);
        let layout = VertexLayout::packed(&[VertexFormat::Float32x2]);
        let vertex = self.compile_vertex_shader(
            &path,
            layout,
            Some(size_of::<Mesh2dUniform>() as u64),
            DEFAULT_VERTEX_ENTRY,
        )?;
        let pixel = self.compile_pixel_shader(&path, DEFAULT_PIXEL_ENTRY)?;
        let quad =
            self.create_vertex_buffer(None, size_of::<Vertex2D>() as u64, 6, BufferUsage::Dynamic)?;

        log::info!("core resources ready ({})", dir.display());
        self.core = Some(CoreResources {
            vertex,
            pixel,
            quad,
        });
        Ok(())
    }

    /// Draws the quad `p1 p2 / p3 p4` as triangles `(p1, p4, p3)` and `(p1, p2, p4)`.
    ///
    /// Rebinds the core shader pair, the shared quad buffer and a triangle list.
    pub fn draw_quad(
        &mut self,
        p1: Vec2,
        p2: Vec2,
        p3: Vec2,
        p4: Vec2,
        color: Vec4,
        transform: Mat4,
    ) -> RenderResult<()> {
        let Some(core) = self.core.clone() else {
            return self.fail(RenderError::contract(
                "draw_quad called before create_core_resources",
            ));
        };

        let vertices = [p1, p4, p3, p1, p2, p4].map(|p| Vertex2D { pos: p.to_array() });
        self.update_vertex_buffer(&core.quad, &vertices)?;

        let uniform = Mesh2dUniform {
            color: color.to_array(),
            transform: transform.to_cols_array_2d(),
        };
        self.update_uniforms(&core.vertex, bytemuck::bytes_of(&uniform))?;

        self.bind_vertex_buffer(&core.quad);
        self.bind_vertex_shader(&core.vertex);
        self.bind_pixel_shader(&core.pixel);
        self.set_topology(Topology::TriangleList);
        self.draw(6, 0)
    }

    /// Axis-aligned rectangle at `pos` with extent `size`.
    pub fn draw_rect(&mut self, pos: Vec2, size: Vec2, color: Vec4, transform: Mat4) -> RenderResult<()> {
        self.draw_quad(
            pos,
            pos + Vec2::new(size.x, 0.0),
            pos + Vec2::new(0.0, size.y),
            pos + size,
            color,
            transform,
        )
    }

    /// The shared quad buffer, once core resources exist.
    pub fn quad_buffer(&self) -> Option<&VertexBuffer<B>> {
        self.core.as_ref().map(|core| &core.quad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CORE_SHADER_DIR;
    use crate::device::HeadlessBackend;
    use crate::diagnostics::ErrorPolicy;

    fn renderer() -> Renderer<HeadlessBackend> {
        let mut r = Renderer::new(HeadlessBackend::new(100, 100), ErrorPolicy::propagate_all());
        r.create_core_resources(CORE_SHADER_DIR).unwrap();
        r
    }

    fn floats(points: &[[f32; 2]]) -> Vec<u8> {
        bytemuck::cast_slice(points).to_vec()
    }

    #[test]
    fn uniform_block_matches_wgsl_layout() {
        assert_eq!(size_of::<Mesh2dUniform>(), 80);
        assert_eq!(size_of::<Vertex2D>(), 8);
    }

    #[test]
    fn draw_quad_writes_two_triangles_in_order() {
        let mut r = renderer();
        let (p1, p2, p3, p4) = (
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, 0.0),
            Vec2::new(0.0, 50.0),
            Vec2::new(50.0, 50.0),
        );
        r.draw_quad(p1, p2, p3, p4, Vec4::ONE, Mat4::IDENTITY).unwrap();
        assert_eq!(r.quad_buffer().map(|b| b.count()), Some(6));

        r.present(1).unwrap();
        let draw = r.backend().draws().next().cloned().unwrap();
        assert_eq!(draw.vertices, 0..6);
        assert_eq!(draw.topology, Topology::TriangleList);
        assert_eq!(
            draw.vertex_bytes,
            floats(&[
                [0.0, 0.0],
                [50.0, 50.0],
                [0.0, 50.0],
                [0.0, 0.0],
                [50.0, 0.0],
                [50.0, 50.0],
            ])
        );
    }

    #[test]
    fn each_quad_keeps_its_own_color() {
        let mut r = renderer();
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let blue = Vec4::new(0.0, 0.0, 1.0, 1.0);
        r.draw_rect(Vec2::ZERO, Vec2::splat(10.0), red, Mat4::IDENTITY).unwrap();
        r.draw_rect(Vec2::splat(20.0), Vec2::splat(10.0), blue, Mat4::IDENTITY)
            .unwrap();
        r.present(1).unwrap();

        let colors: Vec<[f32; 4]> = r
            .backend()
            .draws()
            .map(|d| {
                let bytes = d.uniform_bytes.as_deref().unwrap();
                bytemuck::pod_read_unaligned::<Mesh2dUniform>(bytes).color
            })
            .collect();
        assert_eq!(colors, vec![red.to_array(), blue.to_array()]);
    }

    #[test]
    fn draw_rect_expands_to_corners() {
        let mut r = renderer();
        r.draw_rect(
            Vec2::new(10.0, 20.0),
            Vec2::new(30.0, 40.0),
            Vec4::ONE,
            Mat4::IDENTITY,
        )
        .unwrap();
        r.present(1).unwrap();

        let draw = r.backend().draws().next().cloned().unwrap();
        assert_eq!(
            draw.vertex_bytes,
            floats(&[
                [10.0, 20.0],
                [40.0, 60.0],
                [10.0, 60.0],
                [10.0, 20.0],
                [40.0, 20.0],
                [40.0, 60.0],
            ])
        );
    }

    #[test]
    fn quad_before_core_resources_is_rejected() {
        let mut r = Renderer::new(HeadlessBackend::default(), ErrorPolicy::propagate_all());
        let err = r
            .draw_quad(Vec2::ZERO, Vec2::X, Vec2::Y, Vec2::ONE, Vec4::ONE, Mat4::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, RenderError::Contract(_)));
    }

    #[test]
    fn missing_core_directory_is_an_asset_error() {
        let mut r = Renderer::new(HeadlessBackend::default(), ErrorPolicy::propagate_all());
        let err = r.create_core_resources("/no/such/dir").unwrap_err();
        assert!(matches!(err, RenderError::Asset(AssetError::NotFound { .. })));
    }
}
