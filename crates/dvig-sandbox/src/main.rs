use anyhow::Result;
use dvig_engine::config::AppSpec;
use dvig_engine::core::{App, FrameCtx};
use dvig_engine::device::Backend;
use dvig_engine::input::{Event, Key};
use dvig_engine::logging::{LoggingConfig, init_logging};
use dvig_engine::render::{
    BufferUsage, DEFAULT_PIXEL_ENTRY, DEFAULT_VERTEX_ENTRY, NamedUniformBuffer, PixelShader,
    VertexBuffer, VertexFormat, VertexLayout, VertexShader,
};
use dvig_engine::window::Runtime;
use glam::{Mat4, Vec2, Vec4};

const TRIANGLE_SHADER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/triangle.wgsl");

const BOX_SIZE: f32 = 48.0;
const BOX_SPEED: f32 = 240.0;

/// Position (x, y) then color (r, g, b).
const TRIANGLE: [[f32; 5]; 3] = [
    [0.0, 0.5, 1.0, 0.2, 0.2],
    [-0.5, -0.5, 0.2, 1.0, 0.2],
    [0.5, -0.5, 0.2, 0.2, 1.0],
];

struct Triangle<B: Backend> {
    buffer: VertexBuffer<B>,
    vertex: VertexShader<B>,
    pixel: PixelShader<B>,
}

/// Bouncing box on fixed steps plus a tinted triangle on the variable step.
struct Sandbox<B: Backend> {
    pos: Vec2,
    vel: Vec2,
    paused: bool,
    elapsed: f32,
    params: NamedUniformBuffer,
    triangle: Option<Triangle<B>>,
}

impl<B: Backend> Sandbox<B> {
    fn new() -> Self {
        let mut params = NamedUniformBuffer::new();
        params.add_data("tint", &[1.0f32; 4]);
        params.add_data("offset", &[0.0f32; 4]);

        Self {
            pos: Vec2::new(64.0, 64.0),
            vel: Vec2::new(BOX_SPEED, BOX_SPEED * 0.6),
            paused: false,
            elapsed: 0.0,
            params,
            triangle: None,
        }
    }
}

impl<B: Backend> App<B> for Sandbox<B> {
    fn init(&mut self, ctx: &mut FrameCtx<'_, B>) -> Result<()> {
        let renderer = &mut *ctx.renderer;
        let layout = VertexLayout::packed(&[VertexFormat::Float32x2, VertexFormat::Float32x3]);
        let vertex = renderer.compile_vertex_shader(
            TRIANGLE_SHADER,
            layout,
            Some(self.params.len() as u64),
            DEFAULT_VERTEX_ENTRY,
        )?;
        let pixel = renderer.compile_pixel_shader(TRIANGLE_SHADER, DEFAULT_PIXEL_ENTRY)?;
        let buffer = renderer.create_vertex_buffer_from(&TRIANGLE, BufferUsage::Static)?;

        self.triangle = Some(Triangle {
            buffer,
            vertex,
            pixel,
        });
        Ok(())
    }

    fn fixed_update(&mut self, ctx: &mut FrameCtx<'_, B>, dt: f32) -> Result<()> {
        if self.paused {
            return Ok(());
        }

        let mut steer = Vec2::ZERO;
        if ctx.is_key_down(Key::ArrowLeft) {
            steer.x -= 1.0;
        }
        if ctx.is_key_down(Key::ArrowRight) {
            steer.x += 1.0;
        }
        if ctx.is_key_down(Key::ArrowUp) {
            steer.y -= 1.0;
        }
        if ctx.is_key_down(Key::ArrowDown) {
            steer.y += 1.0;
        }
        self.vel += steer * BOX_SPEED * dt * 4.0;

        let (w, h) = ctx.renderer.backend().surface_size();
        let bounds = Vec2::new(w as f32, h as f32) - Vec2::splat(BOX_SIZE);
        self.pos += self.vel * dt;

        if self.pos.x < 0.0 || self.pos.x > bounds.x {
            self.vel.x = -self.vel.x;
        }
        if self.pos.y < 0.0 || self.pos.y > bounds.y {
            self.vel.y = -self.vel.y;
        }
        self.pos = self.pos.clamp(Vec2::ZERO, bounds.max(Vec2::ZERO));
        Ok(())
    }

    fn update(&mut self, ctx: &mut FrameCtx<'_, B>, dt: f32) -> Result<()> {
        while let Some(event) = ctx.poll_event() {
            match event {
                Event::Close | Event::KeyPressed { key: Key::Escape } => ctx.close(),
                Event::KeyPressed { key: Key::Space } => {
                    self.paused = !self.paused;
                    log::info!("paused: {}", self.paused);
                }
                Event::KeyPressed { key } => log::debug!("key pressed: {key}"),
            }
        }

        self.elapsed += dt;
        let t = self.elapsed;
        self.params
            .set_data("tint", &[0.75 + 0.25 * t.sin(), 1.0, 0.75 + 0.25 * t.cos(), 1.0]);
        self.params
            .set_data("offset", &[0.25 * (t * 0.5).sin(), 0.0, 0.0, 0.0]);
        Ok(())
    }

    fn render(&mut self, ctx: &mut FrameCtx<'_, B>, _dt: f32) -> Result<()> {
        let renderer = &mut *ctx.renderer;
        renderer.clear_color(Vec4::new(0.08, 0.09, 0.11, 1.0))?;

        if let Some(tri) = &self.triangle {
            renderer.sync_uniforms(&tri.vertex, &mut self.params)?;
            renderer.bind_vertex_buffer(&tri.buffer);
            renderer.bind_vertex_shader(&tri.vertex);
            renderer.bind_pixel_shader(&tri.pixel);
            renderer.draw(tri.buffer.count(), 0)?;
        }

        // Pixel space, top-left origin.
        let (w, h) = renderer.backend().surface_size();
        let ortho = Mat4::orthographic_rh(0.0, w as f32, h as f32, 0.0, -1.0, 1.0);
        renderer.draw_rect(
            self.pos,
            Vec2::splat(BOX_SIZE),
            Vec4::new(0.95, 0.65, 0.2, 1.0),
            ortho,
        )?;
        Ok(())
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let spec = AppSpec::from_env()
        .title("dvig sandbox")
        .size(1280, 720)
        .fixed_ups(50.0);
    log::info!("starting with args {:?}", spec.args);

    Runtime::run(spec, Sandbox::new())
}
