//! dvig engine crate.
//!
//! A fixed-timestep application loop over a small stateful rendering layer:
//! buffers and shaders are created through [`render::Renderer`], bound, and
//! drawn; [`core::FrameDriver`] runs the loop and [`window::Runtime`] wires it to
//! a real window and GPU.

pub mod config;
pub mod core;
pub mod device;
pub mod diagnostics;
pub mod input;
pub mod render;
pub mod time;
pub mod window;

pub mod logging;

pub use glam;
