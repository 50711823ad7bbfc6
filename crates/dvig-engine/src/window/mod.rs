//! Windowed runtime.
//!
//! Wires the `winit` platform pump, the wgpu backend and the frame driver.

mod runtime;

pub use runtime::Runtime;
