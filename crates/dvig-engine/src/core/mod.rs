//! Host application contract and the frame loop that drives it.
//!
//! The driver is generic over the device [`Backend`](crate::device::Backend), so
//! the same loop runs against a window surface or the headless recorder.

mod app;
mod ctx;
mod driver;

pub use app::{App, LoopState};
pub use ctx::FrameCtx;
pub use driver::FrameDriver;
