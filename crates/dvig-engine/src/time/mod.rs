//! Frame timing.
//!
//! - [`FrameClock`] measures wall-clock deltas between loop iterations.
//! - [`FixedStep`] turns those deltas into a whole number of fixed updates.

mod fixed_step;
mod frame_clock;

pub use fixed_step::FixedStep;
pub use frame_clock::{FrameClock, FrameTime};
