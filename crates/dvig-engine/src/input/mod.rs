//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The platform layer translates window system messages into an [`InputContext`].

mod context;
pub mod platform;
mod types;

pub use context::{EventPump, InputContext, NoPump};
pub use platform::WinitPlatform;
pub use types::{Event, Key};
