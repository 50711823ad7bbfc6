//! Platform bindings for the input subsystem.

mod winit;

pub use self::winit::WinitPlatform;
