//! Application configuration.

mod spec;

pub use spec::{AppSpec, CORE_SHADER_DIR};
