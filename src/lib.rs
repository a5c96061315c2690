//! softraster: a CPU-only triangle rasterizer
//!
//! The core takes triangle lists, a camera and a set of render flags and
//! produces a color buffer plus a depth buffer. Windowing and input live in
//! the viewer binary.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod rasterizer;

pub use config::{load_config, load_config_from_str, save_config, ConfigError, RenderConfig};
pub use rasterizer::{RenderCore, RenderError};
