//! CPU scanline rasterizer
//!
//! Pipeline per frame:
//! - clear color and depth
//! - transform each triangle to clip space, clip against the near plane
//! - divide and map to the viewport, reject back faces by winding
//! - walk the screen AABB with edge functions, depth test, shade
//! - draw wireframe and normal overlays with clipped Bresenham lines

mod buffer;
mod clip;
mod error;
mod framebuffer;
mod grid;
mod logging;
mod math;
mod mesh;
mod raster;
mod render;
mod shader;
mod texture;
mod types;
mod view;

pub use buffer::*;
pub use clip::*;
pub use error::*;
pub use framebuffer::*;
pub use grid::*;
pub use logging::*;
pub use math::*;
pub use mesh::*;
pub use raster::*;
pub use render::*;
pub use shader::*;
pub use texture::*;
pub use types::*;
pub use view::*;
