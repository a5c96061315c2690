//! Error type for the render core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render core is not initialized")]
    BackendNotInitialized,

    #[error("invalid framebuffer size {width}x{height}")]
    SizeMismatch { width: usize, height: usize },

    #[error("mesh '{name}' has no vertex stream (stride {stride}, {len} floats)")]
    MissingVertexStream { name: String, stride: usize, len: usize },

    #[error("unsupported vertex stride {0} (expected at least 32 bytes)")]
    UnsupportedStride(usize),

    #[error("texture '{0}' has no pixel data")]
    TextureInvalid(String),

    #[error("unsupported channel count {0}")]
    UnsupportedChannels(u8),

    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("invalid view: {0}")]
    InvalidView(&'static str),

    #[error("no view data set for this frame")]
    NoViewData,

    #[error("a frame is already open")]
    FrameAlreadyOpen,

    #[error("no frame is open")]
    FrameNotOpen,
}
