//! RGBA8 textures
//!
//! Pixels are stored packed in `byte_order`. Sampling is point sampling with
//! clamped, rounded coordinates; there is no filtering or wrapping.

use std::path::Path;
use super::buffer::Buffer2D;
use super::error::RenderError;
use super::math::Vec2;
use super::types::{swap_red_blue, ByteOrder, Color};

#[derive(Debug, Clone)]
pub struct Texture {
    pixels: Buffer2D<u32>,
    channels: u8,
    byte_order: ByteOrder,
    pub name: String,
}

impl Texture {
    /// Solid white texture
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: Buffer2D::with_value(width, height, Color::WHITE.pack(ByteOrder::Rgba)),
            channels: 4,
            byte_order: ByteOrder::Rgba,
            name: String::new(),
        }
    }

    /// Copy-in from tightly packed 8-bit data with 1, 3 or 4 channels.
    /// Grey and RGB data is expanded to opaque RGBA.
    pub fn from_raw(
        width: usize,
        height: usize,
        channels: u8,
        bytes: &[u8],
        name: &str,
    ) -> Result<Self, RenderError> {
        if !matches!(channels, 1 | 3 | 4) {
            return Err(RenderError::UnsupportedChannels(channels));
        }
        let count = width * height;
        if count == 0 || bytes.len() < count * channels as usize {
            return Err(RenderError::TextureInvalid(name.to_string()));
        }

        let packed: Vec<u32> = bytes
            .chunks_exact(channels as usize)
            .take(count)
            .map(|p| {
                let color = match p {
                    [l] => Color::new(*l, *l, *l),
                    [r, g, b] => Color::new(*r, *g, *b),
                    [r, g, b, a] => Color::with_alpha(*r, *g, *b, *a),
                    _ => Color::BLACK,
                };
                color.pack(ByteOrder::Rgba)
            })
            .collect();

        Ok(Self {
            pixels: Buffer2D::from_slice(&packed, width, height)?,
            channels,
            byte_order: ByteOrder::Rgba,
            name: name.to_string(),
        })
    }

    pub fn from_rgba8(width: usize, height: usize, bytes: &[u8], name: &str) -> Result<Self, RenderError> {
        Self::from_raw(width, height, 4, bytes, name)
    }

    /// Build from colors laid out row by row
    pub fn from_colors(width: usize, height: usize, colors: &[Color], name: &str) -> Result<Self, RenderError> {
        let bytes: Vec<u8> = colors.iter().flat_map(|c| c.to_bytes()).collect();
        Self::from_rgba8(width, height, &bytes, name)
    }

    /// Load texture from an image file.
    /// Rows are flipped so v = 0 addresses the bottom of the image.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let img = image::open(path)?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Self::from_image(img, &name)
    }

    /// Decode texture from encoded image bytes (PNG, JPEG, BMP)
    pub fn from_bytes(bytes: &[u8], name: &str) -> Result<Self, RenderError> {
        let img = image::load_from_memory(bytes)?;
        Self::from_image(img, name)
    }

    fn from_image(img: image::DynamicImage, name: &str) -> Result<Self, RenderError> {
        let channels = img.color().channel_count().clamp(1, 4);
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut tex = Self::from_rgba8(width as usize, height as usize, rgba.as_raw(), name)?;
        tex.channels = match channels {
            2 => 4, // grey + alpha is carried as RGBA
            c => c,
        };
        tex.flip_vertical();
        Ok(tex)
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Self {
        let mut pixels = Buffer2D::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 4) + (y / 4)) % 2 == 0;
                let c = if checker { color1 } else { color2 };
                pixels.set_pixel(x, y, c.pack(ByteOrder::Rgba));
            }
        }
        Self {
            pixels,
            channels: 4,
            byte_order: ByteOrder::Rgba,
            name: "checkerboard".to_string(),
        }
    }

    pub fn width(&self) -> usize {
        self.pixels.width()
    }

    pub fn height(&self) -> usize {
        self.pixels.height()
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn pixels(&self) -> &Buffer2D<u32> {
        &self.pixels
    }

    /// Stored bytes, row-major, four per pixel in `byte_order`
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.pixels.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.as_slice().is_empty()
    }

    /// Reorder every pixel's channels from the current order to `target`
    pub fn set_byte_order(&mut self, target: ByteOrder) {
        if target == self.byte_order {
            return;
        }
        for px in self.pixels.as_mut_slice() {
            *px = swap_red_blue(*px);
        }
        self.byte_order = target;
    }

    pub fn flip_vertical(&mut self) {
        self.pixels.flip_vertical();
    }

    pub fn get_pixel_as_color(&self, x: usize, y: usize) -> Color {
        Color::unpack(self.pixels.get_pixel(x, y), self.byte_order)
    }

    /// Point sample at UV coordinates (nearest texel, clamped).
    /// An empty texture samples as white.
    pub fn sample(&self, uv: Vec2) -> Color {
        if self.is_empty() {
            return Color::WHITE;
        }
        let w = self.width();
        let h = self.height();
        let tx = ((uv.x * (w - 1) as f32).round() as i64).clamp(0, w as i64 - 1);
        let ty = ((uv.y * (h - 1) as f32).round() as i64).clamp(0, h as i64 - 1);
        self.get_pixel_as_color(tx as usize, ty as usize)
    }
}
