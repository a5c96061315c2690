//! Color and depth targets
//!
//! Color cells hold pixels packed in `byte_order`; depth cells hold f32 bit
//! patterns. Depth clears to `f32::MAX`.

use super::buffer::Buffer2D;
use super::error::RenderError;
use super::types::{ByteOrder, ClearMode, Color};

pub struct Framebuffer {
    color: Buffer2D<u32>,
    depth: Buffer2D<u32>,
    byte_order: ByteOrder,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize, byte_order: ByteOrder) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::SizeMismatch { width, height });
        }
        let mut fb = Self {
            color: Buffer2D::new(width, height),
            depth: Buffer2D::new(width, height),
            byte_order,
        };
        fb.depth.fill_float(f32::MAX);
        Ok(fb)
    }

    pub fn width(&self) -> usize {
        self.color.width()
    }

    pub fn height(&self) -> usize {
        self.color.height()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Reallocate both targets; the old size is kept when the new one is empty
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::SizeMismatch { width, height });
        }
        self.color.resize(width, height);
        self.depth.resize(width, height);
        self.depth.fill_float(f32::MAX);
        Ok(())
    }

    pub fn clear(&mut self, mode: ClearMode) {
        match mode {
            ClearMode::Solid(color) => self.color.fill(color.pack(self.byte_order)),
            ClearMode::Gradient { top, bottom } => {
                let h = self.height();
                let denom = h.saturating_sub(1).max(1) as f32;
                for y in 0..h {
                    let c = top.lerp(bottom, y as f32 / denom);
                    self.color.fill_row(y, c.pack(self.byte_order));
                }
            }
        }
        self.depth.fill_float(f32::MAX);
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width() && (y as usize) < self.height()
    }

    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        self.color.set_pixel(x, y, color.pack(self.byte_order));
    }

    #[inline]
    pub fn get_color(&self, x: usize, y: usize) -> Color {
        Color::unpack(self.color.get_pixel(x, y), self.byte_order)
    }

    #[inline]
    pub fn depth_at(&self, x: usize, y: usize) -> f32 {
        self.depth.get_pixel_as_float(x, y)
    }

    #[inline]
    pub fn set_depth(&mut self, x: usize, y: usize, z: f32) {
        self.depth.set_pixel_from_float(x, y, z);
    }

    /// Blend `src` over the stored pixel with the given alpha
    pub fn blend_pixel(&mut self, x: usize, y: usize, src: Color, alpha: f32) {
        let dst = self.get_color(x, y);
        self.set_pixel(x, y, dst.blend_normal(src, alpha));
    }

    /// Alpha-blended filled rectangle, clipped to the viewport.
    /// Uses the color's own alpha. Returns the number of pixels touched.
    pub fn fill_rect_blended(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) -> usize {
        let x0 = x.max(0) as i64;
        let y0 = y.max(0) as i64;
        let x1 = (x as i64 + w as i64).min(self.width() as i64);
        let y1 = (y as i64 + h as i64).min(self.height() as i64);
        if x0 >= x1 || y0 >= y1 {
            return 0;
        }

        let alpha = color.a as f32 / 255.0;
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px as usize, py as usize, color, alpha);
            }
        }
        ((x1 - x0) * (y1 - y0)) as usize
    }

    /// Swap rows top-to-bottom in both targets
    pub fn flip_vertical(&mut self) {
        self.color.flip_vertical();
        self.depth.flip_vertical();
    }

    pub fn color(&self) -> &Buffer2D<u32> {
        &self.color
    }

    pub fn depth(&self) -> &Buffer2D<u32> {
        &self.depth
    }

    /// Color target as raw bytes, four per pixel in `byte_order`
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.color.as_slice())
    }
}
