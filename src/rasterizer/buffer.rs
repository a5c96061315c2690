//! Typed 2D pixel surface
//!
//! Row-major storage with `pitch == width` (in elements). Out-of-bounds access
//! is caught by debug assertions only; release builds index unchecked rows.

use super::error::RenderError;

#[derive(Debug, Clone, PartialEq)]
pub struct Buffer2D<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Copy + Default> Buffer2D<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_value(width, height, T::default())
    }

    pub fn with_value(width: usize, height: usize, value: T) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Copy-in constructor from external storage of at least `width * height` cells
    pub fn from_slice(data: &[T], width: usize, height: usize) -> Result<Self, RenderError> {
        let len = width * height;
        if width == 0 || height == 0 || data.len() < len {
            return Err(RenderError::SizeMismatch { width, height });
        }
        Ok(Self {
            data: data[..len].to_vec(),
            width,
            height,
        })
    }

    /// Reallocate; previous contents are discarded
    pub fn resize(&mut self, width: usize, height: usize) {
        debug_assert!(width > 0 && height > 0, "resize to {}x{}", width, height);
        self.width = width;
        self.height = height;
        self.data = vec![T::default(); width * height];
    }
}

impl<T: Copy> Buffer2D<T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row stride in elements
    pub fn pitch(&self) -> usize {
        self.width
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) outside {}x{} buffer",
            x,
            y,
            self.width,
            self.height
        );
        y * self.width + x
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    pub fn fill_row(&mut self, row: usize, value: T) {
        self.scanline_mut(row).fill(value);
    }

    /// The `width` contiguous cells of row `row`
    pub fn scanline(&self, row: usize) -> &[T] {
        debug_assert!(row < self.height, "row {} outside {} rows", row, self.height);
        let start = row * self.width;
        &self.data[start..start + self.width]
    }

    pub fn scanline_mut(&mut self, row: usize) -> &mut [T] {
        debug_assert!(row < self.height, "row {} outside {} rows", row, self.height);
        let start = row * self.width;
        &mut self.data[start..start + self.width]
    }

    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> T {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Swap row r with row h-1-r
    pub fn flip_vertical(&mut self) {
        let w = self.width;
        let h = self.height;
        for r in 0..h / 2 {
            let (top, bottom) = self.data.split_at_mut((h - 1 - r) * w);
            top[r * w..(r + 1) * w].swap_with_slice(&mut bottom[..w]);
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

/// Float view of 32-bit cells (bit-cast, not value cast). Used for depth.
impl Buffer2D<u32> {
    #[inline]
    pub fn get_pixel_as_float(&self, x: usize, y: usize) -> f32 {
        f32::from_bits(self.get_pixel(x, y))
    }

    #[inline]
    pub fn set_pixel_from_float(&mut self, x: usize, y: usize, value: f32) {
        self.set_pixel(x, y, value.to_bits());
    }

    pub fn fill_float(&mut self, value: f32) {
        self.fill(value.to_bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_fill_row() {
        let mut buf: Buffer2D<u32> = Buffer2D::new(3, 2);
        buf.fill(7);
        assert!(buf.as_slice().iter().all(|&v| v == 7));
        buf.fill_row(1, 9);
        assert_eq!(buf.scanline(0), &[7, 7, 7]);
        assert_eq!(buf.scanline(1), &[9, 9, 9]);
        assert_eq!(buf.pitch(), 3);
    }

    #[test]
    fn test_row_offsets() {
        let data: Vec<u32> = (0..12).collect();
        let buf = Buffer2D::from_slice(&data, 4, 3).unwrap();
        assert_eq!(buf.scanline(2), &[8, 9, 10, 11]);
        assert_eq!(buf.get_pixel(1, 2), 9);
    }

    #[test]
    fn test_from_slice_too_short() {
        let data = [0u32; 5];
        assert!(matches!(
            Buffer2D::from_slice(&data, 3, 2),
            Err(RenderError::SizeMismatch { width: 3, height: 2 })
        ));
    }

    #[test]
    fn test_float_bitcast_is_exact() {
        let mut buf: Buffer2D<u32> = Buffer2D::new(2, 2);
        for v in [0.0f32, 0.5, 1.0, f32::MAX, -0.0, 1e-30] {
            buf.set_pixel_from_float(1, 1, v);
            assert_eq!(buf.get_pixel(1, 1), v.to_bits());
            assert_eq!(buf.get_pixel_as_float(1, 1).to_bits(), v.to_bits());
        }
    }

    #[test]
    fn test_flip_twice_is_identity() {
        for h in [1usize, 2, 5, 6] {
            let data: Vec<u32> = (0..(3 * h) as u32).collect();
            let mut buf = Buffer2D::from_slice(&data, 3, h).unwrap();
            buf.flip_vertical();
            if h > 1 {
                assert_eq!(buf.scanline(0), &data[(h - 1) * 3..h * 3]);
            }
            buf.flip_vertical();
            assert_eq!(buf.as_slice(), data.as_slice());
        }
    }

    #[test]
    fn test_resize_discards() {
        let mut buf: Buffer2D<u32> = Buffer2D::with_value(2, 2, 5);
        buf.resize(3, 1);
        assert_eq!(buf.width(), 3);
        assert_eq!(buf.height(), 1);
        assert_eq!(buf.as_slice(), &[0, 0, 0]);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic]
    fn test_out_of_bounds_panics_in_debug() {
        let buf: Buffer2D<u32> = Buffer2D::new(2, 2);
        // (2, 0) would alias row 1 without the debug check
        let _ = buf.get_pixel(2, 0);
    }
}
