//! Core types for the rasterizer

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use super::math::{Vec2, Vec3};

/// Channel order of a packed pixel in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    Rgba,
    Bgra,
}

impl ByteOrder {
    /// Order the platform's present path expects (Windows DIBs are BGRA)
    pub fn platform() -> Self {
        if cfg!(windows) {
            ByteOrder::Bgra
        } else {
            ByteOrder::Rgba
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::platform()
    }
}

/// Swap the R and B byte positions of a stored pixel
#[inline]
pub fn swap_red_blue(px: u32) -> u32 {
    let [a, b, c, d] = px.to_ne_bytes();
    u32::from_ne_bytes([c, b, a, d])
}

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Apply shading (multiply by intensity 0.0-1.0), alpha untouched
    pub fn shade(self, intensity: f32) -> Self {
        let i = intensity.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * i) as u8,
            g: (self.g as f32 * i) as u8,
            b: (self.b as f32 * i) as u8,
            a: self.a,
        }
    }

    /// Linear interpolation toward `other` (t = 0 gives self)
    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Normal alpha blend of `src` over self with the given alpha
    pub fn blend_normal(self, src: Color, alpha: f32) -> Self {
        let out = self.lerp(src, alpha);
        Self { a: self.a.max(out.a), ..out }
    }

    /// Packed 0xAARRGGBB
    pub fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    pub fn from_argb(px: u32) -> Self {
        Self {
            a: (px >> 24) as u8,
            r: (px >> 16) as u8,
            g: (px >> 8) as u8,
            b: px as u8,
        }
    }

    /// Pack for storage so the pixel's bytes in memory follow `order`
    #[inline]
    pub fn pack(self, order: ByteOrder) -> u32 {
        match order {
            ByteOrder::Rgba => u32::from_ne_bytes([self.r, self.g, self.b, self.a]),
            ByteOrder::Bgra => u32::from_ne_bytes([self.b, self.g, self.r, self.a]),
        }
    }

    #[inline]
    pub fn unpack(px: u32, order: ByteOrder) -> Self {
        let [c0, g, c2, a] = px.to_ne_bytes();
        match order {
            ByteOrder::Rgba => Self { r: c0, g, b: c2, a },
            ByteOrder::Bgra => Self { r: c2, g, b: c0, a },
        }
    }

    /// Convert to [u8; 4] in RGBA order
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Byte stride of one vertex in a mesh stream
pub const VERTEX_STRIDE: usize = std::mem::size_of::<Vertex>();

/// Float lanes per vertex: px, py, pz, nx, ny, nz, u, v
pub const VERTEX_FLOATS: usize = 8;

/// A vertex with position, normal and texture coordinate.
/// Layout matches the 32-byte mesh stream exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

const _: () = assert!(VERTEX_STRIDE == VERTEX_FLOATS * 4);

impl Vertex {
    pub fn new(pos: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self { pos, normal, uv }
    }

    pub fn from_pos(x: f32, y: f32, z: f32) -> Self {
        Self {
            pos: Vec3::new(x, y, z),
            normal: Vec3::ZERO,
            uv: Vec2::ZERO,
        }
    }

    pub fn with_uv(mut self, u: f32, v: f32) -> Self {
        self.uv = Vec2::new(u, v);
        self
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }
}

/// Ordered vertex triple; the order defines winding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v: [Vertex; 3],
}

impl Triangle {
    pub fn new(a: Vertex, b: Vertex, c: Vertex) -> Self {
        Self { v: [a, b, c] }
    }
}

/// A single render setting bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RenderFlag {
    Wireframe = 1,
    Shaded = 4,
    Depth = 8,
    Textures = 16,
    Lights = 32,
    Normals = 64,
}

impl RenderFlag {
    pub const ALL: [RenderFlag; 6] = [
        RenderFlag::Wireframe,
        RenderFlag::Shaded,
        RenderFlag::Depth,
        RenderFlag::Textures,
        RenderFlag::Lights,
        RenderFlag::Normals,
    ];

    pub fn bit(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            RenderFlag::Wireframe => "Wireframe",
            RenderFlag::Shaded => "Shaded",
            RenderFlag::Depth => "Depth",
            RenderFlag::Textures => "Textures",
            RenderFlag::Lights => "Lights",
            RenderFlag::Normals => "Normals",
        }
    }
}

/// Render settings bitmask. Serialized as a list of flag names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<RenderFlag>", into = "Vec<RenderFlag>")]
pub struct RenderSettings(u8);

impl RenderSettings {
    pub const NONE: RenderSettings = RenderSettings(0);

    const MASK: u8 = 1 | 4 | 8 | 16 | 32 | 64;

    /// Build from raw bits; unknown bits are dropped
    pub fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn from_flags(flags: &[RenderFlag]) -> Self {
        Self(flags.iter().fold(0, |acc, f| acc | f.bit()))
    }

    pub fn with(self, flag: RenderFlag) -> Self {
        Self(self.0 | flag.bit())
    }

    pub fn is_enabled(self, flag: RenderFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn set(&mut self, flag: RenderFlag, enabled: bool) {
        if enabled {
            self.0 |= flag.bit();
        } else {
            self.0 &= !flag.bit();
        }
    }

    pub fn toggle(&mut self, flag: RenderFlag) {
        self.0 ^= flag.bit();
    }

    pub fn flags(self) -> Vec<RenderFlag> {
        RenderFlag::ALL
            .iter()
            .copied()
            .filter(|f| self.is_enabled(*f))
            .collect()
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings::from_flags(&[RenderFlag::Shaded, RenderFlag::Depth])
    }
}

impl From<Vec<RenderFlag>> for RenderSettings {
    fn from(flags: Vec<RenderFlag>) -> Self {
        RenderSettings::from_flags(&flags)
    }
}

impl From<RenderSettings> for Vec<RenderFlag> {
    fn from(settings: RenderSettings) -> Self {
        settings.flags()
    }
}

/// Overlay line colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub wire: Color,
    pub grid: Color,
    pub normal: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            wire: Color::new(230, 230, 230),
            grid: Color::new(50, 50, 60),
            normal: Color::new(255, 200, 40),
        }
    }
}

/// How the color buffer is cleared at the start of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearMode {
    Solid(Color),
    /// Vertical gradient, `top` at row 0 and `bottom` at the last row
    Gradient { top: Color, bottom: Color },
}

impl Default for ClearMode {
    fn default() -> Self {
        ClearMode::Solid(Color::new(30, 30, 40))
    }
}

/// Directional light used when the Lights flag is on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lighting {
    /// Direction the light travels
    pub direction: Vec3,
    /// Ambient light intensity (0.0-1.0)
    pub ambient: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-1.0, -1.0, 1.0).normalize(),
            ambient: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_shaded_depth() {
        let s = RenderSettings::default();
        assert_eq!(s.bits(), 12);
        assert!(s.is_enabled(RenderFlag::Shaded));
        assert!(s.is_enabled(RenderFlag::Depth));
        assert!(!s.is_enabled(RenderFlag::Wireframe));
    }

    #[test]
    fn test_toggle_touches_one_flag() {
        let mut s = RenderSettings::default();
        s.toggle(RenderFlag::Wireframe);
        assert_eq!(s.bits(), 13);
        s.toggle(RenderFlag::Depth);
        assert_eq!(s.bits(), 5);
        s.set(RenderFlag::Depth, true);
        s.set(RenderFlag::Depth, true);
        assert_eq!(s.bits(), 13);
    }

    #[test]
    fn test_from_bits_drops_unknown() {
        assert_eq!(RenderSettings::from_bits(0xFF).bits(), 125);
        assert_eq!(RenderSettings::from_bits(2), RenderSettings::NONE);
    }

    #[test]
    fn test_settings_serialize_as_names() {
        let s = RenderSettings::default().with(RenderFlag::Normals);
        let text = ron::to_string(&s).unwrap();
        assert_eq!(text, "[Shaded,Depth,Normals]");
        let back: RenderSettings = ron::from_str(&text).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_pack_memory_order() {
        let c = Color::with_alpha(10, 20, 30, 40);
        assert_eq!(c.pack(ByteOrder::Rgba).to_ne_bytes(), [10, 20, 30, 40]);
        assert_eq!(c.pack(ByteOrder::Bgra).to_ne_bytes(), [30, 20, 10, 40]);
        assert_eq!(Color::unpack(c.pack(ByteOrder::Bgra), ByteOrder::Bgra), c);
        assert_eq!(swap_red_blue(c.pack(ByteOrder::Rgba)), c.pack(ByteOrder::Bgra));
    }

    #[test]
    fn test_argb_roundtrip() {
        let c = Color::with_alpha(1, 2, 3, 4);
        assert_eq!(c.to_argb(), 0x04010203);
        assert_eq!(Color::from_argb(c.to_argb()), c);
    }

    #[test]
    fn test_shade_keeps_alpha() {
        let c = Color::with_alpha(200, 100, 50, 77).shade(0.5);
        assert_eq!(c, Color::with_alpha(100, 50, 25, 77));
    }

    #[test]
    fn test_blend_normal_endpoints() {
        let dst = Color::BLACK;
        assert_eq!(dst.blend_normal(Color::WHITE, 0.0), Color::BLACK);
        assert_eq!(dst.blend_normal(Color::WHITE, 1.0), Color::WHITE);
        assert_eq!(dst.blend_normal(Color::WHITE, 0.5), Color::new(128, 128, 128));
    }

    #[test]
    fn test_vertex_is_32_bytes() {
        assert_eq!(VERTEX_STRIDE, 32);
        let v = Vertex::from_pos(1.0, 2.0, 3.0).with_normal(Vec3::UP).with_uv(0.5, 0.25);
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&v));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 0.0, 1.0, 0.0, 0.5, 0.25]);
    }
}
