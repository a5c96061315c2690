//! Clipping and projection
//!
//! Clip space -> perspective divide -> viewport, plus near-plane clipping of
//! triangles and segments and Cohen-Sutherland clipping of 2D lines.
//! Viewport rows grow with NDC y, so screen space is y-up until the frame is
//! flipped for presentation.

use super::math::{edge_function, mat4_transform_vec4, Mat4, Vec2, Vec3, Vec4};

/// Vertex after the model-view-projection transform
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClipVertex {
    pub clip: Vec4,
    pub world: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl ClipVertex {
    fn lerp(&self, other: &ClipVertex, t: f32) -> ClipVertex {
        ClipVertex {
            clip: self.clip.lerp(other.clip, t),
            world: self.world.lerp(other.world, t),
            normal: self.normal.lerp(other.normal, t),
            uv: self.uv.lerp(other.uv, t),
        }
    }

    /// In front of the near plane (depth 0 after the divide)
    pub(crate) fn inside_near(&self) -> bool {
        self.clip.z >= 0.0 && self.clip.w > 0.0
    }
}

/// Vertex in viewport space. `pos.z` is the stored depth.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenVertex {
    pub pos: Vec3,
    pub inv_w: f32,
    pub world: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl ScreenVertex {
    /// Bare screen position with no attributes
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            pos: Vec3::new(x, y, z),
            inv_w: 1.0,
            ..Default::default()
        }
    }

    pub fn xy(&self) -> Vec2 {
        Vec2::new(self.pos.x, self.pos.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    /// Counter-clockwise in y-up screen space (positive area)
    Front,
    Back,
    Degenerate,
}

pub fn classify_winding(area: f32) -> Winding {
    if area > 0.0 {
        Winding::Front
    } else if area < 0.0 {
        Winding::Back
    } else {
        // Zero and NaN
        Winding::Degenerate
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTriangle {
    pub v: [ScreenVertex; 3],
}

impl ScreenTriangle {
    pub fn new(a: ScreenVertex, b: ScreenVertex, c: ScreenVertex) -> Self {
        Self { v: [a, b, c] }
    }

    /// Triangle at constant depth from three screen points
    pub fn from_points(points: [(f32, f32); 3], z: f32) -> Self {
        let [a, b, c] = points;
        Self::new(
            ScreenVertex::at(a.0, a.1, z),
            ScreenVertex::at(b.0, b.1, z),
            ScreenVertex::at(c.0, c.1, z),
        )
    }

    /// edge(s0, s1, s2)
    pub fn signed_area(&self) -> f32 {
        edge_function(self.v[0].xy(), self.v[1].xy(), self.v[2].xy())
    }

    pub fn winding(&self) -> Winding {
        classify_winding(self.signed_area())
    }
}

/// Perspective divide and viewport mapping. Caller guarantees `clip.w > 0`.
pub fn to_screen(clip: Vec4, width: usize, height: usize) -> Vec3 {
    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let ndc_z = clip.z / clip.w;
    Vec3::new(
        (ndc_x * 0.5 + 0.5) * width as f32,
        (ndc_y * 0.5 + 0.5) * height as f32,
        (ndc_z + 0.5) * 0.5,
    )
}

pub fn project_vertex(v: &ClipVertex, width: usize, height: usize) -> ScreenVertex {
    ScreenVertex {
        pos: to_screen(v.clip, width, height),
        inv_w: 1.0 / v.clip.w,
        world: v.world,
        normal: v.normal,
        uv: v.uv,
    }
}

/// Project a world point; None when it is behind the camera
pub fn project_point(vp: &Mat4, p: Vec3, width: usize, height: usize) -> Option<Vec3> {
    let clip = mat4_transform_vec4(vp, Vec4::point(p));
    if clip.w <= 0.0 {
        return None;
    }
    Some(to_screen(clip, width, height))
}

/// Triangle after near-plane clipping: the original 3 vertices or a quad
#[derive(Debug, Clone, Copy)]
pub struct ClippedPolygon {
    verts: [ClipVertex; 4],
    len: usize,
}

impl ClippedPolygon {
    pub fn vertices(&self) -> &[ClipVertex] {
        &self.verts[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len < 3
    }

    /// Fan triangulation around the first vertex
    pub fn triangles(&self) -> impl Iterator<Item = [ClipVertex; 3]> + '_ {
        (1..self.len.saturating_sub(1)).map(move |i| [self.verts[0], self.verts[i], self.verts[i + 1]])
    }
}

/// Clip a triangle against the near plane.
/// None when every vertex is behind the camera or in front of the near plane.
pub fn clip_triangle_near(tri: [ClipVertex; 3]) -> Option<ClippedPolygon> {
    if tri.iter().all(|v| v.clip.w <= 0.0) {
        return None;
    }

    let inside = tri.map(|v| v.inside_near());
    if inside.iter().all(|&i| i) {
        let mut verts = [ClipVertex::default(); 4];
        verts[..3].copy_from_slice(&tri);
        return Some(ClippedPolygon { verts, len: 3 });
    }
    if !inside.iter().any(|&i| i) {
        return None;
    }

    // Sutherland-Hodgman against clip.z = 0
    let mut verts = [ClipVertex::default(); 4];
    let mut len = 0;
    for i in 0..3 {
        let cur = &tri[i];
        let next = &tri[(i + 1) % 3];
        if inside[i] {
            verts[len] = *cur;
            len += 1;
        }
        if inside[i] != inside[(i + 1) % 3] {
            let t = cur.clip.z / (cur.clip.z - next.clip.z);
            verts[len] = cur.lerp(next, t);
            len += 1;
        }
    }

    Some(ClippedPolygon { verts, len })
}

/// Clip a clip-space segment against the near plane
pub fn clip_segment_near(a: Vec4, b: Vec4) -> Option<(Vec4, Vec4)> {
    let a_in = a.z >= 0.0 && a.w > 0.0;
    let b_in = b.z >= 0.0 && b.w > 0.0;
    match (a_in, b_in) {
        (true, true) => Some((a, b)),
        (false, false) => None,
        (true, false) => Some((a, a.lerp(b, a.z / (a.z - b.z)))),
        (false, true) => Some((b.lerp(a, b.z / (b.z - a.z)), b)),
    }
}

/// Round a screen coordinate to the pixel lattice (saturating)
#[inline]
pub fn to_pixel(v: f32) -> i32 {
    v.round() as i32
}

/// Project a world-space segment to integer screen endpoints.
/// None when the whole segment is behind the near plane.
pub fn project_segment(
    vp: &Mat4,
    a: Vec3,
    b: Vec3,
    width: usize,
    height: usize,
) -> Option<(i32, i32, i32, i32)> {
    let ca = mat4_transform_vec4(vp, Vec4::point(a));
    let cb = mat4_transform_vec4(vp, Vec4::point(b));
    let (ca, cb) = clip_segment_near(ca, cb)?;
    let sa = to_screen(ca, width, height);
    let sb = to_screen(cb, width, height);
    Some((to_pixel(sa.x), to_pixel(sa.y), to_pixel(sb.x), to_pixel(sb.y)))
}

// =============================================================================
// Cohen-Sutherland
// =============================================================================

pub const OUT_INSIDE: u8 = 0;
pub const OUT_LEFT: u8 = 8;
pub const OUT_RIGHT: u8 = 4;
pub const OUT_TOP: u8 = 2;
pub const OUT_BOTTOM: u8 = 1;

/// Region code of (x, y) against [0, max_x] x [0, max_y]; top is +y
pub fn outcode(x: i64, y: i64, max_x: i64, max_y: i64) -> u8 {
    let mut code = OUT_INSIDE;
    if x < 0 {
        code |= OUT_LEFT;
    } else if x > max_x {
        code |= OUT_RIGHT;
    }
    if y < 0 {
        code |= OUT_BOTTOM;
    } else if y > max_y {
        code |= OUT_TOP;
    }
    code
}

/// Clip a line to the viewport [0, width-1] x [0, height-1].
/// Returns the clipped endpoints, or None when the line is fully outside.
pub fn clip_line(
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    width: usize,
    height: usize,
) -> Option<(i32, i32, i32, i32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    let (mut x0, mut y0, mut x1, mut y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
    let mut code0 = outcode(x0, y0, max_x, max_y);
    let mut code1 = outcode(x1, y1, max_x, max_y);

    // Each pass moves one endpoint onto an edge; rounding can need a few extra
    for _ in 0..16 {
        if code0 | code1 == OUT_INSIDE {
            return Some((x0 as i32, y0 as i32, x1 as i32, y1 as i32));
        }
        if code0 & code1 != 0 {
            return None;
        }

        let code_out = if code0 != OUT_INSIDE { code0 } else { code1 };
        let dx = (x1 - x0) as f64;
        let dy = (y1 - y0) as f64;

        let (x, y) = if code_out & OUT_TOP != 0 {
            (x0 + (dx * (max_y - y0) as f64 / dy).round() as i64, max_y)
        } else if code_out & OUT_BOTTOM != 0 {
            (x0 + (dx * (0 - y0) as f64 / dy).round() as i64, 0)
        } else if code_out & OUT_RIGHT != 0 {
            (max_x, y0 + (dy * (max_x - x0) as f64 / dx).round() as i64)
        } else {
            (0, y0 + (dy * (0 - x0) as f64 / dx).round() as i64)
        };

        if code_out == code0 {
            x0 = x;
            y0 = y;
            code0 = outcode(x0, y0, max_x, max_y);
        } else {
            x1 = x;
            y1 = y;
            code1 = outcode(x1, y1, max_x, max_y);
        }
    }

    None
}
