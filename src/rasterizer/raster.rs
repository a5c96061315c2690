//! Triangle and line rasterization
//!
//! Edge-function coverage over the triangle's screen AABB (grown one pixel,
//! clamped to the viewport). Screen space here is y-up: accepted triangles
//! have positive area and the top-left rule is evaluated in that frame, so
//! two triangles sharing an edge never both write a pixel on it.

use serde::{Deserialize, Serialize};
use super::clip::{
    classify_winding, clip_line, clip_triangle_near, project_segment, project_vertex, to_pixel, ClipVertex,
    ScreenTriangle, Winding,
};
use super::framebuffer::Framebuffer;
use super::grid::LineSegment;
use super::math::{
    edge_function, mat4_mul, mat4_transform_dir, mat4_transform_point, mat4_transform_vec4, mix2, mix3, Mat4,
    Vec2, Vec3, Vec4,
};
use super::shader::{Fragment, PixelShader, ShadeEnv};
use super::types::{Color, Lighting, Palette, RenderFlag, RenderSettings, Triangle};
use super::view::ViewData;

/// 2x2 subpixel sample offsets
const AA_OFFSETS: [(f32, f32); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterOptions {
    /// Divide attributes by w before interpolating (affine when off)
    pub perspective_correct: bool,
    /// 2x2 coverage sampling with alpha-blended edges
    pub subpixel_aa: bool,
    /// Reject triangles whose face normal points away from the camera
    pub normal_cull: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            perspective_correct: false,
            subpixel_aa: false,
            normal_cull: true,
        }
    }
}

/// Counters for the current frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub triangles_submitted: usize,
    pub triangles_culled: usize,
    pub triangles_rasterized: usize,
    pub pixels_written: usize,
    pub line_pixels: usize,
}

/// Integer screen line waiting to be drawn after the fill pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLine {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    pub color: Color,
}

/// Everything a triangle draw reads besides the triangle itself
#[derive(Debug, Clone, Copy)]
pub struct DrawContext<'t> {
    pub view: &'t ViewData,
    pub model: Mat4,
    /// view_projection * model
    pub mvp: Mat4,
    pub settings: RenderSettings,
    pub shader: PixelShader<'t>,
    pub has_normals: bool,
    pub lighting: Lighting,
    pub palette: Palette,
    /// World length of the normal debug line
    pub normal_length: f32,
}

impl<'t> DrawContext<'t> {
    pub fn new(
        view: &'t ViewData,
        model: Mat4,
        settings: RenderSettings,
        shader: PixelShader<'t>,
        has_normals: bool,
    ) -> Self {
        Self {
            view,
            model,
            mvp: mat4_mul(&view.view_projection, &model),
            settings,
            shader,
            has_normals,
            lighting: Lighting::default(),
            palette: Palette::default(),
            normal_length: 0.25,
        }
    }

    pub fn with_overlay(mut self, palette: Palette, normal_length: f32) -> Self {
        self.palette = palette;
        self.normal_length = normal_length;
        self
    }

    pub fn with_lighting(mut self, lighting: Lighting) -> Self {
        self.lighting = lighting;
        self
    }

    fn shade_env(&self) -> ShadeEnv {
        ShadeEnv {
            camera_direction: self.view.camera_direction,
            has_normals: self.has_normals,
            lighting: self
                .settings
                .is_enabled(RenderFlag::Lights)
                .then_some(self.lighting),
        }
    }
}

/// Does edge a->b own the pixels lying exactly on it?
/// Left edges run downward, top edges run toward -x (y-up frame).
#[inline]
fn owns_edge(a: Vec2, b: Vec2) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dy < 0.0 || (dy == 0.0 && dx < 0.0)
}

/// Per-triangle edge setup
struct EdgeSetup {
    s: [Vec2; 3],
    owns: [bool; 3],
    inv_area: f32,
}

impl EdgeSetup {
    fn new(tri: &ScreenTriangle) -> Option<Self> {
        let area = tri.signed_area();
        if classify_winding(area) != Winding::Front {
            return None;
        }
        let s = tri.v.map(|v| v.xy());
        Some(Self {
            s,
            owns: [owns_edge(s[1], s[2]), owns_edge(s[2], s[0]), owns_edge(s[0], s[1])],
            inv_area: 1.0 / area,
        })
    }

    #[inline]
    fn edges(&self, p: Vec2) -> [f32; 3] {
        [
            edge_function(self.s[1], self.s[2], p),
            edge_function(self.s[2], self.s[0], p),
            edge_function(self.s[0], self.s[1], p),
        ]
    }

    #[inline]
    fn covers(&self, w: [f32; 3]) -> bool {
        (0..3).all(|i| w[i] > 0.0 || (w[i] == 0.0 && self.owns[i]))
    }

    #[inline]
    fn barycentric(&self, w: [f32; 3]) -> [f32; 3] {
        w.map(|wi| wi * self.inv_area)
    }
}

/// Inclusive pixel bounds of the triangle grown by one pixel, or None when
/// it misses the viewport entirely
fn screen_bounds(tri: &ScreenTriangle, width: usize, height: usize) -> Option<(usize, usize, usize, usize)> {
    let xs = tri.v.map(|v| v.pos.x);
    let ys = tri.v.map(|v| v.pos.y);
    let min_x = xs[0].min(xs[1]).min(xs[2]).floor() - 1.0;
    let min_y = ys[0].min(ys[1]).min(ys[2]).floor() - 1.0;
    let max_x = xs[0].max(xs[1]).max(xs[2]).ceil() + 1.0;
    let max_y = ys[0].max(ys[1]).max(ys[2]).ceil() + 1.0;

    let last_x = (width - 1) as f32;
    let last_y = (height - 1) as f32;
    if !(max_x >= 0.0 && max_y >= 0.0 && min_x <= last_x && min_y <= last_y) {
        return None;
    }

    Some((
        min_x.max(0.0) as usize,
        min_y.max(0.0) as usize,
        max_x.min(last_x) as usize,
        max_y.min(last_y) as usize,
    ))
}

pub struct Rasterizer {
    pub options: RasterOptions,
    stats: FrameStats,
    overlay: Vec<OverlayLine>,
}

impl Rasterizer {
    pub fn new(options: RasterOptions) -> Self {
        Self {
            options,
            stats: FrameStats::default(),
            overlay: Vec::new(),
        }
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = FrameStats::default();
    }

    /// Lines waiting for `flush_overlay`
    pub fn pending_overlay(&self) -> &[OverlayLine] {
        &self.overlay
    }

    /// Transform, clip, cull and fill one model-space triangle.
    /// Returns false when the triangle was rejected.
    pub fn draw_triangle(&mut self, fb: &mut Framebuffer, tri: &Triangle, ctx: &DrawContext) -> bool {
        self.stats.triangles_submitted += 1;

        let world = tri.v.map(|v| mat4_transform_point(&ctx.model, v.pos));
        let normals = tri.v.map(|v| mat4_transform_dir(&ctx.model, v.normal));

        // Left-handed: (w2 - w0) x (w1 - w0) faces the viewer for front windings
        let face = (world[2] - world[0]).cross(world[1] - world[0]).normalize();

        if ctx.has_normals && self.options.normal_cull && (-ctx.view.camera_direction).dot(face) < 0.0 {
            self.stats.triangles_culled += 1;
            return false;
        }

        let clip_verts: [ClipVertex; 3] = std::array::from_fn(|i| ClipVertex {
            clip: mat4_transform_vec4(&ctx.mvp, Vec4::point(tri.v[i].pos)),
            world: world[i],
            normal: normals[i],
            uv: tri.v[i].uv,
        });

        let near_clipped = clip_verts.iter().any(|v| !v.inside_near());
        let Some(poly) = clip_triangle_near(clip_verts) else {
            self.stats.triangles_culled += 1;
            return false;
        };

        let (width, height) = (fb.width(), fb.height());
        let env = ctx.shade_env();
        let depth_test = ctx.settings.is_enabled(RenderFlag::Depth);
        let shaded = ctx.settings.is_enabled(RenderFlag::Shaded);
        let wireframe = ctx.settings.is_enabled(RenderFlag::Wireframe);

        let mut accepted = false;
        for piece in poly.triangles() {
            if piece.iter().any(|v| v.clip.w <= 0.0) {
                continue;
            }
            let screen = ScreenTriangle::new(
                project_vertex(&piece[0], width, height),
                project_vertex(&piece[1], width, height),
                project_vertex(&piece[2], width, height),
            );
            if screen.winding() != Winding::Front {
                continue;
            }
            accepted = true;

            if shaded {
                self.fill_screen_triangle(fb, &screen, &ctx.shader, &env, depth_test);
            }
            if wireframe && !near_clipped {
                self.queue_wireframe(&screen, ctx.palette.wire);
            }
        }

        if !accepted {
            self.stats.triangles_culled += 1;
            return false;
        }
        self.stats.triangles_rasterized += 1;

        // Fan diagonals are not mesh edges; outline the source triangle instead
        if wireframe && near_clipped {
            for i in 0..3 {
                let (a, b) = (world[i], world[(i + 1) % 3]);
                if let Some((x0, y0, x1, y1)) = project_segment(&ctx.view.view_projection, a, b, width, height) {
                    self.queue_line(x0, y0, x1, y1, ctx.palette.wire);
                }
            }
        }

        if ctx.settings.is_enabled(RenderFlag::Normals) {
            let centroid = (world[0] + world[1] + world[2]) * (1.0 / 3.0);
            if let Some((x0, y0, x1, y1)) = project_segment(
                &ctx.view.view_projection,
                centroid,
                centroid + face * ctx.normal_length,
                width,
                height,
            ) {
                self.queue_line(x0, y0, x1, y1, ctx.palette.normal);
            }
        }

        true
    }

    /// Fill an already projected triangle. Triangles without positive area
    /// write nothing. Returns the number of pixels written.
    pub fn fill_screen_triangle(
        &mut self,
        fb: &mut Framebuffer,
        tri: &ScreenTriangle,
        shader: &PixelShader,
        env: &ShadeEnv,
        depth_test: bool,
    ) -> usize {
        let Some(setup) = EdgeSetup::new(tri) else {
            return 0;
        };
        let Some((x0, y0, x1, y1)) = screen_bounds(tri, fb.width(), fb.height()) else {
            return 0;
        };

        let mut written = 0;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let hit = if self.options.subpixel_aa {
                    self.shade_pixel_aa(fb, tri, &setup, x, y, shader, env, depth_test)
                } else {
                    self.shade_pixel(fb, tri, &setup, x, y, shader, env, depth_test)
                };
                if hit {
                    written += 1;
                }
            }
        }

        self.stats.pixels_written += written;
        written
    }

    #[allow(clippy::too_many_arguments)]
    #[inline]
    fn shade_pixel(
        &self,
        fb: &mut Framebuffer,
        tri: &ScreenTriangle,
        setup: &EdgeSetup,
        x: usize,
        y: usize,
        shader: &PixelShader,
        env: &ShadeEnv,
        depth_test: bool,
    ) -> bool {
        let w = setup.edges(Vec2::new(x as f32, y as f32));
        if !setup.covers(w) {
            return false;
        }

        let b = setup.barycentric(w);
        let z = b[0] * tri.v[0].pos.z + b[1] * tri.v[1].pos.z + b[2] * tri.v[2].pos.z;
        if depth_test && z > fb.depth_at(x, y) {
            return false;
        }
        fb.set_depth(x, y, z);

        let frag = self.fragment(tri, b);
        fb.set_pixel(x, y, shader.shade(&frag, env));
        true
    }

    #[allow(clippy::too_many_arguments)]
    fn shade_pixel_aa(
        &self,
        fb: &mut Framebuffer,
        tri: &ScreenTriangle,
        setup: &EdgeSetup,
        x: usize,
        y: usize,
        shader: &PixelShader,
        env: &ShadeEnv,
        depth_test: bool,
    ) -> bool {
        let mut covered = 0;
        let (mut sx, mut sy) = (0.0, 0.0);
        for (ox, oy) in AA_OFFSETS {
            let p = Vec2::new(x as f32 + ox, y as f32 + oy);
            if setup.covers(setup.edges(p)) {
                covered += 1;
                sx += p.x;
                sy += p.y;
            }
        }
        if covered == 0 {
            return false;
        }

        // Attributes at the centroid of the covered samples
        let n = covered as f32;
        let b = setup.barycentric(setup.edges(Vec2::new(sx / n, sy / n)));
        let z = b[0] * tri.v[0].pos.z + b[1] * tri.v[1].pos.z + b[2] * tri.v[2].pos.z;
        if depth_test && z > fb.depth_at(x, y) {
            return false;
        }
        fb.set_depth(x, y, z);

        let color = shader.shade(&self.fragment(tri, b), env);
        if covered == AA_OFFSETS.len() {
            fb.set_pixel(x, y, color);
        } else {
            fb.blend_pixel(x, y, color, n / AA_OFFSETS.len() as f32);
        }
        true
    }

    fn fragment(&self, tri: &ScreenTriangle, b: [f32; 3]) -> Fragment {
        let [v0, v1, v2] = &tri.v;
        let a = if self.options.perspective_correct {
            let q = [b[0] * v0.inv_w, b[1] * v1.inv_w, b[2] * v2.inv_w];
            let sum = q[0] + q[1] + q[2];
            if sum != 0.0 && sum.is_finite() {
                q.map(|qi| qi / sum)
            } else {
                b
            }
        } else {
            b
        };

        Fragment {
            weights: b,
            world: mix3(a, v0.world, v1.world, v2.world),
            uv: mix2(a, v0.uv, v1.uv, v2.uv),
            normal: mix3(a, v0.normal, v1.normal, v2.normal),
        }
    }

    /// Draw a triangle's outline now, endpoints rounded to the nearest pixel
    pub fn draw_wireframe(&mut self, fb: &mut Framebuffer, tri: &ScreenTriangle, color: Color) -> usize {
        let p = tri.v.map(|v| (to_pixel(v.pos.x), to_pixel(v.pos.y)));
        (0..3)
            .map(|i| {
                let (a, b) = (p[i], p[(i + 1) % 3]);
                self.draw_line(fb, a.0, a.1, b.0, b.1, color)
            })
            .sum()
    }

    fn queue_wireframe(&mut self, tri: &ScreenTriangle, color: Color) {
        let p = tri.v.map(|v| (to_pixel(v.pos.x), to_pixel(v.pos.y)));
        for i in 0..3 {
            let (a, b) = (p[i], p[(i + 1) % 3]);
            self.queue_line(a.0, a.1, b.0, b.1, color);
        }
    }

    pub fn queue_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        self.overlay.push(OverlayLine { x0, y0, x1, y1, color });
    }

    /// Draw and forget every queued overlay line
    pub fn flush_overlay(&mut self, fb: &mut Framebuffer) -> usize {
        let lines = std::mem::take(&mut self.overlay);
        let written: usize = lines
            .iter()
            .map(|l| self.draw_line(fb, l.x0, l.y0, l.x1, l.y1, l.color))
            .sum();
        // Keep the allocation for next frame
        self.overlay = lines;
        self.overlay.clear();
        written
    }

    /// Clip to the viewport and draw with Bresenham. No depth test.
    pub fn draw_line(&mut self, fb: &mut Framebuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) -> usize {
        let Some((x0, y0, x1, y1)) = clip_line(x0, y0, x1, y1, fb.width(), fb.height()) else {
            return 0;
        };
        let written = bresenham(fb, x0, y0, x1, y1, color);
        self.stats.line_pixels += written;
        written
    }

    /// Project a world-space segment (near-clipped) and draw it
    pub fn draw_segment_3d(&mut self, fb: &mut Framebuffer, view_projection: &Mat4, a: Vec3, b: Vec3, color: Color) -> usize {
        match project_segment(view_projection, a, b, fb.width(), fb.height()) {
            Some((x0, y0, x1, y1)) => self.draw_line(fb, x0, y0, x1, y1, color),
            None => 0,
        }
    }

    pub fn draw_grid(&mut self, fb: &mut Framebuffer, view_projection: &Mat4, segments: &[LineSegment], color: Color) -> usize {
        segments
            .iter()
            .map(|s| self.draw_segment_3d(fb, view_projection, s.a, s.b, color))
            .sum()
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(RasterOptions::default())
    }
}

/// Integer Bresenham. Endpoints must already be inside the framebuffer.
fn bresenham(fb: &mut Framebuffer, mut x0: i32, mut y0: i32, mut x1: i32, mut y1: i32, color: Color) -> usize {
    let steep = (x1 - x0).abs() < (y1 - y0).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let dx = (x1 - x0) as i64;
    let dy = (y1 - y0).abs() as i64;
    let y_step = if y1 > y0 { 1 } else { -1 };
    let mut error = 0i64;
    let mut y = y0;
    let mut written = 0;

    for x in x0..=x1 {
        let (px, py) = if steep { (y, x) } else { (x, y) };
        if fb.in_bounds(px, py) {
            fb.set_pixel(px as usize, py as usize, color);
            written += 1;
        }
        error += 2 * dy;
        if error > dx {
            y += y_step;
            error -= 2 * dx;
        }
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::clip::ScreenVertex;
    use crate::rasterizer::texture::Texture;
    use crate::rasterizer::types::{ByteOrder, ClearMode};

    fn fb(w: usize, h: usize) -> Framebuffer {
        let mut fb = Framebuffer::new(w, h, ByteOrder::Rgba).unwrap();
        fb.clear(ClearMode::Solid(Color::BLACK));
        fb
    }

    fn flat_env() -> ShadeEnv {
        ShadeEnv {
            camera_direction: Vec3::new(0.0, 0.0, 1.0),
            has_normals: false,
            lighting: None,
        }
    }

    fn written(fb: &Framebuffer) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for y in 0..fb.height() {
            for x in 0..fb.width() {
                if fb.get_color(x, y) != Color::BLACK {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_shared_edge_partition() {
        let mut r = Rasterizer::default();
        let mut a = fb(10, 10);
        let mut b = fb(10, 10);
        let t1 = ScreenTriangle::from_points([(0.0, 0.0), (8.0, 0.0), (0.0, 8.0)], 0.5);
        let t2 = ScreenTriangle::from_points([(8.0, 0.0), (8.0, 8.0), (0.0, 8.0)], 0.5);
        r.fill_screen_triangle(&mut a, &t1, &PixelShader::Flat, &flat_env(), false);
        r.fill_screen_triangle(&mut b, &t2, &PixelShader::Flat, &flat_env(), false);

        let wa = written(&a);
        let wb = written(&b);
        for p in &wa {
            assert!(!wb.contains(p), "pixel {:?} written twice", p);
        }
        // Interior of the shared diagonal is owned by exactly one side
        for x in 1..8usize {
            let p = (x, 8 - x);
            assert_eq!(wa.contains(&p) as u32 + wb.contains(&p) as u32, 1, "{:?}", p);
        }
    }

    #[test]
    fn test_axis_aligned_partition() {
        // Two halves of a square split along a vertical edge
        let mut r = Rasterizer::default();
        let mut a = fb(8, 8);
        let mut b = fb(8, 8);
        let left = ScreenTriangle::from_points([(0.0, 0.0), (4.0, 0.0), (4.0, 6.0)], 0.5);
        let right = ScreenTriangle::from_points([(4.0, 0.0), (7.0, 3.0), (4.0, 6.0)], 0.5);
        r.fill_screen_triangle(&mut a, &left, &PixelShader::Flat, &flat_env(), false);
        r.fill_screen_triangle(&mut b, &right, &PixelShader::Flat, &flat_env(), false);
        let wa = written(&a);
        let wb = written(&b);
        for y in 1..6usize {
            let p = (4, y);
            assert_eq!(wa.contains(&p) as u32 + wb.contains(&p) as u32, 1, "{:?}", p);
        }
    }

    #[test]
    fn test_depth_matches_barycentric() {
        let mut r = Rasterizer::default();
        let mut f = fb(10, 10);
        let tri = ScreenTriangle::new(
            ScreenVertex::at(0.0, 0.0, 0.2),
            ScreenVertex::at(9.0, 1.0, 0.5),
            ScreenVertex::at(2.0, 9.0, 0.9),
        );
        let n = r.fill_screen_triangle(&mut f, &tri, &PixelShader::Flat, &flat_env(), true);
        assert!(n > 0);

        let s = tri.v.map(|v| v.xy());
        let area = tri.signed_area();
        for (x, y) in written(&f) {
            let p = Vec2::new(x as f32, y as f32);
            let b = [
                edge_function(s[1], s[2], p) / area,
                edge_function(s[2], s[0], p) / area,
                edge_function(s[0], s[1], p) / area,
            ];
            let z = b[0] * 0.2 + b[1] * 0.5 + b[2] * 0.9;
            assert!((f.depth_at(x, y) - z).abs() < 1e-6, "({}, {})", x, y);
        }
    }

    #[test]
    fn test_depth_test_keeps_nearer() {
        let red = Texture::from_colors(1, 1, &[Color::RED], "red").unwrap();
        let blue = Texture::from_colors(1, 1, &[Color::BLUE], "blue").unwrap();
        let mut r = Rasterizer::default();
        let mut f = fb(6, 6);
        let pts = [(0.0, 0.0), (6.0, 0.0), (0.0, 6.0)];
        let near = ScreenTriangle::from_points(pts, 0.3);
        let far = ScreenTriangle::from_points(pts, 0.6);

        r.fill_screen_triangle(&mut f, &near, &PixelShader::Textured(&red), &flat_env(), true);
        let n = r.fill_screen_triangle(&mut f, &far, &PixelShader::Textured(&blue), &flat_env(), true);
        assert_eq!(n, 0);
        assert_eq!(f.get_color(1, 1), Color::RED);

        // Only a strictly farther fragment is rejected
        let same = ScreenTriangle::from_points(pts, 0.3);
        r.fill_screen_triangle(&mut f, &same, &PixelShader::Textured(&blue), &flat_env(), true);
        assert_eq!(f.get_color(1, 1), Color::BLUE);
    }

    #[test]
    fn test_depth_off_always_writes() {
        let blue = Texture::from_colors(1, 1, &[Color::BLUE], "blue").unwrap();
        let mut r = Rasterizer::default();
        let mut f = fb(6, 6);
        let pts = [(0.0, 0.0), (6.0, 0.0), (0.0, 6.0)];
        r.fill_screen_triangle(&mut f, &ScreenTriangle::from_points(pts, 0.1), &PixelShader::Flat, &flat_env(), false);
        r.fill_screen_triangle(
            &mut f,
            &ScreenTriangle::from_points(pts, 0.9),
            &PixelShader::Textured(&blue),
            &flat_env(),
            false,
        );
        assert_eq!(f.get_color(1, 1), Color::BLUE);
        assert!((f.depth_at(1, 1) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_back_facing_writes_nothing() {
        let mut r = Rasterizer::default();
        let mut f = fb(10, 10);
        let cw = ScreenTriangle::from_points([(1.0, 1.0), (1.0, 8.0), (8.0, 1.0)], 0.5);
        assert_eq!(r.fill_screen_triangle(&mut f, &cw, &PixelShader::Flat, &flat_env(), false), 0);
        let flat = ScreenTriangle::from_points([(1.0, 1.0), (4.0, 4.0), (8.0, 8.0)], 0.5);
        assert_eq!(r.fill_screen_triangle(&mut f, &flat, &PixelShader::Flat, &flat_env(), false), 0);
        assert!(written(&f).is_empty());
    }

    #[test]
    fn test_fill_stays_inside_viewport() {
        let mut r = Rasterizer::default();
        let mut f = fb(8, 8);
        // Deterministic pseudo-random triangles well outside the viewport
        let mut seed = 12345u32;
        let mut next = || {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            ((seed >> 16) % 200) as f32 - 100.0
        };
        for _ in 0..200 {
            let pts = [(next(), next()), (next(), next()), (next(), next())];
            let n = r.fill_screen_triangle(&mut f, &ScreenTriangle::from_points(pts, 0.5), &PixelShader::Flat, &flat_env(), false);
            assert!(n <= 64);
        }
        // Far-away vertices clamp to the viewport
        let big = ScreenTriangle::from_points([(-1e6, -1e6), (3e6, -1e6), (-1e6, 3e6)], 0.5);
        assert_eq!(r.fill_screen_triangle(&mut f, &big, &PixelShader::Flat, &flat_env(), false), 64);
    }

    #[test]
    fn test_wireframe_screen_triangle() {
        let mut r = Rasterizer::default();
        let mut f = fb(10, 10);
        let wire = Palette::default().wire;
        let tri = ScreenTriangle::from_points([(1.0, 1.0), (8.0, 1.0), (1.0, 8.0)], 0.0);
        r.draw_wireframe(&mut f, &tri, wire);
        assert_eq!(f.get_color(4, 1), wire);
        assert_eq!(f.get_color(1, 4), wire);
        assert_eq!(f.get_color(4, 5), wire);
        assert_eq!(f.get_color(8, 1), wire);
        assert_eq!(f.get_color(3, 3), Color::BLACK);
        assert_eq!(f.get_color(2, 2), Color::BLACK);
    }

    #[test]
    fn test_line_clipped_row() {
        let mut r = Rasterizer::default();
        let mut f = fb(10, 10);
        assert_eq!(r.draw_line(&mut f, -5, 5, 15, 5, Color::WHITE), 10);
        let pixels = written(&f);
        assert_eq!(pixels, (0..10).map(|x| (x, 5)).collect::<Vec<_>>());
        assert_eq!(r.stats().line_pixels, 10);
    }

    #[test]
    fn test_bresenham_idempotent() {
        let lines = [(0, 0, 9, 3), (9, 9, 0, 0), (2, 8, 3, 0), (5, 5, 5, 5), (-4, 12, 14, -3)];
        for (x0, y0, x1, y1) in lines {
            let mut r = Rasterizer::default();
            let mut once = fb(10, 10);
            let mut twice = fb(10, 10);
            r.draw_line(&mut once, x0, y0, x1, y1, Color::WHITE);
            r.draw_line(&mut twice, x0, y0, x1, y1, Color::WHITE);
            r.draw_line(&mut twice, x0, y0, x1, y1, Color::WHITE);
            assert_eq!(once.color_bytes(), twice.color_bytes());
        }
    }

    #[test]
    fn test_steep_line_one_pixel_per_row() {
        let mut r = Rasterizer::default();
        let mut f = fb(10, 10);
        let n = r.draw_line(&mut f, 2, 8, 3, 0, Color::WHITE);
        assert_eq!(n, 9);
        for y in 0..=8 {
            let row: Vec<_> = written(&f).into_iter().filter(|p| p.1 == y).collect();
            assert_eq!(row.len(), 1);
        }
    }

    #[test]
    fn test_overlay_flushes_once() {
        let mut r = Rasterizer::default();
        let mut f = fb(4, 4);
        r.queue_line(0, 0, 3, 0, Color::RED);
        assert_eq!(r.pending_overlay().len(), 1);
        assert_eq!(r.flush_overlay(&mut f), 4);
        assert!(r.pending_overlay().is_empty());
        assert_eq!(r.flush_overlay(&mut f), 0);
        assert_eq!(f.get_color(2, 0), Color::RED);
    }

    #[test]
    fn test_subpixel_aa_blends_edges() {
        let mut r = Rasterizer::new(RasterOptions {
            subpixel_aa: true,
            ..Default::default()
        });
        let mut f = fb(10, 10);
        let tri = ScreenTriangle::from_points([(0.0, 0.0), (8.0, 0.0), (0.0, 8.0)], 0.5);
        r.fill_screen_triangle(&mut f, &tri, &PixelShader::Flat, &flat_env(), false);
        // Fully inside
        assert_eq!(f.get_color(1, 1), Color::WHITE);
        // One of four samples inside the hypotenuse
        assert_eq!(f.get_color(3, 4), Color::new(64, 64, 64));
        // No samples inside
        assert_eq!(f.get_color(4, 4), Color::BLACK);
    }

    #[test]
    fn test_perspective_correct_weights() {
        let mut r = Rasterizer::new(RasterOptions {
            perspective_correct: true,
            ..Default::default()
        });
        let mut v0 = ScreenVertex::at(0.0, 0.0, 0.5);
        let mut v1 = ScreenVertex::at(8.0, 0.0, 0.5);
        let mut v2 = ScreenVertex::at(0.0, 8.0, 0.5);
        v0.inv_w = 1.0;
        v1.inv_w = 0.25;
        v2.inv_w = 1.0;
        v1.uv = Vec2::new(1.0, 0.0);
        let tri = ScreenTriangle::new(v0, v1, v2);

        // Halfway along the bottom edge on screen is 1/5 of the way in texture space
        let frag = r.fragment(&tri, [0.5, 0.5, 0.0]);
        assert!((frag.uv.x - 0.2).abs() < 1e-6);
        r.options.perspective_correct = false;
        let frag = r.fragment(&tri, [0.5, 0.5, 0.0]);
        assert!((frag.uv.x - 0.5).abs() < 1e-6);
    }
}
