//! Meshes, vertex streams and renderables
//!
//! A mesh is a triangle list of 32-byte vertices `[px,py,pz,nx,ny,nz,u,v]`.
//! `Mesh` owns its vertices; `MeshView` borrows a float stream without copying.

use super::error::RenderError;
use super::math::{mat4_identity, Mat4, Vec2, Vec3};
use super::types::{Triangle, Vertex, VERTEX_FLOATS, VERTEX_STRIDE};

/// Owning triangle-list mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
}

impl Mesh {
    pub fn new(name: &str, vertices: Vec<Vertex>) -> Self {
        Self {
            name: name.to_string(),
            vertices,
        }
    }

    pub fn from_triangles(name: &str, triangles: &[Triangle]) -> Self {
        Self::new(name, triangles.iter().flat_map(|t| t.v).collect())
    }

    /// Decode a little-endian byte stream. `stride` may exceed 32 bytes;
    /// trailing bytes of each vertex are skipped.
    pub fn from_le_bytes(name: &str, bytes: &[u8], stride: usize) -> Result<Self, RenderError> {
        if stride == 0 || bytes.is_empty() {
            return Err(RenderError::MissingVertexStream {
                name: name.to_string(),
                stride,
                len: bytes.len() / 4,
            });
        }
        if stride < VERTEX_STRIDE {
            return Err(RenderError::UnsupportedStride(stride));
        }

        let mut reader = ByteReader::new(bytes);
        let mut vertices = Vec::with_capacity(bytes.len() / stride);
        while reader.remaining() >= stride {
            let start = reader.position();
            let (Some(pos), Some(normal), Some(uv)) =
                (reader.read_vec3(), reader.read_vec3(), reader.read_vec2())
            else {
                break;
            };
            vertices.push(Vertex::new(pos, normal, uv));
            reader.seek(start + stride);
        }

        Ok(Self::new(name, vertices))
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// The vertex stream as flat floats
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn view(&self) -> MeshView<'_> {
        MeshView::new(&self.name, &self.vertices)
    }

    /// Axis-aligned cube centered on the origin with half-extent `size`.
    /// Faces wind counter-clockwise when seen from outside and carry
    /// outward normals and per-face UVs.
    pub fn cube(size: f32) -> Self {
        let faces = [
            (Vec3::new(1.0, 0.0, 0.0), Vec3::UP),
            (Vec3::new(-1.0, 0.0, 0.0), Vec3::UP),
            (Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
            (Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
            (Vec3::new(0.0, 0.0, 1.0), Vec3::UP),
            (Vec3::new(0.0, 0.0, -1.0), Vec3::UP),
        ];

        let mut vertices = Vec::with_capacity(36);
        for (n, b) in faces {
            let a = n.cross(b);
            let corners = [
                (n - a - b, Vec2::new(0.0, 0.0)),
                (n + a - b, Vec2::new(1.0, 0.0)),
                (n + a + b, Vec2::new(1.0, 1.0)),
                (n - a + b, Vec2::new(0.0, 1.0)),
            ];
            for i in [0, 1, 2, 0, 2, 3] {
                let (p, uv) = corners[i];
                vertices.push(Vertex::new(p * size, n, uv));
            }
        }

        Self::new("cube", vertices)
    }
}

/// Borrowed triangle list
#[derive(Debug, Clone, Copy)]
pub struct MeshView<'a> {
    pub name: &'a str,
    pub vertices: &'a [Vertex],
    pub has_normals: bool,
    pub has_uvs: bool,
}

impl<'a> MeshView<'a> {
    pub fn new(name: &'a str, vertices: &'a [Vertex]) -> Self {
        Self {
            name,
            vertices,
            has_normals: vertices.iter().any(|v| !v.normal.is_zero()),
            has_uvs: vertices.iter().any(|v| !v.uv.is_zero()),
        }
    }

    /// Reinterpret a float stream in place. Only the 32-byte layout can be
    /// borrowed; other strides go through `Mesh::from_le_bytes`.
    pub fn from_stream(name: &'a str, stream: &'a [f32], stride: usize) -> Result<Self, RenderError> {
        if stride == 0 || stream.is_empty() {
            return Err(RenderError::MissingVertexStream {
                name: name.to_string(),
                stride,
                len: stream.len(),
            });
        }
        if stride != VERTEX_STRIDE {
            return Err(RenderError::UnsupportedStride(stride));
        }

        let whole = stream.len() - stream.len() % VERTEX_FLOATS;
        let vertices: &[Vertex] = bytemuck::try_cast_slice(&stream[..whole]).map_err(|_| {
            RenderError::MissingVertexStream {
                name: name.to_string(),
                stride,
                len: stream.len(),
            }
        })?;

        Ok(Self::new(name, vertices))
    }

    /// Whole triangles only; a trailing partial triangle is ignored
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + 'a {
        self.vertices
            .chunks_exact(3)
            .map(|c| Triangle::new(c[0], c[1], c[2]))
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// A mesh placed in the world for one frame
#[derive(Debug, Clone, Copy)]
pub struct Renderable<'a> {
    pub name: &'a str,
    pub stream: &'a [f32],
    /// Bytes per vertex
    pub stride: usize,
    pub model: Mat4,
    /// Registry index; None uses the core's active texture
    pub texture: Option<usize>,
}

impl<'a> Renderable<'a> {
    pub fn new(mesh: &'a Mesh, model: Mat4) -> Self {
        Self {
            name: &mesh.name,
            stream: mesh.as_floats(),
            stride: VERTEX_STRIDE,
            model,
            texture: None,
        }
    }

    pub fn from_stream(name: &'a str, stream: &'a [f32], stride: usize, model: Mat4) -> Self {
        Self {
            name,
            stream,
            stride,
            model,
            texture: None,
        }
    }

    pub fn with_texture(mut self, index: usize) -> Self {
        self.texture = Some(index);
        self
    }

    pub fn view(&self) -> Result<MeshView<'a>, RenderError> {
        MeshView::from_stream(self.name, self.stream, self.stride)
    }
}

impl<'a> From<&'a Mesh> for Renderable<'a> {
    fn from(mesh: &'a Mesh) -> Self {
        Renderable::new(mesh, mat4_identity())
    }
}

/// Little-endian cursor over raw bytes
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    /// Move to an absolute offset (clamped to the end)
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.bytes.len());
    }

    pub fn read_bytes<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let out: [u8; N] = self.bytes.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(out)
    }

    pub fn read_f32(&mut self) -> Option<f32> {
        self.read_bytes().map(f32::from_le_bytes)
    }

    pub fn read_vec2(&mut self) -> Option<Vec2> {
        Some(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Option<Vec3> {
        Some(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> Triangle {
        Triangle::new(
            Vertex::from_pos(0.0, 0.0, 0.0),
            Vertex::from_pos(1.0, 0.0, 0.0).with_uv(1.0, 0.0),
            Vertex::from_pos(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_view_borrows_stream() {
        let mesh = Mesh::from_triangles("t", &[tri(), tri()]);
        let floats = mesh.as_floats();
        assert_eq!(floats.len(), 6 * VERTEX_FLOATS);
        let view = MeshView::from_stream("t", floats, 32).unwrap();
        assert_eq!(view.triangle_count(), 2);
        assert!(view.has_uvs);
        assert!(!view.has_normals);
        assert_eq!(view.triangles().next().unwrap(), tri());
    }

    #[test]
    fn test_missing_stream() {
        assert!(matches!(
            MeshView::from_stream("empty", &[], 32),
            Err(RenderError::MissingVertexStream { stride: 32, len: 0, .. })
        ));
        let floats = [0.0f32; 8];
        assert!(matches!(
            MeshView::from_stream("zero", &floats, 0),
            Err(RenderError::MissingVertexStream { stride: 0, .. })
        ));
        assert!(matches!(
            MeshView::from_stream("odd", &floats, 40),
            Err(RenderError::UnsupportedStride(40))
        ));
    }

    #[test]
    fn test_partial_triangle_ignored() {
        let mut floats = Mesh::from_triangles("t", &[tri()]).as_floats().to_vec();
        floats.extend_from_slice(&[1.0; 12]);
        let view = MeshView::from_stream("t", &floats, 32).unwrap();
        assert_eq!(view.vertices.len(), 4);
        assert_eq!(view.triangles().count(), 1);
    }

    #[test]
    fn test_from_le_bytes_with_padding() {
        let mut bytes = Vec::new();
        for v in tri().v {
            for f in [v.pos.x, v.pos.y, v.pos.z, v.normal.x, v.normal.y, v.normal.z, v.uv.x, v.uv.y] {
                bytes.extend_from_slice(&f.to_le_bytes());
            }
            bytes.extend_from_slice(&[0xAB; 8]);
        }
        let mesh = Mesh::from_le_bytes("padded", &bytes, 40).unwrap();
        assert_eq!(mesh.vertices, tri().v.to_vec());
        assert!(matches!(
            Mesh::from_le_bytes("short", &bytes, 16),
            Err(RenderError::UnsupportedStride(16))
        ));
    }

    #[test]
    fn test_byte_reader_bounds() {
        let mut bytes = 1.5f32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[9, 9, 9]);
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_f32(), Some(1.5));
        assert_eq!(r.remaining(), 3);
        // Short read leaves the cursor in place
        assert_eq!(r.read_f32(), None);
        assert_eq!(r.position(), 4);
        assert_eq!(r.read_vec2(), None);
        r.seek(100);
        assert_eq!(r.position(), 7);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_cube_faces_point_outward() {
        let cube = Mesh::cube(0.5);
        assert_eq!(cube.triangle_count(), 12);
        for t in cube.view().triangles() {
            let e1 = t.v[1].pos - t.v[0].pos;
            let e2 = t.v[2].pos - t.v[0].pos;
            let n = t.v[0].normal;
            // Left-handed: e2 x e1 follows the outward normal
            assert!(e2.cross(e1).dot(n) > 0.0);
            // Face sits on its normal's side
            let centroid = (t.v[0].pos + t.v[1].pos + t.v[2].pos) * (1.0 / 3.0);
            assert!(centroid.dot(n) > 0.0);
            for v in t.v {
                assert!(v.pos.x.abs() == 0.5 && v.pos.y.abs() == 0.5 && v.pos.z.abs() == 0.5);
            }
        }
    }

    #[test]
    fn test_renderable_from_mesh() {
        let mesh = Mesh::cube(1.0);
        let r = Renderable::from(&mesh).with_texture(2);
        assert_eq!(r.texture, Some(2));
        let view = r.view().unwrap();
        assert!(view.has_normals && view.has_uvs);
        assert_eq!(view.triangle_count(), 12);
    }
}
