use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3};
use gltf::mesh::Mode;
use rusttype::{point, Font, Scale};
use std::f32::consts::{PI, TAU};
use std::path::Path;

/// Vertex layout shared with the leaf renderer; plain-old-data so buffers
/// can be uploaded without repacking.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self { position: position.to_array(), normal: normal.to_array(), uv: uv.to_array() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshTopology {
    Triangles,
    Lines,
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub topology: MeshTopology,
    pub bounds: MeshBounds,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshBounds {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
    pub radius: f32,
}

impl Mesh {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        let bounds = MeshBounds::from_vertices(&vertices);
        Self { vertices, indices, topology: MeshTopology::Triangles, bounds }
    }

    pub fn lines(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        let bounds = MeshBounds::from_vertices(&vertices);
        Self { vertices, indices, topology: MeshTopology::Lines, bounds }
    }

    /// Axis-aligned cube centered on the origin.
    pub fn cube(size: f32) -> Self {
        let hs = size * 0.5;
        let faces: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        ];
        let uv_quad =
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, tangent, bitangent) in faces {
            let base = vertices.len() as u32;
            let corners = [
                normal * hs - tangent * hs - bitangent * hs,
                normal * hs + tangent * hs - bitangent * hs,
                normal * hs + tangent * hs + bitangent * hs,
                normal * hs - tangent * hs + bitangent * hs,
            ];
            for (corner, uv) in corners.iter().zip(uv_quad.iter()) {
                vertices.push(MeshVertex::new(*corner, normal, *uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(vertices, indices)
    }

    /// Latitude/longitude sphere centered on the origin.
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let theta = v * PI;
            let (sin_t, cos_t) = theta.sin_cos();
            for segment in 0..=segments {
                let u = segment as f32 / segments as f32;
                let phi = u * TAU;
                let (sin_p, cos_p) = phi.sin_cos();
                let dir = Vec3::new(sin_t * cos_p, cos_t, sin_t * sin_p);
                vertices.push(MeshVertex::new(dir * radius, dir, Vec2::new(u, v)));
            }
        }
        let stride = segments + 1;
        let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment;
                let b = a + stride;
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        Self::new(vertices, indices)
    }

    /// Flat quad in the XY plane facing +Z, centered on the origin.
    pub fn plane(width: f32, height: f32) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        let vertices = vec![
            MeshVertex::new(Vec3::new(-hw, -hh, 0.0), Vec3::Z, Vec2::new(0.0, 1.0)),
            MeshVertex::new(Vec3::new(hw, -hh, 0.0), Vec3::Z, Vec2::new(1.0, 1.0)),
            MeshVertex::new(Vec3::new(hw, hh, 0.0), Vec3::Z, Vec2::new(1.0, 0.0)),
            MeshVertex::new(Vec3::new(-hw, hh, 0.0), Vec3::Z, Vec2::new(0.0, 0.0)),
        ];
        Self::new(vertices, vec![0, 1, 2, 0, 2, 3])
    }

    /// Cone centered on the origin, apex at +height/2. Four segments give the
    /// pyramid primitive.
    pub fn cone(radius: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let hh = height * 0.5;
        let mut positions = vec![Vec3::new(0.0, hh, 0.0), Vec3::new(0.0, -hh, 0.0)];
        for segment in 0..segments {
            let phi = segment as f32 / segments as f32 * TAU;
            positions.push(Vec3::new(phi.cos() * radius, -hh, phi.sin() * radius));
        }
        let mut indices = Vec::with_capacity((segments * 6) as usize);
        for segment in 0..segments {
            let current = 2 + segment;
            let next = 2 + (segment + 1) % segments;
            // side, then the downward-facing base cap
            indices.extend_from_slice(&[0, next, current]);
            indices.extend_from_slice(&[1, current, next]);
        }
        from_positions(positions, indices)
    }

    /// Capped cylinder centered on the origin.
    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let hh = height * 0.5;
        let mut positions = vec![Vec3::new(0.0, hh, 0.0), Vec3::new(0.0, -hh, 0.0)];
        for segment in 0..segments {
            let phi = segment as f32 / segments as f32 * TAU;
            let (sin_p, cos_p) = phi.sin_cos();
            positions.push(Vec3::new(cos_p * radius, hh, sin_p * radius));
            positions.push(Vec3::new(cos_p * radius, -hh, sin_p * radius));
        }
        let mut indices = Vec::with_capacity((segments * 12) as usize);
        for segment in 0..segments {
            let top = 2 + segment * 2;
            let bottom = top + 1;
            let next_top = 2 + ((segment + 1) % segments) * 2;
            let next_bottom = next_top + 1;
            indices.extend_from_slice(&[top, next_top, bottom, bottom, next_top, next_bottom]);
            indices.extend_from_slice(&[0, next_top, top]);
            indices.extend_from_slice(&[1, bottom, next_bottom]);
        }
        from_positions(positions, indices)
    }

    /// One quad per glyph at font size 1.0, centered on the origin so that
    /// record scale alone controls the rendered extent.
    pub fn text(font: &Font<'static>, content: &str) -> Self {
        let scale = Scale::uniform(1.0);
        let v_metrics = font.v_metrics(scale);
        let glyphs: Vec<_> = font.layout(content, scale, point(0.0, 0.0)).collect();
        let width = glyphs
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0);
        let offset_x = width * 0.5;
        let offset_y = (v_metrics.ascent + v_metrics.descent) * 0.5;
        let mut vertices = Vec::with_capacity(glyphs.len() * 4);
        let mut indices = Vec::with_capacity(glyphs.len() * 6);
        for glyph in &glyphs {
            let h_metrics = glyph.unpositioned().h_metrics();
            let x0 = glyph.position().x + h_metrics.left_side_bearing - offset_x;
            let x1 = glyph.position().x + h_metrics.advance_width - offset_x;
            let y0 = v_metrics.descent - offset_y;
            let y1 = v_metrics.ascent - offset_y;
            let base = vertices.len() as u32;
            vertices.push(MeshVertex::new(Vec3::new(x0, y0, 0.0), Vec3::Z, Vec2::new(0.0, 1.0)));
            vertices.push(MeshVertex::new(Vec3::new(x1, y0, 0.0), Vec3::Z, Vec2::new(1.0, 1.0)));
            vertices.push(MeshVertex::new(Vec3::new(x1, y1, 0.0), Vec3::Z, Vec2::new(1.0, 0.0)));
            vertices.push(MeshVertex::new(Vec3::new(x0, y1, 0.0), Vec3::Z, Vec2::new(0.0, 0.0)));
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(vertices, indices)
    }

    /// Small screen-aligned-in-spirit quads, one per particle seed position.
    pub fn point_sprites(positions: &[Vec3], half_size: f32) -> Self {
        let mut vertices = Vec::with_capacity(positions.len() * 4);
        let mut indices = Vec::with_capacity(positions.len() * 6);
        for center in positions {
            let base = vertices.len() as u32;
            let corners = [
                (Vec3::new(-half_size, -half_size, 0.0), Vec2::new(0.0, 1.0)),
                (Vec3::new(half_size, -half_size, 0.0), Vec2::new(1.0, 1.0)),
                (Vec3::new(half_size, half_size, 0.0), Vec2::new(1.0, 0.0)),
                (Vec3::new(-half_size, half_size, 0.0), Vec2::new(0.0, 0.0)),
            ];
            for (offset, uv) in corners {
                vertices.push(MeshVertex::new(*center + offset, Vec3::Z, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(vertices, indices)
    }

    /// Line-list frustum visualization in camera-local space (looking down -Z).
    pub fn frustum_lines(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Self {
        let corners_at = |depth: f32| {
            let half_h = depth * (fov_y_radians * 0.5).tan();
            let half_w = half_h * aspect.max(0.0001);
            [
                Vec3::new(-half_w, -half_h, -depth),
                Vec3::new(half_w, -half_h, -depth),
                Vec3::new(half_w, half_h, -depth),
                Vec3::new(-half_w, half_h, -depth),
            ]
        };
        let mut vertices = Vec::with_capacity(8);
        for corner in corners_at(near).into_iter().chain(corners_at(far)) {
            vertices.push(MeshVertex::new(corner, Vec3::Z, Vec2::ZERO));
        }
        let mut indices = Vec::with_capacity(24);
        for i in 0..4u32 {
            let j = (i + 1) % 4;
            indices.extend_from_slice(&[i, j]);
            indices.extend_from_slice(&[i + 4, j + 4]);
            indices.extend_from_slice(&[i, i + 4]);
        }
        Self::lines(vertices, indices)
    }

    /// Loads the first mesh of a glTF document, merging its triangle primitives.
    pub fn load_gltf(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let (document, buffers, _images) = gltf::import(path_ref)
            .with_context(|| format!("Failed to import glTF from {}", path_ref.display()))?;
        let mesh = document
            .meshes()
            .next()
            .ok_or_else(|| anyhow!("No meshes found in {}", path_ref.display()))?;

        let mut vertices: Vec<MeshVertex> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                continue;
            }
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
            let positions: Vec<Vec3> = reader
                .read_positions()
                .ok_or_else(|| anyhow!("POSITION attribute missing in {}", path_ref.display()))?
                .map(Vec3::from_array)
                .collect();
            if positions.is_empty() {
                continue;
            }
            let local_indices: Vec<u32> = reader
                .read_indices()
                .map(|read| read.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());
            let mut normals: Vec<Vec3> = reader
                .read_normals()
                .map(|it| it.map(Vec3::from_array).collect())
                .unwrap_or_default();
            if normals.len() != positions.len() {
                normals = compute_normals(&positions, &local_indices);
            }
            let mut tex_coords: Vec<Vec2> = reader
                .read_tex_coords(0)
                .map(|coords| coords.into_f32().map(Vec2::from_array).collect())
                .unwrap_or_default();
            if tex_coords.len() != positions.len() {
                tex_coords = vec![Vec2::ZERO; positions.len()];
            }

            let base_vertex = vertices.len() as u32;
            vertices.extend(
                positions.iter().enumerate().map(|(i, pos)| {
                    MeshVertex::new(*pos, normals[i].normalize_or_zero(), tex_coords[i])
                }),
            );
            indices.extend(local_indices.iter().map(|idx| idx + base_vertex));
        }

        if vertices.is_empty() {
            return Err(anyhow!("Mesh in {} contains no triangle primitives", path_ref.display()));
        }
        Ok(Self::new(vertices, indices))
    }
}

fn from_positions(positions: Vec<Vec3>, indices: Vec<u32>) -> Mesh {
    let normals = compute_normals(&positions, &indices);
    let vertices = positions
        .into_iter()
        .zip(normals)
        .map(|(pos, normal)| MeshVertex::new(pos, normal, Vec2::ZERO))
        .collect();
    Mesh::new(vertices, indices)
}

fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks(3) {
        if tri.len() < 3 {
            continue;
        }
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let normal = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        if normal.length_squared() > 0.0 {
            normals[i0] += normal;
            normals[i1] += normal;
            normals[i2] += normal;
        }
    }
    for normal in &mut normals {
        *normal = if normal.length_squared() > 0.0 { normal.normalize() } else { Vec3::Y };
    }
    normals
}

impl MeshBounds {
    pub fn from_vertices(vertices: &[MeshVertex]) -> Self {
        if vertices.is_empty() {
            return MeshBounds { min: Vec3::ZERO, max: Vec3::ZERO, center: Vec3::ZERO, radius: 0.0 };
        }
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for vertex in vertices {
            let pos = Vec3::from_array(vertex.position);
            min = min.min(pos);
            max = max.max(pos);
        }
        let center = (min + max) * 0.5;
        let mut radius: f32 = 0.0;
        for vertex in vertices {
            radius = radius.max((Vec3::from_array(vertex.position) - center).length());
        }
        MeshBounds { min, max, center, radius }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_bounds_are_symmetric() {
        let mesh = Mesh::cube(1.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert!((mesh.bounds.min - Vec3::splat(-0.5)).length() < 1e-6);
        assert!((mesh.bounds.max - Vec3::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn sphere_vertices_sit_on_the_radius() {
        let mesh = Mesh::sphere(0.5, 16, 8);
        for vertex in &mesh.vertices {
            let distance = Vec3::from_array(vertex.position).length();
            assert!((distance - 0.5).abs() < 1e-4, "vertex off the sphere: {distance}");
        }
    }

    #[test]
    fn pyramid_spans_unit_height() {
        let mesh = Mesh::cone(0.5, 1.0, 4);
        assert!((mesh.bounds.max.y - 0.5).abs() < 1e-6);
        assert!((mesh.bounds.min.y + 0.5).abs() < 1e-6);
    }

    #[test]
    fn frustum_helper_is_a_line_list() {
        let mesh = Mesh::frustum_lines(60f32.to_radians(), 2.0, 0.1, 10.0);
        assert_eq!(mesh.topology, MeshTopology::Lines);
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.indices.len(), 24);
        let far_half_h = 10.0 * 30f32.to_radians().tan();
        assert!((mesh.bounds.max.x - far_half_h * 2.0).abs() < 1e-3);
    }

    #[test]
    fn point_sprites_cover_their_seeds() {
        let mesh = Mesh::point_sprites(&[Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)], 0.05);
        assert_eq!(mesh.vertices.len(), 8);
        assert!((mesh.bounds.max.x - 1.05).abs() < 1e-6);
    }
}
