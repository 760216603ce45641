//! Tessellated surfaces for celestial bodies: latitude/longitude spheres and
//! flat subdivided quads.

use glam::Vec3;

/// Triangle mesh data on the CPU, ready for upload by a rendering backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<[f32; 2]>,
    /// Counter-clockwise triangle list.
    pub indices: Vec<u32>,
}

impl Geometry {
    /// A latitude/longitude sphere centred on the origin.
    ///
    /// `width_segments` splits the equator (minimum 3) and `height_segments`
    /// the meridians (minimum 2). Seam and pole vertices are duplicated so
    /// every vertex has a unique UV; `u` runs with longitude and `v` from the
    /// north pole (0) to the south pole (1).
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let vertex_count = ((width_segments + 1) * (height_segments + 1)) as usize;
        let mut positions = Vec::with_capacity(vertex_count);
        let mut normals = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let theta = v * std::f32::consts::PI;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = u * std::f32::consts::TAU;

                let normal = Vec3::new(
                    -phi.cos() * theta.sin(),
                    theta.cos(),
                    phi.sin() * theta.sin(),
                );
                positions.push(normal * radius);
                normals.push(normal);
                uvs.push([u, v]);
            }
        }

        let row = width_segments + 1;
        let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;

                // The pole rows collapse to a point; skip their degenerate halves.
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self {
            positions,
            normals,
            uvs,
            indices,
        }
    }

    /// A flat quad in the XY plane facing +Z, centred on the origin.
    pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(1);
        let height_segments = height_segments.max(1);
        let half_width = width * 0.5;
        let half_height = height * 0.5;

        let vertex_count = ((width_segments + 1) * (height_segments + 1)) as usize;
        let mut positions = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let y = half_height - v * height;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let x = u * width - half_width;
                positions.push(Vec3::new(x, y, 0.0));
                uvs.push([u, 1.0 - v]);
            }
        }

        let row = width_segments + 1;
        let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row + ix;
                let b = (iy + 1) * row + ix;
                let c = (iy + 1) * row + ix + 1;
                let d = iy * row + ix + 1;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self {
            normals: vec![Vec3::Z; positions.len()],
            positions,
            uvs,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Largest distance of any vertex from the origin.
    pub fn bounding_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| p.length())
            .fold(0.0, f32::max)
    }
}
