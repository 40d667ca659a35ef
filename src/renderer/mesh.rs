//! Visual mesh buffers for the jelly avatar
//!
//! Positions live in image pixel space so the host can draw the mesh with a
//! single transform (`origin`, `scale`) and the uploaded image as texture.

use glam::Vec2;

use super::vertex::MeshVertex;

/// Vertex, uv and index data for a `verts_x * verts_y` grid
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBuffers {
    pub verts_x: usize,
    pub verts_y: usize,
    pub vertices: Vec<MeshVertex>,
    /// Two triangles per cell
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    /// Regular grid spanning `size` (image pixels), row-major
    pub fn grid(verts_x: usize, verts_y: usize, size: Vec2) -> Self {
        let vx = verts_x.max(2);
        let vy = verts_y.max(2);
        let (fx, fy) = ((vx - 1) as f32, (vy - 1) as f32);

        let mut vertices = Vec::with_capacity(vx * vy);
        for row in 0..vy {
            for col in 0..vx {
                let uv = [col as f32 / fx, row as f32 / fy];
                vertices.push(MeshVertex {
                    position: [uv[0] * size.x, uv[1] * size.y],
                    uv,
                });
            }
        }

        let mut indices = Vec::with_capacity((vx - 1) * (vy - 1) * 6);
        for row in 0..vy - 1 {
            for col in 0..vx - 1 {
                let i0 = (row * vx + col) as u32;
                let i1 = i0 + 1;
                let i2 = i0 + vx as u32;
                let i3 = i2 + 1;
                indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
            }
        }

        Self {
            verts_x: vx,
            verts_y: vy,
            vertices,
            indices,
        }
    }

    /// Overwrite positions from world-space points, mapped into mesh-local
    /// coordinates with `(p - origin) / scale`. Extra points are ignored.
    pub fn sync<I>(&mut self, points: I, origin: Vec2, scale: f32)
    where
        I: IntoIterator<Item = Vec2>,
    {
        let inv = if scale.abs() > f32::EPSILON { 1.0 / scale } else { 1.0 };
        for (vertex, p) in self.vertices.iter_mut().zip(points) {
            let local = (p - origin) * inv;
            vertex.position = local.to_array();
        }
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
