use std::f32::consts::{FRAC_PI_2, PI, TAU};

use bytemuck::{Pod, Zeroable};

pub const GLOBE_RADIUS: f32 = 1.0;
pub const CLOUD_SHELL_RADIUS: f32 = 1.003;
pub const BASE_SECTORS: u32 = 32;
pub const BASE_STACKS: u32 = 16;
/// Upper bound on sectors and stacks; keeps every index and the index count
/// within `u32`.
pub const MAX_DIVISIONS: u32 = 1 << 14;

/// Interleaved position, normal and texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed triangle sphere made of `stack_count + 1` latitude rings running
/// from the north pole to the south pole, each sampled `sector_count + 1`
/// times so the seam carries its own texture coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereMesh {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    sector_count: u32,
    stack_count: u32,
    radius: f32,
}

impl SphereMesh {
    pub fn generate(sector_count: u32, stack_count: u32, radius: f32) -> Self {
        let sector_count = clamp_divisions(sector_count);
        let stack_count = clamp_divisions(stack_count);
        let inv_radius = if radius != 0.0 { 1.0 / radius } else { 0.0 };

        let sector_step = TAU / sector_count as f32;
        let stack_step = PI / stack_count as f32;

        let rings = stack_count as usize + 1;
        let ring_len = sector_count as usize + 1;
        let mut vertices = Vec::with_capacity(rings.saturating_mul(ring_len));
        for i in 0..=stack_count {
            let stack_angle = FRAC_PI_2 - i as f32 * stack_step;
            let xy = radius * stack_angle.cos();
            let z = radius * stack_angle.sin();

            for j in 0..=sector_count {
                let sector_angle = j as f32 * sector_step;
                let x = xy * sector_angle.cos();
                let y = xy * sector_angle.sin();
                vertices.push(MeshVertex {
                    position: [x, y, z],
                    normal: [x * inv_radius, y * inv_radius, z * inv_radius],
                    uv: [
                        j as f32 / sector_count as f32,
                        i as f32 / stack_count as f32,
                    ],
                });
            }
        }

        let mut indices =
            Vec::with_capacity((6 * sector_count as usize).saturating_mul(stack_count as usize));
        for i in 0..stack_count {
            let mut k1 = i * (sector_count + 1);
            let mut k2 = k1 + sector_count + 1;
            for _ in 0..sector_count {
                // The pole rings collapse to a point, so each contributes
                // only one triangle per sector.
                if i != 0 {
                    indices.extend_from_slice(&[k1, k2, k1 + 1]);
                }
                if i != stack_count - 1 {
                    indices.extend_from_slice(&[k1 + 1, k2, k2 + 1]);
                }
                k1 += 1;
                k2 += 1;
            }
        }

        Self {
            vertices,
            indices,
            sector_count,
            stack_count,
            radius,
        }
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn sector_count(&self) -> u32 {
        self.sector_count
    }

    pub fn stack_count(&self) -> u32 {
        self.stack_count
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

fn clamp_divisions(count: u32) -> u32 {
    count.clamp(1, MAX_DIVISIONS)
}

pub fn generate_sphere(sector_count: u32, stack_count: u32, radius: f32) -> SphereMesh {
    SphereMesh::generate(sector_count, stack_count, radius)
}

/// The opaque earth sphere and the slightly larger translucent cloud shell.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobeMeshes {
    pub earth: SphereMesh,
    pub clouds: SphereMesh,
}

impl GlobeMeshes {
    /// `resolution` multiplies the base 32 x 16 tessellation.
    pub fn new(resolution: u32) -> Self {
        let resolution = resolution.max(1);
        let sectors = BASE_SECTORS.saturating_mul(resolution);
        let stacks = BASE_STACKS.saturating_mul(resolution);
        Self {
            earth: generate_sphere(sectors, stacks, GLOBE_RADIUS),
            clouds: generate_sphere(sectors, stacks, CLOUD_SHELL_RADIUS),
        }
    }
}
