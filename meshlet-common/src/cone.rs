//! Normal cones for meshlet backface culling

use glam::Vec3;

use crate::bits::{pack, unpack};
use crate::meshlet::Meshlet;
use crate::octahedral::{decode_oct_snorm, encode_oct_snorm, float32x3_to_octn_precise};

/// Octahedral bits used for the cone axis (8 per component)
pub const CONE_AXIS_BITS: u32 = 16;

/// Cones with a smaller minimum dot span (almost) a hemisphere and never cull
pub const BACKFACE_MIN_DOT: f32 = 0.1;

/// Bounding cone of a meshlet's triangle normals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalCone {
    /// Quantized axis, as decoded from the packed form
    pub axis: Vec3,
    /// Smallest dot product between `axis` and any triangle normal
    pub min_dot: f32,
    /// Snorm8 octahedral fields of `axis`
    oct: [u32; 2],
}

impl NormalCone {
    /// Cone that never culls
    pub const OPEN: NormalCone = NormalCone {
        axis: Vec3::Z,
        min_dot: -1.0,
        oct: [0, 0],
    };

    /// Compute the cone of `meshlet` over `positions`.
    ///
    /// The axis is quantized first and `min_dot` is measured against the
    /// quantized axis, so the packed cone stays conservative.
    pub fn from_meshlet(meshlet: &Meshlet, positions: &[[f32; 3]]) -> Self {
        let normals: Vec<Vec3> = meshlet
            .triangles()
            .filter_map(|[a, b, c]| {
                let pa = Vec3::from(positions[a as usize]);
                let pb = Vec3::from(positions[b as usize]);
                let pc = Vec3::from(positions[c as usize]);
                (pb - pa).cross(pc - pa).try_normalize()
            })
            .collect();

        let Some(axis) = normals.iter().copied().sum::<Vec3>().try_normalize() else {
            return Self::OPEN;
        };

        let oct = float32x3_to_octn_precise(axis, CONE_AXIS_BITS);
        let (ox, oy) = encode_oct_snorm(oct, CONE_AXIS_BITS);
        let axis = decode_oct_snorm(ox, oy, CONE_AXIS_BITS);

        let min_dot = normals
            .iter()
            .map(|n| n.dot(axis))
            .fold(1.0f32, f32::min);

        Self {
            axis,
            min_dot,
            oct: [ox, oy],
        }
    }

    pub fn is_backface_cullable(&self) -> bool {
        self.min_dot > BACKFACE_MIN_DOT
    }

    /// Sine of the cone half-angle; 1.0 when the cone cannot cull
    pub fn cutoff(&self) -> f32 {
        if self.is_backface_cullable() {
            (1.0 - self.min_dot * self.min_dot).max(0.0).sqrt()
        } else {
            1.0
        }
    }

    /// Pack into the low 24 bits: oct x, oct y, cutoff (unorm8, rounded up)
    pub fn pack(&self) -> u32 {
        let cutoff = (self.cutoff() * 255.0).ceil().clamp(0.0, 255.0) as u32;
        pack(self.oct[0], 8, 0) | pack(self.oct[1], 8, 8) | pack(cutoff, 8, 16)
    }

    /// Decode `(axis, cutoff)` from [`Self::pack`] output
    pub fn unpack(packed: u32) -> (Vec3, f32) {
        let axis = decode_oct_snorm(unpack(packed, 8, 0), unpack(packed, 8, 8), CONE_AXIS_BITS);
        let cutoff = unpack(packed, 8, 16) as f32 / 255.0;
        (axis, cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meshlet(vertices: Vec<u32>, primitives: Vec<[u8; 3]>) -> Meshlet {
        Meshlet {
            vertices,
            primitives,
            ..Default::default()
        }
    }

    #[test]
    fn test_flat_patch_cullable() {
        // Counter-clockwise quad in the xy plane, facing +z
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        let m = meshlet(vec![0, 1, 2, 3], vec![[0, 1, 2], [0, 2, 3]]);
        let cone = NormalCone::from_meshlet(&m, &positions);

        assert!(cone.axis.dot(Vec3::Z) > 0.999);
        assert!(cone.min_dot > 0.999);
        assert!(cone.is_backface_cullable());

        let (axis, cutoff) = NormalCone::unpack(cone.pack());
        assert!(axis.dot(Vec3::Z) > 0.999);
        assert!(cutoff >= cone.cutoff());
        assert!(cutoff < 0.1);
    }

    #[test]
    fn test_opposing_faces_not_cullable() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let m = meshlet(vec![0, 1, 2], vec![[0, 1, 2], [0, 2, 1]]);
        let cone = NormalCone::from_meshlet(&m, &positions);
        // Normals cancel out
        assert_eq!(cone, NormalCone::OPEN);
        assert!(!cone.is_backface_cullable());
        assert_eq!(NormalCone::unpack(cone.pack()).1, 1.0);
    }

    #[test]
    fn test_zero_area_ignored() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let m = meshlet(vec![0, 1, 2, 3], vec![[0, 1, 2], [0, 1, 3]]);
        let cone = NormalCone::from_meshlet(&m, &positions);
        assert!(cone.is_backface_cullable());
        assert!(cone.axis.dot(Vec3::Z) > 0.999);
    }
}
