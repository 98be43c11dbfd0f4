//! Quantized vectors relative to a bounding box

use glam::Vec3;
use std::ops::Sub;

/// Three unsigned fixed-point components
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QVec {
    pub bits: [u32; 3],
}

impl QVec {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { bits: [x, y, z] }
    }

    /// All three components set to `raw`
    pub const fn splat(raw: u32) -> Self {
        Self { bits: [raw; 3] }
    }

    /// Quantize `v` inside the box `[bbox_min, bbox_min + bbox_extent]`.
    ///
    /// Each component maps to `[0, quantized_mul]` with round-to-nearest.
    /// Degenerate (zero) extents quantize to 0 on that axis.
    pub fn from_vec(v: Vec3, bbox_min: Vec3, bbox_extent: Vec3, quantized_mul: f32) -> Self {
        Self::quantize(v, bbox_min, bbox_extent, quantized_mul, f32::round)
    }

    /// Like [`Self::from_vec`] but never dequantizes above `v`; for box minima
    pub fn from_vec_floor(v: Vec3, bbox_min: Vec3, bbox_extent: Vec3, quantized_mul: f32) -> Self {
        Self::quantize(v, bbox_min, bbox_extent, quantized_mul, f32::floor)
    }

    /// Like [`Self::from_vec`] but never dequantizes below `v`; for box maxima
    pub fn from_vec_ceil(v: Vec3, bbox_min: Vec3, bbox_extent: Vec3, quantized_mul: f32) -> Self {
        Self::quantize(v, bbox_min, bbox_extent, quantized_mul, f32::ceil)
    }

    fn quantize(
        v: Vec3,
        bbox_min: Vec3,
        bbox_extent: Vec3,
        quantized_mul: f32,
        rounding: fn(f32) -> f32,
    ) -> Self {
        let extent = Vec3::select(bbox_extent.cmpgt(Vec3::ZERO), bbox_extent, Vec3::ONE);
        let scaled = ((v - bbox_min) / extent).clamp(Vec3::ZERO, Vec3::ONE) * quantized_mul;
        Self {
            bits: [
                rounding(scaled.x) as u32,
                rounding(scaled.y) as u32,
                rounding(scaled.z) as u32,
            ],
        }
    }

    pub fn min(self, other: Self) -> Self {
        Self::new(
            self.bits[0].min(other.bits[0]),
            self.bits[1].min(other.bits[1]),
            self.bits[2].min(other.bits[2]),
        )
    }

    pub fn max(self, other: Self) -> Self {
        Self::new(
            self.bits[0].max(other.bits[0]),
            self.bits[1].max(other.bits[1]),
            self.bits[2].max(other.bits[2]),
        )
    }

    /// Map back into the box this vector was quantized against
    pub fn to_vec(self, bbox_min: Vec3, bbox_extent: Vec3, quantized_mul: f32) -> Vec3 {
        let nrm = Vec3::new(
            self.bits[0] as f32,
            self.bits[1] as f32,
            self.bits[2] as f32,
        ) / quantized_mul;
        bbox_min + nrm * bbox_extent
    }
}

/// Componentwise wrapping difference
impl Sub for QVec {
    type Output = QVec;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(
            self.bits[0].wrapping_sub(rhs.bits[0]),
            self.bits[1].wrapping_sub(rhs.bits[1]),
            self.bits[2].wrapping_sub(rhs.bits[2]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qvec_corners() {
        let min = Vec3::new(-1.0, 0.0, 2.0);
        let extent = Vec3::new(2.0, 4.0, 8.0);
        assert_eq!(QVec::from_vec(min, min, extent, 255.0), QVec::splat(0));
        assert_eq!(QVec::from_vec(min + extent, min, extent, 255.0), QVec::splat(255));

        let mid = QVec::from_vec(min + extent * 0.5, min, extent, 255.0);
        // 127.5 rounds away from zero
        assert_eq!(mid, QVec::splat(128));
    }

    #[test]
    fn test_qvec_flat_extent() {
        let min = Vec3::ZERO;
        let extent = Vec3::new(1.0, 0.0, 1.0);
        let q = QVec::from_vec(Vec3::new(1.0, 0.0, 0.5), min, extent, 255.0);
        assert_eq!(q.bits, [255, 0, 128]);
    }

    #[test]
    fn test_qvec_floor_ceil_bracket() {
        let min = Vec3::ZERO;
        let extent = Vec3::ONE;
        let v = Vec3::new(0.3, 0.5, 1.0);

        let lo = QVec::from_vec_floor(v, min, extent, 255.0);
        let hi = QVec::from_vec_ceil(v, min, extent, 255.0);
        assert_eq!(lo.bits, [76, 127, 255]);
        assert_eq!(hi.bits, [77, 128, 255]);
        assert!(lo.to_vec(min, extent, 255.0).cmple(v).all());
        assert!(hi.to_vec(min, extent, 255.0).cmpge(v).all());
    }

    #[test]
    fn test_qvec_min_max_sub() {
        let a = QVec::new(1, 9, 4);
        let b = QVec::new(5, 2, 4);
        assert_eq!(a.min(b), QVec::new(1, 2, 4));
        assert_eq!(a.max(b), QVec::new(5, 9, 4));
        assert_eq!(a.max(b) - a.min(b), QVec::new(4, 7, 0));
        assert_eq!((a - b).bits[0], u32::MAX - 3);
    }

    #[test]
    fn test_qvec_to_vec() {
        let min = Vec3::new(-4.0, -4.0, -4.0);
        let extent = Vec3::splat(8.0);
        let v = QVec::new(0, 255, 51).to_vec(min, extent, 255.0);
        assert!((v - Vec3::new(-4.0, 4.0, -2.4)).length() < 1e-5);
    }
}
