//! Per-meshlet output records
//!
//! Both records are `#[repr(C)]` + `Pod` so descriptor and bbox arrays can be
//! written straight into GPU buffers or files with `bytemuck::cast_slice`.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Opaque four-word meshlet descriptor.
///
/// The bit layout belongs to the [`crate::layout::MeshletLayout`] that wrote
/// it. An all-zero descriptor is padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct MeshletDesc {
    pub field_x: u32,
    pub field_y: u32,
    pub field_z: u32,
    pub field_w: u32,
}

impl MeshletDesc {
    /// Size of one descriptor in bytes
    pub const SIZE: usize = 16;

    pub const fn new(field_x: u32, field_y: u32, field_z: u32, field_w: u32) -> Self {
        Self {
            field_x,
            field_y,
            field_z,
            field_w,
        }
    }

    /// Descriptor inserted only to satisfy task-group alignment
    pub const fn is_padding(&self) -> bool {
        self.field_x == 0 && self.field_y == 0 && self.field_z == 0 && self.field_w == 0
    }
}

/// Axis-aligned bounds of one meshlet
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshletBbox {
    pub bbox_min: [f32; 3],
    pub bbox_max: [f32; 3],
}

impl Default for MeshletBbox {
    /// Inverted box that any point expands
    fn default() -> Self {
        Self {
            bbox_min: [f32::MAX; 3],
            bbox_max: [-f32::MAX; 3],
        }
    }
}

impl MeshletBbox {
    /// Size of one bbox record in bytes
    pub const SIZE: usize = 24;

    /// Fold one point into the box
    pub fn extend(&mut self, point: Vec3) {
        self.bbox_min = Vec3::from(self.bbox_min).min(point).to_array();
        self.bbox_max = Vec3::from(self.bbox_max).max(point).to_array();
    }

    pub fn merge(&mut self, other: &MeshletBbox) {
        if other.is_valid() {
            self.extend(other.min());
            self.extend(other.max());
        }
    }

    /// At least one point was folded in
    pub fn is_valid(&self) -> bool {
        (0..3).all(|i| self.bbox_min[i] <= self.bbox_max[i])
    }

    pub fn min(&self) -> Vec3 {
        Vec3::from(self.bbox_min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::from(self.bbox_max)
    }

    pub fn extent(&self) -> Vec3 {
        self.max() - self.min()
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min()).all() && point.cmple(self.max()).all()
    }
}

impl FromIterator<Vec3> for MeshletBbox {
    fn from_iter<I: IntoIterator<Item = Vec3>>(iter: I) -> Self {
        let mut bbox = MeshletBbox::default();
        for point in iter {
            bbox.extend(point);
        }
        bbox
    }
}
