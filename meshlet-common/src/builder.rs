//! Meshlet builder driver
//!
//! Walks the triangle list in order, feeding a [`PrimitiveCache`]. When the
//! cache rejects a triangle the current meshlet is finalized, the cache is
//! reset and the triangle is retried. Finished meshlets are then encoded by
//! the configured [`MeshletLayout`].

use glam::Vec3;
use rayon::prelude::*;

use crate::bits::aligned_size;
use crate::cache::{CacheLimits, PrimitiveCache};
use crate::cone::NormalCone;
use crate::config::{BuilderConfig, ConfigError, LayoutKind};
use crate::desc::{MeshletBbox, MeshletDesc};
use crate::layout::{EncodeContext, layout_for};
use crate::meshlet::Meshlet;
use crate::stats::Stats;
use crate::validation::{ValidationError, validate};

/// Builder input was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("index count {0} is not a multiple of 3")]
    IndexCountNotTriangles(usize),

    #[error("index {index} out of range (mesh has {vertex_count} vertices)")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("triangle {triangle} {indices:?} does not fit into an empty meshlet")]
    TriangleExceedsBudget { triangle: usize, indices: [u32; 3] },
}

/// Encoded meshlets of one mesh
#[derive(Debug, Clone, PartialEq)]
pub struct PackedMeshlets {
    pub layout: LayoutKind,
    /// One descriptor per meshlet, padded with zeroed descriptors
    pub descs: Vec<MeshletDesc>,
    /// Float bounds, parallel to `descs`
    pub bboxes: Vec<MeshletBbox>,
    /// Index payload referenced by the descriptors
    pub pack: Vec<u32>,
    pub stats: Stats,
}

impl PackedMeshlets {
    /// Number of real (non-padding) meshlets
    pub fn meshlet_count(&self) -> usize {
        self.descs.iter().filter(|d| !d.is_padding()).count()
    }

    pub fn validate(&self, indices: &[u32], vertex_count: usize) -> Result<(), ValidationError> {
        validate(self, indices, vertex_count)
    }
}

/// Splits index buffers into meshlets
#[derive(Debug, Clone)]
pub struct MeshletBuilder {
    config: BuilderConfig,
    limits: CacheLimits,
}

impl MeshletBuilder {
    pub fn new(config: BuilderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let limits = config.cache_limits();
        Ok(Self { config, limits })
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Admission check matching the layout's encoding
    #[inline]
    fn cannot_insert(&self, cache: &PrimitiveCache, a: u32, b: u32, c: u32) -> bool {
        match self.config.layout {
            LayoutKind::Basic => cache.cannot_insert(a, b, c),
            LayoutKind::Delta => cache.cannot_insert_block(a, b, c),
        }
    }

    /// Greedy sequential build over one run of triangles
    fn build_range(
        &self,
        indices: &[u32],
        first_triangle: usize,
    ) -> Result<Vec<Meshlet>, BuildError> {
        let mut cache = PrimitiveCache::new(self.limits);
        let mut meshlets = Vec::new();
        let mut degenerate = 0usize;

        for (i, tri) in indices.chunks_exact(3).enumerate() {
            let (a, b, c) = (tri[0], tri[1], tri[2]);
            if a == b || a == c || b == c {
                degenerate += 1;
                continue;
            }

            if self.cannot_insert(&cache, a, b, c) {
                if cache.is_empty() {
                    return Err(BuildError::TriangleExceedsBudget {
                        triangle: first_triangle + i,
                        indices: [a, b, c],
                    });
                }
                meshlets.push(cache.to_meshlet());
                cache.reset();

                if self.cannot_insert(&cache, a, b, c) {
                    return Err(BuildError::TriangleExceedsBudget {
                        triangle: first_triangle + i,
                        indices: [a, b, c],
                    });
                }
            }
            cache.insert(a, b, c);
        }

        if !cache.is_empty() {
            meshlets.push(cache.to_meshlet());
        }

        if degenerate > 0 {
            tracing::trace!(
                "skipped {} degenerate triangles starting at triangle {}",
                degenerate,
                first_triangle
            );
        }
        Ok(meshlets)
    }

    /// Split `indices` into meshlets without encoding them
    pub fn build_meshlets(&self, indices: &[u32]) -> Result<Vec<Meshlet>, BuildError> {
        if !indices.len().is_multiple_of(3) {
            return Err(BuildError::IndexCountNotTriangles(indices.len()));
        }

        match self.config.parallel_chunk_triangles {
            Some(chunk) if indices.len() / 3 > chunk => {
                let parts = indices
                    .par_chunks(chunk.saturating_mul(3))
                    .enumerate()
                    .map(|(part, run)| self.build_range(run, part * chunk))
                    .collect::<Result<Vec<_>, _>>()?;
                tracing::debug!("built {} chunks of {} triangles in parallel", parts.len(), chunk);
                Ok(parts.into_iter().flatten().collect())
            }
            _ => self.build_range(indices, 0),
        }
    }

    /// Build and encode meshlets for a mesh
    pub fn build(
        &self,
        indices: &[u32],
        positions: &[[f32; 3]],
    ) -> Result<PackedMeshlets, BuildError> {
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(BuildError::IndexOutOfRange {
                index,
                vertex_count: positions.len(),
            });
        }

        let meshlets = self.build_meshlets(indices)?;
        let packed = self.encode(&meshlets, positions);

        tracing::debug!(
            "built {} meshlets ({} stored) from {} triangles, {} pack words",
            packed.stats.meshlets_total,
            packed.descs.len(),
            indices.len() / 3,
            packed.pack.len()
        );
        Ok(packed)
    }

    /// Encode finished meshlets with the configured layout
    pub fn encode(&self, meshlets: &[Meshlet], positions: &[[f32; 3]]) -> PackedMeshlets {
        let layout = layout_for(self.config.layout);
        let ctx = EncodeContext {
            positions,
            object_bbox: positions.iter().map(|&p| Vec3::from(p)).collect(),
            limits: self.limits,
        };

        let cones: Vec<NormalCone> = meshlets
            .par_iter()
            .map(|meshlet| NormalCone::from_meshlet(meshlet, positions))
            .collect();

        let mut stats = Stats::default();
        let mut descs = Vec::with_capacity(meshlets.len());
        let mut bboxes = Vec::with_capacity(meshlets.len());
        let mut pack = Vec::new();

        for (meshlet, cone) in meshlets.iter().zip(&cones) {
            let encoded = layout.encode(meshlet, cone, &ctx, &mut pack);
            descs.push(encoded.desc);
            bboxes.push(
                meshlet
                    .vertices
                    .iter()
                    .map(|&v| Vec3::from(positions[v as usize]))
                    .collect(),
            );

            stats.backface_total += usize::from(cone.is_backface_cullable());
            stats.vertex_indices += encoded.vertex_slots as usize;
            stats.prim_indices += encoded.prim_slots as usize;
            stats.vertex_total += meshlet.vertices.len();
            stats.prim_total += meshlet.primitives.len();
            stats.block_bits_total += encoded.block_bits as usize;
        }

        let stored = aligned_size(meshlets.len() as u32, self.config.task_alignment) as usize;
        descs.resize(stored, MeshletDesc::default());
        bboxes.resize(stored, MeshletBbox::default());

        stats.meshlets_total = meshlets.len();
        stats.meshlets_stored = stored;
        let counts: Vec<(u32, u32)> = meshlets
            .iter()
            .map(|m| (m.vertex_count(), m.primitive_count()))
            .collect();
        stats.set_loads(&counts, self.limits.max_vertex_size, self.limits.max_primitive_size);

        PackedMeshlets {
            layout: layout.kind(),
            descs,
            bboxes,
            pack,
            stats,
        }
    }
}
