//! Post-build consistency check
//!
//! Decodes every descriptor of a [`PackedMeshlets`] and compares the
//! reconstructed triangles against the source index buffer.

use crate::builder::PackedMeshlets;
use crate::layout::layout_for;

/// Validation outcome categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NoError,
    /// A primitive references a local vertex past the meshlet's vertex count
    PrimOutOfBounds,
    /// A meshlet references a vertex past the mesh's vertex count
    VertexOutOfBounds,
    /// Decoded triangles differ from the index buffer
    MismatchIndices,
}

/// A meshlet failed validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("meshlet {meshlet}: primitive {primitive} uses local vertex {local} of {vertex_count}")]
    PrimOutOfBounds {
        meshlet: usize,
        primitive: usize,
        local: u32,
        vertex_count: usize,
    },

    #[error("meshlet {meshlet}: vertex index {index} out of bounds (mesh has {vertex_count})")]
    VertexOutOfBounds {
        meshlet: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("triangle {triangle}: expected {expected:?}, found {found:?}")]
    MismatchIndices {
        triangle: usize,
        expected: Option<[u32; 3]>,
        found: Option<[u32; 3]>,
    },

    #[error("meshlet {meshlet}: {words} words at offset {offset} exceed pack buffer of {len}")]
    PackOutOfBounds {
        meshlet: usize,
        offset: u32,
        words: u32,
        len: usize,
    },

    #[error("meshlet {meshlet}: invalid descriptor ({reason})")]
    BadDescriptor { meshlet: usize, reason: String },
}

impl ValidationError {
    /// Category of this failure. Unreadable descriptors count as mismatches.
    pub fn status(&self) -> Status {
        match self {
            ValidationError::PrimOutOfBounds { .. } => Status::PrimOutOfBounds,
            ValidationError::VertexOutOfBounds { .. } => Status::VertexOutOfBounds,
            ValidationError::MismatchIndices { .. }
            | ValidationError::PackOutOfBounds { .. }
            | ValidationError::BadDescriptor { .. } => Status::MismatchIndices,
        }
    }
}

impl From<&Result<(), ValidationError>> for Status {
    fn from(result: &Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => Status::NoError,
            Err(err) => err.status(),
        }
    }
}

/// Check `packed` against the index buffer it was built from.
///
/// Degenerate triangles are expected to be missing from the output; every
/// other triangle must appear once, in input order.
pub fn validate(
    packed: &PackedMeshlets,
    indices: &[u32],
    vertex_count: usize,
) -> Result<(), ValidationError> {
    let layout = layout_for(packed.layout);

    let mut expected = indices
        .chunks_exact(3)
        .map(|tri| [tri[0], tri[1], tri[2]])
        .filter(|[a, b, c]| a != b && a != c && b != c);
    let mut triangle = 0;

    for (meshlet, desc) in packed.descs.iter().enumerate() {
        if desc.is_padding() {
            continue;
        }
        let decoded = layout.decode(meshlet, desc, &packed.pack)?;

        if let Some(&index) = decoded
            .vertices
            .iter()
            .find(|&&v| v as usize >= vertex_count)
        {
            return Err(ValidationError::VertexOutOfBounds {
                meshlet,
                index,
                vertex_count,
            });
        }

        for (primitive, prim) in decoded.primitives.iter().enumerate() {
            if let Some(&local) = prim
                .iter()
                .find(|&&local| local as usize >= decoded.vertices.len())
            {
                return Err(ValidationError::PrimOutOfBounds {
                    meshlet,
                    primitive,
                    local: u32::from(local),
                    vertex_count: decoded.vertices.len(),
                });
            }

            let found = prim.map(|local| decoded.vertices[local as usize]);
            let wanted = expected.next();
            if wanted != Some(found) {
                return Err(ValidationError::MismatchIndices {
                    triangle,
                    expected: wanted,
                    found: Some(found),
                });
            }
            triangle += 1;
        }
    }

    if let Some(wanted) = expected.next() {
        return Err(ValidationError::MismatchIndices {
            triangle,
            expected: Some(wanted),
            found: None,
        });
    }

    tracing::debug!("validated {} triangles in {} meshlets", triangle, packed.meshlet_count());
    Ok(())
}
