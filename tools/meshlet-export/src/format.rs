//! Packed meshlet binary format (.meshlets)
//!
//! # Layout
//! ```text
//! 0x00: magic "MSHL"
//! 0x04: version u32
//! 0x08: layout u32 (0 = basic, 1 = delta)
//! 0x0C: meshlet_count u32 (real meshlets)
//! 0x10: desc_count u32 (stored, including padding)
//! 0x14: pack_word_count u32
//! 0x18: vertex_count u32 (source mesh)
//! 0x1C: reserved u32
//! 0x20: descs (desc_count * 16 bytes)
//! var:  bboxes (desc_count * 24 bytes)
//! var:  pack words (pack_word_count * 4 bytes)
//! ```
//!
//! All values little-endian.

use meshlet_common::{LayoutKind, MeshletBbox, MeshletDesc, PackedMeshlets, Stats};
use std::io::Write;

pub const MESHLET_MAGIC: [u8; 4] = *b"MSHL";
pub const MESHLET_VERSION: u32 = 1;
pub const MESHLET_EXT: &str = "meshlets";

/// Errors reading a .meshlets file
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("file too small for header ({0} bytes)")]
    TooSmall(usize),

    #[error("bad magic {0:?}")]
    BadMagic([u8; 4]),

    #[error("unsupported version {0}")]
    UnsupportedVersion(u32),

    #[error("unknown layout {0}")]
    UnknownLayout(u32),

    #[error("meshlet count {meshlets} exceeds stored descriptor count {descs}")]
    CountMismatch { meshlets: u32, descs: u32 },

    #[error("expected {expected} bytes, found {found}")]
    SizeMismatch { expected: usize, found: usize },
}

/// .meshlets header (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshletFileHeader {
    pub layout: LayoutKind,
    pub meshlet_count: u32,
    pub desc_count: u32,
    pub pack_word_count: u32,
    pub vertex_count: u32,
}

impl MeshletFileHeader {
    pub const SIZE: usize = 32;

    /// Total file size described by this header
    pub fn file_size(&self) -> usize {
        Self::SIZE
            + self.desc_count as usize * (MeshletDesc::SIZE + MeshletBbox::SIZE)
            + self.pack_word_count as usize * 4
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&MESHLET_MAGIC);
        bytes[4..8].copy_from_slice(&MESHLET_VERSION.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.layout.as_u32().to_le_bytes());
        bytes[12..16].copy_from_slice(&self.meshlet_count.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.desc_count.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.pack_word_count.to_le_bytes());
        bytes[24..28].copy_from_slice(&self.vertex_count.to_le_bytes());
        // reserved stays 0
        bytes
    }

    /// Read and check header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < Self::SIZE {
            return Err(FormatError::TooSmall(bytes.len()));
        }
        let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

        let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if magic != MESHLET_MAGIC {
            return Err(FormatError::BadMagic(magic));
        }
        let version = word(4);
        if version != MESHLET_VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }
        let layout = LayoutKind::from_u32(word(8)).ok_or(FormatError::UnknownLayout(word(8)))?;

        let header = Self {
            layout,
            meshlet_count: word(12),
            desc_count: word(16),
            pack_word_count: word(20),
            vertex_count: word(24),
        };
        if header.meshlet_count > header.desc_count {
            return Err(FormatError::CountMismatch {
                meshlets: header.meshlet_count,
                descs: header.desc_count,
            });
        }
        Ok(header)
    }
}

/// A .meshlets file read back into memory
#[derive(Debug, Clone, PartialEq)]
pub struct MeshletFile {
    pub header: MeshletFileHeader,
    /// Stats are not stored and come back empty
    pub packed: PackedMeshlets,
}

/// Write a complete .meshlets file
pub fn write_meshlet_file<W: Write>(
    w: &mut W,
    packed: &PackedMeshlets,
    vertex_count: u32,
) -> std::io::Result<()> {
    debug_assert_eq!(packed.descs.len(), packed.bboxes.len());

    let header = MeshletFileHeader {
        layout: packed.layout,
        meshlet_count: packed.meshlet_count() as u32,
        desc_count: packed.descs.len() as u32,
        pack_word_count: packed.pack.len() as u32,
        vertex_count,
    };
    w.write_all(&header.to_bytes())?;
    w.write_all(bytemuck::cast_slice(&packed.descs))?;
    w.write_all(bytemuck::cast_slice(&packed.bboxes))?;
    w.write_all(bytemuck::cast_slice(&packed.pack))?;
    Ok(())
}

/// Copy fixed-size records out of a possibly unaligned byte slice
fn read_records<T: bytemuck::AnyBitPattern>(bytes: &[u8], size: usize) -> Vec<T> {
    bytes.chunks_exact(size).map(bytemuck::pod_read_unaligned).collect()
}

/// Parse a complete .meshlets file
pub fn read_meshlet_file(bytes: &[u8]) -> Result<MeshletFile, FormatError> {
    let header = MeshletFileHeader::from_bytes(bytes)?;
    let expected = header.file_size();
    if bytes.len() != expected {
        return Err(FormatError::SizeMismatch {
            expected,
            found: bytes.len(),
        });
    }

    let desc_bytes = header.desc_count as usize * MeshletDesc::SIZE;
    let bbox_bytes = header.desc_count as usize * MeshletBbox::SIZE;
    let (descs, rest) = bytes[MeshletFileHeader::SIZE..].split_at(desc_bytes);
    let (bboxes, pack) = rest.split_at(bbox_bytes);

    Ok(MeshletFile {
        header,
        packed: PackedMeshlets {
            layout: header.layout,
            descs: read_records(descs, MeshletDesc::SIZE),
            bboxes: read_records(bboxes, MeshletBbox::SIZE),
            pack: read_records(pack, 4),
            stats: Stats::default(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshlet_common::{BuilderConfig, MeshletBuilder};

    fn sample() -> PackedMeshlets {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        MeshletBuilder::new(BuilderConfig::default())
            .unwrap()
            .build(&[0, 1, 2, 0, 2, 3], &positions)
            .unwrap()
    }

    #[test]
    fn test_header_size() {
        let header = MeshletFileHeader {
            layout: LayoutKind::Delta,
            meshlet_count: 3,
            desc_count: 32,
            pack_word_count: 10,
            vertex_count: 99,
        };
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[0..4], b"MSHL");
        assert_eq!(MeshletFileHeader::from_bytes(&bytes), Ok(header));
        assert_eq!(header.file_size(), 32 + 32 * 40 + 40);
    }

    #[test]
    fn test_write_read() {
        let packed = sample();
        let mut bytes = Vec::new();
        write_meshlet_file(&mut bytes, &packed, 4).unwrap();

        let file = read_meshlet_file(&bytes).unwrap();
        assert_eq!(file.header.meshlet_count, 1);
        assert_eq!(file.header.desc_count, 32);
        assert_eq!(file.header.vertex_count, 4);
        assert_eq!(file.packed.descs, packed.descs);
        assert_eq!(file.packed.bboxes, packed.bboxes);
        assert_eq!(file.packed.pack, packed.pack);
    }

    #[test]
    fn test_rejects_corrupt_files() {
        let mut bytes = Vec::new();
        write_meshlet_file(&mut bytes, &sample(), 4).unwrap();

        assert_eq!(read_meshlet_file(&bytes[..10]), Err(FormatError::TooSmall(10)));

        let mut bad = bytes.clone();
        bad[0] = b'X';
        assert!(matches!(read_meshlet_file(&bad), Err(FormatError::BadMagic(_))));

        let mut bad = bytes.clone();
        bad[4] = 9;
        assert_eq!(read_meshlet_file(&bad), Err(FormatError::UnsupportedVersion(9)));

        let mut bad = bytes.clone();
        bad[8] = 7;
        assert_eq!(read_meshlet_file(&bad), Err(FormatError::UnknownLayout(7)));

        let truncated = &bytes[..bytes.len() - 4];
        assert!(matches!(
            read_meshlet_file(truncated),
            Err(FormatError::SizeMismatch { .. })
        ));
    }
}
