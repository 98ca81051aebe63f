use std::io::Read;

use crate::array::Shape;
use crate::element::ElementType;
use crate::error::{CodecError, Result};

/// Magic bytes opening every container file.
pub const MAGIC: &[u8; 8] = b"ENCARR1\n";

/// Current container format version.
pub const FORMAT_VERSION: u16 = 1;

/// Fixed part of the header, before the per-dimension extents.
///   magic[8] + version:u16 + codec_id:u16 + element:u8 + ndims:u8
///   + flags:u16 + payload_len:u64 + checksum:u64
///   = 8 + 2 + 2 + 1 + 1 + 2 + 8 + 8 = 32
pub const FIXED_HEADER_SIZE: usize = 32;

/// Bytes per dimension extent (u64 LE).
pub const DIM_SIZE: usize = 8;

// ── Flags ──────────────────────────────────────────────────────────────────

/// The payload carries an xxhash3-64 checksum.
pub const FLAG_HAS_CHECKSUM: u16 = 1 << 0;

// ── Codec IDs ──────────────────────────────────────────────────────────────

pub const CODEC_PLAIN: u16 = 0;
pub const CODEC_VARLEN_DIFF: u16 = 1;
pub const CODEC_ZSTD: u16 = 2;
pub const CODEC_LZ4: u16 = 3;
pub const CODEC_DEFLATE: u16 = 4;

// ── Header ─────────────────────────────────────────────────────────────────

/// Decoded container header.
///
/// ```text
/// [FIXED HEADER: 32 bytes]
/// [DIMS: 8 bytes × ndims]
/// [PAYLOAD: payload_len bytes]  ← code units of one encoded array
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerHeader {
    pub version: u16,
    pub codec_id: u16,
    pub element: ElementType,
    pub flags: u16,
    pub payload_len: u64,
    /// xxhash3-64 of the payload; zero unless `FLAG_HAS_CHECKSUM` is set.
    pub checksum: u64,
    pub shape: Shape,
}

impl ContainerHeader {
    /// Total header size including the dimension extents.
    pub fn encoded_len(&self) -> usize {
        FIXED_HEADER_SIZE + self.shape.ndims() * DIM_SIZE
    }

    pub fn has_flag(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    /// Serialize to exactly `encoded_len()` bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.codec_id.to_le_bytes());
        buf.push(self.element.tag());
        buf.push(self.shape.ndims() as u8);
        buf.extend_from_slice(&self.flags.to_le_bytes());
        buf.extend_from_slice(&self.payload_len.to_le_bytes());
        buf.extend_from_slice(&self.checksum.to_le_bytes());
        for &d in self.shape.dims() {
            buf.extend_from_slice(&(d as u64).to_le_bytes());
        }
        buf
    }

    /// Reads and validates a header from the start of `src`.
    pub fn read_from<R: Read>(src: &mut R) -> Result<Self> {
        let mut fixed = [0u8; FIXED_HEADER_SIZE];
        src.read_exact(&mut fixed)?;
        if &fixed[..8] != MAGIC {
            return Err(CodecError::Format(
                "invalid magic bytes, not an encoded array file".to_string(),
            ));
        }
        let version = u16::from_le_bytes([fixed[8], fixed[9]]);
        if version != FORMAT_VERSION {
            return Err(CodecError::Format(format!(
                "unsupported format version {version} (only {FORMAT_VERSION} is supported)"
            )));
        }
        let codec_id = u16::from_le_bytes([fixed[10], fixed[11]]);
        let element = ElementType::from_tag(fixed[12])
            .ok_or_else(|| CodecError::Format(format!("unknown element tag {}", fixed[12])))?;
        let ndims = fixed[13] as usize;
        if ndims == 0 || ndims > Shape::MAX_DIMS {
            return Err(CodecError::Format(format!("invalid dimension count {ndims}")));
        }
        let flags = u16::from_le_bytes([fixed[14], fixed[15]]);
        let payload_len = u64::from_le_bytes(le_array(&fixed[16..24]));
        let checksum = u64::from_le_bytes(le_array(&fixed[24..32]));

        let mut dims_buf = vec![0u8; ndims * DIM_SIZE];
        src.read_exact(&mut dims_buf)?;
        let dims = dims_buf
            .chunks_exact(DIM_SIZE)
            .map(|c| {
                usize::try_from(u64::from_le_bytes(le_array(c)))
                    .map_err(|_| CodecError::Format("dimension does not fit usize".to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        let shape = Shape::new(dims).map_err(|e| CodecError::Format(e.to_string()))?;
        if shape.len().checked_mul(element.size()).is_none() {
            return Err(CodecError::Format(format!(
                "{shape} {element} elements overflow the addressable size"
            )));
        }

        Ok(Self {
            version,
            codec_id,
            element,
            flags,
            payload_len,
            checksum,
            shape,
        })
    }
}

fn le_array(bytes: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(bytes);
    out
}
