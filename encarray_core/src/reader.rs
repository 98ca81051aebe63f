use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::trace;
use xxhash_rust::xxh3::xxh3_64;

use crate::array::Shape;
use crate::codec::ArrayCodec;
use crate::element::{Element, ElementType};
use crate::encoded::EncodedArray;
use crate::error::{CodecError, Result};
use crate::format::{ContainerHeader, FLAG_HAS_CHECKSUM};

/// Reader for encoded array files.
///
/// # Open sequence
/// 1. Read the fixed header (magic, version, codec id, element type).
/// 2. Read the dimension extents.
///
/// The payload is only read by [`read_array`](Reader::read_array), once the
/// caller has picked a codec matching `header.codec_id` (for bundled codecs,
/// `encarray_codecs::codec_by_id` does that).
pub struct Reader {
    file: BufReader<File>,
    /// Length of the file on disk, bounds the payload allocation.
    file_len: u64,
    pub header: ContainerHeader,
}

impl Reader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut file = BufReader::new(file);
        let header = ContainerHeader::read_from(&mut file)?;
        trace!(
            "container: codec {} {} {} payload {} bytes",
            header.codec_id,
            header.element,
            header.shape,
            header.payload_len
        );
        Ok(Self {
            file,
            file_len,
            header,
        })
    }

    pub fn codec_id(&self) -> u16 {
        self.header.codec_id
    }

    pub fn element_type(&self) -> ElementType {
        self.header.element
    }

    pub fn shape(&self) -> &Shape {
        &self.header.shape
    }

    pub fn payload_len(&self) -> u64 {
        self.header.payload_len
    }

    /// Size the elements would take as a plain array.
    pub fn raw_size(&self) -> u64 {
        (self.header.shape.len() as u64).saturating_mul(self.header.element.size() as u64)
    }

    /// Compression ratio (raw / payload).
    pub fn ratio(&self) -> f64 {
        if self.header.payload_len == 0 {
            return 1.0;
        }
        self.raw_size() as f64 / self.header.payload_len as f64
    }

    /// Reads the payload and verifies its checksum when one is stored.
    pub fn read_payload(&mut self) -> Result<Vec<u8>> {
        let available = self
            .file_len
            .saturating_sub(self.header.encoded_len() as u64);
        if self.header.payload_len > available {
            return Err(CodecError::Format(format!(
                "header claims a {} byte payload but only {} bytes follow it",
                self.header.payload_len, available
            )));
        }
        let len = usize::try_from(self.header.payload_len)
            .map_err(|_| CodecError::Format("payload too large for this platform".to_string()))?;
        let mut payload = vec![0u8; len];
        self.file.read_exact(&mut payload)?;

        if self.header.has_flag(FLAG_HAS_CHECKSUM) {
            let computed = xxh3_64(&payload);
            if computed != self.header.checksum {
                return Err(CodecError::ChecksumMismatch {
                    expected: self.header.checksum,
                    actual: computed,
                });
            }
        }
        Ok(payload)
    }

    /// Reads the stored array, decoding it with `codec` to validate it.
    ///
    /// `codec` must match the header's codec id and `T` its element type.
    pub fn read_array<T: Element, C: ArrayCodec>(mut self, codec: C) -> Result<EncodedArray<T, C>> {
        if self.header.codec_id != codec.id() {
            return Err(CodecError::Format(format!(
                "codec mismatch: file uses codec {} but provided codec '{}' has id {}",
                self.header.codec_id,
                codec.name(),
                codec.id()
            )));
        }
        if self.header.element != T::ELEMENT_TYPE {
            return Err(CodecError::Format(format!(
                "element type mismatch: file holds {} but {} was requested",
                self.header.element,
                T::ELEMENT_TYPE
            )));
        }
        let payload = self.read_payload()?;
        EncodedArray::from_parts(codec, self.header.shape.clone(), payload)
    }
}
