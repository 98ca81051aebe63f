use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use log::trace;
use xxhash_rust::xxh3::{xxh3_64, Xxh3};

use crate::array::Shape;
use crate::codec::ArrayCodec;
use crate::element::Element;
use crate::encoded::EncodedArray;
use crate::error::Result;
use crate::format::{ContainerHeader, FLAG_HAS_CHECKSUM, FORMAT_VERSION};

/// Streaming writer for one-dimensional encoded array files.
///
/// # Write contract
/// Call [`write`](Writer::write) any number of times with slices of elements.
/// When the codec supports appending, each slice is encoded right away and its
/// bytes go straight to the file; otherwise the elements are buffered and
/// encoded in one go by [`finish`](Writer::finish). `finish` writes back the
/// final header.
///
/// # Layout written
/// ```text
/// [HEADER: 32 + 8 bytes placeholder]
/// [PAYLOAD]                       ← code units, written as they are produced
/// ← seek back to 0, overwrite header with real values
/// ```
pub struct Writer<T: Element, C: ArrayCodec> {
    file: BufWriter<File>,
    codec: C,
    /// Elements not yet encoded (codecs without append support only).
    pending: Vec<T>,
    /// Last element written, continues the encoding on the next write.
    tail: Option<T>,
    count: usize,
    payload_len: u64,
    hasher: Xxh3,
    scratch: Vec<u8>,
}

impl<T: Element, C: ArrayCodec> Writer<T, C> {
    /// Create a new file at `path`, overwriting any existing one.
    pub fn create(path: impl AsRef<Path>, codec: C) -> Result<Self> {
        let mut file = BufWriter::new(File::create(path)?);
        // Placeholder header (overwritten in finish())
        file.write_all(&header_for::<T, C>(&codec, Shape::vector(0), 0, 0).to_bytes())?;
        Ok(Self {
            file,
            codec,
            pending: Vec::new(),
            tail: None,
            count: 0,
            payload_len: 0,
            hasher: Xxh3::new(),
            scratch: Vec::new(),
        })
    }

    /// Encode (or buffer) `data` after everything written so far.
    pub fn write(&mut self, data: &[T]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        if !self.codec.supports_append() {
            self.pending.extend_from_slice(data);
            return Ok(());
        }
        self.scratch.clear();
        self.codec.append_data(&mut self.scratch, self.tail, data)?;
        self.emit()?;
        self.tail = data.last().copied();
        self.count += data.len();
        Ok(())
    }

    fn emit(&mut self) -> Result<()> {
        self.file.write_all(&self.scratch)?;
        self.hasher.update(&self.scratch);
        self.payload_len += self.scratch.len() as u64;
        trace!(
            "container: wrote {} payload bytes ({} total)",
            self.scratch.len(),
            self.payload_len
        );
        Ok(())
    }

    /// Encode any buffered elements, seal the file, and return the number of
    /// elements written.
    pub fn finish(mut self) -> Result<usize> {
        if !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            self.codec.encode_data(&mut self.scratch, &pending)?;
            self.emit()?;
            self.count = pending.len();
        }

        let header = header_for::<T, C>(
            &self.codec,
            Shape::vector(self.count),
            self.payload_len,
            self.hasher.digest(),
        );
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&header.to_bytes())?;
        self.file.flush()?;

        Ok(self.count)
    }
}

/// Writes a complete encoded array (of any shape) to `path`.
pub fn write_array<T: Element, C: ArrayCodec>(
    path: impl AsRef<Path>,
    array: &EncodedArray<T, C>,
) -> Result<()> {
    let payload = array.code_units();
    let header = header_for::<T, C>(
        array.codec(),
        array.shape().clone(),
        payload.len() as u64,
        xxh3_64(payload),
    );
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(&header.to_bytes())?;
    file.write_all(payload)?;
    file.flush()?;
    Ok(())
}

fn header_for<T: Element, C: ArrayCodec>(
    codec: &C,
    shape: Shape,
    payload_len: u64,
    checksum: u64,
) -> ContainerHeader {
    ContainerHeader {
        version: FORMAT_VERSION,
        codec_id: codec.id(),
        element: T::ELEMENT_TYPE,
        flags: FLAG_HAS_CHECKSUM,
        payload_len,
        checksum,
        shape,
    }
}
