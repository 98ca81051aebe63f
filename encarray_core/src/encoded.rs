use log::debug;

use crate::array::{RawArray, Shape};
use crate::codec::ArrayCodec;
use crate::element::{Element, ElementType};
use crate::error::{CodecError, DecodeError, Result};

/// Array whose elements are kept in encoded form.
///
/// Binds a codec, a logical shape, and the byte buffer produced by the codec.
/// The buffer always decodes, with the stored codec, to exactly
/// `shape().len()` elements of type `T`; every constructor either
/// establishes that or fails without handing out an array.
///
/// Created either by encoding a whole array at once:
///
/// ```
/// use encarray_core::{ArrayCodec, VarlenDiffArrayCodec};
///
/// let enc = VarlenDiffArrayCodec.encode(&[5i32, 7, 3, 3, 10]).unwrap();
/// assert_eq!(enc.to_vec().unwrap(), vec![5, 7, 3, 3, 10]);
/// ```
///
/// or by starting empty and appending:
///
/// ```
/// use encarray_core::{EncodedArray, VarlenDiffArrayCodec};
///
/// let mut enc = EncodedArray::<u32, _>::new(VarlenDiffArrayCodec);
/// enc.append(&[1, 2, 3]).unwrap();
/// enc.append(&[4]).unwrap();
/// assert_eq!(enc.len(), 4);
/// ```
///
/// Whole-array decoding is linear in the encoded size. [`get`](Self::get) may
/// cost as much as decoding everything before the element.
#[derive(Debug, Clone)]
pub struct EncodedArray<T, C> {
    codec: C,
    shape: Shape,
    encoded: Vec<u8>,
    /// Last element in linear order, needed to continue a delta chain.
    tail: Option<T>,
}

impl<T: Element, C: ArrayCodec> EncodedArray<T, C> {
    /// Empty one-dimensional array, ready for [`append`](Self::append).
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            shape: Shape::vector(0),
            encoded: Vec::new(),
            tail: None,
        }
    }

    /// Encodes a shaped array.
    pub fn encode(codec: C, array: &RawArray<T>) -> Result<Self> {
        let mut encoded = Vec::new();
        codec.encode_data(&mut encoded, array.as_slice())?;
        debug!(
            "encoded {} {} elements ({}) with {}: {} bytes",
            array.len(),
            T::ELEMENT_TYPE,
            array.shape(),
            codec.name(),
            encoded.len()
        );
        Ok(Self {
            codec,
            shape: array.shape().clone(),
            encoded,
            tail: array.as_slice().last().copied(),
        })
    }

    /// Encodes a slice as a one-dimensional array.
    pub fn from_slice(codec: C, data: &[T]) -> Result<Self> {
        let mut encoded = Vec::new();
        codec.encode_data(&mut encoded, data)?;
        debug!(
            "encoded {} {} elements with {}: {} bytes",
            data.len(),
            T::ELEMENT_TYPE,
            codec.name(),
            encoded.len()
        );
        Ok(Self {
            codec,
            shape: Shape::vector(data.len()),
            encoded,
            tail: data.last().copied(),
        })
    }

    /// Wraps an existing buffer, checking that it decodes to `shape`.
    ///
    /// The check is a full decode, so it is linear in the buffer size. A
    /// shape claiming more elements than the buffer can hold is rejected
    /// before anything of that size is allocated.
    pub fn from_parts(codec: C, shape: Shape, encoded: Vec<u8>) -> Result<Self> {
        let len = shape.len();
        if let Some(max) = codec.max_decoded_len::<T>(&encoded) {
            if len > max {
                return Err(CodecError::ShapeMismatch {
                    expected: len,
                    actual: max,
                });
            }
        }
        let mut decoded = Vec::new();
        decoded.try_reserve_exact(len).map_err(|_| {
            DecodeError::Malformed(format!("cannot allocate {len} {} elements", T::ELEMENT_TYPE))
        })?;
        decoded.resize(len, T::default());
        codec.decode_presized(&mut decoded, &encoded)?;
        Ok(Self {
            codec,
            shape,
            encoded,
            tail: decoded.last().copied(),
        })
    }

    /// Wraps a buffer of a self-describing codec as a one-dimensional array
    /// whose length is read from the bytes.
    pub fn from_encoded(codec: C, encoded: Vec<u8>) -> Result<Self> {
        let len = codec.decoded_len::<T>(&encoded).ok_or_else(|| {
            DecodeError::Malformed(format!(
                "{} cannot infer the element count of this buffer",
                codec.name()
            ))
        })?;
        Self::from_parts(codec, Shape::vector(len), encoded)
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// The encoded bytes.
    pub fn code_units(&self) -> &[u8] {
        &self.encoded
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn ndims(&self) -> usize {
        self.shape.ndims()
    }

    pub fn len(&self) -> usize {
        self.shape.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    pub fn element_type(&self) -> ElementType {
        T::ELEMENT_TYPE
    }

    pub fn into_parts(self) -> (C, Shape, Vec<u8>) {
        (self.codec, self.shape, self.encoded)
    }

    /// Size of the encoded buffer in bytes.
    pub fn encoded_size(&self) -> usize {
        self.encoded.len()
    }

    /// Size the elements would take as a plain array.
    pub fn raw_size(&self) -> usize {
        self.len().saturating_mul(T::ELEMENT_TYPE.size())
    }

    /// Compression ratio (raw / encoded).
    pub fn ratio(&self) -> f64 {
        if self.encoded.is_empty() {
            return 1.0;
        }
        self.raw_size() as f64 / self.encoded.len() as f64
    }

    /// Decodes the whole array.
    pub fn decode(&self) -> Result<RawArray<T>> {
        let mut decoded = vec![T::default(); self.len()];
        self.codec.decode_presized(&mut decoded, &self.encoded)?;
        debug!(
            "decoded {} bytes with {} into {} elements",
            self.encoded.len(),
            self.codec.name(),
            decoded.len()
        );
        RawArray::new(self.shape.clone(), decoded)
    }

    /// Decodes the whole array as a flat vector in column-major order.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        self.decode().map(RawArray::into_vec)
    }

    /// Decodes into a caller-provided buffer of exactly `len()` elements.
    pub fn decode_into(&self, out: &mut [T]) -> Result<()> {
        if out.len() != self.len() {
            return Err(CodecError::ShapeMismatch {
                expected: self.len(),
                actual: out.len(),
            });
        }
        self.codec.decode_presized(out, &self.encoded)
    }

    /// Element at linear (column-major) `index`.
    pub fn get(&self, index: usize) -> Result<T> {
        self.codec
            .decode_element(&self.encoded, self.len(), index)
    }

    /// Element at N-dimensional `coords`.
    pub fn get_at(&self, coords: &[usize]) -> Result<T> {
        let index = self.shape.linear_index(coords)?;
        self.get(index)
    }

    /// Appends elements to a one-dimensional array.
    pub fn append(&mut self, data: &[T]) -> Result<()> {
        if self.ndims() != 1 {
            return Err(CodecError::ShapeMismatch {
                expected: 1,
                actual: self.ndims(),
            });
        }
        self.append_elements(data, data.len())
    }

    /// Appends a shaped array along the last dimension.
    ///
    /// Every other dimension of `array` must match this array's.
    pub fn append_array(&mut self, array: &RawArray<T>) -> Result<()> {
        let ours = self.shape.dims();
        let theirs = array.shape().dims();
        if ours.len() != theirs.len() || ours[..ours.len() - 1] != theirs[..theirs.len() - 1] {
            return Err(CodecError::ShapeMismatch {
                expected: self.shape.stride_of_last(),
                actual: array.shape().stride_of_last(),
            });
        }
        self.append_elements(array.as_slice(), theirs[theirs.len() - 1])
    }

    fn append_elements(&mut self, data: &[T], grow_by: usize) -> Result<()> {
        if data.is_empty() {
            // a slab with a zero-length leading dimension still extends the shape
            self.shape.grow_last(grow_by)?;
            return Ok(());
        }
        if !self.codec.supports_append() {
            return Err(CodecError::AppendUnsupported {
                codec: self.codec.name(),
            });
        }
        let start = self.encoded.len();
        if let Err(e) = self.codec.append_data(&mut self.encoded, self.tail, data) {
            self.encoded.truncate(start);
            return Err(e);
        }
        if let Err(e) = self.shape.grow_last(grow_by) {
            self.encoded.truncate(start);
            return Err(e);
        }
        self.tail = data.last().copied();
        debug!(
            "appended {} elements with {}: {} -> {} bytes",
            data.len(),
            self.codec.name(),
            start,
            self.encoded.len()
        );
        Ok(())
    }
}

impl<T, C: PartialEq> PartialEq for EncodedArray<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.codec == other.codec && self.shape == other.shape && self.encoded == other.encoded
    }
}
