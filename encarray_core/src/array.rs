use std::fmt;

use crate::element::Element;
use crate::error::{CodecError, Result};

/// Extents of an array, first dimension varying fastest (column-major).
///
/// The last dimension is the one that grows when data is appended.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Largest number of dimensions the container format can carry.
    pub const MAX_DIMS: usize = 8;

    pub fn new(dims: Vec<usize>) -> Result<Self> {
        if dims.is_empty() || dims.len() > Self::MAX_DIMS {
            return Err(CodecError::Encode(format!(
                "arrays need 1 to {} dimensions, got {}",
                Self::MAX_DIMS,
                dims.len()
            )));
        }
        dims.iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| CodecError::Encode(format!("shape {dims:?} overflows usize")))?;
        Ok(Self(dims))
    }

    pub fn vector(len: usize) -> Self {
        Self(vec![len])
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn ndims(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.0.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Product of every dimension but the last: elements per step of the last one.
    pub fn stride_of_last(&self) -> usize {
        self.0[..self.0.len() - 1].iter().product()
    }

    /// Column-major linear index of `coords`.
    pub fn linear_index(&self, coords: &[usize]) -> Result<usize> {
        if coords.len() != self.ndims() {
            return Err(CodecError::ShapeMismatch {
                expected: self.ndims(),
                actual: coords.len(),
            });
        }
        let mut index = 0;
        let mut stride = 1;
        for (&c, &d) in coords.iter().zip(&self.0) {
            if c >= d {
                return Err(CodecError::IndexOutOfBounds { index: c, len: d });
            }
            index += c * stride;
            stride *= d;
        }
        Ok(index)
    }

    /// Extends the last dimension by `by`, keeping the element count in `usize`.
    pub(crate) fn grow_last(&mut self, by: usize) -> Result<()> {
        let mut dims = self.0.clone();
        if let Some(last) = dims.last_mut() {
            *last = last
                .checked_add(by)
                .ok_or_else(|| CodecError::Encode(format!("shape {self} cannot grow by {by}")))?;
        }
        *self = Shape::new(dims)?;
        Ok(())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.0.iter().map(|d| d.to_string()).collect();
        write!(f, "{}", dims.join("x"))
    }
}

/// Dense decoded array: the plain form an [`EncodedArray`] converts to and from.
///
/// [`EncodedArray`]: crate::EncodedArray
#[derive(Debug, Clone, PartialEq)]
pub struct RawArray<T> {
    shape: Shape,
    data: Vec<T>,
}

impl<T: Element> RawArray<T> {
    pub fn new(shape: Shape, data: Vec<T>) -> Result<Self> {
        if shape.len() != data.len() {
            return Err(CodecError::ShapeMismatch {
                expected: shape.len(),
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Array of `shape` filled with zeros.
    pub fn zeros(shape: Shape) -> Self {
        let data = vec![T::default(); shape.len()];
        Self { shape, data }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn get(&self, coords: &[usize]) -> Result<T> {
        let index = self.shape.linear_index(coords)?;
        Ok(self.data[index])
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn into_parts(self) -> (Shape, Vec<T>) {
        (self.shape, self.data)
    }
}

impl<T: Element> From<Vec<T>> for RawArray<T> {
    fn from(data: Vec<T>) -> Self {
        Self {
            shape: Shape::vector(data.len()),
            data,
        }
    }
}
