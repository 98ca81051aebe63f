//! # encarray_core
//!
//! Integer arrays stored in compact encoded form while keeping array
//! semantics: a shape, element access, and conversion to and from plain
//! arrays.
//!
//! - [`varlen`] and [`zigzag`]: the variable-length integer wire format.
//! - [`ArrayCodec`]: the capability every codec implements.
//! - [`VarlenDiffArrayCodec`]: delta + zig-zag + varlen codec.
//! - [`EncodedArray`]: codec, shape and code units bound together.
//! - [`Writer`] / [`Reader`]: a single-array container file.
//!
//! Random access into an encoded array is usually slow; decoding the whole
//! array at once is always linear in the encoded size.

pub mod array;
pub mod codec;
pub mod diff;
pub mod element;
pub mod encoded;
pub mod error;
pub mod format;
pub mod reader;
pub mod varlen;
pub mod writer;
pub mod zigzag;

pub use array::{RawArray, Shape};
pub use codec::{ArrayCodec, DecodePolicy};
pub use diff::{DiffDecoder, VarlenDiffArrayCodec};
pub use element::{Element, ElementType, Unsigned};
pub use encoded::EncodedArray;
pub use error::{CodecError, DecodeError, Result};
pub use format::{ContainerHeader, MAGIC};
pub use reader::Reader;
pub use varlen::{read_autozz_varlen, read_varlen, write_autozz_varlen, write_varlen, ByteReader};
pub use writer::{write_array, Writer};
pub use zigzag::{unzigzag, zigzag, ZigZag};
