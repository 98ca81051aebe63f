use thiserror::Error;

/// Ways a byte stream can fail to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The stream ended inside a varlen integer (continuation bit still set).
    #[error("truncated varlen integer at byte offset {offset}")]
    Truncated { offset: usize },

    /// Bytes were left over after the expected number of values was read
    /// and they do not form a complete value.
    #[error("{count} trailing bytes after the last encoded value")]
    TrailingBytes { count: usize },

    /// Any other malformed payload, usually reported by a compression backend.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Errors raised by codecs, encoded arrays and the container file format.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A decoded integer does not fit into the requested type.
    #[error("decoded value does not fit into {type_name} ({bits} bits)")]
    Overflow { type_name: &'static str, bits: u32 },

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A pre-sized destination (or a shape) disagrees with the encoded data.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Input that cannot be represented by the codec or element type.
    #[error("encode error: {0}")]
    Encode(String),

    /// The difference between two neighbouring elements does not fit the
    /// 128-bit signed accumulator.
    #[error("delta between {prev} and {next} exceeds the i128 accumulator")]
    Range { prev: String, next: String },

    #[error("codec '{codec}' does not support appending")]
    AppendUnsupported { codec: &'static str },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("invalid container: {0}")]
    Format(String),

    #[error("payload checksum mismatch: expected {expected:016x}, got {actual:016x}")]
    ChecksumMismatch { expected: u64, actual: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
