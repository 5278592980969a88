use strtok_tokenizer::TokenizerError;
use strtok_wire::WireError;

/// Errors that can occur while decoding values.
///
/// Error hierarchy:
///
/// ```text
///   DecodeError
///   ├── UnknownTag                  ← tag byte outside the supported set
///   ├── DepthLimit                  ← nesting deeper than max_depth
///   ├── Truncated                   ← input ended inside a value
///   ├── Tokenizer(TokenizerError)   ← from strtok-tokenizer
///   ├── Wire(WireError)             ← payload token of the wrong shape
///   └── Io(std::io::Error)          ← from the transport
/// ```
///
/// After any of these the in-flight top-level value is discarded; values
/// completed before the error have already been delivered.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// A tag byte the format does not define (`0xC1`, floats, 64-bit
    /// integers, extension types). There is no way to resynchronize, so
    /// decoding stops.
    #[error("unknown tag byte {tag:#04x} at offset {offset}")]
    UnknownTag { tag: u8, offset: u64 },

    #[error("container at offset {offset} nests deeper than {limit}")]
    DepthLimit { limit: usize, offset: u64 },

    /// The input ended partway through a value. `buffered` bytes had
    /// arrived but were never consumed.
    #[error("input ended inside a value ({buffered} bytes unread)")]
    Truncated { buffered: usize },

    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
