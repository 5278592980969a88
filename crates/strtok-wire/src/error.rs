use crate::primitive::Primitive;

/// Errors raised while writing primitives to an output sink.
///
/// Reading never fails at this layer: the tokenizer only hands a
/// descriptor exactly `width` bytes, so every byte pattern decodes to
/// some token. Writing can fail when the token does not fit the
/// descriptor or when the sink itself errors.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The token's shape does not match the descriptor, e.g. a `U16`
    /// token handed to `Primitive::U32Be`.
    #[error("cannot encode a {found} token as {expected}")]
    TokenMismatch {
        expected: Primitive,
        found: &'static str,
    },

    /// A raw token's length differs from the width declared by
    /// `Primitive::Raw(n)`.
    #[error("raw token is {actual} bytes, descriptor declares {expected}")]
    RawLengthMismatch { expected: usize, actual: usize },

    /// I/O error from the output sink.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
