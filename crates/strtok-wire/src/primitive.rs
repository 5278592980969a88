use std::fmt;
use std::io::Write;

use bytes::Bytes;

use crate::error::WireError;

/// A fixed-width, interpretable unit that a strategy asks the tokenizer
/// to read next.
///
/// Every descriptor knows its byte width, how to turn exactly that many
/// bytes into a [`Token`], and how to write a matching token back out.
///
/// ```text
/// ┌───────────┬───────┬──────────────────────────────────┐
/// │ Variant   │ Width │ Token                            │
/// ├───────────┼───────┼──────────────────────────────────┤
/// │ U8        │ 1     │ Token::U8                        │
/// │ U16Be/Le  │ 2     │ Token::U16                       │
/// │ U32Be/Le  │ 4     │ Token::U32                       │
/// │ I8        │ 1     │ Token::I8                        │
/// │ I16Be/Le  │ 2     │ Token::I16                       │
/// │ I32Be/Le  │ 4     │ Token::I32                       │
/// │ Raw(n)    │ n     │ Token::Bytes (exactly n bytes)   │
/// └───────────┴───────┴──────────────────────────────────┘
/// ```
///
/// Every readable descriptor has a width of at least one byte. `Raw(0)`
/// is expressible but not valid; see [`Primitive::is_valid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    U8,
    U16Be,
    U16Le,
    U32Be,
    U32Le,
    I8,
    I16Be,
    I16Le,
    I32Be,
    I32Le,
    /// An opaque byte string of known length.
    Raw(usize),
}

impl Primitive {
    /// Number of bytes this descriptor consumes.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16Be | Self::U16Le | Self::I16Be | Self::I16Le => 2,
            Self::U32Be | Self::U32Le | Self::I32Be | Self::I32Le => 4,
            Self::Raw(len) => len,
        }
    }

    /// Whether the descriptor can be read. Only `Raw(0)` fails this: a
    /// zero-width read would never consume input and is treated by the
    /// tokenizer as an unrecognized descriptor.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.width() >= 1
    }

    /// Interpret exactly `width()` bytes as a token.
    ///
    /// Raw descriptors hand the input back unchanged, so a zero-copy
    /// slice from the chunk queue stays zero-copy.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than `width()`.
    #[must_use]
    pub fn decode(self, bytes: Bytes) -> Token {
        match self {
            Self::U8 => Token::U8(bytes[0]),
            Self::U16Be => Token::U16(u16::from_be_bytes(fixed(&bytes))),
            Self::U16Le => Token::U16(u16::from_le_bytes(fixed(&bytes))),
            Self::U32Be => Token::U32(u32::from_be_bytes(fixed(&bytes))),
            Self::U32Le => Token::U32(u32::from_le_bytes(fixed(&bytes))),
            Self::I8 => Token::I8(i8::from_be_bytes([bytes[0]])),
            Self::I16Be => Token::I16(i16::from_be_bytes(fixed(&bytes))),
            Self::I16Le => Token::I16(i16::from_le_bytes(fixed(&bytes))),
            Self::I32Be => Token::I32(i32::from_be_bytes(fixed(&bytes))),
            Self::I32Le => Token::I32(i32::from_le_bytes(fixed(&bytes))),
            Self::Raw(len) => Token::Bytes(bytes.slice(..len)),
        }
    }

    /// Write `token` using this descriptor's layout.
    ///
    /// # Returns
    ///
    /// The number of bytes written, always `width()`.
    ///
    /// # Errors
    ///
    /// - [`WireError::TokenMismatch`] if the token shape does not fit.
    /// - [`WireError::RawLengthMismatch`] if a raw token has the wrong length.
    /// - [`WireError::Io`] if the sink fails.
    pub fn encode(self, w: &mut impl Write, token: &Token) -> Result<usize, WireError> {
        match (self, token) {
            (Self::U8, Token::U8(v)) => w.write_all(&[*v])?,
            (Self::U16Be, Token::U16(v)) => w.write_all(&v.to_be_bytes())?,
            (Self::U16Le, Token::U16(v)) => w.write_all(&v.to_le_bytes())?,
            (Self::U32Be, Token::U32(v)) => w.write_all(&v.to_be_bytes())?,
            (Self::U32Le, Token::U32(v)) => w.write_all(&v.to_le_bytes())?,
            (Self::I8, Token::I8(v)) => w.write_all(&v.to_be_bytes())?,
            (Self::I16Be, Token::I16(v)) => w.write_all(&v.to_be_bytes())?,
            (Self::I16Le, Token::I16(v)) => w.write_all(&v.to_le_bytes())?,
            (Self::I32Be, Token::I32(v)) => w.write_all(&v.to_be_bytes())?,
            (Self::I32Le, Token::I32(v)) => w.write_all(&v.to_le_bytes())?,
            (Self::Raw(len), Token::Bytes(b)) => {
                if b.len() != len {
                    return Err(WireError::RawLengthMismatch {
                        expected: len,
                        actual: b.len(),
                    });
                }
                w.write_all(b)?;
            }
            (expected, found) => {
                return Err(WireError::TokenMismatch {
                    expected,
                    found: found.kind(),
                });
            }
        }
        Ok(self.width())
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => f.write_str("uint8"),
            Self::U16Be => f.write_str("uint16be"),
            Self::U16Le => f.write_str("uint16le"),
            Self::U32Be => f.write_str("uint32be"),
            Self::U32Le => f.write_str("uint32le"),
            Self::I8 => f.write_str("int8"),
            Self::I16Be => f.write_str("int16be"),
            Self::I16Le => f.write_str("int16le"),
            Self::I32Be => f.write_str("int32be"),
            Self::I32Le => f.write_str("int32le"),
            Self::Raw(len) => write!(f, "raw({len})"),
        }
    }
}

/// A decoded primitive, handed to the strategy by the tokenizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    U8(u8),
    U16(u16),
    U32(u32),
    I8(i8),
    I16(i16),
    I32(i32),
    Bytes(Bytes),
}

impl Token {
    /// Short shape name used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::Bytes(_) => "bytes",
        }
    }

    /// The value of an unsigned integer token, widened to `u32`.
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Self::U8(v) => Some(u32::from(v)),
            Self::U16(v) => Some(u32::from(v)),
            Self::U32(v) => Some(v),
            _ => None,
        }
    }

    /// The value of any integer token, widened to `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::U8(v) => Some(i64::from(v)),
            Self::U16(v) => Some(i64::from(v)),
            Self::U32(v) => Some(i64::from(v)),
            Self::I8(v) => Some(i64::from(v)),
            Self::I16(v) => Some(i64::from(v)),
            Self::I32(v) => Some(i64::from(v)),
            Self::Bytes(_) => None,
        }
    }

    #[must_use]
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

/// What a strategy wants the tokenizer to do after it has seen a token.
///
/// `Defer` and `Done` request no bytes: `Defer` parks the tokenizer until
/// a continuation supplies the real next step, `Done` ends tokenization
/// and releases the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Next {
    Read(Primitive),
    Defer,
    Done,
}

impl From<Primitive> for Next {
    fn from(primitive: Primitive) -> Self {
        Self::Read(primitive)
    }
}
