use std::io::Write;

use log::trace;
use strtok_types::value::{INTEGER_MAX, INTEGER_MIN};
use strtok_types::{Value, marker};
use strtok_wire::{Primitive, Token};

use crate::error::EncodeError;

/// Tag bytes for one length-prefixed family (raw, array, or map).
struct Family {
    kind: &'static str,
    fix: u8,
    fix_max: usize,
    wide16: u8,
    wide32: u8,
}

const RAW: Family = Family {
    kind: "raw",
    fix: marker::FIXRAW,
    // The fixraw tag has room for 31, but the canonical encoding stops at 15
    fix_max: marker::FIX_CONTAINER_MAX,
    wide16: marker::RAW16,
    wide32: marker::RAW32,
};

const ARRAY: Family = Family {
    kind: "array",
    fix: marker::FIXARRAY,
    fix_max: marker::FIX_CONTAINER_MAX,
    wide16: marker::ARRAY16,
    wide32: marker::ARRAY32,
};

const MAP: Family = Family {
    kind: "map",
    fix: marker::FIXMAP,
    fix_max: marker::FIX_CONTAINER_MAX,
    wide16: marker::MAP16,
    wide32: marker::MAP32,
};

/// Exact number of bytes `value` encodes to.
///
/// Walks the whole tree and checks every integer range and every length
/// limit, so it doubles as validation.
///
/// # Errors
///
/// - [`EncodeError::IntegerOutOfRange`] for an integer outside
///   `[-2^31, 2^32 - 1]`.
/// - [`EncodeError::LengthOverflow`] for a raw, array, or map with more
///   than `u32::MAX` entries.
pub fn encoded_len(value: &Value) -> Result<usize, EncodeError> {
    let len = match value {
        Value::Nil | Value::Bool(_) => 1,
        Value::Integer(v) => integer_len(*v)?,
        Value::Raw(bytes) => header_len(&RAW, bytes.len())? + bytes.len(),
        Value::Array(items) => {
            let mut len = header_len(&ARRAY, items.len())?;
            for item in items {
                len += encoded_len(item)?;
            }
            len
        }
        Value::Map(map) => {
            let mut len = header_len(&MAP, map.len())?;
            for (k, v) in map {
                len += encoded_len(k)? + encoded_len(v)?;
            }
            len
        }
    };
    Ok(len)
}

/// Write the minimal-width encoding of `value` to `sink`.
///
/// The value is validated and serialized into memory first and only then
/// handed to the sink in one `write_all`, so range and length errors never
/// leave partial output behind.
///
/// Maps are written in key order. The same map therefore always produces
/// the same bytes, though decoders must not rely on pair order.
///
/// # Returns
///
/// The number of bytes written.
///
/// # Errors
///
/// Everything [`encoded_len`] reports, plus [`EncodeError::Io`] if the
/// sink fails.
pub fn encode(sink: &mut impl Write, value: &Value) -> Result<usize, EncodeError> {
    let buf = to_vec(value)?;
    sink.write_all(&buf)?;
    Ok(buf.len())
}

/// Encode `value` into a fresh buffer.
///
/// # Errors
///
/// Same as [`encoded_len`].
pub fn to_vec(value: &Value) -> Result<Vec<u8>, EncodeError> {
    let len = encoded_len(value)?;
    let mut buf = Vec::with_capacity(len);
    write_value(&mut buf, value)?;
    debug_assert_eq!(buf.len(), len);
    trace!("encoded {} into {len} bytes", value.shape());
    Ok(buf)
}

// ── Writers ──────────────────────────────────────────────────────────────────

fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Nil => put_tag(buf, marker::NIL)?,
        Value::Bool(false) => put_tag(buf, marker::FALSE)?,
        Value::Bool(true) => put_tag(buf, marker::TRUE)?,
        Value::Integer(v) => write_integer(buf, *v)?,
        Value::Raw(bytes) => {
            write_header(buf, &RAW, bytes.len())?;
            // Raw(0) is not a valid primitive; an empty string is the header alone
            if !bytes.is_empty() {
                Primitive::Raw(bytes.len()).encode(buf, &Token::Bytes(bytes.clone()))?;
            }
        }
        Value::Array(items) => {
            write_header(buf, &ARRAY, items.len())?;
            for item in items {
                write_value(buf, item)?;
            }
        }
        Value::Map(map) => {
            write_header(buf, &MAP, map.len())?;
            for (k, v) in map {
                write_value(buf, k)?;
                write_value(buf, v)?;
            }
        }
    }
    Ok(())
}

fn put_tag(buf: &mut Vec<u8>, tag: u8) -> Result<(), EncodeError> {
    Primitive::U8.encode(buf, &Token::U8(tag))?;
    Ok(())
}

fn put(buf: &mut Vec<u8>, tag: u8, primitive: Primitive, payload: Token) -> Result<(), EncodeError> {
    put_tag(buf, tag)?;
    primitive.encode(buf, &payload)?;
    Ok(())
}

/// Integer tiers:
///
/// ```text
/// ┌────────────────────────────┬───────────────┬───────┐
/// │ Range                      │ Tag           │ Bytes │
/// ├────────────────────────────┼───────────────┼───────┤
/// │ 0 ..= 127                  │ value itself  │ 1     │
/// │ 128 ..= 255                │ 0xCC + u8     │ 2     │
/// │ 256 ..= 65535              │ 0xCD + u16    │ 3     │
/// │ 65536 ..= 2^32 - 1         │ 0xCE + u32    │ 5     │
/// │ -32 ..= -1                 │ value itself  │ 1     │
/// │ -128 ..= -33               │ 0xD0 + i8     │ 2     │
/// │ -32768 ..= -129            │ 0xD1 + i16    │ 3     │
/// │ -2^31 ..= -32769           │ 0xD2 + i32    │ 5     │
/// └────────────────────────────┴───────────────┴───────┘
/// ```
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn write_integer(buf: &mut Vec<u8>, v: i64) -> Result<(), EncodeError> {
    match v {
        0..=0x7F => put_tag(buf, v as u8),
        0x80..=0xFF => put(buf, marker::UINT8, Primitive::U8, Token::U8(v as u8)),
        0x100..=0xFFFF => put(buf, marker::UINT16, Primitive::U16Be, Token::U16(v as u16)),
        0x1_0000..=INTEGER_MAX => put(buf, marker::UINT32, Primitive::U32Be, Token::U32(v as u32)),
        -32..=-1 => put_tag(buf, v as i8 as u8),
        -128..=-33 => put(buf, marker::INT8, Primitive::I8, Token::I8(v as i8)),
        -32768..=-129 => put(buf, marker::INT16, Primitive::I16Be, Token::I16(v as i16)),
        INTEGER_MIN..=-32769 => put(buf, marker::INT32, Primitive::I32Be, Token::I32(v as i32)),
        _ => Err(EncodeError::IntegerOutOfRange { value: v }),
    }
}

fn integer_len(v: i64) -> Result<usize, EncodeError> {
    match v {
        -32..=0x7F => Ok(1),
        -128..=0xFF => Ok(2),
        -32768..=0xFFFF => Ok(3),
        INTEGER_MIN..=INTEGER_MAX => Ok(5),
        _ => Err(EncodeError::IntegerOutOfRange { value: v }),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn write_header(buf: &mut Vec<u8>, family: &Family, len: usize) -> Result<(), EncodeError> {
    if len <= family.fix_max {
        put_tag(buf, family.fix | len as u8)
    } else if let Ok(n) = u16::try_from(len) {
        put(buf, family.wide16, Primitive::U16Be, Token::U16(n))
    } else if let Ok(n) = u32::try_from(len) {
        put(buf, family.wide32, Primitive::U32Be, Token::U32(n))
    } else {
        Err(EncodeError::LengthOverflow {
            kind: family.kind,
            len,
        })
    }
}

fn header_len(family: &Family, len: usize) -> Result<usize, EncodeError> {
    if len <= family.fix_max {
        Ok(1)
    } else if u16::try_from(len).is_ok() {
        Ok(3)
    } else if u32::try_from(len).is_ok() {
        Ok(5)
    } else {
        Err(EncodeError::LengthOverflow {
            kind: family.kind,
            len,
        })
    }
}

// ── Builder ──────────────────────────────────────────────────────────────────

/// Builds a byte sequence of several top-level values, one after another.
///
/// Values are validated when the sequence is encoded, not when added, so
/// an out-of-range [`add_integer`](Self::add_integer) surfaces as an error
/// from [`encode`](Self::encode).
///
/// ```rust
/// use strtok_encoder::MsgpackEncoder;
///
/// let bytes = MsgpackEncoder::new()
///     .add(1)
///     .add("abc")
///     .add(true)
///     .encode()
///     .unwrap();
/// assert_eq!(bytes, [0x01, 0xA3, b'a', b'b', b'c', 0xC3]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MsgpackEncoder {
    values: Vec<Value>,
}

impl MsgpackEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: impl Into<Value>) -> &mut Self {
        self.values.push(value.into());
        self
    }

    /// Add an integer of any width. Checked at encode time.
    pub fn add_integer(&mut self, value: i64) -> &mut Self {
        self.values.push(Value::Integer(value));
        self
    }

    /// Number of top-level values added.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total encoded size of every value added so far.
    ///
    /// # Errors
    ///
    /// Same as [`encoded_len`].
    pub fn encoded_len(&self) -> Result<usize, EncodeError> {
        self.values
            .iter()
            .try_fold(0, |total, value| Ok::<_, EncodeError>(total + encoded_len(value)?))
    }

    /// Encode every value, in the order added.
    ///
    /// # Errors
    ///
    /// Same as [`encoded_len`]. Nothing is produced if any value fails.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let len = self.encoded_len()?;
        let mut buf = Vec::with_capacity(len);
        for value in &self.values {
            write_value(&mut buf, value)?;
        }
        Ok(buf)
    }

    /// Encode every value into `sink`.
    ///
    /// # Errors
    ///
    /// Same as [`encode`](Self::encode), plus [`EncodeError::Io`].
    pub fn write_to(&self, sink: &mut impl Write) -> Result<usize, EncodeError> {
        let buf = self.encode()?;
        sink.write_all(&buf)?;
        Ok(buf.len())
    }
}
