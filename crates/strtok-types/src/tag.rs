use crate::error::TypeError;

/// Raw tag bytes of the wire format.
///
/// Single-byte families (`FIXMAP`, `FIXARRAY`, `FIXRAW`,
/// `NEGATIVE_FIXINT`) are the base value; the low bits carry a length or
/// the integer itself.
pub mod marker {
    pub const POSITIVE_FIXINT_MAX: u8 = 0x7F;
    pub const FIXMAP: u8 = 0x80;
    pub const FIXARRAY: u8 = 0x90;
    pub const FIXRAW: u8 = 0xA0;
    pub const NIL: u8 = 0xC0;
    pub const FALSE: u8 = 0xC2;
    pub const TRUE: u8 = 0xC3;
    pub const UINT8: u8 = 0xCC;
    pub const UINT16: u8 = 0xCD;
    pub const UINT32: u8 = 0xCE;
    pub const INT8: u8 = 0xD0;
    pub const INT16: u8 = 0xD1;
    pub const INT32: u8 = 0xD2;
    pub const RAW16: u8 = 0xDA;
    pub const RAW32: u8 = 0xDB;
    pub const ARRAY16: u8 = 0xDC;
    pub const ARRAY32: u8 = 0xDD;
    pub const MAP16: u8 = 0xDE;
    pub const MAP32: u8 = 0xDF;
    pub const NEGATIVE_FIXINT: u8 = 0xE0;

    /// Longest length a fixarray or fixmap tag can carry.
    pub const FIX_CONTAINER_MAX: usize = 0x0F;
    /// Longest length a fixraw tag can carry.
    pub const FIXRAW_MAX: usize = 0x1F;
}

/// Every tag the format supports, as a closed type.
///
/// ```text
/// ┌─────────────┬──────────────────┬──────────────────────────────┐
/// │ Byte(s)     │ Variant          │ Followed by                  │
/// ├─────────────┼──────────────────┼──────────────────────────────┤
/// │ 0x00..=0x7F │ PositiveFixInt   │ nothing                      │
/// │ 0x80..=0x8F │ FixMap(n)        │ n key/value pairs            │
/// │ 0x90..=0x9F │ FixArray(n)      │ n values                     │
/// │ 0xA0..=0xBF │ FixRaw(n)        │ n bytes                      │
/// │ 0xC0        │ Nil              │ nothing                      │
/// │ 0xC2 / 0xC3 │ False / True     │ nothing                      │
/// │ 0xCC..=0xCE │ Uint8/16/32      │ 1/2/4 bytes big-endian       │
/// │ 0xD0..=0xD2 │ Int8/16/32       │ 1/2/4 bytes two's complement │
/// │ 0xDA / 0xDB │ Raw16 / Raw32    │ u16/u32 length, then bytes   │
/// │ 0xDC / 0xDD │ Array16 / 32     │ u16/u32 count, then values   │
/// │ 0xDE / 0xDF │ Map16 / 32       │ u16/u32 count, then pairs    │
/// │ 0xE0..=0xFF │ NegativeFixInt   │ nothing                      │
/// └─────────────┴──────────────────┴──────────────────────────────┘
/// ```
///
/// Anything else (`0xC1`, floats, 64-bit integers, extension types) has
/// no variant and is rejected by [`Tag::from_byte`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tag {
    PositiveFixInt(u8),
    FixMap(u8),
    FixArray(u8),
    FixRaw(u8),
    Nil,
    False,
    True,
    Uint8,
    Uint16,
    Uint32,
    Int8,
    Int16,
    Int32,
    Raw16,
    Raw32,
    Array16,
    Array32,
    Map16,
    Map32,
    NegativeFixInt(i8),
}

impl Tag {
    /// Classify a tag byte. Returns `None` for unsupported bytes.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        let tag = match byte {
            0x00..=0x7F => Self::PositiveFixInt(byte),
            0x80..=0x8F => Self::FixMap(byte & 0x0F),
            0x90..=0x9F => Self::FixArray(byte & 0x0F),
            0xA0..=0xBF => Self::FixRaw(byte & 0x1F),
            marker::NIL => Self::Nil,
            marker::FALSE => Self::False,
            marker::TRUE => Self::True,
            marker::UINT8 => Self::Uint8,
            marker::UINT16 => Self::Uint16,
            marker::UINT32 => Self::Uint32,
            marker::INT8 => Self::Int8,
            marker::INT16 => Self::Int16,
            marker::INT32 => Self::Int32,
            marker::RAW16 => Self::Raw16,
            marker::RAW32 => Self::Raw32,
            marker::ARRAY16 => Self::Array16,
            marker::ARRAY32 => Self::Array32,
            marker::MAP16 => Self::Map16,
            marker::MAP32 => Self::Map32,
            // Two's complement: 0xFF is -1, 0xE0 is -32
            0xE0..=0xFF => Self::NegativeFixInt(i8::from_be_bytes([byte])),
            _ => return None,
        };
        Some(tag)
    }

    /// The wire byte for this tag.
    ///
    /// Length and value payloads of the single-byte families are masked
    /// to the bits the family has room for.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        match self {
            Self::PositiveFixInt(v) => v & marker::POSITIVE_FIXINT_MAX,
            Self::FixMap(n) => marker::FIXMAP | (n & 0x0F),
            Self::FixArray(n) => marker::FIXARRAY | (n & 0x0F),
            Self::FixRaw(n) => marker::FIXRAW | (n & 0x1F),
            Self::Nil => marker::NIL,
            Self::False => marker::FALSE,
            Self::True => marker::TRUE,
            Self::Uint8 => marker::UINT8,
            Self::Uint16 => marker::UINT16,
            Self::Uint32 => marker::UINT32,
            Self::Int8 => marker::INT8,
            Self::Int16 => marker::INT16,
            Self::Int32 => marker::INT32,
            Self::Raw16 => marker::RAW16,
            Self::Raw32 => marker::RAW32,
            Self::Array16 => marker::ARRAY16,
            Self::Array32 => marker::ARRAY32,
            Self::Map16 => marker::MAP16,
            Self::Map32 => marker::MAP32,
            Self::NegativeFixInt(v) => marker::NEGATIVE_FIXINT | (v.to_be_bytes()[0] & 0x1F),
        }
    }
}

impl TryFrom<u8> for Tag {
    type Error = TypeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::from_byte(byte).ok_or(TypeError::UnsupportedTag { byte })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixint_ranges() {
        assert_eq!(Tag::from_byte(0x00), Some(Tag::PositiveFixInt(0)));
        assert_eq!(Tag::from_byte(0x7F), Some(Tag::PositiveFixInt(127)));
        assert_eq!(Tag::from_byte(0xFF), Some(Tag::NegativeFixInt(-1)));
        assert_eq!(Tag::from_byte(0xE0), Some(Tag::NegativeFixInt(-32)));
        assert_eq!(Tag::from_byte(0xEB), Some(Tag::NegativeFixInt(-21)));
    }

    #[test]
    fn fix_container_lengths() {
        assert_eq!(Tag::from_byte(0x93), Some(Tag::FixArray(3)));
        assert_eq!(Tag::from_byte(0x8F), Some(Tag::FixMap(15)));
        assert_eq!(Tag::from_byte(0xBF), Some(Tag::FixRaw(31)));
        assert_eq!(Tag::from_byte(0xA0), Some(Tag::FixRaw(0)));
    }

    #[test]
    fn unsupported_bytes() {
        for byte in [0xC1, 0xC4, 0xCA, 0xCB, 0xCF, 0xD3, 0xD4, 0xD9] {
            assert_eq!(Tag::from_byte(byte), None, "byte {byte:#04X}");
        }
        assert!(matches!(
            Tag::try_from(0xC1),
            Err(TypeError::UnsupportedTag { byte: 0xC1 })
        ));
    }

    #[test]
    fn every_supported_byte_maps_back_to_itself() {
        for byte in 0..=u8::MAX {
            if let Some(tag) = Tag::from_byte(byte) {
                assert_eq!(tag.to_byte(), byte, "tag {tag:?}");
            }
        }
    }
}
