/// Errors from constructing or classifying format values.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// The byte is not a tag this format understands: reserved (`0xC1`)
    /// or belonging to an unsupported family (floats, 64-bit integers,
    /// extension types, bin/str8).
    #[error("unsupported tag byte {byte:#04X}")]
    UnsupportedTag { byte: u8 },

    /// An integer outside `[-2^31, 2^32 - 1]`, the range the wire format
    /// can carry.
    #[error("integer {value} is outside the 32-bit wire range")]
    IntegerOutOfRange { value: i64 },
}
