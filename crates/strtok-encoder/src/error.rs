use strtok_wire::WireError;

/// Errors that can occur while encoding a [`Value`](strtok_types::Value).
///
/// Range and length problems are found before anything is written, so a
/// failed `encode` leaves the sink untouched for those variants.
///
/// Error hierarchy:
///
/// ```text
///   EncodeError
///   ├── IntegerOutOfRange  ← integer outside [-2^31, 2^32 - 1]
///   ├── LengthOverflow     ← raw, array, or map longer than u32::MAX
///   ├── Wire(WireError)    ← from strtok-wire primitive writes
///   └── Io(std::io::Error) ← from the output sink
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("integer {value} does not fit in 32 bits")]
    IntegerOutOfRange { value: i64 },

    #[error("{kind} of length {len} exceeds the 32-bit length limit")]
    LengthOverflow { kind: &'static str, len: usize },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
