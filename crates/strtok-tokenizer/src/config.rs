/// Settings for byte-stream transports.
///
/// ```text
/// ┌────────────┬─────────────────────────────────────────────────┐
/// │ Field      │ Purpose                                         │
/// ├────────────┼─────────────────────────────────────────────────┤
/// │ read_size  │ Upper bound on bytes pulled per read (one chunk) │
/// └────────────┴─────────────────────────────────────────────────┘
/// ```
///
/// The chunk size only affects how often the tokenizer wakes up; decoded
/// output is identical for any value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    pub read_size: usize,
}

/// Default read size: 8 KiB.
pub const DEFAULT_READ_SIZE: usize = 8 * 1024;

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            read_size: DEFAULT_READ_SIZE,
        }
    }
}
