/// Decoder limits.
///
/// ```text
/// ┌────────────────┬────────────┬──────────────────────────────────────┐
/// │ Field          │ Default    │ Purpose                              │
/// ├────────────────┼────────────┼──────────────────────────────────────┤
/// │ max_depth      │ None       │ Deepest container nesting accepted   │
/// │ prealloc_limit │ 1024       │ Most entries reserved per container  │
/// │                │            │ before any of them has arrived       │
/// └────────────────┴────────────┴──────────────────────────────────────┘
/// ```
///
/// Without `max_depth` nesting is bounded only by memory: the decoder
/// keeps its own stack and never recurses. `prealloc_limit` stops a
/// hostile `array32` header from reserving gigabytes up front; containers
/// still grow past it as their entries arrive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    pub max_depth: Option<usize>,
    pub prealloc_limit: usize,
}

/// Default per-container pre-allocation: 1024 entries.
pub const DEFAULT_PREALLOC_LIMIT: usize = 1024;

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            prealloc_limit: DEFAULT_PREALLOC_LIMIT,
        }
    }
}
