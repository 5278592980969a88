use strtok_wire::{Next, Primitive};

/// Errors surfaced by the tokenizer engine and its async driver.
///
/// ```text
///   TokenizerError
///   ├── InvalidDescriptor   ← strategy asked for an unreadable primitive
///   ├── ContractViolation   ← continuation resolved when nothing was deferred
///   └── Io(std::io::Error)  ← from the transport
/// ```
///
/// Framing problems inside the data itself (an unknown tag byte, say)
/// belong to the strategy: it reports them through its own state and
/// returns [`Next::Done`].
#[derive(Debug, thiserror::Error)]
pub enum TokenizerError {
    /// A strategy or continuation produced a descriptor that cannot be
    /// read. The tokenizer stops as if `Done` had been returned.
    #[error("invalid descriptor {primitive} requested at offset {offset}")]
    InvalidDescriptor { primitive: Primitive, offset: u64 },

    /// A continuation was resolved while the tokenizer was not waiting
    /// on one.
    #[error("contract violation: continuation resolved while {pending:?} was pending")]
    ContractViolation { pending: Next },

    /// I/O error from the transport.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
