use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use log::{debug, trace, warn};
use strtok_wire::{ChunkQueue, Next, Primitive, Token};
use tokio::sync::Notify;

use crate::error::TokenizerError;

/// A parsing strategy driven by the tokenizer.
///
/// The tokenizer calls [`next`](Strategy::next) once with `None` to learn
/// the first primitive, then once per primitive read from the wire, in
/// wire order. Each call returns what to do next: read another primitive,
/// defer the decision to a [`Continuation`], or stop.
pub trait Strategy {
    fn next(&mut self, token: Option<Token>, continuation: &Continuation) -> Next;
}

/// Strategy backed by a closure. Built with [`from_fn`].
pub struct FnStrategy<F>(F);

/// Wrap a closure as a [`Strategy`].
///
/// ```rust
/// use strtok_tokenizer::{Next, Primitive, Tokenizer, from_fn};
///
/// let mut seen = Vec::new();
/// let mut tok = Tokenizer::new(from_fn(|token, _| {
///     if let Some(token) = token {
///         seen.push(token);
///     }
///     Next::Read(Primitive::U8)
/// }))
/// .unwrap();
/// tok.feed(&b"\x01\x02"[..]).unwrap();
/// drop(tok);
/// assert_eq!(seen.len(), 2);
/// ```
pub fn from_fn<F>(f: F) -> FnStrategy<F>
where
    F: FnMut(Option<Token>, &Continuation) -> Next,
{
    FnStrategy(f)
}

impl<F> Strategy for FnStrategy<F>
where
    F: FnMut(Option<Token>, &Continuation) -> Next,
{
    fn next(&mut self, token: Option<Token>, continuation: &Continuation) -> Next {
        (self.0)(token, continuation)
    }
}

/// Where the tokenizer currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Waiting for enough bytes to read this primitive.
    Reading(Primitive),
    /// Waiting for a continuation to supply the next step.
    Deferred,
    /// Finished. No further input is processed.
    Done,
}

// Shared between the tokenizer and every clone of its continuation.
//
//   Pending(next) ── strategy call starts ──▶ Deciding
//   Deciding ── continuation fires early ──▶ Early(next)
//   Deciding / Early ── strategy returns ──▶ Pending(..)
//   Pending(Defer) ── continuation fires ──▶ Pending(next)
#[derive(Clone, Copy, Debug)]
enum Slot {
    Pending(Next),
    Deciding,
    Early(Next),
}

#[derive(Debug)]
struct Shared {
    slot: Mutex<Slot>,
    resumed: Notify,
}

/// One-shot handle that resumes a deferred tokenizer.
///
/// Handed to the strategy on every call. When the strategy returns
/// [`Next::Defer`], some other piece of code (a timer, another task, a
/// later callback) must eventually call [`resolve`](Self::resolve) with
/// the real next step. Clones share the same tokenizer, and the handle is
/// `Send + Sync` so it can be moved into spawned tasks.
///
/// Resolving while the tokenizer is not deferred is a programming error:
/// [`resolve`](Self::resolve) panics and [`try_resolve`](Self::try_resolve)
/// returns [`TokenizerError::ContractViolation`].
#[derive(Clone, Debug)]
pub struct Continuation {
    shared: Arc<Shared>,
}

impl Continuation {
    fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::Deciding),
                resumed: Notify::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.shared
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Supply the step a deferred tokenizer should take next.
    ///
    /// # Panics
    ///
    /// Panics if the tokenizer is not currently deferred, including a
    /// second resolution of the same deferral.
    pub fn resolve(&self, next: impl Into<Next>) {
        if let Err(e) = self.try_resolve(next) {
            panic!("{e}");
        }
    }

    /// Fallible form of [`resolve`](Self::resolve).
    ///
    /// # Errors
    ///
    /// [`TokenizerError::ContractViolation`] if the tokenizer is not
    /// waiting on a continuation.
    pub fn try_resolve(&self, next: impl Into<Next>) -> Result<(), TokenizerError> {
        let next = next.into();
        let mut slot = self.lock();
        match *slot {
            Slot::Pending(Next::Defer) => *slot = Slot::Pending(next),
            // The strategy has not returned yet; it must return Defer.
            Slot::Deciding => *slot = Slot::Early(next),
            Slot::Pending(pending) | Slot::Early(pending) => {
                return Err(TokenizerError::ContractViolation { pending });
            }
        }
        drop(slot);
        debug!("continuation resolved with {next:?}");
        self.shared.resumed.notify_one();
        Ok(())
    }

    /// Wait until a continuation has been resolved.
    ///
    /// May return spuriously; callers re-check [`Tokenizer::status`].
    pub async fn resolved(&self) {
        self.shared.resumed.notified().await;
    }

    fn current(&self) -> Next {
        match *self.lock() {
            Slot::Pending(next) => next,
            Slot::Deciding | Slot::Early(_) => Next::Defer,
        }
    }

    fn begin_decision(&self) {
        *self.lock() = Slot::Deciding;
    }

    fn settle(&self, decided: Next) {
        let mut slot = self.lock();
        let settled = match (*slot, decided) {
            (Slot::Early(resolved), Next::Defer) => resolved,
            (Slot::Early(resolved), decided) => panic!(
                "contract violation: continuation resolved with {resolved:?} \
                 but strategy returned {decided:?} instead of deferring"
            ),
            (_, decided) => decided,
        };
        *slot = Slot::Pending(settled);
    }

    fn finish(&self) {
        *self.lock() = Slot::Pending(Next::Done);
    }
}

/// Incremental tokenizer: buffers arriving chunks and hands the strategy
/// one primitive at a time.
///
/// The tokenizer performs no I/O. Each call to [`feed`](Self::feed) is one
/// chunk arrival; the tokenizer reads as many primitives as the buffered
/// bytes allow and then returns, remembering exactly where it stopped.
/// The async [`run`](crate::run) driver pairs it with a
/// [`Transport`](crate::Transport).
///
/// ```text
///   feed(chunk) ─▶ ChunkQueue ─▶ take(width) ─▶ decode ─▶ strategy
///                      ▲                                     │
///                      └──────────── Next::Read(p) ◀─────────┘
/// ```
///
/// Suspension happens only when too few bytes are buffered or when the
/// strategy defers. While deferred, fed chunks are buffered but not read.
pub struct Tokenizer<S> {
    strategy: S,
    queue: ChunkQueue,
    continuation: Continuation,
    consumed: u64,
}

impl<S: Strategy> Tokenizer<S> {
    /// Create a tokenizer and ask the strategy for its first primitive.
    ///
    /// # Errors
    ///
    /// [`TokenizerError::InvalidDescriptor`] if the first descriptor is
    /// unreadable.
    pub fn new(mut strategy: S) -> Result<Self, TokenizerError> {
        let continuation = Continuation::new();
        let first = strategy.next(None, &continuation);
        continuation.settle(first);
        debug!("tokenizer started, first step {first:?}");

        let tokenizer = Self {
            strategy,
            queue: ChunkQueue::new(),
            continuation,
            consumed: 0,
        };
        if let Next::Read(primitive) = tokenizer.continuation.current() {
            if !primitive.is_valid() {
                return Err(tokenizer.reject(primitive));
            }
        }
        Ok(tokenizer)
    }

    #[must_use]
    pub fn status(&self) -> Status {
        match self.continuation.current() {
            Next::Read(primitive) => Status::Reading(primitive),
            Next::Defer => Status::Deferred,
            Next::Done => Status::Done,
        }
    }

    /// The continuation shared with the strategy.
    #[must_use]
    pub fn continuation(&self) -> &Continuation {
        &self.continuation
    }

    /// Number of bytes buffered but not yet consumed.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.queue.len()
    }

    /// Number of bytes consumed by primitive reads so far.
    #[must_use]
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    #[must_use]
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    #[must_use]
    pub fn into_strategy(self) -> S {
        self.strategy
    }

    /// Buffer one chunk and read every primitive it completes.
    ///
    /// Once the tokenizer is done, chunks are discarded unread.
    ///
    /// # Errors
    ///
    /// [`TokenizerError::InvalidDescriptor`] if the strategy asks for an
    /// unreadable primitive. The tokenizer is done afterwards.
    pub fn feed(&mut self, chunk: impl Into<Bytes>) -> Result<Status, TokenizerError> {
        if self.status() == Status::Done {
            return Ok(Status::Done);
        }
        self.queue.push(chunk);
        self.pump()
    }

    /// Read every primitive the buffered bytes allow.
    ///
    /// Call after resolving a continuation outside the async driver so
    /// bytes buffered during the deferral are processed.
    ///
    /// # Errors
    ///
    /// Same as [`feed`](Self::feed).
    pub fn pump(&mut self) -> Result<Status, TokenizerError> {
        loop {
            let primitive = match self.continuation.current() {
                Next::Read(primitive) => primitive,
                Next::Defer => {
                    trace!("deferred with {} bytes buffered", self.queue.len());
                    return Ok(Status::Deferred);
                }
                Next::Done => {
                    debug!("tokenizer done after {} bytes", self.consumed);
                    return Ok(Status::Done);
                }
            };
            if !primitive.is_valid() {
                return Err(self.reject(primitive));
            }

            let width = primitive.width();
            if self.queue.len() < width {
                return Ok(Status::Reading(primitive));
            }

            let token = primitive.decode(self.queue.take(width));
            trace!("read {primitive} at offset {}", self.consumed);
            self.consumed += width as u64;

            self.continuation.begin_decision();
            let decided = self.strategy.next(Some(token), &self.continuation);
            self.continuation.settle(decided);
        }
    }

    fn reject(&self, primitive: Primitive) -> TokenizerError {
        warn!(
            "invalid descriptor {primitive} at offset {}; stopping",
            self.consumed
        );
        self.continuation.finish();
        TokenizerError::InvalidDescriptor {
            primitive,
            offset: self.consumed,
        }
    }
}
