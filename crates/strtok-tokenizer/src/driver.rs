use log::debug;

use crate::engine::{Status, Strategy, Tokenizer};
use crate::error::TokenizerError;
use crate::transport::Transport;

/// How a [`run`] finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum End {
    /// The strategy returned `Done`.
    Done,
    /// The transport ran dry first. `buffered` bytes were left unread,
    /// for example a truncated trailing value.
    EndOfStream { buffered: usize },
}

/// Result of a completed [`run`]: the strategy and the transport are
/// handed back so the caller can inspect state or keep reading.
pub struct Outcome<S, T> {
    pub strategy: S,
    pub transport: T,
    pub end: End,
}

/// Drive `strategy` with chunks pulled from `transport` until the strategy
/// is done or the transport ends.
///
/// ```text
///   ┌──────────────┐  next_chunk  ┌───────────┐  feed  ┌────────────┐
///   │  Transport   │ ───────────▶ │  run loop │ ─────▶ │ Tokenizer  │
///   └──────────────┘              └───────────┘        └────────────┘
///                                   │      ▲               │
///                          Deferred │      │ resolved()    │ Next::Defer
///                                   ▼      │               ▼
///                                 ┌────────────────────────────┐
///                                 │        Continuation        │
///                                 └────────────────────────────┘
/// ```
///
/// If the strategy's first step is `Done`, the transport is never polled.
/// While deferred, the loop reads nothing and waits for the continuation;
/// once resolved it processes whatever is already buffered before asking
/// the transport for more.
///
/// # Errors
///
/// - [`TokenizerError::InvalidDescriptor`] if the strategy asks for an
///   unreadable primitive.
/// - [`TokenizerError::Io`] if the transport fails.
pub async fn run<S, T>(mut transport: T, strategy: S) -> Result<Outcome<S, T>, TokenizerError>
where
    S: Strategy,
    T: Transport,
{
    let mut tokenizer = Tokenizer::new(strategy)?;

    let end = loop {
        match tokenizer.status() {
            Status::Done => break End::Done,
            Status::Deferred => {
                let continuation = tokenizer.continuation().clone();
                continuation.resolved().await;
                tokenizer.pump()?;
            }
            Status::Reading(_) => match transport.next_chunk().await? {
                Some(chunk) => {
                    tokenizer.feed(chunk)?;
                }
                None => {
                    let buffered = tokenizer.buffered();
                    debug!("transport ended with {buffered} bytes unread");
                    break End::EndOfStream { buffered };
                }
            },
        }
    };

    Ok(Outcome {
        strategy: tokenizer.into_strategy(),
        transport,
        end,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use bytes::Bytes;
    use strtok_wire::{Next, Primitive, Token};

    use super::*;
    use crate::engine::from_fn;

    fn chunks(parts: &[&'static [u8]]) -> VecDeque<Bytes> {
        parts.iter().map(|p| Bytes::from_static(p)).collect()
    }

    #[tokio::test]
    async fn initial_done_never_polls_transport() {
        let transport = chunks(&[b"\x01", b"\x02"]);
        let outcome = run(transport, from_fn(|_, _| Next::Done)).await.unwrap();
        assert_eq!(outcome.end, End::Done);
        assert_eq!(outcome.transport.len(), 2);
    }

    #[tokio::test]
    async fn done_releases_transport() {
        let transport = chunks(&[b"\x1a\x1a", b"\x1a", b"\x1a"]);
        let mut seen = 0;
        let outcome = run(
            transport,
            from_fn(|token, _| {
                if token.is_none() {
                    return Next::Read(Primitive::U8);
                }
                seen += 1;
                Next::Done
            }),
        )
        .await
        .unwrap();
        assert_eq!(outcome.end, End::Done);
        // Only the first chunk was pulled
        assert_eq!(outcome.transport.len(), 2);
        drop(outcome);
        assert_eq!(seen, 1);
    }

    #[tokio::test]
    async fn end_of_stream_reports_leftover() {
        let transport = chunks(&[b"\x00\x01\x00"]);
        let outcome = run(transport, from_fn(|_, _| Next::Read(Primitive::U16Be)))
            .await
            .unwrap();
        assert_eq!(outcome.end, End::EndOfStream { buffered: 1 });
    }

    #[tokio::test]
    async fn invalid_descriptor_surfaces_as_error() {
        let transport = chunks(&[b"\x01"]);
        let result = run(
            transport,
            from_fn(|token, _| match token {
                None => Next::Read(Primitive::U8),
                Some(_) => Next::Read(Primitive::Raw(0)),
            }),
        )
        .await;
        assert!(matches!(
            result,
            Err(TokenizerError::InvalidDescriptor { .. })
        ));
    }

    #[tokio::test]
    async fn deferred_resolution_from_spawned_task() {
        // Alternate UINT8 reads, each resolved later by a spawned task.
        let transport = chunks(&[b"\x1a\x1a\x1a", b"\x1a\x1a\x1a"]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);

        let outcome = run(
            transport,
            from_fn(move |token, cont| {
                let Some(token) = token else {
                    return Next::Read(Primitive::U8);
                };
                let mut seen = record.lock().unwrap();
                seen.push(token);
                let next = if seen.len() < 6 {
                    Next::Read(Primitive::U8)
                } else {
                    Next::Done
                };
                let cont = cont.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    cont.resolve(next);
                });
                Next::Defer
            }),
        )
        .await
        .unwrap();

        assert_eq!(outcome.end, End::Done);
        assert_eq!(*seen.lock().unwrap(), vec![Token::U8(0x1a); 6]);
    }
}
