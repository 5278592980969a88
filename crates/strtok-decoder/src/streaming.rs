use std::collections::VecDeque;

use log::debug;
use strtok_tokenizer::{End, ReaderTransport, Status, Tokenizer, Transport, run};
use strtok_types::Value;
use tokio::io::AsyncRead;

use crate::config::DecoderConfig;
use crate::decoder::MsgpackDecoder;
use crate::error::DecodeError;

/// Asynchronous streaming decoder: yields top-level values one at a time
/// as their last byte arrives.
///
/// The transport is only polled when no complete value is queued, so a
/// slow consumer naturally slows reading down. Once the stream ends, an
/// error is reported, or the decoder hits a framing error, every later
/// call returns `None`.
///
/// # Example
///
/// ```rust,no_run
/// use strtok_decoder::StreamingDecoder;
/// use tokio::io::AsyncRead;
///
/// async fn print_values(reader: impl AsyncRead + Unpin) {
///     let mut stream = StreamingDecoder::from_reader(reader);
///     while let Some(value) = stream.next().await.transpose().unwrap() {
///         println!("{value}");
///     }
/// }
/// ```
pub struct StreamingDecoder<T> {
    transport: T,
    config: DecoderConfig,
    tokenizer: Option<Tokenizer<MsgpackDecoder<VecDeque<Value>>>>,
    state: StreamState,
}

/// ```text
///   Streaming → Draining → Finished
/// ```
///
/// `Draining` is entered when the transport ends or the decoder stops:
/// values already queued are still handed out before `Finished`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StreamState {
    Streaming,
    Draining,
    Finished,
}

impl<R: AsyncRead + Unpin> StreamingDecoder<ReaderTransport<R>> {
    /// Stream values from any async reader with the default read size.
    #[must_use]
    pub fn from_reader(reader: R) -> Self {
        Self::new(ReaderTransport::new(reader))
    }
}

impl<T: Transport> StreamingDecoder<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, DecoderConfig::default())
    }

    #[must_use]
    pub fn with_config(transport: T, config: DecoderConfig) -> Self {
        Self {
            transport,
            config,
            tokenizer: None,
            state: StreamState::Streaming,
        }
    }

    /// Read the next complete value.
    ///
    /// Returns `Some(Ok(value))` per value, `None` once the stream is
    /// exhausted, and `Some(Err(_))` once for the error that ended it:
    /// a framing error, an I/O error, or [`DecodeError::Truncated`] when
    /// the transport closed inside a value.
    pub async fn next(&mut self) -> Option<Result<Value, DecodeError>> {
        if self.state == StreamState::Finished {
            return None;
        }
        match self.pull().await {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.state = StreamState::Finished;
                None
            }
            Err(err) => {
                self.state = StreamState::Finished;
                Some(Err(err))
            }
        }
    }

    /// Give the transport back. Bytes already pulled from it but not yet
    /// decoded are lost.
    #[must_use]
    pub fn into_transport(self) -> T {
        self.transport
    }

    async fn pull(&mut self) -> Result<Option<Value>, DecodeError> {
        if self.tokenizer.is_none() {
            let decoder = MsgpackDecoder::with_config(VecDeque::new(), self.config.clone());
            self.tokenizer = Some(Tokenizer::new(decoder)?);
        }
        let Some(tokenizer) = self.tokenizer.as_mut() else {
            return Ok(None);
        };

        loop {
            let decoder = tokenizer.strategy_mut();
            if let Some(value) = decoder.sink_mut().pop_front() {
                return Ok(Some(value));
            }
            if let Some(err) = decoder.take_error() {
                return Err(err);
            }
            if self.state == StreamState::Draining {
                return Ok(None);
            }

            match tokenizer.status() {
                Status::Done => self.state = StreamState::Draining,
                Status::Deferred => {
                    let continuation = tokenizer.continuation().clone();
                    continuation.resolved().await;
                    tokenizer.pump()?;
                }
                Status::Reading(_) => match self.transport.next_chunk().await? {
                    Some(chunk) => {
                        tokenizer.feed(chunk)?;
                    }
                    None => {
                        let buffered = tokenizer.buffered();
                        if !tokenizer.strategy().is_idle() || buffered > 0 {
                            return Err(DecodeError::Truncated { buffered });
                        }
                        debug!("stream ended after {} values", tokenizer.strategy().delivered());
                        self.state = StreamState::Draining;
                    }
                },
            }
        }
    }
}

/// Decode every value `transport` delivers until it ends.
///
/// # Errors
///
/// - [`DecodeError::UnknownTag`] or [`DecodeError::DepthLimit`] from the
///   data.
/// - [`DecodeError::Truncated`] if the transport ends inside a value.
/// - [`DecodeError::Tokenizer`] for transport I/O failures.
pub async fn decode_stream<T: Transport>(transport: T) -> Result<Vec<Value>, DecodeError> {
    let outcome = run(transport, MsgpackDecoder::new(Vec::new())).await?;
    let mut decoder = outcome.strategy;
    if let Some(err) = decoder.take_error() {
        return Err(err);
    }
    if let End::EndOfStream { buffered } = outcome.end {
        if !decoder.is_idle() || buffered > 0 {
            return Err(DecodeError::Truncated { buffered });
        }
    }
    Ok(decoder.into_sink())
}
