use std::collections::VecDeque;

use bytes::Bytes;
use log::{debug, trace, warn};
use strtok_tokenizer::{Continuation, Next, Strategy, Token, Tokenizer};
use strtok_types::Value;

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::stack::ValueStack;
use crate::state::{Event, ReadState, transition};

/// Receives each top-level value as soon as it is complete.
pub trait ValueSink {
    fn accept(&mut self, value: Value);
}

impl ValueSink for Vec<Value> {
    fn accept(&mut self, value: Value) {
        self.push(value);
    }
}

impl ValueSink for VecDeque<Value> {
    fn accept(&mut self, value: Value) {
        self.push_back(value);
    }
}

/// Sink backed by a closure.
pub struct FnSink<F>(pub F);

impl<F: FnMut(Value)> ValueSink for FnSink<F> {
    fn accept(&mut self, value: Value) {
        (self.0)(value);
    }
}

/// Tokenizer strategy that rebuilds [`Value`]s from the primitive stream.
///
/// Each token runs through the pure [`transition`] function; the events it
/// produces feed a [`ValueStack`], and every top-level value that completes
/// goes straight to the sink. The decoder asks for exactly one primitive at
/// a time and never defers.
///
/// ```text
///   Token ─▶ transition(state) ─▶ Event ─▶ ValueStack ─▶ sink.accept(value)
///                  │
///                  └──▶ next ReadState ─▶ Next::Read(primitive)
/// ```
///
/// # Errors
///
/// A framing error (unknown tag, depth limit) cannot be returned through
/// the tokenizer, so the decoder logs it, stores it, drops the in-flight
/// value, and returns [`Next::Done`]. Retrieve it with
/// [`take_error`](Self::take_error) once the tokenizer has stopped.
///
/// # Example
///
/// ```rust
/// use strtok_decoder::MsgpackDecoder;
/// use strtok_tokenizer::Tokenizer;
/// use strtok_types::Value;
///
/// let mut tok = Tokenizer::new(MsgpackDecoder::new(Vec::new())).unwrap();
/// tok.feed(&[0x93, 0x78, 0x0A][..]).unwrap();
/// tok.feed(&[0xCC, 0xEF][..]).unwrap();
///
/// let values = tok.into_strategy().into_sink();
/// assert_eq!(values, [Value::array([120, 10, 239].map(Value::from))]);
/// ```
pub struct MsgpackDecoder<S> {
    sink: S,
    config: DecoderConfig,
    state: ReadState,
    stack: ValueStack,
    /// Wire offset of the next unread byte.
    offset: u64,
    delivered: usize,
    error: Option<DecodeError>,
}

impl<S: ValueSink> MsgpackDecoder<S> {
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, DecoderConfig::default())
    }

    #[must_use]
    pub fn with_config(sink: S, config: DecoderConfig) -> Self {
        Self {
            sink,
            stack: ValueStack::new(config.prealloc_limit),
            config,
            state: ReadState::AwaitingTag,
            offset: 0,
            delivered: 0,
            error: None,
        }
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Number of top-level values delivered so far.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether the decoder sits between top-level values, with nothing
    /// partially read.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == ReadState::AwaitingTag && self.stack.is_empty()
    }

    #[must_use]
    pub fn error(&self) -> Option<&DecodeError> {
        self.error.as_ref()
    }

    /// Take the framing error that stopped the decoder, if any.
    pub fn take_error(&mut self) -> Option<DecodeError> {
        self.error.take()
    }

    fn step(&mut self, token: Token) -> Result<(), DecodeError> {
        let token_offset = self.offset;
        self.offset += self.state.primitive().width() as u64;

        let step = transition(self.state, token, token_offset)?;
        self.state = step.next;

        let completed = match step.event {
            None => None,
            Some(Event::Scalar(value)) => self.stack.push(value),
            Some(Event::Open { kind, len }) => {
                if let Some(limit) = self.config.max_depth {
                    if self.stack.depth() >= limit && kind.expected(len) > 0 {
                        return Err(DecodeError::DepthLimit {
                            limit,
                            offset: token_offset,
                        });
                    }
                }
                self.stack.open(kind, len)
            }
        };

        if let Some(value) = completed {
            trace!("value complete at offset {}: {}", self.offset, value.shape());
            self.delivered += 1;
            self.sink.accept(value);
        }
        Ok(())
    }
}

impl<S: ValueSink> Strategy for MsgpackDecoder<S> {
    fn next(&mut self, token: Option<Token>, _: &Continuation) -> Next {
        let Some(token) = token else {
            return Next::Read(self.state.primitive());
        };
        if self.error.is_some() {
            return Next::Done;
        }

        match self.step(token) {
            Ok(()) => Next::Read(self.state.primitive()),
            Err(err) => {
                warn!("{err}; stopping after {} values", self.delivered);
                self.stack.clear();
                self.state = ReadState::AwaitingTag;
                self.error = Some(err);
                Next::Done
            }
        }
    }
}

/// Decode every value in `bytes`.
///
/// # Errors
///
/// - [`DecodeError::UnknownTag`] for an unsupported tag byte.
/// - [`DecodeError::Truncated`] if `bytes` ends partway through a value.
pub fn decode_slice(bytes: &[u8]) -> Result<Vec<Value>, DecodeError> {
    decode_slice_with(bytes, DecoderConfig::default())
}

/// [`decode_slice`] with explicit limits.
///
/// # Errors
///
/// Same as [`decode_slice`], plus [`DecodeError::DepthLimit`].
pub fn decode_slice_with(bytes: &[u8], config: DecoderConfig) -> Result<Vec<Value>, DecodeError> {
    let mut tokenizer = Tokenizer::new(MsgpackDecoder::with_config(Vec::new(), config))?;
    tokenizer.feed(Bytes::copy_from_slice(bytes))?;
    let buffered = tokenizer.buffered();

    let mut decoder = tokenizer.into_strategy();
    if let Some(err) = decoder.take_error() {
        return Err(err);
    }
    if !decoder.is_idle() || buffered > 0 {
        return Err(DecodeError::Truncated { buffered });
    }
    debug!("decoded {} values from {} bytes", decoder.delivered(), bytes.len());
    Ok(decoder.into_sink())
}

#[cfg(test)]
mod tests {
    use strtok_tokenizer::Status;

    use super::*;

    fn one(bytes: &[u8]) -> Value {
        let mut values = decode_slice(bytes).unwrap();
        assert_eq!(values.len(), 1, "expected one value from {bytes:02x?}");
        values.remove(0)
    }

    fn int(v: i64) -> Value {
        Value::Integer(v)
    }

    // ── Scalars ─────────────────────────────────────────────────────────

    #[test]
    fn fixints() {
        assert_eq!(one(&[0x25]), int(37));
        assert_eq!(one(&[0x6F]), int(111));
        assert_eq!(one(&[0xFF]), int(-1));
        assert_eq!(one(&[0xE0]), int(-32));
        assert_eq!(one(&[0xEB]), int(-21));
    }

    #[test]
    fn nil_and_bools() {
        assert_eq!(one(&[0xC0]), Value::Nil);
        assert_eq!(one(&[0xC3]), Value::Bool(true));
        assert_eq!(one(&[0xC2]), Value::Bool(false));
    }

    #[test]
    fn unsigned_payloads() {
        assert_eq!(one(&[0xCC, 0xFF]), int(255));
        assert_eq!(one(&[0xCD, 0x01, 0x01]), int(257));
        assert_eq!(one(&[0xCE, 0x01, 0x01, 0x01, 0x01]), int(16_843_009));
        assert_eq!(one(&[0xCE, 0xFF, 0xFF, 0xFF, 0xFF]), int(4_294_967_295));
    }

    #[test]
    fn signed_payloads() {
        assert_eq!(one(&[0xD0, 0x80]), int(-128));
        assert_eq!(one(&[0xD0, 0x7F]), int(127));
        assert_eq!(one(&[0xD1, 0xFF, 0x7F]), int(-129));
        assert_eq!(one(&[0xD1, 0x80, 0x00]), int(-32_768));
        assert_eq!(one(&[0xD2, 0x00, 0x10, 0x00, 0xFF]), int(1_048_831));
        assert_eq!(one(&[0xD2, 0x80, 0x00, 0x00, 0x00]), int(-2_147_483_648));
        assert_eq!(one(&[0xD2, 0xFF, 0xFF, 0xFF, 0xFF]), int(-1));
    }

    #[test]
    fn raw_strings() {
        assert_eq!(one(b"\xA5peter"), Value::from("peter"));
        assert_eq!(one(b"\xDA\x00\x03abc"), Value::from("abc"));
        assert_eq!(one(b"\xDB\x00\x00\x00\x02hi"), Value::from("hi"));
    }

    #[test]
    fn zero_length_raws() {
        assert_eq!(one(&[0xA0]), Value::from(""));
        assert_eq!(one(&[0xDA, 0x00, 0x00]), Value::from(""));
        assert_eq!(one(&[0xDB, 0x00, 0x00, 0x00, 0x00]), Value::from(""));
    }

    // ── Containers ──────────────────────────────────────────────────────

    #[test]
    fn fixarray() {
        assert_eq!(
            one(&[0x93, 0x78, 0x0A, 0xCC, 0xEF]),
            Value::array([int(120), int(10), int(239)])
        );
    }

    #[test]
    fn array16_and_array32() {
        assert_eq!(
            one(&[0xDC, 0x00, 0x02, 0x01, 0xC0]),
            Value::array([int(1), Value::Nil])
        );
        assert_eq!(
            one(&[0xDD, 0x00, 0x00, 0x00, 0x01, 0xC3]),
            Value::array([Value::Bool(true)])
        );
    }

    #[test]
    fn maps() {
        assert_eq!(
            one(&[0x82, 0xA2, b'k', b'1', 0x01, 0xA2, b'k', b'2', 0x92, 0x01, 0x02]),
            Value::map([
                (Value::from("k1"), int(1)),
                (Value::from("k2"), Value::array([int(1), int(2)])),
            ])
        );
        assert_eq!(one(&[0xDE, 0x00, 0x01, 0x01, 0x02]), Value::map([(1, 2)]));
    }

    #[test]
    fn empty_containers() {
        assert_eq!(one(&[0x90]), Value::array([]));
        assert_eq!(one(&[0x80]), Value::map::<Value, Value>([]));
        assert_eq!(one(&[0xDC, 0x00, 0x00]), Value::array([]));
        assert_eq!(
            one(&[0x92, 0x90, 0x80]),
            Value::array([Value::array([]), Value::map::<Value, Value>([])])
        );
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let depth = 100_000;
        let mut bytes = vec![0x91; depth];
        bytes.push(0xC0);
        let value = one(&bytes);

        let mut cursor = &value;
        let mut seen = 0;
        while let Value::Array(items) = cursor {
            cursor = &items[0];
            seen += 1;
        }
        assert_eq!(seen, depth);
        assert_eq!(*cursor, Value::Nil);
    }

    #[test]
    fn deep_partial_value_is_discarded_on_unknown_tag() {
        // [[[...nil...]], <0xC1>: the deep first element is complete and
        // sits in the open outer array when the bad tag arrives
        let depth = 1_000_000;
        let mut bytes = vec![0x92];
        bytes.extend(std::iter::repeat_n(0x91, depth));
        bytes.extend([0xC0, 0xC1]);
        let offset = bytes.len() as u64 - 1;
        assert!(matches!(
            decode_slice(&bytes),
            Err(DecodeError::UnknownTag { tag: 0xC1, offset: o }) if o == offset
        ));
    }

    #[test]
    fn deep_open_containers_are_discarded_on_unknown_tag() {
        let mut bytes = vec![0x91; 1_000_000];
        bytes.push(0xC1);
        assert!(matches!(
            decode_slice(&bytes),
            Err(DecodeError::UnknownTag { tag: 0xC1, .. })
        ));
    }

    #[test]
    fn several_top_level_values() {
        let values = decode_slice(&[0x01, 0xC0, 0x91, 0x02, 0xA1, b'x']).unwrap();
        assert_eq!(
            values,
            [int(1), Value::Nil, Value::array([int(2)]), Value::from("x")]
        );
    }

    // ── Errors ──────────────────────────────────────────────────────────

    #[test]
    fn unknown_tag_stops_decoding() {
        let mut tok = Tokenizer::new(MsgpackDecoder::new(Vec::new())).unwrap();
        assert_eq!(tok.feed(&[0x01, 0xC1, 0x02, 0x03][..]).unwrap(), Status::Done);
        // Nothing after the bad tag is consumed
        assert_eq!(tok.consumed(), 2);
        assert_eq!(tok.buffered(), 2);
        assert_eq!(tok.feed(&[0x04][..]).unwrap(), Status::Done);

        let mut decoder = tok.into_strategy();
        assert!(matches!(
            decoder.take_error(),
            Some(DecodeError::UnknownTag { tag: 0xC1, offset: 1 })
        ));
        assert_eq!(decoder.into_sink(), [int(1)]);
    }

    #[test]
    fn unknown_tag_inside_container_discards_it() {
        let err = decode_slice(&[0x05, 0x93, 0x01, 0xC1]).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownTag { tag: 0xC1, offset: 3 }));

        let mut tok = Tokenizer::new(MsgpackDecoder::new(Vec::new())).unwrap();
        tok.feed(&[0x05, 0x93, 0x01, 0xC1][..]).unwrap();
        assert_eq!(tok.into_strategy().into_sink(), [int(5)]);
    }

    #[test]
    fn truncated_input() {
        assert!(matches!(
            decode_slice(&[0xCD, 0x01]),
            Err(DecodeError::Truncated { buffered: 1 })
        ));
        assert!(matches!(
            decode_slice(&[0x92, 0x01]),
            Err(DecodeError::Truncated { buffered: 0 })
        ));
        assert!(matches!(
            decode_slice(b"\xA5pet"),
            Err(DecodeError::Truncated { buffered: 3 })
        ));
    }

    #[test]
    fn depth_limit() {
        let config = DecoderConfig {
            max_depth: Some(2),
            ..DecoderConfig::default()
        };
        assert!(decode_slice_with(&[0x91, 0x91, 0x01], config.clone()).is_ok());
        // Empty containers never open a frame
        assert!(decode_slice_with(&[0x91, 0x91, 0x90], config.clone()).is_ok());
        assert!(matches!(
            decode_slice_with(&[0x91, 0x91, 0x91, 0x01], config),
            Err(DecodeError::DepthLimit { limit: 2, offset: 2 })
        ));
    }

    #[test]
    fn hostile_length_header_is_harmless() {
        // array32 claiming u32::MAX entries, followed by two
        let err = decode_slice(&[0xDD, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { buffered: 0 }));
    }

    // ── Sinks ───────────────────────────────────────────────────────────

    #[test]
    fn closure_sink_sees_values_in_order() {
        let mut seen = Vec::new();
        let mut tok = Tokenizer::new(MsgpackDecoder::new(FnSink(|v: Value| seen.push(v)))).unwrap();
        for b in [0x92, 0x01, 0x02, 0x03] {
            tok.feed(vec![b]).unwrap();
        }
        assert_eq!(tok.strategy().delivered(), 2);
        drop(tok);
        assert_eq!(seen, [Value::array([int(1), int(2)]), int(3)]);
    }

    #[test]
    fn idle_tracks_partial_values() {
        let mut tok = Tokenizer::new(MsgpackDecoder::new(VecDeque::new())).unwrap();
        assert!(tok.strategy().is_idle());
        tok.feed(&[0x91][..]).unwrap();
        assert!(!tok.strategy().is_idle());
        tok.feed(&[0xCD, 0x01][..]).unwrap();
        assert!(!tok.strategy().is_idle());
        tok.feed(&[0x00][..]).unwrap();
        assert!(tok.strategy().is_idle());
        assert_eq!(tok.strategy().offset(), 4);
        assert_eq!(
            tok.strategy().sink().front(),
            Some(&Value::array([int(256)]))
        );
    }
}
