use bytes::Bytes;
use strtok_types::{Tag, Value};
use strtok_wire::{Primitive, Token, WireError};

use crate::error::DecodeError;
use crate::stack::ContainerKind;

/// What the decoder is waiting for on the wire.
///
/// Each state knows the one primitive that satisfies it:
///
/// ```text
/// ┌──────────────────────────────┬──────────────┬───────────────────────────┐
/// │ State                        │ Reads        │ After the read            │
/// ├──────────────────────────────┼──────────────┼───────────────────────────┤
/// │ AwaitingTag                  │ u8           │ depends on the tag        │
/// │ Integer(p)                   │ p            │ integer value, next tag   │
/// │ RawLength(p)                 │ p            │ RawBody(n), or "" if n=0  │
/// │ RawBody(n)                   │ raw(n)       │ raw value, next tag       │
/// │ ContainerLength(kind, p)     │ p            │ container opens, next tag │
/// └──────────────────────────────┴──────────────┴───────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadState {
    AwaitingTag,
    /// Payload of a `uint8/16/32` or `int8/16/32` tag.
    Integer(Primitive),
    /// Length prefix of a `raw16/32` tag.
    RawLength(Primitive),
    /// The bytes of a raw string, length known and non-zero.
    RawBody(usize),
    /// Count prefix of an `array16/32` or `map16/32` tag.
    ContainerLength(ContainerKind, Primitive),
}

impl ReadState {
    /// The primitive to request from the tokenizer in this state.
    #[must_use]
    pub fn primitive(self) -> Primitive {
        match self {
            Self::AwaitingTag => Primitive::U8,
            Self::Integer(p) | Self::RawLength(p) | Self::ContainerLength(_, p) => p,
            Self::RawBody(len) => Primitive::Raw(len),
        }
    }
}

/// Something the accumulation stack has to act on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A complete non-container value.
    Scalar(Value),
    /// A container header declaring `len` entries (pairs, for maps).
    Open { kind: ContainerKind, len: u32 },
}

/// Outcome of one step: an optional event plus the state to move to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub event: Option<Event>,
    pub next: ReadState,
}

impl Transition {
    fn emit(event: Event) -> Self {
        Self {
            event: Some(event),
            next: ReadState::AwaitingTag,
        }
    }

    fn wait(next: ReadState) -> Self {
        Self { event: None, next }
    }

    fn scalar(value: Value) -> Self {
        Self::emit(Event::Scalar(value))
    }
}

/// Advance the decoder by one token.
///
/// Pure: no buffering, no stack, no I/O. `offset` is the wire position of
/// `token` and is only used to report an unknown tag.
///
/// # Errors
///
/// - [`DecodeError::UnknownTag`] for a tag byte outside the format.
/// - [`DecodeError::Wire`] if `token` is not the shape `state` asked for.
pub fn transition(state: ReadState, token: Token, offset: u64) -> Result<Transition, DecodeError> {
    let mismatch = |token: &Token| {
        DecodeError::Wire(WireError::TokenMismatch {
            expected: state.primitive(),
            found: token.kind(),
        })
    };

    match state {
        ReadState::AwaitingTag => match token {
            Token::U8(byte) => on_tag(byte, offset),
            other => Err(mismatch(&other)),
        },
        ReadState::Integer(_) => {
            let value = token.as_i64().ok_or_else(|| mismatch(&token))?;
            Ok(Transition::scalar(Value::Integer(value)))
        }
        ReadState::RawLength(_) => {
            let len = length(&token).ok_or_else(|| mismatch(&token))?;
            Ok(raw(len))
        }
        ReadState::RawBody(_) => match token {
            Token::Bytes(bytes) => Ok(Transition::scalar(Value::Raw(bytes))),
            other => Err(mismatch(&other)),
        },
        ReadState::ContainerLength(kind, _) => {
            let len = token.as_u32().ok_or_else(|| mismatch(&token))?;
            Ok(Transition::emit(Event::Open { kind, len }))
        }
    }
}

fn on_tag(byte: u8, offset: u64) -> Result<Transition, DecodeError> {
    let Some(tag) = Tag::from_byte(byte) else {
        return Err(DecodeError::UnknownTag { tag: byte, offset });
    };

    let step = match tag {
        Tag::PositiveFixInt(v) => Transition::scalar(Value::Integer(i64::from(v))),
        Tag::NegativeFixInt(v) => Transition::scalar(Value::Integer(i64::from(v))),
        Tag::Nil => Transition::scalar(Value::Nil),
        Tag::False => Transition::scalar(Value::Bool(false)),
        Tag::True => Transition::scalar(Value::Bool(true)),
        Tag::FixRaw(n) => raw(usize::from(n)),
        Tag::FixArray(n) => Transition::emit(Event::Open {
            kind: ContainerKind::Array,
            len: u32::from(n),
        }),
        Tag::FixMap(n) => Transition::emit(Event::Open {
            kind: ContainerKind::Map,
            len: u32::from(n),
        }),
        Tag::Uint8 => Transition::wait(ReadState::Integer(Primitive::U8)),
        Tag::Uint16 => Transition::wait(ReadState::Integer(Primitive::U16Be)),
        Tag::Uint32 => Transition::wait(ReadState::Integer(Primitive::U32Be)),
        Tag::Int8 => Transition::wait(ReadState::Integer(Primitive::I8)),
        Tag::Int16 => Transition::wait(ReadState::Integer(Primitive::I16Be)),
        Tag::Int32 => Transition::wait(ReadState::Integer(Primitive::I32Be)),
        Tag::Raw16 => Transition::wait(ReadState::RawLength(Primitive::U16Be)),
        Tag::Raw32 => Transition::wait(ReadState::RawLength(Primitive::U32Be)),
        Tag::Array16 => Transition::wait(ReadState::ContainerLength(
            ContainerKind::Array,
            Primitive::U16Be,
        )),
        Tag::Array32 => Transition::wait(ReadState::ContainerLength(
            ContainerKind::Array,
            Primitive::U32Be,
        )),
        Tag::Map16 => Transition::wait(ReadState::ContainerLength(
            ContainerKind::Map,
            Primitive::U16Be,
        )),
        Tag::Map32 => Transition::wait(ReadState::ContainerLength(
            ContainerKind::Map,
            Primitive::U32Be,
        )),
    };
    Ok(step)
}

// An empty raw string has no body to read.
fn raw(len: usize) -> Transition {
    if len == 0 {
        Transition::scalar(Value::Raw(Bytes::new()))
    } else {
        Transition::wait(ReadState::RawBody(len))
    }
}

fn length(token: &Token) -> Option<usize> {
    token.as_u32().and_then(|n| usize::try_from(n).ok())
}
