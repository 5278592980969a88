#![warn(clippy::pedantic)]

pub mod config;
pub mod decoder;
pub mod error;
pub mod stack;
pub mod state;
pub mod streaming;

pub use config::DecoderConfig;
pub use decoder::{FnSink, MsgpackDecoder, ValueSink, decode_slice, decode_slice_with};
pub use error::DecodeError;
pub use stack::{ContainerKind, ValueStack};
pub use state::{Event, ReadState, Transition, transition};
pub use streaming::{StreamingDecoder, decode_stream};
