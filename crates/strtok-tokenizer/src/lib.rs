#![warn(clippy::pedantic)]

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod transport;

pub use config::TransportConfig;
pub use driver::{End, Outcome, run};
pub use engine::{Continuation, FnStrategy, Status, Strategy, Tokenizer, from_fn};
pub use error::TokenizerError;
pub use strtok_wire::{Next, Primitive, Token};
pub use transport::{ReaderTransport, Transport};
