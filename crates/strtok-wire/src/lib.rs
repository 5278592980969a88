#![warn(clippy::pedantic)]

pub mod chunks;
pub mod error;
pub mod primitive;

pub use chunks::ChunkQueue;
pub use error::WireError;
pub use primitive::{Next, Primitive, Token};
