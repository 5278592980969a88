#![warn(clippy::pedantic)]

pub mod error;
pub mod tag;
pub mod value;

pub use error::TypeError;
pub use tag::{Tag, marker};
pub use value::Value;
