#![warn(clippy::pedantic)]

pub mod encoder;
pub mod error;

pub use encoder::{MsgpackEncoder, encode, encoded_len, to_vec};
pub use error::EncodeError;
