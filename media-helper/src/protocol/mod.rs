//! Protocol module - request and response types

mod commands;
mod response;

pub use commands::*;
pub use response::{encode, encode_result, Response};
