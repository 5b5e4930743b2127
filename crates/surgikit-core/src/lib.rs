//! surgikit core - types and error handling shared by every crate

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
