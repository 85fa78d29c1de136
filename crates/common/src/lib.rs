//! Shared error definitions and small helpers used across the ctxswitch crates.

pub mod error;

pub use error::{Error, FromMessage, Result};
