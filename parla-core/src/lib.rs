//! parla-core: shared error type and configuration loading for the parla crates

pub mod config;
pub mod error;

pub use error::{Error, Result};
