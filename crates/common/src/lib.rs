//! Shared error plumbing used across the trp crates.

pub mod error;

pub use error::FromMessage;
