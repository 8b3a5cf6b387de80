//! Chat platform seam.
//!
//! The media core never talks to a chat platform directly. Each platform
//! adapter (Discord, the local CLI runner) implements [`CommandContext`] for
//! one inbound command and the core drives the whole edit through it.

pub mod error;
pub mod plugin;

pub use {
    error::{Error, Result},
    plugin::{ChannelMessage, CommandContext, MediaRef, TypingGuard},
};
