//! Discord adapter: gateway events in, prefix commands dispatched to the
//! media edit service, replies back into the originating channel.

pub mod bot;
pub mod commands;
pub mod config;
pub mod context;
pub mod download;
pub mod error;
pub mod handler;

pub use {
    bot::run_bot,
    config::DiscordAccountConfig,
    context::DiscordCommandContext,
    error::{Error, Result},
    handler::DiscordHandler,
};
