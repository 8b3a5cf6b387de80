use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    serenity::Client,
    tracing::{error, info},
    trp_media::EditService,
};

use crate::{config::DiscordAccountConfig, handler::DiscordHandler};

/// Connect one bot account and run until the gateway connection ends.
pub async fn run_bot(
    account_id: String,
    config: DiscordAccountConfig,
    service: Arc<EditService>,
) -> anyhow::Result<()> {
    if !config.has_token() {
        anyhow::bail!("discord account '{account_id}' has no token configured");
    }

    let token = config.token.expose_secret().clone();
    let handler = DiscordHandler {
        account_id: account_id.clone(),
        config,
        service,
        client: reqwest::Client::new(),
    };

    let mut client = Client::builder(&token, DiscordHandler::intents())
        .event_handler(handler)
        .await?;

    info!(account_id, "starting discord gateway connection");
    if let Err(e) = client.start().await {
        error!(account_id, error = %e, "discord client stopped");
        return Err(e.into());
    }
    Ok(())
}
