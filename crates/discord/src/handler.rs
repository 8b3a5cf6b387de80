//! Discord event handler for serenity.

use std::{sync::Arc, time::Instant};

use {
    rand::Rng,
    serenity::{
        all::{
            ActivityData, Colour, Context, EventHandler, GatewayIntents, Message, OnlineStatus,
            Ready,
        },
        async_trait,
        builder::{CreateEmbed, CreateMessage},
    },
    tracing::{debug, info, warn},
    trp_channels::CommandContext,
    trp_media::EditService,
};

use crate::{
    commands::{Command, help_sections, parse, usage_text},
    config::DiscordAccountConfig,
    context::DiscordCommandContext,
};

/// Handler for Discord gateway events. Serenity runs each event on its own
/// task, so edits for different messages proceed concurrently.
pub struct DiscordHandler {
    pub account_id: String,
    pub config: DiscordAccountConfig,
    pub service: Arc<EditService>,
    pub client: reqwest::Client,
}

impl DiscordHandler {
    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }

    async fn dispatch(&self, ctx: &Context, cmd_ctx: &DiscordCommandContext, command: Command) {
        let prefix = &self.config.command_prefix;
        let reply = match command {
            Command::Edit(request) => {
                // Failures are replied to and logged inside the service.
                let _ = self.service.handle(cmd_ctx, &request).await;
                return;
            },
            Command::Usage(kind) => usage_text(prefix, kind),
            Command::Ping => {
                let start = Instant::now();
                match ctx.http.get_current_user().await {
                    Ok(_) => format!(
                        "**Pong!** Latency: {:.2} ms",
                        start.elapsed().as_secs_f64() * 1000.0
                    ),
                    Err(e) => format!("Ping failed: {e}"),
                }
            },
            Command::RandNum => {
                let number: u32 = rand::rng().random_range(1..=100);
                format!("**Number:** {number}")
            },
            Command::Help => {
                let embed = help_sections(prefix).into_iter().fold(
                    CreateEmbed::new()
                        .title("TRP Tools - Help")
                        .description("A list of commands for TRP Tools.")
                        .colour(Colour::BLUE),
                    |embed, (name, value)| embed.field(name, value, false),
                );
                let msg = cmd_ctx.message();
                if let Err(e) = msg
                    .channel_id
                    .send_message(&ctx.http, CreateMessage::new().embed(embed))
                    .await
                {
                    warn!(error = %e, "failed to send help embed");
                }
                return;
            },
        };

        if let Err(e) = cmd_ctx.reply_text(&reply).await {
            warn!(error = %e, "failed to send reply");
        }
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            account_id = %self.account_id,
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
        ctx.set_presence(
            Some(ActivityData::playing(self.config.status_text.clone())),
            OnlineStatus::DoNotDisturb,
        );
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Skip bot messages to prevent loops
        if msg.author.bot {
            return;
        }

        let Some(command) = parse(&self.config.command_prefix, &msg.content) else {
            return;
        };
        debug!(
            account_id = %self.account_id,
            channel_id = %msg.channel_id,
            user_id = %msg.author.id,
            ?command,
            "received command"
        );

        let cmd_ctx = DiscordCommandContext::new(ctx.http.clone(), self.client.clone(), msg);
        self.dispatch(&ctx, &cmd_ctx, command).await;
    }
}
