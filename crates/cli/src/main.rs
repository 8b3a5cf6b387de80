mod local;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context as _,
    clap::{Parser, Subcommand},
    tokio::task::JoinSet,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
    trp_config::TrpConfig,
    trp_discord::DiscordAccountConfig,
    trp_media::{EditRequest, EditService, MediaKind, catalog},
};

use crate::local::LocalContext;

#[derive(Parser)]
#[command(name = "trp", about = "TRP Tools: ffmpeg presets for files shared in chat")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching the standard locations.
    #[arg(long, global = true, env = "TRP_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect every configured bot account (default).
    Run,
    /// Apply one preset to a local file.
    Apply {
        kind: MediaKind,
        action: String,
        value: Option<String>,
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List actions, optionally for one kind.
    Actions { kind: Option<MediaKind> },
    /// Print the effective configuration with secrets masked.
    Config,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<TrpConfig> {
    let config = match &cli.config {
        Some(path) => trp_config::load_config(path)?,
        None => trp_config::discover_and_load(),
    };
    Ok(trp_config::apply_env_overrides(config))
}

async fn run(config: TrpConfig) -> anyhow::Result<()> {
    let service = Arc::new(
        EditService::from_config(&config.media).with_context(|| {
            format!(
                "cannot open scratch directory {}",
                config.media.scratch_dir.display()
            )
        })?,
    );

    let mut bots = JoinSet::new();
    for (account_id, raw) in config.channels.discord {
        let account: DiscordAccountConfig = match serde_json::from_value(raw) {
            Ok(account) => account,
            Err(e) => {
                warn!(account_id, error = %e, "invalid discord account config, skipping");
                continue;
            },
        };
        let service = Arc::clone(&service);
        bots.spawn(trp_discord::run_bot(account_id, account, service));
    }
    if bots.is_empty() {
        anyhow::bail!("no discord account configured under [channels.discord]");
    }

    loop {
        tokio::select! {
            joined = bots.join_next() => match joined {
                Some(Ok(Ok(()))) => {},
                Some(Ok(Err(e))) => error!(error = %e, "bot stopped"),
                Some(Err(e)) => error!(error = %e, "bot task panicked"),
                None => return Ok(()),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                bots.shutdown().await;
                return Ok(());
            },
        }
    }
}

async fn apply(
    config: TrpConfig,
    request: EditRequest,
    input: PathBuf,
    output: PathBuf,
) -> anyhow::Result<()> {
    let service = EditService::from_config(&config.media)?;
    let ctx = LocalContext::new(&input, output.clone())?;
    // The reason was already printed as the reply.
    service
        .handle(&ctx, &request)
        .await
        .map_err(|e| anyhow::anyhow!("edit failed ({})", e.category()))?;
    if let Some(note) = ctx.delivered_note() {
        eprintln!("{note}");
    }
    println!("{}", output.display());
    Ok(())
}

fn print_actions(kind: Option<MediaKind>) {
    for spec in catalog::all() {
        if kind.is_some_and(|k| k != spec.kind) {
            continue;
        }
        let aliases = if spec.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", spec.aliases.join(", "))
        };
        println!(
            "{:<6} {:<26} {}{aliases}",
            spec.kind.as_str(),
            spec.usage(),
            spec.summary
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "trp starting");

    match cli.command {
        None | Some(Commands::Run) => run(load_config(&cli)?).await,
        Some(Commands::Apply {
            kind,
            ref action,
            ref value,
            ref input,
            ref output,
        }) => {
            let request = EditRequest::new(kind, action.clone(), value.clone());
            apply(load_config(&cli)?, request, input.clone(), output.clone()).await
        },
        Some(Commands::Actions { kind }) => {
            print_actions(kind);
            Ok(())
        },
        Some(Commands::Config) => {
            let config = load_config(&cli)?;
            print!("{}", toml::to_string_pretty(&config.redacted())?);
            Ok(())
        },
    }
}
