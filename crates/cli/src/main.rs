use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::Context,
    autodelete_config::{BotSettings, JsonFileStore},
    autodelete_moderation::{
        ConfigStore, Moderator, ModeratorConfig, PrunerConfig,
        dispatch::MAX_CONCURRENT_PRUNES,
        pruner::{DEFAULT_DELETE_DELAY, DEFAULT_FETCH_SLACK},
        restart::strip_markers,
    },
    clap::Parser,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser, Debug)]
#[command(name = "autodelete", about = "AutoDelete: keeps Discord channels trimmed")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Discord bot token.
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Custom status shown under the bot's name.
    #[arg(long, env = "BOT_STATUS")]
    status: Option<String>,

    /// Path of the JSON configuration document.
    #[arg(long, env = "AUTODELETE_CONFIG")]
    config: Option<PathBuf>,

    /// Messages fetched beyond a channel's limit to make room for exempt ones.
    #[arg(long, default_value_t = DEFAULT_FETCH_SLACK)]
    fetch_slack: usize,

    /// Pause between two deletions, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_DELETE_DELAY.as_millis() as u64)]
    delete_delay_ms: u64,

    /// Pruning passes allowed to run concurrently.
    #[arg(long, default_value_t = MAX_CONCURRENT_PRUNES)]
    max_concurrent_prunes: usize,
}

impl Cli {
    fn moderator_config(&self) -> ModeratorConfig {
        ModeratorConfig {
            pruner: PrunerConfig {
                fetch_slack: self.fetch_slack,
                delete_delay: Duration::from_millis(self.delete_delay_ms),
            },
            max_concurrent_prunes: self.max_concurrent_prunes,
        }
    }
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Restart markers are not part of the public CLI.
    let process_args: Vec<String> = std::env::args().collect();
    let (args, restarted) = strip_markers(process_args.iter().cloned());
    let cli = Cli::parse_from(&args);

    init_telemetry(&cli);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        restarted = restarted.is_some(),
        "autodelete starting"
    );

    let settings = BotSettings::new(cli.token.clone(), cli.status.clone(), cli.config.clone())
        .context("cannot start without a bot token")?;
    info!(config = %settings.config_path.display(), "using configuration file");

    let persistence = Arc::new(JsonFileStore::new(settings.config_path.clone()));
    let store = ConfigStore::open(persistence).await;
    let moderator = Arc::new(Moderator::new(store, cli.moderator_config()));

    autodelete_discord::run(&settings, moderator, args, restarted).await?;
    info!("autodelete stopped");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, clap::CommandFactory, rstest::rstest};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn tunables_default_to_library_constants() {
        let cli = Cli::parse_from(["autodelete"]);
        let config = cli.moderator_config();
        assert_eq!(config.pruner.fetch_slack, DEFAULT_FETCH_SLACK);
        assert_eq!(config.pruner.delete_delay, DEFAULT_DELETE_DELAY);
        assert_eq!(config.max_concurrent_prunes, MAX_CONCURRENT_PRUNES);
    }

    #[rstest]
    #[case(&["autodelete", "--restarted", "--channel=1", "--message=2"])]
    #[case(&["autodelete", "--json-logs", "--restarted", "--channel=1", "--message=2"])]
    fn stripped_restart_args_parse(#[case] raw: &[&str]) {
        let (args, markers) = strip_markers(raw.iter().map(|s| s.to_string()));
        assert!(markers.is_some());
        assert!(Cli::try_parse_from(&args).is_ok());
    }
}
