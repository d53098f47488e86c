//! Client construction and the gateway run loop.

use std::sync::Arc;

use {
    autodelete_config::BotSettings,
    autodelete_moderation::{Moderator, RestartMarkers},
    serenity::all::{ActivityData, Client},
    tracing::{info, warn},
};

use crate::{Result, handler::AutoDeleteHandler, restart::Restarter};

/// Connect to Discord and serve events until the gateway shuts down, by
/// Ctrl-C or by a restart.
///
/// `args` are the process arguments used to spawn a replacement on
/// restart; `restarted` carries the markers this process was started with.
pub async fn run(
    settings: &BotSettings,
    moderator: Arc<Moderator>,
    args: Vec<String>,
    restarted: Option<RestartMarkers>,
) -> Result<()> {
    let restarter = Arc::new(Restarter::new(args));
    let handler = AutoDeleteHandler::new(Arc::clone(&moderator), Arc::clone(&restarter), restarted);

    let mut client = Client::builder(settings.token(), AutoDeleteHandler::intents())
        .event_handler(handler)
        .activity(ActivityData::custom(settings.status.clone()))
        .await?;
    restarter.attach(Arc::clone(&client.shard_manager));

    let signal_restarter = Arc::clone(&restarter);
    let signal_moderator = Arc::clone(&moderator);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                signal_moderator.shutdown();
                signal_restarter.shutdown().await;
            },
            Err(e) => warn!(error = %e, "failed to listen for shutdown signal"),
        }
    });

    info!(status = %settings.status, "connecting to discord");
    client.start().await?;
    moderator.shutdown();
    info!("discord client stopped");
    Ok(())
}
