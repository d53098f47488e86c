//! Self-restart: spawn a replacement process, then close the gateway.

use std::{
    path::PathBuf,
    sync::{Arc, OnceLock},
};

use {
    autodelete_moderation::{
        Moderator,
        restart::{RestartMarkers, restart_args},
    },
    serenity::gateway::ShardManager,
    tracing::{info, warn},
};

use crate::Result;

pub struct Restarter {
    args: Vec<String>,
    /// Binary to start; the running executable when unset.
    program: Option<PathBuf>,
    shards: OnceLock<Arc<ShardManager>>,
}

impl Restarter {
    /// `args` are the current process arguments, program path first.
    pub fn new(args: Vec<String>) -> Self {
        Self {
            args,
            program: None,
            shards: OnceLock::new(),
        }
    }

    pub fn with_program(args: Vec<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
            ..Self::new(args)
        }
    }

    /// Attach the client's shard manager once the client is built.
    pub fn attach(&self, shards: Arc<ShardManager>) {
        if self.shards.set(shards).is_err() {
            warn!("shard manager already attached");
        }
    }

    pub fn replacement_args(&self, markers: &RestartMarkers) -> Vec<String> {
        restart_args(&self.args, markers)
    }

    /// Start the replacement process, then stop `moderator` and shut every
    /// shard down, which ends `Client::start` in this process.
    ///
    /// Nothing is stopped when the replacement cannot be started.
    pub async fn restart(&self, markers: &RestartMarkers, moderator: &Moderator) -> Result<()> {
        let args = self.replacement_args(markers);
        let program = match &self.program {
            Some(program) => program.clone(),
            None => std::env::current_exe()?,
        };
        let child = tokio::process::Command::new(&program)
            .args(args.iter().skip(1))
            .spawn()?;
        info!(
            program = %program.display(),
            pid = ?child.id(),
            channel_id = %markers.channel_id,
            "spawned replacement process"
        );
        moderator.shutdown();
        self.shutdown().await;
        Ok(())
    }

    pub async fn shutdown(&self) {
        match self.shards.get() {
            Some(shards) => shards.shutdown_all().await,
            None => warn!("no shard manager attached, nothing to shut down"),
        }
    }
}
