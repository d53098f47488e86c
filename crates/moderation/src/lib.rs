//! Retention pruning and `/autodelete` command handling, independent of any
//! chat platform SDK.

pub mod commands;
pub mod dispatch;
pub mod error;
pub mod list_view;
pub mod pruner;
pub mod purge;
pub mod restart;
pub mod store;

#[cfg(test)]
mod test_support;

pub use {
    commands::{Command, Invocation, ManagedCommand, Reply},
    dispatch::{InboundEvent, Moderator, ModeratorConfig, Outcome},
    error::{Error, Result},
    list_view::{ListView, ListViews},
    pruner::{PruneReport, PrunerConfig, RetentionPruner},
    restart::RestartMarkers,
    store::{ConfigStore, PolicyUpdate, SharedStore},
};
