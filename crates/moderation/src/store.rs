//! Process-wide configuration state backed by a [`StorePersistence`].

use std::{collections::BTreeMap, sync::Arc};

use {
    autodelete_config::{RetentionPolicy, StoreDocument, StorePersistence},
    tokio::sync::RwLock,
    tracing::{info, warn},
};

use crate::Result;

/// Store shared between the dispatcher and every handler.
///
/// Guards are held for a single in-memory read or a single
/// mutate-and-persist, never across a platform request.
pub type SharedStore = Arc<RwLock<ConfigStore>>;

/// Partial update applied by the `edit` command. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyUpdate {
    pub limit: Option<u32>,
    pub keep_pinned: Option<bool>,
    pub keep_bot_embeds: Option<bool>,
    pub enabled: Option<bool>,
}

impl PolicyUpdate {
    pub fn apply(&self, policy: &mut RetentionPolicy) {
        if let Some(limit) = self.limit {
            policy.limit = limit;
        }
        if let Some(keep_pinned) = self.keep_pinned {
            policy.keep_pinned = keep_pinned;
        }
        if let Some(keep_bot_embeds) = self.keep_bot_embeds {
            policy.keep_bot_embeds = keep_bot_embeds;
        }
        if let Some(enabled) = self.enabled {
            policy.enabled = enabled;
        }
    }
}

/// Policies, management roles and deletion counters.
///
/// Every mutation overwrites the whole persisted document.
pub struct ConfigStore {
    document: StoreDocument,
    persistence: Arc<dyn StorePersistence>,
}

impl ConfigStore {
    /// Load the document, falling back to an empty store when it cannot be
    /// read.
    pub async fn open(persistence: Arc<dyn StorePersistence>) -> Self {
        let document = match persistence.load().await {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "failed to read config, starting empty");
                StoreDocument::default()
            },
        };
        info!(
            policies = document.policies.len(),
            guilds = document.management_roles.len(),
            "config loaded"
        );
        Self {
            document,
            persistence,
        }
    }

    pub fn document(&self) -> &StoreDocument {
        &self.document
    }

    pub fn policy(&self, channel_id: &str) -> Option<&RetentionPolicy> {
        self.document.policies.get(channel_id)
    }

    /// Policies owned by `guild_id`, ordered by channel id.
    pub fn guild_policies(&self, guild_id: &str) -> Vec<(&str, &RetentionPolicy)> {
        self.document
            .policies
            .iter()
            .filter(|(_, policy)| policy.guild_id == guild_id)
            .map(|(channel_id, policy)| (channel_id.as_str(), policy))
            .collect()
    }

    pub fn management_roles(&self, guild_id: &str) -> &[String] {
        self.document
            .management_roles
            .get(guild_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn deleted_count(&self, channel_id: &str) -> u64 {
        self.document
            .deleted_message_count
            .get(channel_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn deletion_counts(&self) -> &BTreeMap<String, u64> {
        &self.document.deleted_message_count
    }

    pub async fn set_management_roles(&mut self, guild_id: &str, roles: Vec<String>) -> Result<()> {
        let mut next = self.document.clone();
        next.management_roles.insert(guild_id.to_string(), roles);
        self.commit(next).await
    }

    /// Insert or overwrite the policy of `channel_id`.
    pub async fn upsert_policy(&mut self, channel_id: &str, policy: RetentionPolicy) -> Result<()> {
        let mut next = self.document.clone();
        next.policies.insert(channel_id.to_string(), policy);
        self.commit(next).await
    }

    /// Apply `update` to an existing policy. Returns `None` when the channel
    /// has no policy; nothing is persisted in that case.
    pub async fn update_policy(
        &mut self,
        channel_id: &str,
        update: &PolicyUpdate,
    ) -> Result<Option<RetentionPolicy>> {
        let mut next = self.document.clone();
        let Some(policy) = next.policies.get_mut(channel_id) else {
            return Ok(None);
        };
        update.apply(policy);
        let updated = policy.clone();
        self.commit(next).await?;
        Ok(Some(updated))
    }

    pub async fn remove_policy(&mut self, channel_id: &str) -> Result<Option<RetentionPolicy>> {
        if !self.document.policies.contains_key(channel_id) {
            return Ok(None);
        }
        let mut next = self.document.clone();
        let removed = next.policies.remove(channel_id);
        self.commit(next).await?;
        Ok(removed)
    }

    /// Remove the given channels' policies. Counters are kept.
    pub async fn remove_policies(&mut self, channel_ids: &[String]) -> Result<usize> {
        let mut next = self.document.clone();
        let removed = channel_ids
            .iter()
            .filter(|id| next.policies.remove(id.as_str()).is_some())
            .count();
        self.commit(next).await?;
        Ok(removed)
    }

    /// Set `enabled` on every policy of the guild. Returns the number of
    /// policies the guild has.
    pub async fn set_guild_enabled(&mut self, guild_id: &str, enabled: bool) -> Result<usize> {
        let mut next = self.document.clone();
        let mut affected = 0;
        for policy in next
            .policies
            .values_mut()
            .filter(|p| p.guild_id == guild_id)
        {
            policy.enabled = enabled;
            affected += 1;
        }
        self.commit(next).await?;
        Ok(affected)
    }

    /// Add `count` to the channel's deletion counter and persist. Returns
    /// the new total.
    pub async fn record_deletions(&mut self, channel_id: &str, count: u64) -> Result<u64> {
        let mut next = self.document.clone();
        let total = next
            .deleted_message_count
            .entry(channel_id.to_string())
            .or_insert(0);
        *total = total.saturating_add(count);
        let total = *total;
        self.commit(next).await?;
        Ok(total)
    }

    /// Persist `next` and make it the live document. On failure the live
    /// document is left untouched.
    async fn commit(&mut self, next: StoreDocument) -> Result<()> {
        self.persistence.save(&next).await?;
        self.document = next;
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, autodelete_config::InMemoryStore};

    async fn open_empty() -> (ConfigStore, Arc<InMemoryStore>) {
        let backend = Arc::new(InMemoryStore::new());
        let store = ConfigStore::open(backend.clone()).await;
        (store, backend)
    }

    #[tokio::test]
    async fn upsert_persists_whole_document() {
        let (mut store, backend) = open_empty().await;
        store
            .upsert_policy("10", RetentionPolicy::new("1", 5))
            .await
            .unwrap();
        store
            .set_management_roles("1", vec!["7".into()])
            .await
            .unwrap();

        let saved = backend.snapshot();
        assert_eq!(saved.policies["10"].limit, 5);
        assert_eq!(saved.management_roles["1"], vec!["7"]);
        assert_eq!(backend.save_count(), 2);
    }

    #[tokio::test]
    async fn update_missing_policy_is_none_and_not_saved() {
        let (mut store, backend) = open_empty().await;
        let result = store
            .update_policy("404", &PolicyUpdate::default())
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(backend.save_count(), 0);
    }

    #[tokio::test]
    async fn partial_update_keeps_unspecified_fields() {
        let (mut store, _) = open_empty().await;
        store
            .upsert_policy("10", RetentionPolicy {
                keep_pinned: true,
                ..RetentionPolicy::new("1", 5)
            })
            .await
            .unwrap();

        let updated = store
            .update_policy("10", &PolicyUpdate {
                limit: Some(20),
                enabled: Some(false),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.limit, 20);
        assert!(!updated.enabled);
        assert!(updated.keep_pinned);
        assert!(!updated.keep_bot_embeds);
    }

    #[tokio::test]
    async fn guild_toggle_only_touches_that_guild() {
        let (mut store, _) = open_empty().await;
        store
            .upsert_policy("10", RetentionPolicy::new("1", 5))
            .await
            .unwrap();
        store
            .upsert_policy("11", RetentionPolicy::new("1", 5))
            .await
            .unwrap();
        store
            .upsert_policy("20", RetentionPolicy::new("2", 5))
            .await
            .unwrap();

        assert_eq!(store.set_guild_enabled("1", false).await.unwrap(), 2);
        assert!(!store.policy("10").unwrap().enabled);
        assert!(!store.policy("11").unwrap().enabled);
        assert!(store.policy("20").unwrap().enabled);
    }

    #[tokio::test]
    async fn counters_accumulate_and_survive_reload() {
        let (mut store, backend) = open_empty().await;
        assert_eq!(store.record_deletions("10", 3).await.unwrap(), 3);
        assert_eq!(store.record_deletions("10", 4).await.unwrap(), 7);

        let reloaded = ConfigStore::open(backend).await;
        assert_eq!(reloaded.deleted_count("10"), 7);
        assert_eq!(reloaded.deleted_count("11"), 0);
    }

    #[tokio::test]
    async fn removing_policy_keeps_counter() {
        let (mut store, _) = open_empty().await;
        store
            .upsert_policy("10", RetentionPolicy::new("1", 5))
            .await
            .unwrap();
        store.record_deletions("10", 2).await.unwrap();

        assert!(store.remove_policy("10").await.unwrap().is_some());
        assert!(store.remove_policy("10").await.unwrap().is_none());
        assert_eq!(store.deleted_count("10"), 2);
    }

    #[tokio::test]
    async fn save_failure_is_reported() {
        let (mut store, backend) = open_empty().await;
        backend.set_fail_saves(true);
        assert!(
            store
                .upsert_policy("10", RetentionPolicy::new("1", 5))
                .await
                .is_err()
        );
        assert!(store.policy("10").is_none());
    }

    #[tokio::test]
    async fn failed_saves_leave_live_state_unchanged() {
        let (mut store, backend) = open_empty().await;
        store
            .upsert_policy("10", RetentionPolicy::new("1", 5))
            .await
            .unwrap();
        store
            .set_management_roles("1", vec!["7".into()])
            .await
            .unwrap();
        store.record_deletions("10", 2).await.unwrap();
        let before = store.document().clone();

        backend.set_fail_saves(true);
        assert!(store.upsert_policy("11", RetentionPolicy::new("1", 0)).await.is_err());
        assert!(
            store
                .update_policy("10", &PolicyUpdate {
                    limit: Some(0),
                    ..Default::default()
                })
                .await
                .is_err()
        );
        assert!(store.remove_policy("10").await.is_err());
        assert!(store.remove_policies(&["10".into()]).await.is_err());
        assert!(store.set_guild_enabled("1", false).await.is_err());
        assert!(store.set_management_roles("1", vec![]).await.is_err());
        assert!(store.record_deletions("10", 5).await.is_err());

        assert_eq!(store.document(), &before);
        assert_eq!(backend.snapshot(), before);
    }

    #[tokio::test]
    async fn guild_policies_are_filtered_and_ordered() {
        let (mut store, _) = open_empty().await;
        for (channel, guild) in [("30", "1"), ("10", "1"), ("20", "2")] {
            store
                .upsert_policy(channel, RetentionPolicy::new(guild, 1))
                .await
                .unwrap();
        }
        let ids: Vec<&str> = store
            .guild_policies("1")
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["10", "30"]);
        assert!(store.management_roles("1").is_empty());
    }
}
