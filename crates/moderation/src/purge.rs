//! Two-step confirmation for the destructive `purge` command.
//!
//! The first step snapshots the guild's policies and hands out a single-use
//! token; the second step presents the token together with the text the user
//! typed. Only the literal [`CONFIRMATION_TEXT`] performs the purge.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::Duration,
};

use {tokio::time::Instant, tracing::debug};

/// Text the user must type to confirm.
pub const CONFIRMATION_TEXT: &str = "Y";

/// Unanswered confirmations are forgotten after this long.
pub const CONFIRMATION_TTL: Duration = Duration::from_secs(15 * 60);

/// A purge waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPurge {
    pub guild_id: String,
    pub user_id: String,
    /// Channels whose policies existed when the purge was requested.
    pub channel_ids: Vec<String>,
    requested_at: Instant,
}

/// Outstanding purge tokens.
pub struct PurgeConfirmations {
    pending: Mutex<HashMap<String, PendingPurge>>,
    ttl: Duration,
}

impl Default for PurgeConfirmations {
    fn default() -> Self {
        Self::new(CONFIRMATION_TTL)
    }
}

impl PurgeConfirmations {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Record a pending purge and return its token.
    pub fn request(&self, guild_id: &str, user_id: &str, channel_ids: Vec<String>) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let now = Instant::now();
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|_, p| now.duration_since(p.requested_at) < self.ttl);
        pending.insert(token.clone(), PendingPurge {
            guild_id: guild_id.to_string(),
            user_id: user_id.to_string(),
            channel_ids,
            requested_at: now,
        });
        debug!(guild_id, user_id, "purge confirmation requested");
        token
    }

    /// Consume a token. Returns `None` for unknown, expired, or foreign
    /// tokens; a token presented by another user stays valid for its owner.
    pub fn take(&self, token: &str, user_id: &str) -> Option<PendingPurge> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if pending.get(token)?.user_id != user_id {
            return None;
        }
        let purge = pending.remove(token)?;
        (purge.requested_at.elapsed() < self.ttl).then_some(purge)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether the typed text confirms the purge. Case and surrounding
/// whitespace matter.
pub fn is_confirmed(text: &str) -> bool {
    text == CONFIRMATION_TEXT
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("Y", true)]
    #[case("y", false)]
    #[case("n", false)]
    #[case(" Y", false)]
    #[case("Yes", false)]
    #[case("", false)]
    fn only_literal_y_confirms(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_confirmed(text), expected);
    }

    #[test]
    fn tokens_are_single_use() {
        let purges = PurgeConfirmations::default();
        let token = purges.request("g", "u", vec!["1".into(), "2".into()]);

        let pending = purges.take(&token, "u").unwrap();
        assert_eq!(pending.guild_id, "g");
        assert_eq!(pending.channel_ids, vec!["1", "2"]);
        assert!(purges.take(&token, "u").is_none());
    }

    #[test]
    fn tokens_belong_to_the_requester() {
        let purges = PurgeConfirmations::default();
        let token = purges.request("g", "u", vec!["1".into()]);

        assert!(purges.take(&token, "intruder").is_none());
        assert!(purges.take(&token, "u").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_tokens_are_rejected() {
        let purges = PurgeConfirmations::new(Duration::from_secs(10));
        let token = purges.request("g", "u", vec!["1".into()]);

        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(purges.take(&token, "u").is_none());
        assert!(purges.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_requests_are_swept() {
        let purges = PurgeConfirmations::new(Duration::from_secs(10));
        purges.request("g", "u", vec![]);
        tokio::time::advance(Duration::from_secs(11)).await;
        purges.request("g", "u", vec![]);
        assert_eq!(purges.len(), 1);
    }
}
