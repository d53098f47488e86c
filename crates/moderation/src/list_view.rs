//! Paginated `list` output with reaction page-turn controls.
//!
//! A [`ListView`] is an explicit state machine. Views with more than one page
//! start in [`ViewState::AwaitingInput`] and stay there while the invoking
//! user keeps turning pages; [`ListViews::watch_idle`] moves them to
//! [`ViewState::TimedOut`] after a period without page turns, or to
//! [`ViewState::Completed`] when their cancellation token fires.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    autodelete_channels::{
        Embed, EmbedColor,
        embed::{channel_mention, yes_no},
    },
    autodelete_config::RetentionPolicy,
    tokio::sync::Notify,
    tokio_util::sync::CancellationToken,
    tracing::debug,
};

pub const PAGE_SIZE: usize = 5;

/// Page-turn controls are removed after this long without input.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

pub const PREVIOUS_EMOJI: &str = "◀️";
pub const NEXT_EMOJI: &str = "▶️";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    AwaitingInput,
    TimedOut,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTurn {
    Previous,
    Next,
}

impl PageTurn {
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        match emoji {
            PREVIOUS_EMOJI => Some(Self::Previous),
            NEXT_EMOJI => Some(Self::Next),
            _ => None,
        }
    }
}

/// Result of feeding a page turn to a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnResult {
    /// Not the invoking user, or the view no longer accepts input.
    Ignored,
    /// Accepted; `changed` is false when already at the first/last page.
    Accepted { changed: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub channel_id: String,
    pub policy: RetentionPolicy,
}

/// One guild's policies, split into pages.
#[derive(Debug)]
pub struct ListView {
    owner_id: String,
    entries: Vec<ListEntry>,
    page: usize,
    state: ViewState,
    cancel: CancellationToken,
}

impl ListView {
    pub fn new(owner_id: impl Into<String>, entries: Vec<ListEntry>) -> Self {
        let mut view = Self {
            owner_id: owner_id.into(),
            entries,
            page: 0,
            state: ViewState::AwaitingInput,
            cancel: CancellationToken::new(),
        };
        if !view.has_controls() {
            view.state = ViewState::Completed;
        }
        view
    }

    pub fn page_count(&self) -> usize {
        self.entries.len().div_ceil(PAGE_SIZE).max(1)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Only multi-page views get page-turn reactions.
    pub fn has_controls(&self) -> bool {
        self.page_count() > 1
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn turn(&mut self, user_id: &str, turn: PageTurn) -> TurnResult {
        if self.state != ViewState::AwaitingInput || user_id != self.owner_id {
            return TurnResult::Ignored;
        }
        let before = self.page;
        match turn {
            PageTurn::Previous => self.page = self.page.saturating_sub(1),
            PageTurn::Next => self.page = (self.page + 1).min(self.page_count() - 1),
        }
        TurnResult::Accepted {
            changed: self.page != before,
        }
    }

    pub fn time_out(&mut self) {
        if self.state == ViewState::AwaitingInput {
            self.state = ViewState::TimedOut;
        }
    }

    pub fn complete(&mut self) {
        self.state = ViewState::Completed;
        self.cancel.cancel();
    }

    /// Embed for the current page.
    pub fn render(&self) -> Embed {
        let start = self.page * PAGE_SIZE;
        let mut embed = Embed::new(
            format!("Tasks (Page {}/{})", self.page + 1, self.page_count()),
            "Use `/autodelete` to `add`, `remove`, or `edit` a task.\n\n",
            EmbedColor::Green,
        );
        for (offset, entry) in self.entries.iter().skip(start).take(PAGE_SIZE).enumerate() {
            embed = embed.field(
                format!(
                    "{} - {}",
                    start + offset + 1,
                    channel_mention(&entry.channel_id)
                ),
                policy_summary(&entry.policy),
                false,
            );
        }
        embed
    }
}

/// Multi-line summary used by `list`, `add` and `edit` responses.
pub fn policy_summary(policy: &RetentionPolicy) -> String {
    format!(
        "Enabled: `{}`\nMessage Limit: `{}`\nKeep Pins: `{}`\nKeep Bot Embeds: `{}`",
        yes_no(policy.enabled),
        policy.limit,
        yes_no(policy.keep_pinned),
        yes_no(policy.keep_bot_embeds),
    )
}

struct ViewSlot {
    view: ListView,
    activity: Arc<Notify>,
}

/// Live views keyed by the id of the message showing them.
///
/// The map lock is a `std::sync::Mutex`: it is never held across `.await`.
#[derive(Default)]
pub struct ListViews {
    slots: Mutex<HashMap<String, ViewSlot>>,
}

impl ListViews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `view` under `message_id`. Single-page views are not tracked.
    /// Returns whether the view was registered.
    pub fn register(&self, message_id: impl Into<String>, view: ListView) -> bool {
        if view.state() != ViewState::AwaitingInput {
            return false;
        }
        self.lock().insert(message_id.into(), ViewSlot {
            view,
            activity: Arc::new(Notify::new()),
        });
        true
    }

    /// Apply a reaction. Returns `None` when no live view matches or the
    /// reaction is not an accepted page turn; otherwise the embed to show
    /// when the page changed.
    pub fn turn(&self, message_id: &str, user_id: &str, emoji: &str) -> Option<Option<Embed>> {
        let turn = PageTurn::from_emoji(emoji)?;
        let mut slots = self.lock();
        let slot = slots.get_mut(message_id)?;
        match slot.view.turn(user_id, turn) {
            TurnResult::Ignored => None,
            TurnResult::Accepted { changed } => {
                slot.activity.notify_one();
                debug!(message_id, page = slot.view.page(), "list page turned");
                Some(changed.then(|| slot.view.render()))
            },
        }
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.lock().contains_key(message_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until the view idles for `idle` or is cancelled, then drop it.
    ///
    /// Every accepted page turn restarts the idle period. Returns the final
    /// state; [`ViewState::Completed`] also covers an unknown `message_id`.
    pub async fn watch_idle(&self, message_id: &str, idle: Duration) -> ViewState {
        let Some((activity, cancel)) = self
            .lock()
            .get(message_id)
            .map(|slot| (Arc::clone(&slot.activity), slot.view.cancel_token()))
        else {
            return ViewState::Completed;
        };

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.finish(message_id, ListView::complete);
                    return ViewState::Completed;
                },
                _ = activity.notified() => continue,
                _ = tokio::time::sleep(idle) => {
                    self.finish(message_id, ListView::time_out);
                    debug!(message_id, "list view timed out");
                    return ViewState::TimedOut;
                },
            }
        }
    }

    /// Complete every live view, releasing their idle watchers.
    pub fn cancel_all(&self) {
        for slot in self.lock().values_mut() {
            slot.view.complete();
        }
    }

    fn finish(&self, message_id: &str, transition: fn(&mut ListView)) {
        if let Some(mut slot) = self.lock().remove(message_id) {
            transition(&mut slot.view);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ViewSlot>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<ListEntry> {
        (0..n)
            .map(|i| ListEntry {
                channel_id: format!("{}", 100 + i),
                policy: RetentionPolicy::new("g", i as u32),
            })
            .collect()
    }

    #[test]
    fn pages_of_five() {
        assert_eq!(ListView::new("u", entries(0)).page_count(), 1);
        assert_eq!(ListView::new("u", entries(5)).page_count(), 1);
        assert_eq!(ListView::new("u", entries(6)).page_count(), 2);
        assert_eq!(ListView::new("u", entries(12)).page_count(), 3);
    }

    #[test]
    fn single_page_has_no_controls() {
        let view = ListView::new("u", entries(3));
        assert!(!view.has_controls());
        assert_eq!(view.state(), ViewState::Completed);
        assert!(!ListViews::new().register("m", view));
    }

    #[test]
    fn turns_clamp_at_both_ends() {
        let mut view = ListView::new("u", entries(12));
        assert_eq!(view.turn("u", PageTurn::Previous), TurnResult::Accepted {
            changed: false
        });
        assert_eq!(view.turn("u", PageTurn::Next), TurnResult::Accepted { changed: true });
        assert_eq!(view.turn("u", PageTurn::Next), TurnResult::Accepted { changed: true });
        assert_eq!(view.turn("u", PageTurn::Next), TurnResult::Accepted {
            changed: false
        });
        assert_eq!(view.page(), 2);
    }

    #[test]
    fn other_users_cannot_turn_pages() {
        let mut view = ListView::new("owner", entries(12));
        assert_eq!(view.turn("someone", PageTurn::Next), TurnResult::Ignored);
        assert_eq!(view.page(), 0);
    }

    #[test]
    fn timed_out_view_ignores_input() {
        let mut view = ListView::new("u", entries(12));
        view.time_out();
        assert_eq!(view.state(), ViewState::TimedOut);
        assert_eq!(view.turn("u", PageTurn::Next), TurnResult::Ignored);
    }

    #[test]
    fn render_numbers_entries_across_pages() {
        let mut view = ListView::new("u", entries(7));
        view.turn("u", PageTurn::Next);
        let embed = view.render();
        assert_eq!(embed.title, "Tasks (Page 2/2)");
        assert_eq!(embed.fields.len(), 2);
        assert_eq!(embed.fields[0].name, "6 - <#105>");
        assert!(embed.fields[1].value.contains("Message Limit: `6`"));
    }

    #[test]
    fn registry_turn_renders_only_on_change() {
        let views = ListViews::new();
        assert!(views.register("m", ListView::new("u", entries(6))));

        let changed = views.turn("m", "u", NEXT_EMOJI).unwrap();
        assert_eq!(changed.unwrap().title, "Tasks (Page 2/2)");
        assert_eq!(views.turn("m", "u", NEXT_EMOJI), Some(None));
        assert_eq!(views.turn("m", "u", "👍"), None);
        assert_eq!(views.turn("m", "other", PREVIOUS_EMOJI), None);
        assert_eq!(views.turn("unknown", "u", NEXT_EMOJI), None);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_view_times_out() {
        let views = ListViews::new();
        views.register("m", ListView::new("u", entries(6)));

        let state = views.watch_idle("m", IDLE_TIMEOUT).await;

        assert_eq!(state, ViewState::TimedOut);
        assert!(!views.contains("m"));
    }

    #[tokio::test(start_paused = true)]
    async fn page_turns_extend_the_deadline() {
        let views = Arc::new(ListViews::new());
        views.register("m", ListView::new("u", entries(12)));
        let started = tokio::time::Instant::now();

        let watcher = {
            let views = Arc::clone(&views);
            tokio::spawn(async move { views.watch_idle("m", IDLE_TIMEOUT).await })
        };

        tokio::time::sleep(Duration::from_secs(45)).await;
        assert!(views.turn("m", "u", NEXT_EMOJI).is_some());

        let state = watcher.await.unwrap();
        assert_eq!(state, ViewState::TimedOut);
        assert!(started.elapsed() >= Duration::from_secs(105));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_completes_view() {
        let views = Arc::new(ListViews::new());
        views.register("m", ListView::new("u", entries(12)));

        let watcher = {
            let views = Arc::clone(&views);
            tokio::spawn(async move { views.watch_idle("m", IDLE_TIMEOUT).await })
        };
        tokio::task::yield_now().await;
        views.cancel_all();

        assert_eq!(watcher.await.unwrap(), ViewState::Completed);
        assert!(views.is_empty());
    }

    #[tokio::test]
    async fn unknown_view_is_completed() {
        let views = ListViews::new();
        assert_eq!(
            views.watch_idle("missing", IDLE_TIMEOUT).await,
            ViewState::Completed
        );
    }
}
