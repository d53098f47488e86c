//! Command-line markers carried across a self-restart.
//!
//! The restarting process appends `--restarted --channel=<id> --message=<id>`
//! to its own arguments when spawning the replacement. The replacement
//! strips them before argument parsing and, once connected, edits the
//! referenced message to confirm the restart.

pub const RESTARTED_FLAG: &str = "--restarted";
pub const CHANNEL_PREFIX: &str = "--channel=";
pub const MESSAGE_PREFIX: &str = "--message=";

/// Where the "Restarting" notice was posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartMarkers {
    pub channel_id: String,
    pub message_id: String,
}

impl RestartMarkers {
    pub fn new(channel_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            message_id: message_id.into(),
        }
    }

    fn to_args(&self) -> [String; 3] {
        [
            RESTARTED_FLAG.to_string(),
            format!("{CHANNEL_PREFIX}{}", self.channel_id),
            format!("{MESSAGE_PREFIX}{}", self.message_id),
        ]
    }
}

/// Remove every restart marker from `args`.
///
/// Markers are only returned when `--restarted` is present together with a
/// non-empty channel and message id; a partial set is still stripped.
pub fn strip_markers(args: impl IntoIterator<Item = String>) -> (Vec<String>, Option<RestartMarkers>) {
    let mut restarted = false;
    let mut channel_id = None;
    let mut message_id = None;
    let mut remaining = Vec::new();

    for arg in args {
        if arg == RESTARTED_FLAG {
            restarted = true;
        } else if let Some(id) = arg.strip_prefix(CHANNEL_PREFIX) {
            channel_id = Some(id.to_string());
        } else if let Some(id) = arg.strip_prefix(MESSAGE_PREFIX) {
            message_id = Some(id.to_string());
        } else {
            remaining.push(arg);
        }
    }

    let markers = match (restarted, channel_id, message_id) {
        (true, Some(channel_id), Some(message_id))
            if !channel_id.is_empty() && !message_id.is_empty() =>
        {
            Some(RestartMarkers {
                channel_id,
                message_id,
            })
        },
        _ => None,
    };
    (remaining, markers)
}

/// Arguments for the replacement process: the current arguments without old
/// markers, followed by fresh ones. `args[0]` is the program path.
pub fn restart_args(args: &[String], markers: &RestartMarkers) -> Vec<String> {
    let (mut next, _) = strip_markers(args.iter().cloned());
    next.extend(markers.to_args());
    next
}
