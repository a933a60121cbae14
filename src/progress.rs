//! Load-phase events for UI feedback.
//!
//! A page load emits [`LoadEvent`]s through a `tokio::sync::broadcast`
//! channel as it moves through its phases. Consumers render the phase's
//! status text and progress fraction however they like; when nobody is
//! subscribed, events are silently dropped.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// A progress event emitted during one page load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadEvent {
    /// The session generation the load belongs to. Consumers can drop events
    /// from superseded loads by comparing generations.
    pub generation: u64,
    /// Where the load currently stands.
    pub phase: LoadPhase,
}

/// The phase a page load is in.
///
/// Each phase `Display`s as a ready-made status line for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LoadPhase {
    /// The listing page is being fetched through the proxy.
    Querying,
    /// The listing parsed; image-marked posts are being fanned out.
    Filtering {
        /// How many image-marked posts the listing yielded.
        posts: usize,
    },
    /// Post detail pages are resolving.
    Loading {
        /// Posts that reported success or failure so far.
        completed: usize,
        /// Posts dispatched in total.
        total: usize,
    },
    /// The listing held no image-marked posts; a normal, empty outcome.
    Empty,
    /// Every post resolved and the gallery is finalized.
    Done {
        /// Posts in the finalized gallery, placeholders included.
        posts: usize,
    },
    /// The load failed at the listing level and no gallery was produced.
    Failed {
        /// Human-readable description for the status line.
        message: String,
    },
}

impl LoadPhase {
    /// Returns the load's progress as a fraction in `[0, 1]`.
    ///
    /// Only the fan-out phase has measurable progress; terminal phases
    /// report `1.0` and failures fall back to `0.0`.
    pub fn fraction(&self) -> f32 {
        match self {
            LoadPhase::Querying | LoadPhase::Filtering { .. } | LoadPhase::Failed { .. } => 0.0,
            #[allow(clippy::cast_precision_loss)]
            LoadPhase::Loading { completed, total } => {
                if *total == 0 {
                    0.0
                } else {
                    *completed as f32 / *total as f32
                }
            }
            LoadPhase::Empty | LoadPhase::Done { .. } => 1.0,
        }
    }
}

impl Display for LoadPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoadPhase::Querying => write!(f, "Querying Craigslist..."),
            LoadPhase::Filtering { .. } => write!(f, "Filtering Posts for Images..."),
            LoadPhase::Loading { .. } => write!(f, "Loading Images..."),
            LoadPhase::Empty => write!(
                f,
                "Sorry, there are no images in the current batch of posts. \
                 Try older posts or another forum."
            ),
            LoadPhase::Done { .. } => write!(f, "Done."),
            LoadPhase::Failed { message } => write!(f, "{message}"),
        }
    }
}

/// Sender half of the progress channel.
pub type ProgressSender = tokio::sync::broadcast::Sender<LoadEvent>;

/// Receiver half of the progress channel.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<LoadEvent>;

/// Creates a progress channel with a bounded buffer.
///
/// 64 events cover a full page load: a handful of phase transitions plus one
/// `Loading` increment per post of a ~30-post batch.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(64)
}

/// Emits one event, ignoring the error raised when nobody subscribed.
pub(crate) fn emit(tx: Option<&ProgressSender>, generation: u64, phase: LoadPhase) {
    if let Some(sender) = tx {
        let _ = sender.send(LoadEvent { generation, phase });
    }
}
