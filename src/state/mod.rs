// State management module.
// Generation lifecycle, typewriter reveal, notifications, actions, and profile tab data.

pub mod actions;
pub mod notify;
pub mod profile;
pub mod reveal;
pub mod view;

#[cfg(test)]
pub(crate) mod fake;

pub use actions::StoryAction;
pub use notify::{Notification, NotificationKind, NotificationPhase, NotificationQueue, TimerPhase};
pub use profile::{LoadRequest, LoadingState, ProfileData, SelectableList, TabPayload};
pub use reveal::{SequentialRevealer, TickOutcome, reveal_delay};
pub use view::{GenerationOutcome, UiState, ViewStateController};

/// Historical periods offered on the story tab.
pub const ERAS: &[&str] = &[
    "The Roaring Twenties",
    "The Great Depression",
    "The Space Race",
    "The 1960s Counter-culture",
    "The Dawn of the Internet",
    "World War II Home Front",
    "The Renaissance",
    "The Industrial Revolution",
];
