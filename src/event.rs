// Application events.
// Every timer and network completion reaches the UI thread as one of these messages.

use tokio::sync::mpsc;

use crate::api::{ActionReply, DiaryStory, Preferences, UserInfo};
use crate::error::Result;
use crate::state::{StoryAction, TabPayload, TimerPhase};

#[derive(Debug)]
pub enum AppEvent {
    /// A reveal timer fired for the given job.
    RevealTick { job: u64 },
    /// A notification dismiss timer fired.
    NotificationTimer { id: u64, phase: TimerPhase },
    /// A story generation request finished.
    Generated {
        ticket: u64,
        result: Result<DiaryStory>,
    },
    /// A tab load finished.
    TabLoaded {
        seq: u64,
        result: Result<TabPayload>,
    },
    /// A story or account action finished.
    ActionFinished {
        action: StoryAction,
        result: Result<ActionReply>,
    },
    /// Startup session check finished; `None` means browsing as a guest.
    SessionChecked(Result<Option<UserInfo>>),
    /// Startup preferences fetch finished.
    PreferencesLoaded(Result<Preferences>),
    Quit,
}

pub type EventSender = mpsc::UnboundedSender<AppEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<AppEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
