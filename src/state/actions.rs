// Story and account actions.
// Background dispatch and the notification each outcome produces.

use std::future::Future;

use arboard::Clipboard;
use url::Url;

use crate::api::{ActionReply, DiaryStory};
use crate::error::{EchoesError, Result};
use crate::event::{AppEvent, EventSender};

use super::notify::NotificationKind;

/// Characters of the diary entry included in shared text.
const SHARE_EXCERPT_CHARS: usize = 200;

/// A user-triggered request whose outcome is reported as a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryAction {
    Save,
    Bookmark,
    Rate,
    DeleteStory(u64),
    SavePreferences,
    ChangePassword,
    DeleteAccount,
}

impl StoryAction {
    pub fn success_message(&self) -> &'static str {
        match self {
            StoryAction::Save => "Story saved successfully!",
            StoryAction::Bookmark => "Story bookmarked!",
            StoryAction::Rate => "Thank you for your rating!",
            StoryAction::DeleteStory(_) => "Story deleted successfully",
            StoryAction::SavePreferences => "Preferences saved successfully!",
            StoryAction::ChangePassword => "Password changed successfully!",
            StoryAction::DeleteAccount => "Account deleted successfully",
        }
    }

    /// Phrase completing "Please log in to ...".
    fn login_verb(&self) -> &'static str {
        match self {
            StoryAction::Save => "save stories",
            StoryAction::Bookmark => "bookmark stories",
            StoryAction::Rate => "rate stories",
            StoryAction::DeleteStory(_) => "delete stories",
            StoryAction::SavePreferences => "save preferences",
            StoryAction::ChangePassword => "change your password",
            StoryAction::DeleteAccount => "delete your account",
        }
    }

    fn failure_prefix(&self) -> &'static str {
        match self {
            StoryAction::Save => "Failed to save story",
            StoryAction::Bookmark => "Failed to bookmark story",
            StoryAction::Rate => "Failed to submit rating",
            StoryAction::DeleteStory(_) => "Error deleting story",
            StoryAction::SavePreferences => "Error saving preferences",
            StoryAction::ChangePassword => "Error changing password",
            StoryAction::DeleteAccount => "Error deleting account",
        }
    }

    /// Notification text and kind for a failed action.
    ///
    /// Authentication failures ask the user to log in; anything else names the
    /// action and the cause.
    pub fn failure_notice(&self, error: &EchoesError) -> (String, NotificationKind) {
        if error.is_auth() {
            return (
                format!("Please log in to {}", self.login_verb()),
                NotificationKind::Info,
            );
        }
        let cause = match error {
            // The server's own wording is already user-facing
            EchoesError::Rejected(reason) | EchoesError::Api(reason) => reason.clone(),
            other => other.to_string(),
        };
        (
            format!("{}: {}", self.failure_prefix(), cause),
            NotificationKind::Error,
        )
    }

    /// Notification for a finished action.
    pub fn notice(&self, result: &Result<ActionReply>) -> (String, NotificationKind) {
        match result {
            Ok(_) => (self.success_message().to_string(), NotificationKind::Success),
            Err(e) => self.failure_notice(e),
        }
    }
}

/// Run `request` in the background and report it as `ActionFinished`.
pub fn spawn_action<F>(events: &EventSender, action: StoryAction, request: F)
where
    F: Future<Output = Result<ActionReply>> + Send + 'static,
{
    let events = events.clone();
    tracing::info!(?action, "action started");
    tokio::spawn(async move {
        let result = request.await;
        if let Err(e) = &result {
            tracing::warn!(?action, error = %e, "action failed");
        }
        let _ = events.send(AppEvent::ActionFinished { action, result });
    });
}

/// Address a shared story points at.
pub fn share_url(base: &Url, story: &DiaryStory) -> String {
    match story.story_id {
        Some(id) => base
            .join(&format!("story/{}", id))
            .map(String::from)
            .unwrap_or_else(|_| base.to_string()),
        None => base.to_string(),
    }
}

/// Text placed on the clipboard when sharing.
pub fn share_text(story: &DiaryStory, url: &str) -> String {
    let excerpt: String = story.diary_entry.chars().take(SHARE_EXCERPT_CHARS).collect();
    format!(
        "Check out this story from {}:\n\n{}...\n\n{}",
        story.era, excerpt, url
    )
}

/// Put `text` on the system clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new().map_err(|e| EchoesError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| EchoesError::Clipboard(e.to_string()))
}
