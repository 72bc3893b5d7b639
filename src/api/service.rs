// Backend operations consumed by the UI controllers.
// The trait is the injection seam between state handling and HTTP.

use async_trait::async_trait;

use crate::error::Result;

use super::types::{
    Achievement, ActionReply, Dashboard, DiaryStory, GenerateRequest, PasswordChange,
    Preferences, StoryFilter, StorySummary, UserInfo, UserStatus,
};

/// Everything the client asks of the diary backend.
#[async_trait]
pub trait StoryApi: Send + Sync {
    async fn generate_diary(&self, request: &GenerateRequest) -> Result<DiaryStory>;

    async fn save_story(&self, story: &DiaryStory, is_public: bool) -> Result<ActionReply>;
    async fn bookmark_story(&self, story: &DiaryStory) -> Result<ActionReply>;
    async fn rate_story(&self, story: &DiaryStory, rating: u8, comment: &str)
    -> Result<ActionReply>;
    async fn delete_story(&self, story_id: u64) -> Result<ActionReply>;

    async fn login(&self, username: &str, password: &str) -> Result<UserInfo>;
    async fn user_status(&self) -> Result<UserStatus>;
    async fn preferences(&self) -> Result<Preferences>;
    async fn update_preferences(&self, preferences: &Preferences) -> Result<ActionReply>;

    async fn dashboard(&self) -> Result<Dashboard>;
    async fn user_stories(&self, filter: &StoryFilter) -> Result<Vec<StorySummary>>;
    async fn achievements(&self) -> Result<Vec<Achievement>>;

    async fn change_password(&self, change: &PasswordChange) -> Result<ActionReply>;
    async fn delete_account(&self, password: &str) -> Result<ActionReply>;

    /// Record a usage event. Callers treat failures as non-fatal.
    async fn track(&self, event: &str, data: serde_json::Value) -> Result<()>;
}
