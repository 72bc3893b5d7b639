// In-memory StoryApi used by controller tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{
    Achievement, ActionReply, Dashboard, DiaryStory, GenerateRequest, PasswordChange,
    Preferences, StoryApi, StoryFilter, StorySummary, UserInfo, UserStatus,
};
use crate::error::{EchoesError, Result};

/// How a fake call should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Unauthorized,
    Server,
}

impl Failure {
    fn into_error(self) -> EchoesError {
        match self {
            Failure::Unauthorized => EchoesError::Unauthorized,
            Failure::Server => EchoesError::Api("database is locked".to_string()),
        }
    }
}

pub struct FakeApi {
    pub generate_calls: AtomicUsize,
    pub generate_delay: Duration,
    pub diary_entry: String,
    pub generate_failure: Option<Failure>,
    pub stories_delay: Duration,
    pub achievements_delay: Duration,
    pub action_failure: Option<Failure>,
    pub preferences: Mutex<Preferences>,
    pub generated_eras: Mutex<Vec<String>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            generate_calls: AtomicUsize::new(0),
            generate_delay: Duration::from_millis(200),
            diary_entry: "Today I saw the Nile.".to_string(),
            generate_failure: None,
            stories_delay: Duration::from_millis(10),
            achievements_delay: Duration::from_millis(10),
            action_failure: None,
            preferences: Mutex::new(Preferences::default()),
            generated_eras: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    fn action(&self) -> Result<ActionReply> {
        match self.action_failure {
            Some(failure) => Err(failure.into_error()),
            None => Ok(ActionReply::default()),
        }
    }
}

#[async_trait]
impl StoryApi for FakeApi {
    async fn generate_diary(&self, request: &GenerateRequest) -> Result<DiaryStory> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut eras) = self.generated_eras.lock() {
            eras.push(request.era.clone());
        }
        tokio::time::sleep(self.generate_delay).await;
        if let Some(failure) = self.generate_failure {
            return Err(failure.into_error());
        }
        Ok(DiaryStory {
            era: request.era.clone(),
            character_name: "Anonymous".to_string(),
            character_profile: String::new(),
            diary_entry: self.diary_entry.clone(),
            historical_context: String::new(),
            image_url: None,
            timestamp: None,
            mood: None,
            setting: None,
            story_id: Some(1),
            saved: false,
            save_error: None,
        })
    }

    async fn save_story(&self, _story: &DiaryStory, _is_public: bool) -> Result<ActionReply> {
        self.action()
    }

    async fn bookmark_story(&self, _story: &DiaryStory) -> Result<ActionReply> {
        self.action()
    }

    async fn rate_story(
        &self,
        _story: &DiaryStory,
        _rating: u8,
        _comment: &str,
    ) -> Result<ActionReply> {
        self.action()
    }

    async fn delete_story(&self, _story_id: u64) -> Result<ActionReply> {
        self.action()
    }

    async fn login(&self, username: &str, _password: &str) -> Result<UserInfo> {
        Ok(UserInfo {
            id: 1,
            username: username.to_string(),
            email: None,
        })
    }

    async fn user_status(&self) -> Result<UserStatus> {
        Ok(UserStatus {
            authenticated: false,
            user: None,
        })
    }

    async fn preferences(&self) -> Result<Preferences> {
        self.preferences
            .lock()
            .map(|prefs| *prefs)
            .map_err(|_| EchoesError::Other("poisoned".to_string()))
    }

    async fn update_preferences(&self, preferences: &Preferences) -> Result<ActionReply> {
        self.action()?;
        if let Ok(mut stored) = self.preferences.lock() {
            *stored = *preferences;
        }
        Ok(ActionReply::default())
    }

    async fn dashboard(&self) -> Result<Dashboard> {
        Ok(Dashboard::default())
    }

    async fn user_stories(&self, filter: &StoryFilter) -> Result<Vec<StorySummary>> {
        tokio::time::sleep(self.stories_delay).await;
        Ok(vec![StorySummary {
            id: 42,
            title: Some("Diary Entry from The Space Race".to_string()),
            era: filter
                .era
                .clone()
                .unwrap_or_else(|| "The Space Race".to_string()),
            content: "Countdown again.".to_string(),
            created_at: chrono::Utc::now(),
            average_rating: Some(4.5),
            rating_count: 2,
        }])
    }

    async fn achievements(&self) -> Result<Vec<Achievement>> {
        tokio::time::sleep(self.achievements_delay).await;
        Ok(vec![Achievement {
            name: "First Words".to_string(),
            description: "Write your first story".to_string(),
            icon: None,
            earned_at: Some(chrono::Utc::now()),
        }])
    }

    async fn change_password(&self, _change: &PasswordChange) -> Result<ActionReply> {
        self.action()
    }

    async fn delete_account(&self, _password: &str) -> Result<ActionReply> {
        self.action()
    }

    async fn track(&self, _event: &str, _data: serde_json::Value) -> Result<()> {
        Ok(())
    }
}
