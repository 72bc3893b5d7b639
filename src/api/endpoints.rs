// Story backend endpoint functions.
// Binds each StoryApi operation to its HTTP route and body shape.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;

use super::client::{ApiClient, NO_PARAMS};
use super::service::StoryApi;
use super::types::{
    Achievement, AchievementsResponse, ActionReply, Dashboard, DiaryStory, GenerateRequest,
    PasswordChange, Preferences, PreferencesResponse, StoriesResponse, StoryFilter,
    StorySummary, UserInfo, UserStatus,
};

/// Body shared by save and bookmark.
#[derive(Debug, Serialize)]
struct StoryPayload<'a> {
    story_data: &'a DiaryStory,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_public: Option<bool>,
}

#[derive(Debug, Serialize)]
struct RatingPayload<'a> {
    story_data: &'a DiaryStory,
    rating: u8,
    comment: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginPayload<'a> {
    username_or_email: &'a str,
    password: &'a str,
    remember: bool,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    user: UserInfo,
}

/// Acknowledgement with no payload beyond the envelope.
#[derive(Debug, Deserialize)]
struct Ack {}

#[async_trait]
impl StoryApi for ApiClient {
    async fn generate_diary(&self, request: &GenerateRequest) -> Result<DiaryStory> {
        self.post("/generate_diary", request).await
    }

    async fn save_story(&self, story: &DiaryStory, is_public: bool) -> Result<ActionReply> {
        let body = StoryPayload {
            story_data: story,
            is_public: Some(is_public),
        };
        self.post("/api/stories/save", &body).await
    }

    async fn bookmark_story(&self, story: &DiaryStory) -> Result<ActionReply> {
        let body = StoryPayload {
            story_data: story,
            is_public: None,
        };
        self.post("/api/stories/bookmark", &body).await
    }

    async fn rate_story(
        &self,
        story: &DiaryStory,
        rating: u8,
        comment: &str,
    ) -> Result<ActionReply> {
        let body = RatingPayload {
            story_data: story,
            rating,
            comment,
        };
        self.post("/api/stories/rate", &body).await
    }

    async fn delete_story(&self, story_id: u64) -> Result<ActionReply> {
        self.delete(&format!("/api/stories/{}", story_id)).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<UserInfo> {
        let body = LoginPayload {
            username_or_email: username,
            password,
            remember: true,
        };
        let response: LoginResponse = self.post("/auth/login", &body).await?;
        Ok(response.user)
    }

    async fn user_status(&self) -> Result<UserStatus> {
        self.get_raw("/api/user/status").await
    }

    async fn preferences(&self) -> Result<Preferences> {
        let response: PreferencesResponse = self.get("/api/user/preferences", NO_PARAMS).await?;
        Ok(response.preferences)
    }

    async fn update_preferences(&self, preferences: &Preferences) -> Result<ActionReply> {
        self.post("/api/user/preferences", preferences).await
    }

    async fn dashboard(&self) -> Result<Dashboard> {
        self.get("/api/user/dashboard", NO_PARAMS).await
    }

    async fn user_stories(&self, filter: &StoryFilter) -> Result<Vec<StorySummary>> {
        let response: StoriesResponse = self
            .get("/api/user/stories", &filter.to_params())
            .await?;
        Ok(response.stories)
    }

    async fn achievements(&self) -> Result<Vec<Achievement>> {
        let response: AchievementsResponse =
            self.get("/api/user/achievements", NO_PARAMS).await?;
        Ok(response.achievements)
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<ActionReply> {
        self.post("/auth/change-password", change).await
    }

    async fn delete_account(&self, password: &str) -> Result<ActionReply> {
        self.post("/auth/delete-account", &json!({ "password": password }))
            .await
    }

    async fn track(&self, event: &str, data: serde_json::Value) -> Result<()> {
        let body = json!({
            "event": event,
            "data": data,
            "timestamp": Utc::now().to_rfc3339(),
        });
        let _: Ack = self.post("/api/analytics/track", &body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story() -> DiaryStory {
        serde_json::from_value(json!({
            "era": "The Great Depression",
            "diary_entry": "The bread line was longer today.",
            "character_name": "Thomas"
        }))
        .unwrap()
    }

    #[test]
    fn test_save_payload_shape() {
        let story = story();
        let body = serde_json::to_value(StoryPayload {
            story_data: &story,
            is_public: Some(false),
        })
        .unwrap();
        assert_eq!(body["is_public"], json!(false));
        assert_eq!(body["story_data"]["character_name"], json!("Thomas"));

        let bookmark = serde_json::to_value(StoryPayload {
            story_data: &story,
            is_public: None,
        })
        .unwrap();
        assert!(bookmark.get("is_public").is_none());
    }

    #[test]
    fn test_rating_payload_shape() {
        let story = story();
        let body = serde_json::to_value(RatingPayload {
            story_data: &story,
            rating: 4,
            comment: "Moving",
        })
        .unwrap();
        assert_eq!(body["rating"], json!(4));
        assert_eq!(body["comment"], json!("Moving"));
    }

    #[test]
    fn test_login_response_extracts_user() {
        let response: LoginResponse = crate::api::client::open_envelope(json!({
            "success": true,
            "message": "Login successful",
            "user": {"id": 3, "username": "ruby", "email": "ruby@example.com"}
        }))
        .unwrap();
        assert_eq!(response.user.username, "ruby");
    }
}
