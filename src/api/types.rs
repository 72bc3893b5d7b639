// Story backend request and response types.
// Structs for the JSON bodies exchanged with the diary service.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Body of a story generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub era: String,
    pub save_story: bool,
    pub is_public: bool,
}

impl GenerateRequest {
    /// Request used by the story tab: persist for the signed-in user, keep private.
    pub fn private(era: impl Into<String>) -> Self {
        Self {
            era: era.into(),
            save_story: true,
            is_public: false,
        }
    }
}

/// A generated diary story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryStory {
    pub era: String,
    #[serde(default)]
    pub character_name: String,
    #[serde(default)]
    pub character_profile: String,
    pub diary_entry: String,
    #[serde(default)]
    pub historical_context: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Display date as formatted by the server ("October 16, 2026").
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_id: Option<u64>,
    #[serde(default)]
    pub saved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,
}

/// Reply to a persistence or account action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ActionReply {
    #[serde(default)]
    pub message: Option<String>,
}

/// Signed-in user as reported by the session endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Authentication status of the current session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserStatus {
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

/// Visual theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Auto,
}

impl Theme {
    pub fn label(&self) -> &'static str {
        match self {
            Theme::Dark => "Dark",
            Theme::Light => "Light",
            Theme::Auto => "Auto",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Auto,
            Theme::Auto => Theme::Dark,
        }
    }
}

/// Typewriter speed preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypewriterSpeed {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl TypewriterSpeed {
    /// Parse a stored preference; anything unrecognized falls back to medium.
    pub fn from_name(name: &str) -> Self {
        match name {
            "slow" => TypewriterSpeed::Slow,
            "fast" => TypewriterSpeed::Fast,
            _ => TypewriterSpeed::Medium,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TypewriterSpeed::Slow => "Slow",
            TypewriterSpeed::Medium => "Medium",
            TypewriterSpeed::Fast => "Fast",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            TypewriterSpeed::Slow => TypewriterSpeed::Medium,
            TypewriterSpeed::Medium => TypewriterSpeed::Fast,
            TypewriterSpeed::Fast => TypewriterSpeed::Slow,
        }
    }
}

fn lenient_speed<'de, D>(deserializer: D) -> Result<TypewriterSpeed, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(TypewriterSpeed::from_name)
        .unwrap_or_default())
}

/// Parse a server timestamp. The backend emits naive ISO-8601 (implicitly UTC)
/// as often as RFC 3339, so both are accepted.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {:?}", raw)))
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {:?}", raw))),
    }
}

/// User display preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default, deserialize_with = "lenient_speed")]
    pub typewriter_speed: TypewriterSpeed,
    #[serde(default)]
    pub auto_play_audio: bool,
}

/// Envelope for the preferences fetch.
#[derive(Debug, Deserialize)]
pub(crate) struct PreferencesResponse {
    pub preferences: Preferences,
}

/// Aggregate counters on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_stories: u64,
    #[serde(default)]
    pub total_bookmarks: u64,
    #[serde(default)]
    pub total_ratings: u64,
    #[serde(default)]
    pub total_achievements: u64,
}

/// A story as listed in the profile views.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorySummary {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    pub era: String,
    #[serde(default)]
    pub content: String,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub rating_count: u64,
}

impl StorySummary {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled Story")
    }
}

/// Dashboard payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Dashboard {
    #[serde(default)]
    pub stats: DashboardStats,
    /// Stories written per era.
    #[serde(default)]
    pub era_stats: BTreeMap<String, u64>,
    #[serde(default)]
    pub recent_stories: Vec<StorySummary>,
}

/// Envelope for the story list.
#[derive(Debug, Deserialize)]
pub(crate) struct StoriesResponse {
    #[serde(default)]
    pub stories: Vec<StorySummary>,
}

/// An achievement, earned or not.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Achievement {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub earned_at: Option<DateTime<Utc>>,
}

impl Achievement {
    pub fn is_earned(&self) -> bool {
        self.earned_at.is_some()
    }
}

/// Envelope for the achievements list.
#[derive(Debug, Deserialize)]
pub(crate) struct AchievementsResponse {
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

/// Sort order for the story list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorySort {
    #[default]
    Newest,
    Rating,
    Popularity,
}

impl StorySort {
    pub fn as_param(&self) -> &'static str {
        match self {
            StorySort::Newest => "created_at",
            StorySort::Rating => "rating",
            StorySort::Popularity => "popularity",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StorySort::Newest => "Newest",
            StorySort::Rating => "Top rated",
            StorySort::Popularity => "Most bookmarked",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            StorySort::Newest => StorySort::Rating,
            StorySort::Rating => StorySort::Popularity,
            StorySort::Popularity => StorySort::Newest,
        }
    }
}

/// Filter applied to the story list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryFilter {
    pub era: Option<String>,
    pub sort: StorySort,
}

impl StoryFilter {
    /// Query parameters; the default sort is left implicit.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(era) = &self.era {
            params.push(("era", era.clone()));
        }
        if self.sort != StorySort::Newest {
            params.push(("sort", self.sort.as_param().to_string()));
        }
        params
    }
}

/// Password change form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_deserializes_with_minimal_fields() {
        let json = r#"{"era": "Ancient Egypt", "diary_entry": "Today I saw the Nile."}"#;
        let story: DiaryStory = serde_json::from_str(json).unwrap();
        assert_eq!(story.era, "Ancient Egypt");
        assert_eq!(story.diary_entry, "Today I saw the Nile.");
        assert!(story.image_url.is_none());
        assert!(!story.saved);
    }

    #[test]
    fn test_preferences_round_trip() {
        for prefs in [
            Preferences::default(),
            Preferences {
                theme: Theme::Light,
                typewriter_speed: TypewriterSpeed::Fast,
                auto_play_audio: true,
            },
            Preferences {
                theme: Theme::Auto,
                typewriter_speed: TypewriterSpeed::Slow,
                auto_play_audio: false,
            },
        ] {
            let json = serde_json::to_string(&prefs).unwrap();
            let back: Preferences = serde_json::from_str(&json).unwrap();
            assert_eq!(back, prefs);
        }
    }

    #[test]
    fn test_preferences_wire_format() {
        let prefs = Preferences {
            theme: Theme::Light,
            typewriter_speed: TypewriterSpeed::Slow,
            auto_play_audio: true,
        };
        let value = serde_json::to_value(prefs).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "theme": "light",
                "typewriter_speed": "slow",
                "auto_play_audio": true
            })
        );
    }

    #[test]
    fn test_unknown_speed_falls_back_to_medium() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"typewriter_speed": "ludicrous"}"#).unwrap();
        assert_eq!(prefs.typewriter_speed, TypewriterSpeed::Medium);

        let prefs: Preferences = serde_json::from_str(r#"{"typewriter_speed": null}"#).unwrap();
        assert_eq!(prefs.typewriter_speed, TypewriterSpeed::Medium);

        let prefs: Preferences = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn test_story_filter_params() {
        assert!(StoryFilter::default().to_params().is_empty());

        let filter = StoryFilter {
            era: Some("The Space Race".to_string()),
            sort: StorySort::Rating,
        };
        assert_eq!(
            filter.to_params(),
            vec![
                ("era", "The Space Race".to_string()),
                ("sort", "rating".to_string())
            ]
        );
    }

    #[test]
    fn test_naive_timestamps_are_utc() {
        let json = r#"{"id": 7, "era": "The Renaissance", "created_at": "2024-05-01T10:00:00.250000"}"#;
        let story: StorySummary = serde_json::from_str(json).unwrap();
        assert_eq!(story.created_at.to_rfc3339(), "2024-05-01T10:00:00.250+00:00");
        assert_eq!(story.display_title(), "Untitled Story");

        let bad = r#"{"id": 7, "era": "x", "created_at": "yesterday"}"#;
        assert!(serde_json::from_str::<StorySummary>(bad).is_err());
    }

    #[test]
    fn test_achievement_earned() {
        let json = r#"[
            {"name": "First Words", "description": "Write a story", "earned_at": "2024-05-01T10:00:00Z"},
            {"name": "Time Traveler", "description": "Visit five eras", "earned_at": null}
        ]"#;
        let achievements: Vec<Achievement> = serde_json::from_str(json).unwrap();
        assert!(achievements[0].is_earned());
        assert!(!achievements[1].is_earned());
    }
}
