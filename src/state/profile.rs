// Profile tab data.
// Loading states and list selection for the dashboard, stories, achievements, and settings views.

use ratatui::widgets::ListState;

use crate::api::{
    Achievement, Dashboard, Preferences, StoryApi, StoryFilter, StorySummary,
};
use crate::error::Result;

/// Loading state for async data.
#[derive(Debug, Clone, Default)]
pub enum LoadingState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> LoadingState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadingState::Loaded(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadingState::Loaded(data) => Some(data),
            _ => None,
        }
    }
}

/// State for a selectable list with keyboard navigation.
#[derive(Debug, Clone)]
pub struct SelectableList<T> {
    pub data: LoadingState<Vec<T>>,
    pub list_state: ListState,
}

impl<T> Default for SelectableList<T> {
    fn default() -> Self {
        Self {
            data: LoadingState::Idle,
            list_state: ListState::default(),
        }
    }
}

impl<T> SelectableList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the next item in the list.
    pub fn select_next(&mut self) {
        if let Some(items) = self.data.data() {
            if items.is_empty() {
                return;
            }
            let i = match self.list_state.selected() {
                Some(i) if i + 1 < items.len() => i + 1,
                Some(i) => i, // Stay at end
                None => 0,
            };
            self.list_state.select(Some(i));
        }
    }

    /// Select the previous item in the list.
    pub fn select_prev(&mut self) {
        if let Some(items) = self.data.data() {
            if items.is_empty() {
                return;
            }
            let i = self.list_state.selected().map_or(0, |i| i.saturating_sub(1));
            self.list_state.select(Some(i));
        }
    }

    /// Get the selected item.
    pub fn selected_item(&self) -> Option<&T> {
        let index = self.list_state.selected()?;
        self.data.data()?.get(index)
    }

    /// Set loaded data, keeping the selection in range.
    pub fn set_loaded(&mut self, items: Vec<T>) {
        let selected = match (self.list_state.selected(), items.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.data = LoadingState::Loaded(items);
        self.list_state.select(selected);
    }

    pub fn set_loading(&mut self) {
        self.data = LoadingState::Loading;
    }

    pub fn set_error(&mut self, error: String) {
        self.data = LoadingState::Error(error);
    }
}

/// What a tab needs fetched when it becomes active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    Dashboard,
    Stories(StoryFilter),
    Achievements,
    Settings,
}

/// Result of a tab load.
#[derive(Debug, Clone)]
pub enum TabPayload {
    Dashboard(Dashboard),
    Stories(Vec<StorySummary>),
    Achievements(Vec<Achievement>),
    Settings(Preferences),
}

/// Fetch the data for one tab.
pub async fn load(api: &dyn StoryApi, request: &LoadRequest) -> Result<TabPayload> {
    Ok(match request {
        LoadRequest::Dashboard => TabPayload::Dashboard(api.dashboard().await?),
        LoadRequest::Stories(filter) => TabPayload::Stories(api.user_stories(filter).await?),
        LoadRequest::Achievements => TabPayload::Achievements(api.achievements().await?),
        LoadRequest::Settings => TabPayload::Settings(api.preferences().await?),
    })
}

/// Everything shown across the profile tabs.
#[derive(Debug, Default)]
pub struct ProfileData {
    pub dashboard: LoadingState<Dashboard>,
    pub stories: SelectableList<StorySummary>,
    pub story_filter: StoryFilter,
    pub achievements: SelectableList<Achievement>,
    /// Preferences as last fetched for the settings form.
    pub settings: LoadingState<Preferences>,
}

impl ProfileData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put the target of `request` into its loading state.
    pub fn mark_loading(&mut self, request: &LoadRequest) {
        match request {
            LoadRequest::Dashboard => self.dashboard = LoadingState::Loading,
            LoadRequest::Stories(_) => self.stories.set_loading(),
            LoadRequest::Achievements => self.achievements.set_loading(),
            LoadRequest::Settings => self.settings = LoadingState::Loading,
        }
    }

    pub fn apply(&mut self, payload: TabPayload) {
        match payload {
            TabPayload::Dashboard(dashboard) => self.dashboard = LoadingState::Loaded(dashboard),
            TabPayload::Stories(stories) => self.stories.set_loaded(stories),
            TabPayload::Achievements(achievements) => self.achievements.set_loaded(achievements),
            TabPayload::Settings(preferences) => {
                self.settings = LoadingState::Loaded(preferences)
            }
        }
    }

    pub fn fail(&mut self, request: &LoadRequest, error: String) {
        match request {
            LoadRequest::Dashboard => self.dashboard = LoadingState::Error(error),
            LoadRequest::Stories(_) => self.stories.set_error(error),
            LoadRequest::Achievements => self.achievements.set_error(error),
            LoadRequest::Settings => self.settings = LoadingState::Error(error),
        }
    }
}
