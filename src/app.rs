// App state and main event loop.
// Manages tabs, modals, keyboard input, and dispatch of background events.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::prelude::*;
use ratatui::widgets::ListState;
use url::Url;

use crate::api::{ActionReply, PasswordChange, Preferences, StoryApi, StoryFilter, UserInfo};
use crate::cache;
use crate::config::Credentials;
use crate::error::Result;
use crate::event::{AppEvent, EventReceiver, EventSender};
use crate::feedback::{self, AmbientAudio, SoundCue};
use crate::state::actions::{self, StoryAction};
use crate::state::{
    ERAS, GenerationOutcome, LoadRequest, NotificationKind, NotificationQueue, TabPayload,
    TickOutcome, ViewStateController, reveal_delay,
};
use crate::ui;

/// Delay between a successful account deletion and exit.
const ACCOUNT_DELETED_EXIT_DELAY: Duration = Duration::from_secs(2);

/// Active tab in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Story,
    Dashboard,
    Stories,
    Achievements,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Story,
        Tab::Dashboard,
        Tab::Stories,
        Tab::Achievements,
        Tab::Settings,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Story => "Story",
            Tab::Dashboard => "Dashboard",
            Tab::Stories => "My Stories",
            Tab::Achievements => "Achievements",
            Tab::Settings => "Settings",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Story => Tab::Dashboard,
            Tab::Dashboard => Tab::Stories,
            Tab::Stories => Tab::Achievements,
            Tab::Achievements => Tab::Settings,
            Tab::Settings => Tab::Story,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Story => Tab::Settings,
            Tab::Dashboard => Tab::Story,
            Tab::Stories => Tab::Dashboard,
            Tab::Achievements => Tab::Stories,
            Tab::Settings => Tab::Achievements,
        }
    }

    /// Data this tab fetches when it becomes visible.
    pub fn load_request(&self, filter: &StoryFilter) -> Option<LoadRequest> {
        match self {
            Tab::Story => None,
            Tab::Dashboard => Some(LoadRequest::Dashboard),
            Tab::Stories => Some(LoadRequest::Stories(filter.clone())),
            Tab::Achievements => Some(LoadRequest::Achievements),
            Tab::Settings => Some(LoadRequest::Settings),
        }
    }
}

/// Field focused in the settings form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsField {
    #[default]
    Theme,
    TypewriterSpeed,
    AutoPlayAudio,
}

impl SettingsField {
    pub const ALL: [SettingsField; 3] = [
        SettingsField::Theme,
        SettingsField::TypewriterSpeed,
        SettingsField::AutoPlayAudio,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SettingsField::Theme => "Theme",
            SettingsField::TypewriterSpeed => "Typewriter speed",
            SettingsField::AutoPlayAudio => "Auto-play ambient audio",
        }
    }

    fn next(&self) -> Self {
        match self {
            SettingsField::Theme => SettingsField::TypewriterSpeed,
            SettingsField::TypewriterSpeed => SettingsField::AutoPlayAudio,
            SettingsField::AutoPlayAudio => SettingsField::Theme,
        }
    }

    fn prev(&self) -> Self {
        match self {
            SettingsField::Theme => SettingsField::AutoPlayAudio,
            SettingsField::TypewriterSpeed => SettingsField::Theme,
            SettingsField::AutoPlayAudio => SettingsField::TypewriterSpeed,
        }
    }
}

/// Labels of the password change fields, in focus order.
pub const PASSWORD_FIELDS: [&str; 3] = ["Current password", "New password", "Confirm password"];

/// Overlay dialog capturing input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Help,
    Rating {
        stars: u8,
        comment: String,
    },
    ConfirmDeleteStory {
        id: u64,
        title: String,
    },
    ChangePassword {
        fields: [String; 3],
        focus: usize,
    },
    DeleteAccount {
        password: String,
    },
    ViewStory {
        title: String,
        era: String,
        content: String,
        scroll: u16,
    },
}

/// Main application state.
pub struct App {
    api: Arc<dyn StoryApi>,
    events: EventSender,
    base_url: Url,
    /// Local fallback copy of the preferences.
    preferences_cache: Option<PathBuf>,
    pub view: ViewStateController,
    pub notifications: NotificationQueue,
    /// Highlighted row of the era picker.
    pub era_list: ListState,
    /// Preferences currently in effect.
    pub preferences: Preferences,
    /// Unsaved edits on the settings tab.
    pub settings_draft: Preferences,
    pub settings_focus: SettingsField,
    /// Signed-in user; None while browsing as a guest.
    pub user: Option<UserInfo>,
    pub session_checked: bool,
    pub audio: AmbientAudio,
    pub modal: Option<Modal>,
    /// Vertical scroll of the story pane.
    pub story_scroll: u16,
    /// Whether the app should exit.
    pub should_quit: bool,
}

impl App {
    pub fn new(
        api: Arc<dyn StoryApi>,
        events: EventSender,
        base_url: Url,
        generation_timeout: Duration,
        preferences_cache: Option<PathBuf>,
    ) -> Self {
        let preferences = preferences_cache
            .as_deref()
            .and_then(|path| match cache::read_cached::<Preferences>(path) {
                Ok(cached) => cached.map(|cached| cached.data),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring unreadable preference cache");
                    None
                }
            })
            .unwrap_or_default();

        let mut era_list = ListState::default();
        era_list.select(Some(0));

        let mut view = ViewStateController::new(Arc::clone(&api), events.clone(), generation_timeout);
        view.set_reveal_speed(reveal_delay(preferences.typewriter_speed));

        Self {
            notifications: NotificationQueue::new(events.clone()),
            api,
            events,
            base_url,
            preferences_cache,
            view,
            era_list,
            preferences,
            settings_draft: preferences,
            settings_focus: SettingsField::default(),
            user: None,
            session_checked: false,
            audio: AmbientAudio::default(),
            modal: None,
            story_scroll: 0,
            should_quit: false,
        }
    }

    /// Open the session and fetch preferences in the background.
    pub fn start(&mut self, credentials: Option<Credentials>) {
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Some(credentials) = credentials {
                match api.login(&credentials.username, &credentials.password).await {
                    Ok(user) => tracing::info!(username = %user.username, "logged in"),
                    Err(e) => tracing::warn!(error = %e, "login failed, continuing as guest"),
                }
            }
            let session = api
                .user_status()
                .await
                .map(|status| status.user.filter(|_| status.authenticated));
            let _ = events.send(AppEvent::SessionChecked(session));
            let _ = events.send(AppEvent::PreferencesLoaded(api.preferences().await));
        });
    }

    /// Main event loop.
    pub fn run(
        &mut self,
        terminal: &mut Terminal<impl Backend>,
        events: &mut EventReceiver,
    ) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.handle_input()?;
            while let Ok(event) = events.try_recv() {
                self.handle_event(event);
            }
        }
        self.audio.stop();
        Ok(())
    }

    /// Poll the terminal for one key press.
    #[allow(clippy::collapsible_if)]
    fn handle_input(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    /// Apply a background event on the UI thread.
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::RevealTick { job } => match self.view.on_reveal_tick(job) {
                TickOutcome::Revealed(_) => {
                    let revealed = self.view.revealer().job().map_or(0, |job| job.position);
                    if feedback::types_on(revealed) {
                        SoundCue::Type.play();
                    }
                }
                TickOutcome::Completed => {
                    // Bring the finished story into view
                    self.story_scroll = 0;
                    if self.modal.is_none() && self.view.active_tab() != Tab::Story {
                        self.switch_tab(Tab::Story);
                    }
                    if self.preferences.auto_play_audio {
                        if let Some(story) = self.view.story() {
                            self.audio.play(&story.era);
                        }
                    }
                }
                TickOutcome::Ignored => {}
            },
            AppEvent::NotificationTimer { id, phase } => self.notifications.on_timer(id, phase),
            AppEvent::Generated { ticket, result } => {
                match self.view.on_generated(ticket, result, &mut self.notifications) {
                    GenerationOutcome::Displaying => {
                        self.story_scroll = 0;
                        SoundCue::Success.play();
                    }
                    GenerationOutcome::Failed => SoundCue::Error.play(),
                    GenerationOutcome::Stale => {}
                }
            }
            AppEvent::TabLoaded { seq, result } => {
                let fetched = match &result {
                    Ok(TabPayload::Settings(preferences)) => Some(*preferences),
                    _ => None,
                };
                if self.view.on_tab_loaded(seq, result) {
                    // Keep edits made while the fetch was in flight
                    if let Some(preferences) = fetched {
                        if self.settings_draft == self.preferences {
                            self.settings_draft = preferences;
                        }
                    }
                }
            }
            AppEvent::ActionFinished { action, result } => self.finish_action(action, result),
            AppEvent::SessionChecked(result) => {
                self.session_checked = true;
                match result {
                    Ok(user) => {
                        match &user {
                            Some(user) => tracing::info!(username = %user.username, "session active"),
                            None => tracing::info!("browsing as guest"),
                        }
                        self.user = user;
                    }
                    Err(e) => tracing::warn!(error = %e, "session check failed"),
                }
            }
            AppEvent::PreferencesLoaded(result) => match result {
                Ok(preferences) => {
                    self.apply_preferences(preferences);
                    self.cache_preferences();
                }
                Err(e) => {
                    tracing::info!(error = %e, "using local preferences");
                }
            },
            AppEvent::Quit => self.should_quit = true,
        }
    }

    fn finish_action(&mut self, action: StoryAction, result: Result<ActionReply>) {
        let (message, kind) = action.notice(&result);
        self.notifications.show(message, kind);
        match kind {
            NotificationKind::Success => SoundCue::Success.play(),
            NotificationKind::Error => SoundCue::Error.play(),
            NotificationKind::Info => {}
        }
        if result.is_err() {
            return;
        }

        match action {
            StoryAction::DeleteStory(_) => {
                if self.view.active_tab() == Tab::Stories {
                    self.view.refresh();
                }
            }
            StoryAction::DeleteAccount => {
                self.user = None;
                if let Some(path) = &self.preferences_cache {
                    if let Err(e) = cache::delete(path) {
                        tracing::warn!(error = %e, "failed to remove preference cache");
                    }
                }
                let events = self.events.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(ACCOUNT_DELETED_EXIT_DELAY).await;
                    let _ = events.send(AppEvent::Quit);
                });
            }
            _ => {}
        }
    }

    /// Make `preferences` the active ones.
    fn apply_preferences(&mut self, preferences: Preferences) {
        tracing::debug!(?preferences, "applying preferences");
        self.preferences = preferences;
        self.settings_draft = preferences;
        self.view.set_reveal_speed(reveal_delay(preferences.typewriter_speed));
    }

    fn cache_preferences(&self) {
        if let Some(path) = &self.preferences_cache {
            if let Err(e) = cache::write_cached(path, &self.preferences) {
                tracing::warn!(error = %e, "failed to write preference cache");
            }
        }
    }

    /// Handle one key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.modal.is_some() {
            self.handle_modal_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Tab => {
                self.switch_tab(self.view.active_tab().next());
                return;
            }
            KeyCode::BackTab => {
                self.switch_tab(self.view.active_tab().prev());
                return;
            }
            KeyCode::Char('?') => {
                self.modal = Some(Modal::Help);
                return;
            }
            KeyCode::Esc => {
                self.notifications.dismiss();
                return;
            }
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                self.switch_tab(Tab::ALL[index]);
                return;
            }
            _ => {}
        }

        match self.view.active_tab() {
            Tab::Story => self.handle_story_key(key),
            Tab::Dashboard => {
                if key.code == KeyCode::Char('r') {
                    self.view.refresh();
                }
            }
            Tab::Stories => self.handle_stories_key(key),
            Tab::Achievements => match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.view.profile.achievements.select_prev(),
                KeyCode::Down | KeyCode::Char('j') => self.view.profile.achievements.select_next(),
                KeyCode::Char('r') => {
                    self.view.refresh();
                }
                _ => {}
            },
            Tab::Settings => self.handle_settings_key(key),
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        if tab == Tab::Settings {
            self.settings_draft = self.preferences;
        }
        self.view.switch_tab(tab);
    }

    fn handle_story_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                let i = self.era_list.selected().map_or(0, |i| i.saturating_sub(1));
                self.era_list.select(Some(i));
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let i = self
                    .era_list
                    .selected()
                    .map_or(0, |i| (i + 1).min(ERAS.len() - 1));
                self.era_list.select(Some(i));
            }
            KeyCode::Enter => {
                let era = self.era_list.selected().and_then(|i| ERAS.get(i));
                if let Some(era) = era {
                    if self.view.select_era(era) {
                        SoundCue::Select.play();
                    }
                }
            }
            KeyCode::Char('g') => {
                if self.view.generate().is_some() {
                    self.audio.stop();
                    SoundCue::Generate.play();
                }
            }
            KeyCode::PageDown => self.story_scroll = self.story_scroll.saturating_add(5),
            KeyCode::PageUp => self.story_scroll = self.story_scroll.saturating_sub(5),
            KeyCode::Char('s') => self.save_story(),
            KeyCode::Char('b') => self.bookmark_story(),
            KeyCode::Char('r') => {
                if self.view.story().is_some() {
                    self.modal = Some(Modal::Rating {
                        stars: 0,
                        comment: String::new(),
                    });
                }
            }
            KeyCode::Char('x') => self.share_story(),
            KeyCode::Char('n') => self.new_story(),
            KeyCode::Char('a') => {
                let era = self.view.story().map(|story| story.era.clone());
                self.audio.toggle(era.as_deref());
            }
            _ => {}
        }
    }

    fn save_story(&mut self) {
        let Some(story) = self.view.story().cloned() else {
            return;
        };
        let api = Arc::clone(&self.api);
        actions::spawn_action(&self.events, StoryAction::Save, async move {
            api.save_story(&story, false).await
        });
    }

    fn bookmark_story(&mut self) {
        let Some(story) = self.view.story().cloned() else {
            return;
        };
        let api = Arc::clone(&self.api);
        actions::spawn_action(&self.events, StoryAction::Bookmark, async move {
            api.bookmark_story(&story).await
        });
    }

    fn share_story(&mut self) {
        let Some(story) = self.view.story() else {
            return;
        };
        let url = actions::share_url(&self.base_url, story);
        let text = actions::share_text(story, &url);
        match actions::copy_to_clipboard(&text) {
            Ok(()) => {
                tracing::info!(era = %story.era, "story shared");
                self.notifications.success("Story link copied to clipboard!");
            }
            Err(e) => {
                tracing::warn!(error = %e, "share failed");
                self.notifications.error("Unable to share story");
            }
        }
    }

    /// Clear the story view for another generation.
    fn new_story(&mut self) {
        self.view.reset();
        self.audio.stop();
        self.story_scroll = 0;
    }

    fn handle_stories_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.view.profile.stories.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.view.profile.stories.select_next(),
            KeyCode::Char('f') => {
                let mut filter = self.view.profile.story_filter.clone();
                filter.era = next_era_filter(filter.era.as_deref());
                self.view.filter_stories(filter);
            }
            KeyCode::Char('o') => {
                let mut filter = self.view.profile.story_filter.clone();
                filter.sort = filter.sort.next();
                self.view.filter_stories(filter);
            }
            KeyCode::Enter | KeyCode::Char('v') => {
                if let Some(story) = self.view.profile.stories.selected_item() {
                    self.modal = Some(Modal::ViewStory {
                        title: story.display_title().to_string(),
                        era: story.era.clone(),
                        content: story.content.clone(),
                        scroll: 0,
                    });
                }
            }
            KeyCode::Char('d') => {
                if let Some(story) = self.view.profile.stories.selected_item() {
                    self.modal = Some(Modal::ConfirmDeleteStory {
                        id: story.id,
                        title: story.display_title().to_string(),
                    });
                }
            }
            KeyCode::Char('r') => {
                self.view.refresh();
            }
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.settings_focus = self.settings_focus.prev(),
            KeyCode::Down | KeyCode::Char('j') => self.settings_focus = self.settings_focus.next(),
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => {
                let draft = &mut self.settings_draft;
                match self.settings_focus {
                    SettingsField::Theme => draft.theme = draft.theme.next(),
                    SettingsField::TypewriterSpeed => {
                        draft.typewriter_speed = draft.typewriter_speed.next()
                    }
                    SettingsField::AutoPlayAudio => draft.auto_play_audio = !draft.auto_play_audio,
                }
            }
            KeyCode::Enter => self.save_preferences(),
            KeyCode::Char('p') => {
                self.modal = Some(Modal::ChangePassword {
                    fields: Default::default(),
                    focus: 0,
                });
            }
            KeyCode::Char('D') => {
                self.modal = Some(Modal::DeleteAccount {
                    password: String::new(),
                });
            }
            KeyCode::Char('r') => {
                self.view.refresh();
            }
            _ => {}
        }
    }

    /// Apply the settings draft locally and send it to the server.
    fn save_preferences(&mut self) {
        let preferences = self.settings_draft;
        self.apply_preferences(preferences);
        self.cache_preferences();

        let api = Arc::clone(&self.api);
        actions::spawn_action(&self.events, StoryAction::SavePreferences, async move {
            api.update_preferences(&preferences).await
        });
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.modal.take() else {
            return;
        };
        if key.code == KeyCode::Esc {
            return;
        }
        self.modal = match modal {
            Modal::Help => match key.code {
                KeyCode::Char('?') | KeyCode::Char('q') => None,
                _ => Some(Modal::Help),
            },
            Modal::Rating { stars, comment } => self.rating_key(key, stars, comment),
            Modal::ConfirmDeleteStory { id, title } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    let api = Arc::clone(&self.api);
                    actions::spawn_action(&self.events, StoryAction::DeleteStory(id), async move {
                        api.delete_story(id).await
                    });
                    None
                }
                KeyCode::Char('n') => None,
                _ => Some(Modal::ConfirmDeleteStory { id, title }),
            },
            Modal::ChangePassword { fields, focus } => self.password_key(key, fields, focus),
            Modal::ViewStory {
                title,
                era,
                content,
                scroll,
            } => {
                let scroll = match key.code {
                    KeyCode::Enter | KeyCode::Char('q') => return,
                    KeyCode::Up | KeyCode::Char('k') => scroll.saturating_sub(1),
                    KeyCode::Down | KeyCode::Char('j') => scroll.saturating_add(1),
                    KeyCode::PageUp => scroll.saturating_sub(5),
                    KeyCode::PageDown => scroll.saturating_add(5),
                    _ => scroll,
                };
                Some(Modal::ViewStory {
                    title,
                    era,
                    content,
                    scroll,
                })
            }
            Modal::DeleteAccount { mut password } => match key.code {
                KeyCode::Enter if !password.is_empty() => {
                    let api = Arc::clone(&self.api);
                    actions::spawn_action(&self.events, StoryAction::DeleteAccount, async move {
                        api.delete_account(&password).await
                    });
                    None
                }
                _ => {
                    edit_text(&mut password, key);
                    Some(Modal::DeleteAccount { password })
                }
            },
        };
    }

    fn rating_key(&mut self, key: KeyEvent, mut stars: u8, mut comment: String) -> Option<Modal> {
        match key.code {
            KeyCode::Left => stars = stars.saturating_sub(1),
            KeyCode::Right => stars = (stars + 1).min(5),
            KeyCode::Enter => {
                if stars == 0 {
                    self.notifications.error("Please select a rating");
                    return Some(Modal::Rating { stars, comment });
                }
                if let Some(story) = self.view.story().cloned() {
                    let api = Arc::clone(&self.api);
                    actions::spawn_action(&self.events, StoryAction::Rate, async move {
                        api.rate_story(&story, stars, comment.trim()).await
                    });
                }
                return None;
            }
            _ => edit_text(&mut comment, key),
        }
        Some(Modal::Rating { stars, comment })
    }

    fn password_key(
        &mut self,
        key: KeyEvent,
        mut fields: [String; 3],
        mut focus: usize,
    ) -> Option<Modal> {
        match key.code {
            KeyCode::Tab | KeyCode::Down => focus = (focus + 1) % fields.len(),
            KeyCode::BackTab | KeyCode::Up => focus = (focus + fields.len() - 1) % fields.len(),
            KeyCode::Enter => {
                if fields.iter().any(String::is_empty) {
                    self.notifications.error("Please fill in all fields");
                    return Some(Modal::ChangePassword { fields, focus });
                }
                if fields[1] != fields[2] {
                    self.notifications.error("Passwords do not match");
                    return Some(Modal::ChangePassword { fields, focus });
                }
                let [current_password, new_password, confirm_password] = fields;
                let change = PasswordChange {
                    current_password,
                    new_password,
                    confirm_password,
                };
                let api = Arc::clone(&self.api);
                actions::spawn_action(&self.events, StoryAction::ChangePassword, async move {
                    api.change_password(&change).await
                });
                return None;
            }
            _ => edit_text(&mut fields[focus], key),
        }
        Some(Modal::ChangePassword { fields, focus })
    }
}

/// Apply a typing key to a text field.
fn edit_text(text: &mut String, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) => text.push(c),
        KeyCode::Backspace => {
            text.pop();
        }
        _ => {}
    }
}

/// Era filter after `current`: all eras, then each era in order, then back to all.
fn next_era_filter(current: Option<&str>) -> Option<String> {
    let next = match current {
        None => ERAS.first(),
        Some(era) => ERAS
            .iter()
            .position(|e| *e == era)
            .and_then(|i| ERAS.get(i + 1)),
    };
    next.map(|era| era.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Theme, TypewriterSpeed};
    use crate::event;
    use crate::state::fake::{FakeApi, Failure};
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with(api: FakeApi, cache: Option<PathBuf>) -> (App, Arc<FakeApi>, EventReceiver) {
        let api = Arc::new(api);
        let (tx, rx) = event::channel();
        let app = App::new(
            Arc::clone(&api) as Arc<dyn StoryApi>,
            tx,
            Url::parse("http://127.0.0.1:5000/").unwrap(),
            Duration::from_secs(90),
            cache,
        );
        (app, api, rx)
    }

    async fn next_action(app: &mut App, rx: &mut EventReceiver) {
        while let Some(event) = rx.recv().await {
            let done = matches!(event, AppEvent::ActionFinished { .. });
            app.handle_event(event);
            if done {
                return;
            }
        }
    }

    #[test]
    fn test_tab_cycle() {
        let mut tab = Tab::Story;
        for _ in 0..Tab::ALL.len() {
            tab = tab.next();
        }
        assert_eq!(tab, Tab::Story);
        assert_eq!(Tab::Story.prev(), Tab::Settings);
        assert!(Tab::Story.load_request(&StoryFilter::default()).is_none());
    }

    #[test]
    fn test_era_filter_cycle() {
        assert_eq!(next_era_filter(None).as_deref(), Some(ERAS[0]));
        assert_eq!(next_era_filter(Some(ERAS[0])).as_deref(), Some(ERAS[1]));
        assert_eq!(next_era_filter(Some(ERAS[ERAS.len() - 1])), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_and_generate_from_keys() {
        let (mut app, api, mut rx) = app_with(FakeApi::default(), None);

        // Generating before choosing an era does nothing
        app.handle_key(key(KeyCode::Char('g')));
        assert_eq!(app.view.state(), crate::state::UiState::Idle);

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.view.selected_era(), Some(ERAS[1]));

        app.handle_key(key(KeyCode::Char('g')));
        while let Some(event) = rx.recv().await {
            let generated = matches!(event, AppEvent::Generated { .. });
            app.handle_event(event);
            if generated {
                break;
            }
        }
        assert_eq!(app.view.state(), crate::state::UiState::Displaying);
        assert_eq!(api.generate_calls(), 1);
        assert_eq!(
            api.generated_eras.lock().unwrap().as_slice(),
            &[ERAS[1].to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rating_requires_stars() {
        let (mut app, _api, mut rx) = app_with(FakeApi::default(), None);
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('g')));
        while let Some(event) = rx.recv().await {
            let generated = matches!(event, AppEvent::Generated { .. });
            app.handle_event(event);
            if generated {
                break;
            }
        }

        app.handle_key(key(KeyCode::Char('r')));
        app.handle_key(key(KeyCode::Enter));
        assert!(matches!(app.modal, Some(Modal::Rating { stars: 0, .. })));
        assert_eq!(
            app.notifications.current().unwrap().message,
            "Please select a rating"
        );

        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Char('!')));
        assert_eq!(
            app.modal,
            Some(Modal::Rating {
                stars: 2,
                comment: "!".to_string()
            })
        );
        app.handle_key(key(KeyCode::Enter));
        assert!(app.modal.is_none());

        next_action(&mut app, &mut rx).await;
        assert_eq!(
            app.notifications.current().unwrap().message,
            "Thank you for your rating!"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_story_actions_need_a_story() {
        let (mut app, _api, mut rx) = app_with(FakeApi::default(), None);
        app.handle_key(key(KeyCode::Char('s')));
        app.handle_key(key(KeyCode::Char('b')));
        app.handle_key(key(KeyCode::Char('r')));
        assert!(app.modal.is_none());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_save_asks_to_log_in() {
        let (mut app, _api, mut rx) = app_with(
            FakeApi {
                action_failure: Some(Failure::Unauthorized),
                ..FakeApi::default()
            },
            None,
        );
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('g')));
        while let Some(event) = rx.recv().await {
            let generated = matches!(event, AppEvent::Generated { .. });
            app.handle_event(event);
            if generated {
                break;
            }
        }

        app.handle_key(key(KeyCode::Char('s')));
        next_action(&mut app, &mut rx).await;
        let shown = app.notifications.current().unwrap();
        assert_eq!(shown.message, "Please log in to save stories");
        assert_eq!(shown.kind, NotificationKind::Info);
    }

    #[tokio::test(start_paused = true)]
    async fn test_password_mismatch_keeps_modal_open() {
        let (mut app, _api, _rx) = app_with(FakeApi::default(), None);
        app.handle_key(key(KeyCode::Char('5')));
        app.handle_key(key(KeyCode::Char('p')));

        for (field, text) in ["old", "new-one", "new-two"].iter().enumerate() {
            for c in text.chars() {
                app.handle_key(key(KeyCode::Char(c)));
            }
            if field < 2 {
                app.handle_key(key(KeyCode::Tab));
            }
        }
        app.handle_key(key(KeyCode::Enter));

        assert!(matches!(app.modal, Some(Modal::ChangePassword { .. })));
        assert_eq!(
            app.notifications.current().unwrap().message,
            "Passwords do not match"
        );

        app.handle_key(key(KeyCode::Esc));
        assert!(app.modal.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_saved_preferences_reload_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("preferences.json");
        let (mut app, api, mut rx) = app_with(FakeApi::default(), Some(cache_path.clone()));

        app.handle_key(key(KeyCode::Char('5')));
        // Theme: dark -> light
        app.handle_key(key(KeyCode::Right));
        // Speed: medium -> fast
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Right));
        // Auto-play on
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Enter));

        let expected = Preferences {
            theme: Theme::Light,
            typewriter_speed: TypewriterSpeed::Fast,
            auto_play_audio: true,
        };
        assert_eq!(app.preferences, expected);

        next_action(&mut app, &mut rx).await;
        assert_eq!(
            app.notifications.current().unwrap().message,
            "Preferences saved successfully!"
        );
        assert_eq!(api.preferences().await.unwrap(), expected);

        // A fresh app restores them from the local cache
        let (restarted, _api, _rx) = app_with(FakeApi::default(), Some(cache_path));
        assert_eq!(restarted.preferences, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_story_confirmation() {
        let (mut app, _api, mut rx) = app_with(FakeApi::default(), None);
        app.handle_key(key(KeyCode::Char('3')));
        while let Some(event) = rx.recv().await {
            let loaded = matches!(event, AppEvent::TabLoaded { .. });
            app.handle_event(event);
            if loaded {
                break;
            }
        }

        app.handle_key(key(KeyCode::Char('d')));
        assert!(matches!(
            app.modal,
            Some(Modal::ConfirmDeleteStory { id: 42, .. })
        ));
        app.handle_key(key(KeyCode::Char('y')));
        assert!(app.modal.is_none());

        next_action(&mut app, &mut rx).await;
        assert_eq!(
            app.notifications.current().unwrap().message,
            "Story deleted successfully"
        );
        // The list reloads after the deletion
        assert!(app.view.profile.stories.data.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_as_guest_keeps_local_preferences() {
        let (mut app, _api, mut rx) = app_with(FakeApi::default(), None);
        app.start(None);

        for _ in 0..2 {
            let event = rx.recv().await.unwrap();
            app.handle_event(event);
        }
        assert!(app.session_checked);
        assert!(app.user.is_none());
        assert_eq!(app.preferences, Preferences::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_account_deletion_quits() {
        let (mut app, _api, mut rx) = app_with(FakeApi::default(), None);
        app.handle_key(key(KeyCode::Char('5')));
        app.handle_key(key(KeyCode::Char('D')));
        for c in "hunter2".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));

        next_action(&mut app, &mut rx).await;
        assert!(!app.should_quit);
        while let Some(event) = rx.recv().await {
            app.handle_event(event);
            if app.should_quit {
                break;
            }
        }
        assert!(app.should_quit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_story_comes_into_view() {
        let (mut app, _api, mut rx) = app_with(FakeApi::default(), None);
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('g')));

        while let Some(event) = rx.recv().await {
            app.handle_event(event);
            let revealed = app.view.revealer().visible_text().chars().count();
            if revealed == 4 && app.story_scroll == 0 {
                app.handle_key(key(KeyCode::PageDown));
            }
            if revealed == 7 && app.view.active_tab() == Tab::Story {
                app.handle_key(key(KeyCode::Char('2')));
                assert_eq!(app.view.active_tab(), Tab::Dashboard);
                assert_eq!(app.story_scroll, 5);
            }
            if app.view.state() == crate::state::UiState::Displaying
                && !app.view.revealer().is_revealing()
            {
                break;
            }
        }

        assert_eq!(app.view.revealer().visible_text(), "Today I saw the Nile.");
        assert_eq!(app.view.active_tab(), Tab::Story);
        assert_eq!(app.story_scroll, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saved_story_opens_in_viewer() {
        let (mut app, _api, mut rx) = app_with(FakeApi::default(), None);
        app.handle_key(key(KeyCode::Char('3')));
        // Nothing to view until the list arrives
        app.handle_key(key(KeyCode::Enter));
        assert!(app.modal.is_none());

        let event = rx.recv().await.unwrap();
        app.handle_event(event);
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            app.modal,
            Some(Modal::ViewStory {
                title: "Diary Entry from The Space Race".to_string(),
                era: "The Space Race".to_string(),
                content: "Countdown again.".to_string(),
                scroll: 0,
            })
        );

        app.handle_key(key(KeyCode::Down));
        assert!(matches!(app.modal, Some(Modal::ViewStory { scroll: 1, .. })));
        app.handle_key(key(KeyCode::Esc));
        assert!(app.modal.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settings_fetch_keeps_unsaved_edits() {
        let stored = Preferences {
            theme: Theme::Auto,
            typewriter_speed: TypewriterSpeed::Slow,
            auto_play_audio: true,
        };
        let api = FakeApi {
            preferences: std::sync::Mutex::new(stored),
            ..FakeApi::default()
        };
        let (mut app, _api, mut rx) = app_with(api, None);

        // Untouched draft follows the server
        app.handle_key(key(KeyCode::Char('5')));
        let event = rx.recv().await.unwrap();
        app.handle_event(event);
        assert_eq!(app.settings_draft, stored);

        // An edit made before the fetch returns survives it
        app.handle_key(key(KeyCode::Char('1')));
        app.handle_key(key(KeyCode::Char('5')));
        app.handle_key(key(KeyCode::Right));
        let edited = app.settings_draft;
        assert_eq!(edited.theme, Theme::Light);
        let event = rx.recv().await.unwrap();
        app.handle_event(event);
        assert_eq!(app.settings_draft, edited);
    }
}
