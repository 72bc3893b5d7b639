// View state controller.
// Owns the generation lifecycle, the active tab, and sequencing of tab loads.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::task::JoinHandle;

use crate::api::{DiaryStory, GenerateRequest, StoryApi, StoryFilter};
use crate::app::Tab;
use crate::error::{EchoesError, Result};
use crate::event::{AppEvent, EventSender};

use super::notify::NotificationQueue;
use super::profile::{self, LoadRequest, ProfileData, TabPayload};
use super::reveal::{DEFAULT_REVEAL_DELAY, SequentialRevealer, TickOutcome};

/// Story generation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Generating,
    Displaying,
}

/// What happened to a generation response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The story is showing and its reveal has started.
    Displaying,
    /// The request failed; an error notification is up.
    Failed,
    /// The response belonged to a request that was reset away.
    Stale,
}

#[derive(Debug)]
struct InFlight {
    ticket: u64,
    task: JoinHandle<()>,
}

#[derive(Debug)]
struct PendingLoad {
    seq: u64,
    request: LoadRequest,
}

pub struct ViewStateController {
    api: Arc<dyn StoryApi>,
    events: EventSender,
    generation_timeout: Duration,
    reveal_speed: Duration,

    state: UiState,
    selected_era: Option<String>,
    story: Option<DiaryStory>,
    next_ticket: u64,
    in_flight: Option<InFlight>,
    revealer: SequentialRevealer,

    active_tab: Tab,
    load_seq: u64,
    pending_load: Option<PendingLoad>,
    pub profile: ProfileData,
}

impl ViewStateController {
    pub fn new(api: Arc<dyn StoryApi>, events: EventSender, generation_timeout: Duration) -> Self {
        Self {
            revealer: SequentialRevealer::new(events.clone()),
            api,
            events,
            generation_timeout,
            reveal_speed: DEFAULT_REVEAL_DELAY,
            state: UiState::Idle,
            selected_era: None,
            story: None,
            next_ticket: 1,
            in_flight: None,
            active_tab: Tab::default(),
            load_seq: 0,
            pending_load: None,
            profile: ProfileData::new(),
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn selected_era(&self) -> Option<&str> {
        self.selected_era.as_deref()
    }

    pub fn story(&self) -> Option<&DiaryStory> {
        self.story.as_ref()
    }

    pub fn revealer(&self) -> &SequentialRevealer {
        &self.revealer
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    /// Whether the generate action is available.
    pub fn can_generate(&self) -> bool {
        self.selected_era.is_some() && self.state != UiState::Generating
    }

    /// Inter-character delay for future reveals.
    pub fn set_reveal_speed(&mut self, speed: Duration) {
        self.reveal_speed = speed;
    }

    /// Record the era to generate for. Ignored while a generation is running.
    pub fn select_era(&mut self, era: &str) -> bool {
        if self.state == UiState::Generating {
            tracing::debug!(era, "era selection ignored while generating");
            return false;
        }
        self.selected_era = Some(era.to_string());
        tracing::debug!(era, "era selected");
        true
    }

    /// Start generating a story for the selected era.
    ///
    /// Returns the request ticket, or None when there is no era selected or a
    /// request is already in flight. Rejected calls are never queued.
    pub fn generate(&mut self) -> Option<u64> {
        if self.state == UiState::Generating {
            tracing::debug!("generate ignored: request already in flight");
            return None;
        }
        let Some(era) = self.selected_era.clone() else {
            tracing::debug!("generate ignored: no era selected");
            return None;
        };

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.state = UiState::Generating;
        self.revealer.cancel();

        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        let timeout = self.generation_timeout;
        let request = GenerateRequest::private(era.clone());
        let task = tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, api.generate_diary(&request)).await {
                Ok(result) => result,
                Err(_) => Err(EchoesError::Timeout(timeout)),
            };
            let _ = events.send(AppEvent::Generated { ticket, result });
        });
        self.in_flight = Some(InFlight { ticket, task });

        tracing::info!(%era, ticket, "story generation started");
        Some(ticket)
    }

    /// Apply a finished generation request.
    pub fn on_generated(
        &mut self,
        ticket: u64,
        result: Result<DiaryStory>,
        notifications: &mut NotificationQueue,
    ) -> GenerationOutcome {
        match &self.in_flight {
            Some(in_flight) if in_flight.ticket == ticket => {}
            _ => {
                tracing::debug!(ticket, "discarding stale generation response");
                return GenerationOutcome::Stale;
            }
        }
        self.in_flight = None;

        match result {
            Ok(story) => {
                tracing::info!(era = %story.era, chars = story.diary_entry.len(), "story generated");
                if let Some(save_error) = &story.save_error {
                    tracing::warn!(%save_error, "server could not persist generated story");
                }
                self.revealer.start(&story.diary_entry, self.reveal_speed);
                self.track("story_generated", json!({ "era": story.era }));
                self.story = Some(story);
                self.state = UiState::Displaying;
                GenerationOutcome::Displaying
            }
            Err(e) => {
                tracing::warn!(error = %e, "story generation failed");
                self.state = UiState::Idle;
                let message = match e {
                    EchoesError::Timeout(_) => "Story generation timed out. Please try again.",
                    _ => "Failed to generate story. Please try again.",
                };
                notifications.error(message);
                GenerationOutcome::Failed
            }
        }
    }

    /// Route a reveal timer tick to the revealer.
    pub fn on_reveal_tick(&mut self, job: u64) -> TickOutcome {
        self.revealer.on_tick(job)
    }

    /// Return to a blank story view. Safe to call repeatedly.
    pub fn reset(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
            tracing::info!(ticket = in_flight.ticket, "in-flight generation abandoned");
        }
        self.revealer.clear();
        self.state = UiState::Idle;
        self.selected_era = None;
        self.story = None;
    }

    /// Make `tab` visible and start its load. Returns the load sequence number.
    pub fn switch_tab(&mut self, tab: Tab) -> Option<u64> {
        self.active_tab = tab;
        let request = tab.load_request(&self.profile.story_filter)?;
        Some(self.issue_load(request))
    }

    /// Reload the story list with a new filter.
    pub fn filter_stories(&mut self, filter: StoryFilter) -> u64 {
        self.profile.story_filter = filter.clone();
        self.issue_load(LoadRequest::Stories(filter))
    }

    /// Re-issue the active tab's load.
    pub fn refresh(&mut self) -> Option<u64> {
        self.switch_tab(self.active_tab)
    }

    fn issue_load(&mut self, request: LoadRequest) -> u64 {
        self.load_seq += 1;
        let seq = self.load_seq;
        self.profile.mark_loading(&request);
        self.pending_load = Some(PendingLoad {
            seq,
            request: request.clone(),
        });

        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = profile::load(api.as_ref(), &request).await;
            let _ = events.send(AppEvent::TabLoaded { seq, result });
        });

        tracing::debug!(seq, "tab load issued");
        seq
    }

    /// Apply a finished tab load if it is the latest one issued.
    pub fn on_tab_loaded(&mut self, seq: u64, result: Result<TabPayload>) -> bool {
        if seq != self.load_seq {
            tracing::debug!(seq, latest = self.load_seq, "discarding stale tab load");
            return false;
        }
        let Some(pending) = self.pending_load.take() else {
            return false;
        };
        match result {
            Ok(payload) => self.profile.apply(payload),
            Err(e) => {
                tracing::warn!(error = %e, "tab load failed");
                self.profile.fail(&pending.request, e.to_string());
            }
        }
        true
    }

    fn track(&self, event: &'static str, data: serde_json::Value) {
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            if let Err(e) = api.track(event, data).await {
                tracing::debug!(event, error = %e, "analytics tracking failed");
            }
        });
    }
}

impl Drop for ViewStateController {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
    }
}
