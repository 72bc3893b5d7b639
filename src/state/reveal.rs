// Typewriter reveal of generated diary text.
// One job at a time: starting a new job cancels the previous job's timer in the same turn.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::api::TypewriterSpeed;
use crate::event::{AppEvent, EventSender};

/// Delay used when no preference is known.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(50);

/// Fixed inter-character delay for a speed preference.
pub fn reveal_delay(speed: TypewriterSpeed) -> Duration {
    match speed {
        TypewriterSpeed::Slow => Duration::from_millis(80),
        TypewriterSpeed::Medium => DEFAULT_REVEAL_DELAY,
        TypewriterSpeed::Fast => Duration::from_millis(20),
    }
}

/// One run of the character-by-character reveal.
#[derive(Debug)]
pub struct RevealJob {
    pub id: u64,
    chars: Vec<char>,
    /// Number of characters revealed so far.
    pub position: usize,
    pub speed: Duration,
    pub cancelled: bool,
    pub finished: bool,
    revealed: String,
}

impl RevealJob {
    fn new(id: u64, text: &str, speed: Duration) -> Self {
        let chars: Vec<char> = text.chars().collect();
        Self {
            id,
            revealed: String::with_capacity(text.len()),
            chars,
            position: 0,
            speed,
            cancelled: false,
            finished: false,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_active(&self) -> bool {
        !self.cancelled && !self.finished
    }
}

/// Result of applying one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick belonged to a replaced, cancelled, or finished job.
    Ignored,
    /// One more character is visible.
    Revealed(char),
    /// The job ran out of text. Reported once per job.
    Completed,
}

/// Drives the typewriter effect for a single output target.
#[derive(Debug)]
pub struct SequentialRevealer {
    events: EventSender,
    job: Option<RevealJob>,
    timer: Option<JoinHandle<()>>,
    next_id: u64,
}

impl SequentialRevealer {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            job: None,
            timer: None,
            next_id: 1,
        }
    }

    /// Begin revealing `text`, replacing any job in progress. Returns the job id.
    pub fn start(&mut self, text: &str, speed: Duration) -> u64 {
        self.cancel();

        let id = self.next_id;
        self.next_id += 1;
        self.job = Some(RevealJob::new(id, text, speed));
        self.timer = Some(spawn_ticker(self.events.clone(), id, speed));

        tracing::debug!(job = id, chars = text.chars().count(), ?speed, "reveal started");
        id
    }

    /// Stop the active job. Returns false when there was nothing to cancel.
    pub fn cancel(&mut self) -> bool {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        match self.job.as_mut() {
            Some(job) if job.is_active() => {
                job.cancelled = true;
                tracing::debug!(job = job.id, position = job.position, "reveal cancelled");
                true
            }
            _ => false,
        }
    }

    /// Apply a timer tick for `job_id`.
    pub fn on_tick(&mut self, job_id: u64) -> TickOutcome {
        let Some(job) = self.job.as_mut() else {
            return TickOutcome::Ignored;
        };
        if job.id != job_id || !job.is_active() {
            return TickOutcome::Ignored;
        }

        if let Some(&ch) = job.chars.get(job.position) {
            job.revealed.push(ch);
            job.position += 1;
            return TickOutcome::Revealed(ch);
        }

        job.finished = true;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        tracing::debug!(job = job.id, "reveal completed");
        TickOutcome::Completed
    }

    /// Text visible so far for the current job.
    pub fn visible_text(&self) -> &str {
        self.job.as_ref().map(|job| job.revealed.as_str()).unwrap_or("")
    }

    pub fn job(&self) -> Option<&RevealJob> {
        self.job.as_ref()
    }

    pub fn is_revealing(&self) -> bool {
        self.job.as_ref().is_some_and(RevealJob::is_active)
    }

    /// Drop the current job and its output.
    pub fn clear(&mut self) {
        self.cancel();
        self.job = None;
    }
}

impl Drop for SequentialRevealer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

fn spawn_ticker(events: EventSender, job: u64, speed: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + speed, speed);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if events.send(AppEvent::RevealTick { job }).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{self, EventReceiver};

    /// Feed ticks back into the revealer until the job completes.
    async fn run_to_completion(
        revealer: &mut SequentialRevealer,
        rx: &mut EventReceiver,
    ) -> (String, usize) {
        let mut revealed = String::new();
        let mut completions = 0;
        while let Some(event) = rx.recv().await {
            if let AppEvent::RevealTick { job } = event {
                match revealer.on_tick(job) {
                    TickOutcome::Revealed(ch) => revealed.push(ch),
                    TickOutcome::Completed => {
                        completions += 1;
                        break;
                    }
                    TickOutcome::Ignored => {}
                }
            }
        }
        (revealed, completions)
    }

    #[test]
    fn test_speed_table() {
        assert_eq!(reveal_delay(TypewriterSpeed::Slow), Duration::from_millis(80));
        assert_eq!(reveal_delay(TypewriterSpeed::Medium), Duration::from_millis(50));
        assert_eq!(reveal_delay(TypewriterSpeed::Fast), Duration::from_millis(20));
        assert_eq!(
            reveal_delay(TypewriterSpeed::from_name("warp")),
            DEFAULT_REVEAL_DELAY
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveals_one_char_per_tick() {
        let (tx, mut rx) = event::channel();
        let mut revealer = SequentialRevealer::new(tx);

        let started = Instant::now();
        let id = revealer.start("Nile", Duration::from_millis(20));

        let (revealed, completions) = run_to_completion(&mut revealer, &mut rx).await;
        assert_eq!(revealed, "Nile");
        assert_eq!(completions, 1);
        assert_eq!(revealer.visible_text(), "Nile");
        // Four characters plus the completing tick
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(100) && elapsed < Duration::from_millis(120));

        // Completion is reported once
        assert_eq!(revealer.on_tick(id), TickOutcome::Ignored);
        assert!(!revealer.is_revealing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_multibyte_text() {
        let (tx, mut rx) = event::channel();
        let mut revealer = SequentialRevealer::new(tx);
        revealer.start("Père", Duration::from_millis(5));

        let (revealed, _) = run_to_completion(&mut revealer, &mut rx).await;
        assert_eq!(revealed, "Père");
        assert_eq!(revealer.job().unwrap().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_text_completes_on_first_tick() {
        let (tx, mut rx) = event::channel();
        let mut revealer = SequentialRevealer::new(tx);
        revealer.start("", Duration::from_millis(50));

        let (revealed, completions) = run_to_completion(&mut revealer, &mut rx).await;
        assert!(revealed.is_empty());
        assert_eq!(completions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_never_leaks_previous_text() {
        let (tx, mut rx) = event::channel();
        let mut revealer = SequentialRevealer::new(tx);

        let first = revealer.start("AAAAAAAA", Duration::from_millis(10));
        // Let a few ticks of the first job queue up unprocessed
        time::sleep(Duration::from_millis(35)).await;
        assert_eq!(revealer.on_tick(first), TickOutcome::Revealed('A'));

        revealer.start("bbb", Duration::from_millis(10));
        assert_eq!(revealer.visible_text(), "");

        let (revealed, completions) = run_to_completion(&mut revealer, &mut rx).await;
        assert_eq!(revealed, "bbb");
        assert_eq!(completions, 1);
        assert_eq!(revealer.visible_text(), "bbb");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let (tx, mut rx) = event::channel();
        let mut revealer = SequentialRevealer::new(tx);

        assert!(!revealer.cancel());

        let id = revealer.start("Dear diary", Duration::from_millis(10));
        time::sleep(Duration::from_millis(25)).await;
        while let Ok(AppEvent::RevealTick { job }) = rx.try_recv() {
            revealer.on_tick(job);
        }
        let shown = revealer.visible_text().to_string();

        assert!(revealer.cancel());
        assert!(!revealer.cancel());
        assert!(!revealer.is_revealing());

        // No further ticks are applied after cancellation
        time::sleep(Duration::from_millis(100)).await;
        while let Ok(AppEvent::RevealTick { job }) = rx.try_recv() {
            assert_eq!(revealer.on_tick(job), TickOutcome::Ignored);
        }
        assert_eq!(revealer.on_tick(id), TickOutcome::Ignored);
        assert_eq!(revealer.visible_text(), shown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_drops_output() {
        let (tx, _rx) = event::channel();
        let mut revealer = SequentialRevealer::new(tx);
        revealer.start("text", Duration::from_millis(10));
        revealer.clear();
        assert!(revealer.job().is_none());
        assert_eq!(revealer.visible_text(), "");
    }
}
