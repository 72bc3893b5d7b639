// Audible feedback.
// Cues and ambient audio are reported through tracing; the terminal has no synthesizer.

/// Short tone played on user-visible events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Select,
    Generate,
    Success,
    Error,
    Type,
}

impl SoundCue {
    /// Nominal tone frequency in Hz.
    pub fn frequency(&self) -> u32 {
        match self {
            SoundCue::Select => 800,
            SoundCue::Generate => 600,
            SoundCue::Success => 1000,
            SoundCue::Error => 300,
            SoundCue::Type => 1200,
        }
    }

    pub fn play(self) {
        tracing::debug!(cue = ?self, hz = self.frequency(), "sound cue");
    }
}

/// Whether the reveal should click after `revealed` characters.
pub fn types_on(revealed: usize) -> bool {
    revealed > 0 && revealed % 10 == 0
}

/// Era-themed background audio.
#[derive(Debug, Default)]
pub struct AmbientAudio {
    playing: Option<String>,
}

impl AmbientAudio {
    pub fn play(&mut self, era: &str) {
        tracing::info!(era, "ambient audio started");
        self.playing = Some(era.to_string());
    }

    pub fn stop(&mut self) {
        if let Some(era) = self.playing.take() {
            tracing::info!(%era, "ambient audio stopped");
        }
    }

    /// Stop if playing, otherwise start for `era`. Returns whether audio is now on.
    pub fn toggle(&mut self, era: Option<&str>) -> bool {
        if self.playing.is_some() {
            self.stop();
            return false;
        }
        match era {
            Some(era) => {
                self.play(era);
                true
            }
            None => false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_cue_every_tenth_char() {
        let clicks: Vec<usize> = (0..=35).filter(|&n| types_on(n)).collect();
        assert_eq!(clicks, vec![10, 20, 30]);
    }

    #[test]
    fn test_ambient_toggle() {
        let mut audio = AmbientAudio::default();
        assert!(!audio.toggle(None));
        assert!(audio.toggle(Some("The Renaissance")));
        assert!(audio.is_playing());
        assert!(!audio.toggle(Some("The Renaissance")));
        assert!(!audio.is_playing());
    }

    #[test]
    fn test_frequencies() {
        assert_eq!(SoundCue::Type.frequency(), 1200);
        assert_eq!(SoundCue::Error.frequency(), 300);
    }
}
