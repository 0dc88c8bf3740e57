/// Remembers whether the page was audible when it went into the background.
///
/// The flag is captured at hide time from the engine's live state, so a
/// resume on show only happens for playback the engine itself interrupted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VisibilityGuard {
    hidden: bool,
    resume_on_show: bool,
}

impl VisibilityGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Record a hide. Returns true when the caller should pause the output.
    pub fn hide(&mut self, was_playing: bool) -> bool {
        if self.hidden {
            return false;
        }
        self.hidden = true;
        self.resume_on_show = was_playing;
        was_playing
    }

    /// Record a show. Returns true when playback should be requested again.
    pub fn show(&mut self) -> bool {
        if !self.hidden {
            return false;
        }
        self.hidden = false;
        std::mem::take(&mut self.resume_on_show)
    }

    /// An explicit user command while hidden overrides the automatic resume.
    pub fn user_took_control(&mut self) {
        self.resume_on_show = false;
    }
}
