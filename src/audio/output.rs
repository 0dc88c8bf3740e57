//! The seam between the playback engine and whatever actually makes sound.

use std::collections::VecDeque;

/// Identifies one outstanding play request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayTicket(pub u64);

/// An audio output handle driven exclusively by the playback engine.
///
/// Implementations never report results synchronously: readiness, media
/// errors and play settlements come back to the engine as separate inputs.
/// A `request_play` must eventually be answered with exactly one
/// `play_settled` carrying the same ticket.
pub trait AudioOutput {
    /// Point the device at `url` and begin buffering.
    fn set_source(&mut self, url: &str);

    /// Start playback; the outcome is reported later for `ticket`.
    fn request_play(&mut self, ticket: PlayTicket);

    fn pause(&mut self);

    fn set_volume(&mut self, volume: f64);

    /// Drop the current source and detach from the device.
    fn release(&mut self);
}

/// Acknowledgements a [`SilentOutput`] owes the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SilentAck {
    CanPlay,
    PlayResolved(PlayTicket),
}

/// Output used where no media element exists (desktop shells, server renders).
///
/// Every load becomes ready and every play resolves; the driver drains the
/// acknowledgements with [`SilentOutput::take_acks`] and feeds them back.
#[derive(Debug, Default)]
pub struct SilentOutput {
    source: Option<String>,
    volume: f64,
    playing: bool,
    acks: VecDeque<SilentAck>,
}

impl SilentOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn take_acks(&mut self) -> Vec<SilentAck> {
        self.acks.drain(..).collect()
    }
}

impl AudioOutput for SilentOutput {
    fn set_source(&mut self, url: &str) {
        self.source = Some(url.to_string());
        self.playing = false;
        self.acks.push_back(SilentAck::CanPlay);
    }

    fn request_play(&mut self, ticket: PlayTicket) {
        self.playing = true;
        self.acks.push_back(SilentAck::PlayResolved(ticket));
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn release(&mut self) {
        self.source = None;
        self.playing = false;
        self.acks.clear();
    }
}
