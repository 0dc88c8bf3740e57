//! Playback engine - the single writer of output-device state.
//!
//! Every command and every asynchronous result (can-play, end of track, media
//! error, play-promise settlement, visibility change) enters through a method
//! here, usually via [`PlaybackEngine::handle`]. At most one play request is
//! outstanding; newer intents are applied when it settles instead of racing
//! a second operation against the device.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::catalog::{Catalog, Track};
use super::error::{PlayRejection, PlaybackError};
use super::guard::VisibilityGuard;
use super::output::{AudioOutput, PlayTicket, SilentAck, SilentOutput};
use super::remote::{PlaybackSnapshot, SnapshotHub, SubscriptionId, TrackPhase};
use super::shuffle::{pick_resume_index, shuffle};

pub const DEFAULT_VOLUME: f64 = 0.25;

/// What resuming from an explicit pause does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResumePolicy {
    /// Continue the paused track.
    #[default]
    Continue,
    /// Jump to a different random track.
    RandomTrack,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    pub volume: f64,
    pub resume_policy: ResumePolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            resume_policy: ResumePolicy::Continue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Play,
    Pause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceCause {
    TrackEnded,
    LoadFailed,
}

/// Everything that can drive the engine, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineInput {
    Play,
    Pause,
    Toggle,
    SkipNext,
    SetVolume(f64),
    LoadTrack {
        index: usize,
        autoplay: bool,
    },
    UserInteracted,
    CanPlay,
    Ended,
    MediaError(String),
    PlaySettled {
        ticket: PlayTicket,
        result: Result<(), PlayRejection>,
    },
    DevicePlaying,
    DevicePaused,
    PageHidden,
    PageVisible,
    Shutdown,
}

pub struct PlaybackEngine<O: AudioOutput> {
    output: O,
    order: Vec<Track>,
    current_index: usize,
    phase: TrackPhase,
    volume: f64,
    desired: Intent,
    has_user_interacted: bool,
    awaiting_gesture: bool,
    is_loaded: bool,
    is_changing_track: bool,
    in_flight: Option<PlayTicket>,
    next_ticket: u64,
    deferred_load: Option<usize>,
    consecutive_failures: usize,
    exhausted: bool,
    last_error: Option<PlaybackError>,
    resume_policy: ResumePolicy,
    guard: VisibilityGuard,
    hub: SnapshotHub,
    rng: StdRng,
}

impl<O: AudioOutput> PlaybackEngine<O> {
    /// Engine over a freshly shuffled copy of `catalog`.
    pub fn new(output: O, catalog: &Catalog, options: EngineOptions) -> Self {
        Self::with_rng(output, catalog, options, StdRng::from_entropy())
    }

    pub fn with_rng(output: O, catalog: &Catalog, options: EngineOptions, mut rng: StdRng) -> Self {
        let order = shuffle(catalog.tracks(), &mut rng);
        Self::from_order(output, order, options, rng)
    }

    /// Engine over an already decided play order.
    pub fn from_order(
        mut output: O,
        order: Vec<Track>,
        options: EngineOptions,
        rng: StdRng,
    ) -> Self {
        let volume = clamp_volume(options.volume).unwrap_or(DEFAULT_VOLUME);
        output.set_volume(volume);

        let mut engine = Self {
            output,
            order,
            current_index: 0,
            phase: TrackPhase::Idle,
            volume,
            desired: Intent::Pause,
            has_user_interacted: false,
            awaiting_gesture: false,
            is_loaded: false,
            is_changing_track: false,
            in_flight: None,
            next_ticket: 1,
            deferred_load: None,
            consecutive_failures: 0,
            exhausted: false,
            last_error: None,
            resume_policy: options.resume_policy,
            guard: VisibilityGuard::new(),
            hub: SnapshotHub::new(),
            rng,
        };
        if engine.order.is_empty() {
            warn!("starting audio engine without any tracks");
            engine.exhausted = true;
            engine.last_error = Some(PlaybackError::EmptyCatalog);
        }
        engine.publish();
        engine
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn play_order(&self) -> &[Track] {
        &self.order
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.order.get(self.current_index)
    }

    pub fn phase(&self) -> TrackPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == TrackPhase::Playing
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn intent(&self) -> Intent {
        self.desired
    }

    pub fn pending_play(&self) -> Option<PlayTicket> {
        self.in_flight
    }

    pub fn has_user_interacted(&self) -> bool {
        self.has_user_interacted
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn last_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    pub fn resume_policy(&self) -> ResumePolicy {
        self.resume_policy
    }

    pub fn set_resume_policy(&mut self, policy: ResumePolicy) {
        self.resume_policy = policy;
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            is_playing: self.is_playing(),
            current_title: self
                .current_track()
                .map(|track| track.title.clone())
                .unwrap_or_default(),
            current_index: self.current_index,
            track_count: self.order.len(),
            volume: self.volume,
            phase: self.phase,
            has_user_interacted: self.has_user_interacted,
            is_loaded: self.is_loaded,
            is_changing_track: self.is_changing_track,
            unavailable: self.exhausted,
        }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&PlaybackSnapshot) + 'static,
    {
        self.hub.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }

    /// Apply one input. Returns false once the engine has been shut down.
    pub fn handle(&mut self, input: EngineInput) -> bool {
        match input {
            EngineInput::Play => self.play(),
            EngineInput::Pause => self.pause(),
            EngineInput::Toggle => self.toggle(),
            EngineInput::SkipNext => self.skip_next(),
            EngineInput::SetVolume(volume) => self.set_volume(volume),
            EngineInput::LoadTrack { index, autoplay } => self.load_track(index, autoplay),
            EngineInput::UserInteracted => self.user_interacted(),
            EngineInput::CanPlay => self.can_play(),
            EngineInput::Ended => self.track_ended(),
            EngineInput::MediaError(reason) => self.media_error(&reason),
            EngineInput::PlaySettled { ticket, result } => self.play_settled(ticket, result),
            EngineInput::DevicePlaying => self.device_playing(),
            EngineInput::DevicePaused => self.device_paused(),
            EngineInput::PageHidden => self.page_hidden(),
            EngineInput::PageVisible => self.page_visible(),
            EngineInput::Shutdown => {
                self.release();
                return false;
            }
        }
        true
    }

    /// Point the output at `order[index]`, optionally playing once it is ready.
    pub fn load_track(&mut self, index: usize, autoplay: bool) {
        self.load_track_inner(index, autoplay);
        self.publish();
    }

    pub fn play(&mut self) {
        self.guard.user_took_control();
        self.request_playback(true);
        self.publish();
    }

    pub fn pause(&mut self) {
        self.guard.user_took_control();
        self.pause_output();
        self.publish();
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        let Some(volume) = clamp_volume(volume) else {
            warn!(volume, "ignoring non-finite volume");
            return;
        };
        self.volume = volume;
        self.output.set_volume(volume);
        self.publish();
    }

    /// User-initiated skip; keeps playing if it was playing.
    pub fn skip_next(&mut self) {
        if self.exhausted {
            debug!("skip ignored, no playable track left");
            return;
        }
        let was_playing = self.desired == Intent::Play;
        let next = (self.target_index() + 1) % self.order.len();
        info!(next, was_playing, "skipping to next track");
        self.load_track_inner(next, was_playing);
        self.publish();
    }

    /// Automatic advance after a natural end or a failed load.
    pub fn advance_to_next(&mut self, cause: AdvanceCause) {
        self.advance_inner(cause);
        self.publish();
    }

    /// A user gesture happened somewhere on the page.
    pub fn user_interacted(&mut self) {
        self.has_user_interacted = true;
        if self.awaiting_gesture {
            self.awaiting_gesture = false;
            debug!("user gesture received, retrying deferred play");
            self.issue_play_if_ready();
        }
        self.publish();
    }

    /// The output buffered enough of the current source to start.
    pub fn can_play(&mut self) {
        if self.phase != TrackPhase::Loading {
            return;
        }
        self.set_phase(TrackPhase::Ready);
        self.is_loaded = true;
        self.is_changing_track = false;
        self.issue_play_if_ready();
        self.publish();
    }

    pub fn track_ended(&mut self) {
        if !matches!(self.phase, TrackPhase::Playing | TrackPhase::Paused) {
            return;
        }
        self.set_phase(TrackPhase::Ended);
        self.consecutive_failures = 0;
        self.advance_inner(AdvanceCause::TrackEnded);
        self.publish();
    }

    pub fn media_error(&mut self, reason: &str) {
        if self.exhausted || self.phase == TrackPhase::Idle {
            return;
        }
        let title = self.current_title();
        warn!(%title, %reason, "track failed to load");
        self.last_error = Some(PlaybackError::MediaLoad {
            title,
            reason: reason.to_string(),
        });
        self.set_phase(TrackPhase::Errored);
        self.is_changing_track = false;
        self.consecutive_failures += 1;
        self.advance_inner(AdvanceCause::LoadFailed);
        self.publish();
    }

    /// Resolution of the play request identified by `ticket`.
    pub fn play_settled(&mut self, ticket: PlayTicket, result: Result<(), PlayRejection>) {
        if self.in_flight != Some(ticket) {
            debug!(ticket = ticket.0, "ignoring stale play settlement");
            return;
        }
        self.in_flight = None;
        let superseded = self.desired != Intent::Play || self.deferred_load.is_some();

        match result {
            Ok(()) if !superseded && matches!(self.phase, TrackPhase::Ready | TrackPhase::Paused) => {
                self.set_phase(TrackPhase::Playing);
                self.consecutive_failures = 0;
                self.last_error = None;
            }
            Ok(()) => {
                debug!(ticket = ticket.0, "play resolved after a newer command, pausing");
                self.output.pause();
            }
            Err(PlayRejection::InteractionRequired) => {
                debug!("play blocked by autoplay policy, waiting for a gesture");
                self.last_error = Some(PlaybackError::InteractionRequired);
                self.awaiting_gesture = self.desired == Intent::Play;
            }
            Err(PlayRejection::Superseded) => {
                debug!(ticket = ticket.0, "play request superseded");
            }
            Err(PlayRejection::Other(reason)) => {
                if matches!(self.phase, TrackPhase::Ready | TrackPhase::Paused) {
                    let title = self.current_title();
                    warn!(%title, %reason, "play request failed");
                    self.last_error = Some(PlaybackError::MediaLoad { title, reason });
                    self.set_phase(TrackPhase::Errored);
                    self.consecutive_failures += 1;
                    if self.deferred_load.is_none() {
                        self.advance_inner(AdvanceCause::LoadFailed);
                    }
                } else {
                    debug!(%reason, "play rejection after the track already failed");
                }
            }
        }

        if let Some(index) = self.deferred_load.take() {
            if !self.exhausted {
                self.start_load(index);
            }
        }
        self.publish();
    }

    /// The device started on its own (media keys, OS controls).
    pub fn device_playing(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        if matches!(self.phase, TrackPhase::Ready | TrackPhase::Paused) {
            self.guard.user_took_control();
            self.desired = Intent::Play;
            self.set_phase(TrackPhase::Playing);
            self.consecutive_failures = 0;
            self.publish();
        }
    }

    /// The device paused on its own.
    pub fn device_paused(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        if self.phase == TrackPhase::Playing {
            self.guard.user_took_control();
            self.desired = Intent::Pause;
            self.set_phase(TrackPhase::Paused);
            self.publish();
        }
    }

    pub fn page_hidden(&mut self) {
        let was_playing = self.is_playing() || self.desired == Intent::Play;
        if self.guard.hide(was_playing) {
            debug!("page hidden, pausing background audio");
            self.pause_output();
        }
        self.publish();
    }

    pub fn page_visible(&mut self) {
        if self.guard.show() {
            debug!("page visible again, resuming background audio");
            self.request_playback(false);
        } else {
            // A play requested while hidden was held back.
            self.issue_play_if_ready();
        }
        self.publish();
    }

    /// Tear down the output. The engine ignores device reports afterwards.
    pub fn release(&mut self) {
        self.output.release();
        self.phase = TrackPhase::Idle;
        self.desired = Intent::Pause;
        self.in_flight = None;
        self.deferred_load = None;
        self.is_loaded = false;
        self.is_changing_track = false;
        self.publish();
        self.hub.clear();
    }

    fn load_track_inner(&mut self, index: usize, autoplay: bool) {
        if self.order.is_empty() {
            return;
        }
        self.desired = if autoplay { Intent::Play } else { Intent::Pause };
        if !autoplay {
            self.awaiting_gesture = false;
        }
        let index = index % self.order.len();
        if self.in_flight.is_some() {
            debug!(index, "deferring load until the pending play settles");
            self.deferred_load = Some(index);
            return;
        }
        self.start_load(index);
    }

    fn start_load(&mut self, index: usize) {
        self.current_index = index;
        self.awaiting_gesture = false;
        self.set_phase(TrackPhase::Loading);
        self.is_loaded = false;
        self.is_changing_track = true;
        let url = self.order[index].url.clone();
        debug!(index, %url, "loading track");
        self.output.set_source(&url);
    }

    fn advance_inner(&mut self, cause: AdvanceCause) {
        if self.exhausted {
            return;
        }
        let len = self.order.len();
        if cause == AdvanceCause::LoadFailed && self.consecutive_failures >= len {
            self.exhaust();
            return;
        }
        let next = (self.target_index() + 1) % len;
        debug!(?cause, next, "advancing to next track");
        let autoplay = self.desired == Intent::Play;
        self.load_track_inner(next, autoplay);
    }

    fn exhaust(&mut self) {
        let attempts = self.consecutive_failures;
        error!(attempts, "no playable background track, giving up for this session");
        self.exhausted = true;
        self.desired = Intent::Pause;
        self.awaiting_gesture = false;
        self.deferred_load = None;
        self.is_changing_track = false;
        self.last_error = Some(PlaybackError::AllTracksExhausted { attempts });
        self.output.pause();
    }

    fn request_playback(&mut self, allow_fresh_pick: bool) {
        if self.exhausted {
            debug!("play ignored, no playable track left");
            return;
        }
        let resuming_from_pause =
            self.phase == TrackPhase::Paused && self.desired == Intent::Pause;
        self.desired = Intent::Play;

        if allow_fresh_pick
            && resuming_from_pause
            && self.resume_policy == ResumePolicy::RandomTrack
            && self.order.len() > 1
            && self.in_flight.is_none()
        {
            let next = pick_resume_index(self.current_index, self.order.len(), &mut self.rng);
            info!(next, "resuming on a different track");
            self.start_load(next);
            return;
        }
        self.issue_play_if_ready();
    }

    fn pause_output(&mut self) {
        self.desired = Intent::Pause;
        self.awaiting_gesture = false;
        if self.in_flight.is_some() {
            // Applied when the outstanding play settles.
            return;
        }
        if self.phase == TrackPhase::Playing {
            self.output.pause();
            self.set_phase(TrackPhase::Paused);
        }
    }

    fn issue_play_if_ready(&mut self) {
        if self.in_flight.is_some() || self.desired != Intent::Play || self.exhausted {
            return;
        }
        if self.guard.is_hidden() {
            debug!("page hidden, holding play until it is visible");
            return;
        }
        match self.phase {
            TrackPhase::Idle => self.start_load(self.current_index),
            TrackPhase::Ready | TrackPhase::Paused => {
                if !self.has_user_interacted {
                    debug!("play deferred until the first user gesture");
                    self.awaiting_gesture = true;
                    self.last_error = Some(PlaybackError::InteractionRequired);
                    return;
                }
                let ticket = PlayTicket(self.next_ticket);
                self.next_ticket += 1;
                self.in_flight = Some(ticket);
                self.output.request_play(ticket);
            }
            // Loading plays on can-play; the others are already moving on.
            TrackPhase::Loading | TrackPhase::Playing | TrackPhase::Ended | TrackPhase::Errored => {}
        }
    }

    fn set_phase(&mut self, next: TrackPhase) -> bool {
        if !self.phase.can_transition_to(next) {
            warn!(from = ?self.phase, to = ?next, "ignoring illegal playback transition");
            return false;
        }
        self.phase = next;
        true
    }

    fn target_index(&self) -> usize {
        self.deferred_load.unwrap_or(self.current_index)
    }

    fn current_title(&self) -> String {
        self.current_track()
            .map(|track| track.title.clone())
            .unwrap_or_default()
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.hub.publish(snapshot);
    }
}

impl PlaybackEngine<SilentOutput> {
    /// Feed every queued acknowledgement of the silent output back in, until
    /// the output has nothing left to report.
    pub fn settle_silent_acks(&mut self) {
        loop {
            let acks = self.output.take_acks();
            if acks.is_empty() {
                break;
            }
            for ack in acks {
                match ack {
                    SilentAck::CanPlay => self.can_play(),
                    SilentAck::PlayResolved(ticket) => self.play_settled(ticket, Ok(())),
                }
            }
        }
    }
}

fn clamp_volume(volume: f64) -> Option<f64> {
    volume.is_finite().then(|| volume.clamp(0.0, 1.0))
}

impl<O: AudioOutput + std::fmt::Debug> std::fmt::Debug for PlaybackEngine<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("output", &self.output)
            .field("current_index", &self.current_index)
            .field("phase", &self.phase)
            .field("desired", &self.desired)
            .field("in_flight", &self.in_flight)
            .field("deferred_load", &self.deferred_load)
            .field("consecutive_failures", &self.consecutive_failures)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::output::SilentOutput;

    fn engine(options: EngineOptions) -> PlaybackEngine<SilentOutput> {
        let order = vec![
            Track::new("https://media.test/a.mp3", "A"),
            Track::new("https://media.test/b.mp3", "B"),
            Track::new("https://media.test/c.mp3", "C"),
        ];
        PlaybackEngine::from_order(SilentOutput::new(), order, options, StdRng::seed_from_u64(3))
    }

    #[test]
    fn volume_is_clamped() {
        let mut engine = engine(EngineOptions::default());
        engine.set_volume(1.4);
        assert_eq!(engine.volume(), 1.0);
        engine.set_volume(-0.2);
        assert_eq!(engine.volume(), 0.0);
        engine.set_volume(f64::NAN);
        assert_eq!(engine.volume(), 0.0);
        assert_eq!(engine.output().volume(), 0.0);
    }

    #[test]
    fn initial_volume_is_applied_to_output() {
        let engine = engine(EngineOptions {
            volume: 3.0,
            resume_policy: ResumePolicy::Continue,
        });
        assert_eq!(engine.output().volume(), 1.0);
    }

    #[test]
    fn silent_output_runs_a_full_cycle() {
        let mut engine = engine(EngineOptions::default());
        engine.user_interacted();
        engine.load_track(0, true);
        engine.settle_silent_acks();
        assert!(engine.is_playing());
        assert!(engine.output().is_playing());

        engine.pause();
        assert_eq!(engine.phase(), TrackPhase::Paused);
        assert!(!engine.output().is_playing());
    }

    #[test]
    fn random_resume_policy_switches_track() {
        let mut engine = engine(EngineOptions {
            volume: 0.5,
            resume_policy: ResumePolicy::RandomTrack,
        });
        engine.user_interacted();
        engine.load_track(0, true);
        engine.settle_silent_acks();
        engine.pause();

        engine.play();
        assert_ne!(engine.current_index(), 0);
        assert_eq!(engine.phase(), TrackPhase::Loading);
        engine.settle_silent_acks();
        assert!(engine.is_playing());
    }

    #[test]
    fn visibility_resume_keeps_the_current_track_under_random_policy() {
        let mut engine = engine(EngineOptions {
            volume: 0.5,
            resume_policy: ResumePolicy::RandomTrack,
        });
        engine.user_interacted();
        engine.load_track(1, true);
        engine.settle_silent_acks();

        engine.page_hidden();
        assert_eq!(engine.phase(), TrackPhase::Paused);
        engine.page_visible();
        engine.settle_silent_acks();
        assert_eq!(engine.current_index(), 1);
        assert!(engine.is_playing());
    }

    #[test]
    fn empty_catalog_is_unavailable_from_the_start() {
        let mut engine = PlaybackEngine::from_order(
            SilentOutput::new(),
            Vec::new(),
            EngineOptions::default(),
            StdRng::seed_from_u64(1),
        );
        engine.user_interacted();
        engine.play();
        engine.skip_next();
        assert!(engine.snapshot().unavailable);
        assert_eq!(engine.last_error(), Some(&PlaybackError::EmptyCatalog));
        assert!(engine.output().source().is_none());
    }

    #[test]
    fn shutdown_stops_the_loop_and_releases_output() {
        let mut engine = engine(EngineOptions::default());
        engine.load_track(0, false);
        assert!(engine.handle(EngineInput::CanPlay));
        assert!(!engine.handle(EngineInput::Shutdown));
        assert_eq!(engine.phase(), TrackPhase::Idle);
        assert!(engine.output().source().is_none());

        // Late device errors after release are ignored.
        engine.media_error("network");
        assert!(engine.last_error().is_none());
    }
}
