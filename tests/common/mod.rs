#![allow(dead_code)]

use folio::audio::{AudioOutput, EngineOptions, PlayTicket, PlaybackEngine, Track};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetSource(String),
    RequestPlay(PlayTicket),
    Pause,
    SetVolume(f64),
    Release,
}

/// Output double that only records what the engine asked for.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub calls: Vec<Call>,
}

impl RecordingOutput {
    pub fn sources(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::SetSource(url) => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn play_requests(&self) -> Vec<PlayTicket> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::RequestPlay(ticket) => Some(*ticket),
                _ => None,
            })
            .collect()
    }

    pub fn last(&self) -> Option<&Call> {
        self.calls.last()
    }
}

impl AudioOutput for RecordingOutput {
    fn set_source(&mut self, url: &str) {
        self.calls.push(Call::SetSource(url.to_string()));
    }

    fn request_play(&mut self, ticket: PlayTicket) {
        self.calls.push(Call::RequestPlay(ticket));
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
    }

    fn set_volume(&mut self, volume: f64) {
        self.calls.push(Call::SetVolume(volume));
    }

    fn release(&mut self) {
        self.calls.push(Call::Release);
    }
}

pub fn tracks(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| {
            let name = (b'a' + (i % 26) as u8) as char;
            Track::new(format!("https://media.test/{name}{i}.mp3"), format!("Track {i}"))
        })
        .collect()
}

pub fn abc() -> Vec<Track> {
    vec![
        Track::new("a", "Aaye Na Balam"),
        Track::new("b", "Mi Radhika"),
        Track::new("c", "Miyan ki malhar"),
    ]
}

pub fn engine_with(order: Vec<Track>) -> PlaybackEngine<RecordingOutput> {
    PlaybackEngine::from_order(
        RecordingOutput::default(),
        order,
        EngineOptions::default(),
        StdRng::seed_from_u64(42),
    )
}

/// Load track 0, let it buffer and resolve the play request.
pub fn playing_engine(order: Vec<Track>) -> PlaybackEngine<RecordingOutput> {
    let mut engine = engine_with(order);
    engine.user_interacted();
    engine.load_track(0, true);
    engine.can_play();
    let ticket = engine.pending_play().expect("play requested after can-play");
    engine.play_settled(ticket, Ok(()));
    assert!(engine.is_playing());
    engine
}
