//! Owns the playback engine for the lifetime of the page and exposes it to
//! components through the [`AudioRemote`] context.
//!
//! Every command, media event, visibility change and settled play promise is
//! funneled through one unbounded channel into a single task that owns the
//! engine, so the output device has exactly one writer.

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod page_events;
#[cfg(target_arch = "wasm32")]
mod web_output;

use dioxus::prelude::*;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures_util::StreamExt;
use tracing::{debug, info, warn};

use crate::audio::{
    AudioOutput, Catalog, EngineInput, EngineOptions, PlaybackEngine, PlaybackSnapshot,
    SilentOutput,
};
use crate::db::{AudioSettings, SettingsStore};

/// Command/query handle to the background audio engine.
#[derive(Clone)]
pub struct AudioRemote {
    snapshot: Signal<PlaybackSnapshot>,
    commands: UnboundedSender<EngineInput>,
    store: SettingsStore,
}

impl AudioRemote {
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.read().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.snapshot.read().is_playing
    }

    pub fn current_title(&self) -> String {
        self.snapshot.read().current_title.clone()
    }

    pub fn volume(&self) -> f64 {
        self.snapshot.read().volume
    }

    pub fn play(&self) {
        self.send(EngineInput::Play);
    }

    pub fn pause(&self) {
        self.send(EngineInput::Pause);
    }

    /// Flip playback and remember the choice for the next visit.
    pub fn toggle(&self) {
        let now_playing = !self.snapshot.peek().is_playing;
        self.send(EngineInput::Toggle);
        self.remember_playing(now_playing);
    }

    pub fn next(&self) {
        self.send(EngineInput::SkipNext);
    }

    pub fn set_volume(&self, volume: f64) {
        self.send(EngineInput::SetVolume(volume));
    }

    /// Persist the volume the visitor settled on.
    pub fn commit_volume(&self, volume: f64) {
        let Some(settings) = self.store.load_settings().with_volume(volume) else {
            return;
        };
        if let Err(err) = self.store.save_settings(&settings) {
            warn!(%err, "failed to save audio volume");
        }
    }

    pub fn user_interacted(&self) {
        self.send(EngineInput::UserInteracted);
    }

    /// Persist the "was audio on" preference.
    pub fn remember_playing(&self, playing: bool) {
        if let Err(err) = self.store.save_audio_preference(playing) {
            warn!(%err, "failed to save audio preference");
        }
    }

    fn send(&self, input: EngineInput) {
        if self.commands.unbounded_send(input).is_err() {
            debug!("audio engine has stopped, dropping command");
        }
    }
}

#[component]
pub fn AudioProvider(children: Element) -> Element {
    let store = use_context::<SettingsStore>();
    let snapshot = use_signal(PlaybackSnapshot::default);

    let remote = use_context_provider(|| {
        let (commands, inputs) = mpsc::unbounded();
        let settings = store.load_settings();
        // Root-scoped; still processes the Shutdown sent on unmount.
        dioxus::core::spawn_forever(drive_engine(settings, commands.clone(), inputs, snapshot));
        AudioRemote {
            snapshot,
            commands,
            store: store.clone(),
        }
    });

    use_drop(move || remote.send(EngineInput::Shutdown));

    rsx! {
        {children}
    }
}

async fn drive_engine(
    settings: AudioSettings,
    #[cfg_attr(not(target_arch = "wasm32"), allow(unused_variables))] commands: UnboundedSender<
        EngineInput,
    >,
    inputs: UnboundedReceiver<EngineInput>,
    snapshot: Signal<PlaybackSnapshot>,
) {
    let catalog = Catalog::default_catalog();
    let options = EngineOptions::from(&settings);

    #[cfg(target_arch = "wasm32")]
    {
        if let Some(output) = web_output::HtmlAudioOutput::attach(commands.clone()) {
            let _page_events = page_events::PageEvents::attach(commands);
            let engine = PlaybackEngine::new(output, &catalog, options);
            run_engine(engine, inputs, snapshot, |_| {}).await;
            return;
        }
        warn!("no audio element available, background audio runs silently");
    }

    let engine = PlaybackEngine::new(SilentOutput::new(), &catalog, options);
    run_engine(
        engine,
        inputs,
        snapshot,
        PlaybackEngine::<SilentOutput>::settle_silent_acks,
    )
    .await;
}

async fn run_engine<O, F>(
    mut engine: PlaybackEngine<O>,
    mut inputs: UnboundedReceiver<EngineInput>,
    mut snapshot: Signal<PlaybackSnapshot>,
    mut after_input: F,
) where
    O: AudioOutput,
    F: FnMut(&mut PlaybackEngine<O>),
{
    engine.subscribe(move |latest| {
        // The owning scope may already be gone during teardown.
        if let Ok(mut slot) = snapshot.try_write() {
            *slot = latest.clone();
        }
    });

    info!(tracks = engine.play_order().len(), "background audio ready");
    engine.load_track(0, false);
    after_input(&mut engine);

    while let Some(input) = inputs.next().await {
        if !engine.handle(input) {
            info!("background audio released");
            return;
        }
        after_input(&mut engine);
    }
    engine.release();
}
