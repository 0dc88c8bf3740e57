use futures::channel::mpsc::UnboundedSender;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlAudioElement;

use super::dom::{get_or_create_audio_element, Listeners};
use crate::audio::{media_error_reason, AudioOutput, EngineInput, PlayRejection, PlayTicket};

/// [`AudioOutput`] backed by the page's hidden `<audio>` element.
///
/// Media events and play-promise outcomes are forwarded to the engine task
/// as [`EngineInput`]s.
pub(super) struct HtmlAudioOutput {
    audio: HtmlAudioElement,
    inputs: UnboundedSender<EngineInput>,
    listeners: Listeners,
}

impl HtmlAudioOutput {
    pub(super) fn attach(inputs: UnboundedSender<EngineInput>) -> Option<Self> {
        let audio = get_or_create_audio_element()?;
        let mut listeners = Listeners::new(audio.clone().into());

        forward(&mut listeners, &audio, &inputs, "canplay", |_| {
            Some(EngineInput::CanPlay)
        });
        forward(&mut listeners, &audio, &inputs, "ended", |_| Some(EngineInput::Ended));
        forward(&mut listeners, &audio, &inputs, "error", |audio| {
            let code = audio.error().map(|error| error.code());
            Some(EngineInput::MediaError(media_error_reason(code).to_string()))
        });
        forward(&mut listeners, &audio, &inputs, "play", |_| {
            Some(EngineInput::DevicePlaying)
        });
        // The element pauses itself right before `ended`; that one is not a user pause.
        forward(&mut listeners, &audio, &inputs, "pause", |audio| {
            (!audio.ended()).then_some(EngineInput::DevicePaused)
        });

        Some(Self {
            audio,
            inputs,
            listeners,
        })
    }
}

fn forward<F>(
    listeners: &mut Listeners,
    audio: &HtmlAudioElement,
    inputs: &UnboundedSender<EngineInput>,
    event: &'static str,
    translate: F,
) where
    F: Fn(&HtmlAudioElement) -> Option<EngineInput> + 'static,
{
    let audio = audio.clone();
    let inputs = inputs.clone();
    listeners.listen(event, move || {
        if let Some(input) = translate(&audio) {
            let _ = inputs.unbounded_send(input);
        }
    });
}

fn classify_rejection(error: &JsValue) -> PlayRejection {
    let field = |name: &str| {
        js_sys::Reflect::get(error, &name.into())
            .ok()
            .and_then(|value| value.as_string())
            .unwrap_or_default()
    };
    PlayRejection::from_dom_exception(&field("name"), &field("message"))
}

impl AudioOutput for HtmlAudioOutput {
    fn set_source(&mut self, url: &str) {
        self.audio.set_src(url);
        self.audio.load();
    }

    fn request_play(&mut self, ticket: PlayTicket) {
        let inputs = self.inputs.clone();
        match self.audio.play() {
            Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                let result = JsFuture::from(promise)
                    .await
                    .map(|_| ())
                    .map_err(|error| classify_rejection(&error));
                let _ = inputs.unbounded_send(EngineInput::PlaySettled { ticket, result });
            }),
            Err(error) => {
                let _ = inputs.unbounded_send(EngineInput::PlaySettled {
                    ticket,
                    result: Err(classify_rejection(&error)),
                });
            }
        }
    }

    fn pause(&mut self) {
        let _ = self.audio.pause();
    }

    fn set_volume(&mut self, volume: f64) {
        self.audio.set_volume(volume);
    }

    fn release(&mut self) {
        self.listeners.detach_all();
        let _ = self.audio.pause();
        let _ = self.audio.remove_attribute("src");
        self.audio.load();
    }
}
