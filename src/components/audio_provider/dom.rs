use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{window, EventTarget, HtmlAudioElement};

const AUDIO_ELEMENT_ID: &str = "folio-background-audio";

/// Find the page's background `<audio>` element, creating it on first use.
pub(super) fn get_or_create_audio_element() -> Option<HtmlAudioElement> {
    let document = window()?.document()?;

    if let Some(existing) = document.get_element_by_id(AUDIO_ELEMENT_ID) {
        return existing.dyn_into::<HtmlAudioElement>().ok();
    }

    let audio: HtmlAudioElement = document.create_element("audio").ok()?.dyn_into().ok()?;
    audio.set_id(AUDIO_ELEMENT_ID);
    // Stream instead of buffering whole files.
    audio.set_attribute("preload", "metadata").ok()?;
    document.body()?.append_child(&audio).ok()?;

    Some(audio)
}

/// Event listeners attached to one target, removed together.
pub(super) struct Listeners {
    target: EventTarget,
    attached: Vec<(&'static str, Closure<dyn FnMut()>)>,
}

impl Listeners {
    pub(super) fn new(target: EventTarget) -> Self {
        Self {
            target,
            attached: Vec::new(),
        }
    }

    pub(super) fn listen<F>(&mut self, event: &'static str, callback: F)
    where
        F: FnMut() + 'static,
    {
        let closure = Closure::wrap(Box::new(callback) as Box<dyn FnMut()>);
        if self
            .target
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .is_err()
        {
            tracing::warn!(event, "failed to attach listener");
            return;
        }
        self.attached.push((event, closure));
    }

    pub(super) fn detach_all(&mut self) {
        for (event, closure) in self.attached.drain(..) {
            let _ = self
                .target
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
    }
}

impl Drop for Listeners {
    fn drop(&mut self) {
        self.detach_all();
    }
}
