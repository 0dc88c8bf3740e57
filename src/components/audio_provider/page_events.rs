use futures::channel::mpsc::UnboundedSender;
use web_sys::window;

use super::dom::Listeners;
use crate::audio::EngineInput;

const GESTURE_EVENTS: [&str; 3] = ["click", "keydown", "touchstart"];

/// Document-level listeners: tab visibility and user gestures.
/// Dropping the value detaches them.
pub(super) struct PageEvents {
    _listeners: Listeners,
}

impl PageEvents {
    pub(super) fn attach(inputs: UnboundedSender<EngineInput>) -> Option<Self> {
        let document = window()?.document()?;
        let mut listeners = Listeners::new(document.clone().into());

        {
            let inputs = inputs.clone();
            listeners.listen("visibilitychange", move || {
                let input = if document.hidden() {
                    EngineInput::PageHidden
                } else {
                    EngineInput::PageVisible
                };
                let _ = inputs.unbounded_send(input);
            });
        }

        // Forwarded on every gesture; a play blocked by autoplay policy retries on each.
        for event in GESTURE_EVENTS {
            let inputs = inputs.clone();
            listeners.listen(event, move || {
                let _ = inputs.unbounded_send(EngineInput::UserInteracted);
            });
        }

        Some(Self {
            _listeners: listeners,
        })
    }
}
