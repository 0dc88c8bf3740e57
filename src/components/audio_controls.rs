use dioxus::prelude::*;

use crate::components::{audio_icon_name, AudioRemote, Icon};

/// Volume in `[0, 1]` from the 0-100 range input.
fn slider_volume(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|val| val.is_finite())
        .map(|val| (val / 100.0).clamp(0.0, 1.0))
}

/// Header speaker button with a hover popover for the background music.
#[component]
pub fn AudioControls() -> Element {
    let remote = use_context::<AudioRemote>();
    let snapshot = remote.snapshot();
    let mut popover_open = use_signal(|| false);

    let icon = audio_icon_name(snapshot.is_playing, snapshot.unavailable, snapshot.volume);
    let toggle_label = if snapshot.is_playing {
        "Pause background music"
    } else {
        "Play background music"
    };
    let volume_percent = (snapshot.volume * 100.0).round() as i32;

    let on_toggle = {
        let remote = remote.clone();
        move |_| remote.toggle()
    };
    let on_popover_toggle = {
        let remote = remote.clone();
        move |_| remote.toggle()
    };
    let on_next = {
        let remote = remote.clone();
        move |_| remote.next()
    };
    let on_volume_input = {
        let remote = remote.clone();
        move |e: Event<FormData>| {
            if let Some(volume) = slider_volume(&e.value()) {
                remote.set_volume(volume);
            }
        }
    };
    let on_volume_commit = {
        let remote = remote.clone();
        move |e: Event<FormData>| {
            if let Some(volume) = slider_volume(&e.value()) {
                remote.set_volume(volume);
                remote.commit_volume(volume);
            }
        }
    };

    rsx! {
        div {
            class: "audio-controls",
            onmouseenter: move |_| popover_open.set(true),
            onmouseleave: move |_| popover_open.set(false),
            button {
                class: if snapshot.is_playing { "audio-toggle playing" } else { "audio-toggle" },
                aria_label: "{toggle_label}",
                title: "{toggle_label}",
                disabled: snapshot.unavailable,
                onclick: on_toggle,
                Icon { name: icon.to_string(), class: "icon".to_string() }
            }
            if popover_open() {
                div { class: "audio-popover",
                    div { class: "audio-now-playing",
                        Icon { name: "music".to_string(), class: "icon-sm".to_string() }
                        div {
                            p { class: "audio-title",
                                if snapshot.unavailable {
                                    "Music unavailable"
                                } else if snapshot.current_title.is_empty() {
                                    "Loading..."
                                } else {
                                    "{snapshot.current_title}"
                                }
                            }
                            p { class: "audio-position", "{snapshot.position_label()}" }
                        }
                    }
                    div { class: "audio-buttons",
                        button {
                            class: "audio-button",
                            aria_label: "{toggle_label}",
                            disabled: snapshot.unavailable,
                            onclick: on_popover_toggle,
                            Icon {
                                name: if snapshot.is_playing { "pause".to_string() } else { "play".to_string() },
                                class: "icon-sm".to_string(),
                            }
                        }
                        button {
                            class: "audio-button",
                            aria_label: "Next track",
                            disabled: snapshot.unavailable || snapshot.is_changing_track,
                            onclick: on_next,
                            Icon { name: "next".to_string(), class: "icon-sm".to_string() }
                        }
                    }
                    label { class: "audio-volume",
                        span { "Volume" }
                        input {
                            r#type: "range",
                            min: "0",
                            max: "100",
                            value: volume_percent,
                            oninput: on_volume_input,
                            onchange: on_volume_commit,
                        }
                        span { class: "audio-volume-value", "{volume_percent}%" }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::slider_volume;

    #[test]
    fn slider_values_map_to_volume() {
        assert_eq!(slider_volume("25"), Some(0.25));
        assert_eq!(slider_volume("140"), Some(1.0));
        assert_eq!(slider_volume("-3"), Some(0.0));
        assert_eq!(slider_volume("loud"), None);
    }
}
