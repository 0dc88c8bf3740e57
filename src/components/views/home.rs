use dioxus::prelude::*;

use crate::components::{AudioRemote, Icon};
use crate::config::SiteConfig;

#[component]
pub fn Home() -> Element {
    let config = use_context::<SiteConfig>();
    let remote = use_context::<AudioRemote>();
    let snapshot = remote.snapshot();

    rsx! {
        section { class: "home",
            h1 { class: "home-title", "{config.site_title}" }
            if !snapshot.current_title.is_empty() && !snapshot.unavailable {
                p { class: "home-now-playing",
                    Icon { name: "music".to_string(), class: "icon-sm".to_string() }
                    span {
                        if snapshot.is_playing {
                            "Now playing: {snapshot.current_title}"
                        } else {
                            "Up next: {snapshot.current_title}"
                        }
                    }
                }
            }
        }
    }
}
