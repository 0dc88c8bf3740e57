use dioxus::prelude::*;
use tracing::{debug, warn};

use crate::components::{view_label, AppView, AudioControls, AudioProvider, AudioRemote};
use crate::config::SiteConfig;
use crate::db::{should_autoplay_on_enter, SettingsStore};
use crate::tracker::{track_page_visit, FirestoreSink, VisitorEvent};

/// Layout shared by every route: provides configuration, storage and the
/// background audio, and shows the enter overlay on the landing page.
#[component]
pub fn AppShell() -> Element {
    let config = use_context_provider(SiteConfig::load);
    let store = use_context_provider(SettingsStore::open_default);
    let current_view = use_route::<AppView>();
    let entered = use_signal(|| false);

    use_hook({
        let config = config.clone();
        let store = store.clone();
        move || {
            spawn(record_page_visit(config, store));
        }
    });

    let show_overlay = !entered() && matches!(current_view, AppView::Home {});
    let page_title = match current_view {
        AppView::Home {} => config.site_title.clone(),
        ref view => format!("{} | {}", view_label(view), config.site_title),
    };

    rsx! {
        document::Title { "{page_title}" }
        AudioProvider {
            header { class: "site-header",
                Link { class: "site-title", to: AppView::Home {}, "{config.site_title}" }
                AudioControls {}
            }
            main { class: "site-main", Outlet::<AppView> {} }
            if show_overlay {
                EnterOverlay { entered }
            }
        }
    }
}

/// Full-screen welcome; its button is the visitor's first gesture.
#[component]
fn EnterOverlay(mut entered: Signal<bool>) -> Element {
    let remote = use_context::<AudioRemote>();
    let store = use_context::<SettingsStore>();

    let on_enter = move |_| {
        remote.user_interacted();
        let settings = store.load_settings();
        if should_autoplay_on_enter(&settings, store.audio_preference()) {
            remote.play();
            remote.remember_playing(true);
        }
        entered.set(true);
    };

    rsx! {
        div { class: "enter-overlay",
            div { class: "enter-card",
                h1 { "Welcome" }
                p { "Background music plays while you browse. Use the speaker icon to turn it off." }
                button { class: "enter-button", onclick: on_enter, "Enter site" }
            }
        }
    }
}

async fn record_page_visit(config: SiteConfig, store: SettingsStore) {
    let sink = match FirestoreSink::from_config(&config) {
        Ok(sink) => sink,
        Err(err) => {
            debug!(%err, "page visit not recorded");
            return;
        }
    };
    match track_page_visit(&sink, store.is_admin_browser(), current_page_visit()).await {
        Ok(true) => debug!("page visit recorded"),
        Ok(false) => {}
        Err(err) => warn!(%err, "failed to record page visit"),
    }
}

#[cfg(target_arch = "wasm32")]
fn current_page_visit() -> VisitorEvent {
    let window = web_sys::window();
    let path = window
        .as_ref()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string());
    let user_agent = window
        .as_ref()
        .and_then(|w| w.navigator().user_agent().ok())
        .unwrap_or_default();
    let (width, height) = window
        .as_ref()
        .and_then(|w| w.screen().ok())
        .map(|screen| {
            (
                screen.width().unwrap_or(0).max(0) as u32,
                screen.height().unwrap_or(0).max(0) as u32,
            )
        })
        .unwrap_or((0, 0));
    VisitorEvent::page_visit(&path, &user_agent, width, height)
}

#[cfg(not(target_arch = "wasm32"))]
fn current_page_visit() -> VisitorEvent {
    VisitorEvent::page_visit("/", concat!("folio-desktop/", env!("CARGO_PKG_VERSION")), 0, 0)
}
