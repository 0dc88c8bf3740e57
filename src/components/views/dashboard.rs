use dioxus::prelude::*;
use tracing::warn;

use crate::components::Icon;
use crate::config::SiteConfig;
use crate::db::SettingsStore;
use crate::tracker::{EventSink, FirestoreSink, TrackerError, VisitSummary, VisitorEvent};

async fn load_recent(config: SiteConfig) -> Result<Vec<VisitorEvent>, TrackerError> {
    let sink = FirestoreSink::from_config(&config)?;
    sink.recent(config.dashboard_limit).await
}

/// PIN-gated list of the most recent visitor events.
#[component]
pub fn Dashboard() -> Element {
    let config = use_context::<SiteConfig>();
    let store = use_context::<SettingsStore>();
    let mut unlocked = use_signal(|| false);
    let mut pin = use_signal(String::new);
    let mut pin_rejected = use_signal(|| false);

    let mut events = use_resource({
        let config = config.clone();
        move || {
            let config = config.clone();
            async move {
                if !unlocked() {
                    return None;
                }
                Some(load_recent(config).await)
            }
        }
    });

    let on_submit = {
        let config = config.clone();
        move |evt: Event<FormData>| {
            evt.prevent_default();
            if config.dashboard_pin_matches(&pin()) {
                if let Err(err) = store.mark_admin_browser() {
                    warn!(%err, "failed to flag admin browser");
                }
                pin_rejected.set(false);
                unlocked.set(true);
            } else {
                pin_rejected.set(true);
            }
            pin.set(String::new());
        }
    };

    if !unlocked() {
        return rsx! {
            section { class: "dashboard-gate",
                Icon { name: "lock".to_string(), class: "icon".to_string() }
                form { onsubmit: on_submit,
                    input {
                        r#type: "password",
                        inputmode: "numeric",
                        placeholder: "PIN",
                        value: "{pin}",
                        oninput: move |e| pin.set(e.value()),
                    }
                    button { r#type: "submit", "Unlock" }
                }
                if pin_rejected() {
                    p { class: "dashboard-error", "Incorrect PIN" }
                }
            }
        };
    }

    rsx! {
        section { class: "dashboard",
            div { class: "dashboard-heading",
                h1 { "Recent visitors" }
                button {
                    class: "dashboard-refresh",
                    onclick: move |_| events.restart(),
                    "Refresh"
                }
            }
            match &*events.read() {
                Some(Some(Ok(list))) if list.is_empty() => rsx! {
                    p { class: "dashboard-empty", "No visits recorded yet." }
                },
                Some(Some(Ok(list))) => rsx! {
                    DashboardSummary { summary: VisitSummary::of(list) }
                    table { class: "dashboard-table",
                        thead {
                            tr {
                                th { "Time" }
                                th { "Event" }
                                th { "Detail" }
                                th { "Device" }
                                th { "Screen" }
                                th { "User agent" }
                            }
                        }
                        tbody {
                            for (idx, event) in list.iter().enumerate() {
                                tr {
                                    key: "{idx}",
                                    class: if event.is_download() { "dashboard-download" } else { "" },
                                    td { "{event.display_time()}" }
                                    td { "{event.event_type}" }
                                    td { "{event.detail}" }
                                    td { "{event.device_kind().label()}" }
                                    td { "{event.screen_size}" }
                                    td { class: "dashboard-agent", "{event.user_agent}" }
                                }
                            }
                        }
                    }
                },
                Some(Some(Err(err))) => rsx! {
                    p { class: "dashboard-error", "Could not load visits: {err}" }
                },
                _ => rsx! {
                    p { class: "dashboard-loading", "Loading..." }
                },
            }
        }
    }
}

#[component]
fn DashboardSummary(summary: VisitSummary) -> Element {
    rsx! {
        div { class: "dashboard-summary",
            div { class: "dashboard-stat",
                h3 { "Total hits" }
                p { "{summary.total}" }
            }
            div { class: "dashboard-stat",
                h3 { "Downloads" }
                p { "{summary.downloads}" }
            }
        }
    }
}
