use chrono::{Duration, Utc};
use folio::tracker::{track_page_visit, EventSink, MemorySink, VisitorEvent, PAGE_VISIT};

fn event_at(detail: &str, minutes_ago: i64) -> VisitorEvent {
    VisitorEvent {
        timestamp: Utc::now() - Duration::minutes(minutes_ago),
        ..VisitorEvent::new("Click", detail, "Mozilla/5.0", "390x844")
    }
}

#[tokio::test]
async fn recent_returns_newest_first_up_to_limit() {
    let sink = MemorySink::new();
    sink.record(event_at("oldest", 30)).await.expect("record");
    sink.record(event_at("newest", 1)).await.expect("record");
    sink.record(event_at("middle", 10)).await.expect("record");

    let recent = sink.recent(2).await.expect("recent");
    let details: Vec<_> = recent.iter().map(|event| event.detail.as_str()).collect();
    assert_eq!(details, ["newest", "middle"]);
    assert_eq!(sink.len(), 3);
}

#[tokio::test]
async fn page_visit_is_skipped_for_the_admin_browser() {
    let sink = MemorySink::new();
    let visit = VisitorEvent::page_visit("/", "Mozilla/5.0", 1440, 900);

    let recorded = track_page_visit(&sink, true, visit.clone())
        .await
        .expect("track");
    assert!(!recorded);
    assert!(sink.is_empty());

    let recorded = track_page_visit(&sink, false, visit).await.expect("track");
    assert!(recorded);

    let stored = sink.recent(50).await.expect("recent");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].event_type, PAGE_VISIT);
    assert_eq!(stored[0].screen_size, "1440x900");
}

#[test]
fn display_time_is_short_and_readable() {
    let event = VisitorEvent {
        timestamp: "2025-03-04T21:15:00Z".parse().expect("timestamp"),
        ..VisitorEvent::new("Page Visit", "/", "", "0x0")
    };
    assert_eq!(event.display_time(), "Mar 4, 09:15 PM");
}

#[test]
fn events_serialize_with_camel_case_fields() {
    let event = VisitorEvent::new("Page Visit", "/", "agent", "1x1");
    let json = serde_json::to_value(&event).expect("serialize");
    assert_eq!(json["eventType"], "Page Visit");
    assert_eq!(json["screenSize"], "1x1");
    assert!(json.get("userAgent").is_some());
}
