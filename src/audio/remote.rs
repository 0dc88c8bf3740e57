//! Read-only projection of the engine state and its change notifications.

use serde::{Deserialize, Serialize};

/// Where the current track is in its load/play cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
    Errored,
}

impl TrackPhase {
    /// Legal edges of the per-track state machine.
    pub fn can_transition_to(self, next: TrackPhase) -> bool {
        use TrackPhase::*;
        match (self, next) {
            // Any settled or failed state may start loading a new source.
            (_, Loading) => true,
            (Loading, Ready) | (Loading, Errored) => true,
            (Ready, Playing) | (Ready, Paused) | (Ready, Errored) => true,
            (Playing, Paused) | (Playing, Ended) | (Playing, Errored) => true,
            (Paused, Playing) | (Paused, Errored) | (Paused, Ended) => true,
            (Ended, Errored) => true,
            (Errored, Paused) => true,
            (from, to) => from == to,
        }
    }
}

/// What every UI surface renders. Two subscribers holding the same snapshot
/// always agree on playing/paused.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    pub current_title: String,
    pub current_index: usize,
    pub track_count: usize,
    pub volume: f64,
    pub phase: TrackPhase,
    pub has_user_interacted: bool,
    pub is_loaded: bool,
    pub is_changing_track: bool,
    pub unavailable: bool,
}

impl PlaybackSnapshot {
    /// "Track 2 of 7" style position label.
    pub fn position_label(&self) -> String {
        if self.track_count == 0 {
            return String::new();
        }
        format!("Track {} of {}", self.current_index + 1, self.track_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&PlaybackSnapshot)>;

/// Fan-out of snapshots to any number of listeners, fired only on change.
#[derive(Default)]
pub struct SnapshotHub {
    last: Option<PlaybackSnapshot>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl SnapshotHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`; it is called immediately with the latest snapshot
    /// if one has been published.
    pub fn subscribe<F>(&mut self, mut listener: F) -> SubscriptionId
    where
        F: FnMut(&PlaybackSnapshot) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        if let Some(last) = self.last.as_ref() {
            listener(last);
        }
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn latest(&self) -> Option<&PlaybackSnapshot> {
        self.last.as_ref()
    }

    /// Returns true when the snapshot differed from the last one and was sent.
    pub fn publish(&mut self, snapshot: PlaybackSnapshot) -> bool {
        if self.last.as_ref() == Some(&snapshot) {
            return false;
        }
        for (_, listener) in self.listeners.iter_mut() {
            listener(&snapshot);
        }
        self.last = Some(snapshot);
        true
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl std::fmt::Debug for SnapshotHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotHub")
            .field("last", &self.last)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn loading_cannot_jump_to_playing() {
        assert!(!TrackPhase::Loading.can_transition_to(TrackPhase::Playing));
        assert!(TrackPhase::Loading.can_transition_to(TrackPhase::Ready));
        assert!(TrackPhase::Ready.can_transition_to(TrackPhase::Playing));
        assert!(TrackPhase::Playing.can_transition_to(TrackPhase::Loading));
        assert!(!TrackPhase::Idle.can_transition_to(TrackPhase::Playing));
    }

    #[test]
    fn listeners_fire_only_on_change() {
        let mut hub = SnapshotHub::new();
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        {
            let first = first.clone();
            hub.subscribe(move |s| first.borrow_mut().push(s.is_playing));
        }
        {
            let second = second.clone();
            hub.subscribe(move |s| second.borrow_mut().push(s.is_playing));
        }

        let playing = PlaybackSnapshot {
            is_playing: true,
            ..Default::default()
        };
        assert!(hub.publish(playing.clone()));
        assert!(!hub.publish(playing));
        assert!(hub.publish(PlaybackSnapshot::default()));

        assert_eq!(*first.borrow(), vec![true, false]);
        assert_eq!(*first.borrow(), *second.borrow());
    }

    #[test]
    fn late_subscriber_gets_latest_and_can_leave() {
        let mut hub = SnapshotHub::new();
        hub.publish(PlaybackSnapshot {
            current_title: "Mi Radhika".to_string(),
            ..Default::default()
        });

        let seen = Rc::new(RefCell::new(None));
        let id = {
            let seen = seen.clone();
            hub.subscribe(move |s| *seen.borrow_mut() = Some(s.current_title.clone()))
        };
        assert_eq!(seen.borrow().as_deref(), Some("Mi Radhika"));
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn position_label_is_one_based() {
        let snapshot = PlaybackSnapshot {
            current_index: 1,
            track_count: 7,
            ..Default::default()
        };
        assert_eq!(snapshot.position_label(), "Track 2 of 7");
        assert_eq!(PlaybackSnapshot::default().position_label(), "");
    }
}
