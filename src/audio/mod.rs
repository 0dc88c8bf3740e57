//! Background audio controller.
//!
//! Platform independent: the browser (or any other device) is reached only
//! through [`AudioOutput`], and everything it reports comes back as an
//! [`EngineInput`].

pub mod catalog;
pub mod engine;
pub mod error;
pub mod guard;
pub mod output;
pub mod remote;
pub mod shuffle;

pub use catalog::{Catalog, Track};
pub use engine::{
    AdvanceCause, EngineInput, EngineOptions, Intent, PlaybackEngine, ResumePolicy,
    DEFAULT_VOLUME,
};
pub use error::{media_error_reason, PlayRejection, PlaybackError};
pub use guard::VisibilityGuard;
pub use output::{AudioOutput, PlayTicket, SilentAck, SilentOutput};
pub use remote::{PlaybackSnapshot, SnapshotHub, SubscriptionId, TrackPhase};
pub use shuffle::{pick_resume_index, shuffle};
