//! Error types for the background audio controller.

use thiserror::Error;

/// Conditions the playback engine records while driving the output device.
///
/// Only [`PlaybackError::AllTracksExhausted`] is fatal; everything else is
/// recovered locally and kept around for diagnostics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// A play attempt was blocked by the browser autoplay policy.
    #[error("playback is waiting for a user gesture")]
    InteractionRequired,

    /// A track could not be fetched, decoded or started.
    #[error("failed to load \"{title}\": {reason}")]
    MediaLoad { title: String, reason: String },

    /// Every track failed once in a row.
    #[error("no playable track after {attempts} attempts")]
    AllTracksExhausted { attempts: usize },

    /// A pending operation was overtaken by a newer command.
    #[error("operation superseded by a newer command")]
    Superseded,

    #[error("track catalog is empty")]
    EmptyCatalog,
}

impl PlaybackError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PlaybackError::AllTracksExhausted { .. } | PlaybackError::EmptyCatalog
        )
    }
}

/// Why a pending play request was rejected by the output device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayRejection {
    #[error("autoplay blocked until the user interacts with the page")]
    InteractionRequired,

    #[error("play request interrupted by a newer load or pause")]
    Superseded,

    #[error("{0}")]
    Other(String),
}

impl PlayRejection {
    /// Classify a rejected `HTMLMediaElement.play()` promise by its DOMException name.
    pub fn from_dom_exception(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" => PlayRejection::InteractionRequired,
            "AbortError" => PlayRejection::Superseded,
            _ if message.trim().is_empty() => PlayRejection::Other(name.to_string()),
            _ => PlayRejection::Other(format!("{name}: {message}")),
        }
    }
}

/// Human-readable reason for a `MediaError.code` reported by the audio element.
pub fn media_error_reason(code: Option<u16>) -> &'static str {
    match code {
        Some(1) => "playback was aborted before the track loaded",
        Some(2) => "network error while loading the track",
        Some(3) => "the track could not be decoded",
        Some(4) => "no supported source was found for the track",
        _ => "unable to load the track",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_error_codes_have_reasons() {
        assert_eq!(media_error_reason(Some(2)), "network error while loading the track");
        assert_eq!(
            media_error_reason(Some(4)),
            "no supported source was found for the track"
        );
        assert_eq!(media_error_reason(Some(9)), "unable to load the track");
        assert_eq!(media_error_reason(None), "unable to load the track");
    }

    #[test]
    fn dom_exceptions_are_classified() {
        assert_eq!(
            PlayRejection::from_dom_exception("NotAllowedError", "play() failed"),
            PlayRejection::InteractionRequired
        );
        assert_eq!(
            PlayRejection::from_dom_exception("AbortError", "interrupted by a new load request"),
            PlayRejection::Superseded
        );
        assert_eq!(
            PlayRejection::from_dom_exception("NotSupportedError", "no supported source"),
            PlayRejection::Other("NotSupportedError: no supported source".to_string())
        );
        assert_eq!(
            PlayRejection::from_dom_exception("Error", " "),
            PlayRejection::Other("Error".to_string())
        );
    }

    #[test]
    fn only_exhaustion_is_fatal() {
        assert!(PlaybackError::AllTracksExhausted { attempts: 3 }.is_fatal());
        assert!(!PlaybackError::InteractionRequired.is_fatal());
        assert!(!PlaybackError::Superseded.is_fatal());
    }
}
