//! Error taxonomy for the narration cycle
//!
//! Each collaborator reports its own error type. The orchestrator folds
//! them into a [`NarrationError`], whose `Display` text becomes the reason
//! carried by `OrchestratorState::Failed`.

use thiserror::Error;

/// Failure to obtain a location fix
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// The user (or platform) refused location access
    #[error("Location permission denied")]
    PermissionDenied,

    /// No fix could be produced in time
    #[error("Timed out waiting for a location fix")]
    Timeout,

    /// No location source is configured or available
    #[error("Location unavailable")]
    Unavailable,

    /// Any other failure reported by the location source
    #[error("{0}")]
    Failed(String),
}

/// Failure to turn coordinates into a place
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeocodeError {
    /// The reverse lookup itself failed
    #[error("Reverse geocoding failed: {0}")]
    Lookup(String),

    /// The lookup succeeded but described nothing usable
    #[error("No place found")]
    NoResult,
}

/// Failure talking to the summary or speech proxy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Connection, TLS, timeout or other transport-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("Server returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The body could not be decoded
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The body decoded but carried no content
    #[error("Empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for NetworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            NetworkError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            NetworkError::Status {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            NetworkError::Transport(e.to_string())
        }
    }
}

/// Failure to play synthesized audio
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// The audio payload could not be decoded
    #[error("could not decode audio: {0}")]
    Decode(String),

    /// No output device, or the device stopped responding
    #[error("audio output unavailable: {0}")]
    Device(String),
}

/// Why a narration cycle ended in `Failed`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NarrationError {
    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error("No summary found.")]
    NoSummary,

    #[error("Summary error: {0}")]
    Summary(NetworkError),

    #[error("No narration audio.")]
    NoAudio,

    #[error("Speech error: {0}")]
    Speech(NetworkError),

    #[error("Audio playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Narration cancelled.")]
    Cancelled,
}

impl NarrationError {
    /// Classify a failure from the summary step
    pub fn from_summary(e: NetworkError) -> Self {
        match e {
            NetworkError::EmptyResponse => NarrationError::NoSummary,
            other => NarrationError::Summary(other),
        }
    }

    /// Classify a failure from the speech step
    pub fn from_speech(e: NetworkError) -> Self {
        match e {
            NetworkError::EmptyResponse => NarrationError::NoAudio,
            other => NarrationError::Speech(other),
        }
    }
}
