pub mod config;
pub mod error;
pub mod http;
pub mod location;
pub mod narration;
pub mod speech;
pub mod summary;

pub use config::AppConfig;
pub use error::{GeocodeError, LocationError, NarrationError, NetworkError, PlaybackError};
pub use location::{Coordinates, Place, PlaceDescriptor};
pub use narration::{
    NarrationConfig, NarrationEvent, NarrationSnapshot, Orchestrator, OrchestratorBuilder,
    OrchestratorHandle, OrchestratorState,
};

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum YouAreHereError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for YouAreHereError {
    fn from(e: std::io::Error) -> Self {
        YouAreHereError::IOError(e.to_string())
    }
}

impl YouAreHereError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Missing proxy URL or key; nothing works until it is fixed
            YouAreHereError::ConfigError(_) => false,
            YouAreHereError::ChannelError(_) => false,
            YouAreHereError::RuntimeError(_) => false,
            // A device may come back (headphones plugged in, CarPlay reconnects)
            YouAreHereError::AudioDeviceError(_) => true,
            YouAreHereError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            YouAreHereError::ConfigError(_) => {
                "Configuration error. Please check the proxy URL and client key.".to_string()
            }
            YouAreHereError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            YouAreHereError::RuntimeError(_) => {
                "Could not start background workers. Please restart the application.".to_string()
            }
            YouAreHereError::AudioDeviceError(_) => {
                "Audio device error. Please check your speakers.".to_string()
            }
            YouAreHereError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, YouAreHereError>;
