//! Speech synthesis and playback
//!
//! This module provides:
//! - [`SpeechService`]: text in, encoded audio out (HTTP proxy in production)
//! - [`AudioPlayer`]: plays one clip at a time and reports completion

pub mod player;
pub mod tts;

pub use player::{AudioPlayer, PlaybackCallback, PlaybackProgress, RodioPlayer};
pub use tts::{ProxySpeechClient, TTS_PATH};

use crate::error::NetworkError;
use async_trait::async_trait;

/// Encoded audio as returned by the speech service
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AudioBytes(Vec<u8>);

impl AudioBytes {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for AudioBytes {
    fn from(data: Vec<u8>) -> Self {
        Self(data)
    }
}

/// Remote speech synthesis, `POST {text} -> audio bytes`
#[async_trait]
pub trait SpeechService: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioBytes, NetworkError>;
}
