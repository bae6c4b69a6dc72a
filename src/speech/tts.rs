//! Text-to-speech through the app's HTTP proxy
//!
//! The proxy accepts `{"text": ...}` and answers with an encoded audio
//! payload (MP3 in practice), which is handed to the player untouched.

use super::{AudioBytes, SpeechService};
use crate::error::NetworkError;
use crate::http::{ensure_success, join_url};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

/// Path of the speech endpoint on the proxy
pub const TTS_PATH: &str = "api/tts";

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
}

/// Speech synthesis behind the app's HTTP proxy
pub struct ProxySpeechClient {
    client: reqwest::Client,
    url: String,
}

impl ProxySpeechClient {
    pub fn new(client: reqwest::Client, proxy_base_url: &str) -> Self {
        Self {
            client,
            url: join_url(proxy_base_url, TTS_PATH),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SpeechService for ProxySpeechClient {
    async fn synthesize(&self, text: &str) -> Result<AudioBytes, NetworkError> {
        debug!("POST {} ({} chars)", self.url, text.len());

        let response = self
            .client
            .post(&self.url)
            .json(&TtsRequest { text })
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(NetworkError::EmptyResponse);
        }

        debug!("Received {} bytes of audio", bytes.len());
        Ok(AudioBytes::new(bytes.to_vec()))
    }
}
