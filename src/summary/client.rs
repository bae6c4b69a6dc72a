use super::SummaryService;
use crate::error::NetworkError;
use crate::http::{ensure_success, join_url, CLIENT_KEY_HEADER};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Path of the summary endpoint on the proxy
pub const SUMMARY_PATH: &str = "api/claude";

#[derive(Debug, Serialize)]
struct SummaryRequest<'a> {
    prompt: &'a str,
}

/// `{"content": [{"text": "..."}, ...]}`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SummaryResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl SummaryResponse {
    /// Text of the first content block, if it has any
    pub(crate) fn into_text(self) -> Result<String, NetworkError> {
        self.content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(NetworkError::EmptyResponse)
    }
}

/// Summary service behind the app's HTTP proxy
pub struct ProxySummaryClient {
    client: reqwest::Client,
    url: String,
    client_key: String,
}

impl ProxySummaryClient {
    pub fn new(client: reqwest::Client, proxy_base_url: &str, client_key: impl Into<String>) -> Self {
        Self {
            client,
            url: join_url(proxy_base_url, SUMMARY_PATH),
            client_key: client_key.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SummaryService for ProxySummaryClient {
    async fn summarize(&self, prompt: &str) -> Result<String, NetworkError> {
        debug!("POST {} ({} char prompt)", self.url, prompt.len());

        let response = self
            .client
            .post(&self.url)
            .header(CLIENT_KEY_HEADER, &self.client_key)
            .json(&SummaryRequest { prompt })
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body: SummaryResponse = response.json().await?;
        body.into_text()
    }
}
