//! Descriptive text about a place
//!
//! The narration cycle sends a fixed tour-guide prompt to a
//! [`SummaryService`] and speaks whatever text comes back.

mod client;
pub mod prompts;

pub use client::{ProxySummaryClient, SUMMARY_PATH};
pub use prompts::{narration_prompt, TOUR_GUIDE_PROMPT};

use crate::error::NetworkError;
use async_trait::async_trait;

/// Remote text generation, `POST {prompt} -> {content: [{text}]}`
///
/// Returns the summary text; an empty result is [`NetworkError::EmptyResponse`].
#[async_trait]
pub trait SummaryService: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String, NetworkError>;
}
