//! Text and vision completion collaborator.
//!
//! Workers and the summary generator talk to a language model only through
//! [`CompletionClient`]. Real implementation: [`HttpCompletionClient`].
//! Test doubles implement the trait inline.

pub mod http;

pub use http::{HttpCompletionClient, HttpCompletionConfig};

use async_trait::async_trait;

use crate::errors::CompletionError;
use crate::page::Screenshot;

/// One completion call: a prompt, optionally with images.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub prompt: String,
    pub use_vision: bool,
    pub images: Vec<Screenshot>,
}

impl CompletionRequest {
    /// Text-only request.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Attach images and switch the request to vision mode. An empty image
    /// list leaves the request text-only.
    pub fn with_images(mut self, images: impl IntoIterator<Item = Screenshot>) -> Self {
        self.images.extend(images);
        self.use_vision = !self.images.is_empty();
        self
    }
}

/// Resolves a prompt to plain text, or fails.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;

    /// Short label for logs (`"gpt-4o-mini"`, `"unavailable"`, ...).
    fn describe(&self) -> String;
}

/// A client that always fails: AI assist is switched off.
#[derive(Debug, Clone)]
pub struct UnavailableCompletion {
    reason: String,
}

impl UnavailableCompletion {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl CompletionClient for UnavailableCompletion {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
        Err(CompletionError::Unavailable(self.reason.clone()))
    }

    fn describe(&self) -> String {
        "unavailable".to_string()
    }
}
