//! Immutable snapshot of the page under audit.
//!
//! A [`PageContext`] is built once per run and shared by `Arc` with every
//! worker. Nothing mutates it after [`PageContextBuilder::build`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::errors::PageError;
use crate::util::truncate_chars;

/// Browser viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether this viewport is narrow enough to be a mobile layout.
    pub fn is_mobile(&self) -> bool {
        self.width < 768
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 800)
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Viewport {
    type Err = PageError;

    /// Parse `"1280x800"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PageError::InvalidViewport(s.to_string());
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self::new(width, height))
    }
}

/// Serialized DOM (or extracted content) captured by the input collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomSnapshot {
    html: String,
}

impl DomSnapshot {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }

    /// Size of the snapshot in bytes.
    pub fn len(&self) -> usize {
        self.html.len()
    }

    /// At most `max_chars` characters of the snapshot, for prompts.
    pub fn excerpt(&self, max_chars: usize) -> &str {
        truncate_chars(&self.html, max_chars)
    }

    /// Whether [`Self::excerpt`] with `max_chars` drops content.
    pub fn is_truncated_at(&self, max_chars: usize) -> bool {
        self.html.chars().nth(max_chars).is_some()
    }
}

/// A captured screenshot image.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    media_type: String,
    #[serde(with = "base64_bytes")]
    data: Vec<u8>,
}

impl Screenshot {
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    /// Read an image file, inferring the media type from its extension.
    pub fn from_file(path: &Path) -> Result<Self, PageError> {
        let data = std::fs::read(path).map_err(|source| PageError::ScreenshotRead {
            path: path.to_path_buf(),
            source,
        })?;
        let media_type = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("webp") => "image/webp",
            Some("gif") => "image/gif",
            _ => "image/png",
        };
        Ok(Self::new(media_type, data))
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// `data:` URL suitable for vision completion requests.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, BASE64.encode(&self.data))
    }
}

impl fmt::Debug for Screenshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screenshot")
            .field("media_type", &self.media_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Read-only input shared by every worker in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    url: String,
    title: String,
    dom_snapshot: DomSnapshot,
    #[serde(default)]
    screenshots: Vec<Screenshot>,
    viewport: Viewport,
}

impl PageContext {
    /// Start building a context for `url`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pageaudit::page::{DomSnapshot, PageContext, Viewport};
    ///
    /// let page = PageContext::builder("https://example.com")
    ///     .title("Example Domain")
    ///     .dom_snapshot(DomSnapshot::new("<html><body><h1>Example</h1></body></html>"))
    ///     .viewport(Viewport::new(390, 844))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(page.title(), "Example Domain");
    /// assert!(page.viewport().is_mobile());
    /// ```
    pub fn builder(url: impl Into<String>) -> PageContextBuilder {
        PageContextBuilder {
            url: url.into(),
            title: String::new(),
            dom_snapshot: DomSnapshot::default(),
            screenshots: Vec::new(),
            viewport: Viewport::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn dom_snapshot(&self) -> &DomSnapshot {
        &self.dom_snapshot
    }

    pub fn screenshots(&self) -> &[Screenshot] {
        &self.screenshots
    }

    pub fn has_screenshots(&self) -> bool {
        !self.screenshots.is_empty()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

/// Builder for [`PageContext`].
#[derive(Debug, Clone)]
pub struct PageContextBuilder {
    url: String,
    title: String,
    dom_snapshot: DomSnapshot,
    screenshots: Vec<Screenshot>,
    viewport: Viewport,
}

impl PageContextBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn dom_snapshot(mut self, snapshot: DomSnapshot) -> Self {
        self.dom_snapshot = snapshot;
        self
    }

    pub fn screenshot(mut self, screenshot: Screenshot) -> Self {
        self.screenshots.push(screenshot);
        self
    }

    pub fn screenshots(mut self, screenshots: impl IntoIterator<Item = Screenshot>) -> Self {
        self.screenshots.extend(screenshots);
        self
    }

    pub fn viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Validate and freeze the context.
    pub fn build(self) -> Result<PageContext, PageError> {
        let url = self.url.trim().to_string();
        if url.is_empty() {
            return Err(PageError::EmptyUrl);
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(PageError::InvalidViewport(self.viewport.to_string()));
        }
        Ok(PageContext {
            url,
            title: self.title,
            dom_snapshot: self.dom_snapshot,
            screenshots: self.screenshots,
            viewport: self.viewport,
        })
    }
}
