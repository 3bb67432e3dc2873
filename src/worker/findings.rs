//! Findings types produced by audit workers.
//!
//! ## Types
//!
//! - [`Severity`]: Severity classification with a fixed sort rank
//! - [`Issue`]: A single identified problem with location and suggestion
//! - [`Findings`]: The one record a worker produces per run
//!
//! ## Example
//!
//! ```
//! use pageaudit::worker::{Findings, Issue, Severity, WorkerIdentity};
//!
//! let identity = WorkerIdentity::new("accessibility", "Accessibility Auditor", "accessibility");
//! let findings = Findings::new(&identity)
//!     .add_issue(
//!         Issue::new(Severity::High, "Image missing alt text")
//!             .with_location("img.hero")
//!             .with_suggestion("Add a descriptive alt attribute"),
//!     )
//!     .with_confidence(0.8);
//!
//! assert_eq!(findings.issues().len(), 1);
//! assert_eq!(findings.issues()[0].source_worker(), "accessibility");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::WorkerIdentity;

/// Severity of a single issue.
///
/// `Unknown` absorbs unrecognized values parsed from completion output and
/// ranks below everything else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

impl Severity {
    /// Sort rank: critical=4, high=3, medium=2, low=1, unknown=0.
    ///
    /// # Examples
    ///
    /// ```
    /// use pageaudit::worker::Severity;
    ///
    /// assert!(Severity::Critical.rank() > Severity::High.rank());
    /// assert_eq!(Severity::Unknown.rank(), 0);
    /// ```
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Unknown => 0,
        }
    }

    /// Parse a severity label leniently, mapping common synonyms.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "critical" | "blocker" | "fatal" => Self::Critical,
            "high" | "serious" | "major" | "error" => Self::High,
            "medium" | "moderate" | "warning" => Self::Medium,
            "low" | "minor" | "info" => Self::Low,
            _ => Self::Unknown,
        }
    }

    /// Emoji indicator for terminal output.
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Critical => "🔴",
            Self::High => "🟠",
            Self::Medium => "🟡",
            Self::Low => "🔵",
            Self::Unknown => "⚪",
        }
    }

    /// All severities in descending rank order.
    pub fn all() -> [Self; 5] {
        [
            Self::Critical,
            Self::High,
            Self::Medium,
            Self::Low,
            Self::Unknown,
        ]
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    /// Strict parse of a severity name or synonym; unlike
    /// [`Severity::parse_lenient`], unrecognized labels are an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::parse_lenient(s) {
            Self::Unknown if !s.trim().eq_ignore_ascii_case("unknown") => Err(format!(
                "unknown severity '{}': expected critical, high, medium or low",
                s
            )),
            severity => Ok(severity),
        }
    }
}

/// A single problem found on the page.
///
/// Immutable once created; `source_worker` is stamped when the issue is added
/// to a [`Findings`] record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    severity: Severity,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    suggestion: String,
    #[serde(default)]
    source_worker: String,
}

impl Issue {
    pub fn new(severity: Severity, title: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            description: String::new(),
            location: String::new(),
            suggestion: String::new(),
            source_worker: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Where on the page the issue is (selector, URL fragment, region).
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn suggestion(&self) -> &str {
        &self.suggestion
    }

    pub fn source_worker(&self) -> &str {
        &self.source_worker
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }

    /// Key used to spot the same issue reported twice.
    pub fn dedup_key(&self) -> (Severity, String, String) {
        (
            self.severity,
            self.title.trim().to_lowercase(),
            self.location.trim().to_lowercase(),
        )
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.severity.emoji(), self.severity, self.title)?;
        if !self.location.is_empty() {
            write!(f, " @ {}", self.location)?;
        }
        if !self.suggestion.is_empty() {
            write!(f, " (suggestion: {})", self.suggestion)?;
        }
        Ok(())
    }
}

/// The single result a worker produces for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Findings {
    worker_id: String,
    worker_name: String,
    category: String,
    #[serde(default)]
    issues: Vec<Issue>,
    #[serde(default)]
    suggestions: Vec<String>,
    confidence: f64,
    #[serde(default)]
    analysis_time_ms: u64,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl Findings {
    /// Create an empty findings record for a worker, at full confidence.
    pub fn new(identity: &WorkerIdentity) -> Self {
        Self {
            worker_id: identity.id().to_string(),
            worker_name: identity.name().to_string(),
            category: identity.category().to_string(),
            issues: Vec::new(),
            suggestions: Vec::new(),
            confidence: 1.0,
            analysis_time_ms: 0,
            metadata: serde_json::Map::new(),
        }
    }

    /// Findings substituted for a worker whose analysis failed.
    ///
    /// # Examples
    ///
    /// ```
    /// use pageaudit::worker::{Findings, WorkerIdentity};
    ///
    /// let identity = WorkerIdentity::new("seo", "SEO Analyst", "seo");
    /// let findings = Findings::degraded(&identity, "connection reset");
    ///
    /// assert_eq!(findings.confidence(), 0.0);
    /// assert!(findings.issues().is_empty());
    /// assert_eq!(findings.suggestions(), ["Worker failed: connection reset"]);
    /// assert!(findings.is_degraded());
    /// ```
    pub fn degraded(identity: &WorkerIdentity, reason: &str) -> Self {
        Self::new(identity)
            .with_confidence(0.0)
            .add_suggestion(format!("Worker failed: {}", reason))
            .with_metadata("degraded", serde_json::Value::Bool(true))
            .with_metadata("reason", serde_json::Value::String(reason.to_string()))
    }

    /// Add an issue, stamping it with this worker as its source.
    pub fn add_issue(mut self, mut issue: Issue) -> Self {
        issue.source_worker = self.worker_id.clone();
        self.issues.push(issue);
        self
    }

    pub fn add_issues(self, issues: impl IntoIterator<Item = Issue>) -> Self {
        issues.into_iter().fold(self, Self::add_issue)
    }

    pub fn add_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn add_suggestions(mut self, suggestions: impl IntoIterator<Item = String>) -> Self {
        self.suggestions.extend(suggestions);
        self
    }

    /// Set the confidence. Finite values are clamped to `[0, 1]`; non-finite
    /// values are kept so the coordinator can reject them.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            confidence
        };
        self
    }

    pub fn with_analysis_time_ms(mut self, ms: u64) -> Self {
        self.analysis_time_ms = ms;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn worker_name(&self) -> &str {
        &self.worker_name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn analysis_time_ms(&self) -> u64 {
        self.analysis_time_ms
    }

    pub fn metadata(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.metadata
    }

    /// Whether this record stands in for a failed worker.
    pub fn is_degraded(&self) -> bool {
        self.metadata
            .get("degraded")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

impl fmt::Display for Findings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} [{}]: {} issue(s), confidence {:.0}%",
            self.worker_name,
            self.category,
            self.issues.len(),
            self.confidence * 100.0
        )?;
        for issue in &self.issues {
            writeln!(f, "    {}", issue)?;
        }
        for suggestion in &self.suggestions {
            writeln!(f, "    - {}", suggestion)?;
        }
        Ok(())
    }
}
