//! AI-backed specialist worker.
//!
//! A [`SpecialistWorker`] prompts the completion collaborator with the page
//! context and its focus areas, then maps the JSON reply onto [`Findings`].
//! Completion failures never escape `analyze`: they turn into low-confidence
//! findings carrying a fallback suggestion.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{AuditWorker, Findings, Issue, Severity, SpecialistKind, WorkerIdentity, WorkerReporter};
use crate::completion::{CompletionClient, CompletionRequest};
use crate::errors::WorkerError;
use crate::page::PageContext;
use crate::util::extract_json;

/// Characters of DOM included in a prompt.
pub const DOM_EXCERPT_CHARS: usize = 12_000;

/// Confidence reported when the completion call itself failed.
pub const COMPLETION_FAILED_CONFIDENCE: f64 = 0.3;

/// Confidence reported when the reply could not be parsed.
pub const UNPARSEABLE_CONFIDENCE: f64 = 0.4;

/// Topic answered by the coordinator with a settled peer's findings.
pub const PEER_FINDINGS_TOPIC: &str = "peer_findings";

pub struct SpecialistWorker {
    kind: SpecialistKind,
    identity: WorkerIdentity,
    custom_focus_areas: Vec<String>,
    peers: Vec<String>,
    client: Arc<dyn CompletionClient>,
}

impl SpecialistWorker {
    pub fn new(kind: SpecialistKind, client: Arc<dyn CompletionClient>) -> Self {
        let identity = WorkerIdentity::new(kind.worker_id(), kind.display_name(), kind.category());
        Self {
            kind,
            identity,
            custom_focus_areas: Vec::new(),
            peers: Vec::new(),
            client,
        }
    }

    /// Replace the kind's default focus areas. An empty list keeps the defaults.
    pub fn with_focus_areas(mut self, areas: Vec<String>) -> Self {
        self.custom_focus_areas = areas;
        self
    }

    /// Ask for these workers' findings before prompting and include whatever
    /// has settled by then.
    pub fn with_peers(mut self, peers: Vec<String>) -> Self {
        self.peers = peers;
        self
    }

    pub fn kind(&self) -> &SpecialistKind {
        &self.kind
    }

    pub fn focus_areas(&self) -> Vec<&str> {
        if self.custom_focus_areas.is_empty() {
            self.kind.focus_areas()
        } else {
            self.custom_focus_areas.iter().map(|s| s.as_str()).collect()
        }
    }

    async fn collect_peer_notes(&self, reporter: &WorkerReporter) -> Vec<String> {
        let mut notes = Vec::new();
        for peer in &self.peers {
            match reporter.ask(PEER_FINDINGS_TOPIC, peer).await {
                Ok(answer) => {
                    if let Ok(findings) = serde_json::from_str::<Findings>(&answer) {
                        notes.extend(findings.issues().iter().map(|issue| {
                            format!("[{}] {} ({})", issue.severity(), issue.title(), peer)
                        }));
                    }
                }
                Err(e) => {
                    tracing::debug!(worker = %self.identity.id(), peer = %peer, "no peer findings: {}", e);
                }
            }
        }
        notes
    }

    fn findings_from_response(&self, response: &str) -> Findings {
        match parse_specialist_response(response) {
            Some(parsed) => Findings::new(&self.identity)
                .add_issues(parsed.issues)
                .add_suggestions(parsed.suggestions)
                .with_confidence(parsed.confidence)
                .with_metadata("source", Value::String("ai".to_string())),
            None => {
                tracing::warn!(worker = %self.identity.id(), "could not parse completion output");
                Findings::new(&self.identity)
                    .with_confidence(UNPARSEABLE_CONFIDENCE)
                    .add_suggestion("AI response could not be parsed; review this area manually")
                    .with_metadata(
                        "raw_response",
                        Value::String(crate::util::truncate_chars(response, 2_000).to_string()),
                    )
            }
        }
    }
}

#[async_trait]
impl AuditWorker for SpecialistWorker {
    fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    async fn analyze(
        &self,
        page: &PageContext,
        reporter: &WorkerReporter,
    ) -> Result<Findings, WorkerError> {
        reporter.progress(5, "preparing prompt");
        let peer_notes = self.collect_peer_notes(reporter).await;
        let prompt = build_specialist_prompt(
            self.kind.display_name(),
            &self.focus_areas(),
            page,
            &peer_notes,
        );

        let mut request = CompletionRequest::text(prompt);
        if self.kind.uses_vision() && page.has_screenshots() {
            request = request.with_images(page.screenshots().iter().cloned());
        }

        reporter.progress(20, "waiting for analysis");
        let findings = match self.client.complete(request).await {
            Ok(response) => {
                reporter.progress(80, "parsing analysis");
                self.findings_from_response(&response)
            }
            Err(e) => {
                tracing::warn!(
                    worker = %self.identity.id(),
                    client = %self.client.describe(),
                    "completion failed: {}",
                    e
                );
                Findings::new(&self.identity)
                    .with_confidence(COMPLETION_FAILED_CONFIDENCE)
                    .add_suggestion(format!(
                        "AI analysis unavailable; run a manual {} review",
                        self.identity.category()
                    ))
                    .with_metadata("ai_error", Value::String(e.to_string()))
            }
        };

        Ok(findings)
    }
}

/// Result of parsing a specialist's JSON reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAudit {
    pub issues: Vec<Issue>,
    pub suggestions: Vec<String>,
    pub confidence: f64,
}

/// Build the prompt sent to the completion collaborator.
pub fn build_specialist_prompt(
    specialist: &str,
    focus_areas: &[&str],
    page: &PageContext,
    peer_notes: &[String],
) -> String {
    let focus = focus_areas
        .iter()
        .map(|a| format!("- {}", a))
        .collect::<Vec<_>>()
        .join("\n");

    let dom = page.dom_snapshot();
    let dom_section = if dom.is_empty() {
        "(no DOM snapshot captured)".to_string()
    } else {
        let note = if dom.is_truncated_at(DOM_EXCERPT_CHARS) {
            format!("\n(truncated; full snapshot is {} bytes)", dom.len())
        } else {
            String::new()
        };
        format!("```html\n{}\n```{}", dom.excerpt(DOM_EXCERPT_CHARS), note)
    };

    let peer_section = if peer_notes.is_empty() {
        String::new()
    } else {
        format!(
            "\n## Already Reported By Other Auditors\nAvoid repeating these:\n{}\n",
            peer_notes
                .iter()
                .map(|n| format!("- {}", n))
                .collect::<Vec<_>>()
                .join("\n")
        )
    };

    let screenshots = if page.has_screenshots() {
        format!("{} attached", page.screenshots().len())
    } else {
        "none".to_string()
    };

    format!(
        r#"# {specialist}

You are auditing a webpage. Report concrete, verifiable problems only.

## Page
- URL: {url}
- Title: {title}
- Viewport: {viewport}{mobile}
- Screenshots: {screenshots}

## Focus Areas
{focus}
{peer_section}
## DOM Snapshot
{dom_section}

## Output

Respond with ONLY a JSON object in this exact format:

```json
{{
  "confidence": 0.0-1.0,
  "issues": [
    {{
      "severity": "critical|high|medium|low",
      "title": "Short problem statement",
      "description": "What is wrong and who it affects",
      "location": "CSS selector or page region",
      "suggestion": "How to fix it"
    }}
  ],
  "suggestions": ["General improvement not tied to one element"]
}}
```
"#,
        specialist = specialist,
        url = page.url(),
        title = if page.title().is_empty() { "(none)" } else { page.title() },
        viewport = page.viewport(),
        mobile = if page.viewport().is_mobile() { " (mobile)" } else { "" },
        screenshots = screenshots,
        focus = focus,
        peer_section = peer_section,
        dom_section = dom_section,
    )
}

/// Parse a specialist reply. Returns `None` when no usable JSON object is
/// found; individual malformed issues are skipped.
pub fn parse_specialist_response(response: &str) -> Option<ParsedAudit> {
    let json_str = extract_json(response)?;
    let value: Value = serde_json::from_str(&json_str).ok()?;
    let object = value.as_object()?;

    let issues = object
        .get("issues")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(parse_issue).collect())
        .unwrap_or_default();

    let suggestions = object
        .get("suggestions")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|s| s.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let confidence = object
        .get("confidence")
        .and_then(|v| v.as_f64())
        .filter(|c| c.is_finite())
        .unwrap_or(0.7)
        .clamp(0.0, 1.0);

    Some(ParsedAudit {
        issues,
        suggestions,
        confidence,
    })
}

fn parse_issue(value: &Value) -> Option<Issue> {
    fn field<'a>(value: &'a Value, name: &str) -> &'a str {
        value.get(name).and_then(|v| v.as_str()).unwrap_or("").trim()
    }

    let title = field(value, "title");
    if title.is_empty() {
        return None;
    }
    Some(
        Issue::new(Severity::parse_lenient(field(value, "severity")), title)
            .with_description(field(value, "description"))
            .with_location(field(value, "location"))
            .with_suggestion(field(value, "suggestion")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{EventBus, RequestBroker, serve_questions};
    use crate::errors::CompletionError;
    use crate::page::{DomSnapshot, Screenshot, Viewport};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Completion double that records requests and replies from a script.
    struct ScriptedCompletion {
        reply: Result<String, String>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedCompletion {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(reason.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedCompletion {
        async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
            self.requests.lock().unwrap().push(request);
            self.reply
                .clone()
                .map_err(CompletionError::Unavailable)
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn page() -> PageContext {
        PageContext::builder("https://shop.example")
            .title("Shop")
            .dom_snapshot(DomSnapshot::new("<img src=\"hero.png\">"))
            .build()
            .unwrap()
    }

    fn reporter_for(worker: &SpecialistWorker, bus: &EventBus) -> WorkerReporter {
        WorkerReporter::new(
            worker.identity().clone(),
            bus.clone(),
            Arc::new(RequestBroker::attach(bus)),
        )
        .with_question_timeout(Duration::from_millis(20))
    }

    const REPLY: &str = r#"Here you go:
```json
{
  "confidence": 0.85,
  "issues": [
    {"severity": "serious", "title": "Hero image has no alt text", "location": "img[src='hero.png']", "suggestion": "Add alt"},
    {"severity": "low", "title": "  "},
    {"severity": "bogus", "title": "Odd severity"}
  ],
  "suggestions": ["Run an automated contrast check", ""]
}
```"#;

    #[test]
    fn test_parse_specialist_response() {
        let parsed = parse_specialist_response(REPLY).unwrap();
        assert_eq!(parsed.confidence, 0.85);
        assert_eq!(parsed.issues.len(), 2);
        assert_eq!(parsed.issues[0].severity(), Severity::High);
        assert_eq!(parsed.issues[0].location(), "img[src='hero.png']");
        assert_eq!(parsed.issues[1].severity(), Severity::Unknown);
        assert_eq!(parsed.suggestions, vec!["Run an automated contrast check"]);
    }

    #[test]
    fn test_parse_specialist_response_rejects_prose() {
        assert!(parse_specialist_response("I could not analyze this page.").is_none());
        assert!(parse_specialist_response("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_parse_clamps_confidence() {
        let parsed = parse_specialist_response(r#"{"confidence": 3.5, "issues": []}"#).unwrap();
        assert_eq!(parsed.confidence, 1.0);
        let parsed = parse_specialist_response(r#"{"issues": []}"#).unwrap();
        assert_eq!(parsed.confidence, 0.7);
    }

    #[test]
    fn test_prompt_includes_page_and_focus() {
        let prompt = build_specialist_prompt(
            "SEO Analyst",
            &["Canonical tags"],
            &page(),
            &["[high] Missing H1 (content)".to_string()],
        );
        assert!(prompt.starts_with("# SEO Analyst"));
        assert!(prompt.contains("https://shop.example"));
        assert!(prompt.contains("- Canonical tags"));
        assert!(prompt.contains("Missing H1"));
        assert!(prompt.contains("hero.png"));
        assert!(prompt.contains("\"severity\": \"critical|high|medium|low\""));
    }

    #[test]
    fn test_prompt_marks_truncated_dom_and_mobile() {
        let page = PageContext::builder("https://example.com")
            .dom_snapshot(DomSnapshot::new("x".repeat(DOM_EXCERPT_CHARS + 10)))
            .viewport(Viewport::new(390, 844))
            .build()
            .unwrap();
        let prompt = build_specialist_prompt("Content Reviewer", &[], &page, &[]);
        assert!(prompt.contains("truncated"));
        assert!(prompt.contains("(mobile)"));
        assert!(!prompt.contains("Already Reported"));
    }

    #[test]
    fn test_custom_focus_areas_override_defaults() {
        let worker = SpecialistWorker::new(SpecialistKind::Seo, ScriptedCompletion::replying("{}"))
            .with_focus_areas(vec!["Hreflang".to_string()]);
        assert_eq!(worker.focus_areas(), vec!["Hreflang"]);
    }

    #[tokio::test]
    async fn test_analyze_maps_reply_to_findings() {
        let client = ScriptedCompletion::replying(REPLY);
        let worker = SpecialistWorker::new(SpecialistKind::Accessibility, client.clone());
        let bus = EventBus::new();
        let reporter = reporter_for(&worker, &bus);

        let findings = worker.analyze(&page(), &reporter).await.unwrap();

        assert_eq!(findings.worker_id(), "accessibility");
        assert_eq!(findings.issues().len(), 2);
        assert!(findings.issues().iter().all(|i| i.source_worker() == "accessibility"));
        assert_eq!(findings.confidence(), 0.85);
        assert_eq!(reporter.last_progress(), 80);
    }

    #[tokio::test]
    async fn test_analyze_recovers_from_completion_failure() {
        let worker = SpecialistWorker::new(SpecialistKind::Seo, ScriptedCompletion::failing("offline"));
        let bus = EventBus::new();
        let reporter = reporter_for(&worker, &bus);

        let findings = worker.analyze(&page(), &reporter).await.unwrap();

        assert_eq!(findings.confidence(), COMPLETION_FAILED_CONFIDENCE);
        assert!(findings.issues().is_empty());
        assert!(findings.suggestions()[0].contains("manual seo review"));
        assert!(findings.metadata()["ai_error"].as_str().unwrap().contains("offline"));
        assert!(!findings.is_degraded());
    }

    #[tokio::test]
    async fn test_analyze_unparseable_reply() {
        let worker = SpecialistWorker::new(
            SpecialistKind::Performance,
            ScriptedCompletion::replying("Looks fine to me!"),
        );
        let bus = EventBus::new();
        let reporter = reporter_for(&worker, &bus);

        let findings = worker.analyze(&page(), &reporter).await.unwrap();
        assert_eq!(findings.confidence(), UNPARSEABLE_CONFIDENCE);
        assert_eq!(findings.suggestions().len(), 1);
    }

    #[tokio::test]
    async fn test_vision_used_only_with_screenshots() {
        let client = ScriptedCompletion::replying(r#"{"issues": []}"#);
        let worker = SpecialistWorker::new(SpecialistKind::Content, client.clone());
        let bus = EventBus::new();

        let with_shot = PageContext::builder("https://example.com")
            .screenshot(Screenshot::new("image/png", vec![1, 2]))
            .build()
            .unwrap();
        worker.analyze(&page(), &reporter_for(&worker, &bus)).await.unwrap();
        worker.analyze(&with_shot, &reporter_for(&worker, &bus)).await.unwrap();

        let requests = client.requests.lock().unwrap();
        assert!(!requests[0].use_vision);
        assert!(requests[1].use_vision);
        assert_eq!(requests[1].images.len(), 1);
    }

    #[tokio::test]
    async fn test_peer_findings_included_in_prompt() {
        let client = ScriptedCompletion::replying(r#"{"issues": []}"#);
        let worker = SpecialistWorker::new(SpecialistKind::Content, client.clone())
            .with_peers(vec!["seo".to_string(), "ghost".to_string()]);
        let bus = EventBus::new();

        let peer = Findings::new(&WorkerIdentity::new("seo", "SEO Analyst", "seo"))
            .add_issue(Issue::new(Severity::High, "Missing meta description"));
        let peer_json = serde_json::to_string(&peer).unwrap();
        let _responder = serve_questions(&bus, "coordinator", move |topic, body| {
            (topic == PEER_FINDINGS_TOPIC && body == "seo").then(|| peer_json.clone())
        });

        worker.analyze(&page(), &reporter_for(&worker, &bus)).await.unwrap();

        let requests = client.requests.lock().unwrap();
        assert!(requests[0].prompt.contains("[high] Missing meta description (seo)"));
    }
}
