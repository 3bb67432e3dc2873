//! Audit specialist kinds.
//!
//! Each kind names a domain of page quality and carries default focus areas
//! that seed the specialist's prompt.
//!
//! ## Specialist Kinds
//!
//! - [`SpecialistKind::Accessibility`]: WCAG, ARIA, keyboard and contrast review
//! - [`SpecialistKind::Seo`]: Search metadata and crawlability review
//! - [`SpecialistKind::Performance`]: Load cost and rendering review
//! - [`SpecialistKind::Content`]: Copy, structure and UX review
//! - [`SpecialistKind::Custom`]: User-defined domain
//!
//! ## Example
//!
//! ```
//! use pageaudit::worker::SpecialistKind;
//!
//! let kind: SpecialistKind = "a11y".parse().unwrap();
//! assert_eq!(kind, SpecialistKind::Accessibility);
//! assert_eq!(kind.display_name(), "Accessibility Auditor");
//! assert!(kind.focus_areas().iter().any(|a| a.contains("alt text")));
//! ```

use serde::Serialize;
use std::str::FromStr;

/// Domain of an AI-backed audit specialist.
///
/// ## Deserialization
///
/// Accepts the canonical names (`"accessibility"`, `"seo"`, `"performance"`,
/// `"content"`), common aliases (`"a11y"`, `"perf"`, `"ux"`), and the tagged
/// form `{"custom": "Legal Review"}`. Unknown strings become `Custom`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SpecialistKind {
    #[default]
    Accessibility,
    Seo,
    Performance,
    Content,
    Custom(String),
}

impl SpecialistKind {
    /// Human-readable worker name.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Accessibility => "Accessibility Auditor",
            Self::Seo => "SEO Analyst",
            Self::Performance => "Performance Inspector",
            Self::Content => "Content Reviewer",
            Self::Custom(name) => name,
        }
    }

    /// Worker id, lowercase and hyphenated.
    ///
    /// # Examples
    ///
    /// ```
    /// use pageaudit::worker::SpecialistKind;
    ///
    /// assert_eq!(SpecialistKind::Seo.worker_id(), "seo");
    /// assert_eq!(SpecialistKind::Custom("Legal Review".to_string()).worker_id(), "legal-review");
    /// ```
    pub fn worker_id(&self) -> String {
        match self {
            Self::Accessibility => "accessibility".to_string(),
            Self::Seo => "seo".to_string(),
            Self::Performance => "performance".to_string(),
            Self::Content => "content".to_string(),
            Self::Custom(name) => name.trim().to_lowercase().replace(' ', "-"),
        }
    }

    /// Category reported in findings.
    pub fn category(&self) -> &str {
        match self {
            Self::Accessibility => "accessibility",
            Self::Seo => "seo",
            Self::Performance => "performance",
            Self::Content => "content",
            Self::Custom(_) => "custom",
        }
    }

    /// Default focus areas for this kind. Custom kinds have none.
    pub fn focus_areas(&self) -> Vec<&'static str> {
        match self {
            Self::Accessibility => vec![
                "Images without alt text",
                "Missing or misused ARIA roles and labels",
                "Insufficient color contrast",
                "Keyboard navigation and focus order",
                "Form inputs without associated labels",
                "Heading hierarchy gaps",
                "Missing document language",
            ],
            Self::Seo => vec![
                "Missing or duplicate title and meta description",
                "Heading structure and a single H1",
                "Canonical and robots directives",
                "Open Graph and structured data",
                "Descriptive link text",
                "Crawlable navigation",
            ],
            Self::Performance => vec![
                "Render-blocking scripts and stylesheets",
                "Oversized or unoptimized images",
                "Missing lazy loading below the fold",
                "Excessive DOM size",
                "Layout shift from unsized media",
                "Third-party script weight",
            ],
            Self::Content => vec![
                "Unclear headings or calls to action",
                "Broken or placeholder copy",
                "Readability and paragraph length",
                "Visual hierarchy and layout consistency",
                "Mobile layout problems",
                "Trust signals and contact information",
            ],
            Self::Custom(_) => vec![],
        }
    }

    /// Whether this kind benefits from screenshots when they are available.
    pub fn uses_vision(&self) -> bool {
        matches!(self, Self::Accessibility | Self::Content)
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }

    /// All built-in kinds, in default registration order.
    ///
    /// # Examples
    ///
    /// ```
    /// use pageaudit::worker::SpecialistKind;
    ///
    /// assert_eq!(SpecialistKind::all_builtins().len(), 4);
    /// ```
    pub fn all_builtins() -> Vec<Self> {
        vec![
            Self::Accessibility,
            Self::Seo,
            Self::Performance,
            Self::Content,
        ]
    }
}

impl std::fmt::Display for SpecialistKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl<'de> serde::Deserialize<'de> for SpecialistKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::{self, Visitor};

        struct KindVisitor;

        impl<'de> Visitor<'de> for KindVisitor {
            type Value = SpecialistKind;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str(
                    r#"a specialist kind string (e.g. "seo", "a11y") or a tagged object (e.g. {"custom": "Legal Review"})"#,
                )
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<SpecialistKind, E> {
                SpecialistKind::from_str(value).map_err(de::Error::custom)
            }

            fn visit_map<A: de::MapAccess<'de>>(
                self,
                mut map: A,
            ) -> Result<SpecialistKind, A::Error> {
                let key: String = map
                    .next_key()?
                    .ok_or_else(|| de::Error::custom("expected a key in specialist kind object"))?;

                if key == "custom" {
                    let value: String = map.next_value()?;
                    while map.next_key::<de::IgnoredAny>()?.is_some() {
                        map.next_value::<de::IgnoredAny>()?;
                    }
                    Ok(SpecialistKind::Custom(value))
                } else {
                    Err(de::Error::unknown_variant(
                        &key,
                        &["accessibility", "seo", "performance", "content", "custom"],
                    ))
                }
            }
        }

        deserializer.deserialize_any(KindVisitor)
    }
}

impl FromStr for SpecialistKind {
    type Err = std::convert::Infallible;

    /// Parse a kind from a name or alias. Never fails: unknown names become
    /// `Custom`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "accessibility" | "a11y" | "wcag" => Self::Accessibility,
            "seo" | "search" => Self::Seo,
            "performance" | "perf" | "speed" => Self::Performance,
            "content" | "ux" | "content-ux" | "content_ux" => Self::Content,
            _ => Self::Custom(s.trim().to_string()),
        })
    }
}
