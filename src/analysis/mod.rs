//! Document analysis
//!
//! This module turns raw content into structured analysis:
//! - Per-type prompts sent to the text generator
//! - Tolerant parsing of the generator's JSON reply
//! - Fallbacks when the reply is unusable or generation is off
//! - Quality scoring and language/framework detection

mod detect;
mod quality;

pub use detect::*;
pub use quality::*;

use crate::embed::truncate_chars;
use crate::error::Result;
use crate::generate::TextGenerator;
use crate::store::DocumentType;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Longest raw reply kept when the generator's output cannot be parsed
const MAX_RAW_CHARS: usize = 2000;

/// Structured analysis of one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredAnalysis {
    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub insights: Vec<String>,

    #[serde(default)]
    pub patterns: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// 0-10
    #[serde(default, deserialize_with = "lenient_number")]
    pub complexity: Option<f32>,

    /// 0-100
    #[serde(default, deserialize_with = "lenient_number")]
    pub maintainability: Option<f32>,
}

/// Accept `7`, `7.5` or `"7"` from the generator; non-finite values count as missing
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64().map(|v| v as f32),
        serde_json::Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    };
    Ok(number.filter(|v| v.is_finite()))
}

/// Values substituted for fields the generator did not provide
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisDefaults {
    pub complexity: f32,
    pub maintainability: f32,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            complexity: 5.0,
            maintainability: 50.0,
        }
    }
}

/// Result of asking the generator for an analysis
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Parsed(StructuredAnalysis),
    Unparsed { raw: String },
    Skipped,
}

impl AnalysisOutcome {
    /// The analysis used downstream, with defaults filled in
    pub fn effective(self, defaults: AnalysisDefaults) -> StructuredAnalysis {
        let mut analysis = match self {
            AnalysisOutcome::Parsed(analysis) => analysis,
            AnalysisOutcome::Unparsed { raw } => {
                let text = truncate_chars(raw.trim(), MAX_RAW_CHARS).to_string();
                StructuredAnalysis {
                    summary: text.clone(),
                    insights: if text.is_empty() { Vec::new() } else { vec![text] },
                    ..Default::default()
                }
            }
            AnalysisOutcome::Skipped => StructuredAnalysis::default(),
        };
        analysis.complexity.get_or_insert(defaults.complexity);
        analysis.maintainability.get_or_insert(defaults.maintainability);
        analysis
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, AnalysisOutcome::Parsed(_))
    }
}

/// Runs analysis prompts through an optional generator
pub struct Analyzer {
    generator: Option<Arc<dyn TextGenerator>>,
    max_prompt_chars: usize,
}

impl Analyzer {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, max_prompt_chars: usize) -> Self {
        Self {
            generator,
            max_prompt_chars,
        }
    }

    /// Analyze content. Generator failures propagate; unusable replies do not.
    pub async fn analyze(
        &self,
        content: &str,
        doc_type: DocumentType,
        language: Option<&str>,
    ) -> Result<AnalysisOutcome> {
        let Some(generator) = &self.generator else {
            debug!("No generator configured, skipping analysis");
            return Ok(AnalysisOutcome::Skipped);
        };

        let prompt = build_prompt(
            truncate_chars(content, self.max_prompt_chars),
            doc_type,
            language,
        );
        let reply = generator.generate(&prompt).await?;

        match parse_analysis(&reply) {
            Some(analysis) => Ok(AnalysisOutcome::Parsed(analysis)),
            None => {
                warn!(
                    "Could not parse analysis reply from {} ({} chars), using raw text",
                    generator.model_name(),
                    reply.len()
                );
                Ok(AnalysisOutcome::Unparsed { raw: reply })
            }
        }
    }
}

const RESPONSE_FORMAT: &str = r#"Respond with a single JSON object and nothing else:
{
  "summary": "two or three sentences",
  "insights": ["key observation", "..."],
  "patterns": ["design pattern or notable construct", "..."],
  "tags": ["short lowercase keyword", "..."],
  "complexity": <number 0-10>,
  "maintainability": <number 0-100>
}"#;

/// Build the analysis prompt for a document type
pub fn build_prompt(content: &str, doc_type: DocumentType, language: Option<&str>) -> String {
    let task = match doc_type {
        DocumentType::Code => format!(
            "Analyze the following {} source code. Identify its purpose, the design patterns it \
             uses, risks, and how easy it would be to change.",
            language.unwrap_or("")
        ),
        DocumentType::Documentation => "Analyze the following documentation. Summarize what it \
             explains, note gaps or outdated statements, and extract the key topics."
            .to_string(),
        DocumentType::Architecture => "Analyze the following architecture notes. Describe the \
             components and their interactions, architectural patterns, and trade-offs."
            .to_string(),
        DocumentType::Conversation => "Analyze the following conversation transcript. Summarize \
             what the customer wanted, what was agreed, and any follow-up needed."
            .to_string(),
        DocumentType::Analysis => "Review the following analysis result. Condense its findings \
             and recommendations."
            .to_string(),
    };

    format!(
        "{}\n\n{}\n\n---\n{}\n---",
        task.replace("  ", " "),
        RESPONSE_FORMAT,
        content
    )
}

/// Parse a generator reply, tolerating code fences and surrounding prose
pub fn parse_analysis(reply: &str) -> Option<StructuredAnalysis> {
    let json = extract_json_object(reply)?;
    serde_json::from_str(json).ok()
}

/// The outermost `{...}` span of a string
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;

    struct FixedGenerator(String);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(Error::Generation("quota exceeded".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"summary\": \"Books plumbers\", \"patterns\": [\"repository\"], \"complexity\": \"4\"}\n```\nThanks";
        let analysis = parse_analysis(reply).unwrap();
        assert_eq!(analysis.summary, "Books plumbers");
        assert_eq!(analysis.patterns, vec!["repository"]);
        assert_eq!(analysis.complexity, Some(4.0));
        assert_eq!(analysis.maintainability, None);
    }

    #[test]
    fn test_parse_drops_non_finite_numbers() {
        let analysis =
            parse_analysis(r#"{"summary": "s", "complexity": "NaN", "maintainability": "inf"}"#)
                .unwrap();
        assert_eq!(analysis.complexity, None);
        assert_eq!(analysis.maintainability, None);

        let effective = AnalysisOutcome::Parsed(analysis).effective(AnalysisDefaults::default());
        assert_eq!(effective.complexity, Some(5.0));
        assert_eq!(effective.maintainability, Some(50.0));
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(parse_analysis("I could not analyze this file.").is_none());
        assert!(parse_analysis("} backwards {").is_none());
    }

    #[test]
    fn test_effective_unparsed_uses_raw_text() {
        let outcome = AnalysisOutcome::Unparsed {
            raw: "  plain prose answer  ".to_string(),
        };
        let analysis = outcome.effective(AnalysisDefaults::default());
        assert_eq!(analysis.summary, "plain prose answer");
        assert_eq!(analysis.insights, vec!["plain prose answer"]);
        assert_eq!(analysis.complexity, Some(5.0));
        assert_eq!(analysis.maintainability, Some(50.0));
    }

    #[test]
    fn test_effective_skipped_is_empty() {
        let analysis = AnalysisOutcome::Skipped.effective(AnalysisDefaults::default());
        assert!(analysis.summary.is_empty());
        assert!(analysis.insights.is_empty());
        assert_eq!(analysis.complexity, Some(5.0));
    }

    #[test]
    fn test_prompt_mentions_language() {
        let prompt = build_prompt("fn main() {}", DocumentType::Code, Some("rust"));
        assert!(prompt.contains("rust source code"));
        assert!(prompt.contains("fn main() {}"));
        assert!(prompt.contains("\"maintainability\""));
    }

    #[tokio::test]
    async fn test_analyzer_outcomes() {
        let parsed = Analyzer::new(
            Some(Arc::new(FixedGenerator(
                r#"{"summary": "ok", "insights": ["a"]}"#.to_string(),
            ))),
            1000,
        );
        assert!(parsed
            .analyze("x", DocumentType::Documentation, None)
            .await
            .unwrap()
            .is_parsed());

        let unparsed = Analyzer::new(Some(Arc::new(FixedGenerator("nope".to_string()))), 1000);
        assert_eq!(
            unparsed
                .analyze("x", DocumentType::Documentation, None)
                .await
                .unwrap(),
            AnalysisOutcome::Unparsed {
                raw: "nope".to_string()
            }
        );

        let skipped = Analyzer::new(None, 1000);
        assert_eq!(
            skipped.analyze("x", DocumentType::Code, None).await.unwrap(),
            AnalysisOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_analyzer_propagates_generation_errors() {
        let analyzer = Analyzer::new(Some(Arc::new(FailingGenerator)), 1000);
        assert!(matches!(
            analyzer.analyze("x", DocumentType::Code, None).await,
            Err(Error::Generation(_))
        ));
    }
}
