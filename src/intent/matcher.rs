use crate::error::{Error, Result};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// What the customer is trying to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Booking,
    Pricing,
    Availability,
    Status,
    Cancel,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Booking => "booking",
            Intent::Pricing => "pricing",
            Intent::Availability => "availability",
            Intent::Status => "status",
            Intent::Cancel => "cancel",
            Intent::General => "general",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pattern table in declaration order; earlier intents win ties
const DEFAULT_PATTERNS: &[(Intent, &[&str])] = &[
    (
        Intent::Booking,
        &[
            r"\bbook(ing|ed)?\b",
            r"\bschedule\b",
            r"\bappointment\b",
            r"\breserve\b",
            r"\b(hire|send) (someone|somebody|a|an)\b",
        ],
    ),
    (
        Intent::Pricing,
        &[
            r"\bhow much\b",
            r"\b(cost|costs|price|prices|pricing)\b",
            r"\b(quote|quotes|estimate|estimates)\b",
            r"\b(rate|rates|fee|fees|charge|charges)\b",
        ],
    ),
    (
        Intent::Availability,
        &[
            r"\bavailab(le|ility)\b",
            r"\b(open|free) (slot|slots|time|times)\b",
            r"\bwhen can\b",
            r"\b(this|next) (week|weekend)\b",
        ],
    ),
    (
        Intent::Status,
        &[
            r"\bstatus\b",
            r"\bwhere is\b",
            r"\b(on (the|their|his|her) way|running late|eta)\b",
            r"\b(update|track|tracking)\b",
        ],
    ),
    (
        Intent::Cancel,
        &[
            r"\bcancel(led|ed|lation|ing)?\b",
            r"\b(call off|no longer need)\b",
            r"\brefund\b",
        ],
    ),
];

/// Result of intent detection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentMatch {
    pub intent: Intent,
    /// Fraction of the winning intent's patterns that matched
    pub confidence: f32,
    pub matched_patterns: Vec<String>,
}

impl IntentMatch {
    fn general() -> Self {
        Self {
            intent: Intent::General,
            confidence: 0.0,
            matched_patterns: Vec::new(),
        }
    }
}

/// Maps free text to an intent by per-intent pattern hit ratio
pub struct IntentMatcher {
    table: Vec<(Intent, Vec<Regex>)>,
    min_confidence: f32,
}

impl IntentMatcher {
    /// Matcher over the built-in pattern table
    pub fn new(min_confidence: f32) -> Result<Self> {
        let table = DEFAULT_PATTERNS
            .iter()
            .map(|(intent, patterns)| (*intent, patterns.iter().map(|p| p.to_string()).collect()))
            .collect();
        Self::with_patterns(table, min_confidence)
    }

    /// Matcher over a custom table; patterns are matched case-insensitively
    pub fn with_patterns(table: Vec<(Intent, Vec<String>)>, min_confidence: f32) -> Result<Self> {
        let mut compiled = Vec::with_capacity(table.len());
        for (intent, patterns) in table {
            let regexes = patterns
                .iter()
                .map(|p| {
                    Regex::new(&format!("(?i){}", p)).map_err(|e| {
                        Error::Config(format!("Invalid {} intent pattern '{}': {}", intent, p, e))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            compiled.push((intent, regexes));
        }
        Ok(Self {
            table: compiled,
            min_confidence,
        })
    }

    pub fn detect(&self, text: &str) -> IntentMatch {
        let mut best: Option<IntentMatch> = None;

        for (intent, patterns) in &self.table {
            if patterns.is_empty() {
                continue;
            }
            let matched: Vec<String> = patterns
                .iter()
                .filter(|re| re.is_match(text))
                .map(|re| re.as_str().trim_start_matches("(?i)").to_string())
                .collect();
            if matched.is_empty() {
                continue;
            }

            let ratio = matched.len() as f32 / patterns.len() as f32;
            if best.as_ref().map_or(true, |b| ratio > b.confidence) {
                best = Some(IntentMatch {
                    intent: *intent,
                    confidence: ratio,
                    matched_patterns: matched,
                });
            }
        }

        match best {
            Some(found) if found.confidence >= self.min_confidence => {
                debug!("Detected {} intent ({:.2})", found.intent, found.confidence);
                found
            }
            _ => IntentMatch::general(),
        }
    }
}
