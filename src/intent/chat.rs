use super::{extract_entities, Entities, Intent, IntentMatch, IntentMatcher, Urgency};
use crate::config::IntentConfig;
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;

/// Analysis of one chat turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnAnalysis {
    pub intent: IntentMatch,
    pub entities: Entities,
    /// Follow-ups to offer, based on the previous turn
    pub suggestions: Vec<String>,
}

/// Per-turn analysis for the booking chat agent
pub struct ChatAnalyzer {
    matcher: IntentMatcher,
}

impl ChatAnalyzer {
    pub fn new(matcher: IntentMatcher) -> Self {
        Self { matcher }
    }

    pub fn from_config(config: &IntentConfig) -> Result<Self> {
        Ok(Self::new(IntentMatcher::new(config.min_confidence)?))
    }

    pub fn analyze(
        &self,
        text: &str,
        previous: Option<&TurnAnalysis>,
        today: NaiveDate,
    ) -> TurnAnalysis {
        TurnAnalysis {
            intent: self.matcher.detect(text),
            entities: extract_entities(text, today),
            suggestions: suggestions_after(previous),
        }
    }
}

fn suggestions_after(previous: Option<&TurnAnalysis>) -> Vec<String> {
    let Some(previous) = previous else {
        return opening_suggestions();
    };
    let entities = &previous.entities;

    let mut suggestions: Vec<&str> = match previous.intent.intent {
        Intent::Booking => {
            let mut missing = Vec::new();
            if entities.service.is_none() {
                missing.push("Which service do you need?");
            }
            if entities.date.is_none() {
                missing.push("Pick a date");
            }
            if entities.time.is_none() {
                missing.push("Choose a time");
            }
            if entities.address.is_none() {
                missing.push("Share the job address");
            }
            if missing.is_empty() {
                missing.push("Confirm booking");
            }
            missing
        }
        Intent::Pricing => {
            if entities.service.is_none() {
                vec!["Tell us which service to price", "Book a service"]
            } else {
                vec!["Book this service", "Get a detailed estimate"]
            }
        }
        Intent::Availability => vec!["Book the earliest slot", "See tomorrow's availability"],
        Intent::Status => vec!["Contact your technician", "Reschedule the appointment"],
        Intent::Cancel => vec!["Reschedule instead", "Confirm cancellation"],
        Intent::General => return opening_suggestions(),
    };

    if entities.urgency == Urgency::Emergency {
        suggestions.insert(0, "Call the emergency line");
    }
    suggestions.into_iter().map(str::to_string).collect()
}

fn opening_suggestions() -> Vec<String> {
    ["Book a service", "Get a price estimate", "Check availability"]
        .into_iter()
        .map(str::to_string)
        .collect()
}
