//! Intent command implementation

use crate::config::IntentConfig;
use crate::error::Result;
use crate::intent::{ChatAnalyzer, TurnAnalysis};
use chrono::NaiveDate;

/// Analyze a chat utterance, optionally in the context of the previous one
pub fn cmd_intent(
    config: &IntentConfig,
    text: &str,
    previous: Option<&str>,
    today: NaiveDate,
) -> Result<TurnAnalysis> {
    let analyzer = ChatAnalyzer::from_config(config)?;
    let previous = previous.map(|p| analyzer.analyze(p, None, today));
    Ok(analyzer.analyze(text, previous.as_ref(), today))
}

pub fn print_turn(turn: &TurnAnalysis) {
    println!(
        "\nIntent: {} (confidence {:.2})",
        turn.intent.intent, turn.intent.confidence
    );
    if !turn.intent.matched_patterns.is_empty() {
        println!("  Matched: {}", turn.intent.matched_patterns.join("  "));
    }

    let e = &turn.entities;
    println!("\nEntities:");
    if let Some(service) = e.service {
        println!("  Service: {}", service);
    }
    if let Some(date) = e.date {
        println!("  Date: {}", date);
    }
    if let Some(time) = e.time {
        println!("  Time: {}", time.format("%H:%M"));
    }
    println!("  Urgency: {:?}", e.urgency);
    if let Some(address) = &e.address {
        println!("  Address: {}", address);
    }

    if !turn.suggestions.is_empty() {
        println!("\nSuggestions:");
        for s in &turn.suggestions {
            println!("  • {}", s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;

    #[test]
    fn test_previous_turn_drives_suggestions() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let turn = cmd_intent(
            &IntentConfig::default(),
            "how much does this cost",
            Some("cancel my booking"),
            today,
        )
        .unwrap();

        assert_eq!(turn.intent.intent, Intent::Pricing);
        assert_eq!(turn.suggestions, vec!["Reschedule instead", "Confirm cancellation"]);
    }
}
