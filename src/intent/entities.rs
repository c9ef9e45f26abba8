use chrono::{Days, NaiveDate, NaiveTime};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Trade categories offered on the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Plumbing,
    Electrical,
    Hvac,
    Roofing,
    Painting,
    Cleaning,
    Landscaping,
    PestControl,
    Handyman,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Plumbing => "plumbing",
            ServiceCategory::Electrical => "electrical",
            ServiceCategory::Hvac => "hvac",
            ServiceCategory::Roofing => "roofing",
            ServiceCategory::Painting => "painting",
            ServiceCategory::Cleaning => "cleaning",
            ServiceCategory::Landscaping => "landscaping",
            ServiceCategory::PestControl => "pest_control",
            ServiceCategory::Handyman => "handyman",
        }
    }
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Normal,
    Urgent,
    Emergency,
}

/// Structured facts pulled from one utterance
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Entities {
    pub service: Option<ServiceCategory>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub urgency: Urgency,
    pub address: Option<String>,
}

const SERVICE_KEYWORDS: &[(ServiceCategory, &str)] = &[
    (
        ServiceCategory::Plumbing,
        r"\b(plumb\w*|leak\w*|pipes?|drains?|faucets?|toilets?|water heater)\b",
    ),
    (
        ServiceCategory::Electrical,
        r"\b(electric\w*|wiring|outlets?|breakers?|light fixtures?)\b",
    ),
    (
        ServiceCategory::Hvac,
        r"\b(hvac|air con\w*|a/c|furnace|heating|heat pump)\b",
    ),
    (ServiceCategory::Roofing, r"\b(roof\w*|shingles?|gutters?)\b"),
    (ServiceCategory::Painting, r"\b(paint\w*|repaint\w*)\b"),
    (ServiceCategory::Cleaning, r"\b(clean\w*|maid|deep clean)\b"),
    (
        ServiceCategory::Landscaping,
        r"\b(landscap\w*|lawn|garden\w*|mow\w*|hedges?)\b",
    ),
    (
        ServiceCategory::PestControl,
        r"\b(pests?|termites?|rodents?|mice|rats?|exterminat\w*)\b",
    ),
    (ServiceCategory::Handyman, r"\b(handyman|odd jobs?|assembl\w*)\b"),
];

fn service_patterns() -> &'static [(ServiceCategory, Regex)] {
    static SERVICE_RE: OnceLock<Vec<(ServiceCategory, Regex)>> = OnceLock::new();
    SERVICE_RE.get_or_init(|| {
        SERVICE_KEYWORDS
            .iter()
            .map(|(category, pattern)| {
                (*category, Regex::new(&format!("(?i){}", pattern)).unwrap())
            })
            .collect()
    })
}

fn date_pattern() -> &'static Regex {
    static DATE_RE: OnceLock<Regex> = OnceLock::new();
    DATE_RE.get_or_init(|| Regex::new(r"(?i)\b(today|tonight|tomorrow)\b").unwrap())
}

fn time_pattern() -> &'static Regex {
    static TIME_RE: OnceLock<Regex> = OnceLock::new();
    TIME_RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").unwrap())
}

fn emergency_pattern() -> &'static Regex {
    static EMERGENCY_RE: OnceLock<Regex> = OnceLock::new();
    EMERGENCY_RE.get_or_init(|| Regex::new(r"(?i)\bemergenc(y|ies)\b").unwrap())
}

fn urgent_pattern() -> &'static Regex {
    static URGENT_RE: OnceLock<Regex> = OnceLock::new();
    URGENT_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(urgent(ly)?|asap|right away|immediately)\b").unwrap()
    })
}

fn address_pattern() -> &'static Regex {
    static ADDRESS_RE: OnceLock<Regex> = OnceLock::new();
    ADDRESS_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b\d{1,6}\s+(?:[a-z][a-z.'-]*\s+){1,4}(?:street|st|avenue|ave|road|rd|boulevard|blvd|lane|ln|drive|dr|court|ct|way|place|pl|terrace|circle)\b\.?",
        )
        .unwrap()
    })
}

/// Extract entities from an utterance. Relative dates resolve against `today`.
pub fn extract_entities(text: &str, today: NaiveDate) -> Entities {
    Entities {
        service: extract_service(text),
        date: extract_date(text, today),
        time: extract_time(text),
        urgency: extract_urgency(text),
        address: address_pattern()
            .find(text)
            .map(|m| m.as_str().trim_end_matches('.').to_string()),
    }
}

/// First category in table order with a keyword hit
fn extract_service(text: &str) -> Option<ServiceCategory> {
    service_patterns()
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(category, _)| *category)
}

/// The earliest relative date keyword wins
fn extract_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let keyword = date_pattern().find(text)?.as_str().to_lowercase();
    match keyword.as_str() {
        "tomorrow" => today.checked_add_days(Days::new(1)),
        _ => Some(today),
    }
}

/// First well-formed `h[:mm] am|pm`
fn extract_time(text: &str) -> Option<NaiveTime> {
    time_pattern().captures_iter(text).find_map(|caps| {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = match caps.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = caps.get(3)?.as_str().eq_ignore_ascii_case("pm");
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        NaiveTime::from_hms_opt(hour, minute, 0)
    })
}

fn extract_urgency(text: &str) -> Urgency {
    if emergency_pattern().is_match(text) {
        Urgency::Emergency
    } else if urgent_pattern().is_match(text) {
        Urgency::Urgent
    } else {
        Urgency::Normal
    }
}
