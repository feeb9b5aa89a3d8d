//! Emergency pre-screen run on every patient answer.
//!
//! Fires on the patient's own words before the oracle is consulted, so
//! emergency handling does not depend on the oracle following its rules.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Message shown to the patient when an emergency is detected.
pub const EMERGENCY_ADVICE: &str = "What you describe may be a medical emergency. \
Please stop this questionnaire and call your local emergency number (911 in the US) \
or go to the nearest emergency department now. If someone is with you, ask them to help.";

/// Clinical category of a detected red flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedFlagCategory {
    Cardiac,
    Respiratory,
    Neurological,
    Bleeding,
    Anaphylaxis,
    SelfHarm,
}

/// A red flag found in a patient answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyFinding {
    pub category: RedFlagCategory,
    /// The fragment of the answer that triggered the rule.
    pub matched: String,
    pub description: String,
}

struct RedFlagPattern {
    regex: Regex,
    category: RedFlagCategory,
    description: &'static str,
}

fn pattern(re: &str, category: RedFlagCategory, description: &'static str) -> RedFlagPattern {
    RedFlagPattern {
        regex: Regex::new(re).unwrap_or_else(|e| panic!("invalid red flag pattern {re}: {e}")),
        category,
        description,
    }
}

static RED_FLAG_PATTERNS: Lazy<Vec<RedFlagPattern>> = Lazy::new(|| {
    vec![
        pattern(
            r"(?i)\b(crushing|severe|heavy|squeezing)\s+(chest\s+(pain|pressure)|pain\s+in\s+(my\s+)?chest)",
            RedFlagCategory::Cardiac,
            "Severe or crushing chest pain",
        ),
        pattern(
            r"(?i)\bchest\s+pain\b.{0,40}\b(left\s+arm|arm|jaw)\b",
            RedFlagCategory::Cardiac,
            "Chest pain radiating to arm or jaw",
        ),
        pattern(
            r"(?i)\b(can[’']?t|cannot|can\s+not|unable\s+to|struggling\s+to)\s+(breathe|catch\s+my\s+breath)\b",
            RedFlagCategory::Respiratory,
            "Unable to breathe",
        ),
        pattern(
            r"(?i)\b(severe\s+)?(difficulty|trouble)\s+breathing\b",
            RedFlagCategory::Respiratory,
            "Difficulty breathing",
        ),
        pattern(
            r"(?i)\b(lips|face)\s+(are\s+|is\s+)?(turning\s+)?blue\b",
            RedFlagCategory::Respiratory,
            "Cyanosis",
        ),
        pattern(
            r"(?i)\b(face\s+(is\s+)?drooping|slurred\s+speech|sudden(ly)?\s+(weakness|numbness)|worst\s+headache\s+(of\s+my\s+life|ever))\b",
            RedFlagCategory::Neurological,
            "Stroke warning signs",
        ),
        pattern(
            r"(?i)\b(seizure|convulsions?|lost\s+consciousness|unconscious)\b",
            RedFlagCategory::Neurological,
            "Seizure or loss of consciousness",
        ),
        pattern(
            r"(?i)\b((heavy|uncontrolled|severe)\s+bleeding|bleeding\s+(heavily|that\s+won[’']?t\s+stop|won[’']?t\s+stop)|(vomiting|coughing\s+up|throwing\s+up)\s+blood)\b",
            RedFlagCategory::Bleeding,
            "Severe bleeding",
        ),
        pattern(
            r"(?i)\bthroat\s+(is\s+)?(closing|swelling)(\s+up)?\b",
            RedFlagCategory::Anaphylaxis,
            "Airway swelling",
        ),
        pattern(
            r"(?i)\b(suicidal|kill\s+myself|end\s+my\s+life|want\s+to\s+die|overdosed?)\b",
            RedFlagCategory::SelfHarm,
            "Risk of self-harm",
        ),
    ]
});

const NEGATIONS: &[&str] = &[
    "no", "not", "never", "without", "denies", "deny", "don't", "dont", "haven't", "didn't",
    "isn't", "wasn't",
];

/// Words that open a new clause; a negation before them does not carry over.
const CLAUSE_BREAKS: &[&str] = &["but", "although", "though", "however", "yet", "except"];

/// Returns true if one of the few words preceding `start` negates the match.
///
/// Only the clause holding the match is considered: the look-back stops at
/// the nearest `.,;:!?` or at a clause-opening conjunction.
fn is_negated(text: &str, start: usize) -> bool {
    let before = &text[..start];
    let clause = before
        .rfind(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?'))
        .map_or(before, |pos| &before[pos + 1..]);

    clause
        .split_whitespace()
        .rev()
        .take(4)
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '’')
                .to_lowercase()
                .replace('’', "'")
        })
        .take_while(|w| !CLAUSE_BREAKS.contains(&w.as_str()))
        .any(|w| NEGATIONS.contains(&w.as_str()))
}

/// Pattern-based emergency screen.
#[derive(Debug, Clone, Copy)]
pub struct EmergencyScreen {
    enabled: bool,
}

impl Default for EmergencyScreen {
    fn default() -> Self {
        Self::enabled()
    }
}

impl EmergencyScreen {
    pub fn enabled() -> Self {
        Self { enabled: true }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the first red flag found in `answer`, if any.
    pub fn screen(&self, answer: &str) -> Option<EmergencyFinding> {
        if !self.enabled {
            return None;
        }

        RED_FLAG_PATTERNS.iter().find_map(|p| {
            p.regex
                .find_iter(answer)
                .find(|m| !is_negated(answer, m.start()))
                .map(|m| EmergencyFinding {
                    category: p.category,
                    matched: m.as_str().to_string(),
                    description: p.description.to_string(),
                })
        })
    }
}
