//! Append-only interview transcript.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// Framing instruction given to the oracle.
    System,
    /// The interviewing agent (oracle output surfaced to the patient).
    Interviewer,
    /// The patient.
    Patient,
}

/// One entry in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub at: Timestamp,
}

impl Turn {
    fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            at: Timestamp::now(),
        }
    }
}

/// Ordered conversation history of one interview.
///
/// Turns can only be appended; nothing in the crate edits or removes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.turns.push(Turn::new(speaker, text));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of answers the patient has given.
    pub fn patient_turns(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| t.speaker == Speaker::Patient)
            .count()
    }

    /// Most recent interviewer question, if any.
    pub fn last_question(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Interviewer)
            .map(|t| t.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let transcript = Transcript::new();
        assert!(transcript.is_empty());
        assert_eq!(transcript.patient_turns(), 0);
        assert!(transcript.last_question().is_none());
    }

    #[test]
    fn keeps_insertion_order() {
        let mut transcript = Transcript::new();
        transcript.push(Speaker::System, "framing");
        transcript.push(Speaker::Interviewer, "What brings you in?");
        transcript.push(Speaker::Patient, "Headache");

        let speakers: Vec<Speaker> = transcript.turns().iter().map(|t| t.speaker).collect();
        assert_eq!(
            speakers,
            vec![Speaker::System, Speaker::Interviewer, Speaker::Patient]
        );
        assert_eq!(transcript.patient_turns(), 1);
        assert_eq!(transcript.last_question(), Some("What brings you in?"));
    }

    #[test]
    fn speaker_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Speaker::Interviewer).unwrap(),
            "\"interviewer\""
        );
    }
}
