//! The fixed intake checklist.
//!
//! A frame is one topic the interview must address before a subjective
//! assessment can be written. The list is fixed per deployment and ordered the
//! way a clinician would take a history of present illness.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a checklist frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameId {
    ChiefComplaint,
    OnsetAndDuration,
    SymptomDescription,
    Progression,
    AssociatedSymptoms,
    ModifyingFactors,
    SelfTreatment,
    FunctionalImpact,
    MedicalHistory,
    FinalConfirmation,
}

impl FrameId {
    /// Wire name used in prompts and structured oracle replies.
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameId::ChiefComplaint => "chief_complaint",
            FrameId::OnsetAndDuration => "onset_and_duration",
            FrameId::SymptomDescription => "symptom_description",
            FrameId::Progression => "progression",
            FrameId::AssociatedSymptoms => "associated_symptoms",
            FrameId::ModifyingFactors => "modifying_factors",
            FrameId::SelfTreatment => "self_treatment",
            FrameId::FunctionalImpact => "functional_impact",
            FrameId::MedicalHistory => "medical_history",
            FrameId::FinalConfirmation => "final_confirmation",
        }
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an oracle names a frame that is not on the checklist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown frame: {0}")]
pub struct UnknownFrame(pub String);

impl FromStr for FrameId {
    type Err = UnknownFrame;

    /// Lenient: case, surrounding whitespace and `-`/space separators are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        FRAME_CHECKLIST
            .iter()
            .map(|frame| frame.id)
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| UnknownFrame(s.to_string()))
    }
}

/// A named topic of clinical information the interview must elicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub id: FrameId,
    pub title: &'static str,
    pub description: &'static str,
}

/// The ordered intake checklist.
pub static FRAME_CHECKLIST: [Frame; 10] = [
    Frame {
        id: FrameId::ChiefComplaint,
        title: "Chief Complaint",
        description: "Primary reason for the visit",
    },
    Frame {
        id: FrameId::OnsetAndDuration,
        title: "Onset and Duration",
        description: "When did it start and how long has it lasted",
    },
    Frame {
        id: FrameId::SymptomDescription,
        title: "Symptom Description",
        description: "Severity on a 1-10 scale, nature of the pain or symptom, location",
    },
    Frame {
        id: FrameId::Progression,
        title: "Progression",
        description: "Getting better, worse, or staying the same",
    },
    Frame {
        id: FrameId::AssociatedSymptoms,
        title: "Associated Symptoms",
        description: "Any other symptoms occurring alongside",
    },
    Frame {
        id: FrameId::ModifyingFactors,
        title: "Aggravating/Relieving Factors",
        description: "What makes it worse and what makes it better",
    },
    Frame {
        id: FrameId::SelfTreatment,
        title: "Self-medication/Actions",
        description: "Medicines taken or other actions tried so far",
    },
    Frame {
        id: FrameId::FunctionalImpact,
        title: "Impact on Daily Activities",
        description: "Ability to work, walk, eat, sleep",
    },
    Frame {
        id: FrameId::MedicalHistory,
        title: "Relevant Medical History",
        description: "Allergies, chronic conditions, current medications",
    },
    Frame {
        id: FrameId::FinalConfirmation,
        title: "Final Confirmation",
        description: "Anything else the patient wants to add",
    },
];

impl Frame {
    /// Looks up the checklist entry for an id.
    pub fn get(id: FrameId) -> &'static Frame {
        // The checklist holds exactly one entry per FrameId variant, in declaration order.
        &FRAME_CHECKLIST[id as usize]
    }

    /// One checklist line as it appears in prompts.
    pub fn prompt_line(&self) -> String {
        format!("{} ({}): {}", self.title, self.id, self.description)
    }
}
