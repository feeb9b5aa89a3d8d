//! Intake lifecycle state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle of one interview session.
///
/// - `Uninitialized`: created, opening question not yet obtained
/// - `AwaitingPatientInput`: an interviewer question is pending an answer
/// - `Complete`: a structured report was produced
/// - `Escalated`: the patient was directed to emergency care
/// - `Failed`: completion was signalled but no valid report could be built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntakeState {
    #[default]
    Uninitialized,
    AwaitingPatientInput,
    Complete,
    Escalated,
    Failed,
}

impl IntakeState {
    /// Returns true if the session can take a patient answer.
    pub fn accepts_answers(&self) -> bool {
        matches!(self, Self::AwaitingPatientInput)
    }

    /// Returns true once the session has ended, successfully or not.
    pub fn is_finalized(&self) -> bool {
        self.is_terminal()
    }
}

impl StateMachine for IntakeState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use IntakeState::*;
        matches!(
            (self, target),
            (Uninitialized, AwaitingPatientInput)
                | (AwaitingPatientInput, AwaitingPatientInput)
                | (AwaitingPatientInput, Complete)
                | (AwaitingPatientInput, Escalated)
                | (AwaitingPatientInput, Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use IntakeState::*;
        match self {
            Uninitialized => vec![AwaitingPatientInput],
            AwaitingPatientInput => vec![AwaitingPatientInput, Complete, Escalated, Failed],
            Complete | Escalated | Failed => vec![],
        }
    }
}
