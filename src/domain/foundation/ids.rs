//! Strongly-typed identifier value objects.
//!
//! Both identifiers are opaque strings: appointment ids come from the
//! scheduling system and session ids are assigned by the session registry.
//! Neither format is validated beyond being non-empty.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Identifier of the appointment an intake belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(String);

impl AppointmentId {
    /// Creates a new AppointmentId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("appointment_id"));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AppointmentId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Opaque identifier of one interview session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntakeSessionId(String);

impl IntakeSessionId {
    /// Wraps a caller-supplied identifier, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("agent_session_id"));
        }
        Ok(Self(id))
    }

    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntakeSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IntakeSessionId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appointment_id_rejects_blank() {
        assert!(AppointmentId::new("").is_err());
        assert!(AppointmentId::new("   ").is_err());
    }

    #[test]
    fn appointment_id_keeps_value() {
        let id = AppointmentId::new("appt-42").unwrap();
        assert_eq!(id.as_str(), "appt-42");
        assert_eq!(id.to_string(), "appt-42");
    }

    #[test]
    fn session_id_accepts_any_non_empty_format() {
        let id: IntakeSessionId = "appt-42_0".parse().unwrap();
        assert_eq!(id.as_str(), "appt-42_0");
    }

    #[test]
    fn generated_session_ids_are_unique() {
        let a = IntakeSessionId::generate();
        let b = IntakeSessionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn session_id_serializes_transparently() {
        let id = IntakeSessionId::new("abc").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
