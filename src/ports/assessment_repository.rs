//! Assessment repository port.
//!
//! Receives the outcome of every intake keyed by appointment. Real
//! persistence (the clinic's appointment store) lives outside this service.

use async_trait::async_trait;

use crate::domain::foundation::{AppointmentId, DomainError};
use crate::domain::intake::AssessmentRecord;

/// Repository port for appointment pre-assessments.
#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// Insert or replace the record for its appointment.
    ///
    /// # Errors
    ///
    /// - `RepositoryError` on persistence failure
    async fn save(&self, record: &AssessmentRecord) -> Result<(), DomainError>;

    /// Find the record for an appointment.
    ///
    /// Returns `None` if no intake was ever started for it.
    async fn find_by_appointment(
        &self,
        appointment_id: &AppointmentId,
    ) -> Result<Option<AssessmentRecord>, DomainError>;
}
