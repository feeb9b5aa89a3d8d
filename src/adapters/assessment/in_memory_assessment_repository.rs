//! In-Memory Assessment Repository
//!
//! Keeps pre-assessment records in memory, keyed by appointment.
//! Used for development and tests; the clinic's appointment store is the
//! production consumer.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{AppointmentId, DomainError};
use crate::domain::intake::AssessmentRecord;
use crate::ports::AssessmentRepository;

/// In-memory storage for assessment records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssessmentRepository {
    records: Arc<RwLock<HashMap<AppointmentId, AssessmentRecord>>>,
}

impl InMemoryAssessmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Clear all stored data (useful for tests)
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl AssessmentRepository for InMemoryAssessmentRepository {
    async fn save(&self, record: &AssessmentRecord) -> Result<(), DomainError> {
        self.records
            .write()
            .await
            .insert(record.appointment_id.clone(), record.clone());
        Ok(())
    }

    async fn find_by_appointment(
        &self,
        appointment_id: &AppointmentId,
    ) -> Result<Option<AssessmentRecord>, DomainError> {
        Ok(self.records.read().await.get(appointment_id).cloned())
    }
}
