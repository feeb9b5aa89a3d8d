//! Clinical Intake - conversational pre-screening service
//!
//! Interviews a patient ahead of an appointment, one question at a time,
//! until every frame of the subjective assessment is covered, then asks the
//! oracle for a structured report.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
