//! Patient Records Core Library
//!
//! Record management over a single JSON document of patients, with derived
//! health metrics (BMI and weight-status verdict).
//!
//! # Architecture
//!
//! ```text
//!   list / get / sort / create / update / delete      (PatientService)
//!                          │
//!          ┌───────────────┼────────────────┐
//!          ▼               ▼                ▼
//!   Schema & derived    ID lifecycle     RecordStore
//!   fields (models)     (next_id,        load() ──► whole collection
//!   validate, bmi,       renumber)       save() ◄── atomic replace
//!   verdict                                  │
//!                                            ▼
//!                                      patient.json
//! ```
//!
//! # Core Principle
//!
//! **Derived fields never drift.** Every path that writes a patient runs the
//! full schema, so `bmi` and `verdict` always match the stored height and
//! weight.
//!
//! IDs are dense: after every delete the collection is renumbered
//! `P001..P{n}`, so a patient's ID is not stable across deletions.
//!
//! # Modules
//!
//! - [`models`]: Domain types (PatientId, PatientRecord, PatientUpdate, etc.)
//! - [`store`]: JSON document store and ID assignment
//! - [`service`]: The six query/command operations

pub mod models;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use models::{
    Gender, Patch, Patient, PatientFields, PatientId, PatientRecord, PatientUpdate,
    ValidationError, ValidationErrors, Verdict,
};
pub use service::{DeletedPatient, PatientService, SortField, SortOrder};
pub use store::{Collection, RecordStore, StoreError};

// =========================================================================
// Error Type
// =========================================================================

/// Errors surfaced by patient operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Corrupt data: {0}")]
    CorruptData(#[source] StoreError),

    #[error("Persistence error: {0}")]
    Persistence(#[source] StoreError),
}

impl From<StoreError> for RecordsError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unreadable { .. } | StoreError::Malformed { .. } => {
                RecordsError::CorruptData(e)
            }
            StoreError::Encode { .. } | StoreError::Write { .. } => RecordsError::Persistence(e),
        }
    }
}

pub type RecordsResult<T> = Result<T, RecordsError>;
