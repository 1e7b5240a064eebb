//! Query and command operations over the patient collection.
//!
//! Each operation is one load → compute → (save) cycle against the record
//! store. No state is kept between calls.

mod sort;

pub use sort::*;

use tracing::{info, warn};

use crate::models::{Patient, PatientFields, PatientId, PatientRecord, PatientUpdate};
use crate::store::{next_id, renumber_after_delete, Collection, RecordStore};
use crate::{RecordsError, RecordsResult};

/// Outcome of a successful delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedPatient {
    /// The record as it was before removal
    pub record: PatientRecord,
    /// Collection size after renumbering
    pub remaining: usize,
}

/// The six patient operations.
#[derive(Debug, Clone)]
pub struct PatientService {
    store: RecordStore,
}

impl PatientService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Every patient, keyed by ID.
    pub fn list(&self) -> RecordsResult<Collection> {
        Ok(self.store.load()?)
    }

    /// A single patient's record.
    pub fn get(&self, id: &str) -> RecordsResult<PatientRecord> {
        let mut collection = self.store.load()?;
        let key = find(&collection, id)?;
        collection
            .remove(&key)
            .ok_or_else(|| RecordsError::NotFound(id.to_string()))
    }

    /// All records ordered by `sort_by` (`height`, `weight` or `bmi`).
    ///
    /// Arguments are checked before the collection is read.
    pub fn sort(&self, sort_by: &str, order: &str) -> RecordsResult<Vec<PatientRecord>> {
        let field: SortField = sort_by.parse()?;
        let order: SortOrder = order.parse()?;

        let records = self.store.load()?.into_values().collect();
        Ok(sort_records(records, field, order))
    }

    /// Validate and insert a new patient under a freshly generated ID.
    pub fn create(&self, fields: PatientFields) -> RecordsResult<PatientId> {
        let record = PatientRecord::from_fields(fields)?;

        let mut collection = self.store.load()?;
        let id = next_id(&collection);
        collection.insert(id.clone(), record);
        self.store.save(&collection)?;

        info!(patient_id = %id, count = collection.len(), "created patient");
        Ok(id)
    }

    /// Apply a partial update; derived fields are recomputed.
    pub fn update(&self, id: &str, update: PatientUpdate) -> RecordsResult<Patient> {
        let mut collection = self.store.load()?;
        let key = find(&collection, id)?;

        let existing = Patient {
            record: collection[&key].clone(),
            id: key,
        };
        let patient = existing.apply_update(update)?;
        collection.insert(patient.id.clone(), patient.record.clone());
        self.store.save(&collection)?;

        info!(patient_id = %patient.id, "updated patient");
        Ok(patient)
    }

    /// Remove a patient and renumber the rest to `P001..P{n}`.
    pub fn delete(&self, id: &str) -> RecordsResult<DeletedPatient> {
        let mut collection = self.store.load()?;
        let key = find(&collection, id)?;

        let record = collection
            .remove(&key)
            .ok_or_else(|| RecordsError::NotFound(id.to_string()))?;
        let renumbered = renumber_after_delete(collection);
        self.store.save(&renumbered)?;

        info!(patient_id = %key, remaining = renumbered.len(), "deleted patient and renumbered");
        Ok(DeletedPatient {
            record,
            remaining: renumbered.len(),
        })
    }
}

/// Resolve `id` to a key present in `collection`.
fn find(collection: &Collection, id: &str) -> RecordsResult<PatientId> {
    match PatientId::parse(id) {
        Some(key) if collection.contains_key(&key) => Ok(key),
        _ => {
            warn!(patient_id = id, "patient not found");
            Err(RecordsError::NotFound(id.to_string()))
        }
    }
}
