//! Sequential patient ID assignment and renumbering.

use super::Collection;
use crate::models::PatientId;

/// Next ID after the highest existing one; `P001` for an empty collection.
///
/// Gaps are never reused.
pub fn next_id(collection: &Collection) -> PatientId {
    let next = collection
        .keys()
        .map(PatientId::number)
        .max()
        .map_or(1, |max| max + 1);
    PatientId::from_number(next)
}

/// Reassign IDs `P001..P{n}` in ascending order of the current IDs.
///
/// Record contents are untouched; only the keys change. A record's ID is
/// therefore not stable across deletions of records before it.
pub fn renumber_after_delete(collection: Collection) -> Collection {
    collection
        .into_values()
        .enumerate()
        .map(|(index, record)| (PatientId::from_number(index as u64 + 1), record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, PatientFields, PatientRecord};

    fn record(name: &str) -> PatientRecord {
        PatientRecord::from_fields(PatientFields {
            name: name.into(),
            city: "Mumbai".into(),
            age: 45,
            gender: Gender::Others,
            height: 1.68,
            weight: 72.5,
        })
        .unwrap()
    }

    fn collection_of(ids: &[&str]) -> Collection {
        ids.iter()
            .map(|id| (PatientId::parse(id).unwrap(), record(id)))
            .collect()
    }

    fn keys(collection: &Collection) -> Vec<&str> {
        collection.keys().map(PatientId::as_str).collect()
    }

    #[test]
    fn test_next_id_empty() {
        assert_eq!(next_id(&Collection::new()).as_str(), "P001");
    }

    #[test]
    fn test_next_id_skips_gaps() {
        let collection = collection_of(&["P001", "P005", "P003"]);
        assert_eq!(next_id(&collection).as_str(), "P006");
    }

    #[test]
    fn test_next_id_widens_past_999() {
        let collection = collection_of(&["P999"]);
        assert_eq!(next_id(&collection).as_str(), "P1000");
    }

    #[test]
    fn test_next_id_accepts_unpadded() {
        let collection = collection_of(&["P7"]);
        assert_eq!(next_id(&collection).as_str(), "P008");
    }

    #[test]
    fn test_renumber_closes_gap() {
        let mut collection = collection_of(&["P001", "P002", "P003"]);
        collection.remove(&PatientId::parse("P002").unwrap());

        let renumbered = renumber_after_delete(collection);
        assert_eq!(keys(&renumbered), ["P001", "P002"]);
        // The record formerly at P003 moved down.
        assert_eq!(renumbered[&PatientId::from_number(2)].name, "P003");
    }

    #[test]
    fn test_renumber_uses_numeric_order() {
        let collection = collection_of(&["P1000", "P010", "P2"]);

        let renumbered = renumber_after_delete(collection);
        let names: Vec<_> = renumbered.values().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["P2", "P010", "P1000"]);
        assert_eq!(keys(&renumbered), ["P001", "P002", "P003"]);
    }

    #[test]
    fn test_renumber_empty() {
        assert!(renumber_after_delete(Collection::new()).is_empty());
    }
}
