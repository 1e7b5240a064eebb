//! Patient models.

use std::cmp::Ordering;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

const HEALTHY_MIN_BMI: f64 = 18.5;
const OVERWEIGHT_MIN_BMI: f64 = 25.0;
const OBESE_MIN_BMI: f64 = 30.0;

// =========================================================================
// Identity
// =========================================================================

/// Patient identifier: `P` followed by a decimal sequence number (`P001`).
///
/// The original spelling is kept so that documents written elsewhere
/// (`P1`, `P0007`) survive a load/save cycle untouched. Ordering is by
/// sequence number first, then by spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatientId {
    raw: String,
    number: u64,
}

impl PatientId {
    /// Canonical ID for a sequence number, zero-padded to three digits.
    pub fn from_number(number: u64) -> Self {
        Self {
            raw: format!("P{:03}", number),
            number,
        }
    }

    /// Parse an existing ID. Returns `None` unless the input is `P` + digits.
    ///
    /// `u64::MAX` is rejected so every valid ID has a successor.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = raw.strip_prefix('P')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number = digits.parse::<u64>().ok().filter(|n| *n < u64::MAX)?;
        Some(Self {
            raw: raw.to_string(),
            number,
        })
    }

    /// Numeric suffix.
    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Ord for PatientId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number
            .cmp(&other.number)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for PatientId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for PatientId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for PatientId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PatientId::parse(&raw).ok_or_else(|| {
            de::Error::custom(format!(
                "invalid patient id `{}`: expected `P` followed by digits",
                raw
            ))
        })
    }
}

// =========================================================================
// Enumerations
// =========================================================================

/// Gender as recorded on intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Others,
}

/// Weight-status category derived from BMI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Underweight,
    #[serde(rename = "Healthy weight")]
    HealthyWeight,
    Overweight,
    Obese,
}

impl Verdict {
    /// Classify a (rounded) BMI. Lower bounds are inclusive.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < HEALTHY_MIN_BMI {
            Verdict::Underweight
        } else if bmi < OVERWEIGHT_MIN_BMI {
            Verdict::HealthyWeight
        } else if bmi < OBESE_MIN_BMI {
            Verdict::Overweight
        } else {
            Verdict::Obese
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Underweight => "Underweight",
            Verdict::HealthyWeight => "Healthy weight",
            Verdict::Overweight => "Overweight",
            Verdict::Obese => "Obese",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// BMI in kg/m², rounded to two decimal places.
///
/// Rounds the exact binary value half-to-even, so `7.625` gives `7.62` and
/// `25.025` (stored just below the tie) gives `25.02`.
pub fn compute_bmi(weight_kg: f64, height_m: f64) -> f64 {
    let bmi = weight_kg / (height_m * height_m);
    format!("{:.2}", bmi).parse().unwrap_or(bmi)
}

// =========================================================================
// Validation errors
// =========================================================================

/// A single failed field constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every constraint a payload failed, in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    fn check(errors: Vec<ValidationError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self(errors))
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(e: ValidationError) -> Self {
        Self(vec![e])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// =========================================================================
// Patient attributes
// =========================================================================

/// Core attributes supplied by a client. Derived fields are never accepted
/// as input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientFields {
    /// Full name
    pub name: String,
    /// City of residence
    pub city: String,
    /// Age in years
    pub age: i64,
    pub gender: Gender,
    /// Height in meters
    pub height: f64,
    /// Weight in kilograms
    pub weight: f64,
}

impl PatientFields {
    /// Check every field constraint, collecting all failures.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::new("name", "must not be empty"));
        }
        if self.city.trim().is_empty() {
            errors.push(ValidationError::new("city", "must not be empty"));
        }
        if self.age <= 0 {
            errors.push(ValidationError::new("age", "must be greater than 0"));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            errors.push(ValidationError::new("height", "must be greater than 0"));
        }
        if !(self.weight.is_finite() && self.weight > 0.0) {
            errors.push(ValidationError::new("weight", "must be greater than 0"));
        }

        ValidationErrors::check(errors)
    }
}

/// A patient as persisted in the backing document (the ID is the map key).
///
/// Everything beyond the four identity attributes is optional on load so
/// that legacy documents still list; every record this crate writes
/// carries all of them. Sorting treats a missing numeric field as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub name: String,
    pub city: String,
    pub age: i64,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

impl PatientRecord {
    /// Validate attributes and compute the derived fields.
    pub fn from_fields(fields: PatientFields) -> Result<Self, ValidationErrors> {
        fields.validate()?;

        let bmi = compute_bmi(fields.weight, fields.height);
        Ok(Self {
            name: fields.name,
            city: fields.city,
            age: fields.age,
            gender: fields.gender,
            height: Some(fields.height),
            weight: Some(fields.weight),
            bmi: Some(bmi),
            verdict: Some(Verdict::from_bmi(bmi)),
        })
    }
}

/// A patient together with its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    pub id: PatientId,
    pub record: PatientRecord,
}

impl Patient {
    /// Validate an ID and attribute set into a full patient.
    pub fn validate(id: &str, fields: PatientFields) -> Result<Self, ValidationErrors> {
        let id_result = if id.is_empty() {
            Err(ValidationError::new("id", "must not be empty"))
        } else {
            PatientId::parse(id)
                .ok_or_else(|| ValidationError::new("id", "must be `P` followed by digits"))
        };
        let record_result = PatientRecord::from_fields(fields);

        match (id_result, record_result) {
            (Ok(id), Ok(record)) => Ok(Self { id, record }),
            (Err(id_err), Ok(_)) => Err(id_err.into()),
            (Ok(_), Err(errors)) => Err(errors),
            (Err(id_err), Err(errors)) => {
                let mut all = vec![id_err];
                all.extend(errors.0);
                Err(ValidationErrors(all))
            }
        }
    }

    /// Merge a partial update over this patient and re-validate the result.
    ///
    /// The ID is kept. BMI and verdict are always recomputed from the merged
    /// height and weight. A legacy record missing `height` or `weight` must
    /// have them supplied by the update.
    pub fn apply_update(&self, update: PatientUpdate) -> Result<Self, ValidationErrors> {
        let record = &self.record;
        let mut errors = Vec::new();

        let name = update.name.resolve("name", Some(record.name.clone()), &mut errors);
        let city = update.city.resolve("city", Some(record.city.clone()), &mut errors);
        let age = update.age.resolve("age", Some(record.age), &mut errors);
        let gender = update.gender.resolve("gender", Some(record.gender), &mut errors);
        let height = update.height.resolve("height", record.height, &mut errors);
        let weight = update.weight.resolve("weight", record.weight, &mut errors);

        match (name, city, age, gender, height, weight) {
            (Some(name), Some(city), Some(age), Some(gender), Some(height), Some(weight))
                if errors.is_empty() =>
            {
                Self::validate(
                    self.id.as_str(),
                    PatientFields {
                        name,
                        city,
                        age,
                        gender,
                        height,
                        weight,
                    },
                )
            }
            _ => Err(ValidationErrors(errors)),
        }
    }
}

// =========================================================================
// Partial updates
// =========================================================================

/// One field of a partial update.
///
/// Distinguishes a field that was left out (`Absent`) from one that was
/// sent as JSON `null` (`Null`). Only `Set` changes the stored value;
/// `Null` is rejected because no patient attribute is nullable.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Absent,
    Null,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    fn resolve(
        self,
        field: &str,
        existing: Option<T>,
        errors: &mut Vec<ValidationError>,
    ) -> Option<T> {
        match self {
            Patch::Set(value) => Some(value),
            Patch::Absent if existing.is_some() => existing,
            Patch::Absent => {
                errors.push(ValidationError::new(field, "field required"));
                None
            }
            Patch::Null => {
                errors.push(ValidationError::new(field, "must not be null"));
                None
            }
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Set(value),
            None => Patch::Null,
        })
    }
}

/// Partial update payload: any subset of the core attributes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PatientUpdate {
    pub name: Patch<String>,
    pub city: Patch<String>,
    pub age: Patch<i64>,
    pub gender: Patch<Gender>,
    pub height: Patch<f64>,
    pub weight: Patch<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(height: f64, weight: f64) -> PatientFields {
        PatientFields {
            name: "Ananya Verma".into(),
            city: "Guwahati".into(),
            age: 28,
            gender: Gender::Female,
            height,
            weight,
        }
    }

    #[test]
    fn test_bmi_rounding() {
        assert_eq!(compute_bmi(70.0, 1.75), 22.86);
        assert_eq!(compute_bmi(55.0, 1.65), 20.2);
        assert_eq!(compute_bmi(90.0, 1.8), 27.78);

        // Exact tie and near-ties of the unrounded quotient.
        assert_eq!(compute_bmi(30.5, 2.0), 7.62);
        assert_eq!(compute_bmi(100.1, 2.0), 25.02);
        assert_eq!(compute_bmi(120.1, 2.0), 30.02);
    }

    #[test]
    fn test_verdict_boundaries() {
        assert_eq!(Verdict::from_bmi(18.49), Verdict::Underweight);
        assert_eq!(Verdict::from_bmi(18.5), Verdict::HealthyWeight);
        assert_eq!(Verdict::from_bmi(24.99), Verdict::HealthyWeight);
        assert_eq!(Verdict::from_bmi(25.0), Verdict::Overweight);
        assert_eq!(Verdict::from_bmi(29.99), Verdict::Overweight);
        assert_eq!(Verdict::from_bmi(30.0), Verdict::Obese);
    }

    #[test]
    fn test_record_boundaries_through_schema() {
        let record = PatientRecord::from_fields(fields(1.0, 18.5)).unwrap();
        assert_eq!(record.bmi, Some(18.5));
        assert_eq!(record.verdict, Some(Verdict::HealthyWeight));

        let record = PatientRecord::from_fields(fields(1.0, 25.0)).unwrap();
        assert_eq!(record.verdict, Some(Verdict::Overweight));

        let record = PatientRecord::from_fields(fields(1.0, 30.0)).unwrap();
        assert_eq!(record.verdict, Some(Verdict::Obese));
    }

    #[test]
    fn test_validation_collects_all_failures() {
        let bad = PatientFields {
            name: "".into(),
            city: "  ".into(),
            age: 0,
            gender: Gender::Others,
            height: -1.0,
            weight: 0.0,
        };

        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.errors().len(), 5);
        for field in ["name", "city", "age", "height", "weight"] {
            assert!(errors.has_field(field), "missing error for {}", field);
        }
    }

    #[test]
    fn test_patient_validate_checks_id() {
        let patient = Patient::validate("P007", fields(1.7, 65.0)).unwrap();
        assert_eq!(patient.id.number(), 7);

        let errors = Patient::validate("", fields(1.7, 65.0)).unwrap_err();
        assert!(errors.has_field("id"));

        let errors = Patient::validate("X1", fields(1.7, -65.0)).unwrap_err();
        assert!(errors.has_field("id"));
        assert!(errors.has_field("weight"));
    }

    #[test]
    fn test_patient_id_parse_and_order() {
        assert_eq!(PatientId::from_number(1).as_str(), "P001");
        assert_eq!(PatientId::from_number(1000).as_str(), "P1000");

        let p1 = PatientId::parse("P1").unwrap();
        assert_eq!(p1.number(), 1);
        assert_eq!(p1.as_str(), "P1");

        assert!(PatientId::parse("P").is_none());
        assert!(PatientId::parse("p001").is_none());
        assert!(PatientId::parse("P-01").is_none());
        assert!(PatientId::parse("P99999999999999999999999").is_none());

        let mut ids = vec![
            PatientId::parse("P1000").unwrap(),
            PatientId::parse("P999").unwrap(),
            PatientId::parse("P002").unwrap(),
        ];
        ids.sort();
        let ordered: Vec<_> = ids.iter().map(PatientId::as_str).collect();
        assert_eq!(ordered, ["P002", "P999", "P1000"]);
    }

    fn patient(height: f64, weight: f64) -> Patient {
        Patient::validate("P004", fields(height, weight)).unwrap()
    }

    #[test]
    fn test_update_weight_only() {
        let patient = patient(1.6, 50.0);
        let update = PatientUpdate {
            weight: Patch::Set(80.0),
            ..Default::default()
        };

        let updated = patient.apply_update(update).unwrap();
        assert_eq!(updated.id, patient.id);

        let (record, before) = (updated.record, patient.record);
        assert_eq!(record.weight, Some(80.0));
        assert_eq!(record.bmi, Some(31.25));
        assert_eq!(record.verdict, Some(Verdict::Obese));
        assert_eq!(record.name, before.name);
        assert_eq!(record.city, before.city);
        assert_eq!(record.age, before.age);
        assert_eq!(record.gender, before.gender);
        assert_eq!(record.height, before.height);
    }

    #[test]
    fn test_update_rejects_non_positive_weight() {
        let update = PatientUpdate {
            weight: Patch::Set(0.0),
            ..Default::default()
        };

        let errors = patient(1.6, 50.0).apply_update(update).unwrap_err();
        assert!(errors.has_field("weight"));
    }

    #[test]
    fn test_update_deserialization_distinguishes_null() {
        let update: PatientUpdate = serde_json::from_str(r#"{"city": null, "age": 31}"#).unwrap();
        assert_eq!(update.city, Patch::Null);
        assert_eq!(update.age, Patch::Set(31));
        assert_eq!(update.name, Patch::Absent);

        let errors = patient(1.6, 50.0).apply_update(update).unwrap_err();
        assert_eq!(errors.errors(), &[ValidationError::new("city", "must not be null")]);
    }

    #[test]
    fn test_update_fills_legacy_record_missing_measurements() {
        let json = r#"{"name":"Old","city":"Pune","age":40,"gender":"male","weight":70.0}"#;
        let legacy = Patient {
            id: PatientId::from_number(1),
            record: serde_json::from_str(json).unwrap(),
        };
        assert_eq!(legacy.record.height, None);

        let errors = legacy.apply_update(PatientUpdate::default()).unwrap_err();
        assert_eq!(errors.errors(), &[ValidationError::new("height", "field required")]);

        let update = PatientUpdate {
            height: Patch::Set(2.0),
            ..Default::default()
        };
        let updated = legacy.apply_update(update).unwrap();
        assert_eq!(updated.record.height, Some(2.0));
        assert_eq!(updated.record.bmi, Some(17.5));
        assert_eq!(updated.record.verdict, Some(Verdict::Underweight));
    }

    #[test]
    fn test_record_json_shape() {
        let record = PatientRecord::from_fields(fields(1.0, 18.5)).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["gender"], "female");
        assert_eq!(json["verdict"], "Healthy weight");
        assert_eq!(json["bmi"], 18.5);
    }

    #[test]
    fn test_legacy_record_without_derived_fields() {
        let json =
            r#"{"name":"Old","city":"Pune","age":40,"gender":"male","height":1.7,"weight":70.0}"#;
        let record: PatientRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.bmi, None);
        assert_eq!(record.verdict, None);

        let out = serde_json::to_value(&record).unwrap();
        assert!(out.get("bmi").is_none());
        assert_eq!(out["height"], 1.7);
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Derived fields always agree with the stored height and weight.
        #[test]
        fn derived_fields_match_inputs(height in 0.3..2.5f64, weight in 1.0..300.0f64) {
            let record = PatientRecord::from_fields(PatientFields {
                name: "P".into(),
                city: "C".into(),
                age: 30,
                gender: Gender::Male,
                height,
                weight,
            }).unwrap();

            let bmi = record.bmi.unwrap();
            prop_assert_eq!(bmi, compute_bmi(weight, height));
            prop_assert_eq!(record.verdict, Some(Verdict::from_bmi(bmi)));
        }

        /// Any update that passes validation leaves bmi consistent.
        #[test]
        fn update_keeps_derived_fields_consistent(
            new_height in proptest::option::of(0.3..2.5f64),
            new_weight in proptest::option::of(1.0..300.0f64),
        ) {
            let patient = Patient::validate("P001", PatientFields {
                name: "P".into(),
                city: "C".into(),
                age: 30,
                gender: Gender::Male,
                height: 1.7,
                weight: 70.0,
            }).unwrap();

            let update = PatientUpdate {
                height: new_height.map(Patch::Set).unwrap_or_default(),
                weight: new_weight.map(Patch::Set).unwrap_or_default(),
                ..Default::default()
            };
            let updated = patient.apply_update(update).unwrap().record;
            let (height, weight) = (updated.height.unwrap(), updated.weight.unwrap());

            prop_assert_eq!(updated.bmi, Some(compute_bmi(weight, height)));
            prop_assert_eq!(updated.verdict, Some(Verdict::from_bmi(updated.bmi.unwrap())));
        }
    }
}
