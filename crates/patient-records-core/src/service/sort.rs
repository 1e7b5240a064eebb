//! Ordering of patient records by a numeric attribute.

use std::fmt;
use std::str::FromStr;

use crate::models::PatientRecord;
use crate::RecordsError;

/// Attribute a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Height,
    Weight,
    Bmi,
}

impl SortField {
    pub const ALL: [SortField; 3] = [SortField::Height, SortField::Weight, SortField::Bmi];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Height => "height",
            SortField::Weight => "weight",
            SortField::Bmi => "bmi",
        }
    }

    /// Sort key for a record. A missing value (legacy data) sorts as 0.
    pub fn value(&self, record: &PatientRecord) -> f64 {
        let value = match self {
            SortField::Height => record.height,
            SortField::Weight => record.weight,
            SortField::Bmi => record.bmi,
        };
        value.unwrap_or(0.0)
    }
}

impl FromStr for SortField {
    type Err = RecordsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<_> = SortField::ALL.iter().map(SortField::as_str).collect();
                RecordsError::InvalidArgument(format!(
                    "Invalid field. Must be one of: {}",
                    names.join(", ")
                ))
            })
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = RecordsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(RecordsError::InvalidArgument(
                "Order must be \"asc\" or \"desc\"".to_string(),
            )),
        }
    }
}

/// Stable sort of `records` by `field`.
///
/// Equal keys keep their input order in both directions.
pub fn sort_records(
    mut records: Vec<PatientRecord>,
    field: SortField,
    order: SortOrder,
) -> Vec<PatientRecord> {
    records.sort_by(|a, b| {
        let (a, b) = (field.value(a), field.value(b));
        match order {
            SortOrder::Asc => a.total_cmp(&b),
            SortOrder::Desc => b.total_cmp(&a),
        }
    });
    records
}
