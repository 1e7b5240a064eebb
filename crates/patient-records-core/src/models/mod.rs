//! Domain models for the patient record system.

mod patient;

pub use patient::*;
