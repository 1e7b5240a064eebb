//! Patient Records HTTP Server
//!
//! Exposes the [`patient_records_core::PatientService`] operations over HTTP:
//!
//! | Method & Path          | Operation |
//! |------------------------|-----------|
//! | `GET /patients`        | list      |
//! | `GET /patients/{id}`   | get       |
//! | `GET /sort`            | sort      |
//! | `POST /create`         | create    |
//! | `PUT /edit/{id}`       | update    |
//! | `DELETE /delete/{id}`  | delete    |
//!
//! # Modules
//!
//! - [`config`]: TOML/CLI/environment configuration
//! - [`error`]: Error-to-response mapping
//! - [`routes`]: Router and handlers

pub mod config;
pub mod error;
pub mod routes;

pub use config::{Cli, ServerConfig};
pub use error::ApiError;
pub use routes::{router, AppState};
