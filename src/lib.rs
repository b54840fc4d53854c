//! Barangay Registry - records service for barangay administration
//!
//! Keeps the village hall's books in one SQLite file and serves them over a
//! JSON API to the dashboard client.
//!
//! ## Records
//!
//! - **Registry**: households (with computed statistics), residents tagged
//!   by sector, barangay officials
//! - **Certificates**: clearances, residency and indigency certificates,
//!   business permits, each with a control number and a printable template
//! - **Blotter**: incident cases with parties, hearings and a status trail
//! - **Finance**: the Annual Investment Program, its projects, expenses,
//!   milestones and the ledger of income and expense transactions
//! - **Reports**: chart-ready aggregates plus CSV and PDF exports
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.local/share/barangay-registry/
//! ├── registry.db            # SQLite database
//! └── config.toml            # Configuration
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod reports;
pub mod seed;
pub mod services;
pub mod views;

pub use config::Config;
pub use db::Database;
pub use error::{RegistryError, Result};
pub use http::{dispatch, ApiRequest, HttpServer};
pub use seed::{SeedOptions, SeedSummary};
pub use services::{EventBus, RegistryEvent, Services};
