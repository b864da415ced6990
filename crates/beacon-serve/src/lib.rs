//! Beacon Serve - HTTP API for widget analytics.
//!
//! This crate provides the REST API around the beacon ingestion pipeline
//! and its SQLite log store: beacon submission endpoints, authenticated log
//! retrieval, aggregate count queries, and project registration.
//!
//! # Authentication
//!
//! Beacon submission is unauthenticated by design (widgets post from
//! arbitrary origins). Log retrieval requires the project's secret as a
//! Bearer token; only the secret's digest is ever stored.
//!
//! # Architecture
//!
//! - **AppState**: Shared application state (store, pipeline, configuration)
//! - **Auth**: Bearer secret to project id resolution
//! - **Routes**: Endpoint handlers grouped by domain

mod auth;
pub mod cache;
mod error;
mod mailer;
mod routes;
mod state;

pub use self::cache::{ResponseCache, get_or_compute, new_cache};
pub use self::error::ApiError;
pub use self::mailer::Mailer;
pub use self::routes::router;
pub use self::state::{AppState, Config, MailConfig};
