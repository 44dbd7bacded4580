//! # Ski Station Backend
//!
//! Registration backend for a ski station: skiers, courses, instructors,
//! pistes, subscriptions and the weekly course registrations that tie them
//! together.
//!
//! ## Architecture
//!
//! - [`models`]: domain entities, typed identifiers and closed vocabularies
//! - [`db`]: repository traits, in-memory and PostgreSQL backends, CRUD services
//! - [`services`]: eligibility-checked registration (age and capacity rules)
//! - [`http`]: Axum-based HTTP server and request handlers
//! - [`api`]: re-exports for consumers of the crate

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;
pub mod models;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
