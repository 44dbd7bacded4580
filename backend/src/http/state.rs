//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::services::registration::{RegistrationGate, RegistrationPolicy};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn FullRepository>,
    /// Rule constants for eligibility-checked registration
    pub policy: RegistrationPolicy,
    /// Serializes registrations per course and week
    pub gate: RegistrationGate,
}

impl AppState {
    /// State with the default registration rules.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self::with_policy(repository, RegistrationPolicy::default())
    }

    pub fn with_policy(repository: Arc<dyn FullRepository>, policy: RegistrationPolicy) -> Self {
        Self {
            repository,
            policy,
            gate: RegistrationGate::new(),
        }
    }
}
