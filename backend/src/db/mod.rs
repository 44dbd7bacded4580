//! Persistence for the ski station.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP API (http/)                                        │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Services (db/services.rs, services/registration.rs)     │
//! │  - CRUD and linking                                      │
//! │  - Registration eligibility                              │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/)                         │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴────────────────┐
//!     │                                │
//! ┌───▼──────────────┐     ┌───────────▼─────────────┐
//! │ Postgres (Diesel) │     │ Local (in-memory)       │
//! └──────────────────┘     └─────────────────────────┘
//! ```
//!
//! # Recommended Usage
//!
//! ```ignore
//! use ski_station::db::{services, RepositoryFactory};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = RepositoryFactory::from_env().await?;
//!     let courses = services::retrieve_all_courses(repo.as_ref()).await?;
//!     Ok(())
//! }
//! ```

// With postgres-repo enabled the global repository follows RepositoryType::from_env.
#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

#[cfg(test)]
#[path = "services_tests.rs"]
mod services_tests;

#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::PostgresConfig;
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    CourseRepository, ErrorContext, FullRepository, HealthRepository, InstructorRepository,
    PisteRepository, RegistrationRepository, RepositoryError, RepositoryResult, SkierRepository,
    SubscriptionRepository,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

#[cfg(feature = "postgres-repo")]
async fn create_selected_repository() -> RepositoryResult<Arc<dyn FullRepository>> {
    match RepositoryType::from_env() {
        RepositoryType::Local => Ok(RepositoryFactory::create_local()),
        RepositoryType::Postgres => {
            let config = PostgresConfig::from_env().map_err(RepositoryError::configuration)?;
            let repo = RepositoryFactory::create_postgres(&config).await?;
            Ok(repo as Arc<dyn FullRepository>)
        }
    }
}

#[cfg(all(feature = "local-repo", not(feature = "postgres-repo")))]
async fn create_selected_repository() -> RepositoryResult<Arc<dyn FullRepository>> {
    Ok(RepositoryFactory::create_local())
}

/// Initialize the global repository singleton for the selected backend.
///
/// Must be called from within a Tokio runtime. Calling it again after a
/// successful initialization is a no-op.
pub async fn init_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if let Some(repo) = REPOSITORY.get() {
        return Ok(repo);
    }

    let repo = create_selected_repository()
        .await
        .context("Failed to initialize repository")?;
    Ok(REPOSITORY.get_or_init(|| repo))
}
