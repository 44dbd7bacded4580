use async_trait::async_trait;

use super::error::RepositoryResult;

/// Connectivity probe for the storage backend.
#[async_trait]
pub trait HealthRepository: Send + Sync {
    /// Check if the database connection is healthy.
    ///
    /// # Returns
    /// - `Ok(true)` if connection is healthy
    /// - `Ok(false)` if connection is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;
}
