//! Skier persistence.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Skier, SkierId, SubscriptionType};

/// Repository trait for skiers.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait SkierRepository: Send + Sync {
    /// Store a new skier.
    ///
    /// Any `id` on the input is ignored; the returned skier carries the
    /// identifier assigned by the store.
    async fn insert_skier(&self, skier: &Skier) -> RepositoryResult<Skier>;

    /// Look up a skier by id. Absence is `Ok(None)`, not an error.
    async fn find_skier(&self, id: SkierId) -> RepositoryResult<Option<Skier>>;

    async fn list_skiers(&self) -> RepositoryResult<Vec<Skier>>;

    /// Overwrite an existing skier, including its piste set.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If no skier has `skier.id`
    /// * `Err(RepositoryError::ValidationError)` - If `skier.id` is `None`
    async fn update_skier(&self, skier: &Skier) -> RepositoryResult<Skier>;

    /// Remove a skier. Registrations keep their row with the skier detached.
    ///
    /// # Returns
    /// * `Ok(true)` if a skier was removed, `Ok(false)` if none existed
    async fn delete_skier(&self, id: SkierId) -> RepositoryResult<bool>;

    /// Skiers whose subscription has the given type.
    async fn list_skiers_by_subscription_type(
        &self,
        subscription_type: SubscriptionType,
    ) -> RepositoryResult<Vec<Skier>>;
}
