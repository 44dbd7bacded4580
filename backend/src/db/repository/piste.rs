use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Piste, PisteId};

/// Repository trait for pistes.
#[async_trait]
pub trait PisteRepository: Send + Sync {
    async fn insert_piste(&self, piste: &Piste) -> RepositoryResult<Piste>;

    async fn find_piste(&self, id: PisteId) -> RepositoryResult<Option<Piste>>;

    async fn list_pistes(&self) -> RepositoryResult<Vec<Piste>>;

    async fn update_piste(&self, piste: &Piste) -> RepositoryResult<Piste>;

    /// Remove a piste; skiers that used it lose the reference.
    async fn delete_piste(&self, id: PisteId) -> RepositoryResult<bool>;
}
