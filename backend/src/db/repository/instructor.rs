use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Instructor, InstructorId};

/// Repository trait for instructors and the courses they teach.
#[async_trait]
pub trait InstructorRepository: Send + Sync {
    async fn insert_instructor(&self, instructor: &Instructor) -> RepositoryResult<Instructor>;

    async fn find_instructor(&self, id: InstructorId) -> RepositoryResult<Option<Instructor>>;

    async fn list_instructors(&self) -> RepositoryResult<Vec<Instructor>>;

    /// Overwrite an existing instructor including the course set; `NotFound` if absent.
    async fn update_instructor(&self, instructor: &Instructor) -> RepositoryResult<Instructor>;

    async fn delete_instructor(&self, id: InstructorId) -> RepositoryResult<bool>;
}
