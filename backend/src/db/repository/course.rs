use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Course, CourseId};

/// Repository trait for courses.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn insert_course(&self, course: &Course) -> RepositoryResult<Course>;

    /// Look up a course by id. Absence is `Ok(None)`, not an error.
    async fn find_course(&self, id: CourseId) -> RepositoryResult<Option<Course>>;

    async fn list_courses(&self) -> RepositoryResult<Vec<Course>>;

    /// Overwrite an existing course; `NotFound` if absent.
    async fn update_course(&self, course: &Course) -> RepositoryResult<Course>;

    /// Remove a course. Instructors stop teaching it and registrations keep
    /// their row with the course detached.
    async fn delete_course(&self, id: CourseId) -> RepositoryResult<bool>;
}
