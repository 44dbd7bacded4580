//! Registration persistence and the counting queries behind the
//! eligibility evaluator.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{CourseId, Registration, RegistrationId, SkierId};

/// Repository trait for registrations.
///
/// There is deliberately no delete operation: registrations are never removed.
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    async fn insert_registration(
        &self,
        registration: &Registration,
    ) -> RepositoryResult<Registration>;

    async fn find_registration(
        &self,
        id: RegistrationId,
    ) -> RepositoryResult<Option<Registration>>;

    async fn list_registrations(&self) -> RepositoryResult<Vec<Registration>>;

    /// Overwrite the skier/course links and week of an existing registration.
    async fn update_registration(
        &self,
        registration: &Registration,
    ) -> RepositoryResult<Registration>;

    /// Number of registrations held by `course_id` for `week_number`.
    async fn count_registrations_for_course_week(
        &self,
        course_id: CourseId,
        week_number: u32,
    ) -> RepositoryResult<i64>;

    /// Number of distinct registrations matching the exact
    /// `(week_number, skier_id, course_id)` triple.
    async fn count_registrations_for_skier_course_week(
        &self,
        week_number: u32,
        skier_id: SkierId,
        course_id: CourseId,
    ) -> RepositoryResult<i64>;

    /// Registrations attached to any of the given courses.
    async fn list_registrations_for_courses(
        &self,
        course_ids: &[CourseId],
    ) -> RepositoryResult<Vec<Registration>>;
}
