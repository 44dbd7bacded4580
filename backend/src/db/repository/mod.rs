//! Repository trait definitions for the persistence gateway.
//!
//! One focused trait per aggregate keeps implementations small and lets the
//! eligibility evaluator depend on exactly the queries it needs.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`health`]: Connectivity probe
//! - [`skier`], [`course`], [`instructor`], [`piste`], [`subscription`]:
//!   CRUD for each entity
//! - [`registration`]: Registration CRUD plus the counting queries used by
//!   the eligibility evaluator
//!
//! # Convenience Trait Bound
//!
//! For functions that need every capability, use [`FullRepository`]:
//!
//! ```ignore
//! async fn enroll<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let skier = repo.find_skier(SkierId::new(1)).await?;
//!     let taken = repo.count_registrations_for_course_week(CourseId::new(3), 5).await?;
//!     Ok(())
//! }
//! ```

pub mod course;
pub mod error;
pub mod health;
pub mod instructor;
pub mod piste;
pub mod registration;
pub mod skier;
pub mod subscription;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use course::CourseRepository;
pub use health::HealthRepository;
pub use instructor::InstructorRepository;
pub use piste::PisteRepository;
pub use registration::RegistrationRepository;
pub use skier::SkierRepository;
pub use subscription::SubscriptionRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type implementing every repository
/// trait, which makes `Arc<dyn FullRepository>` the handle shared by the
/// HTTP layer.
pub trait FullRepository:
    HealthRepository
    + SkierRepository
    + CourseRepository
    + InstructorRepository
    + PisteRepository
    + SubscriptionRepository
    + RegistrationRepository
{
}

impl<T> FullRepository for T where
    T: HealthRepository
        + SkierRepository
        + CourseRepository
        + InstructorRepository
        + PisteRepository
        + SubscriptionRepository
        + RegistrationRepository
{
}
