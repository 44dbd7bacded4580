//! High-level database service layer.
//!
//! Repository-agnostic operations over the station's entities. These
//! functions hold the rules that must not depend on the storage backend:
//! existence checks before linking, subscription end-date derivation and
//! week-number validation.
//!
//! The eligibility-checked registration lives in
//! [`crate::services::registration`]; everything here is plain CRUD and
//! linking.
//!
//! # Usage
//!
//! ```no_run
//! use ski_station::db::{services, repositories::LocalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let skiers = services::retrieve_all_skiers(&repo).await?;
//!     println!("Found {} skiers", skiers.len());
//!     Ok(())
//! }
//! ```

use chrono::NaiveDate;
use log::{info, warn};

use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::models::{
    Course, CourseId, Instructor, InstructorId, Piste, PisteId, Registration, RegistrationId,
    Skier, SkierId, Subscription, SubscriptionId, SubscriptionType, Support,
};

// ==================== Health & Connection ====================

/// Pass-through to the repository's health check.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

fn require_week(week_number: u32) -> RepositoryResult<()> {
    if week_number == 0 {
        return Err(RepositoryError::validation(
            "Week number must be at least 1",
        ));
    }
    Ok(())
}

fn derive_end_date(subscription: Subscription) -> RepositoryResult<Subscription> {
    let start = subscription.start_date;
    subscription.with_derived_end_date().ok_or_else(|| {
        RepositoryError::validation(format!(
            "Subscription starting {} has no representable end date",
            start
        ))
    })
}

// ==================== Skier Operations ====================

/// Create a skier.
///
/// When `subscription` is given it is stored first, with its end date
/// derived from its type, and the new skier is linked to it.
pub async fn add_skier<R: FullRepository + ?Sized>(
    repo: &R,
    skier: &Skier,
    subscription: Option<Subscription>,
) -> RepositoryResult<Skier> {
    let mut skier = skier.clone();
    if let Some(subscription) = subscription {
        let stored = repo
            .insert_subscription(&derive_end_date(subscription)?)
            .await?;
        skier.subscription_id = stored.id;
    }

    let stored = repo.insert_skier(&skier).await?;
    info!(
        "Added skier {} {} (id={:?})",
        stored.first_name, stored.last_name, stored.id
    );
    Ok(stored)
}

pub async fn retrieve_skier<R: FullRepository + ?Sized>(
    repo: &R,
    id: SkierId,
) -> RepositoryResult<Skier> {
    repo.find_skier(id)
        .await?
        .ok_or_else(|| RepositoryError::entity_not_found("skier", id))
}

pub async fn retrieve_all_skiers<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<Skier>> {
    repo.list_skiers().await
}

/// Overwrite a skier. The referenced subscription and pistes must exist.
pub async fn update_skier<R: FullRepository + ?Sized>(
    repo: &R,
    skier: &Skier,
) -> RepositoryResult<Skier> {
    if let Some(subscription_id) = skier.subscription_id {
        retrieve_subscription(repo, subscription_id).await?;
    }
    for piste_id in &skier.piste_ids {
        retrieve_piste(repo, *piste_id).await?;
    }
    let updated = repo.update_skier(skier).await?;
    info!("Updated skier {:?}", updated.id);
    Ok(updated)
}

/// Remove a skier. Returns `false` when there was nothing to remove.
pub async fn remove_skier<R: FullRepository + ?Sized>(
    repo: &R,
    id: SkierId,
) -> RepositoryResult<bool> {
    let removed = repo.delete_skier(id).await?;
    if removed {
        info!("Removed skier {}", id);
    }
    Ok(removed)
}

pub async fn assign_skier_to_subscription<R: FullRepository + ?Sized>(
    repo: &R,
    skier_id: SkierId,
    subscription_id: SubscriptionId,
) -> RepositoryResult<Skier> {
    let mut skier = retrieve_skier(repo, skier_id).await?;
    retrieve_subscription(repo, subscription_id).await?;

    skier.subscription_id = Some(subscription_id);
    let updated = repo.update_skier(&skier).await?;
    info!(
        "Assigned subscription {} to skier {}",
        subscription_id, skier_id
    );
    Ok(updated)
}

/// Add a piste to the skier's set. Assigning the same piste twice is a no-op.
pub async fn assign_skier_to_piste<R: FullRepository + ?Sized>(
    repo: &R,
    skier_id: SkierId,
    piste_id: PisteId,
) -> RepositoryResult<Skier> {
    let mut skier = retrieve_skier(repo, skier_id).await?;
    retrieve_piste(repo, piste_id).await?;

    if !skier.piste_ids.insert(piste_id) {
        return Ok(skier);
    }
    let updated = repo.update_skier(&skier).await?;
    info!("Assigned piste {} to skier {}", piste_id, skier_id);
    Ok(updated)
}

/// Create a skier and one registration per week in `course_id`.
///
/// Bulk enrollment path: only existence and week numbers are checked,
/// capacity and age rules are not applied.
pub async fn add_skier_and_assign_to_course<R: FullRepository + ?Sized>(
    repo: &R,
    skier: &Skier,
    subscription: Option<Subscription>,
    weeks: &[u32],
    course_id: CourseId,
) -> RepositoryResult<(Skier, Vec<Registration>)> {
    retrieve_course(repo, course_id).await?;
    for week in weeks {
        require_week(*week)?;
    }

    let stored = add_skier(repo, skier, subscription).await?;
    let mut registrations = Vec::with_capacity(weeks.len());
    for week in weeks {
        let registration = Registration {
            id: None,
            week_number: *week,
            skier_id: stored.id,
            course_id: Some(course_id),
        };
        registrations.push(repo.insert_registration(&registration).await?);
    }

    info!(
        "Enrolled skier {:?} in course {} for {} week(s)",
        stored.id,
        course_id,
        registrations.len()
    );
    Ok((stored, registrations))
}

pub async fn retrieve_skiers_by_subscription_type<R: FullRepository + ?Sized>(
    repo: &R,
    subscription_type: SubscriptionType,
) -> RepositoryResult<Vec<Skier>> {
    repo.list_skiers_by_subscription_type(subscription_type)
        .await
}

// ==================== Course Operations ====================

pub async fn add_course<R: FullRepository + ?Sized>(
    repo: &R,
    course: &Course,
) -> RepositoryResult<Course> {
    let stored = repo.insert_course(course).await?;
    info!(
        "Added {} {} course (id={:?})",
        stored.course_type, stored.support, stored.id
    );
    Ok(stored)
}

pub async fn retrieve_course<R: FullRepository + ?Sized>(
    repo: &R,
    id: CourseId,
) -> RepositoryResult<Course> {
    repo.find_course(id)
        .await?
        .ok_or_else(|| RepositoryError::entity_not_found("course", id))
}

pub async fn retrieve_all_courses<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<Course>> {
    repo.list_courses().await
}

pub async fn update_course<R: FullRepository + ?Sized>(
    repo: &R,
    course: &Course,
) -> RepositoryResult<Course> {
    let updated = repo.update_course(course).await?;
    info!("Updated course {:?}", updated.id);
    Ok(updated)
}

pub async fn remove_course<R: FullRepository + ?Sized>(
    repo: &R,
    id: CourseId,
) -> RepositoryResult<bool> {
    let removed = repo.delete_course(id).await?;
    if removed {
        info!("Removed course {}", id);
    }
    Ok(removed)
}

// ==================== Instructor Operations ====================

pub async fn add_instructor<R: FullRepository + ?Sized>(
    repo: &R,
    instructor: &Instructor,
) -> RepositoryResult<Instructor> {
    for course_id in &instructor.course_ids {
        retrieve_course(repo, *course_id).await?;
    }
    let stored = repo.insert_instructor(instructor).await?;
    info!(
        "Added instructor {} {} (id={:?})",
        stored.first_name, stored.last_name, stored.id
    );
    Ok(stored)
}

pub async fn retrieve_instructor<R: FullRepository + ?Sized>(
    repo: &R,
    id: InstructorId,
) -> RepositoryResult<Instructor> {
    repo.find_instructor(id)
        .await?
        .ok_or_else(|| RepositoryError::entity_not_found("instructor", id))
}

pub async fn retrieve_all_instructors<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<Instructor>> {
    repo.list_instructors().await
}

pub async fn update_instructor<R: FullRepository + ?Sized>(
    repo: &R,
    instructor: &Instructor,
) -> RepositoryResult<Instructor> {
    for course_id in &instructor.course_ids {
        retrieve_course(repo, *course_id).await?;
    }
    let updated = repo.update_instructor(instructor).await?;
    info!("Updated instructor {:?}", updated.id);
    Ok(updated)
}

pub async fn remove_instructor<R: FullRepository + ?Sized>(
    repo: &R,
    id: InstructorId,
) -> RepositoryResult<bool> {
    let removed = repo.delete_instructor(id).await?;
    if removed {
        info!("Removed instructor {}", id);
    }
    Ok(removed)
}

/// Create an instructor already teaching `course_id`.
pub async fn add_instructor_and_assign_to_course<R: FullRepository + ?Sized>(
    repo: &R,
    instructor: &Instructor,
    course_id: CourseId,
) -> RepositoryResult<Instructor> {
    retrieve_course(repo, course_id).await?;
    let mut instructor = instructor.clone();
    instructor.course_ids.insert(course_id);
    add_instructor(repo, &instructor).await
}

// ==================== Piste Operations ====================

pub async fn add_piste<R: FullRepository + ?Sized>(
    repo: &R,
    piste: &Piste,
) -> RepositoryResult<Piste> {
    let stored = repo.insert_piste(piste).await?;
    info!("Added piste '{}' (id={:?})", stored.name, stored.id);
    Ok(stored)
}

pub async fn retrieve_piste<R: FullRepository + ?Sized>(
    repo: &R,
    id: PisteId,
) -> RepositoryResult<Piste> {
    repo.find_piste(id)
        .await?
        .ok_or_else(|| RepositoryError::entity_not_found("piste", id))
}

pub async fn retrieve_all_pistes<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<Piste>> {
    repo.list_pistes().await
}

pub async fn update_piste<R: FullRepository + ?Sized>(
    repo: &R,
    piste: &Piste,
) -> RepositoryResult<Piste> {
    let updated = repo.update_piste(piste).await?;
    info!("Updated piste {:?}", updated.id);
    Ok(updated)
}

pub async fn remove_piste<R: FullRepository + ?Sized>(
    repo: &R,
    id: PisteId,
) -> RepositoryResult<bool> {
    let removed = repo.delete_piste(id).await?;
    if removed {
        info!("Removed piste {}", id);
    }
    Ok(removed)
}

// ==================== Subscription Operations ====================

/// Store a subscription; the end date is always derived from the type.
pub async fn add_subscription<R: FullRepository + ?Sized>(
    repo: &R,
    subscription: Subscription,
) -> RepositoryResult<Subscription> {
    let stored = repo
        .insert_subscription(&derive_end_date(subscription)?)
        .await?;
    info!(
        "Added {} subscription {:?} ({} to {})",
        stored.subscription_type, stored.id, stored.start_date, stored.end_date
    );
    Ok(stored)
}

pub async fn retrieve_subscription<R: FullRepository + ?Sized>(
    repo: &R,
    id: SubscriptionId,
) -> RepositoryResult<Subscription> {
    repo.find_subscription(id)
        .await?
        .ok_or_else(|| RepositoryError::entity_not_found("subscription", id))
}

pub async fn retrieve_all_subscriptions<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<Subscription>> {
    repo.list_subscriptions().await
}

/// Overwrite a subscription. The end date is re-derived so it always
/// matches the stored start date and type.
pub async fn update_subscription<R: FullRepository + ?Sized>(
    repo: &R,
    subscription: Subscription,
) -> RepositoryResult<Subscription> {
    let updated = repo
        .update_subscription(&derive_end_date(subscription)?)
        .await?;
    info!("Updated subscription {:?}", updated.id);
    Ok(updated)
}

pub async fn remove_subscription<R: FullRepository + ?Sized>(
    repo: &R,
    id: SubscriptionId,
) -> RepositoryResult<bool> {
    let removed = repo.delete_subscription(id).await?;
    if removed {
        info!("Removed subscription {}", id);
    }
    Ok(removed)
}

/// Subscriptions of one type, ordered by start date.
pub async fn retrieve_subscriptions_by_type<R: FullRepository + ?Sized>(
    repo: &R,
    subscription_type: SubscriptionType,
) -> RepositoryResult<Vec<Subscription>> {
    repo.list_subscriptions_by_type(subscription_type).await
}

/// Subscriptions starting within `[start, end]`.
pub async fn retrieve_subscriptions_by_dates<R: FullRepository + ?Sized>(
    repo: &R,
    start: NaiveDate,
    end: NaiveDate,
) -> RepositoryResult<Vec<Subscription>> {
    if start > end {
        return Err(RepositoryError::validation(format!(
            "Range start {} is after range end {}",
            start, end
        )));
    }
    repo.list_subscriptions_between(start, end).await
}

// ==================== Registration Operations ====================

/// Store a registration linked to an existing skier, without a course.
pub async fn add_registration_and_assign_to_skier<R: FullRepository + ?Sized>(
    repo: &R,
    registration: &Registration,
    skier_id: SkierId,
) -> RepositoryResult<Registration> {
    require_week(registration.week_number)?;
    retrieve_skier(repo, skier_id).await?;

    let registration = Registration {
        id: None,
        skier_id: Some(skier_id),
        ..registration.clone()
    };
    let stored = repo.insert_registration(&registration).await?;
    info!(
        "Added registration {:?} for skier {} (week {})",
        stored.id, skier_id, stored.week_number
    );
    Ok(stored)
}

/// Attach an existing registration to a course.
///
/// Plain link update: capacity and age rules are not evaluated.
pub async fn assign_registration_to_course<R: FullRepository + ?Sized>(
    repo: &R,
    registration_id: RegistrationId,
    course_id: CourseId,
) -> RepositoryResult<Registration> {
    let mut registration = retrieve_registration(repo, registration_id).await?;
    retrieve_course(repo, course_id).await?;

    if registration.course_id.is_some_and(|current| current != course_id) {
        warn!(
            "Moving registration {} from course {:?} to {}",
            registration_id, registration.course_id, course_id
        );
    }
    registration.course_id = Some(course_id);
    repo.update_registration(&registration).await
}

pub async fn retrieve_registration<R: FullRepository + ?Sized>(
    repo: &R,
    id: RegistrationId,
) -> RepositoryResult<Registration> {
    repo.find_registration(id)
        .await?
        .ok_or_else(|| RepositoryError::entity_not_found("registration", id))
}

pub async fn retrieve_all_registrations<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<Registration>> {
    repo.list_registrations().await
}

/// Week numbers of every registration in a course taught by `instructor_id`
/// on `support`, ascending. A week appears once per registration.
pub async fn weeks_for_instructor_by_support<R: FullRepository + ?Sized>(
    repo: &R,
    instructor_id: InstructorId,
    support: Support,
) -> RepositoryResult<Vec<u32>> {
    let instructor = retrieve_instructor(repo, instructor_id).await?;

    let mut course_ids = Vec::new();
    for course_id in &instructor.course_ids {
        if let Some(course) = repo.find_course(*course_id).await? {
            if course.support == support {
                course_ids.push(*course_id);
            }
        }
    }
    if course_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut weeks: Vec<u32> = repo
        .list_registrations_for_courses(&course_ids)
        .await?
        .into_iter()
        .map(|r| r.week_number)
        .collect();
    weeks.sort_unstable();
    Ok(weeks)
}
