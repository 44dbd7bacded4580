//! Eligibility-checked course registration.
//!
//! A skier may join a course for a given week only if:
//!
//! 1. the skier exists,
//! 2. the course exists,
//! 3. the skier is not already registered to that course for that week,
//! 4. the skier's age fits the course type, and
//! 5. the course still has room that week.
//!
//! Checks run in that order and stop at the first failure. A failed check
//! is an expected outcome and is returned as [`RegistrationOutcome::Rejected`]
//! with a [`RejectionReason`]; only persistence faults surface as `Err`.
//!
//! The whole check-then-insert sequence for one `(course, week)` runs under
//! a lock held by [`RegistrationGate`], so concurrent requests in the same
//! process cannot both pass the duplicate or capacity check.

use chrono::{Local, NaiveDate};
use log::{info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::db::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::models::{CourseId, CourseType, Registration, RegistrationRecord, SkierId};

/// Maximum registrations one course accepts for a single week.
pub const DEFAULT_COURSE_CAPACITY: u32 = 6;

/// Age from which a skier counts as an adult.
pub const DEFAULT_ADULT_AGE: u32 = 16;

/// Rule constants applied by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationPolicy {
    pub course_capacity: u32,
    pub adult_age: u32,
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            course_capacity: DEFAULT_COURSE_CAPACITY,
            adult_age: DEFAULT_ADULT_AGE,
        }
    }
}

fn env_u32(key: &str) -> Option<u32> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<u32>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a non-negative integer", key, raw);
            None
        }
    }
}

impl RegistrationPolicy {
    /// Defaults overridden by `SKI_COURSE_CAPACITY` and `SKI_ADULT_AGE`.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `SKI_COURSE_CAPACITY` and `SKI_ADULT_AGE` when set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(env_u32("SKI_COURSE_CAPACITY"), env_u32("SKI_ADULT_AGE"))
    }

    /// Replace each constant that has an override.
    pub fn with_overrides(self, course_capacity: Option<u32>, adult_age: Option<u32>) -> Self {
        Self {
            course_capacity: course_capacity.unwrap_or(self.course_capacity),
            adult_age: adult_age.unwrap_or(self.adult_age),
        }
    }

    /// Whether a skier of `age` may take a course of `course_type`.
    pub fn admits_age(&self, course_type: CourseType, age: u32) -> bool {
        match course_type {
            CourseType::Individual => true,
            CourseType::CollectiveChildren => age < self.adult_age,
            CourseType::CollectiveAdult => age >= self.adult_age,
        }
    }

    /// Whether a course-week already holding `registrations_this_week` is at capacity.
    pub fn is_full(&self, registrations_this_week: i64) -> bool {
        registrations_this_week >= i64::from(self.course_capacity)
    }
}

/// Why a registration was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    SkierNotFound,
    CourseNotFound,
    AlreadyRegistered,
    AgeIneligible { age: u32, course_type: CourseType },
    CourseFull { capacity: u32 },
}

impl RejectionReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SkierNotFound => "SKIER_NOT_FOUND",
            Self::CourseNotFound => "COURSE_NOT_FOUND",
            Self::AlreadyRegistered => "ALREADY_REGISTERED",
            Self::AgeIneligible { .. } => "AGE_INELIGIBLE",
            Self::CourseFull { .. } => "COURSE_FULL",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkierNotFound => f.write_str("Skier not found"),
            Self::CourseNotFound => f.write_str("Course not found"),
            Self::AlreadyRegistered => {
                f.write_str("Skier is already registered to this course for this week")
            }
            Self::AgeIneligible { age, course_type } => write!(
                f,
                "A skier aged {} cannot join a {} course",
                age, course_type
            ),
            Self::CourseFull { capacity } => write!(
                f,
                "Course already has {} registrations for this week",
                capacity
            ),
        }
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    Registered(RegistrationRecord),
    Rejected(RejectionReason),
}

impl RegistrationOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered(_))
    }

    pub fn rejection(&self) -> Option<RejectionReason> {
        match self {
            Self::Registered(_) => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }

    pub fn into_result(self) -> Result<RegistrationRecord, RejectionReason> {
        match self {
            Self::Registered(record) => Ok(record),
            Self::Rejected(reason) => Err(reason),
        }
    }
}

type GateKey = (CourseId, u32);

#[derive(Debug, Default)]
struct GateSlot {
    lock: Arc<tokio::sync::Mutex<()>>,
    /// Passes that hold or wait on `lock`
    users: usize,
}

type LockTable = Arc<Mutex<HashMap<GateKey, GateSlot>>>;

/// Per-`(course, week)` async locks.
///
/// Clones share the same lock table. An entry lives only while some caller
/// holds or waits on it, so the table stays bounded by the number of
/// in-flight registrations.
#[derive(Debug, Clone, Default)]
pub struct RegistrationGate {
    locks: LockTable,
}

impl RegistrationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one `(course, week)`.
    pub async fn acquire(&self, course_id: CourseId, week_number: u32) -> GatePass {
        let key = (course_id, week_number);
        let lock = {
            let mut locks = self.locks.lock();
            let slot = locks.entry(key).or_default();
            slot.users += 1;
            Arc::clone(&slot.lock)
        };
        // Registered before the await so a cancelled wait still releases
        // its table entry.
        let mut pass = GatePass {
            locks: Arc::clone(&self.locks),
            key,
            guard: None,
        };
        pass.guard = Some(lock.lock_owned().await);
        pass
    }

    /// Number of `(course, week)` keys currently held or awaited.
    pub fn tracked_keys(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Exclusive access to one `(course, week)`, released on drop.
#[derive(Debug)]
pub struct GatePass {
    locks: LockTable,
    key: GateKey,
    guard: Option<tokio::sync::OwnedMutexGuard<()>>,
}

impl Drop for GatePass {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock();
        if let Some(slot) = locks.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                locks.remove(&self.key);
            }
        }
    }
}

/// Register a skier to a course, evaluating age as of today's local date.
pub async fn register_skier_to_course<R: FullRepository + ?Sized>(
    repo: &R,
    policy: &RegistrationPolicy,
    gate: &RegistrationGate,
    registration: &Registration,
    skier_id: SkierId,
    course_id: CourseId,
) -> RepositoryResult<RegistrationOutcome> {
    let today = Local::now().date_naive();
    register_skier_to_course_on(repo, policy, gate, registration, skier_id, course_id, today).await
}

/// Register a skier to a course, evaluating age as of `today`.
///
/// Only `week_number` is taken from `registration`; any id or links it
/// carries are replaced. Nothing is persisted on rejection.
///
/// # Errors
/// * `ValidationError` if `week_number` is 0
/// * any persistence fault from the repository, unmodified
pub async fn register_skier_to_course_on<R: FullRepository + ?Sized>(
    repo: &R,
    policy: &RegistrationPolicy,
    gate: &RegistrationGate,
    registration: &Registration,
    skier_id: SkierId,
    course_id: CourseId,
    today: NaiveDate,
) -> RepositoryResult<RegistrationOutcome> {
    let week_number = registration.week_number;
    if week_number == 0 {
        return Err(RepositoryError::validation("Week number must be at least 1"));
    }

    let _pass = gate.acquire(course_id, week_number).await;

    let reject = |reason: RejectionReason| -> RepositoryResult<RegistrationOutcome> {
        warn!(
            "Registration of skier {} to course {} week {} rejected: {}",
            skier_id, course_id, week_number, reason
        );
        Ok(RegistrationOutcome::Rejected(reason))
    };

    let Some(skier) = repo.find_skier(skier_id).await? else {
        return reject(RejectionReason::SkierNotFound);
    };
    let Some(course) = repo.find_course(course_id).await? else {
        return reject(RejectionReason::CourseNotFound);
    };

    let duplicates = repo
        .count_registrations_for_skier_course_week(week_number, skier_id, course_id)
        .await?;
    if duplicates >= 1 {
        return reject(RejectionReason::AlreadyRegistered);
    }

    let age = skier.age_on(today);
    if !policy.admits_age(course.course_type, age) {
        return reject(RejectionReason::AgeIneligible {
            age,
            course_type: course.course_type,
        });
    }

    let taken = repo
        .count_registrations_for_course_week(course_id, week_number)
        .await?;
    if policy.is_full(taken) {
        return reject(RejectionReason::CourseFull {
            capacity: policy.course_capacity,
        });
    }

    let stored = repo
        .insert_registration(&Registration {
            id: None,
            week_number,
            skier_id: Some(skier_id),
            course_id: Some(course_id),
        })
        .await?;

    info!(
        "Registered skier {} to course {} for week {} ({} of {} places taken)",
        skier_id,
        course_id,
        week_number,
        taken + 1,
        policy.course_capacity
    );

    Ok(RegistrationOutcome::Registered(RegistrationRecord {
        registration: stored,
        skier,
        course,
    }))
}
