//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data lives in ordered
//! maps behind a single lock, so listings come back sorted by id and every
//! individual call is atomic.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::*;

/// In-memory local repository.
///
/// Relationship semantics follow the Postgres schema: deleting a skier or a
/// course detaches it from registrations instead of deleting them, and
/// deleting a piste, subscription or course clears the references held by
/// skiers and instructors.
///
/// # Example
/// ```
/// use ski_station::db::repositories::LocalRepository;
/// use ski_station::db::repository::HealthRepository;
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let repo = LocalRepository::new();
/// assert!(runtime.block_on(repo.health_check()).unwrap());
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    skiers: BTreeMap<SkierId, Skier>,
    courses: BTreeMap<CourseId, Course>,
    instructors: BTreeMap<InstructorId, Instructor>,
    pistes: BTreeMap<PisteId, Piste>,
    subscriptions: BTreeMap<SubscriptionId, Subscription>,
    registrations: BTreeMap<RegistrationId, Registration>,

    // One counter per table, like Postgres BIGSERIAL sequences
    next_skier_id: i64,
    next_course_id: i64,
    next_instructor_id: i64,
    next_piste_id: i64,
    next_subscription_id: i64,
    next_registration_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            skiers: BTreeMap::new(),
            courses: BTreeMap::new(),
            instructors: BTreeMap::new(),
            pistes: BTreeMap::new(),
            subscriptions: BTreeMap::new(),
            registrations: BTreeMap::new(),
            next_skier_id: 1,
            next_course_id: 1,
            next_instructor_id: 1,
            next_piste_id: 1,
            next_subscription_id: 1,
            next_registration_id: 1,
            is_healthy: true,
        }
    }
}

fn take_next(counter: &mut i64) -> i64 {
    let id = *counter;
    *counter += 1;
    id
}

fn missing_id(entity: &str, operation: &str) -> RepositoryError {
    RepositoryError::ValidationError {
        message: format!("Cannot update a {} without an id", entity),
        context: ErrorContext::new(operation).with_entity(entity),
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    ///
    /// While unhealthy, every data operation fails with a retryable
    /// `ConnectionError`.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository and reset id counters.
    pub fn clear(&self) {
        let mut data = self.data.write();
        let is_healthy = data.is_healthy;
        *data = LocalData {
            is_healthy,
            ..Default::default()
        };
    }

    /// Number of registrations stored.
    pub fn registration_count(&self) -> usize {
        self.data.read().registrations.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Database is not healthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }
}

#[async_trait]
impl SkierRepository for LocalRepository {
    async fn insert_skier(&self, skier: &Skier) -> RepositoryResult<Skier> {
        self.check_health("insert_skier")?;
        let mut data = self.data.write();
        let id = SkierId(take_next(&mut data.next_skier_id));
        let stored = Skier {
            id: Some(id),
            ..skier.clone()
        };
        data.skiers.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_skier(&self, id: SkierId) -> RepositoryResult<Option<Skier>> {
        self.check_health("find_skier")?;
        Ok(self.data.read().skiers.get(&id).cloned())
    }

    async fn list_skiers(&self) -> RepositoryResult<Vec<Skier>> {
        self.check_health("list_skiers")?;
        Ok(self.data.read().skiers.values().cloned().collect())
    }

    async fn update_skier(&self, skier: &Skier) -> RepositoryResult<Skier> {
        self.check_health("update_skier")?;
        let id = skier.id.ok_or_else(|| missing_id("skier", "update_skier"))?;
        let mut data = self.data.write();
        match data.skiers.get_mut(&id) {
            Some(slot) => {
                *slot = skier.clone();
                Ok(skier.clone())
            }
            None => Err(RepositoryError::entity_not_found("skier", id).with_operation("update_skier")),
        }
    }

    async fn delete_skier(&self, id: SkierId) -> RepositoryResult<bool> {
        self.check_health("delete_skier")?;
        let mut data = self.data.write();
        let existed = data.skiers.remove(&id).is_some();
        if existed {
            for registration in data.registrations.values_mut() {
                if registration.skier_id == Some(id) {
                    registration.skier_id = None;
                }
            }
        }
        Ok(existed)
    }

    async fn list_skiers_by_subscription_type(
        &self,
        subscription_type: SubscriptionType,
    ) -> RepositoryResult<Vec<Skier>> {
        self.check_health("list_skiers_by_subscription_type")?;
        let data = self.data.read();
        Ok(data
            .skiers
            .values()
            .filter(|skier| {
                skier
                    .subscription_id
                    .and_then(|sub_id| data.subscriptions.get(&sub_id))
                    .is_some_and(|sub| sub.subscription_type == subscription_type)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CourseRepository for LocalRepository {
    async fn insert_course(&self, course: &Course) -> RepositoryResult<Course> {
        self.check_health("insert_course")?;
        let mut data = self.data.write();
        let id = CourseId(take_next(&mut data.next_course_id));
        let stored = Course {
            id: Some(id),
            ..course.clone()
        };
        data.courses.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_course(&self, id: CourseId) -> RepositoryResult<Option<Course>> {
        self.check_health("find_course")?;
        Ok(self.data.read().courses.get(&id).cloned())
    }

    async fn list_courses(&self) -> RepositoryResult<Vec<Course>> {
        self.check_health("list_courses")?;
        Ok(self.data.read().courses.values().cloned().collect())
    }

    async fn update_course(&self, course: &Course) -> RepositoryResult<Course> {
        self.check_health("update_course")?;
        let id = course.id.ok_or_else(|| missing_id("course", "update_course"))?;
        let mut data = self.data.write();
        match data.courses.get_mut(&id) {
            Some(slot) => {
                *slot = course.clone();
                Ok(course.clone())
            }
            None => {
                Err(RepositoryError::entity_not_found("course", id).with_operation("update_course"))
            }
        }
    }

    async fn delete_course(&self, id: CourseId) -> RepositoryResult<bool> {
        self.check_health("delete_course")?;
        let mut data = self.data.write();
        let existed = data.courses.remove(&id).is_some();
        if existed {
            for instructor in data.instructors.values_mut() {
                instructor.course_ids.remove(&id);
            }
            for registration in data.registrations.values_mut() {
                if registration.course_id == Some(id) {
                    registration.course_id = None;
                }
            }
        }
        Ok(existed)
    }
}

#[async_trait]
impl InstructorRepository for LocalRepository {
    async fn insert_instructor(&self, instructor: &Instructor) -> RepositoryResult<Instructor> {
        self.check_health("insert_instructor")?;
        let mut data = self.data.write();
        let id = InstructorId(take_next(&mut data.next_instructor_id));
        let stored = Instructor {
            id: Some(id),
            ..instructor.clone()
        };
        data.instructors.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_instructor(&self, id: InstructorId) -> RepositoryResult<Option<Instructor>> {
        self.check_health("find_instructor")?;
        Ok(self.data.read().instructors.get(&id).cloned())
    }

    async fn list_instructors(&self) -> RepositoryResult<Vec<Instructor>> {
        self.check_health("list_instructors")?;
        Ok(self.data.read().instructors.values().cloned().collect())
    }

    async fn update_instructor(&self, instructor: &Instructor) -> RepositoryResult<Instructor> {
        self.check_health("update_instructor")?;
        let id = instructor
            .id
            .ok_or_else(|| missing_id("instructor", "update_instructor"))?;
        let mut data = self.data.write();
        match data.instructors.get_mut(&id) {
            Some(slot) => {
                *slot = instructor.clone();
                Ok(instructor.clone())
            }
            None => Err(RepositoryError::entity_not_found("instructor", id)
                .with_operation("update_instructor")),
        }
    }

    async fn delete_instructor(&self, id: InstructorId) -> RepositoryResult<bool> {
        self.check_health("delete_instructor")?;
        Ok(self.data.write().instructors.remove(&id).is_some())
    }
}

#[async_trait]
impl PisteRepository for LocalRepository {
    async fn insert_piste(&self, piste: &Piste) -> RepositoryResult<Piste> {
        self.check_health("insert_piste")?;
        let mut data = self.data.write();
        let id = PisteId(take_next(&mut data.next_piste_id));
        let stored = Piste {
            id: Some(id),
            ..piste.clone()
        };
        data.pistes.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_piste(&self, id: PisteId) -> RepositoryResult<Option<Piste>> {
        self.check_health("find_piste")?;
        Ok(self.data.read().pistes.get(&id).cloned())
    }

    async fn list_pistes(&self) -> RepositoryResult<Vec<Piste>> {
        self.check_health("list_pistes")?;
        Ok(self.data.read().pistes.values().cloned().collect())
    }

    async fn update_piste(&self, piste: &Piste) -> RepositoryResult<Piste> {
        self.check_health("update_piste")?;
        let id = piste.id.ok_or_else(|| missing_id("piste", "update_piste"))?;
        let mut data = self.data.write();
        match data.pistes.get_mut(&id) {
            Some(slot) => {
                *slot = piste.clone();
                Ok(piste.clone())
            }
            None => {
                Err(RepositoryError::entity_not_found("piste", id).with_operation("update_piste"))
            }
        }
    }

    async fn delete_piste(&self, id: PisteId) -> RepositoryResult<bool> {
        self.check_health("delete_piste")?;
        let mut data = self.data.write();
        let existed = data.pistes.remove(&id).is_some();
        if existed {
            for skier in data.skiers.values_mut() {
                skier.piste_ids.remove(&id);
            }
        }
        Ok(existed)
    }
}

#[async_trait]
impl SubscriptionRepository for LocalRepository {
    async fn insert_subscription(
        &self,
        subscription: &Subscription,
    ) -> RepositoryResult<Subscription> {
        self.check_health("insert_subscription")?;
        let mut data = self.data.write();
        let id = SubscriptionId(take_next(&mut data.next_subscription_id));
        let stored = Subscription {
            id: Some(id),
            ..subscription.clone()
        };
        data.subscriptions.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_subscription(
        &self,
        id: SubscriptionId,
    ) -> RepositoryResult<Option<Subscription>> {
        self.check_health("find_subscription")?;
        Ok(self.data.read().subscriptions.get(&id).cloned())
    }

    async fn list_subscriptions(&self) -> RepositoryResult<Vec<Subscription>> {
        self.check_health("list_subscriptions")?;
        Ok(self.data.read().subscriptions.values().cloned().collect())
    }

    async fn update_subscription(
        &self,
        subscription: &Subscription,
    ) -> RepositoryResult<Subscription> {
        self.check_health("update_subscription")?;
        let id = subscription
            .id
            .ok_or_else(|| missing_id("subscription", "update_subscription"))?;
        let mut data = self.data.write();
        match data.subscriptions.get_mut(&id) {
            Some(slot) => {
                *slot = subscription.clone();
                Ok(subscription.clone())
            }
            None => Err(RepositoryError::entity_not_found("subscription", id)
                .with_operation("update_subscription")),
        }
    }

    async fn delete_subscription(&self, id: SubscriptionId) -> RepositoryResult<bool> {
        self.check_health("delete_subscription")?;
        let mut data = self.data.write();
        let existed = data.subscriptions.remove(&id).is_some();
        if existed {
            for skier in data.skiers.values_mut() {
                if skier.subscription_id == Some(id) {
                    skier.subscription_id = None;
                }
            }
        }
        Ok(existed)
    }

    async fn list_subscriptions_by_type(
        &self,
        subscription_type: SubscriptionType,
    ) -> RepositoryResult<Vec<Subscription>> {
        self.check_health("list_subscriptions_by_type")?;
        let mut subscriptions: Vec<Subscription> = self
            .data
            .read()
            .subscriptions
            .values()
            .filter(|sub| sub.subscription_type == subscription_type)
            .cloned()
            .collect();
        subscriptions.sort_by_key(|sub| (sub.start_date, sub.id));
        Ok(subscriptions)
    }

    async fn list_subscriptions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Subscription>> {
        self.check_health("list_subscriptions_between")?;
        let mut subscriptions: Vec<Subscription> = self
            .data
            .read()
            .subscriptions
            .values()
            .filter(|sub| sub.start_date >= start && sub.start_date <= end)
            .cloned()
            .collect();
        subscriptions.sort_by_key(|sub| (sub.start_date, sub.id));
        Ok(subscriptions)
    }
}

#[async_trait]
impl RegistrationRepository for LocalRepository {
    async fn insert_registration(
        &self,
        registration: &Registration,
    ) -> RepositoryResult<Registration> {
        self.check_health("insert_registration")?;
        let mut data = self.data.write();
        let id = RegistrationId(take_next(&mut data.next_registration_id));
        let stored = Registration {
            id: Some(id),
            ..registration.clone()
        };
        data.registrations.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_registration(
        &self,
        id: RegistrationId,
    ) -> RepositoryResult<Option<Registration>> {
        self.check_health("find_registration")?;
        Ok(self.data.read().registrations.get(&id).cloned())
    }

    async fn list_registrations(&self) -> RepositoryResult<Vec<Registration>> {
        self.check_health("list_registrations")?;
        Ok(self.data.read().registrations.values().cloned().collect())
    }

    async fn update_registration(
        &self,
        registration: &Registration,
    ) -> RepositoryResult<Registration> {
        self.check_health("update_registration")?;
        let id = registration
            .id
            .ok_or_else(|| missing_id("registration", "update_registration"))?;
        let mut data = self.data.write();
        match data.registrations.get_mut(&id) {
            Some(slot) => {
                *slot = registration.clone();
                Ok(registration.clone())
            }
            None => Err(RepositoryError::entity_not_found("registration", id)
                .with_operation("update_registration")),
        }
    }

    async fn count_registrations_for_course_week(
        &self,
        course_id: CourseId,
        week_number: u32,
    ) -> RepositoryResult<i64> {
        self.check_health("count_registrations_for_course_week")?;
        let count = self
            .data
            .read()
            .registrations
            .values()
            .filter(|r| r.course_id == Some(course_id) && r.week_number == week_number)
            .count();
        Ok(count as i64)
    }

    async fn count_registrations_for_skier_course_week(
        &self,
        week_number: u32,
        skier_id: SkierId,
        course_id: CourseId,
    ) -> RepositoryResult<i64> {
        self.check_health("count_registrations_for_skier_course_week")?;
        let count = self
            .data
            .read()
            .registrations
            .values()
            .filter(|r| {
                r.week_number == week_number
                    && r.skier_id == Some(skier_id)
                    && r.course_id == Some(course_id)
            })
            .count();
        Ok(count as i64)
    }

    async fn list_registrations_for_courses(
        &self,
        course_ids: &[CourseId],
    ) -> RepositoryResult<Vec<Registration>> {
        self.check_health("list_registrations_for_courses")?;
        Ok(self
            .data
            .read()
            .registrations
            .values()
            .filter(|r| r.course_id.is_some_and(|id| course_ids.contains(&id)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let repo = LocalRepository::new();
        assert!(repo.health_check().await.unwrap());

        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.list_skiers().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repo = LocalRepository::new();
        let first = repo
            .insert_skier(&Skier::new("Ana", "Blanc", date(2001, 3, 4), "Lyon"))
            .await
            .unwrap();
        let second = repo
            .insert_skier(&Skier::new("Bob", "Noir", date(1999, 7, 8), "Nice"))
            .await
            .unwrap();

        assert_eq!(first.id, Some(SkierId(1)));
        assert_eq!(second.id, Some(SkierId(2)));
        assert_eq!(repo.list_skiers().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_course_is_not_found() {
        let repo = LocalRepository::new();
        let mut course = Course::new(CourseType::Individual, Support::Ski);
        course.id = Some(CourseId(99));

        let err = repo.update_course(&course).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_without_id_is_validation_error() {
        let repo = LocalRepository::new();
        let course = Course::new(CourseType::Individual, Support::Ski);

        let err = repo.update_course(&course).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_delete_course_detaches_dependents() {
        let repo = LocalRepository::new();
        let course = repo
            .insert_course(&Course::new(CourseType::CollectiveAdult, Support::Snowboard))
            .await
            .unwrap();
        let course_id = course.id.unwrap();

        let mut instructor = Instructor::new("Jean", "Alpes", date(2015, 11, 1));
        instructor.course_ids.insert(course_id);
        let instructor = repo.insert_instructor(&instructor).await.unwrap();

        let mut registration = Registration::for_week(2);
        registration.course_id = Some(course_id);
        let registration = repo.insert_registration(&registration).await.unwrap();

        assert!(repo.delete_course(course_id).await.unwrap());
        assert!(!repo.delete_course(course_id).await.unwrap());

        let instructor = repo.find_instructor(instructor.id.unwrap()).await.unwrap().unwrap();
        assert!(instructor.course_ids.is_empty());
        let registration = repo
            .find_registration(registration.id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(registration.course_id, None);
    }

    #[tokio::test]
    async fn test_counts_match_exact_keys() {
        let repo = LocalRepository::new();
        let mut a = Registration::for_week(3);
        a.skier_id = Some(SkierId(1));
        a.course_id = Some(CourseId(1));
        let mut b = a.clone();
        b.skier_id = Some(SkierId(2));
        let mut c = a.clone();
        c.week_number = 4;
        for r in [&a, &b, &c] {
            repo.insert_registration(r).await.unwrap();
        }

        assert_eq!(repo.count_registrations_for_course_week(CourseId(1), 3).await.unwrap(), 2);
        assert_eq!(repo.count_registrations_for_course_week(CourseId(1), 4).await.unwrap(), 1);
        assert_eq!(
            repo.count_registrations_for_skier_course_week(3, SkierId(1), CourseId(1))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            repo.count_registrations_for_skier_course_week(3, SkierId(3), CourseId(1))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_subscriptions_by_type_are_ordered_by_start_date() {
        let repo = LocalRepository::new();
        for start in [date(2025, 3, 1), date(2024, 12, 1), date(2025, 1, 15)] {
            let sub = Subscription::starting(start, 50.0, SubscriptionType::Monthly).unwrap();
            repo.insert_subscription(&sub).await.unwrap();
        }
        let annual = Subscription::starting(date(2024, 1, 1), 500.0, SubscriptionType::Annual).unwrap();
        repo.insert_subscription(&annual).await.unwrap();

        let monthly = repo
            .list_subscriptions_by_type(SubscriptionType::Monthly)
            .await
            .unwrap();
        let starts: Vec<NaiveDate> = monthly.iter().map(|s| s.start_date).collect();
        assert_eq!(starts, vec![date(2024, 12, 1), date(2025, 1, 15), date(2025, 3, 1)]);

        let between = repo
            .list_subscriptions_between(date(2024, 12, 1), date(2025, 1, 31))
            .await
            .unwrap();
        assert_eq!(between.len(), 2);
    }

    #[tokio::test]
    async fn test_clear_resets_counters() {
        let repo = LocalRepository::new();
        repo.insert_registration(&Registration::for_week(1)).await.unwrap();
        assert_eq!(repo.registration_count(), 1);

        repo.clear();
        assert_eq!(repo.registration_count(), 0);
        let again = repo.insert_registration(&Registration::for_week(1)).await.unwrap();
        assert_eq!(again.id, Some(RegistrationId(1)));
    }
}
