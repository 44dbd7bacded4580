//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::dsl::count_distinct;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    CourseRepository, ErrorContext, HealthRepository, InstructorRepository, PisteRepository,
    RegistrationRepository, RepositoryError, RepositoryResult, SkierRepository,
    SubscriptionRepository,
};
use crate::models::{
    Course, CourseId, Instructor, InstructorId, Piste, PisteId, Registration, RegistrationId,
    Skier, SkierId, Subscription, SubscriptionId, SubscriptionType,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        log::info!(
            "Postgres repository ready (pool max={}, min={})",
            config.max_pool_size,
            config.min_pool_size
        );

        Ok(Self {
            pool,
            config,
        })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation on a blocking thread, retrying transient
    /// failures with exponential backoff up to `max_retries` times.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        log::warn!("Retrying after transient failure: {}", e);
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn missing_id(entity: &str, operation: &str) -> RepositoryError {
    RepositoryError::ValidationError {
        message: format!("Cannot update a {} without an id", entity),
        context: ErrorContext::new(operation).with_entity(entity),
    }
}

// ==================== Join-table helpers ====================

fn hydrate_skiers(conn: &mut PgConnection, rows: Vec<SkierRow>) -> RepositoryResult<Vec<Skier>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.skier_id).collect();
    let links = skier_pistes::table
        .filter(skier_pistes::skier_id.eq_any(&ids))
        .select(SkierPisteRow::as_select())
        .load::<SkierPisteRow>(conn)?;

    let mut sets: HashMap<i64, BTreeSet<PisteId>> = HashMap::new();
    for link in links {
        sets.entry(link.skier_id)
            .or_default()
            .insert(PisteId(link.piste_id));
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let pistes = sets.remove(&row.skier_id).unwrap_or_default();
            row.into_skier(pistes)
        })
        .collect())
}

fn replace_skier_pistes(
    conn: &mut PgConnection,
    skier_id: i64,
    piste_ids: &BTreeSet<PisteId>,
) -> RepositoryResult<()> {
    diesel::delete(skier_pistes::table.filter(skier_pistes::skier_id.eq(skier_id)))
        .execute(conn)?;
    if !piste_ids.is_empty() {
        let links: Vec<SkierPisteRow> = piste_ids
            .iter()
            .map(|p| SkierPisteRow {
                skier_id,
                piste_id: p.0,
            })
            .collect();
        diesel::insert_into(skier_pistes::table)
            .values(&links)
            .execute(conn)?;
    }
    Ok(())
}

fn hydrate_instructors(
    conn: &mut PgConnection,
    rows: Vec<InstructorRow>,
) -> RepositoryResult<Vec<Instructor>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.instructor_id).collect();
    let links = instructor_courses::table
        .filter(instructor_courses::instructor_id.eq_any(&ids))
        .select(InstructorCourseRow::as_select())
        .load::<InstructorCourseRow>(conn)?;

    let mut sets: HashMap<i64, BTreeSet<CourseId>> = HashMap::new();
    for link in links {
        sets.entry(link.instructor_id)
            .or_default()
            .insert(CourseId(link.course_id));
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let courses = sets.remove(&row.instructor_id).unwrap_or_default();
            row.into_instructor(courses)
        })
        .collect())
}

fn replace_instructor_courses(
    conn: &mut PgConnection,
    instructor_id: i64,
    course_ids: &BTreeSet<CourseId>,
) -> RepositoryResult<()> {
    diesel::delete(
        instructor_courses::table.filter(instructor_courses::instructor_id.eq(instructor_id)),
    )
    .execute(conn)?;
    if !course_ids.is_empty() {
        let links: Vec<InstructorCourseRow> = course_ids
            .iter()
            .map(|c| InstructorCourseRow {
                instructor_id,
                course_id: c.0,
            })
            .collect();
        diesel::insert_into(instructor_courses::table)
            .values(&links)
            .execute(conn)?;
    }
    Ok(())
}

// ==================== Trait implementations ====================

#[async_trait]
impl HealthRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
        .await
    }
}

#[async_trait]
impl SkierRepository for PostgresRepository {
    async fn insert_skier(&self, skier: &Skier) -> RepositoryResult<Skier> {
        let skier = skier.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let row: SkierRow = diesel::insert_into(skiers::table)
                    .values(&SkierChanges::from(&skier))
                    .returning(SkierRow::as_returning())
                    .get_result(tx)?;
                replace_skier_pistes(tx, row.skier_id, &skier.piste_ids)?;
                Ok(row.into_skier(skier.piste_ids.clone()))
            })
        })
        .await
        .map_err(|e| e.with_operation("insert_skier"))
    }

    async fn find_skier(&self, id: SkierId) -> RepositoryResult<Option<Skier>> {
        self.with_conn(move |conn| {
            let row = skiers::table
                .find(id.0)
                .select(SkierRow::as_select())
                .first::<SkierRow>(conn)
                .optional()?;
            match row {
                Some(row) => Ok(hydrate_skiers(conn, vec![row])?.pop()),
                None => Ok(None),
            }
        })
        .await
    }

    async fn list_skiers(&self) -> RepositoryResult<Vec<Skier>> {
        self.with_conn(|conn| {
            let rows = skiers::table
                .order(skiers::skier_id.asc())
                .select(SkierRow::as_select())
                .load::<SkierRow>(conn)?;
            hydrate_skiers(conn, rows)
        })
        .await
    }

    async fn update_skier(&self, skier: &Skier) -> RepositoryResult<Skier> {
        let id = skier.id.ok_or_else(|| missing_id("skier", "update_skier"))?;
        let skier = skier.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let row = diesel::update(skiers::table.find(id.0))
                    .set(&SkierChanges::from(&skier))
                    .returning(SkierRow::as_returning())
                    .get_result::<SkierRow>(tx)
                    .optional()?
                    .ok_or_else(|| RepositoryError::entity_not_found("skier", id))?;
                replace_skier_pistes(tx, row.skier_id, &skier.piste_ids)?;
                Ok(row.into_skier(skier.piste_ids.clone()))
            })
        })
        .await
    }

    async fn delete_skier(&self, id: SkierId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let removed = diesel::delete(skiers::table.find(id.0)).execute(conn)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn list_skiers_by_subscription_type(
        &self,
        subscription_type: SubscriptionType,
    ) -> RepositoryResult<Vec<Skier>> {
        self.with_conn(move |conn| {
            let rows = skiers::table
                .inner_join(subscriptions::table)
                .filter(subscriptions::subscription_type.eq(subscription_type.as_str()))
                .order(skiers::skier_id.asc())
                .select(SkierRow::as_select())
                .load::<SkierRow>(conn)?;
            hydrate_skiers(conn, rows)
        })
        .await
    }
}

#[async_trait]
impl CourseRepository for PostgresRepository {
    async fn insert_course(&self, course: &Course) -> RepositoryResult<Course> {
        let changes = CourseChanges::from(course);
        self.with_conn(move |conn| {
            let row: CourseRow = diesel::insert_into(courses::table)
                .values(&changes)
                .returning(CourseRow::as_returning())
                .get_result(conn)?;
            Course::try_from(row)
        })
        .await
    }

    async fn find_course(&self, id: CourseId) -> RepositoryResult<Option<Course>> {
        self.with_conn(move |conn| {
            courses::table
                .find(id.0)
                .select(CourseRow::as_select())
                .first::<CourseRow>(conn)
                .optional()?
                .map(Course::try_from)
                .transpose()
        })
        .await
    }

    async fn list_courses(&self) -> RepositoryResult<Vec<Course>> {
        self.with_conn(|conn| {
            courses::table
                .order(courses::course_id.asc())
                .select(CourseRow::as_select())
                .load::<CourseRow>(conn)?
                .into_iter()
                .map(Course::try_from)
                .collect()
        })
        .await
    }

    async fn update_course(&self, course: &Course) -> RepositoryResult<Course> {
        let id = course.id.ok_or_else(|| missing_id("course", "update_course"))?;
        let changes = CourseChanges::from(course);
        self.with_conn(move |conn| {
            let row = diesel::update(courses::table.find(id.0))
                .set(&changes)
                .returning(CourseRow::as_returning())
                .get_result::<CourseRow>(conn)
                .optional()?
                .ok_or_else(|| RepositoryError::entity_not_found("course", id))?;
            Course::try_from(row)
        })
        .await
    }

    async fn delete_course(&self, id: CourseId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let removed = diesel::delete(courses::table.find(id.0)).execute(conn)?;
            Ok(removed > 0)
        })
        .await
    }
}

#[async_trait]
impl InstructorRepository for PostgresRepository {
    async fn insert_instructor(&self, instructor: &Instructor) -> RepositoryResult<Instructor> {
        let instructor = instructor.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let row: InstructorRow = diesel::insert_into(instructors::table)
                    .values(&InstructorChanges::from(&instructor))
                    .returning(InstructorRow::as_returning())
                    .get_result(tx)?;
                replace_instructor_courses(tx, row.instructor_id, &instructor.course_ids)?;
                Ok(row.into_instructor(instructor.course_ids.clone()))
            })
        })
        .await
        .map_err(|e| e.with_operation("insert_instructor"))
    }

    async fn find_instructor(&self, id: InstructorId) -> RepositoryResult<Option<Instructor>> {
        self.with_conn(move |conn| {
            let row = instructors::table
                .find(id.0)
                .select(InstructorRow::as_select())
                .first::<InstructorRow>(conn)
                .optional()?;
            match row {
                Some(row) => Ok(hydrate_instructors(conn, vec![row])?.pop()),
                None => Ok(None),
            }
        })
        .await
    }

    async fn list_instructors(&self) -> RepositoryResult<Vec<Instructor>> {
        self.with_conn(|conn| {
            let rows = instructors::table
                .order(instructors::instructor_id.asc())
                .select(InstructorRow::as_select())
                .load::<InstructorRow>(conn)?;
            hydrate_instructors(conn, rows)
        })
        .await
    }

    async fn update_instructor(&self, instructor: &Instructor) -> RepositoryResult<Instructor> {
        let id = instructor
            .id
            .ok_or_else(|| missing_id("instructor", "update_instructor"))?;
        let instructor = instructor.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let row = diesel::update(instructors::table.find(id.0))
                    .set(&InstructorChanges::from(&instructor))
                    .returning(InstructorRow::as_returning())
                    .get_result::<InstructorRow>(tx)
                    .optional()?
                    .ok_or_else(|| RepositoryError::entity_not_found("instructor", id))?;
                replace_instructor_courses(tx, row.instructor_id, &instructor.course_ids)?;
                Ok(row.into_instructor(instructor.course_ids.clone()))
            })
        })
        .await
    }

    async fn delete_instructor(&self, id: InstructorId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let removed = diesel::delete(instructors::table.find(id.0)).execute(conn)?;
            Ok(removed > 0)
        })
        .await
    }
}

#[async_trait]
impl PisteRepository for PostgresRepository {
    async fn insert_piste(&self, piste: &Piste) -> RepositoryResult<Piste> {
        let changes = PisteChanges::from(piste);
        self.with_conn(move |conn| {
            let row: PisteRow = diesel::insert_into(pistes::table)
                .values(&changes)
                .returning(PisteRow::as_returning())
                .get_result(conn)?;
            Piste::try_from(row)
        })
        .await
    }

    async fn find_piste(&self, id: PisteId) -> RepositoryResult<Option<Piste>> {
        self.with_conn(move |conn| {
            pistes::table
                .find(id.0)
                .select(PisteRow::as_select())
                .first::<PisteRow>(conn)
                .optional()?
                .map(Piste::try_from)
                .transpose()
        })
        .await
    }

    async fn list_pistes(&self) -> RepositoryResult<Vec<Piste>> {
        self.with_conn(|conn| {
            pistes::table
                .order(pistes::piste_id.asc())
                .select(PisteRow::as_select())
                .load::<PisteRow>(conn)?
                .into_iter()
                .map(Piste::try_from)
                .collect()
        })
        .await
    }

    async fn update_piste(&self, piste: &Piste) -> RepositoryResult<Piste> {
        let id = piste.id.ok_or_else(|| missing_id("piste", "update_piste"))?;
        let changes = PisteChanges::from(piste);
        self.with_conn(move |conn| {
            let row = diesel::update(pistes::table.find(id.0))
                .set(&changes)
                .returning(PisteRow::as_returning())
                .get_result::<PisteRow>(conn)
                .optional()?
                .ok_or_else(|| RepositoryError::entity_not_found("piste", id))?;
            Piste::try_from(row)
        })
        .await
    }

    async fn delete_piste(&self, id: PisteId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let removed = diesel::delete(pistes::table.find(id.0)).execute(conn)?;
            Ok(removed > 0)
        })
        .await
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresRepository {
    async fn insert_subscription(
        &self,
        subscription: &Subscription,
    ) -> RepositoryResult<Subscription> {
        let changes = SubscriptionChanges::from(subscription);
        self.with_conn(move |conn| {
            let row: SubscriptionRow = diesel::insert_into(subscriptions::table)
                .values(&changes)
                .returning(SubscriptionRow::as_returning())
                .get_result(conn)?;
            Subscription::try_from(row)
        })
        .await
    }

    async fn find_subscription(
        &self,
        id: SubscriptionId,
    ) -> RepositoryResult<Option<Subscription>> {
        self.with_conn(move |conn| {
            subscriptions::table
                .find(id.0)
                .select(SubscriptionRow::as_select())
                .first::<SubscriptionRow>(conn)
                .optional()?
                .map(Subscription::try_from)
                .transpose()
        })
        .await
    }

    async fn list_subscriptions(&self) -> RepositoryResult<Vec<Subscription>> {
        self.with_conn(|conn| {
            subscriptions::table
                .order(subscriptions::subscription_id.asc())
                .select(SubscriptionRow::as_select())
                .load::<SubscriptionRow>(conn)?
                .into_iter()
                .map(Subscription::try_from)
                .collect()
        })
        .await
    }

    async fn update_subscription(
        &self,
        subscription: &Subscription,
    ) -> RepositoryResult<Subscription> {
        let id = subscription
            .id
            .ok_or_else(|| missing_id("subscription", "update_subscription"))?;
        let changes = SubscriptionChanges::from(subscription);
        self.with_conn(move |conn| {
            let row = diesel::update(subscriptions::table.find(id.0))
                .set(&changes)
                .returning(SubscriptionRow::as_returning())
                .get_result::<SubscriptionRow>(conn)
                .optional()?
                .ok_or_else(|| RepositoryError::entity_not_found("subscription", id))?;
            Subscription::try_from(row)
        })
        .await
    }

    async fn delete_subscription(&self, id: SubscriptionId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let removed = diesel::delete(subscriptions::table.find(id.0)).execute(conn)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn list_subscriptions_by_type(
        &self,
        subscription_type: SubscriptionType,
    ) -> RepositoryResult<Vec<Subscription>> {
        self.with_conn(move |conn| {
            subscriptions::table
                .filter(subscriptions::subscription_type.eq(subscription_type.as_str()))
                .order((
                    subscriptions::start_date.asc(),
                    subscriptions::subscription_id.asc(),
                ))
                .select(SubscriptionRow::as_select())
                .load::<SubscriptionRow>(conn)?
                .into_iter()
                .map(Subscription::try_from)
                .collect()
        })
        .await
    }

    async fn list_subscriptions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Subscription>> {
        self.with_conn(move |conn| {
            subscriptions::table
                .filter(subscriptions::start_date.between(start, end))
                .order((
                    subscriptions::start_date.asc(),
                    subscriptions::subscription_id.asc(),
                ))
                .select(SubscriptionRow::as_select())
                .load::<SubscriptionRow>(conn)?
                .into_iter()
                .map(Subscription::try_from)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl RegistrationRepository for PostgresRepository {
    async fn insert_registration(
        &self,
        registration: &Registration,
    ) -> RepositoryResult<Registration> {
        let changes = RegistrationChanges::try_from(registration)?;
        self.with_conn(move |conn| {
            let row: RegistrationRow = diesel::insert_into(registrations::table)
                .values(&changes)
                .returning(RegistrationRow::as_returning())
                .get_result(conn)?;
            Registration::try_from(row)
        })
        .await
        .map_err(|e| e.with_operation("insert_registration"))
    }

    async fn find_registration(
        &self,
        id: RegistrationId,
    ) -> RepositoryResult<Option<Registration>> {
        self.with_conn(move |conn| {
            registrations::table
                .find(id.0)
                .select(RegistrationRow::as_select())
                .first::<RegistrationRow>(conn)
                .optional()?
                .map(Registration::try_from)
                .transpose()
        })
        .await
    }

    async fn list_registrations(&self) -> RepositoryResult<Vec<Registration>> {
        self.with_conn(|conn| {
            registrations::table
                .order(registrations::registration_id.asc())
                .select(RegistrationRow::as_select())
                .load::<RegistrationRow>(conn)?
                .into_iter()
                .map(Registration::try_from)
                .collect()
        })
        .await
    }

    async fn update_registration(
        &self,
        registration: &Registration,
    ) -> RepositoryResult<Registration> {
        let id = registration
            .id
            .ok_or_else(|| missing_id("registration", "update_registration"))?;
        let changes = RegistrationChanges::try_from(registration)?;
        self.with_conn(move |conn| {
            let row = diesel::update(registrations::table.find(id.0))
                .set(&changes)
                .returning(RegistrationRow::as_returning())
                .get_result::<RegistrationRow>(conn)
                .optional()?
                .ok_or_else(|| RepositoryError::entity_not_found("registration", id))?;
            Registration::try_from(row)
        })
        .await
    }

    async fn count_registrations_for_course_week(
        &self,
        course_id: CourseId,
        week_number: u32,
    ) -> RepositoryResult<i64> {
        let week = week_to_column(week_number)?;
        self.with_conn(move |conn| {
            registrations::table
                .filter(registrations::course_id.eq(course_id.0))
                .filter(registrations::week_number.eq(week))
                .count()
                .get_result::<i64>(conn)
                .map_err(RepositoryError::from)
        })
        .await
        .map_err(|e| e.with_operation("count_registrations_for_course_week"))
    }

    async fn count_registrations_for_skier_course_week(
        &self,
        week_number: u32,
        skier_id: SkierId,
        course_id: CourseId,
    ) -> RepositoryResult<i64> {
        let week = week_to_column(week_number)?;
        self.with_conn(move |conn| {
            registrations::table
                .filter(registrations::week_number.eq(week))
                .filter(registrations::skier_id.eq(skier_id.0))
                .filter(registrations::course_id.eq(course_id.0))
                .select(count_distinct(registrations::registration_id))
                .get_result::<i64>(conn)
                .map_err(RepositoryError::from)
        })
        .await
        .map_err(|e| e.with_operation("count_registrations_for_skier_course_week"))
    }

    async fn list_registrations_for_courses(
        &self,
        course_ids: &[CourseId],
    ) -> RepositoryResult<Vec<Registration>> {
        let ids: Vec<i64> = course_ids.iter().map(|c| c.0).collect();
        self.with_conn(move |conn| {
            registrations::table
                .filter(registrations::course_id.eq_any(&ids))
                .order(registrations::registration_id.asc())
                .select(RegistrationRow::as_select())
                .load::<RegistrationRow>(conn)?
                .into_iter()
                .map(Registration::try_from)
                .collect()
        })
        .await
    }
}
