//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::str::FromStr;

use super::dto::{
    CourseDto, CourseRequest, DateRangeQuery, DeleteResponse, EnrollSkierRequest,
    EnrollmentResponse, HealthResponse, InstructorDto, InstructorRequest, NewSkierRequest,
    PisteDto, PisteRequest, RegistrationDto, RegistrationRecordDto, RegistrationRequest,
    SkierDto, SubscriptionDto, SubscriptionRequest, UpdateSkierRequest, WeeksResponse,
};
use super::error::AppError;
use super::extract::ValidJson;
use super::state::AppState;
use crate::db::services as db_services;
use crate::models::{
    CourseId, InstructorId, PisteId, RegistrationId, SkierId, SubscriptionId, SubscriptionType,
    Support,
};
use crate::services::registration::{self, RegistrationOutcome};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create a resource.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

fn created<T>(body: T) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(body)))
}

fn parse_token<T>(raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    T::from_str(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn collect<T, D: From<T>>(items: Vec<T>) -> Json<Vec<D>> {
    Json(items.into_iter().map(D::from).collect())
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and database is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Skiers
// =============================================================================

/// GET /v1/skiers
pub async fn list_skiers(State(state): State<AppState>) -> HandlerResult<Vec<SkierDto>> {
    let skiers = db_services::retrieve_all_skiers(state.repository.as_ref()).await?;
    Ok(collect(skiers))
}

/// POST /v1/skiers
///
/// Create a skier, optionally with a new subscription attached.
pub async fn create_skier(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<NewSkierRequest>,
) -> CreatedResult<SkierDto> {
    let subscription = request.subscription.as_ref().map(|s| s.to_subscription(None));
    let stored = db_services::add_skier(
        state.repository.as_ref(),
        &request.skier.to_skier(),
        subscription,
    )
    .await?;
    created(stored.into())
}

/// GET /v1/skiers/{id}
pub async fn get_skier(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<SkierDto> {
    let skier = db_services::retrieve_skier(state.repository.as_ref(), SkierId::new(id)).await?;
    Ok(Json(skier.into()))
}

/// PUT /v1/skiers/{id}
pub async fn update_skier(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(request): ValidJson<UpdateSkierRequest>,
) -> HandlerResult<SkierDto> {
    let skier = request.to_skier(SkierId::new(id));
    let updated = db_services::update_skier(state.repository.as_ref(), &skier).await?;
    Ok(Json(updated.into()))
}

/// DELETE /v1/skiers/{id}
pub async fn delete_skier(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<DeleteResponse> {
    let deleted = db_services::remove_skier(state.repository.as_ref(), SkierId::new(id)).await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// PUT /v1/skiers/{id}/subscription/{subscription_id}
pub async fn assign_skier_subscription(
    State(state): State<AppState>,
    Path((id, subscription_id)): Path<(i64, i64)>,
) -> HandlerResult<SkierDto> {
    let skier = db_services::assign_skier_to_subscription(
        state.repository.as_ref(),
        SkierId::new(id),
        SubscriptionId::new(subscription_id),
    )
    .await?;
    Ok(Json(skier.into()))
}

/// PUT /v1/skiers/{id}/pistes/{piste_id}
pub async fn assign_skier_piste(
    State(state): State<AppState>,
    Path((id, piste_id)): Path<(i64, i64)>,
) -> HandlerResult<SkierDto> {
    let skier = db_services::assign_skier_to_piste(
        state.repository.as_ref(),
        SkierId::new(id),
        PisteId::new(piste_id),
    )
    .await?;
    Ok(Json(skier.into()))
}

/// POST /v1/skiers/course/{course_id}
///
/// Create a skier and one registration per requested week in the course.
/// Age and capacity rules are not applied on this path.
pub async fn enroll_skier(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    ValidJson(request): ValidJson<EnrollSkierRequest>,
) -> CreatedResult<EnrollmentResponse> {
    let subscription = request
        .skier
        .subscription
        .as_ref()
        .map(|s| s.to_subscription(None));
    let (skier, registrations) = db_services::add_skier_and_assign_to_course(
        state.repository.as_ref(),
        &request.skier.skier.to_skier(),
        subscription,
        &request.weeks,
        CourseId::new(course_id),
    )
    .await?;

    created(EnrollmentResponse {
        skier: skier.into(),
        registrations: registrations.into_iter().map(Into::into).collect(),
    })
}

/// GET /v1/skiers/by-subscription/{type}
pub async fn list_skiers_by_subscription(
    State(state): State<AppState>,
    Path(raw_type): Path<String>,
) -> HandlerResult<Vec<SkierDto>> {
    let subscription_type: SubscriptionType = parse_token(&raw_type)?;
    let skiers =
        db_services::retrieve_skiers_by_subscription_type(state.repository.as_ref(), subscription_type)
            .await?;
    Ok(collect(skiers))
}

// =============================================================================
// Courses
// =============================================================================

/// GET /v1/courses
pub async fn list_courses(State(state): State<AppState>) -> HandlerResult<Vec<CourseDto>> {
    let courses = db_services::retrieve_all_courses(state.repository.as_ref()).await?;
    Ok(collect(courses))
}

/// POST /v1/courses
pub async fn create_course(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CourseRequest>,
) -> CreatedResult<CourseDto> {
    let stored =
        db_services::add_course(state.repository.as_ref(), &request.to_course(None)).await?;
    created(stored.into())
}

/// GET /v1/courses/{id}
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<CourseDto> {
    let course = db_services::retrieve_course(state.repository.as_ref(), CourseId::new(id)).await?;
    Ok(Json(course.into()))
}

/// PUT /v1/courses/{id}
pub async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(request): ValidJson<CourseRequest>,
) -> HandlerResult<CourseDto> {
    let course = request.to_course(Some(CourseId::new(id)));
    let updated = db_services::update_course(state.repository.as_ref(), &course).await?;
    Ok(Json(updated.into()))
}

/// DELETE /v1/courses/{id}
pub async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<DeleteResponse> {
    let deleted = db_services::remove_course(state.repository.as_ref(), CourseId::new(id)).await?;
    Ok(Json(DeleteResponse { deleted }))
}

// =============================================================================
// Instructors
// =============================================================================

/// GET /v1/instructors
pub async fn list_instructors(
    State(state): State<AppState>,
) -> HandlerResult<Vec<InstructorDto>> {
    let instructors = db_services::retrieve_all_instructors(state.repository.as_ref()).await?;
    Ok(collect(instructors))
}

/// POST /v1/instructors
pub async fn create_instructor(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<InstructorRequest>,
) -> CreatedResult<InstructorDto> {
    let stored =
        db_services::add_instructor(state.repository.as_ref(), &request.to_instructor(None))
            .await?;
    created(stored.into())
}

/// GET /v1/instructors/{id}
pub async fn get_instructor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<InstructorDto> {
    let instructor =
        db_services::retrieve_instructor(state.repository.as_ref(), InstructorId::new(id)).await?;
    Ok(Json(instructor.into()))
}

/// PUT /v1/instructors/{id}
pub async fn update_instructor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(request): ValidJson<InstructorRequest>,
) -> HandlerResult<InstructorDto> {
    let instructor = request.to_instructor(Some(InstructorId::new(id)));
    let updated = db_services::update_instructor(state.repository.as_ref(), &instructor).await?;
    Ok(Json(updated.into()))
}

/// DELETE /v1/instructors/{id}
pub async fn delete_instructor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<DeleteResponse> {
    let deleted =
        db_services::remove_instructor(state.repository.as_ref(), InstructorId::new(id)).await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// POST /v1/instructors/course/{course_id}
pub async fn create_instructor_for_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    ValidJson(request): ValidJson<InstructorRequest>,
) -> CreatedResult<InstructorDto> {
    let stored = db_services::add_instructor_and_assign_to_course(
        state.repository.as_ref(),
        &request.to_instructor(None),
        CourseId::new(course_id),
    )
    .await?;
    created(stored.into())
}

/// GET /v1/instructors/{id}/weeks/{support}
///
/// Week numbers of every registration in the instructor's courses on the
/// given support, ascending.
pub async fn get_instructor_weeks(
    State(state): State<AppState>,
    Path((id, raw_support)): Path<(i64, String)>,
) -> HandlerResult<WeeksResponse> {
    let support: Support = parse_token(&raw_support)?;
    let instructor_id = InstructorId::new(id);
    let weeks =
        db_services::weeks_for_instructor_by_support(state.repository.as_ref(), instructor_id, support)
            .await?;

    Ok(Json(WeeksResponse {
        instructor_id,
        support,
        weeks,
    }))
}

// =============================================================================
// Pistes
// =============================================================================

/// GET /v1/pistes
pub async fn list_pistes(State(state): State<AppState>) -> HandlerResult<Vec<PisteDto>> {
    let pistes = db_services::retrieve_all_pistes(state.repository.as_ref()).await?;
    Ok(collect(pistes))
}

/// POST /v1/pistes
pub async fn create_piste(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<PisteRequest>,
) -> CreatedResult<PisteDto> {
    let stored = db_services::add_piste(state.repository.as_ref(), &request.to_piste(None)).await?;
    created(stored.into())
}

/// GET /v1/pistes/{id}
pub async fn get_piste(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<PisteDto> {
    let piste = db_services::retrieve_piste(state.repository.as_ref(), PisteId::new(id)).await?;
    Ok(Json(piste.into()))
}

/// PUT /v1/pistes/{id}
pub async fn update_piste(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(request): ValidJson<PisteRequest>,
) -> HandlerResult<PisteDto> {
    let piste = request.to_piste(Some(PisteId::new(id)));
    let updated = db_services::update_piste(state.repository.as_ref(), &piste).await?;
    Ok(Json(updated.into()))
}

/// DELETE /v1/pistes/{id}
pub async fn delete_piste(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<DeleteResponse> {
    let deleted = db_services::remove_piste(state.repository.as_ref(), PisteId::new(id)).await?;
    Ok(Json(DeleteResponse { deleted }))
}

// =============================================================================
// Subscriptions
// =============================================================================

/// GET /v1/subscriptions
pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> HandlerResult<Vec<SubscriptionDto>> {
    let subscriptions = db_services::retrieve_all_subscriptions(state.repository.as_ref()).await?;
    Ok(collect(subscriptions))
}

/// POST /v1/subscriptions
///
/// The stored end date is derived from the start date and type.
pub async fn create_subscription(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<SubscriptionRequest>,
) -> CreatedResult<SubscriptionDto> {
    let stored =
        db_services::add_subscription(state.repository.as_ref(), request.to_subscription(None))
            .await?;
    created(stored.into())
}

/// GET /v1/subscriptions/{id}
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<SubscriptionDto> {
    let subscription =
        db_services::retrieve_subscription(state.repository.as_ref(), SubscriptionId::new(id))
            .await?;
    Ok(Json(subscription.into()))
}

/// PUT /v1/subscriptions/{id}
pub async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(request): ValidJson<SubscriptionRequest>,
) -> HandlerResult<SubscriptionDto> {
    let subscription = request.to_subscription(Some(SubscriptionId::new(id)));
    let updated =
        db_services::update_subscription(state.repository.as_ref(), subscription).await?;
    Ok(Json(updated.into()))
}

/// DELETE /v1/subscriptions/{id}
pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<DeleteResponse> {
    let deleted =
        db_services::remove_subscription(state.repository.as_ref(), SubscriptionId::new(id))
            .await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// GET /v1/subscriptions/by-type/{type}
pub async fn list_subscriptions_by_type(
    State(state): State<AppState>,
    Path(raw_type): Path<String>,
) -> HandlerResult<Vec<SubscriptionDto>> {
    let subscription_type: SubscriptionType = parse_token(&raw_type)?;
    let subscriptions =
        db_services::retrieve_subscriptions_by_type(state.repository.as_ref(), subscription_type)
            .await?;
    Ok(collect(subscriptions))
}

/// GET /v1/subscriptions/by-dates?start=YYYY-MM-DD&end=YYYY-MM-DD
///
/// Subscriptions whose start date falls within the inclusive range.
pub async fn list_subscriptions_by_dates(
    State(state): State<AppState>,
    Query(range): Query<DateRangeQuery>,
) -> HandlerResult<Vec<SubscriptionDto>> {
    let subscriptions = db_services::retrieve_subscriptions_by_dates(
        state.repository.as_ref(),
        range.start,
        range.end,
    )
    .await?;
    Ok(collect(subscriptions))
}

// =============================================================================
// Registrations
// =============================================================================

/// GET /v1/registrations
pub async fn list_registrations(
    State(state): State<AppState>,
) -> HandlerResult<Vec<RegistrationDto>> {
    let registrations = db_services::retrieve_all_registrations(state.repository.as_ref()).await?;
    Ok(collect(registrations))
}

/// GET /v1/registrations/{id}
pub async fn get_registration(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<RegistrationDto> {
    let registration =
        db_services::retrieve_registration(state.repository.as_ref(), RegistrationId::new(id))
            .await?;
    Ok(Json(registration.into()))
}

/// POST /v1/registrations/skier/{skier_id}
///
/// Store a registration for the skier with no course yet.
pub async fn create_registration_for_skier(
    State(state): State<AppState>,
    Path(skier_id): Path<i64>,
    ValidJson(request): ValidJson<RegistrationRequest>,
) -> CreatedResult<RegistrationDto> {
    let stored = db_services::add_registration_and_assign_to_skier(
        state.repository.as_ref(),
        &request.to_registration(),
        SkierId::new(skier_id),
    )
    .await?;
    created(stored.into())
}

/// PUT /v1/registrations/{id}/course/{course_id}
pub async fn assign_registration_course(
    State(state): State<AppState>,
    Path((id, course_id)): Path<(i64, i64)>,
) -> HandlerResult<RegistrationDto> {
    let registration = db_services::assign_registration_to_course(
        state.repository.as_ref(),
        RegistrationId::new(id),
        CourseId::new(course_id),
    )
    .await?;
    Ok(Json(registration.into()))
}

/// POST /v1/registrations/skier/{skier_id}/course/{course_id}
///
/// Eligibility-checked registration. A refused registration answers with
/// the rejection code and nothing is stored.
pub async fn register_skier(
    State(state): State<AppState>,
    Path((skier_id, course_id)): Path<(i64, i64)>,
    ValidJson(request): ValidJson<RegistrationRequest>,
) -> CreatedResult<RegistrationRecordDto> {
    let outcome = registration::register_skier_to_course(
        state.repository.as_ref(),
        &state.policy,
        &state.gate,
        &request.to_registration(),
        SkierId::new(skier_id),
        CourseId::new(course_id),
    )
    .await?;

    match outcome {
        RegistrationOutcome::Registered(record) => created(record.into()),
        RegistrationOutcome::Rejected(reason) => Err(reason.into()),
    }
}
