//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Skiers
        .route(
            "/skiers",
            get(handlers::list_skiers).post(handlers::create_skier),
        )
        .route(
            "/skiers/{id}",
            get(handlers::get_skier)
                .put(handlers::update_skier)
                .delete(handlers::delete_skier),
        )
        .route(
            "/skiers/{id}/subscription/{subscription_id}",
            put(handlers::assign_skier_subscription),
        )
        .route(
            "/skiers/{id}/pistes/{piste_id}",
            put(handlers::assign_skier_piste),
        )
        .route("/skiers/course/{course_id}", post(handlers::enroll_skier))
        .route(
            "/skiers/by-subscription/{subscription_type}",
            get(handlers::list_skiers_by_subscription),
        )
        // Courses
        .route(
            "/courses",
            get(handlers::list_courses).post(handlers::create_course),
        )
        .route(
            "/courses/{id}",
            get(handlers::get_course)
                .put(handlers::update_course)
                .delete(handlers::delete_course),
        )
        // Instructors
        .route(
            "/instructors",
            get(handlers::list_instructors).post(handlers::create_instructor),
        )
        .route(
            "/instructors/{id}",
            get(handlers::get_instructor)
                .put(handlers::update_instructor)
                .delete(handlers::delete_instructor),
        )
        .route(
            "/instructors/course/{course_id}",
            post(handlers::create_instructor_for_course),
        )
        .route(
            "/instructors/{id}/weeks/{support}",
            get(handlers::get_instructor_weeks),
        )
        // Pistes
        .route(
            "/pistes",
            get(handlers::list_pistes).post(handlers::create_piste),
        )
        .route(
            "/pistes/{id}",
            get(handlers::get_piste)
                .put(handlers::update_piste)
                .delete(handlers::delete_piste),
        )
        // Subscriptions
        .route(
            "/subscriptions",
            get(handlers::list_subscriptions).post(handlers::create_subscription),
        )
        .route(
            "/subscriptions/{id}",
            get(handlers::get_subscription)
                .put(handlers::update_subscription)
                .delete(handlers::delete_subscription),
        )
        .route(
            "/subscriptions/by-type/{subscription_type}",
            get(handlers::list_subscriptions_by_type),
        )
        .route(
            "/subscriptions/by-dates",
            get(handlers::list_subscriptions_by_dates),
        )
        // Registrations
        .route("/registrations", get(handlers::list_registrations))
        .route("/registrations/{id}", get(handlers::get_registration))
        .route(
            "/registrations/skier/{skier_id}",
            post(handlers::create_registration_for_skier),
        )
        .route(
            "/registrations/{id}/course/{course_id}",
            put(handlers::assign_registration_course),
        )
        .route(
            "/registrations/skier/{skier_id}/course/{course_id}",
            post(handlers::register_skier),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::FullRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
        let _router = create_router(AppState::new(repo));
    }
}
