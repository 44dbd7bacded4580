//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::registration::RejectionReason;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (validation error)
    BadRequest(String),
    /// Repository error
    Repository(RepositoryError),
    /// Registration refused by the eligibility rules
    Rejected(RejectionReason),
}

fn rejection_status(reason: &RejectionReason) -> StatusCode {
    match reason {
        RejectionReason::SkierNotFound | RejectionReason::CourseNotFound => StatusCode::NOT_FOUND,
        RejectionReason::AlreadyRegistered | RejectionReason::CourseFull { .. } => {
            StatusCode::CONFLICT
        }
        RejectionReason::AgeIneligible { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Repository(e) => match e {
                RepositoryError::NotFound { .. } => (
                    StatusCode::NOT_FOUND,
                    ApiError::new("NOT_FOUND", e.message()),
                ),
                RepositoryError::ValidationError { .. } => (
                    StatusCode::BAD_REQUEST,
                    ApiError::new("BAD_REQUEST", e.message()),
                ),
                other => {
                    tracing::error!("Repository failure: {}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("REPOSITORY_ERROR", "Persistence failure")
                            .with_details(other.message()),
                    )
                }
            },
            AppError::Rejected(reason) => (
                rejection_status(&reason),
                ApiError::new(reason.code(), reason.to_string()),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<RejectionReason> for AppError {
    fn from(reason: RejectionReason) -> Self {
        AppError::Rejected(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseType;

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(
            rejection_status(&RejectionReason::SkierNotFound),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            rejection_status(&RejectionReason::AlreadyRegistered),
            StatusCode::CONFLICT
        );
        assert_eq!(
            rejection_status(&RejectionReason::CourseFull { capacity: 6 }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            rejection_status(&RejectionReason::AgeIneligible {
                age: 20,
                course_type: CourseType::CollectiveChildren,
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_repository_errors_map_by_variant() {
        let not_found = AppError::from(RepositoryError::entity_not_found("course", 3)).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid = AppError::from(RepositoryError::validation("bad week")).into_response();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        // A message mentioning "not found" must not turn a pool failure into a 404.
        let fault =
            AppError::from(RepositoryError::connection("host not found")).into_response();
        assert_eq!(fault.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_every_variant_renders_a_coded_body() {
        let cases = [
            (AppError::BadRequest("week must be positive".into()), "BAD_REQUEST"),
            (AppError::from(RepositoryError::connection("pool closed")), "REPOSITORY_ERROR"),
            (AppError::from(RejectionReason::CourseFull { capacity: 6 }), "COURSE_FULL"),
        ];

        for (error, code) in cases {
            let response = error.into_response();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body: ApiError = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body.code, code);
            assert!(!body.message.is_empty());
        }
    }
}
