//! Request extractors.

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use super::error::AppError;

/// Hand-written request checks run before a payload reaches the services.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// JSON body that has been deserialized and passed [`Validate`].
///
/// Malformed JSON, unknown enum values and failed checks all become
/// `400 BAD_REQUEST` with an [`super::error::ApiError`] body.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate().map_err(AppError::BadRequest)?;
        Ok(Self(value))
    }
}
