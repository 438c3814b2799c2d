use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::Response;
use serde::de::DeserializeOwned;

use super::errors::json_error;

/// `axum::Json` whose rejections use the API's JSON error body.
///
/// Malformed or mistyped bodies answer 400 `validation_error`; other
/// rejections (missing content type, oversized body) keep axum's status.
pub struct Json<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_to_response(rejection)),
        }
    }
}

fn rejection_to_response(rejection: JsonRejection) -> Response {
    match rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            rejection.body_text(),
        ),
        other => json_error(other.status(), "invalid_body", other.body_text()),
    }
}
