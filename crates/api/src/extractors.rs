//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, OptionalFromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use validator::{Validate, ValidationErrors};

/// JSON body that has been deserialized and validated.
///
/// Malformed bodies, unknown fields and failed validation all answer
/// `400 Bad Request` with the usual error body.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

fn json_rejection(rejection: &JsonRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_body",
            "message": rejection.body_text()
        })),
    )
        .into_response()
}

fn validation_rejection(errors: &ValidationErrors) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "validation_error",
            "message": errors.to_string()
        })),
    )
        .into_response()
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = <Json<T> as FromRequest<S>>::from_request(req, state)
            .await
            .map_err(|e| json_rejection(&e))?;
        value.validate().map_err(|e| validation_rejection(&e))?;
        Ok(Self(value))
    }
}

/// A request without a `Content-Type` header carries no body.
impl<T, S> OptionalFromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let body = <Json<T> as OptionalFromRequest<S>>::from_request(req, state)
            .await
            .map_err(|e| json_rejection(&e))?;

        match body {
            Some(Json(value)) => {
                value.validate().map_err(|e| validation_rejection(&e))?;
                Ok(Some(Self(value)))
            }
            None => Ok(None),
        }
    }
}
