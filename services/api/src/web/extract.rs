//! services/api/src/web/extract.rs
//!
//! Request body extraction shared by the REST handlers.
//!
//! Clients send loosely typed JSON: flags and text fields are read by
//! truthiness, so a `null` flag is off and a numeric topic is still a topic.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use mind_mapper_core::domain::{is_blank, value_to_text};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::web::rest::{error_response, HandlerError};

/// A JSON request body whose rejections are answered with an `ErrorBody`.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HandlerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_response(rejection)),
        }
    }
}

fn rejection_response(rejection: JsonRejection) -> HandlerError {
    let message = rejection.body_text();
    warn!(status = %rejection.status(), "Rejected request body: {}", message);
    error_response(StatusCode::BAD_REQUEST, message)
}

/// Deserializes a field so that an explicit `null` is kept as `Some(Value::Null)`.
///
/// Combined with `#[serde(default)]` this tells a missing key apart from a null one.
pub fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Reads any JSON value as a flag; blank values are `false`.
pub fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| !is_blank(&value))
}

/// The text of a field that was given and is not blank.
pub fn non_blank_text(value: Option<Value>) -> Option<String> {
    value.filter(|v| !is_blank(v)).map(|v| value_to_text(&v))
}
