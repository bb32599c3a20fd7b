use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Field name -> human readable message.
pub type FieldErrors = BTreeMap<String, String>;

const CREDENTIALS_MISMATCH: &str = "Email and password do not match";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("email is already registered")]
    DuplicateEmail,
    /// Unknown email and wrong password both end up here.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(name.to_string(), message.into());
        Self::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: &'static str,
    pub errors: FieldErrors,
}

fn fields<const N: usize>(pairs: [(&str, &str); N]) -> FieldErrors {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, errors) = match self {
            Self::Validation(errors) => ("Validation error", errors),
            Self::DuplicateEmail => (
                "Validation error",
                fields([("email", "email is already registered")]),
            ),
            Self::InvalidCredentials => (
                "Invalid credentials",
                fields([
                    ("email", CREDENTIALS_MISMATCH),
                    ("password", CREDENTIALS_MISMATCH),
                ]),
            ),
            Self::Unauthorized(reason) => ("Unauthorized", fields([("token", reason)])),
            Self::Internal(err) => {
                // Cause stays in the server log only.
                error!(error = ?err, "internal error");
                (
                    "Internal server error",
                    fields([("general", "An unexpected error occurred")]),
                )
            }
        };

        let body = ErrorBody {
            status_code: status.as_u16(),
            message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn render(err: AuthError) -> (StatusCode, Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_conflict() {
        let (status, body) = render(AuthError::DuplicateEmail).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["statusCode"], 409);
        assert_eq!(body["message"], "Validation error");
        assert_eq!(body["errors"]["email"], "email is already registered");
    }

    #[tokio::test]
    async fn invalid_credentials_populates_both_fields_identically() {
        let (status, body) = render(AuthError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
        assert_eq!(body["errors"]["email"], body["errors"]["password"]);
    }

    #[tokio::test]
    async fn internal_error_does_not_leak_cause() {
        let (status, body) =
            render(AuthError::Internal(anyhow::anyhow!("connection refused to 10.0.0.5"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("10.0.0.5"));
        assert_eq!(body["errors"]["general"], "An unexpected error occurred");
    }

    #[tokio::test]
    async fn validation_error_carries_field_messages() {
        let (status, body) = render(AuthError::field("password", "too short")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["errors"]["password"], "too short");
    }
}
