use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{handlers::respond, session::SessionError, store::StoreError};

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Store(StoreError),
    Session(SessionError),
    LoginFail,
    NotAuthenticated,
}

impl From<StoreError> for AppError {
    fn from(inner: StoreError) -> Self {
        AppError::Store(inner)
    }
}

impl From<SessionError> for AppError {
    fn from(inner: SessionError) -> Self {
        AppError::Session(inner)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(inner: serde_json::Error) -> Self {
        AppError::BadRequest(inner.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Store(e) => match e {
                StoreError::Validation(_) | StoreError::EmailTaken => {
                    (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
                }
                // Lookups that can miss are mapped to 401 by their callers,
                // so a stray not-found here is a server fault.
                StoreError::RecordNotFound
                | StoreError::PasswordHash(_)
                | StoreError::Database(_) => {
                    tracing::error!(error = %e, "store error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal server error".to_string(),
                    )
                }
            },
            AppError::Session(e) => {
                tracing::error!(error = %e, "session error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            AppError::LoginFail => (
                StatusCode::UNAUTHORIZED,
                "incorrect email or password".to_string(),
            ),
            AppError::NotAuthenticated => {
                (StatusCode::UNAUTHORIZED, "not authenticated".to_string())
            }
        };

        respond(status, Some(json!({ "error": error_message })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn status_and_body(err: AppError) -> (StatusCode, Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn store_errors_map_to_status() {
        let cases = [
            (StoreError::EmailTaken, StatusCode::UNPROCESSABLE_ENTITY),
            (StoreError::RecordNotFound, StatusCode::INTERNAL_SERVER_ERROR),
            (
                StoreError::Database(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let (status, _) = status_and_body(AppError::Store(err)).await;
            assert_eq!(status, expected);
        }
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) = status_and_body(AppError::Store(StoreError::RecordNotFound)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "internal server error"}));
    }

    #[tokio::test]
    async fn auth_errors_are_unauthorized() {
        let (status, body) = status_and_body(AppError::NotAuthenticated).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "not authenticated"}));

        let (status, body) = status_and_body(AppError::LoginFail).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "incorrect email or password"}));
    }
}
