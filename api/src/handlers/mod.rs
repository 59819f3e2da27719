pub mod auth;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Writes `status` and, when there is one, `data` as the JSON body.
pub fn respond<T: Serialize>(status: StatusCode, data: Option<T>) -> Response {
    match data {
        Some(data) => (status, Json(data)).into_response(),
        None => status.into_response(),
    }
}
