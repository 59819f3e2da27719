use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::Instrument;
use uuid::Uuid;

use crate::{error::AppError, models::user::User, AppState, SESSION_NAME};

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Per-request identifier, set by [`set_request_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// The user resolved from the session cookie by [`authenticate_user`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

pub async fn set_request_id(mut req: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }
    res
}

pub async fn log_request(req: Request, next: Next) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    let span = tracing::info_span!("request", %remote_addr, %request_id);
    async move {
        tracing::info!("started {} {}", req.method(), req.uri());

        let start = Instant::now();
        let res = next.run(req).await;
        log_completion(res.status(), start);
        res
    }
    .instrument(span)
    .await
}

fn log_completion(status: StatusCode, start: Instant) {
    let code = status.as_u16();
    let reason = status.canonical_reason().unwrap_or_default();
    let elapsed = start.elapsed();

    if status.is_server_error() {
        tracing::error!("completed with {code} {reason} in {elapsed:?}");
    } else if status.is_client_error() {
        tracing::warn!("completed with {code} {reason} in {elapsed:?}");
    } else {
        tracing::info!("completed with {code} {reason} in {elapsed:?}");
    }
}

/// Gate for the private routes: resolves the session's `user_id` to a user
/// and hands it to the next handler as [`CurrentUser`].
pub async fn authenticate_user(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = state.sessions.get(&jar, SESSION_NAME)?;
    let id = session.user_id().ok_or(AppError::NotAuthenticated)?;

    let user = match state.store.user().find(id).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(user_id = id, error = %e, "session user lookup failed");
            return Err(AppError::NotAuthenticated);
        }
    };

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
