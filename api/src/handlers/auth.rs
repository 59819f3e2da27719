use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::respond;
use crate::{
    error::AppError,
    middleware::CurrentUser,
    models::user::User,
    session::USER_ID_KEY,
    store::StoreError,
    AppState, SESSION_NAME,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

// Any body that is not a JSON object of this shape is a 400, so the body is
// decoded by hand rather than through the `Json` extractor.
fn decode_credentials(body: &Bytes) -> Result<Credentials, AppError> {
    Ok(serde_json::from_slice(body)?)
}

pub async fn create_user(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let req = decode_credentials(&body)?;

    let mut user = state
        .store
        .user()
        .create(User::new(req.email, req.password))
        .await?;

    user.erase_password();
    Ok(respond(StatusCode::CREATED, Some(&user)))
}

pub async fn create_session(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let req = decode_credentials(&body)?;

    let user = match state.store.user().find_by_email(&req.email).await {
        Ok(user) if user.compare_password(&req.password) => user,
        Ok(_) | Err(StoreError::RecordNotFound) => return Err(AppError::LoginFail),
        Err(e) => return Err(e.into()),
    };

    let mut session = state.sessions.get(&jar, SESSION_NAME)?;
    session.insert(USER_ID_KEY, user.id);
    let jar = state.sessions.save(jar, &session)?;

    tracing::debug!(user_id = user.id, "session created");
    Ok((jar, respond(StatusCode::OK, None::<()>)))
}

pub async fn current_user(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Response {
    respond(StatusCode::OK, Some(&user))
}
