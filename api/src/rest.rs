use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{any, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    handlers::auth,
    middleware::{authenticate_user, log_request, set_request_id},
    AppState,
};

pub fn router(state: AppState) -> Router {
    let private = Router::new()
        .route("/currentuser", get(auth::current_user))
        .route_layer(from_fn_with_state(state.clone(), authenticate_user));

    Router::new()
        .route("/test", any(|| async { "test" }))
        .route("/users", post(auth::create_user))
        .route("/sessions", post(auth::create_session))
        .nest("/private", private)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(set_request_id))
                .layer(from_fn(log_request))
                .layer(CorsLayer::new().allow_origin(Any)),
        )
        .with_state(state)
}
