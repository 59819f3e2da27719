pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rest;
pub mod server;
pub mod session;
pub mod settings;
pub mod store;

use std::sync::Arc;

use session::CookieStore;
use store::Store;

/// Cookie name under which the login session is kept.
pub const SESSION_NAME: &str = "apiserver";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: CookieStore,
}

impl AppState {
    pub fn new(store: impl Store + 'static, sessions: CookieStore) -> Self {
        Self {
            store: Arc::new(store),
            sessions,
        }
    }
}
