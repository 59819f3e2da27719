//! Client-held sessions.
//!
//! A session is a JSON object map stored in a single cookie. The cookie value
//! is an HS256 token signed with the server's session key, so the server
//! keeps no session table: whatever the client presents is trusted once the
//! signature, subject and expiry check out.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const MAX_AGE_DAYS: i64 = 30;

pub const USER_ID_KEY: &str = "user_id";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session cookie is invalid: {0}")]
    Decode(#[source] jsonwebtoken::errors::Error),

    #[error("session cookie could not be encoded: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    name: String,
    values: Map<String, Value>,
    is_new: bool,
}

impl Session {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            values: Map::new(),
            is_new: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when no cookie was presented for this session.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn user_id(&self) -> Option<i64> {
        self.get(USER_ID_KEY)?.as_i64()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    iat: i64,
    exp: i64,
    values: Map<String, Value>,
}

/// Issues and reads signed session cookies.
#[derive(Clone)]
pub struct CookieStore {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl CookieStore {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Loads session `name` from the request cookies. A missing cookie yields
    /// a fresh, empty session; a cookie that fails verification is an error.
    pub fn get(&self, jar: &CookieJar, name: &str) -> Result<Session, SessionError> {
        let Some(cookie) = jar.get(name) else {
            return Ok(Session::new(name));
        };

        Ok(Session {
            name: name.to_owned(),
            values: self.decode(name, cookie.value())?,
            is_new: false,
        })
    }

    /// Adds the signed cookie for `session` to `jar`.
    pub fn save(&self, jar: CookieJar, session: &Session) -> Result<CookieJar, SessionError> {
        let value = self.encode(&session.name, &session.values)?;
        let cookie = Cookie::build((session.name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(MAX_AGE_DAYS))
            .build();

        Ok(jar.add(cookie))
    }

    pub fn encode(&self, name: &str, values: &Map<String, Value>) -> Result<String, SessionError> {
        let now = chrono::Utc::now();
        let claims = SessionClaims {
            sub: name.to_owned(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::days(MAX_AGE_DAYS)).timestamp(),
            values: values.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(SessionError::Encode)
    }

    pub fn decode(&self, name: &str, value: &str) -> Result<Map<String, Value>, SessionError> {
        let mut validation = self.validation.clone();
        validation.sub = Some(name.to_owned());

        decode::<SessionClaims>(value, &self.decoding_key, &validation)
            .map(|data| data.claims.values)
            .map_err(SessionError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NAME: &str = "apiserver";

    fn store() -> CookieStore {
        CookieStore::new(b"secret")
    }

    fn jar_with(name: &str, value: String) -> CookieJar {
        CookieJar::new().add(Cookie::new(name.to_owned(), value))
    }

    #[test]
    fn missing_cookie_gives_new_session() {
        let session = store().get(&CookieJar::new(), NAME).unwrap();
        assert!(session.is_new());
        assert_eq!(session.name(), NAME);
        assert!(session.values().is_empty());
        assert_eq!(session.user_id(), None);
    }

    #[test]
    fn saved_session_reads_back() {
        let s = store();
        let mut session = s.get(&CookieJar::new(), NAME).unwrap();
        session.insert(USER_ID_KEY, 42);

        let jar = s.save(CookieJar::new(), &session).unwrap();
        let cookie = jar.get(NAME).unwrap();
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));

        let loaded = s.get(&jar, NAME).unwrap();
        assert!(!loaded.is_new());
        assert_eq!(loaded.user_id(), Some(42));
    }

    #[test]
    fn user_id_must_be_an_integer() {
        let s = store();
        let mut values = Map::new();
        values.insert(USER_ID_KEY.into(), json!("42"));
        let jar = jar_with(NAME, s.encode(NAME, &values).unwrap());
        assert_eq!(s.get(&jar, NAME).unwrap().user_id(), None);
    }

    #[test]
    fn tampered_cookie_is_rejected() {
        let s = store();
        let mut value = s.encode(NAME, &Map::new()).unwrap();
        value.push('x');
        let err = s.get(&jar_with(NAME, value), NAME).unwrap_err();
        assert!(matches!(err, SessionError::Decode(_)));
    }

    #[test]
    fn cookie_signed_with_other_key_is_rejected() {
        let value = CookieStore::new(b"other").encode(NAME, &Map::new()).unwrap();
        assert!(store().get(&jar_with(NAME, value), NAME).is_err());
    }

    #[test]
    fn cookie_issued_for_other_name_is_rejected() {
        let s = store();
        let value = s.encode("elsewhere", &Map::new()).unwrap();
        assert!(s.get(&jar_with(NAME, value), NAME).is_err());
    }

    #[test]
    fn garbage_cookie_is_rejected() {
        let jar = jar_with(NAME, "not-a-token".into());
        assert!(store().get(&jar, NAME).is_err());
    }
}
