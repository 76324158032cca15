use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use base64::Engine;
use rand::RngCore;
use uuid::Uuid;
use warp::{Filter, Rejection};

/// The one shared password that gates the API. Not a security boundary:
/// there are no accounts, only a door.
pub struct SharedPassword(pub String);

pub struct SessionStore {
    sessions: Mutex<HashMap<String, AuthenticatedUser>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn store_session(&self, token: &str, user: AuthenticatedUser) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(token.to_string(), user);
    }

    pub fn get_user_from_token(&self, token: &str) -> Option<AuthenticatedUser> {
        let sessions = self.sessions.lock().unwrap();
        sessions.get(token).cloned()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AuthenticatedUser(pub Uuid);

#[derive(Debug)]
pub struct InvalidCredentials;
impl warp::reject::Reject for InvalidCredentials {}

#[derive(Debug)]
pub struct InvalidSessionToken;
impl warp::reject::Reject for InvalidSessionToken {}

#[derive(Debug)]
pub struct NoSessionToken;
impl warp::reject::Reject for NoSessionToken {}

pub fn generate_session_token() -> String {
    let mut bytes = vec![0u8; 256];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE.encode(bytes)
}

pub fn authenticate(
    session_store: Arc<SessionStore>,
) -> impl Filter<Extract = (AuthenticatedUser,), Error = Rejection> + Clone {
    warp::any()
        .and(warp::header::optional("session-token"))
        .and_then(move |session_token: Option<String>| {
            let store = session_store.clone();
            async move {
                match session_token {
                    Some(token) => {
                        if let Some(user) = store.get_user_from_token(&token) {
                            Ok(user)
                        } else {
                            Err(warp::reject::custom(InvalidSessionToken))
                        }
                    }
                    None => Err(warp::reject::custom(NoSessionToken)),
                }
            }
        })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_session_store_round_trip() {
        let store = SessionStore::new();
        let token = generate_session_token();
        let user = AuthenticatedUser(Uuid::new_v4());

        assert!(store.get_user_from_token(&token).is_none());
        store.store_session(&token, user);
        let found = store.get_user_from_token(&token).expect("session");
        assert_eq!(found.0, user.0);
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_session_token(), generate_session_token());
    }
}
