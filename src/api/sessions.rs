use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;
use warp::{Filter, Rejection, Reply};

use crate::session::{
    generate_session_token, AuthenticatedUser, InvalidCredentials, SessionStore, SharedPassword,
};

#[derive(Deserialize)]
pub struct LoginPayload {
    password: String,
}

/// One shared password; a correct guess mints a session token delivered as
/// both cookie and response body.
async fn login_handler(
    payload: LoginPayload,
    password: Arc<SharedPassword>,
    store: Arc<SessionStore>,
) -> Result<impl Reply, Rejection> {
    if payload.password != password.0 {
        return Err(warp::reject::custom(InvalidCredentials));
    }
    let token = generate_session_token();
    store.store_session(&token, AuthenticatedUser(Uuid::new_v4()));

    let json = warp::reply::json(&token);
    let response = warp::reply::with_header(
        json,
        "Set-Cookie",
        format!("session-token={}; HttpOnly; Path=/", token),
    );
    Ok(response)
}

fn with_password(
    password: Arc<SharedPassword>,
) -> impl Filter<Extract = (Arc<SharedPassword>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || password.clone())
}

pub fn routes(
    password: Arc<SharedPassword>,
    store: Arc<SessionStore>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with_password(password))
        .and(warp::any().map(move || store.clone()))
        .and_then(login_handler);

    warp::path("auth").and(login)
}
