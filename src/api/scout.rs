use std::sync::Arc;

use warp::{Filter, Rejection, Reply};

use super::*;
use crate::scout::{self, ScoutError, ScoutParams};
use crate::session::{authenticate, AuthenticatedUser, SessionStore};

/// Kicks off a scouting run and waits for it. There is no cancellation
/// handle: a client that walks away leaves the run to finish on its own.
async fn scout_handler(
    params: ScoutParams,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    match scout::run(db_pool, params).await {
        Ok(report) => Ok(warp::reply::json(&report)),
        Err(err @ ScoutError::MissingApiKey(_)) => {
            tracing::error!("Scout cannot run: {}", err);
            Err(warp::reject::custom(InvalidConfigurationError {}))
        }
        Err(ScoutError::Pool) => Err(warp::reject::custom(DatabaseError {})),
    }
}

pub fn routes(
    store: Arc<SessionStore>,
    pool: Arc<DbPool>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let run_scout = warp::post()
        .and(warp::path::end())
        .and(warp::body::json())
        .and(authenticate(store))
        .and(with_db(pool))
        .and_then(scout_handler);

    warp::path("scout").and(run_scout)
}
