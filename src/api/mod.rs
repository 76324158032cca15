use std::convert::Infallible;
use std::sync::Arc;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use warp::Filter;

pub mod collaborators;
pub mod contacts;
pub mod dashboard;
pub mod events;
pub mod links;
pub mod outreach;
pub mod projects;
pub mod scout;
pub mod sessions;
pub mod tasks;
pub mod venues;

pub use crate::tables::DbPool;

#[derive(Debug)]
pub struct ConflictError {}
impl warp::reject::Reject for ConflictError {}

#[derive(Debug)]
pub struct DatabaseError {}
impl warp::reject::Reject for DatabaseError {}

#[derive(Debug)]
pub struct NotFoundError {}
impl warp::reject::Reject for NotFoundError {}

#[derive(Debug)]
pub struct ParseError {}
impl warp::reject::Reject for ParseError {}

#[derive(Debug)]
pub struct ValidationError {}
impl warp::reject::Reject for ValidationError {}

#[derive(Debug)]
pub struct InvalidConfigurationError {}
impl warp::reject::Reject for InvalidConfigurationError {}

pub(crate) type PooledPg = PooledConnection<ConnectionManager<PgConnection>>;

pub(crate) fn acquire(db_pool: &DbPool) -> Result<PooledPg, warp::Rejection> {
    db_pool
        .get()
        .map_err(|_| warp::reject::custom(DatabaseError {}))
}

pub(crate) fn db_error(err: diesel::result::Error) -> warp::Rejection {
    match err {
        diesel::result::Error::NotFound => warp::reject::custom(NotFoundError {}),
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        ) => warp::reject::custom(ConflictError {}),
        err => {
            tracing::error!("Database failure: {:?}", err);
            warp::reject::custom(DatabaseError {})
        }
    }
}

/// Format check for optional email fields; the stored value is whatever
/// the caller sent once it parses.
pub(crate) fn validate_email(email: &Option<String>) -> Result<(), warp::Rejection> {
    if let Some(email) = email {
        if email.parse::<email_address::EmailAddress>().is_err() {
            return Err(warp::reject::custom(ValidationError {}));
        }
    }
    Ok(())
}

pub fn with_db(pool: Arc<DbPool>) -> impl Filter<Extract = (Arc<DbPool>,), Error = Infallible> + Clone {
    warp::any().map(move || pool.clone())
}
