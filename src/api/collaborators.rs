use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;
use warp::{Filter, Rejection, Reply};

use super::*;
use crate::events::Change;
use crate::router::with_broadcast;
use crate::session::{authenticate, AuthenticatedUser, SessionStore};
use crate::tables::{Collaborator, CollaboratorChanges, NewCollaborator};

async fn create_collaborator_handler(
    fields: NewCollaborator,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Collaborator>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    validate_email(&fields.email)?;
    let collaborator = Collaborator::create(&mut conn, fields).map_err(db_error)?;
    sender.send(Change::Created(collaborator.clone())).ok();
    Ok(warp::reply::json(&collaborator))
}

async fn get_collaborator_handler(
    collaborator_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let collaborator = match Collaborator::get(&mut conn, collaborator_id) {
        Some(collaborator) => collaborator,
        None => return Err(warp::reject::custom(NotFoundError {})),
    };
    Ok(warp::reply::json(&collaborator))
}

async fn list_collaborators_handler(
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let collaborators = Collaborator::list(&mut conn).map_err(db_error)?;
    Ok(warp::reply::json(&collaborators))
}

async fn update_collaborator_handler(
    collaborator_id: Uuid,
    changes: CollaboratorChanges,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Collaborator>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    validate_email(&changes.email)?;
    let collaborator =
        Collaborator::update(&mut conn, collaborator_id, changes).map_err(db_error)?;
    sender.send(Change::Updated(collaborator.clone())).ok();
    Ok(warp::reply::json(&collaborator))
}

async fn delete_collaborator_handler(
    collaborator_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Collaborator>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    Collaborator::delete(&mut conn, collaborator_id).map_err(db_error)?;
    sender.send(Change::Deleted(collaborator_id)).ok();
    Ok(warp::reply::json(&"Collaborator removed"))
}

pub fn routes(
    store: Arc<SessionStore>,
    pool: Arc<DbPool>,
    collaborator_tx: broadcast::Sender<Change<Collaborator>>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let create_collaborator = warp::post()
        .and(warp::path::end())
        .and(warp::body::json())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(collaborator_tx.clone()))
        .and_then(create_collaborator_handler);

    let list_collaborators = warp::get()
        .and(warp::path("list"))
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(list_collaborators_handler);

    let get_collaborator = warp::get()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(get_collaborator_handler);

    let update_collaborator = warp::put()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(warp::body::json())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(collaborator_tx.clone()))
        .and_then(update_collaborator_handler);

    let delete_collaborator = warp::delete()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(collaborator_tx))
        .and_then(delete_collaborator_handler);

    warp::path("collaborator").and(
        create_collaborator
            .or(list_collaborators)
            .or(get_collaborator)
            .or(update_collaborator)
            .or(delete_collaborator),
    )
}
