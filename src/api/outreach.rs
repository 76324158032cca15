use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;
use warp::{Filter, Rejection, Reply};

use super::*;
use crate::events::Change;
use crate::router::with_broadcast;
use crate::session::{authenticate, AuthenticatedUser, SessionStore};
use crate::tables::{NewOutreach, Outreach, OutreachChanges};

async fn create_outreach_handler(
    fields: NewOutreach,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Outreach>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let outreach = Outreach::create(&mut conn, fields).map_err(db_error)?;
    sender.send(Change::Created(outreach.clone())).ok();
    Ok(warp::reply::json(&outreach))
}

async fn get_outreach_handler(
    outreach_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let outreach = match Outreach::get(&mut conn, outreach_id) {
        Some(outreach) => outreach,
        None => return Err(warp::reject::custom(NotFoundError {})),
    };
    Ok(warp::reply::json(&outreach))
}

async fn list_outreach_handler(
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let rows = Outreach::list(&mut conn).map_err(db_error)?;
    Ok(warp::reply::json(&rows))
}

async fn list_by_venue_handler(
    venue_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let rows = Outreach::list_by_venue(&mut conn, venue_id).map_err(db_error)?;
    Ok(warp::reply::json(&rows))
}

async fn list_by_contact_handler(
    contact_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let rows = Outreach::list_by_contact(&mut conn, contact_id).map_err(db_error)?;
    Ok(warp::reply::json(&rows))
}

async fn list_by_project_handler(
    project_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let rows = Outreach::list_by_project(&mut conn, project_id).map_err(db_error)?;
    Ok(warp::reply::json(&rows))
}

async fn update_outreach_handler(
    outreach_id: Uuid,
    changes: OutreachChanges,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Outreach>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let outreach = Outreach::update(&mut conn, outreach_id, changes).map_err(db_error)?;
    sender.send(Change::Updated(outreach.clone())).ok();
    Ok(warp::reply::json(&outreach))
}

async fn delete_outreach_handler(
    outreach_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Outreach>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    Outreach::delete(&mut conn, outreach_id).map_err(db_error)?;
    sender.send(Change::Deleted(outreach_id)).ok();
    Ok(warp::reply::json(&"Outreach removed"))
}

pub fn routes(
    store: Arc<SessionStore>,
    pool: Arc<DbPool>,
    outreach_tx: broadcast::Sender<Change<Outreach>>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let create_outreach = warp::post()
        .and(warp::path::end())
        .and(warp::body::json())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(outreach_tx.clone()))
        .and_then(create_outreach_handler);

    let list_outreach = warp::get()
        .and(warp::path("list"))
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(list_outreach_handler);

    let list_by_venue = warp::get()
        .and(warp::path("venue"))
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(list_by_venue_handler);

    let list_by_contact = warp::get()
        .and(warp::path("contact"))
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(list_by_contact_handler);

    let list_by_project = warp::get()
        .and(warp::path("project"))
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(list_by_project_handler);

    let get_outreach = warp::get()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(get_outreach_handler);

    let update_outreach = warp::put()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(warp::body::json())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(outreach_tx.clone()))
        .and_then(update_outreach_handler);

    let delete_outreach = warp::delete()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(outreach_tx))
        .and_then(delete_outreach_handler);

    warp::path("outreach").and(
        create_outreach
            .or(list_outreach)
            .or(list_by_venue)
            .or(list_by_contact)
            .or(list_by_project)
            .or(get_outreach)
            .or(update_outreach)
            .or(delete_outreach),
    )
}
