use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::broadcast;
use uuid::Uuid;
use warp::{Filter, Rejection, Reply};

use super::*;
use crate::events::Change;
use crate::router::with_broadcast;
use crate::session::{authenticate, AuthenticatedUser, SessionStore};
use crate::tables::{NewVenue, Venue, VenueChanges, VenueContact};

#[derive(Deserialize)]
pub struct CreateVenuePayload {
    #[serde(flatten)]
    fields: NewVenue,
    contact_ids: Option<Vec<Uuid>>,
}

#[derive(Deserialize)]
pub struct UpdateVenuePayload {
    #[serde(flatten)]
    changes: VenueChanges,
    contact_ids: Option<Vec<Uuid>>,
}

#[derive(Deserialize)]
pub struct ReorderPayload {
    venue_id: Uuid,
    order_num: i32,
}

async fn create_venue_handler(
    payload: CreateVenuePayload,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Venue>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let CreateVenuePayload { fields, contact_ids } = payload;
    let venue = Venue::create(&mut conn, fields).map_err(db_error)?;
    if let Some(contact_ids) = contact_ids {
        VenueContact::sync(&mut conn, venue.id, &contact_ids).map_err(db_error)?;
    }
    sender.send(Change::Created(venue.clone())).ok();
    Ok(warp::reply::json(&venue))
}

async fn get_venue_handler(
    venue_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let venue = match Venue::get(&mut conn, venue_id) {
        Some(venue) => venue,
        None => return Err(warp::reject::custom(NotFoundError {})),
    };
    Ok(warp::reply::json(&venue))
}

async fn list_venues_handler(
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let venues = Venue::list(&mut conn).map_err(db_error)?;
    Ok(warp::reply::json(&venues))
}

async fn update_venue_handler(
    venue_id: Uuid,
    payload: UpdateVenuePayload,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Venue>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let UpdateVenuePayload { changes, contact_ids } = payload;
    let venue = Venue::update(&mut conn, venue_id, changes).map_err(db_error)?;
    if let Some(contact_ids) = contact_ids {
        VenueContact::sync(&mut conn, venue.id, &contact_ids).map_err(db_error)?;
    }
    sender.send(Change::Updated(venue.clone())).ok();
    Ok(warp::reply::json(&venue))
}

async fn delete_venue_handler(
    venue_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Venue>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    Venue::delete(&mut conn, venue_id).map_err(db_error)?;
    sender.send(Change::Deleted(venue_id)).ok();
    Ok(warp::reply::json(&"Venue removed"))
}

async fn reorder_venue_handler(
    payload: ReorderPayload,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Venue>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let venue = Venue::reorder(&mut conn, payload.venue_id, payload.order_num).map_err(db_error)?;
    sender.send(Change::Updated(venue.clone())).ok();
    Ok(warp::reply::json(&venue))
}

pub fn routes(
    store: Arc<SessionStore>,
    pool: Arc<DbPool>,
    venue_tx: broadcast::Sender<Change<Venue>>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let create_venue = warp::post()
        .and(warp::path::end())
        .and(warp::body::json())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(venue_tx.clone()))
        .and_then(create_venue_handler);

    let list_venues = warp::get()
        .and(warp::path("list"))
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(list_venues_handler);

    let reorder_venue = warp::put()
        .and(warp::path("reorder"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(venue_tx.clone()))
        .and_then(reorder_venue_handler);

    let get_venue = warp::get()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(get_venue_handler);

    let update_venue = warp::put()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(warp::body::json())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(venue_tx.clone()))
        .and_then(update_venue_handler);

    let delete_venue = warp::delete()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(venue_tx))
        .and_then(delete_venue_handler);

    warp::path("venue").and(
        create_venue
            .or(list_venues)
            .or(reorder_venue)
            .or(get_venue)
            .or(update_venue)
            .or(delete_venue),
    )
}
