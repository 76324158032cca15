use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::broadcast;
use uuid::Uuid;
use warp::{Filter, Rejection, Reply};

use super::*;
use crate::events::Change;
use crate::router::with_broadcast;
use crate::session::{authenticate, AuthenticatedUser, SessionStore};
use crate::tables::{Contact, ContactChanges, NewContact, VenueContact};

#[derive(Deserialize)]
pub struct CreateContactPayload {
    #[serde(flatten)]
    fields: NewContact,
    venue_ids: Option<Vec<Uuid>>,
}

#[derive(Deserialize)]
pub struct UpdateContactPayload {
    #[serde(flatten)]
    changes: ContactChanges,
    venue_ids: Option<Vec<Uuid>>,
}

async fn create_contact_handler(
    payload: CreateContactPayload,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Contact>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let CreateContactPayload { fields, venue_ids } = payload;
    validate_email(&fields.email)?;
    let contact = Contact::create(&mut conn, fields).map_err(db_error)?;
    if let Some(venue_ids) = venue_ids {
        VenueContact::sync_parents(&mut conn, contact.id, &venue_ids).map_err(db_error)?;
    }
    sender.send(Change::Created(contact.clone())).ok();
    Ok(warp::reply::json(&contact))
}

async fn get_contact_handler(
    contact_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let contact = match Contact::get(&mut conn, contact_id) {
        Some(contact) => contact,
        None => return Err(warp::reject::custom(NotFoundError {})),
    };
    Ok(warp::reply::json(&contact))
}

async fn list_contacts_handler(
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let contacts = Contact::list(&mut conn).map_err(db_error)?;
    Ok(warp::reply::json(&contacts))
}

async fn update_contact_handler(
    contact_id: Uuid,
    payload: UpdateContactPayload,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Contact>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let UpdateContactPayload { changes, venue_ids } = payload;
    validate_email(&changes.email)?;
    let contact = Contact::update(&mut conn, contact_id, changes).map_err(db_error)?;
    if let Some(venue_ids) = venue_ids {
        VenueContact::sync_parents(&mut conn, contact.id, &venue_ids).map_err(db_error)?;
    }
    sender.send(Change::Updated(contact.clone())).ok();
    Ok(warp::reply::json(&contact))
}

async fn delete_contact_handler(
    contact_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Contact>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    Contact::delete(&mut conn, contact_id).map_err(db_error)?;
    sender.send(Change::Deleted(contact_id)).ok();
    Ok(warp::reply::json(&"Contact removed"))
}

async fn backfill_contacts_handler(
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let linked = Contact::backfill_venue_links(&mut conn).map_err(db_error)?;
    tracing::info!("Backfilled {} legacy venue links", linked);
    Ok(warp::reply::json(&linked))
}

pub fn routes(
    store: Arc<SessionStore>,
    pool: Arc<DbPool>,
    contact_tx: broadcast::Sender<Change<Contact>>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let create_contact = warp::post()
        .and(warp::path::end())
        .and(warp::body::json())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(contact_tx.clone()))
        .and_then(create_contact_handler);

    let list_contacts = warp::get()
        .and(warp::path("list"))
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(list_contacts_handler);

    let backfill_contacts = warp::post()
        .and(warp::path("backfill"))
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(backfill_contacts_handler);

    let get_contact = warp::get()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(get_contact_handler);

    let update_contact = warp::put()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(warp::body::json())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(contact_tx.clone()))
        .and_then(update_contact_handler);

    let delete_contact = warp::delete()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(contact_tx))
        .and_then(delete_contact_handler);

    warp::path("contact").and(
        create_contact
            .or(list_contacts)
            .or(backfill_contacts)
            .or(get_contact)
            .or(update_contact)
            .or(delete_contact),
    )
}
