//! One route tree for all seven junction tables, addressed by relation
//! name: venue_contacts, project_venues, project_contacts,
//! project_collaborators, task_venues, task_projects, task_contacts.

use std::sync::Arc;

use diesel::pg::PgConnection;
use diesel::QueryResult;
use serde::Serialize;
use uuid::Uuid;
use warp::{Filter, Rejection, Reply};

use super::*;
use crate::session::{authenticate, AuthenticatedUser, SessionStore};
use crate::tables::{
    Collaborator, Contact, Project, ProjectCollaborator, ProjectContact, ProjectVenue, Task,
    TaskContact, TaskProject, TaskVenue, Venue, VenueContact,
};

pub const RELATIONS: &[&str] = &[
    "venue_contacts",
    "project_venues",
    "project_contacts",
    "project_collaborators",
    "task_venues",
    "task_projects",
    "task_contacts",
];

#[derive(Serialize)]
pub struct LinkRow {
    pub parent_id: Uuid,
    pub child_id: Uuid,
}

impl From<(Uuid, Uuid)> for LinkRow {
    fn from((parent_id, child_id): (Uuid, Uuid)) -> Self {
        LinkRow { parent_id, child_id }
    }
}

fn relation_pairs(conn: &mut PgConnection, relation: &str) -> Option<QueryResult<Vec<(Uuid, Uuid)>>> {
    Some(match relation {
        "venue_contacts" => VenueContact::pairs(conn),
        "project_venues" => ProjectVenue::pairs(conn),
        "project_contacts" => ProjectContact::pairs(conn),
        "project_collaborators" => ProjectCollaborator::pairs(conn),
        "task_venues" => TaskVenue::pairs(conn),
        "task_projects" => TaskProject::pairs(conn),
        "task_contacts" => TaskContact::pairs(conn),
        _ => return None,
    })
}

fn relation_children(
    conn: &mut PgConnection,
    relation: &str,
    parent_id: Uuid,
) -> Option<QueryResult<Vec<Uuid>>> {
    Some(match relation {
        "venue_contacts" => VenueContact::children(conn, parent_id),
        "project_venues" => ProjectVenue::children(conn, parent_id),
        "project_contacts" => ProjectContact::children(conn, parent_id),
        "project_collaborators" => ProjectCollaborator::children(conn, parent_id),
        "task_venues" => TaskVenue::children(conn, parent_id),
        "task_projects" => TaskProject::children(conn, parent_id),
        "task_contacts" => TaskContact::children(conn, parent_id),
        _ => return None,
    })
}

fn relation_parents(
    conn: &mut PgConnection,
    relation: &str,
    child_id: Uuid,
) -> Option<QueryResult<Vec<Uuid>>> {
    Some(match relation {
        "venue_contacts" => VenueContact::parents(conn, child_id),
        "project_venues" => ProjectVenue::parents(conn, child_id),
        "project_contacts" => ProjectContact::parents(conn, child_id),
        "project_collaborators" => ProjectCollaborator::parents(conn, child_id),
        "task_venues" => TaskVenue::parents(conn, child_id),
        "task_projects" => TaskProject::parents(conn, child_id),
        "task_contacts" => TaskContact::parents(conn, child_id),
        _ => return None,
    })
}

fn endpoints_exist(
    conn: &mut PgConnection,
    relation: &str,
    parent_id: Uuid,
    child_id: Uuid,
) -> QueryResult<bool> {
    Ok(match relation {
        "venue_contacts" => Venue::exists(conn, parent_id)? && Contact::exists(conn, child_id)?,
        "project_venues" => Project::exists(conn, parent_id)? && Venue::exists(conn, child_id)?,
        "project_contacts" => Project::exists(conn, parent_id)? && Contact::exists(conn, child_id)?,
        "project_collaborators" => {
            Project::exists(conn, parent_id)? && Collaborator::exists(conn, child_id)?
        }
        "task_venues" => Task::exists(conn, parent_id)? && Venue::exists(conn, child_id)?,
        "task_projects" => Task::exists(conn, parent_id)? && Project::exists(conn, child_id)?,
        "task_contacts" => Task::exists(conn, parent_id)? && Contact::exists(conn, child_id)?,
        _ => false,
    })
}

fn relation_link(
    conn: &mut PgConnection,
    relation: &str,
    parent_id: Uuid,
    child_id: Uuid,
) -> Option<QueryResult<()>> {
    Some(match relation {
        "venue_contacts" => VenueContact::link(conn, parent_id, child_id).map(|_| ()),
        "project_venues" => ProjectVenue::link(conn, parent_id, child_id).map(|_| ()),
        "project_contacts" => ProjectContact::link(conn, parent_id, child_id).map(|_| ()),
        "project_collaborators" => ProjectCollaborator::link(conn, parent_id, child_id).map(|_| ()),
        "task_venues" => TaskVenue::link(conn, parent_id, child_id).map(|_| ()),
        "task_projects" => TaskProject::link(conn, parent_id, child_id).map(|_| ()),
        "task_contacts" => TaskContact::link(conn, parent_id, child_id).map(|_| ()),
        _ => return None,
    })
}

fn relation_unlink(
    conn: &mut PgConnection,
    relation: &str,
    parent_id: Uuid,
    child_id: Uuid,
) -> Option<QueryResult<()>> {
    Some(match relation {
        "venue_contacts" => VenueContact::unlink(conn, parent_id, child_id),
        "project_venues" => ProjectVenue::unlink(conn, parent_id, child_id),
        "project_contacts" => ProjectContact::unlink(conn, parent_id, child_id),
        "project_collaborators" => ProjectCollaborator::unlink(conn, parent_id, child_id),
        "task_venues" => TaskVenue::unlink(conn, parent_id, child_id),
        "task_projects" => TaskProject::unlink(conn, parent_id, child_id),
        "task_contacts" => TaskContact::unlink(conn, parent_id, child_id),
        _ => return None,
    })
}

async fn all_links_handler(
    relation: String,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let pairs = relation_pairs(&mut conn, &relation)
        .ok_or_else(|| warp::reject::custom(ParseError {}))?
        .map_err(db_error)?;
    let rows: Vec<LinkRow> = pairs.into_iter().map(LinkRow::from).collect();
    Ok(warp::reply::json(&rows))
}

async fn children_handler(
    relation: String,
    parent_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let children = relation_children(&mut conn, &relation, parent_id)
        .ok_or_else(|| warp::reject::custom(ParseError {}))?
        .map_err(db_error)?;
    Ok(warp::reply::json(&children))
}

async fn parents_handler(
    relation: String,
    child_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let parents = relation_parents(&mut conn, &relation, child_id)
        .ok_or_else(|| warp::reject::custom(ParseError {}))?
        .map_err(db_error)?;
    Ok(warp::reply::json(&parents))
}

async fn link_handler(
    relation: String,
    parent_id: Uuid,
    child_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    if !RELATIONS.contains(&relation.as_str()) {
        return Err(warp::reject::custom(ParseError {}));
    }
    if !endpoints_exist(&mut conn, &relation, parent_id, child_id).map_err(db_error)? {
        return Err(warp::reject::custom(NotFoundError {}));
    }
    relation_link(&mut conn, &relation, parent_id, child_id)
        .ok_or_else(|| warp::reject::custom(ParseError {}))?
        .map_err(db_error)?;
    Ok(warp::reply::json(&LinkRow {
        parent_id,
        child_id,
    }))
}

async fn unlink_handler(
    relation: String,
    parent_id: Uuid,
    child_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    relation_unlink(&mut conn, &relation, parent_id, child_id)
        .ok_or_else(|| warp::reject::custom(ParseError {}))?
        .map_err(db_error)?;
    Ok(warp::reply::json(&"Unlinked"))
}

pub fn routes(
    store: Arc<SessionStore>,
    pool: Arc<DbPool>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let all_links = warp::get()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(all_links_handler);

    let children = warp::get()
        .and(warp::path::param())
        .and(warp::path("of"))
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(children_handler);

    let parents = warp::get()
        .and(warp::path::param())
        .and(warp::path("to"))
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(parents_handler);

    let link = warp::put()
        .and(warp::path::param())
        .and(warp::path::param())
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(link_handler);

    let unlink = warp::delete()
        .and(warp::path::param())
        .and(warp::path::param())
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(unlink_handler);

    warp::path("links").and(children.or(parents).or(all_links).or(link).or(unlink))
}
