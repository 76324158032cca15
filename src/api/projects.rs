use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::broadcast;
use uuid::Uuid;
use warp::{Filter, Rejection, Reply};

use super::*;
use crate::events::Change;
use crate::router::with_broadcast;
use crate::session::{authenticate, AuthenticatedUser, SessionStore};
use crate::tables::{
    NewProject, Project, ProjectChanges, ProjectCollaborator, ProjectContact, ProjectVenue,
};

#[derive(Deserialize)]
pub struct CreateProjectPayload {
    #[serde(flatten)]
    fields: NewProject,
    venue_ids: Option<Vec<Uuid>>,
    contact_ids: Option<Vec<Uuid>>,
    collaborator_ids: Option<Vec<Uuid>>,
}

#[derive(Deserialize)]
pub struct UpdateProjectPayload {
    #[serde(flatten)]
    changes: ProjectChanges,
    venue_ids: Option<Vec<Uuid>>,
    contact_ids: Option<Vec<Uuid>>,
    collaborator_ids: Option<Vec<Uuid>>,
}

fn sync_project_links(
    conn: &mut PooledPg,
    project_id: Uuid,
    venue_ids: Option<Vec<Uuid>>,
    contact_ids: Option<Vec<Uuid>>,
    collaborator_ids: Option<Vec<Uuid>>,
) -> Result<(), Rejection> {
    if let Some(venue_ids) = venue_ids {
        ProjectVenue::sync(conn, project_id, &venue_ids).map_err(db_error)?;
    }
    if let Some(contact_ids) = contact_ids {
        ProjectContact::sync(conn, project_id, &contact_ids).map_err(db_error)?;
    }
    if let Some(collaborator_ids) = collaborator_ids {
        ProjectCollaborator::sync(conn, project_id, &collaborator_ids).map_err(db_error)?;
    }
    Ok(())
}

async fn create_project_handler(
    payload: CreateProjectPayload,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Project>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let CreateProjectPayload {
        fields,
        venue_ids,
        contact_ids,
        collaborator_ids,
    } = payload;
    let project = Project::create(&mut conn, fields).map_err(db_error)?;
    sync_project_links(&mut conn, project.id, venue_ids, contact_ids, collaborator_ids)?;
    sender.send(Change::Created(project.clone())).ok();
    Ok(warp::reply::json(&project))
}

async fn get_project_handler(
    project_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let project = match Project::get(&mut conn, project_id) {
        Some(project) => project,
        None => return Err(warp::reject::custom(NotFoundError {})),
    };
    Ok(warp::reply::json(&project))
}

async fn list_projects_handler(
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let projects = Project::list(&mut conn).map_err(db_error)?;
    Ok(warp::reply::json(&projects))
}

async fn update_project_handler(
    project_id: Uuid,
    payload: UpdateProjectPayload,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Project>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let UpdateProjectPayload {
        changes,
        venue_ids,
        contact_ids,
        collaborator_ids,
    } = payload;
    let project = Project::update(&mut conn, project_id, changes).map_err(db_error)?;
    sync_project_links(&mut conn, project.id, venue_ids, contact_ids, collaborator_ids)?;
    sender.send(Change::Updated(project.clone())).ok();
    Ok(warp::reply::json(&project))
}

async fn delete_project_handler(
    project_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Project>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    Project::delete(&mut conn, project_id).map_err(db_error)?;
    sender.send(Change::Deleted(project_id)).ok();
    Ok(warp::reply::json(&"Project removed"))
}

pub fn routes(
    store: Arc<SessionStore>,
    pool: Arc<DbPool>,
    project_tx: broadcast::Sender<Change<Project>>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let create_project = warp::post()
        .and(warp::path::end())
        .and(warp::body::json())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(project_tx.clone()))
        .and_then(create_project_handler);

    let list_projects = warp::get()
        .and(warp::path("list"))
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(list_projects_handler);

    let get_project = warp::get()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(get_project_handler);

    let update_project = warp::put()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(warp::body::json())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(project_tx.clone()))
        .and_then(update_project_handler);

    let delete_project = warp::delete()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(project_tx))
        .and_then(delete_project_handler);

    warp::path("project").and(
        create_project
            .or(list_projects)
            .or(get_project)
            .or(update_project)
            .or(delete_project),
    )
}
