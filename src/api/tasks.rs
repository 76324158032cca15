use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::broadcast;
use uuid::Uuid;
use warp::{Filter, Rejection, Reply};

use super::*;
use crate::events::Change;
use crate::router::with_broadcast;
use crate::session::{authenticate, AuthenticatedUser, SessionStore};
use crate::tables::{NewTask, Task, TaskChanges, TaskContact, TaskProject, TaskVenue};

#[derive(Deserialize)]
pub struct CreateTaskPayload {
    #[serde(flatten)]
    fields: NewTask,
    venue_ids: Option<Vec<Uuid>>,
    project_ids: Option<Vec<Uuid>>,
    contact_ids: Option<Vec<Uuid>>,
}

#[derive(Deserialize)]
pub struct UpdateTaskPayload {
    #[serde(flatten)]
    changes: TaskChanges,
    venue_ids: Option<Vec<Uuid>>,
    project_ids: Option<Vec<Uuid>>,
    contact_ids: Option<Vec<Uuid>>,
}

fn sync_task_links(
    conn: &mut PooledPg,
    task_id: Uuid,
    venue_ids: Option<Vec<Uuid>>,
    project_ids: Option<Vec<Uuid>>,
    contact_ids: Option<Vec<Uuid>>,
) -> Result<(), Rejection> {
    if let Some(venue_ids) = venue_ids {
        TaskVenue::sync(conn, task_id, &venue_ids).map_err(db_error)?;
    }
    if let Some(project_ids) = project_ids {
        TaskProject::sync(conn, task_id, &project_ids).map_err(db_error)?;
    }
    if let Some(contact_ids) = contact_ids {
        TaskContact::sync(conn, task_id, &contact_ids).map_err(db_error)?;
    }
    Ok(())
}

async fn create_task_handler(
    payload: CreateTaskPayload,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Task>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let CreateTaskPayload {
        fields,
        venue_ids,
        project_ids,
        contact_ids,
    } = payload;
    let task = Task::create(&mut conn, fields).map_err(db_error)?;
    sync_task_links(&mut conn, task.id, venue_ids, project_ids, contact_ids)?;
    sender.send(Change::Created(task.clone())).ok();
    Ok(warp::reply::json(&task))
}

async fn get_task_handler(
    task_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let task = match Task::get(&mut conn, task_id) {
        Some(task) => task,
        None => return Err(warp::reject::custom(NotFoundError {})),
    };
    Ok(warp::reply::json(&task))
}

async fn list_tasks_handler(
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let tasks = Task::list(&mut conn).map_err(db_error)?;
    Ok(warp::reply::json(&tasks))
}

async fn update_task_handler(
    task_id: Uuid,
    payload: UpdateTaskPayload,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Task>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let UpdateTaskPayload {
        changes,
        venue_ids,
        project_ids,
        contact_ids,
    } = payload;
    let task = Task::update(&mut conn, task_id, changes).map_err(db_error)?;
    sync_task_links(&mut conn, task.id, venue_ids, project_ids, contact_ids)?;
    sender.send(Change::Updated(task.clone())).ok();
    Ok(warp::reply::json(&task))
}

async fn delete_task_handler(
    task_id: Uuid,
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
    sender: broadcast::Sender<Change<Task>>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    Task::delete(&mut conn, task_id).map_err(db_error)?;
    sender.send(Change::Deleted(task_id)).ok();
    Ok(warp::reply::json(&"Task removed"))
}

pub fn routes(
    store: Arc<SessionStore>,
    pool: Arc<DbPool>,
    task_tx: broadcast::Sender<Change<Task>>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let create_task = warp::post()
        .and(warp::path::end())
        .and(warp::body::json())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(task_tx.clone()))
        .and_then(create_task_handler);

    let list_tasks = warp::get()
        .and(warp::path("list"))
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(list_tasks_handler);

    let get_task = warp::get()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(get_task_handler);

    let update_task = warp::put()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(warp::body::json())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(task_tx.clone()))
        .and_then(update_task_handler);

    let delete_task = warp::delete()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and(with_broadcast(task_tx))
        .and_then(delete_task_handler);

    warp::path("task").and(
        create_task
            .or(list_tasks)
            .or(get_task)
            .or(update_task)
            .or(delete_task),
    )
}
