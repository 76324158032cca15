use serde::Serialize;
use tokio::spawn;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::router::Router;
use crate::tables::{Collaborator, Contact, Outreach, Project, Task, Venue};

/// What happened to one record. Deletions only carry the id; the row is
/// already gone by the time the event is published.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "op", content = "record", rename_all = "snake_case")]
pub enum Change<T> {
    Created(T),
    Updated(T),
    Deleted(Uuid),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "entity", content = "change", rename_all = "snake_case")]
pub enum ChangeEvent {
    Venue(Change<Venue>),
    Contact(Change<Contact>),
    Collaborator(Change<Collaborator>),
    Project(Change<Project>),
    Task(Change<Task>),
    Outreach(Change<Outreach>),
}

impl ChangeEvent {
    pub fn entity_name(&self) -> &'static str {
        match self {
            ChangeEvent::Venue(_) => "venue",
            ChangeEvent::Contact(_) => "contact",
            ChangeEvent::Collaborator(_) => "collaborator",
            ChangeEvent::Project(_) => "project",
            ChangeEvent::Task(_) => "task",
            ChangeEvent::Outreach(_) => "outreach",
        }
    }
}

/// Fans the per-entity streams into one ChangeEvent stream. Subscribers
/// (the /events route) see every mutation the API commits.
pub fn emit_events(router: &mut Router) -> broadcast::Sender<ChangeEvent> {
    let mut venue_rx: broadcast::Receiver<Change<Venue>> = router.subscribe();
    let mut contact_rx: broadcast::Receiver<Change<Contact>> = router.subscribe();
    let mut collaborator_rx: broadcast::Receiver<Change<Collaborator>> = router.subscribe();
    let mut project_rx: broadcast::Receiver<Change<Project>> = router.subscribe();
    let mut task_rx: broadcast::Receiver<Change<Task>> = router.subscribe();
    let mut outreach_rx: broadcast::Receiver<Change<Outreach>> = router.subscribe();

    let events_tx: broadcast::Sender<ChangeEvent> = router.announce();
    let tx = events_tx.clone();

    spawn(async move {
        loop {
            tokio::select!(
                msg = venue_rx.recv() => {
                    match msg {
                        Ok(msg) => {
                            tx.send(ChangeEvent::Venue(msg)).ok();
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                msg = contact_rx.recv() => {
                    match msg {
                        Ok(msg) => {
                            tx.send(ChangeEvent::Contact(msg)).ok();
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                msg = collaborator_rx.recv() => {
                    match msg {
                        Ok(msg) => {
                            tx.send(ChangeEvent::Collaborator(msg)).ok();
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                msg = project_rx.recv() => {
                    match msg {
                        Ok(msg) => {
                            tx.send(ChangeEvent::Project(msg)).ok();
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                msg = task_rx.recv() => {
                    match msg {
                        Ok(msg) => {
                            tx.send(ChangeEvent::Task(msg)).ok();
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                msg = outreach_rx.recv() => {
                    match msg {
                        Ok(msg) => {
                            tx.send(ChangeEvent::Outreach(msg)).ok();
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            );
        }
        tracing::warn!("Change event fan-in exited");
    });

    events_tx
}
