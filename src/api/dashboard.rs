//! Read-side rollups. Every request recomputes from full row sets; there
//! is no cache to invalidate.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;
use warp::{Filter, Rejection, Reply};

use super::*;
use crate::session::{authenticate, AuthenticatedUser, SessionStore};
use crate::tables::{
    Outreach, OutreachStatus, Project, ProjectStatus, Task, TaskStatus, Venue, VenueStatus,
};

const RECENT_LIMIT: i64 = 15;
const STALE_AFTER_DAYS: i64 = 7;

#[derive(Serialize)]
pub struct ActionItems {
    pub overdue_tasks: Vec<Task>,
    pub follow_ups_due: Vec<Outreach>,
    pub stale_outreach: Vec<Outreach>,
    pub venues_needing_outreach: Vec<Venue>,
}

#[derive(Serialize)]
pub struct StatusCount {
    pub status: &'static str,
    pub count: usize,
}

#[derive(Serialize)]
pub struct SectionSummary {
    pub total: usize,
    pub by_status: Vec<StatusCount>,
}

#[derive(Serialize)]
pub struct PipelineSummary {
    pub venues: SectionSummary,
    pub projects: SectionSummary,
    pub tasks: SectionSummary,
    pub outreach: SectionSummary,
}

#[derive(Serialize)]
pub struct RecentActivity {
    pub outreach: Vec<Outreach>,
    pub completed_tasks: Vec<Task>,
    pub venues: Vec<Venue>,
}

pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    let due = match task.due_date {
        Some(due) => due,
        None => return false,
    };
    due < today && !matches!(task.status, TaskStatus::Completed | TaskStatus::Cancelled)
}

pub fn follow_up_due(outreach: &Outreach, today: NaiveDate) -> bool {
    let follow_up = match outreach.follow_up_date {
        Some(date) => date,
        None => return false,
    };
    follow_up <= today
        && !matches!(
            outreach.status,
            OutreachStatus::Responded | OutreachStatus::Declined | OutreachStatus::Accepted
        )
}

/// Awaiting a response for strictly more than a week.
pub fn is_stale(outreach: &Outreach, today: NaiveDate) -> bool {
    outreach.status == OutreachStatus::AwaitingResponse
        && outreach.sent_date < today - Duration::days(STALE_AFTER_DAYS)
}

/// To Contact, and no outreach row references the venue.
pub fn needs_outreach(venue: &Venue, reached: &HashSet<Uuid>) -> bool {
    venue.status == VenueStatus::ToContact && !reached.contains(&venue.id)
}

fn summarize<T>(rows: &[T], statuses: &[&'static str], status_of: impl Fn(&T) -> &'static str) -> SectionSummary {
    let by_status = statuses
        .iter()
        .map(|status| StatusCount {
            status,
            count: rows.iter().filter(|row| status_of(row) == *status).count(),
        })
        .collect();
    SectionSummary {
        total: rows.len(),
        by_status,
    }
}

lazy_static::lazy_static! {
    static ref VENUE_STATUSES: Vec<&'static str> =
        VenueStatus::ALL.iter().map(|s| s.as_str()).collect();
    static ref PROJECT_STATUSES: Vec<&'static str> =
        ProjectStatus::ALL.iter().map(|s| s.as_str()).collect();
    static ref TASK_STATUSES: Vec<&'static str> =
        TaskStatus::ALL.iter().map(|s| s.as_str()).collect();
    static ref OUTREACH_STATUSES: Vec<&'static str> =
        OutreachStatus::ALL.iter().map(|s| s.as_str()).collect();
}

async fn action_items_handler(
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let today = chrono::Utc::now().date_naive();

    let tasks = Task::list(&mut conn).map_err(db_error)?;
    let outreach = Outreach::list(&mut conn).map_err(db_error)?;
    let venues = Venue::list(&mut conn).map_err(db_error)?;

    let reached: HashSet<Uuid> = outreach.iter().filter_map(|row| row.venue_id).collect();
    let items = ActionItems {
        overdue_tasks: tasks
            .into_iter()
            .filter(|task| is_overdue(task, today))
            .collect(),
        follow_ups_due: outreach
            .iter()
            .filter(|row| follow_up_due(row, today))
            .cloned()
            .collect(),
        stale_outreach: outreach
            .iter()
            .filter(|row| is_stale(row, today))
            .cloned()
            .collect(),
        venues_needing_outreach: venues
            .into_iter()
            .filter(|venue| needs_outreach(venue, &reached))
            .collect(),
    };
    Ok(warp::reply::json(&items))
}

async fn pipeline_handler(
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let venues = Venue::list(&mut conn).map_err(db_error)?;
    let projects = Project::list(&mut conn).map_err(db_error)?;
    let tasks = Task::list(&mut conn).map_err(db_error)?;
    let outreach = Outreach::list(&mut conn).map_err(db_error)?;

    let summary = PipelineSummary {
        venues: summarize(&venues, &VENUE_STATUSES, |v: &Venue| v.status.as_str()),
        projects: summarize(&projects, &PROJECT_STATUSES, |p: &Project| p.status.as_str()),
        tasks: summarize(&tasks, &TASK_STATUSES, |t: &Task| t.status.as_str()),
        outreach: summarize(&outreach, &OUTREACH_STATUSES, |o: &Outreach| o.status.as_str()),
    };
    Ok(warp::reply::json(&summary))
}

async fn recent_handler(
    _auth: AuthenticatedUser,
    db_pool: Arc<DbPool>,
) -> Result<impl Reply, Rejection> {
    let mut conn = acquire(&db_pool)?;
    let activity = RecentActivity {
        outreach: Outreach::recent(&mut conn, RECENT_LIMIT).map_err(db_error)?,
        completed_tasks: Task::recent_completed(&mut conn, RECENT_LIMIT).map_err(db_error)?,
        venues: Venue::recent(&mut conn, RECENT_LIMIT).map_err(db_error)?,
    };
    Ok(warp::reply::json(&activity))
}

pub fn routes(
    store: Arc<SessionStore>,
    pool: Arc<DbPool>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let action_items = warp::get()
        .and(warp::path("action_items"))
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(action_items_handler);

    let pipeline = warp::get()
        .and(warp::path("pipeline"))
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(pipeline_handler);

    let recent = warp::get()
        .and(warp::path("recent"))
        .and(warp::path::end())
        .and(authenticate(store.clone()))
        .and(with_db(pool.clone()))
        .and_then(recent_handler);

    warp::path("dashboard").and(action_items.or(pipeline).or(recent))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::{
        InlineContacts, Locations, OutreachDirection, OutreachMethod, TaskPriority, VenueCategory,
    };

    fn task(due: Option<&str>, status: TaskStatus) -> Task {
        Task {
            id: Uuid::new_v4(),
            created: chrono::Utc::now().naive_utc(),
            title: "Send proposal".to_string(),
            description: None,
            status,
            priority: TaskPriority::Medium,
            due_date: due.map(|d| d.parse().unwrap()),
            completed_date: None,
            notes: None,
        }
    }

    fn outreach_row(status: OutreachStatus, sent: &str, follow_up: Option<&str>) -> Outreach {
        Outreach {
            id: Uuid::new_v4(),
            created: chrono::Utc::now().naive_utc(),
            contact_id: None,
            venue_id: None,
            project_id: None,
            method: OutreachMethod::Email,
            direction: OutreachDirection::Outbound,
            sent_date: sent.parse().unwrap(),
            subject: "Hello".to_string(),
            notes: None,
            status,
            follow_up_date: follow_up.map(|d| d.parse().unwrap()),
        }
    }

    fn venue(status: VenueStatus) -> Venue {
        Venue {
            id: Uuid::new_v4(),
            created: chrono::Utc::now().naive_utc(),
            order_num: 1,
            name: "Lumen Hall".to_string(),
            url: None,
            submission_form_url: None,
            locations: Locations(Vec::new()),
            inline_contacts: InlineContacts(Vec::new()),
            status,
            category: VenueCategory::ForReview,
            notes: None,
        }
    }

    fn day(text: &str) -> NaiveDate {
        text.parse().unwrap()
    }

    #[test]
    fn test_overdue_requires_open_status() {
        let today = day("2024-01-05");
        assert!(is_overdue(&task(Some("2024-01-01"), TaskStatus::ToDo), today));
        assert!(!is_overdue(&task(Some("2024-01-01"), TaskStatus::Completed), today));
        assert!(!is_overdue(&task(Some("2024-01-01"), TaskStatus::Cancelled), today));
        assert!(!is_overdue(&task(Some("2024-01-05"), TaskStatus::ToDo), today));
        assert!(!is_overdue(&task(None, TaskStatus::ToDo), today));
    }

    #[test]
    fn test_follow_up_due_excludes_settled_outreach() {
        let today = day("2024-01-05");
        let due = outreach_row(OutreachStatus::Sent, "2024-01-01", Some("2024-01-05"));
        assert!(follow_up_due(&due, today));

        let responded = outreach_row(OutreachStatus::Responded, "2024-01-01", Some("2024-01-05"));
        assert!(!follow_up_due(&responded, today));

        let future = outreach_row(OutreachStatus::Sent, "2024-01-01", Some("2024-01-06"));
        assert!(!follow_up_due(&future, today));
    }

    #[test]
    fn test_stale_is_strictly_older_than_a_week() {
        let today = day("2024-01-10");
        assert!(is_stale(
            &outreach_row(OutreachStatus::AwaitingResponse, "2024-01-01", None),
            today
        ));
        assert!(!is_stale(
            &outreach_row(OutreachStatus::AwaitingResponse, "2024-01-04", None),
            today
        ));
        // A week old exactly is not yet stale.
        assert!(!is_stale(
            &outreach_row(OutreachStatus::AwaitingResponse, "2024-01-03", None),
            today
        ));
        assert!(!is_stale(
            &outreach_row(OutreachStatus::Sent, "2024-01-01", None),
            today
        ));
    }

    #[test]
    fn test_needs_outreach_checks_status_and_history() {
        let v = venue(VenueStatus::ToContact);
        let mut reached = HashSet::new();
        assert!(needs_outreach(&v, &reached));

        reached.insert(v.id);
        assert!(!needs_outreach(&v, &reached));
        assert!(!needs_outreach(&venue(VenueStatus::Contacted), &HashSet::new()));
    }

    #[test]
    fn test_summarize_counts_every_status() {
        let rows = vec![
            task(None, TaskStatus::ToDo),
            task(None, TaskStatus::ToDo),
            task(None, TaskStatus::Completed),
        ];
        let summary = summarize(&rows, &TASK_STATUSES, |t: &Task| t.status.as_str());
        assert_eq!(summary.total, 3);
        let todo = summary
            .by_status
            .iter()
            .find(|entry| entry.status == "To Do")
            .unwrap();
        assert_eq!(todo.count, 2);
        let cancelled = summary
            .by_status
            .iter()
            .find(|entry| entry.status == "Cancelled")
            .unwrap();
        assert_eq!(cancelled.count, 0);
    }
}
