use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

crate::text_enum!(TaskStatus {
    ToDo => "To Do",
    InProgress => "In Progress",
    Completed => "Completed",
    Cancelled => "Cancelled",
});

crate::text_enum!(TaskPriority {
    Low => "Low",
    Medium => "Medium",
    High => "High",
    Urgent => "Urgent",
});

crate::link_table!(TaskVenue, task_venues, task_id, venue_id);
crate::link_table!(TaskProject, task_projects, task_id, project_id);
crate::link_table!(TaskContact, task_contacts, task_id, contact_id);

#[derive(Queryable, Insertable, Clone, Debug, Serialize)]
#[diesel(table_name = crate::schema::tasks)]
pub struct Task {
    pub id: Uuid,
    pub created: NaiveDateTime,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.created.and_utc().timestamp_micros() == other.created.and_utc().timestamp_micros()
            && self.title == other.title
            && self.description == other.description
            && self.status == other.status
            && self.priority == other.priority
            && self.due_date == other.due_date
            && self.completed_date == other.completed_date
            && self.notes == other.notes
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(AsChangeset, Clone, Debug, Default, PartialEq, Deserialize)]
#[diesel(table_name = crate::schema::tasks)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Task {
    pub fn create(conn: &mut PgConnection, fields: NewTask) -> QueryResult<Self> {
        let task = Task {
            id: Uuid::new_v4(),
            created: chrono::Utc::now().naive_utc(),
            title: fields.title,
            description: fields.description,
            status: fields.status.unwrap_or(TaskStatus::ToDo),
            priority: fields.priority.unwrap_or(TaskPriority::Medium),
            due_date: fields.due_date,
            completed_date: fields.completed_date,
            notes: fields.notes,
        };
        diesel::insert_into(crate::schema::tasks::table)
            .values(&task)
            .execute(conn)?;
        Ok(task)
    }

    pub fn get(conn: &mut PgConnection, task_id: Uuid) -> Option<Self> {
        use crate::schema::tasks::dsl;
        dsl::tasks
            .find(task_id)
            .get_result::<Task>(conn)
            .optional()
            .ok()?
    }

    pub fn exists(conn: &mut PgConnection, task_id: Uuid) -> QueryResult<bool> {
        use crate::schema::tasks::dsl;
        diesel::select(diesel::dsl::exists(dsl::tasks.find(task_id))).get_result(conn)
    }

    pub fn list(conn: &mut PgConnection) -> QueryResult<Vec<Self>> {
        use crate::schema::tasks::dsl;
        dsl::tasks.order(dsl::created.desc()).load(conn)
    }

    pub fn recent_completed(conn: &mut PgConnection, limit: i64) -> QueryResult<Vec<Self>> {
        use crate::schema::tasks::dsl;
        dsl::tasks
            .filter(dsl::status.eq(TaskStatus::Completed))
            .order(dsl::created.desc())
            .limit(limit)
            .load(conn)
    }

    pub fn update(conn: &mut PgConnection, task_id: Uuid, changes: TaskChanges) -> QueryResult<Self> {
        use crate::schema::tasks::dsl;
        if changes == TaskChanges::default() {
            return dsl::tasks.find(task_id).get_result(conn);
        }
        diesel::update(dsl::tasks.find(task_id))
            .set(&changes)
            .get_result(conn)
    }

    /// Removes the task and every row in its three junction tables.
    pub fn delete(conn: &mut PgConnection, task_id: Uuid) -> QueryResult<()> {
        use crate::schema::tasks::dsl;
        conn.transaction(|conn| {
            let removed = diesel::delete(dsl::tasks.find(task_id)).execute(conn)?;
            if removed == 0 {
                return Err(diesel::result::Error::NotFound);
            }
            TaskVenue::drop_parent(conn, task_id)?;
            TaskProject::drop_parent(conn, task_id)?;
            TaskContact::drop_parent(conn, task_id)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::harness::{to_pg_db_name, DbHarness};
    use crate::tables::test::MIGRATIONS;
    use crate::tables::{NewProject, NewVenue, Project, Venue};
    use function_name::named;

    #[test]
    #[named]
    fn test_task_round_trip() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let task = Task::create(
            &mut conn,
            NewTask {
                title: "Send proposal".to_string(),
                due_date: NaiveDate::from_ymd_opt(2024, 6, 1),
                ..NewTask::default()
            },
        )
        .expect("task");
        assert_eq!(task.status, TaskStatus::ToDo);
        assert_eq!(task.priority, TaskPriority::Medium);

        let fetched = Task::get(&mut conn, task.id).expect("fetch");
        assert_eq!(task, fetched);
    }

    #[test]
    #[named]
    fn test_delete_cascades_all_three_junctions() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let task = Task::create(
            &mut conn,
            NewTask {
                title: "Send proposal".to_string(),
                ..NewTask::default()
            },
        )
        .expect("task");
        let venue = Venue::create(
            &mut conn,
            NewVenue {
                name: "Lumen Hall".to_string(),
                ..NewVenue::default()
            },
        )
        .expect("venue");
        let project = Project::create(
            &mut conn,
            NewProject {
                name: "Winter Residency".to_string(),
                ..NewProject::default()
            },
        )
        .expect("project");
        TaskVenue::link(&mut conn, task.id, venue.id).expect("link");
        TaskProject::link(&mut conn, task.id, project.id).expect("link");

        Task::delete(&mut conn, task.id).expect("delete");
        assert!(TaskVenue::pairs(&mut conn).expect("pairs").is_empty());
        assert!(TaskProject::pairs(&mut conn).expect("pairs").is_empty());
        assert!(Task::get(&mut conn, task.id).is_none());
    }

    #[test]
    #[named]
    fn test_sync_links_issues_minimal_operations() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let task = Task::create(
            &mut conn,
            NewTask {
                title: "Send proposal".to_string(),
                ..NewTask::default()
            },
        )
        .expect("task");
        let venues: Vec<Venue> = ["A", "B", "C"]
            .iter()
            .map(|name| {
                Venue::create(
                    &mut conn,
                    NewVenue {
                        name: name.to_string(),
                        ..NewVenue::default()
                    },
                )
                .expect("venue")
            })
            .collect();

        TaskVenue::sync(&mut conn, task.id, &[venues[0].id, venues[1].id]).expect("sync");
        TaskVenue::sync(&mut conn, task.id, &[venues[1].id, venues[2].id]).expect("sync");

        let mut linked = TaskVenue::children(&mut conn, task.id).expect("children");
        linked.sort();
        let mut expected = vec![venues[1].id, venues[2].id];
        expected.sort();
        assert_eq!(linked, expected);
    }
}
