use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

crate::text_enum!(ProjectStatus {
    Planning => "Planning",
    InProgress => "In Progress",
    Completed => "Completed",
    Cancelled => "Cancelled",
});

crate::link_table!(ProjectVenue, project_venues, project_id, venue_id);
crate::link_table!(ProjectContact, project_contacts, project_id, contact_id);
crate::link_table!(ProjectCollaborator, project_collaborators, project_id, collaborator_id);

#[derive(Queryable, Insertable, Clone, Debug, Serialize)]
#[diesel(table_name = crate::schema::projects)]
pub struct Project {
    pub id: Uuid,
    pub created: NaiveDateTime,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub notes: Option<String>,
    pub budget: Option<f64>,
    pub profit: Option<f64>,
}

impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.created.and_utc().timestamp_micros() == other.created.and_utc().timestamp_micros()
            && self.name == other.name
            && self.start_date == other.start_date
            && self.end_date == other.end_date
            && self.description == other.description
            && self.status == other.status
            && self.notes == other.notes
            && self.budget == other.budget
            && self.profit == other.profit
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub notes: Option<String>,
    pub budget: Option<f64>,
    pub profit: Option<f64>,
}

#[derive(AsChangeset, Clone, Debug, Default, PartialEq, Deserialize)]
#[diesel(table_name = crate::schema::projects)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub notes: Option<String>,
    pub budget: Option<f64>,
    pub profit: Option<f64>,
}

impl Project {
    pub fn create(conn: &mut PgConnection, fields: NewProject) -> QueryResult<Self> {
        let project = Project {
            id: Uuid::new_v4(),
            created: chrono::Utc::now().naive_utc(),
            name: fields.name,
            start_date: fields.start_date,
            end_date: fields.end_date,
            description: fields.description,
            status: fields.status.unwrap_or(ProjectStatus::Planning),
            notes: fields.notes,
            budget: fields.budget,
            profit: fields.profit,
        };
        diesel::insert_into(crate::schema::projects::table)
            .values(&project)
            .execute(conn)?;
        Ok(project)
    }

    pub fn get(conn: &mut PgConnection, project_id: Uuid) -> Option<Self> {
        use crate::schema::projects::dsl;
        dsl::projects
            .find(project_id)
            .get_result::<Project>(conn)
            .optional()
            .ok()?
    }

    pub fn exists(conn: &mut PgConnection, project_id: Uuid) -> QueryResult<bool> {
        use crate::schema::projects::dsl;
        diesel::select(diesel::dsl::exists(dsl::projects.find(project_id))).get_result(conn)
    }

    pub fn list(conn: &mut PgConnection) -> QueryResult<Vec<Self>> {
        use crate::schema::projects::dsl;
        dsl::projects.order(dsl::created.desc()).load(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        project_id: Uuid,
        changes: ProjectChanges,
    ) -> QueryResult<Self> {
        use crate::schema::projects::dsl;
        if changes == ProjectChanges::default() {
            return dsl::projects.find(project_id).get_result(conn);
        }
        diesel::update(dsl::projects.find(project_id))
            .set(&changes)
            .get_result(conn)
    }

    /// Removes the project and every row in its three junction tables.
    pub fn delete(conn: &mut PgConnection, project_id: Uuid) -> QueryResult<()> {
        use crate::schema::projects::dsl;
        conn.transaction(|conn| {
            let removed = diesel::delete(dsl::projects.find(project_id)).execute(conn)?;
            if removed == 0 {
                return Err(diesel::result::Error::NotFound);
            }
            ProjectVenue::drop_parent(conn, project_id)?;
            ProjectContact::drop_parent(conn, project_id)?;
            ProjectCollaborator::drop_parent(conn, project_id)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::harness::{to_pg_db_name, DbHarness};
    use crate::tables::test::MIGRATIONS;
    use crate::tables::{Collaborator, Contact, NewCollaborator, NewContact};
    use function_name::named;

    #[test]
    #[named]
    fn test_project_round_trip() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let project = Project::create(
            &mut conn,
            NewProject {
                name: "Winter Residency".to_string(),
                start_date: NaiveDate::from_ymd_opt(2024, 11, 1),
                budget: Some(4500.0),
                ..NewProject::default()
            },
        )
        .expect("project");
        assert_eq!(project.status, ProjectStatus::Planning);

        let fetched = Project::get(&mut conn, project.id).expect("fetch");
        assert_eq!(project, fetched);
    }

    #[test]
    #[named]
    fn test_delete_cascades_junction_rows() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let project = Project::create(
            &mut conn,
            NewProject {
                name: "Winter Residency".to_string(),
                ..NewProject::default()
            },
        )
        .expect("project");
        let contact = Contact::create(
            &mut conn,
            NewContact {
                name: "Ada".to_string(),
                ..NewContact::default()
            },
        )
        .expect("contact");
        let collaborator = Collaborator::create(
            &mut conn,
            NewCollaborator {
                name: "Marta".to_string(),
                ..NewCollaborator::default()
            },
        )
        .expect("collaborator");
        ProjectContact::link(&mut conn, project.id, contact.id).expect("link");
        ProjectCollaborator::link(&mut conn, project.id, collaborator.id).expect("link");

        Project::delete(&mut conn, project.id).expect("delete");

        assert!(ProjectContact::pairs(&mut conn).expect("pairs").is_empty());
        assert!(ProjectCollaborator::pairs(&mut conn).expect("pairs").is_empty());
        // The linked records themselves survive.
        assert!(Contact::get(&mut conn, contact.id).is_some());
        assert!(Collaborator::get(&mut conn, collaborator.id).is_some());
    }
}
