use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::projects::ProjectCollaborator;

#[derive(Queryable, Insertable, Clone, Debug, Serialize)]
#[diesel(table_name = crate::schema::collaborators)]
pub struct Collaborator {
    pub id: Uuid,
    pub created: NaiveDateTime,
    pub name: String,
    pub url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub notes: Option<String>,
}

impl PartialEq for Collaborator {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.created.and_utc().timestamp_micros() == other.created.and_utc().timestamp_micros()
            && self.name == other.name
            && self.url == other.url
            && self.email == other.email
            && self.phone == other.phone
            && self.role == other.role
            && self.notes == other.notes
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewCollaborator {
    pub name: String,
    pub url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub notes: Option<String>,
}

#[derive(AsChangeset, Clone, Debug, Default, PartialEq, Deserialize)]
#[diesel(table_name = crate::schema::collaborators)]
pub struct CollaboratorChanges {
    pub name: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub notes: Option<String>,
}

impl Collaborator {
    pub fn create(conn: &mut PgConnection, fields: NewCollaborator) -> QueryResult<Self> {
        let collaborator = Collaborator {
            id: Uuid::new_v4(),
            created: chrono::Utc::now().naive_utc(),
            name: fields.name,
            url: fields.url,
            email: fields.email,
            phone: fields.phone,
            role: fields.role,
            notes: fields.notes,
        };
        diesel::insert_into(crate::schema::collaborators::table)
            .values(&collaborator)
            .execute(conn)?;
        Ok(collaborator)
    }

    pub fn get(conn: &mut PgConnection, collaborator_id: Uuid) -> Option<Self> {
        use crate::schema::collaborators::dsl;
        dsl::collaborators
            .find(collaborator_id)
            .get_result::<Collaborator>(conn)
            .optional()
            .ok()?
    }

    pub fn exists(conn: &mut PgConnection, collaborator_id: Uuid) -> QueryResult<bool> {
        use crate::schema::collaborators::dsl;
        diesel::select(diesel::dsl::exists(dsl::collaborators.find(collaborator_id)))
            .get_result(conn)
    }

    pub fn list(conn: &mut PgConnection) -> QueryResult<Vec<Self>> {
        use crate::schema::collaborators::dsl;
        dsl::collaborators.order(dsl::name.asc()).load(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        collaborator_id: Uuid,
        changes: CollaboratorChanges,
    ) -> QueryResult<Self> {
        use crate::schema::collaborators::dsl;
        if changes == CollaboratorChanges::default() {
            return dsl::collaborators.find(collaborator_id).get_result(conn);
        }
        diesel::update(dsl::collaborators.find(collaborator_id))
            .set(&changes)
            .get_result(conn)
    }

    /// Removes the collaborator, its project links, and clears the backlink
    /// on any contact that pointed at it.
    pub fn delete(conn: &mut PgConnection, collaborator_id: Uuid) -> QueryResult<()> {
        use crate::schema::collaborators::dsl;
        use crate::schema::contacts;
        conn.transaction(|conn| {
            let removed =
                diesel::delete(dsl::collaborators.find(collaborator_id)).execute(conn)?;
            if removed == 0 {
                return Err(diesel::result::Error::NotFound);
            }
            ProjectCollaborator::drop_child(conn, collaborator_id)?;
            diesel::update(
                contacts::table.filter(contacts::collaborator_id.eq(collaborator_id)),
            )
            .set(contacts::collaborator_id.eq(None::<Uuid>))
            .execute(conn)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::harness::{to_pg_db_name, DbHarness};
    use crate::tables::test::MIGRATIONS;
    use crate::tables::{Contact, NewContact, NewProject, Project};
    use function_name::named;

    #[test]
    #[named]
    fn test_delete_clears_links_and_backlinks() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let collaborator = Collaborator::create(
            &mut conn,
            NewCollaborator {
                name: "Marta".to_string(),
                ..NewCollaborator::default()
            },
        )
        .expect("collaborator");
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
                collaborator_id: Some(collaborator.id),
                ..NewContact::default()
            },
        )
        .expect("contact");
        ProjectCollaborator::link(&mut conn, project.id, collaborator.id).expect("link");

        Collaborator::delete(&mut conn, collaborator.id).expect("delete");

        assert!(ProjectCollaborator::children(&mut conn, project.id)
            .expect("children")
            .is_empty());
        let contact = Contact::get(&mut conn, contact.id).expect("contact");
        assert_eq!(contact.collaborator_id, None);
    }
}
