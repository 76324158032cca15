use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::venues::VenueContact;

crate::text_enum!(ContactType {
    VenueContact => "Venue Contact",
    Colleague => "Colleague",
    Artist => "Artist",
    Client => "Client",
    Patron => "Patron",
    Customer => "Customer",
    Agent => "Agent",
    Vendor => "Vendor",
    Other => "Other",
});

crate::jsonb_column!(ContactTypes, ContactType);

#[derive(Queryable, Insertable, Clone, Debug, Serialize)]
#[diesel(table_name = crate::schema::contacts)]
pub struct Contact {
    pub id: Uuid,
    pub created: NaiveDateTime,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub contact_types: ContactTypes,
    pub notes: Option<String>,
    // Single-venue column from before the junction table; backfill_venue_links
    // turns it into venue_contacts rows.
    pub venue_id: Option<Uuid>,
    pub collaborator_id: Option<Uuid>,
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.created.and_utc().timestamp_micros() == other.created.and_utc().timestamp_micros()
            && self.name == other.name
            && self.email == other.email
            && self.phone == other.phone
            && self.role == other.role
            && self.contact_types == other.contact_types
            && self.notes == other.notes
            && self.venue_id == other.venue_id
            && self.collaborator_id == other.collaborator_id
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub contact_types: Vec<ContactType>,
    pub notes: Option<String>,
    pub collaborator_id: Option<Uuid>,
}

#[derive(AsChangeset, Clone, Debug, Default, PartialEq, Deserialize)]
#[diesel(table_name = crate::schema::contacts)]
pub struct ContactChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub contact_types: Option<ContactTypes>,
    pub notes: Option<String>,
    pub collaborator_id: Option<Uuid>,
}

impl Contact {
    pub fn create(conn: &mut PgConnection, fields: NewContact) -> QueryResult<Self> {
        let contact = Contact {
            id: Uuid::new_v4(),
            created: chrono::Utc::now().naive_utc(),
            name: fields.name,
            email: fields.email,
            phone: fields.phone,
            role: fields.role,
            contact_types: ContactTypes(fields.contact_types),
            notes: fields.notes,
            venue_id: None,
            collaborator_id: fields.collaborator_id,
        };
        diesel::insert_into(crate::schema::contacts::table)
            .values(&contact)
            .execute(conn)?;
        Ok(contact)
    }

    pub fn get(conn: &mut PgConnection, contact_id: Uuid) -> Option<Self> {
        use crate::schema::contacts::dsl;
        dsl::contacts
            .find(contact_id)
            .get_result::<Contact>(conn)
            .optional()
            .ok()?
    }

    pub fn exists(conn: &mut PgConnection, contact_id: Uuid) -> QueryResult<bool> {
        use crate::schema::contacts::dsl;
        diesel::select(diesel::dsl::exists(dsl::contacts.find(contact_id))).get_result(conn)
    }

    pub fn list(conn: &mut PgConnection) -> QueryResult<Vec<Self>> {
        use crate::schema::contacts::dsl;
        dsl::contacts.order(dsl::name.asc()).load(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        contact_id: Uuid,
        changes: ContactChanges,
    ) -> QueryResult<Self> {
        use crate::schema::contacts::dsl;
        if changes == ContactChanges::default() {
            return dsl::contacts.find(contact_id).get_result(conn);
        }
        diesel::update(dsl::contacts.find(contact_id))
            .set(&changes)
            .get_result(conn)
    }

    /// Removes the contact and scrubs it from every venue's link set.
    pub fn delete(conn: &mut PgConnection, contact_id: Uuid) -> QueryResult<()> {
        use crate::schema::contacts::dsl;
        conn.transaction(|conn| {
            let removed = diesel::delete(dsl::contacts.find(contact_id)).execute(conn)?;
            if removed == 0 {
                return Err(diesel::result::Error::NotFound);
            }
            VenueContact::drop_child(conn, contact_id)?;
            Ok(())
        })
    }

    /// One venue_contacts row per contact still carrying the legacy single
    /// venue column. Safe to run repeatedly.
    pub fn backfill_venue_links(conn: &mut PgConnection) -> QueryResult<usize> {
        use crate::schema::contacts::dsl;
        let legacy: Vec<(Uuid, Option<Uuid>)> = dsl::contacts
            .filter(dsl::venue_id.is_not_null())
            .select((dsl::id, dsl::venue_id))
            .load(conn)?;
        let mut linked = 0;
        for (contact_id, venue_id) in legacy {
            if let Some(venue_id) = venue_id {
                VenueContact::link(conn, venue_id, contact_id)?;
                linked += 1;
            }
        }
        Ok(linked)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::harness::{to_pg_db_name, DbHarness};
    use crate::tables::test::MIGRATIONS;
    use crate::tables::{NewVenue, Venue};
    use function_name::named;

    #[test]
    fn test_contact_type_round_trip() {
        for kind in ContactType::ALL {
            assert_eq!(ContactType::parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(ContactType::parse("Stranger"), None);
    }

    #[test]
    #[named]
    fn test_link_is_idempotent() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let venue = Venue::create(
            &mut conn,
            NewVenue {
                name: "Lumen Hall".to_string(),
                ..NewVenue::default()
            },
        )
        .expect("venue");
        let contact = Contact::create(
            &mut conn,
            NewContact {
                name: "Ada".to_string(),
                ..NewContact::default()
            },
        )
        .expect("contact");

        let first = VenueContact::link(&mut conn, venue.id, contact.id).expect("link");
        let second = VenueContact::link(&mut conn, venue.id, contact.id).expect("relink");
        assert_eq!(first, second);
        assert_eq!(
            VenueContact::children(&mut conn, venue.id).expect("children"),
            vec![contact.id]
        );
    }

    #[test]
    #[named]
    fn test_unlink_absent_is_noop() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        VenueContact::unlink(&mut conn, Uuid::new_v4(), Uuid::new_v4()).expect("unlink");
        assert!(VenueContact::pairs(&mut conn).expect("pairs").is_empty());
    }

    #[test]
    #[named]
    fn test_delete_scrubs_venue_links() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let venue = Venue::create(
            &mut conn,
            NewVenue {
                name: "Lumen Hall".to_string(),
                ..NewVenue::default()
            },
        )
        .expect("venue");
        let contact = Contact::create(
            &mut conn,
            NewContact {
                name: "Ada".to_string(),
                ..NewContact::default()
            },
        )
        .expect("contact");
        VenueContact::link(&mut conn, venue.id, contact.id).expect("link");

        Contact::delete(&mut conn, contact.id).expect("delete");
        assert!(VenueContact::children(&mut conn, venue.id)
            .expect("children")
            .is_empty());
    }

    #[test]
    #[named]
    fn test_backfill_legacy_venue_column() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let venue = Venue::create(
            &mut conn,
            NewVenue {
                name: "Lumen Hall".to_string(),
                ..NewVenue::default()
            },
        )
        .expect("venue");
        let contact = Contact::create(
            &mut conn,
            NewContact {
                name: "Ada".to_string(),
                ..NewContact::default()
            },
        )
        .expect("contact");
        diesel::update(crate::schema::contacts::dsl::contacts.find(contact.id))
            .set(crate::schema::contacts::dsl::venue_id.eq(Some(venue.id)))
            .execute(&mut conn)
            .expect("legacy venue id");

        assert_eq!(Contact::backfill_venue_links(&mut conn).expect("backfill"), 1);
        assert_eq!(
            VenueContact::parents(&mut conn, contact.id).expect("parents"),
            vec![venue.id]
        );
        // Running it again only relinks the same row.
        assert_eq!(Contact::backfill_venue_links(&mut conn).expect("backfill"), 1);
        assert_eq!(
            VenueContact::parents(&mut conn, contact.id).expect("parents").len(),
            1
        );
    }
}
