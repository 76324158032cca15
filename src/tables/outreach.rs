use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

crate::text_enum!(OutreachMethod {
    Email => "Email",
    Phone => "Phone",
    InPerson => "In Person",
    SubmissionForm => "Submission Form",
    SocialMedia => "Social Media",
    Other => "Other",
});

crate::text_enum!(OutreachDirection {
    Outbound => "Outbound",
    Inbound => "Inbound",
});

crate::text_enum!(OutreachStatus {
    Sent => "Sent",
    AwaitingResponse => "Awaiting Response",
    Responded => "Responded",
    FollowUpNeeded => "Follow Up Needed",
    NoResponse => "No Response",
    Declined => "Declined",
    Accepted => "Accepted",
});

/// A single touch with a venue, contact, or project. Nothing references
/// outreach rows, so removal needs no cleanup.
#[derive(Queryable, Insertable, Clone, Debug, Serialize)]
#[diesel(table_name = crate::schema::outreach)]
pub struct Outreach {
    pub id: Uuid,
    pub created: NaiveDateTime,
    pub contact_id: Option<Uuid>,
    pub venue_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub method: OutreachMethod,
    pub direction: OutreachDirection,
    pub sent_date: NaiveDate,
    pub subject: String,
    pub notes: Option<String>,
    pub status: OutreachStatus,
    pub follow_up_date: Option<NaiveDate>,
}

impl PartialEq for Outreach {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.created.and_utc().timestamp_micros() == other.created.and_utc().timestamp_micros()
            && self.contact_id == other.contact_id
            && self.venue_id == other.venue_id
            && self.project_id == other.project_id
            && self.method == other.method
            && self.direction == other.direction
            && self.sent_date == other.sent_date
            && self.subject == other.subject
            && self.notes == other.notes
            && self.status == other.status
            && self.follow_up_date == other.follow_up_date
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewOutreach {
    pub contact_id: Option<Uuid>,
    pub venue_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub method: OutreachMethod,
    pub direction: OutreachDirection,
    pub sent_date: NaiveDate,
    pub subject: String,
    pub notes: Option<String>,
    pub status: Option<OutreachStatus>,
    pub follow_up_date: Option<NaiveDate>,
}

#[derive(AsChangeset, Clone, Debug, Default, PartialEq, Deserialize)]
#[diesel(table_name = crate::schema::outreach)]
pub struct OutreachChanges {
    pub contact_id: Option<Uuid>,
    pub venue_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub method: Option<OutreachMethod>,
    pub direction: Option<OutreachDirection>,
    pub sent_date: Option<NaiveDate>,
    pub subject: Option<String>,
    pub notes: Option<String>,
    pub status: Option<OutreachStatus>,
    pub follow_up_date: Option<NaiveDate>,
}

impl Outreach {
    pub fn create(conn: &mut PgConnection, fields: NewOutreach) -> QueryResult<Self> {
        let outreach = Outreach {
            id: Uuid::new_v4(),
            created: chrono::Utc::now().naive_utc(),
            contact_id: fields.contact_id,
            venue_id: fields.venue_id,
            project_id: fields.project_id,
            method: fields.method,
            direction: fields.direction,
            sent_date: fields.sent_date,
            subject: fields.subject,
            notes: fields.notes,
            status: fields.status.unwrap_or(OutreachStatus::Sent),
            follow_up_date: fields.follow_up_date,
        };
        diesel::insert_into(crate::schema::outreach::table)
            .values(&outreach)
            .execute(conn)?;
        Ok(outreach)
    }

    pub fn get(conn: &mut PgConnection, outreach_id: Uuid) -> Option<Self> {
        use crate::schema::outreach::dsl;
        dsl::outreach
            .find(outreach_id)
            .get_result::<Outreach>(conn)
            .optional()
            .ok()?
    }

    pub fn list(conn: &mut PgConnection) -> QueryResult<Vec<Self>> {
        use crate::schema::outreach::dsl;
        dsl::outreach.order(dsl::created.desc()).load(conn)
    }

    pub fn recent(conn: &mut PgConnection, limit: i64) -> QueryResult<Vec<Self>> {
        use crate::schema::outreach::dsl;
        dsl::outreach.order(dsl::created.desc()).limit(limit).load(conn)
    }

    pub fn list_by_venue(conn: &mut PgConnection, venue_id: Uuid) -> QueryResult<Vec<Self>> {
        use crate::schema::outreach::dsl;
        dsl::outreach
            .filter(dsl::venue_id.eq(venue_id))
            .order(dsl::sent_date.desc())
            .load(conn)
    }

    pub fn list_by_contact(conn: &mut PgConnection, contact_id: Uuid) -> QueryResult<Vec<Self>> {
        use crate::schema::outreach::dsl;
        dsl::outreach
            .filter(dsl::contact_id.eq(contact_id))
            .order(dsl::sent_date.desc())
            .load(conn)
    }

    pub fn list_by_project(conn: &mut PgConnection, project_id: Uuid) -> QueryResult<Vec<Self>> {
        use crate::schema::outreach::dsl;
        dsl::outreach
            .filter(dsl::project_id.eq(project_id))
            .order(dsl::sent_date.desc())
            .load(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        outreach_id: Uuid,
        changes: OutreachChanges,
    ) -> QueryResult<Self> {
        use crate::schema::outreach::dsl;
        if changes == OutreachChanges::default() {
            return dsl::outreach.find(outreach_id).get_result(conn);
        }
        diesel::update(dsl::outreach.find(outreach_id))
            .set(&changes)
            .get_result(conn)
    }

    pub fn delete(conn: &mut PgConnection, outreach_id: Uuid) -> QueryResult<()> {
        use crate::schema::outreach::dsl;
        let removed = diesel::delete(dsl::outreach.find(outreach_id)).execute(conn)?;
        if removed == 0 {
            return Err(diesel::result::Error::NotFound);
        }
        Ok(())
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
    fn test_status_round_trip() {
        for status in OutreachStatus::ALL {
            assert_eq!(OutreachStatus::parse(status.as_str()), Some(*status));
        }
    }

    #[test]
    #[named]
    fn test_list_by_venue() {
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
        let row = Outreach::create(
            &mut conn,
            NewOutreach {
                contact_id: None,
                venue_id: Some(venue.id),
                project_id: None,
                method: OutreachMethod::Email,
                direction: OutreachDirection::Outbound,
                sent_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                subject: "Installation proposal".to_string(),
                notes: None,
                status: None,
                follow_up_date: None,
            },
        )
        .expect("outreach");
        assert_eq!(row.status, OutreachStatus::Sent);

        let rows = Outreach::list_by_venue(&mut conn, venue.id).expect("list");
        assert_eq!(rows, vec![row.clone()]);
        assert!(Outreach::list_by_venue(&mut conn, Uuid::new_v4())
            .expect("list")
            .is_empty());

        Outreach::delete(&mut conn, row.id).expect("delete");
        assert!(Outreach::get(&mut conn, row.id).is_none());
    }
}
