use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tasks::TaskVenue;

crate::text_enum!(VenueStatus {
    Contacted => "Contacted",
    ToContact => "To Contact",
    Ignore => "Ignore",
    PreviousClient => "Previous Client",
});

crate::text_enum!(VenueCategory {
    UltimateDreamGoal => "Ultimate Dream Goal",
    Accessible => "Accessible",
    Unconventional => "Unconventional",
    ForReview => "For Review",
});

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub phone_number: Option<String>,
}

/// Contact details entered inline on a venue before contacts became their
/// own records. Kept readable for old rows, superseded by venue_contacts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineContact {
    pub name: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

crate::jsonb_column!(Locations, Location);
crate::jsonb_column!(InlineContacts, InlineContact);

crate::link_table!(VenueContact, venue_contacts, venue_id, contact_id);

#[derive(Queryable, Insertable, Clone, Debug, Serialize)]
#[diesel(table_name = crate::schema::venues)]
pub struct Venue {
    pub id: Uuid,
    pub created: NaiveDateTime,
    pub order_num: i32,
    pub name: String,
    pub url: Option<String>,
    pub submission_form_url: Option<String>,
    pub locations: Locations,
    pub inline_contacts: InlineContacts,
    pub status: VenueStatus,
    pub category: VenueCategory,
    pub notes: Option<String>,
}

impl PartialEq for Venue {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.created.and_utc().timestamp_micros() == other.created.and_utc().timestamp_micros()
            && self.order_num == other.order_num
            && self.name == other.name
            && self.url == other.url
            && self.submission_form_url == other.submission_form_url
            && self.locations == other.locations
            && self.inline_contacts == other.inline_contacts
            && self.status == other.status
            && self.category == other.category
            && self.notes == other.notes
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewVenue {
    pub name: String,
    pub url: Option<String>,
    pub submission_form_url: Option<String>,
    #[serde(default)]
    pub locations: Vec<Location>,
    pub status: Option<VenueStatus>,
    pub category: Option<VenueCategory>,
    pub notes: Option<String>,
}

#[derive(AsChangeset, Clone, Debug, Default, PartialEq, Deserialize)]
#[diesel(table_name = crate::schema::venues)]
pub struct VenueChanges {
    pub name: Option<String>,
    pub url: Option<String>,
    pub submission_form_url: Option<String>,
    pub locations: Option<Locations>,
    pub inline_contacts: Option<InlineContacts>,
    pub status: Option<VenueStatus>,
    pub category: Option<VenueCategory>,
    pub notes: Option<String>,
}

/// Inclusive rank window displaced by moving `old` to `new`, and the
/// direction each rank inside it shifts.
fn shift_window(old: i32, new: i32) -> (i32, i32, i32) {
    if old < new {
        (old + 1, new, -1)
    } else {
        (new, old - 1, 1)
    }
}

impl Venue {
    /// New venues always append: rank is max(order_num) + 1 at insert time.
    pub fn create(conn: &mut PgConnection, fields: NewVenue) -> QueryResult<Self> {
        use crate::schema::venues::dsl;
        conn.transaction(|conn| {
            let next_rank = dsl::venues
                .select(diesel::dsl::max(dsl::order_num))
                .first::<Option<i32>>(conn)?
                .unwrap_or(0)
                + 1;
            let venue = Venue {
                id: Uuid::new_v4(),
                created: chrono::Utc::now().naive_utc(),
                order_num: next_rank,
                name: fields.name,
                url: fields.url,
                submission_form_url: fields.submission_form_url,
                locations: Locations(fields.locations),
                inline_contacts: InlineContacts(Vec::new()),
                status: fields.status.unwrap_or(VenueStatus::ToContact),
                category: fields.category.unwrap_or(VenueCategory::ForReview),
                notes: fields.notes,
            };
            diesel::insert_into(dsl::venues).values(&venue).execute(conn)?;
            Ok(venue)
        })
    }

    pub fn get(conn: &mut PgConnection, venue_id: Uuid) -> Option<Self> {
        use crate::schema::venues::dsl;
        dsl::venues
            .find(venue_id)
            .get_result::<Venue>(conn)
            .optional()
            .ok()?
    }

    pub fn exists(conn: &mut PgConnection, venue_id: Uuid) -> QueryResult<bool> {
        use crate::schema::venues::dsl;
        diesel::select(diesel::dsl::exists(dsl::venues.find(venue_id))).get_result(conn)
    }

    pub fn find_by_name(conn: &mut PgConnection, name: &str) -> QueryResult<Option<Self>> {
        use crate::schema::venues::dsl;
        dsl::venues.filter(dsl::name.eq(name)).first(conn).optional()
    }

    pub fn list(conn: &mut PgConnection) -> QueryResult<Vec<Self>> {
        use crate::schema::venues::dsl;
        dsl::venues.order(dsl::order_num.asc()).load(conn)
    }

    pub fn recent(conn: &mut PgConnection, limit: i64) -> QueryResult<Vec<Self>> {
        use crate::schema::venues::dsl;
        dsl::venues.order(dsl::created.desc()).limit(limit).load(conn)
    }

    pub fn update(conn: &mut PgConnection, venue_id: Uuid, changes: VenueChanges) -> QueryResult<Self> {
        use crate::schema::venues::dsl;
        if changes == VenueChanges::default() {
            return dsl::venues.find(venue_id).get_result(conn);
        }
        diesel::update(dsl::venues.find(venue_id))
            .set(&changes)
            .get_result(conn)
    }

    /// Moves the venue to `new_order`, shifting every venue strictly between
    /// the two positions one slot the other way. Ranks stay a dense
    /// permutation of 1..N; the unique constraint is checked at commit.
    pub fn reorder(conn: &mut PgConnection, venue_id: Uuid, new_order: i32) -> QueryResult<Self> {
        use crate::schema::venues::dsl;
        conn.transaction(|conn| {
            let venue: Venue = dsl::venues.find(venue_id).get_result(conn)?;
            let total: i64 = dsl::venues.count().get_result(conn)?;
            let new_order = new_order.clamp(1, total as i32);
            let old_order = venue.order_num;
            if old_order == new_order {
                return Ok(venue);
            }
            let (low, high, delta) = shift_window(old_order, new_order);
            diesel::update(dsl::venues.filter(dsl::order_num.between(low, high)))
                .set(dsl::order_num.eq(dsl::order_num + delta))
                .execute(conn)?;
            diesel::update(dsl::venues.find(venue_id))
                .set(dsl::order_num.eq(new_order))
                .get_result(conn)
        })
    }

    /// Removes the venue, its task links, and its rank; every higher rank
    /// shifts down one so the remaining ranks stay dense.
    /// venue_contacts and project_venues rows are deliberately left in
    /// place, matching how venue removal has always behaved.
    pub fn delete(conn: &mut PgConnection, venue_id: Uuid) -> QueryResult<()> {
        use crate::schema::venues::dsl;
        conn.transaction(|conn| {
            let venue: Venue = dsl::venues.find(venue_id).get_result(conn)?;
            TaskVenue::drop_child(conn, venue_id)?;
            diesel::delete(dsl::venues.find(venue_id)).execute(conn)?;
            diesel::update(dsl::venues.filter(dsl::order_num.gt(venue.order_num)))
                .set(dsl::order_num.eq(dsl::order_num - 1))
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
    use function_name::named;

    fn named_venue(name: &str) -> NewVenue {
        NewVenue {
            name: name.to_string(),
            ..NewVenue::default()
        }
    }

    #[test]
    fn test_shift_window_moving_down() {
        assert_eq!(shift_window(2, 5), (3, 5, -1));
    }

    #[test]
    fn test_shift_window_moving_up() {
        assert_eq!(shift_window(5, 2), (2, 4, 1));
    }

    #[test]
    fn test_shift_window_adjacent() {
        assert_eq!(shift_window(3, 4), (4, 4, -1));
        assert_eq!(shift_window(4, 3), (3, 3, 1));
    }

    #[test]
    #[named]
    fn test_create_appends_rank() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let first = Venue::create(&mut conn, named_venue("Lumen Hall")).expect("venue");
        let second = Venue::create(&mut conn, named_venue("Triennale")).expect("venue");
        assert_eq!(first.order_num, 1);
        assert_eq!(second.order_num, 2);

        let fetched = Venue::get(&mut conn, second.id).expect("fetch");
        assert_eq!(second, fetched);
    }

    #[test]
    #[named]
    fn test_reorder_keeps_permutation() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let venues: Vec<Venue> = (0..5)
            .map(|n| Venue::create(&mut conn, named_venue(&format!("Venue {}", n))).expect("venue"))
            .collect();

        let moved = Venue::reorder(&mut conn, venues[4].id, 2).expect("reorder");
        assert_eq!(moved.order_num, 2);

        let mut ranks: Vec<i32> = Venue::list(&mut conn)
            .expect("list")
            .iter()
            .map(|v| v.order_num)
            .collect();
        ranks.sort();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);

        // The two venues previously at 2 and 3 shifted down one slot.
        assert_eq!(Venue::get(&mut conn, venues[1].id).unwrap().order_num, 3);
        assert_eq!(Venue::get(&mut conn, venues[2].id).unwrap().order_num, 4);
        assert_eq!(Venue::get(&mut conn, venues[0].id).unwrap().order_num, 1);
    }

    #[test]
    #[named]
    fn test_reorder_same_position_is_noop() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let a = Venue::create(&mut conn, named_venue("A")).expect("venue");
        let b = Venue::create(&mut conn, named_venue("B")).expect("venue");

        let unchanged = Venue::reorder(&mut conn, b.id, b.order_num).expect("reorder");
        assert_eq!(unchanged.order_num, 2);
        assert_eq!(Venue::get(&mut conn, a.id).unwrap().order_num, 1);
    }

    #[test]
    #[named]
    fn test_delete_closes_rank_gap() {
        let db_name = to_pg_db_name(function_name!());
        let harness = DbHarness::new("localhost", "development", &db_name, Some(MIGRATIONS));
        let mut conn = harness.conn();

        let a = Venue::create(&mut conn, named_venue("A")).expect("venue");
        let b = Venue::create(&mut conn, named_venue("B")).expect("venue");
        let c = Venue::create(&mut conn, named_venue("C")).expect("venue");

        Venue::delete(&mut conn, b.id).expect("delete");
        assert_eq!(Venue::get(&mut conn, a.id).unwrap().order_num, 1);
        assert_eq!(Venue::get(&mut conn, c.id).unwrap().order_num, 2);
        assert!(Venue::get(&mut conn, b.id).is_none());
    }
}
