use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use uuid::Uuid;

mod collaborators;
mod contacts;
mod outreach;
mod projects;
mod tasks;
mod venues;

#[cfg(test)]
pub mod harness;

pub use self::collaborators::{Collaborator, CollaboratorChanges, NewCollaborator};
pub use self::contacts::{Contact, ContactChanges, ContactType, ContactTypes, NewContact};
pub use self::outreach::{
    NewOutreach, Outreach, OutreachChanges, OutreachDirection, OutreachMethod, OutreachStatus,
};
pub use self::projects::{
    NewProject, Project, ProjectChanges, ProjectCollaborator, ProjectContact, ProjectStatus,
    ProjectVenue,
};
pub use self::tasks::{
    NewTask, Task, TaskChanges, TaskContact, TaskPriority, TaskProject, TaskStatus, TaskVenue,
};
pub use self::venues::{
    InlineContact, InlineContacts, Location, Locations, NewVenue, Venue, VenueCategory,
    VenueChanges, VenueContact, VenueStatus,
};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn establish_connection_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .build(manager)
        .expect("Failed to create database connection pool")
}

/// Splits a desired child-id set against the currently linked set into the
/// ids to link and the ids to unlink. Ids present in both sets are untouched.
pub fn link_diff(previous: &[Uuid], desired: &[Uuid]) -> (Vec<Uuid>, Vec<Uuid>) {
    let added = desired
        .iter()
        .filter(|id| !previous.contains(id))
        .copied()
        .collect();
    let removed = previous
        .iter()
        .filter(|id| !desired.contains(id))
        .copied()
        .collect();
    (added, removed)
}

/// An enum stored as its display text in a `Text` column. The same strings
/// travel through serde, so API payloads and rows agree on spelling.
#[macro_export]
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq,
                 serde::Serialize, serde::Deserialize,
                 diesel::AsExpression, diesel::FromSqlRow)]
        #[diesel(sql_type = diesel::sql_types::Text)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self { $($name::$variant => $text,)+ }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value { $($text => Some($name::$variant),)+ _ => None }
            }
        }

        impl diesel::serialize::ToSql<diesel::sql_types::Text, diesel::pg::Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>)
                    -> diesel::serialize::Result {
                <str as diesel::serialize::ToSql<diesel::sql_types::Text, diesel::pg::Pg>>::to_sql(
                    self.as_str(), out)
            }
        }

        impl diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::pg::Pg> for $name {
            fn from_sql(bytes: diesel::pg::PgValue<'_>) -> diesel::deserialize::Result<Self> {
                let text = <String as diesel::deserialize::FromSql<
                    diesel::sql_types::Text, diesel::pg::Pg>>::from_sql(bytes)?;
                $name::parse(&text).ok_or_else(|| {
                    format!("Unrecognized {} value: {}", stringify!($name), text).into()
                })
            }
        }
    };
}

/// A list of serde-serializable records stored in one `Jsonb` column.
#[macro_export]
macro_rules! jsonb_column {
    ($wrapper:ident, $inner:ty) => {
        #[derive(Clone, Debug, Default, PartialEq,
                 serde::Serialize, serde::Deserialize,
                 diesel::AsExpression, diesel::FromSqlRow)]
        #[diesel(sql_type = diesel::sql_types::Jsonb)]
        #[serde(transparent)]
        pub struct $wrapper(pub Vec<$inner>);

        impl diesel::serialize::ToSql<diesel::sql_types::Jsonb, diesel::pg::Pg> for $wrapper {
            fn to_sql<'b>(&'b self, out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>)
                    -> diesel::serialize::Result {
                use std::io::Write;
                // jsonb wire format: version byte then the document text.
                out.write_all(&[1])?;
                serde_json::to_writer(out, &self.0)?;
                Ok(diesel::serialize::IsNull::No)
            }
        }

        impl diesel::deserialize::FromSql<diesel::sql_types::Jsonb, diesel::pg::Pg> for $wrapper {
            fn from_sql(bytes: diesel::pg::PgValue<'_>) -> diesel::deserialize::Result<Self> {
                let value = <serde_json::Value as diesel::deserialize::FromSql<
                    diesel::sql_types::Jsonb, diesel::pg::Pg>>::from_sql(bytes)?;
                Ok($wrapper(serde_json::from_value(value)?))
            }
        }
    };
}

/// A two-column junction table. The composite primary key keeps the
/// at-most-one-row invariant; `link` treats the unique violation as the
/// existing row and `unlink` treats absence as success.
#[macro_export]
macro_rules! link_table {
    ($name:ident, $table:ident, $parent:ident, $child:ident) => {
        #[derive(PartialEq, Eq, diesel::Queryable, diesel::Insertable,
                 Clone, Copy, Debug, serde::Serialize)]
        #[diesel(table_name = crate::schema::$table)]
        pub struct $name {
            pub $parent: uuid::Uuid,
            pub $child: uuid::Uuid,
        }

        impl $name {
            pub fn link(conn: &mut diesel::pg::PgConnection,
                        parent_id: uuid::Uuid,
                        child_id: uuid::Uuid) -> diesel::QueryResult<Self> {
                use diesel::prelude::*;
                let row = Self { $parent: parent_id, $child: child_id };
                match diesel::insert_into(crate::schema::$table::table)
                    .values(&row)
                    .execute(conn)
                {
                    Err(diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation, _)) => Ok(0),
                    other => other,
                }?;
                Ok(row)
            }

            pub fn unlink(conn: &mut diesel::pg::PgConnection,
                          parent_id: uuid::Uuid,
                          child_id: uuid::Uuid) -> diesel::QueryResult<()> {
                use diesel::prelude::*;
                diesel::delete(crate::schema::$table::table
                        .filter(crate::schema::$table::$parent.eq(parent_id))
                        .filter(crate::schema::$table::$child.eq(child_id)))
                    .execute(conn)?;
                Ok(())
            }

            pub fn children(conn: &mut diesel::pg::PgConnection,
                            parent_id: uuid::Uuid) -> diesel::QueryResult<Vec<uuid::Uuid>> {
                use diesel::prelude::*;
                crate::schema::$table::table
                    .filter(crate::schema::$table::$parent.eq(parent_id))
                    .select(crate::schema::$table::$child)
                    .load(conn)
            }

            pub fn parents(conn: &mut diesel::pg::PgConnection,
                           child_id: uuid::Uuid) -> diesel::QueryResult<Vec<uuid::Uuid>> {
                use diesel::prelude::*;
                crate::schema::$table::table
                    .filter(crate::schema::$table::$child.eq(child_id))
                    .select(crate::schema::$table::$parent)
                    .load(conn)
            }

            pub fn pairs(conn: &mut diesel::pg::PgConnection)
                    -> diesel::QueryResult<Vec<(uuid::Uuid, uuid::Uuid)>> {
                use diesel::prelude::*;
                crate::schema::$table::table
                    .select((crate::schema::$table::$parent, crate::schema::$table::$child))
                    .load(conn)
            }

            pub fn drop_parent(conn: &mut diesel::pg::PgConnection,
                               parent_id: uuid::Uuid) -> diesel::QueryResult<usize> {
                use diesel::prelude::*;
                diesel::delete(crate::schema::$table::table
                        .filter(crate::schema::$table::$parent.eq(parent_id)))
                    .execute(conn)
            }

            pub fn drop_child(conn: &mut diesel::pg::PgConnection,
                              child_id: uuid::Uuid) -> diesel::QueryResult<usize> {
                use diesel::prelude::*;
                diesel::delete(crate::schema::$table::table
                        .filter(crate::schema::$table::$child.eq(child_id)))
                    .execute(conn)
            }

            /// Reconciles the parent's link set with `desired`: one link per
            /// added id, one unlink per removed id, issued sequentially with
            /// no batch atomicity.
            pub fn sync(conn: &mut diesel::pg::PgConnection,
                        parent_id: uuid::Uuid,
                        desired: &[uuid::Uuid]) -> diesel::QueryResult<()> {
                let previous = Self::children(conn, parent_id)?;
                let (added, removed) = $crate::tables::link_diff(&previous, desired);
                for id in added {
                    Self::link(conn, parent_id, id)?;
                }
                for id in removed {
                    Self::unlink(conn, parent_id, id)?;
                }
                Ok(())
            }

            /// `sync` from the child's side, for edits that carry a desired
            /// parent set.
            pub fn sync_parents(conn: &mut diesel::pg::PgConnection,
                                child_id: uuid::Uuid,
                                desired: &[uuid::Uuid]) -> diesel::QueryResult<()> {
                let previous = Self::parents(conn, child_id)?;
                let (added, removed) = $crate::tables::link_diff(&previous, desired);
                for id in added {
                    Self::link(conn, id, child_id)?;
                }
                for id in removed {
                    Self::unlink(conn, id, child_id)?;
                }
                Ok(())
            }
        }
    };
}

#[cfg(test)]
pub(crate) mod test {
    use diesel_migrations::{embed_migrations, EmbeddedMigrations};
    use uuid::Uuid;

    use super::link_diff;

    pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

    #[test]
    fn test_link_diff_splits_sets() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let (added, removed) = link_diff(&[a, b], &[b, c]);
        assert_eq!(added, vec![c]);
        assert_eq!(removed, vec![a]);
    }

    #[test]
    fn test_link_diff_identical_sets() {
        let a = Uuid::new_v4();
        let (added, removed) = link_diff(&[a], &[a]);
        assert!(added.is_empty());
        assert!(removed.is_empty());
    }
}
