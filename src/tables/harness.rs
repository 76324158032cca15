use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};

pub fn to_pg_db_name(name: &str) -> String {
    let mut db_name = String::from("test_");
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            db_name.push(c.to_ascii_lowercase());
        } else {
            db_name.push('_');
        }
    }
    db_name
}

/// Creates a throwaway database for one test and drops it when the harness
/// goes out of scope. Expects a local postgres superuser reachable with the
/// given password.
pub struct DbHarness {
    host: String,
    password: String,
    db_name: String,
}

impl DbHarness {
    fn admin_url(&self) -> String {
        format!("postgres://postgres:{}@{}/postgres", self.password, self.host)
    }

    fn db_url(&self) -> String {
        format!(
            "postgres://postgres:{}@{}/{}",
            self.password, self.host, self.db_name
        )
    }

    pub fn new(
        host: &str,
        password: &str,
        db_name: &str,
        migrations: Option<EmbeddedMigrations>,
    ) -> Self {
        let harness = Self {
            host: host.to_string(),
            password: password.to_string(),
            db_name: db_name.to_string(),
        };
        let mut admin = PgConnection::establish(&harness.admin_url())
            .expect("Failed to connect to the postgres admin database");
        diesel::sql_query(format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE)",
            harness.db_name
        ))
        .execute(&mut admin)
        .ok();
        diesel::sql_query(format!("CREATE DATABASE {}", harness.db_name))
            .execute(&mut admin)
            .expect("Failed to create test database");

        if let Some(migrations) = migrations {
            let mut conn = harness.conn();
            conn.run_pending_migrations(migrations)
                .expect("Failed to run migrations in test database");
        }
        harness
    }

    pub fn conn(&self) -> PgConnection {
        PgConnection::establish(&self.db_url()).expect("Failed to connect to test database")
    }
}

impl Drop for DbHarness {
    fn drop(&mut self) {
        if let Ok(mut admin) = PgConnection::establish(&self.admin_url()) {
            diesel::sql_query(format!(
                "DROP DATABASE IF EXISTS {} WITH (FORCE)",
                self.db_name
            ))
            .execute(&mut admin)
            .ok();
        }
    }
}
