//! Database connection pool and migration management.

use sqlx::{Pool, Postgres};

/// PostgreSQL connection pool shared by every handler.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// Connections are opened on demand up to `max_connections` and kept alive
/// for reuse across requests.
///
/// # Errors
///
/// Returns an error if the connection string is invalid or the server
/// cannot be reached.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Run the embedded migrations from the `migrations/` directory.
///
/// Applied migrations are tracked in `_sqlx_migrations`, so each one runs once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Uniqueness violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// Whether a database error was raised by a UNIQUE constraint.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

/// Whether a database error was raised by the named UNIQUE constraint
/// (or primary key).
pub fn is_unique_violation_on(error: &sqlx::Error, constraint: &str) -> bool {
    is_unique_violation(error)
        && error
            .as_database_error()
            .and_then(|e| e.constraint())
            .is_some_and(|name| name == constraint)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::{borrow::Cow, error::Error as StdError, fmt};

    use sqlx::error::{DatabaseError, ErrorKind};

    /// Stand-in for a driver error carrying a SQLSTATE and constraint name.
    #[derive(Debug)]
    pub struct FakeDbError {
        pub code: &'static str,
        pub constraint: Option<&'static str>,
    }

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "fake database error {}", self.code)
        }
    }

    impl StdError for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "fake database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.code {
                super::UNIQUE_VIOLATION => ErrorKind::UniqueViolation,
                _ => ErrorKind::Other,
            }
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }
    }

    pub fn error(code: &'static str, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { code, constraint }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_is_matched_by_constraint() {
        let err = test_support::error(UNIQUE_VIOLATION, Some("ongs_pkey"));
        assert!(is_unique_violation(&err));
        assert!(is_unique_violation_on(&err, "ongs_pkey"));
        assert!(!is_unique_violation_on(&err, "ongs_email_key"));

        let fk = test_support::error("23503", Some("ongs_pkey"));
        assert!(!is_unique_violation(&fk));
        assert!(!is_unique_violation_on(&fk, "ongs_pkey"));

        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
