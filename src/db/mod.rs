//! SQLite database module for barangay records
//!
//! ## Architecture
//!
//! - `diesel_schema` - `table!` declarations mirroring the DDL in `schema`
//! - `models` - Queryable/Insertable structs and status vocabularies
//! - one repository module per aggregate, each a set of free functions
//!   taking `&mut SqliteConnection`
//!
//! ## Tables
//!
//! - `users` - staff accounts
//! - `households`, `household_statistics`, `residents`, `resident_sectors`
//! - `officials` - signatories for certificates
//! - `certificates`, `certificate_templates`
//! - `blotter_cases`, `blotter_parties`, `blotter_hearings`, `blotter_status_updates`
//! - `aips`, `projects`, `expenses`, `milestones`, `transactions`

pub mod diesel_schema;
pub mod models;
pub mod schema;

pub mod blotter;
pub mod certificate_templates;
pub mod certificates;
pub mod finance;
pub mod households;
pub mod officials;
pub mod residents;
pub mod users;

use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::RegistryError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Per-connection pragmas. SQLite keeps these per connection, so every
/// pooled connection needs them.
#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas {
    wal: bool,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        let pragmas = if self.wal {
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000; \
             PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;"
        } else {
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;"
        };
        conn.batch_execute(pragmas)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Pooled SQLite database
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open or create the database described by `config`
    pub fn open(config: &Config) -> Result<Self, RegistryError> {
        std::fs::create_dir_all(&config.data_dir)?;
        let db_path = config.database_path();
        info!(path = ?db_path, pool_size = config.pool_size, "Opening SQLite database");

        let manager = ConnectionManager::<SqliteConnection>::new(db_path.to_string_lossy());
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(Duration::from_secs(10))
            .connection_customizer(Box::new(ConnectionPragmas { wal: true }))
            .build(manager)
            .map_err(|e| RegistryError::Pool(format!("Failed to build pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    ///
    /// Every `:memory:` connection is its own database, so the pool is
    /// pinned to a single connection.
    pub fn open_in_memory() -> Result<Self, RegistryError> {
        debug!("Opening in-memory SQLite database");

        let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
        let pool = Pool::builder()
            .max_size(1)
            .connection_customizer(Box::new(ConnectionPragmas { wal: false }))
            .build(manager)
            .map_err(|e| RegistryError::Pool(format!("Failed to build pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), RegistryError> {
        let mut conn = self.conn()?;
        schema::init_schema(&mut conn)
    }

    /// Check out a pooled connection
    pub fn conn(&self) -> Result<DbConn, RegistryError> {
        Ok(self.pool.get()?)
    }

    /// Run a closure against a pooled connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, RegistryError>,
    {
        let mut conn = self.conn()?;
        f(&mut conn)
    }

    /// Run a closure inside a single SQLite transaction
    pub fn transaction<F, T>(&self, f: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, RegistryError>,
    {
        let mut pooled = self.conn()?;
        let conn: &mut SqliteConnection = &mut pooled;
        conn.transaction(f)
    }

    /// Row counts for the health endpoint
    pub fn stats(&self) -> Result<DbStats, RegistryError> {
        use diesel_schema::{blotter_cases, certificates, households, residents, transactions};

        self.with_conn(|conn| {
            Ok(DbStats {
                households: households::table.count().get_result(conn)?,
                residents: residents::table.count().get_result(conn)?,
                certificates: certificates::table.count().get_result(conn)?,
                blotter_cases: blotter_cases::table.count().get_result(conn)?,
                transactions: transactions::table.count().get_result(conn)?,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStats {
    pub households: i64,
    pub residents: i64,
    pub certificates: i64,
    pub blotter_cases: i64,
    pub transactions: i64,
}

/// Escape a user search term for a LIKE pattern with `\` as the escape char
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Next value of a `PREFIX` + number sequence. Suffixes are compared as
/// numbers, so the sequence keeps counting once it outgrows its padding.
pub fn next_sequence<I, S>(prefix: &str, existing: I) -> u32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    existing
        .into_iter()
        .filter_map(|n| n.as_ref().strip_prefix(prefix)?.parse::<u32>().ok())
        .max()
        .map_or(1, |seq| seq + 1)
}

/// Fresh UUID v4 identifier
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Bare in-memory connection with foreign keys on and the schema applied
#[cfg(test)]
pub(crate) fn test_conn() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:").unwrap();
    conn.batch_execute("PRAGMA foreign_keys = ON;").unwrap();
    schema::init_schema(&mut conn).unwrap();
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_has_empty_tables() {
        let db = Database::open_in_memory().unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.households, 0);
        assert_eq!(stats.residents, 0);
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            pool_size: 2,
            ..Config::default()
        };
        let db = Database::open(&config).unwrap();
        assert_eq!(db.stats().unwrap().transactions, 0);
        assert!(config.database_path().exists());
    }

    #[test]
    fn test_next_sequence_compares_numerically() {
        assert_eq!(next_sequence("BLT-2024-", Vec::<String>::new()), 1);
        assert_eq!(
            next_sequence("BLT-2024-", ["BLT-2024-9999", "BLT-2024-10000", "BLT-2024-0042"]),
            10001
        );
        assert_eq!(next_sequence("PRJ-2024-", ["PRJ-2024-ROAD", "PRJ-2024-002"]), 3);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
