//! Database module.
//!
//! Connection pooling and migrations over sqlx, plus the user store
//! implementations. SQLite is the default backend; the `postgres` feature
//! switches to PostgreSQL.

mod memory;
mod repository;
mod schema;
mod traits;
mod user;

pub use memory::MemoryUserStore;
pub use repository::SqlUserStore;
pub use schema::MIGRATIONS;
pub use traits::UserStore;
pub use user::{NewUser, PublicUser, User, DEFAULT_ROLE};

use tracing::{debug, info};

use crate::Result;

/// Connection pool for the compiled-in backend.
#[cfg(not(feature = "postgres"))]
pub type DbPool = sqlx::SqlitePool;

#[cfg(feature = "postgres")]
pub type DbPool = sqlx::PgPool;

/// Database wrapper owning the pool.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Connect to `url` and apply pending migrations.
    ///
    /// For SQLite the database file and its parent directory are created
    /// if missing.
    #[cfg(not(feature = "postgres"))]
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        use std::str::FromStr;

        use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

        info!(url = %url, "Opening database");
        ensure_parent_dir(url)?;

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    #[cfg(feature = "postgres")]
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        use sqlx::postgres::PgPoolOptions;

        info!("Opening database");
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(max_connections.max(1))
            .test_before_acquire(true)
            .connect(url)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open a migrated in-memory database for testing.
    ///
    /// The pool holds a single connection that is never recycled, since
    /// every SQLite in-memory connection is its own database.
    #[cfg(not(feature = "postgres"))]
    pub async fn open_in_memory() -> Result<Self> {
        use sqlx::sqlite::SqlitePoolOptions;

        debug!("Opening in-memory database");
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// The underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Get the current schema version. 0 if nothing was applied yet.
    pub async fn schema_version(&self) -> Result<i64> {
        sqlx::raw_sql(schema::SCHEMA_VERSION_TABLE)
            .execute(&self.pool)
            .await?;

        let version: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    /// Apply pending migrations, each in its own transaction.
    pub async fn migrate(&self) -> Result<()> {
        let current = self.schema_version().await?;
        let target = MIGRATIONS.len() as i64;

        if current >= target {
            debug!(version = current, "Database is up to date");
            return Ok(());
        }

        info!(from = current, to = target, "Migrating database");

        for (i, migration) in MIGRATIONS.iter().enumerate().skip(current as usize) {
            let version = (i + 1) as i64;
            let mut tx = self.pool.begin().await?;

            sqlx::raw_sql(migration).execute(&mut *tx).await?;
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(version)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            debug!(version, "Migration applied");
        }

        info!(version = target, "Database migration complete");
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

/// Create the directory holding a file-backed SQLite database.
#[cfg(not(feature = "postgres"))]
fn ensure_parent_dir(url: &str) -> Result<()> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    let path = path.split('?').next().unwrap_or(path);

    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
