//! PostgreSQL-backed student store.
//!
//! Expects the table to exist already; the service never creates or
//! alters it:
//!
//! ```sql
//! CREATE TABLE students (
//!     name       TEXT PRIMARY KEY,
//!     age        INTEGER NOT NULL,
//!     class_name TEXT NOT NULL,
//!     roll       INTEGER NOT NULL,
//!     place      TEXT NOT NULL
//! );
//! ```

mod config;

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use roster_api::{PersistenceError, StoreFuture, StudentRecord, StudentStore};

pub use config::PostgresConfig;

pub const UPSERT_SQL: &str = "INSERT INTO students (name, age, class_name, roll, place) \
     VALUES ($1,$2,$3,$4,$5) \
     ON CONFLICT (name) DO UPDATE SET age=$2, class_name=$3, roll=$4, place=$5";

const SELECT_SQL: &str = "SELECT name, age, class_name, roll, place FROM students WHERE name = $1";
const COUNT_SQL: &str = "SELECT COUNT(*) FROM students";

// ════════════════════════════════════════════════════════════════
//  PostgresStore
// ════════════════════════════════════════════════════════════════

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Build the pool without opening a connection; the first query (the
    /// startup `ping`) is what actually reaches the server.
    pub fn connect(config: &PostgresConfig) -> Result<Self, PersistenceError> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| PersistenceError::connection("postgres url not configured"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy(url)
            .map_err(|e| map_sqlx_error(e).with_context("postgres pool"))?;

        tracing::info!(max_connections = config.max_connections, "postgres pool created");
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl StudentStore for PostgresStore {
    fn upsert(&self, record: &StudentRecord) -> StoreFuture<'_, ()> {
        let record = record.clone();
        Box::pin(async move {
            sqlx::query(UPSERT_SQL)
                .bind(&record.name)
                .bind(record.age)
                .bind(&record.class_name)
                .bind(record.roll)
                .bind(&record.place)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e).with_context(format!("upsert '{}'", record.name)))?;
            Ok(())
        })
    }

    fn get(&self, name: &str) -> StoreFuture<'_, Option<StudentRecord>> {
        let name = name.to_owned();
        Box::pin(async move {
            let row = sqlx::query_as::<_, (String, i32, String, i32, String)>(SELECT_SQL)
                .bind(&name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e).with_context(format!("select '{name}'")))?;

            Ok(row.map(|(name, age, class_name, roll, place)| StudentRecord {
                name,
                age,
                class_name,
                roll,
                place,
            }))
        })
    }

    fn count(&self) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let n = sqlx::query_scalar::<_, i64>(COUNT_SQL)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e).with_context("count"))?;
            Ok(n.max(0) as u64)
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e).with_context("ping"))?;
            Ok(())
        })
    }

    fn close(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.pool.close().await;
            tracing::info!("postgres pool closed");
            Ok(())
        })
    }
}

/// SQLSTATE class 23 is "integrity constraint violation".
fn map_sqlx_error(e: sqlx::Error) -> PersistenceError {
    match &e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => PersistenceError::connection(e.to_string()),
        sqlx::Error::Database(db)
            if db.constraint().is_some() || db.code().is_some_and(|c| c.starts_with("23")) =>
        {
            PersistenceError::constraint(e.to_string())
        }
        _ => PersistenceError::new(e.to_string()),
    }
}
