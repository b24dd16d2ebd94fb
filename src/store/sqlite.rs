use async_trait::async_trait;
use futures::{future, TryStreamExt};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

use super::{Store, StoreError};
use crate::student::Student;

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS student (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    )
";

/// Keeps students in a SQLite `student` table. Every operation is a single statement; there are
/// no transactions.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `url` and makes sure the `student` table exists.
    ///
    /// Accepts any sqlx SQLite URL, e.g. `sqlite://students.db` or `sqlite::memory:`.
    pub async fn connect(url: &str) -> Result<SqliteStore, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to `:memory:` opens its own empty database, so an in-memory pool
        // must stay pinned to one connection that is never recycled.
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options.connect_with(options).await?;
        info!("Connected to SQLite database at {}", url);

        let store = SqliteStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    #[instrument(level = "debug", skip(self))]
    async fn get(&self, id: i64) -> Result<Option<Student>, StoreError> {
        let student = sqlx::query_as::<_, Student>("SELECT id, name FROM student WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(student)
    }

    #[instrument(level = "debug", skip(self))]
    async fn list(&self, name: Option<&str>) -> Result<Vec<Student>, StoreError> {
        // SQLite's `lower()` only folds ASCII, so the name filter runs here rather than in SQL.
        let students = sqlx::query_as::<_, Student>("SELECT id, name FROM student ORDER BY id")
            .fetch(&self.pool)
            .try_filter(|student| {
                future::ready(name.map_or(true, |name| student.name_contains(name)))
            })
            .try_collect()
            .await?;

        Ok(students)
    }

    #[instrument(level = "debug", skip(self))]
    async fn insert(&self, student: Student) -> Result<Student, StoreError> {
        // A NULL id lets SQLite pick the next rowid; a supplied one is upserted in place.
        let student = sqlx::query_as::<_, Student>(
            "INSERT INTO student (id, name) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name
             RETURNING id, name",
        )
        .bind(student.id)
        .bind(student.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(student)
    }

    #[instrument(level = "debug", skip(self))]
    async fn replace(&self, id: i64, student: Student) -> Result<Option<Student>, StoreError> {
        let student = sqlx::query_as::<_, Student>(
            "UPDATE student SET name = ? WHERE id = ? RETURNING id, name",
        )
        .bind(student.name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM student WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
