mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error as ThisError;

use crate::student::Student;

/// The persistence abstraction the service is written against. Implementations must be safe to
/// call from many requests at once; callers never lock anything themselves.
///
/// There are no transactions and no concurrency tokens: two writers racing on the same id both
/// succeed and the last write wins.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Student>, StoreError>;

    /// All students, or only those whose name contains `name` (case-insensitive), ordered by id.
    async fn list(&self, name: Option<&str>) -> Result<Vec<Student>, StoreError>;

    /// Persists `student`, assigning a fresh id when it has none. A caller-supplied id is stored
    /// as is, overwriting whatever lives there.
    async fn insert(&self, student: Student) -> Result<Student, StoreError>;

    /// Overwrites the record at `id`. Returns `None` when there is nothing to overwrite. The id
    /// carried by `student` is ignored.
    async fn replace(&self, id: i64, student: Student) -> Result<Option<Student>, StoreError>;

    /// Returns whether a record existed and was removed.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

pub type SharedStore = Arc<dyn Store>;

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// The id generator has already handed out `i64::MAX`.
    #[error("no student ids left to assign")]
    IdsExhausted,
}
