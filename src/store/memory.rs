use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::instrument;

use super::{Store, StoreError};
use crate::student::Student;

/// Keeps students in process memory, keyed by id. Ids are handed out by an atomic counter so
/// that concurrent inserts never race for the same id. Cloning is cheap: every clone shares the
/// same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<InnerStore>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        Self::default()
    }

    /// Builds a store that already holds `students`. Records without an id get one assigned.
    pub fn with_students(
        students: impl IntoIterator<Item = Student>,
    ) -> Result<MemoryStore, StoreError> {
        let store = Self::new();
        {
            let mut state = store.lock();
            for student in students {
                let id = store.assign_id(student.id)?;
                state.put(id, student.name);
            }
        }
        Ok(store)
    }
}

#[derive(Default)]
pub struct InnerStore {
    state: Mutex<State>,
    // Last id handed out.
    last_id: AtomicI64,
}

pub struct InnerStoreLocked<'a> {
    state: MutexGuard<'a, State>,
}

impl<'a> InnerStoreLocked<'a> {
    pub fn get(&self, id: i64) -> Option<&Student> {
        self.state.students.get(&id)
    }

    pub fn put(&mut self, id: i64, name: String) -> Student {
        let student = Student::with_id(id, name);
        self.state.students.insert(id, student.clone());
        student
    }

    pub fn remove(&mut self, id: i64) -> Option<Student> {
        self.state.students.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Student> {
        self.state.students.values()
    }

    pub fn size(&self) -> usize {
        self.state.students.len()
    }
}

impl Deref for MemoryStore {
    type Target = InnerStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl InnerStore {
    pub fn lock(&self) -> InnerStoreLocked<'_> {
        // A panic while holding the lock cannot leave a half-written entry behind, so the
        // map is still usable.
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        InnerStoreLocked { state }
    }

    fn assign_id(&self, requested: Option<i64>) -> Result<i64, StoreError> {
        match requested {
            Some(id) => {
                self.last_id.fetch_max(id, Ordering::SeqCst);
                Ok(id)
            }
            None => self
                .last_id
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| last.checked_add(1))
                .map(|last| last + 1)
                .map_err(|_| StoreError::IdsExhausted),
        }
    }
}

#[derive(Default)]
pub struct State {
    students: BTreeMap<i64, Student>,
}

#[async_trait]
impl Store for MemoryStore {
    #[instrument(level = "debug", skip(self))]
    async fn get(&self, id: i64) -> Result<Option<Student>, StoreError> {
        Ok(self.lock().get(id).cloned())
    }

    #[instrument(level = "debug", skip(self))]
    async fn list(&self, name: Option<&str>) -> Result<Vec<Student>, StoreError> {
        let state = self.lock();
        let students = match name {
            Some(name) => state
                .iter()
                .filter(|student| student.name_contains(name))
                .cloned()
                .collect(),
            None => state.iter().cloned().collect(),
        };
        Ok(students)
    }

    #[instrument(level = "debug", skip(self))]
    async fn insert(&self, student: Student) -> Result<Student, StoreError> {
        let id = self.assign_id(student.id)?;
        Ok(self.lock().put(id, student.name))
    }

    #[instrument(level = "debug", skip(self))]
    async fn replace(&self, id: i64, student: Student) -> Result<Option<Student>, StoreError> {
        let mut state = self.lock();
        if state.get(id).is_none() {
            return Ok(None);
        }

        Ok(Some(state.put(id, student.name)))
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.lock().remove(id).is_some())
    }
}
