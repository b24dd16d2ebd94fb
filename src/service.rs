use tracing::debug;

use crate::store::{SharedStore, Store, StoreError};
use crate::student::Student;

/// Thin layer between the HTTP routes and the store. Apart from pinning the id on update, every
/// call goes straight through.
#[derive(Clone)]
pub struct StudentService {
    store: SharedStore,
}

impl StudentService {
    pub fn new(store: SharedStore) -> StudentService {
        StudentService { store }
    }

    pub async fn find_student_by_id(&self, id: i64) -> Result<Option<Student>, StoreError> {
        self.store.get(id).await
    }

    /// Without a name every student is returned.
    pub async fn find_students_by_name(
        &self,
        name: Option<&str>,
    ) -> Result<Vec<Student>, StoreError> {
        self.store.list(name).await
    }

    pub async fn add_new_student(&self, student: Student) -> Result<Student, StoreError> {
        self.store.insert(student).await
    }

    /// Replaces the student stored at `id`, keeping that id whatever `student.id` says. Returns
    /// `None` when there is no such student.
    pub async fn update_student(
        &self,
        id: i64,
        mut student: Student,
    ) -> Result<Option<Student>, StoreError> {
        let existing = match self.store.get(id).await? {
            Some(existing) => existing,
            None => return Ok(None),
        };

        student.id = existing.id;
        self.store.replace(id, student).await
    }

    /// Deleting a student that is already gone is not an error.
    pub async fn delete_student(&self, student: &Student) -> Result<(), StoreError> {
        let Some(id) = student.id else {
            return Ok(());
        };

        if !self.store.delete(id).await? {
            debug!(id, "Student was already deleted");
        }
        Ok(())
    }
}
