use serde::{Deserialize, Serialize};

/// The only resource this service manages.
///
/// `id` is `None` until the record has been persisted. Once a store assigns it, it never changes
/// for the lifetime of the record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

impl Student {
    pub fn new(name: impl Into<String>) -> Student {
        Student {
            id: None,
            name: name.into(),
        }
    }

    pub fn with_id(id: i64, name: impl Into<String>) -> Student {
        Student {
            id: Some(id),
            name: name.into(),
        }
    }

    /// Case-insensitive substring match against the name.
    pub fn name_contains(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}
