use crate::io::record::Record;
use crate::key::{INVALID_KEY, PrimaryKey};

/// Pulls the primary key out of a record by field name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extractor {
    field: String,
}

impl Extractor {
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The key held by the named field; [`INVALID_KEY`] if the field is missing or its value
    /// cannot be a key.
    #[must_use]
    pub fn extract(&self, record: &Record) -> PrimaryKey {
        match record.get(&self.field) {
            Some(value) => PrimaryKey::from_value(value),
            None => INVALID_KEY,
        }
    }
}
