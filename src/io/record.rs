//! The record buffer handed from the decoder to the rest of the pipeline.

use crate::error::{Error, Result};
use apache_avro::types::Value;

/// An ordered mapping from field name to a dynamically-typed Avro value.
///
/// Internally this is always a [`Value::Record`], so it can be handed to the encoder without
/// rebuilding it.
#[derive(Clone, Debug, PartialEq)]
pub struct Record(Value);

impl Default for Record {
    fn default() -> Self {
        Self(Value::Record(Vec::new()))
    }
}

impl Record {
    #[must_use]
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self(Value::Record(fields))
    }

    /// Wrap a decoded datum, rejecting anything that is not a record.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Record(fields) => Ok(Self::new(fields)),
            other => Err(Error::NotARecord {
                found: value_kind(&other),
            }),
        }
    }

    #[must_use]
    pub fn fields(&self) -> &[(String, Value)] {
        match &self.0 {
            Value::Record(fields) => fields,
            _ => &[],
        }
    }

    /// Look up a field by name. The first field with that name wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields()
            .iter()
            .find_map(|(k, v)| (k == name).then_some(v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// The record as an Avro datum, ready for encoding.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Drop every field while keeping the allocated capacity.
    pub fn clear(&mut self) {
        if let Value::Record(fields) = &mut self.0 {
            fields.clear();
        }
    }

    /// Clear the buffer and move the fields of `decoded` into it.
    ///
    /// On error the buffer is left empty.
    pub fn refill(&mut self, decoded: Value) -> Result<()> {
        self.clear();
        match (&mut self.0, decoded) {
            (Value::Record(buf), Value::Record(fields)) => {
                buf.extend(fields);
                Ok(())
            }
            (_, other) => Err(Error::NotARecord {
                found: value_kind(&other),
            }),
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.0
    }
}

/// Short, human-readable name of a datum's kind.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Boolean(_) => "boolean",
        Value::Int(_) => "int",
        Value::Long(_) => "long",
        Value::Float(_) => "float",
        Value::Double(_) => "double",
        Value::Bytes(_) => "bytes",
        Value::String(_) => "string",
        Value::Fixed(..) => "fixed",
        Value::Enum(..) => "enum",
        Value::Union(..) => "union",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Record(_) => "record",
        Value::Date(_) => "date",
        Value::TimestampMillis(_)
        | Value::TimestampMicros(_)
        | Value::TimestampNanos(_)
        | Value::LocalTimestampMillis(_)
        | Value::LocalTimestampMicros(_)
        | Value::LocalTimestampNanos(_) => "timestamp",
        Value::Uuid(_) => "uuid",
        _ => "other",
    }
}
