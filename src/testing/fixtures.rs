//! Pre-built schemas, records, and container bytes for common testing scenarios.

use crate::error::{Error, Result};
use crate::io::record::Record;
use apache_avro::types::Value;
use apache_avro::{Reader, Schema, Writer};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A record with an `int` key field `id` and a string payload `x`.
pub const SAMPLE_SCHEMA: &str = r#"{
    "type": "record",
    "name": "Event",
    "fields": [
        {"name": "id", "type": "int"},
        {"name": "x", "type": "string"}
    ]
}"#;

/// A record schema whose `id` field has the given Avro type (as JSON) and a string `x`.
///
/// # Example
///
/// ```
/// use keyshard::testing::schema_with_key;
///
/// let schema = schema_with_key(r#"{"type": "long", "logicalType": "timestamp-millis"}"#);
/// assert!(schema.contains("timestamp-millis"));
/// ```
#[must_use]
pub fn schema_with_key(key_type: &str) -> String {
    format!(
        r#"{{"type": "record", "name": "Event", "fields": [{{"name": "id", "type": {key_type}}}, {{"name": "x", "type": "string"}}]}}"#
    )
}

/// A record matching [`SAMPLE_SCHEMA`].
#[must_use]
pub fn sample_record(id: i32, x: &str) -> Record {
    keyed_record(Value::Int(id), x)
}

/// A record with the given key value and a string payload `x`.
#[must_use]
pub fn keyed_record(id: Value, x: &str) -> Record {
    Record::new(vec![
        ("id".to_string(), id),
        ("x".to_string(), Value::String(x.to_string())),
    ])
}

/// Encode `records` as an in-memory object container.
///
/// With `block_per_record`, each record is flushed into its own block, so a decoder reaches
/// later records only after reading earlier blocks.
///
/// # Errors
///
/// Returns an error if the schema does not parse or a record does not match it.
pub fn container_bytes(schema: &str, records: &[Record], block_per_record: bool) -> Result<Vec<u8>> {
    let schema = Schema::parse_str(schema).map_err(Error::Encode)?;
    let mut writer = Writer::new(&schema, Vec::new());
    for record in records {
        writer
            .append_value_ref(record.as_value())
            .map_err(Error::Encode)?;
        if block_per_record {
            writer.flush().map_err(Error::Encode)?;
        }
    }
    writer.into_inner().map_err(Error::Encode)
}

/// Read every record of the container file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded.
pub fn read_container(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|e| Error::io(path, e))?;
    let reader = Reader::new(BufReader::new(f)).map_err(Error::Decode)?;
    reader
        .map(|value| value.map_err(Error::Decode).and_then(Record::from_value))
        .collect()
}

/// Whether the header of the container file at `path` names `codec`.
///
/// The header stores the codec as a plain string under `avro.codec`, so it can be found in
/// the leading bytes of the file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn header_names_codec(path: impl AsRef<Path>, codec: &str) -> Result<bool> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let Some(meta) = find(&bytes, b"avro.codec") else {
        return Ok(false);
    };
    // The value follows its zig-zag length prefix.
    let value = &bytes[meta + b"avro.codec".len()..];
    Ok(value.len() > codec.len() && &value[1..=codec.len()] == codec.as_bytes())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
