//! Primary keys: type-directed extraction and pluggable canonical encoding.
//!
//! A [`PrimaryKey`] is not a string. It is a typed value that knows which
//! [`PrimaryKeyWriter`] operation encodes it, and it is only turned into a string once a
//! concrete writer is supplied. This keeps extraction (which field, which kind) separate from
//! the encoding strategy (hex, dates, or anything else a writer implements).
//!
//! | decoded value | key |
//! |---|---|
//! | `int` | [`PrimaryKey::Int`] |
//! | `long` | [`PrimaryKey::Long`] |
//! | `date`, `timestamp-*`, `local-timestamp-*` | [`PrimaryKey::Time`] |
//! | `uuid`, `fixed` of size 16, `bytes` of length 16 | [`PrimaryKey::Uuid`] |
//! | union | the key of the selected branch |
//! | anything else | [`PrimaryKey::Invalid`] |
//!
//! Time keys are [`chrono`] instants, which span roughly ±262,000 years around the epoch. A
//! `date` or `timestamp-millis`/`-micros` value outside that range (for example
//! `Date(i32::MAX)` or `TimestampMillis(i64::MAX / 2)`) is [`PrimaryKey::Invalid`]. Every
//! `timestamp-nanos` value fits. Years past 9999 are in range and format with a sign, as in
//! `+11476-08-15`.
//!
//! Avro has no 16-bit integer, so [`PrimaryKey::Short`] only arises from `i16` values built
//! in code.

pub mod extract;
pub mod string_writer;

pub use extract::Extractor;
pub use string_writer::StringKeyWriter;

use crate::effect::{Io, fail};
use crate::error::Error;
use apache_avro::types::Value;
use chrono::{DateTime, Utc};

/// Length in bytes of a fixed identifier key.
pub const UUID_LEN: usize = 16;

/// One canonicalizing encode operation per supported key kind.
///
/// Implementations must be deterministic: the same value always encodes to the same string.
pub trait PrimaryKeyWriter {
    fn write_short(&self, key: i16) -> Io<'_, String>;
    fn write_int(&self, key: i32) -> Io<'_, String>;
    fn write_long(&self, key: i64) -> Io<'_, String>;
    fn write_time(&self, key: DateTime<Utc>) -> Io<'_, String>;
    fn write_uuid(&self, key: [u8; UUID_LEN]) -> Io<'_, String>;
}

/// A key extracted from a record, waiting for a writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimaryKey {
    Short(i16),
    Int(i32),
    Long(i64),
    Time(DateTime<Utc>),
    Uuid([u8; UUID_LEN]),
    /// Fails with [`Error::InvalidKey`] whatever the writer.
    Invalid,
}

/// The key that always fails to encode.
pub const INVALID_KEY: PrimaryKey = PrimaryKey::Invalid;

impl PrimaryKey {
    /// Dispatch on the runtime kind of a decoded value.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Int(i) => Self::Int(*i),
            Value::Long(l) => Self::Long(*l),

            Value::Date(days) => {
                time_key(DateTime::from_timestamp(i64::from(*days) * 86_400, 0))
            }
            Value::TimestampMillis(ms) | Value::LocalTimestampMillis(ms) => {
                time_key(DateTime::from_timestamp_millis(*ms))
            }
            Value::TimestampMicros(us) | Value::LocalTimestampMicros(us) => {
                time_key(DateTime::from_timestamp_micros(*us))
            }
            Value::TimestampNanos(ns) | Value::LocalTimestampNanos(ns) => {
                Self::Time(DateTime::from_timestamp_nanos(*ns))
            }

            Value::Uuid(u) => Self::Uuid(*u.as_bytes()),
            Value::Fixed(_, bytes) | Value::Bytes(bytes) => Self::from_bytes(bytes),

            Value::Union(_, inner) => Self::from_value(inner),

            _ => Self::Invalid,
        }
    }

    /// A 16-byte identifier, or [`PrimaryKey::Invalid`] for any other length.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match <[u8; UUID_LEN]>::try_from(bytes) {
            Ok(buf) => Self::Uuid(buf),
            Err(_) => Self::Invalid,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Encode this key with `writer`.
    pub fn encode<'w, W>(self, writer: &'w W) -> Io<'w, String>
    where
        W: PrimaryKeyWriter + ?Sized,
    {
        match self {
            Self::Short(k) => writer.write_short(k),
            Self::Int(k) => writer.write_int(k),
            Self::Long(k) => writer.write_long(k),
            Self::Time(k) => writer.write_time(k),
            Self::Uuid(k) => writer.write_uuid(k),
            Self::Invalid => fail(Error::InvalidKey),
        }
    }
}

fn time_key(t: Option<DateTime<Utc>>) -> PrimaryKey {
    t.map_or(PrimaryKey::Invalid, PrimaryKey::Time)
}

impl From<i16> for PrimaryKey {
    fn from(k: i16) -> Self {
        Self::Short(k)
    }
}

impl From<i32> for PrimaryKey {
    fn from(k: i32) -> Self {
        Self::Int(k)
    }
}

impl From<i64> for PrimaryKey {
    fn from(k: i64) -> Self {
        Self::Long(k)
    }
}

impl From<DateTime<Utc>> for PrimaryKey {
    fn from(k: DateTime<Utc>) -> Self {
        Self::Time(k)
    }
}

impl From<[u8; UUID_LEN]> for PrimaryKey {
    fn from(k: [u8; UUID_LEN]) -> Self {
        Self::Uuid(k)
    }
}
