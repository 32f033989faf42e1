//! The reference key writer: fixed-width lowercase hex for integers and identifiers, a
//! calendar layout for timestamps.
//!
//! | kind | encoding | length |
//! |---|---|---|
//! | `i16` | big-endian two's complement, hex | 4 |
//! | `i32` | big-endian two's complement, hex | 8 |
//! | `i64` | big-endian two's complement, hex | 16 |
//! | 16-byte identifier | raw bytes, hex | 32 |
//! | timestamp | `time_layout` (default `%Y-%m-%d`) | fixed by layout |
//!
//! The default layout drops the time of day, so every instant on the same UTC date maps to
//! the same key. Records sharing a date overwrite each other's file.

use crate::effect::{Io, of_fn};
use crate::error::{Error, Result};
use crate::key::{PrimaryKeyWriter, UUID_LEN};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Default timestamp layout: calendar date only.
pub const TIME_LAYOUT_DEFAULT: &str = "%Y-%m-%d";

/// Encodes keys as strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringKeyWriter {
    time_layout: String,
}

impl Default for StringKeyWriter {
    fn default() -> Self {
        Self {
            time_layout: TIME_LAYOUT_DEFAULT.to_string(),
        }
    }
}

impl StringKeyWriter {
    /// A writer formatting timestamps with the given strftime layout.
    ///
    /// # Errors
    /// Returns a configuration error if the layout is empty or not a valid strftime string.
    pub fn new(time_layout: impl Into<String>) -> Result<Self> {
        let time_layout = time_layout.into();
        if time_layout.is_empty() {
            return Err(Error::config("timestamp key layout is empty"));
        }
        if StrftimeItems::new(&time_layout).any(|item| matches!(item, Item::Error)) {
            return Err(Error::config(format!(
                "timestamp key layout {time_layout:?} is not a valid strftime layout"
            )));
        }
        Ok(Self { time_layout })
    }

    #[must_use]
    pub fn time_layout(&self) -> &str {
        &self.time_layout
    }
}

/// Hex-encode a fixed-width byte array. `N` bytes always give `2 * N` characters.
fn fixed_hex<'a, const N: usize>(bytes: [u8; N]) -> Io<'a, String> {
    of_fn(move || hex::encode(bytes))
}

impl PrimaryKeyWriter for StringKeyWriter {
    fn write_short(&self, key: i16) -> Io<'_, String> {
        fixed_hex(key.to_be_bytes())
    }

    fn write_int(&self, key: i32) -> Io<'_, String> {
        fixed_hex(key.to_be_bytes())
    }

    fn write_long(&self, key: i64) -> Io<'_, String> {
        fixed_hex(key.to_be_bytes())
    }

    fn write_time(&self, key: DateTime<Utc>) -> Io<'_, String> {
        Io::new(move |_| {
            let mut out = String::with_capacity(self.time_layout.len() + 8);
            write!(out, "{}", key.format(&self.time_layout)).map_err(|_| {
                Error::config(format!("cannot format timestamp with {:?}", self.time_layout))
            })?;
            Ok(out)
        })
    }

    fn write_uuid(&self, key: [u8; UUID_LEN]) -> Io<'_, String> {
        fixed_hex(key)
    }
}
