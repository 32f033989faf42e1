//! Test doubles for the pipeline's seams.

use crate::effect::Io;
use crate::error::Result;
use crate::io::decode::RecordSource;
use crate::io::record::Record;
use crate::key::{PrimaryKeyWriter, UUID_LEN};
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::collections::VecDeque;

/// An in-memory [`RecordSource`].
///
/// Items are lent through one reused buffer, like the container decoder does. An `Err`
/// item is yielded once and ends the source.
pub struct VecRecordSource {
    items: VecDeque<Result<Record>>,
    buf: Record,
    pulled: usize,
    done: bool,
}

impl VecRecordSource {
    #[must_use]
    pub fn new(items: Vec<Result<Record>>) -> Self {
        Self {
            items: items.into(),
            buf: Record::default(),
            pulled: 0,
            done: false,
        }
    }

    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Self {
        Self::new(records.into_iter().map(Ok).collect())
    }

    /// Number of items pulled so far, including a failed one.
    #[must_use]
    pub fn pulled(&self) -> usize {
        self.pulled
    }

    /// Number of items never pulled.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

impl RecordSource for VecRecordSource {
    fn next_record(&mut self) -> Option<Result<&Record>> {
        if self.done {
            return None;
        }
        let item = self.items.pop_front()?;
        self.pulled += 1;
        match item {
            Ok(record) => match self.buf.refill(record.into()) {
                Ok(()) => Some(Ok(&self.buf)),
                Err(e) => {
                    self.done = true;
                    Some(Err(e))
                }
            },
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// A [`PrimaryKeyWriter`] that logs which operation each key dispatched to and encodes
/// keys as `<op>:<debug value>`.
#[derive(Debug, Default)]
pub struct RecordingKeyWriter {
    calls: RefCell<Vec<&'static str>>,
}

impl RecordingKeyWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations called so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    fn record(&self, op: &'static str, value: String) -> Io<'_, String> {
        Io::new(move |_| {
            self.calls.borrow_mut().push(op);
            Ok(format!("{op}:{value}"))
        })
    }
}

impl PrimaryKeyWriter for RecordingKeyWriter {
    fn write_short(&self, key: i16) -> Io<'_, String> {
        self.record("short", key.to_string())
    }

    fn write_int(&self, key: i32) -> Io<'_, String> {
        self.record("int", key.to_string())
    }

    fn write_long(&self, key: i64) -> Io<'_, String> {
        self.record("long", key.to_string())
    }

    fn write_time(&self, key: DateTime<Utc>) -> Io<'_, String> {
        self.record("time", key.timestamp_millis().to_string())
    }

    fn write_uuid(&self, key: [u8; UUID_LEN]) -> Io<'_, String> {
        self.record("uuid", format!("{key:?}"))
    }
}
