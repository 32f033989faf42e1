//! Decoding an Avro object container stream into records.
//!
//! [`AvroRecordStream`] is a lending stream: each call to [`RecordSource::next_record`]
//! clears one internal [`Record`] buffer, refills it with the next decoded datum, and lends
//! it out. The reference is only valid until the next pull, which the borrow checker
//! enforces; copy the record (it is `Clone`) to keep it longer.
//!
//! # Notes
//! - The container header is not read until the first pull. A bad header is reported as the
//!   first item.
//! - After any error the stream is exhausted.
//! - The decoded-size limit is process-wide in `apache-avro` and the first configuration
//!   applied wins.

use crate::error::{Error, Result};
use crate::io::record::Record;
use apache_avro::Reader;
use std::io::{BufReader, Read};
use tracing::{debug, warn};

/// Default cap on the size of a single decoded `bytes`/`string` field.
pub const BLOB_SIZE_MAX_DEFAULT: usize = 1_048_576;

/// Decoder settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Maximum size in bytes of one decoded byte array or string.
    pub blob_size_max: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            blob_size_max: BLOB_SIZE_MAX_DEFAULT,
        }
    }
}

/// A single-pass, error-terminated source of records.
pub trait RecordSource {
    /// Pull the next record. `None` means the source is exhausted.
    fn next_record(&mut self) -> Option<Result<&Record>>;
}

impl<S: RecordSource + ?Sized> RecordSource for &mut S {
    fn next_record(&mut self) -> Option<Result<&Record>> {
        (**self).next_record()
    }
}

enum State<R: Read> {
    Pending(R),
    Open(Reader<'static, BufReader<R>>),
    Done,
}

/// Record stream over an Avro object container.
pub struct AvroRecordStream<R: Read> {
    state: State<R>,
    buf: Record,
    decoded: usize,
}

impl<R: Read> AvroRecordStream<R> {
    /// Prepare to decode `input`. Nothing is read until the first pull.
    pub fn new(input: R, config: &DecodeConfig) -> Self {
        let effective = apache_avro::util::max_allocation_bytes(config.blob_size_max);
        if effective != config.blob_size_max {
            warn!(
                requested = config.blob_size_max,
                effective, "decoded field size limit was already set; keeping the earlier value"
            );
        }
        Self {
            state: State::Pending(input),
            buf: Record::default(),
            decoded: 0,
        }
    }

    /// Number of records decoded so far.
    #[must_use]
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    fn open(&mut self) -> Result<()> {
        if let State::Pending(_) = self.state {
            let State::Pending(input) = std::mem::replace(&mut self.state, State::Done) else {
                return Ok(());
            };
            let reader = Reader::new(BufReader::new(input)).map_err(Error::Decode)?;
            debug!(schema = %reader.writer_schema().canonical_form(), "opened container");
            self.state = State::Open(reader);
        }
        Ok(())
    }
}

impl<R: Read> RecordSource for AvroRecordStream<R> {
    fn next_record(&mut self) -> Option<Result<&Record>> {
        if let Err(e) = self.open() {
            return Some(Err(e));
        }
        let State::Open(reader) = &mut self.state else {
            return None;
        };
        let value = match reader.next()? {
            Ok(value) => value,
            Err(e) => {
                self.state = State::Done;
                return Some(Err(Error::Decode(e)));
            }
        };
        if let Err(e) = self.buf.refill(value) {
            self.state = State::Done;
            return Some(Err(e));
        }
        self.decoded += 1;
        Some(Ok(&self.buf))
    }
}

/// Decode records from `input`.
pub fn decode<R: Read>(input: R, config: &DecodeConfig) -> AvroRecordStream<R> {
    AvroRecordStream::new(input, config)
}
