//! # keyshard
//!
//! Fan a single Avro object container stream out into a key-partitioned file layout: one
//! container file per record, named by a canonical encoding of the record's primary key.
//!
//! ## Pipeline
//!
//! ```text
//! bytes ─▶ AvroRecordStream ─▶ Saver ─▶ Extractor ─▶ PrimaryKey ─▶ PrimaryKeyWriter
//!                                                                      │ key string
//!                           one file per record ◀─ RecordWriter ◀─ PathDeriver
//! ```
//!
//! - [`io::decode`] turns a byte stream into a lending stream of [`Record`]s
//! - [`key::Extractor`] picks the primary key field and classifies its value
//! - [`key::PrimaryKeyWriter`] encodes the key; [`StringKeyWriter`] is the reference writer
//!   (fixed-width big-endian hex for integers and identifiers, a date for timestamps)
//! - [`io::path::PathDeriver`] builds `<root>/<key>.<ext>`
//! - [`io::encode::RecordWriter`] writes the record into its own container file
//! - [`saver::Saver`] drives it all, sequentially, stopping at the first error
//!
//! Every I/O-bearing step is a deferred [`effect::Io`] run under a cancellable
//! [`effect::Context`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use keyshard::*;
//! # fn main() -> anyhow::Result<()> {
//! let writer = RecordWriter::new(
//!     r#"{"type":"record","name":"Event","fields":[{"name":"id","type":"int"}]}"#,
//!     EncodeConfig::default(),
//!     FsyncType::Fsync,
//! )?;
//! let saver = Saver::new(PathDeriver::with_default_extension("out"), writer);
//!
//! let input = std::fs::File::open("events.avro")?;
//! let records = decode(input, &DecodeConfig::default());
//! let extractor = Extractor::new("id");
//! let key_writer = StringKeyWriter::default();
//!
//! let summary = saver
//!     .save_all(records, &extractor, &key_writer)
//!     .run(&Context::background())?;
//! println!("wrote {} files", summary.records);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `codec-snappy` - snappy block compression for output files
//! - `codec-zstandard` - zstandard block compression for output files

pub mod config;
pub mod effect;
pub mod error;
pub mod io;
pub mod key;
pub mod observability;
pub mod saver;
pub mod testing;

pub use config::{EnvSource, ProcessEnv, Settings};
pub use effect::{CancelHandle, Context, Io};
pub use error::{Error, ErrorKind, Result};
pub use io::{
    AvroRecordStream, Codec, DecodeConfig, EncodeConfig, FsyncType, PathDeriver, Record,
    RecordSource, RecordWriter, decode,
};
pub use key::{Extractor, INVALID_KEY, PrimaryKey, PrimaryKeyWriter, StringKeyWriter};
pub use saver::{SaveSummary, Saver};
