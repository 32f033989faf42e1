//! Testing utilities for keyshard pipelines.
//!
//! This module provides the pieces needed to test partitioning without real input streams:
//!
//! - **Fixtures**: sample schemas and records, and builders for in-memory container bytes
//! - **Doubles**: an in-memory [`RecordSource`](crate::RecordSource) that can inject
//!   failures, and a key writer that records which operation was dispatched
//! - **Mock I/O**: temporary directories and schema files, output listing helpers
//!
//! # Quick Start
//!
//! ```no_run
//! use keyshard::*;
//! use keyshard::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let out = TempDirPath::new()?;
//! let saver = Saver::new(
//!     PathDeriver::with_default_extension(out.path()),
//!     RecordWriter::new(SAMPLE_SCHEMA, EncodeConfig::default(), FsyncType::Fast)?,
//! );
//! let source = VecRecordSource::from_records(vec![sample_record(1, "a")]);
//! saver
//!     .save_all(source, &Extractor::new("id"), &StringKeyWriter::default())
//!     .run(&Context::background())?;
//! assert_eq!(out.file_names()?, vec!["00000001.avro".to_string()]);
//! # Ok(())
//! # }
//! ```

pub mod doubles;
pub mod fixtures;
pub mod mock_io;

pub use doubles::*;
pub use fixtures::*;
pub use mock_io::*;
