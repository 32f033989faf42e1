//! The pipeline driver: decoded records in, one keyed file per record out.
//!
//! For each record, strictly in stream order:
//!
//! 1. stop with a cancellation error if the context is cancelled or past its deadline
//! 2. pull the next record; stop successfully when the source is exhausted
//! 3. stop with the decode error if the pull failed
//! 4. extract the key, derive the path (resolving the key with the writer), write the file
//! 5. stop with the error if any part of step 4 failed
//!
//! There is no retry and no skipping. Files written before a failure stay on disk.

use crate::effect::Io;
use crate::io::decode::RecordSource;
use crate::io::encode::RecordWriter;
use crate::io::path::PathDeriver;
use crate::io::record::Record;
use crate::key::{Extractor, PrimaryKey, PrimaryKeyWriter};
use std::path::PathBuf;
use tracing::{debug, debug_span, info};

/// Outcome of a successful run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SaveSummary {
    /// Number of records written, one file each.
    pub records: usize,
}

/// Writes each record to the file its primary key names.
pub struct Saver {
    paths: PathDeriver,
    writer: RecordWriter,
}

impl Saver {
    #[must_use]
    pub fn new(paths: PathDeriver, writer: RecordWriter) -> Self {
        Self { paths, writer }
    }

    #[must_use]
    pub fn paths(&self) -> &PathDeriver {
        &self.paths
    }

    #[must_use]
    pub fn writer(&self) -> &RecordWriter {
        &self.writer
    }

    /// Save one record under `key`, yielding the path written.
    pub fn save<'a, W>(
        &'a self,
        key: PrimaryKey,
        key_writer: &'a W,
        record: &'a Record,
    ) -> Io<'a, PathBuf>
    where
        W: PrimaryKeyWriter + ?Sized,
    {
        self.paths
            .derive(key, key_writer)
            .bind(move |path| self.writer.write_io(record, path))
    }

    /// Drain `source`, saving every record, and stop at the first error.
    pub fn save_all<'a, S, W>(
        &'a self,
        source: S,
        extractor: &'a Extractor,
        key_writer: &'a W,
    ) -> Io<'a, SaveSummary>
    where
        S: RecordSource + 'a,
        W: PrimaryKeyWriter + ?Sized,
    {
        Io::new(move |ctx| {
            let mut source = source;
            let mut summary = SaveSummary::default();
            loop {
                ctx.check()?;
                let Some(item) = source.next_record() else {
                    break;
                };
                let index = summary.records;
                let record = item.inspect_err(|e| debug!(index, error = %e, "decode failed"))?;

                let span = debug_span!("record", index);
                let _guard = span.enter();

                let key = extractor.extract(record);
                let path = self
                    .save(key, key_writer, record)
                    .run(ctx)
                    .inspect_err(|e| debug!(field = extractor.field(), error = %e, "save failed"))?;
                debug!(path = %path.display(), "wrote record");
                summary.records += 1;
            }
            info!(
                records = summary.records,
                root = %self.paths.root().display(),
                "partitioning finished"
            );
            Ok(summary)
        })
    }
}
