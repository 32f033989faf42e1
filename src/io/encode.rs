//! Writing records into individual Avro object container files.
//!
//! [`RecordWriter`] owns everything needed to turn one record into one file: the parsed
//! output schema, the block/codec settings, and the durability policy. Each write creates
//! (or truncates) the target file, encodes the record, flushes, optionally syncs, and closes.
//! Failures of the individual sub-steps are collected and reported together, so none is lost.
//!
//! The parent directory must already exist; no directories are created.

use crate::effect::Io;
use crate::error::{Error, Result};
use crate::io::record::Record;
use apache_avro::{Schema, Writer};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Default number of records per container block.
pub const BLOCK_LENGTH_DEFAULT: usize = 100;

/// Block compression codec names accepted in configuration.
///
/// `Bzip2` and `Xz` are recognised names, but they are not mapped to an encoder and are
/// written uncompressed (see [`Codec::to_avro`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Codec {
    #[default]
    Null,
    Deflate,
    Snappy,
    Zstandard,
    Bzip2,
    Xz,
}

impl Codec {
    /// Parse a codec name. Unknown names map to [`Codec::Null`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "deflate" => Self::Deflate,
            "snappy" => Self::Snappy,
            "zstandard" => Self::Zstandard,
            "bzip2" => Self::Bzip2,
            "xz" => Self::Xz,
            _ => Self::Null,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Deflate => "deflate",
            Self::Snappy => "snappy",
            Self::Zstandard => "zstandard",
            Self::Bzip2 => "bzip2",
            Self::Xz => "xz",
        }
    }

    /// The codec actually handed to the container encoder.
    ///
    /// # Errors
    /// Returns a configuration error if the codec's cargo feature is compiled out.
    pub fn to_avro(self) -> Result<apache_avro::Codec> {
        match self {
            Self::Null => Ok(apache_avro::Codec::Null),
            Self::Deflate => Ok(apache_avro::Codec::Deflate(
                apache_avro::DeflateSettings::default(),
            )),
            #[cfg(feature = "codec-snappy")]
            Self::Snappy => Ok(apache_avro::Codec::Snappy),
            #[cfg(feature = "codec-zstandard")]
            Self::Zstandard => Ok(apache_avro::Codec::Zstandard(
                apache_avro::ZstandardSettings::default(),
            )),
            #[allow(unreachable_patterns)]
            Self::Snappy | Self::Zstandard => Err(Error::config(format!(
                "codec {} is not compiled in",
                self.name()
            ))),
            // TODO: decide whether bzip2/xz should select the real encoders or be rejected.
            Self::Bzip2 | Self::Xz => {
                warn!(codec = self.name(), "codec has no encoder mapping; writing uncompressed");
                Ok(apache_avro::Codec::Null)
            }
        }
    }
}

impl FromStr for Codec {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Container encoder settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeConfig {
    /// Records appended between explicit block flushes.
    pub block_length: usize,
    pub codec: Codec,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            block_length: BLOCK_LENGTH_DEFAULT,
            codec: Codec::Null,
        }
    }
}

/// Durability policy applied after a file is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FsyncType {
    /// Force file contents to stable storage before closing.
    #[default]
    Fsync,
    /// Skip the sync.
    Fast,
}

impl FsyncType {
    /// `"fast"` selects [`FsyncType::Fast`]; anything else is [`FsyncType::Fsync`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "fast" => Self::Fast,
            _ => Self::Fsync,
        }
    }

    fn apply(self, file: &File, path: &Path) -> Result<()> {
        match self {
            Self::Fsync => file.sync_all().map_err(|e| Error::io(path, e)),
            Self::Fast => Ok(()),
        }
    }
}

/// Writes records to individual container files.
pub struct RecordWriter {
    schema: Schema,
    config: EncodeConfig,
    codec: apache_avro::Codec,
    fsync: FsyncType,
}

impl RecordWriter {
    /// Build a writer for the given output schema.
    ///
    /// # Errors
    /// Returns a configuration error if the schema does not parse, the block length is
    /// zero, or the codec is unavailable.
    pub fn new(schema_text: &str, config: EncodeConfig, fsync: FsyncType) -> Result<Self> {
        let schema = Schema::parse_str(schema_text)
            .map_err(|e| Error::config(format!("parse output schema: {e}")))?;
        Self::with_schema(schema, config, fsync)
    }

    /// Build a writer from an already parsed schema.
    pub fn with_schema(schema: Schema, config: EncodeConfig, fsync: FsyncType) -> Result<Self> {
        if config.block_length == 0 {
            return Err(Error::config("block length must be at least 1"));
        }
        let codec = config.codec.to_avro()?;
        Ok(Self {
            schema,
            config,
            codec,
            fsync,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn config(&self) -> EncodeConfig {
        self.config
    }

    #[must_use]
    pub fn fsync(&self) -> FsyncType {
        self.fsync
    }

    /// Write exactly `record` into a new file at `path`.
    pub fn write(&self, record: &Record, path: &Path) -> Result<()> {
        self.write_all(std::iter::once(record), path).map(|_| ())
    }

    /// Write `records` into a new container file at `path`, returning how many were written.
    ///
    /// The encoder flushes a block every `block_length` records and once more at the end.
    /// If encoding fails part way, the flush and sync still run and their failures are
    /// reported alongside the encode error.
    pub fn write_all<'r, I>(&self, records: I, path: &Path) -> Result<usize>
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut errors = Vec::new();
        let mut written = 0usize;
        {
            let mut writer = Writer::with_codec(&self.schema, &file, self.codec.clone());
            for record in records {
                if let Err(e) = writer.append_value_ref(record.as_value()) {
                    errors.push(Error::Encode(e));
                    break;
                }
                written += 1;
                if written % self.config.block_length == 0
                    && let Err(e) = writer.flush()
                {
                    errors.push(Error::Encode(e));
                    break;
                }
            }
            if let Err(e) = writer.flush() {
                errors.push(Error::Encode(e));
            }
        }
        if let Err(e) = self.fsync.apply(&file, path) {
            errors.push(e);
        }
        drop(file);
        match Error::join(errors) {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }

    /// [`RecordWriter::write`] as a deferred effect.
    pub fn write_io<'a>(&'a self, record: &'a Record, path: PathBuf) -> Io<'a, PathBuf> {
        Io::new(move |ctx| {
            ctx.check()?;
            self.write(record, &path)?;
            Ok(path)
        })
    }
}
