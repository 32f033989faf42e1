//! Turning an encoded primary key into an output file path.
//!
//! A path is `<root>/<key>.<extension>`. Each stage is its own effect and the stages are
//! chained with [`Io::bind`], so a failing stage (typically the key itself) aborts derivation
//! and no partial path is ever produced.

use crate::effect::{Io, of_fn};
use crate::key::{PrimaryKey, PrimaryKeyWriter};
use std::path::PathBuf;

/// Default output file extension.
pub const EXTENSION_DEFAULT: &str = "avro";

/// Derives `<root>/<key>.<extension>` paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathDeriver {
    root: PathBuf,
    extension: String,
}

impl PathDeriver {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// A deriver using the default `avro` extension.
    #[must_use]
    pub fn with_default_extension(root: impl Into<PathBuf>) -> Self {
        Self::new(root, EXTENSION_DEFAULT)
    }

    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Encode `key` with `writer`.
    pub fn basename<'w, W>(&self, key: PrimaryKey, writer: &'w W) -> Io<'w, String>
    where
        W: PrimaryKeyWriter + ?Sized,
    {
        key.encode(writer)
    }

    /// Append `.<extension>` to `basename`.
    pub fn with_extension(&self, basename: String) -> Io<'_, String> {
        of_fn(move || {
            let mut name = basename;
            name.reserve(self.extension.len() + 1);
            name.push('.');
            name.push_str(&self.extension);
            name
        })
    }

    /// Join `file_name` onto the root directory.
    pub fn join(&self, file_name: String) -> Io<'_, PathBuf> {
        of_fn(move || self.root.join(file_name))
    }

    /// Full derivation: encode, add the extension, join onto the root.
    pub fn derive<'a, W>(&'a self, key: PrimaryKey, writer: &'a W) -> Io<'a, PathBuf>
    where
        W: PrimaryKeyWriter + ?Sized,
    {
        self.basename(key, writer)
            .bind(move |basename| self.with_extension(basename))
            .bind(move |file_name| self.join(file_name))
    }
}
