//! Process configuration read from environment variables.
//!
//! Every setting is an effect over an [`EnvSource`]. Optional settings fall back to their
//! default with [`Io::or`] when the variable is absent; a variable that is present but
//! malformed is a configuration error, as is a missing required one.
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `ENV_BLOB_SIZE_MAX` | max decoded bytes/string size | 1048576 |
//! | `ENV_SCHEMA_FILENAME` | output schema file | required |
//! | `ENV_SCHEMA_SIZE_MAX` | max bytes read from the schema file | 1048576 |
//! | `ENV_CODEC_NAME` | block codec | `null` |
//! | `ENV_BLOCK_LENGTH` | records per block | 100 |
//! | `ENV_FSYNC_TYPE` | `fsync` or `fast` | `fsync` |
//! | `ENV_SAVE_DIRNAME_ROOT` | output root directory | required |
//! | `ENV_PKEY_NAME` | primary key field | required |
//! | `ENV_KEY_TIME_LAYOUT` | strftime layout for timestamp keys | `%Y-%m-%d` |
//! | `ENV_OUTPUT_EXTENSION` | output file extension | `avro` |
//! | `ENV_TIMEOUT_SECONDS` | run deadline | none |

use crate::effect::{Io, lift, of};
use crate::error::{Error, Result};
use crate::io::decode::{BLOB_SIZE_MAX_DEFAULT, DecodeConfig};
use crate::io::encode::{BLOCK_LENGTH_DEFAULT, Codec, EncodeConfig, FsyncType};
use crate::io::path::EXTENSION_DEFAULT;
use crate::key::string_writer::TIME_LAYOUT_DEFAULT;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BLOB_SIZE_MAX: &str = "ENV_BLOB_SIZE_MAX";
pub const ENV_SCHEMA_FILENAME: &str = "ENV_SCHEMA_FILENAME";
pub const ENV_SCHEMA_SIZE_MAX: &str = "ENV_SCHEMA_SIZE_MAX";
pub const ENV_CODEC_NAME: &str = "ENV_CODEC_NAME";
pub const ENV_BLOCK_LENGTH: &str = "ENV_BLOCK_LENGTH";
pub const ENV_FSYNC_TYPE: &str = "ENV_FSYNC_TYPE";
pub const ENV_SAVE_DIRNAME_ROOT: &str = "ENV_SAVE_DIRNAME_ROOT";
pub const ENV_PKEY_NAME: &str = "ENV_PKEY_NAME";
pub const ENV_KEY_TIME_LAYOUT: &str = "ENV_KEY_TIME_LAYOUT";
pub const ENV_OUTPUT_EXTENSION: &str = "ENV_OUTPUT_EXTENSION";
pub const ENV_TIMEOUT_SECONDS: &str = "ENV_TIMEOUT_SECONDS";

/// Default cap on bytes read from the schema file.
pub const SCHEMA_SIZE_MAX_DEFAULT: u64 = 1_048_576;

/// Where settings come from.
pub trait EnvSource {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Everything a run needs, resolved before the first record is read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub decode: DecodeConfig,
    pub encode: EncodeConfig,
    pub schema: String,
    pub fsync: FsyncType,
    pub root: PathBuf,
    pub key_field: String,
    pub time_layout: String,
    pub extension: String,
    pub timeout: Option<Duration>,
}

/// The value of `key`, failing with a configuration error if it is unset.
pub fn env_var<'a, E>(env: &'a E, key: &'static str) -> Io<'a, String>
where
    E: EnvSource + ?Sized,
{
    Io::new(move |_| {
        env.lookup(key)
            .ok_or_else(|| Error::config(format!("env var {key} missing")))
    })
}

/// The value of `key`, or `None` if it is unset.
pub fn env_var_opt<'a, E>(env: &'a E, key: &'static str) -> Io<'a, Option<String>>
where
    E: EnvSource + ?Sized,
{
    env_var(env, key).map(Some).or(of(None))
}

fn parse_number<T>(key: &'static str) -> impl Fn(Option<String>) -> Result<Option<T>> + Clone
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    move |raw| {
        raw.map(|s| {
            s.trim()
                .parse::<T>()
                .map_err(|e| Error::config(format!("env var {key}={s:?}: {e}")))
        })
        .transpose()
    }
}

/// An optional numeric setting with a default.
fn number_or<'a, E, T>(env: &'a E, key: &'static str, default: T) -> Io<'a, T>
where
    E: EnvSource + ?Sized,
    T: std::str::FromStr + 'a,
    T::Err: std::fmt::Display,
{
    env_var_opt(env, key)
        .bind(lift(parse_number::<T>(key)))
        .map(move |v| v.unwrap_or(default))
}

/// An optional string setting with a default.
fn string_or<'a, E>(env: &'a E, key: &'static str, default: &'static str) -> Io<'a, String>
where
    E: EnvSource + ?Sized,
{
    env_var(env, key).or(of(default.to_string()))
}

/// Read at most `limit` bytes of `path` as UTF-8.
///
/// Bytes past the limit are not read, so an oversized file yields a truncated string. An
/// unreadable file is a configuration error.
pub fn read_file_limited<'a>(path: PathBuf, limit: u64) -> Io<'a, String> {
    Io::new(move |_| {
        let unreadable = |e: std::io::Error| Error::config(format!("read {}: {e}", path.display()));
        let f = File::open(&path).map_err(unreadable)?;
        let mut buf = String::new();
        f.take(limit).read_to_string(&mut buf).map_err(unreadable)?;
        Ok(buf)
    })
}

fn positive(key: &'static str) -> impl Fn(usize) -> Result<usize> + Clone {
    move |n| match n {
        0 => Err(Error::config(format!("env var {key} must be at least 1"))),
        n => Ok(n),
    }
}

pub fn decode_config<E: EnvSource + ?Sized>(env: &E) -> Io<'_, DecodeConfig> {
    number_or(env, ENV_BLOB_SIZE_MAX, BLOB_SIZE_MAX_DEFAULT)
        .map(|blob_size_max| DecodeConfig { blob_size_max })
}

pub fn encode_config<E: EnvSource + ?Sized>(env: &E) -> Io<'_, EncodeConfig> {
    let codec = env_var(env, ENV_CODEC_NAME)
        .map(|name| Codec::from_name(name.trim()))
        .or(of(Codec::Null));
    codec.bind(move |codec| {
        number_or(env, ENV_BLOCK_LENGTH, BLOCK_LENGTH_DEFAULT)
            .bind(lift(positive(ENV_BLOCK_LENGTH)))
            .map(move |block_length| EncodeConfig {
                block_length,
                codec,
            })
    })
}

pub fn schema<E: EnvSource + ?Sized>(env: &E) -> Io<'_, String> {
    number_or(env, ENV_SCHEMA_SIZE_MAX, SCHEMA_SIZE_MAX_DEFAULT).bind(move |limit| {
        env_var(env, ENV_SCHEMA_FILENAME)
            .bind(move |name| read_file_limited(PathBuf::from(name), limit))
    })
}

pub fn fsync_type<E: EnvSource + ?Sized>(env: &E) -> Io<'_, FsyncType> {
    string_or(env, ENV_FSYNC_TYPE, "fsync").map(|name| FsyncType::from_name(name.trim()))
}

pub fn timeout<E: EnvSource + ?Sized>(env: &E) -> Io<'_, Option<Duration>> {
    env_var_opt(env, ENV_TIMEOUT_SECONDS)
        .bind(lift(parse_number::<u64>(ENV_TIMEOUT_SECONDS)))
        .map(|secs| secs.map(Duration::from_secs))
}

impl Settings {
    /// Resolve every setting from `env`. Fails on the first bad or missing one.
    pub fn load<E: EnvSource + ?Sized>(env: &E) -> Io<'_, Settings> {
        decode_config(env).bind(move |decode| {
            encode_config(env).bind(move |encode| {
                schema(env).bind(move |schema| {
                    fsync_type(env).bind(move |fsync| {
                        env_var(env, ENV_SAVE_DIRNAME_ROOT).bind(move |root| {
                            env_var(env, ENV_PKEY_NAME).bind(move |key_field| {
                                string_or(env, ENV_KEY_TIME_LAYOUT, TIME_LAYOUT_DEFAULT).bind(
                                    move |time_layout| {
                                        string_or(env, ENV_OUTPUT_EXTENSION, EXTENSION_DEFAULT)
                                            .bind(move |extension| {
                                                timeout(env).map(move |timeout| Settings {
                                                    decode,
                                                    encode,
                                                    schema,
                                                    fsync,
                                                    root: PathBuf::from(root),
                                                    key_field,
                                                    time_layout,
                                                    extension,
                                                    timeout,
                                                })
                                            })
                                    },
                                )
                            })
                        })
                    })
                })
            })
        })
    }
}
