//! Container I/O: the record buffer, the decoder, the per-record file writer, and output
//! path derivation.

pub mod decode;
pub mod encode;
pub mod path;
pub mod record;

pub use decode::{AvroRecordStream, DecodeConfig, RecordSource, decode};
pub use encode::{Codec, EncodeConfig, FsyncType, RecordWriter};
pub use path::PathDeriver;
pub use record::Record;
