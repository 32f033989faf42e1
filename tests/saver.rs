use anyhow::Result;
use apache_avro::types::Value;
use keyshard::testing::*;
use keyshard::{
    CancelHandle, Context, DecodeConfig, EncodeConfig, Error, ErrorKind, Extractor, FsyncType,
    PathDeriver, PrimaryKey, Record, RecordSource, RecordWriter, Saver, StringKeyWriter, decode,
};

fn saver(dir: &TempDirPath) -> Saver {
    let writer = RecordWriter::new(SAMPLE_SCHEMA, EncodeConfig::default(), FsyncType::Fast)
        .unwrap();
    Saver::new(PathDeriver::with_default_extension(dir.path()), writer)
}

fn run_all<S: RecordSource>(saver: &Saver, source: S, ctx: &Context) -> keyshard::Result<usize> {
    let extractor = Extractor::new("id");
    let key_writer = StringKeyWriter::default();
    saver
        .save_all(source, &extractor, &key_writer)
        .run(ctx)
        .map(|summary| summary.records)
}

/// Cancels its context when the `at`-th record is pulled.
struct CancelOnPull<S> {
    inner: S,
    handle: CancelHandle,
    at: usize,
    pulled: usize,
}

impl<S: RecordSource> RecordSource for CancelOnPull<S> {
    fn next_record(&mut self) -> Option<keyshard::Result<&Record>> {
        self.pulled += 1;
        if self.pulled == self.at {
            self.handle.cancel();
        }
        self.inner.next_record()
    }
}

#[test]
fn test_save_single_record() -> Result<()> {
    let dir = TempDirPath::new()?;
    let saver = saver(&dir);
    let record = sample_record(1, "a");

    let path = saver
        .save(PrimaryKey::Int(1), &StringKeyWriter::default(), &record)
        .run(&Context::background())?;

    assert_eq!(path, dir.file_path("00000001.avro"));
    assert_eq!(read_container(&path)?, vec![record]);
    Ok(())
}

#[test]
fn test_one_file_per_record() -> Result<()> {
    let dir = TempDirPath::new()?;
    let records = vec![sample_record(1, "a"), sample_record(2, "b")];
    let bytes = container_bytes(SAMPLE_SCHEMA, &records, false)?;

    let n = run_all(
        &saver(&dir),
        decode(&bytes[..], &DecodeConfig::default()),
        &Context::background(),
    )?;

    assert_eq!(n, 2);
    assert_eq!(dir.file_names()?, vec!["00000001.avro", "00000002.avro"]);
    assert_eq!(read_container(dir.file_path("00000001.avro"))?, vec![records[0].clone()]);
    assert_eq!(read_container(dir.file_path("00000002.avro"))?, vec![records[1].clone()]);
    Ok(())
}

#[test]
fn test_empty_stream_writes_nothing() -> Result<()> {
    let dir = TempDirPath::new()?;
    let bytes = container_bytes(SAMPLE_SCHEMA, &[], false)?;
    let n = run_all(
        &saver(&dir),
        decode(&bytes[..], &DecodeConfig::default()),
        &Context::background(),
    )?;
    assert_eq!(n, 0);
    assert!(dir.file_names()?.is_empty());
    Ok(())
}

#[test]
fn test_shared_key_overwrites() -> Result<()> {
    let dir = TempDirPath::new()?;
    let records = vec![sample_record(5, "old"), sample_record(5, "new")];
    let n = run_all(
        &saver(&dir),
        VecRecordSource::from_records(records.clone()),
        &Context::background(),
    )?;
    assert_eq!(n, 2);
    assert_eq!(dir.file_names()?, vec!["00000005.avro"]);
    assert_eq!(read_container(dir.file_path("00000005.avro"))?, vec![records[1].clone()]);
    Ok(())
}

#[test]
fn test_missing_key_field_writes_nothing() -> Result<()> {
    let dir = TempDirPath::new()?;
    let record = Record::new(vec![("x".to_string(), Value::String("a".to_string()))]);
    let err = run_all(
        &saver(&dir),
        VecRecordSource::from_records(vec![record]),
        &Context::background(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidKey));
    assert!(dir.file_names()?.is_empty());
    Ok(())
}

#[test]
fn test_short_bytes_key_writes_nothing() -> Result<()> {
    let dir = TempDirPath::new()?;
    let record = keyed_record(Value::Bytes(vec![7; 15]), "a");
    let err = run_all(
        &saver(&dir),
        VecRecordSource::from_records(vec![record]),
        &Context::background(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidKey);
    assert!(dir.file_names()?.is_empty());
    Ok(())
}

#[test]
fn test_decode_error_keeps_earlier_files() -> Result<()> {
    let dir = TempDirPath::new()?;
    let records = vec![sample_record(1, "a"), sample_record(2, "b")];
    let mut bytes = container_bytes(SAMPLE_SCHEMA, &records, true)?;
    bytes.truncate(bytes.len() - 4);

    let err = run_all(
        &saver(&dir),
        decode(&bytes[..], &DecodeConfig::default()),
        &Context::background(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(dir.file_names()?, vec!["00000001.avro"]);
    Ok(())
}

#[test]
fn test_first_failure_stops_the_run() -> Result<()> {
    let dir = TempDirPath::new()?;
    let mut source = VecRecordSource::new(vec![
        Ok(sample_record(1, "a")),
        Ok(sample_record(2, "b")),
        Err(Error::NotARecord { found: "int" }),
        Ok(sample_record(4, "d")),
    ]);

    let err = run_all(&saver(&dir), &mut source, &Context::background()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(source.pulled(), 3);
    assert_eq!(source.remaining(), 1);
    assert_eq!(dir.file_names()?, vec!["00000001.avro", "00000002.avro"]);
    Ok(())
}

#[test]
fn test_invalid_key_stops_before_later_records() -> Result<()> {
    let dir = TempDirPath::new()?;
    let mut source = VecRecordSource::from_records(vec![
        sample_record(1, "a"),
        keyed_record(Value::Null, "b"),
        sample_record(3, "c"),
    ]);

    let err = run_all(&saver(&dir), &mut source, &Context::background()).unwrap_err();

    assert!(matches!(err, Error::InvalidKey));
    assert_eq!(source.remaining(), 1);
    assert_eq!(dir.file_names()?, vec!["00000001.avro"]);
    Ok(())
}

#[test]
fn test_write_error_stops_the_run() -> Result<()> {
    let dir = TempDirPath::new()?;
    let writer = RecordWriter::new(SAMPLE_SCHEMA, EncodeConfig::default(), FsyncType::Fast)?;
    let saver = Saver::new(
        PathDeriver::with_default_extension(dir.file_path("missing")),
        writer,
    );
    let mut source = VecRecordSource::from_records(vec![sample_record(1, "a"), sample_record(2, "b")]);

    let err = run_all(&saver, &mut source, &Context::background()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Write);
    assert_eq!(source.pulled(), 1);
    Ok(())
}

#[test]
fn test_cancelled_before_start_writes_nothing() -> Result<()> {
    let dir = TempDirPath::new()?;
    let (ctx, handle) = Context::background().with_cancel();
    handle.cancel();
    let mut source = VecRecordSource::from_records(vec![sample_record(1, "a")]);

    let err = run_all(&saver(&dir), &mut source, &ctx).unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(source.pulled(), 0);
    assert!(dir.file_names()?.is_empty());
    Ok(())
}

#[test]
fn test_cancellation_mid_run() -> Result<()> {
    let dir = TempDirPath::new()?;
    let (ctx, handle) = Context::background().with_cancel();
    let source = CancelOnPull {
        inner: VecRecordSource::from_records((1..=5).map(|i| sample_record(i, "x")).collect()),
        handle,
        at: 2,
        pulled: 0,
    };

    let err = run_all(&saver(&dir), source, &ctx).unwrap_err();

    assert!(err.is_cancellation());
    assert_eq!(dir.file_names()?, vec!["00000001.avro"]);
    Ok(())
}

#[test]
fn test_expired_deadline_writes_nothing() -> Result<()> {
    let dir = TempDirPath::new()?;
    let ctx = Context::background().with_timeout(std::time::Duration::ZERO);
    let err = run_all(
        &saver(&dir),
        VecRecordSource::from_records(vec![sample_record(1, "a")]),
        &ctx,
    )
    .unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded));
    assert!(dir.file_names()?.is_empty());
    Ok(())
}

#[test]
fn test_save_all_is_deferred() -> Result<()> {
    let dir = TempDirPath::new()?;
    let saver = saver(&dir);
    let extractor = Extractor::new("id");
    let key_writer = StringKeyWriter::default();
    let mut source = VecRecordSource::from_records(vec![sample_record(1, "a")]);

    let io = saver.save_all(&mut source, &extractor, &key_writer);
    assert!(dir.file_names()?.is_empty());
    let summary = io.run(&Context::background())?;

    assert_eq!(summary.records, 1);
    assert_eq!(source.pulled(), 1);
    Ok(())
}

#[test]
fn test_every_key_kind_through_a_container() -> Result<()> {
    let day = "2023-11-14.avro".to_string();
    let cases = [
        (r#""int""#, Value::Int(1), "00000001.avro".to_string()),
        (r#""long""#, Value::Long(1), "0000000000000001.avro".to_string()),
        (
            r#"["null", "long"]"#,
            Value::Union(1, Box::new(Value::Long(-1))),
            "ffffffffffffffff.avro".to_string(),
        ),
        (
            r#"{"type": "int", "logicalType": "date"}"#,
            Value::Date(19_675),
            day.clone(),
        ),
        (
            r#"{"type": "long", "logicalType": "timestamp-millis"}"#,
            Value::TimestampMillis(1_700_000_000_000),
            day.clone(),
        ),
        (
            r#"{"type": "long", "logicalType": "timestamp-nanos"}"#,
            Value::TimestampNanos(1_700_000_000_000_000_000),
            day.clone(),
        ),
        (
            r#"{"type": "long", "logicalType": "local-timestamp-micros"}"#,
            Value::LocalTimestampMicros(1_700_000_000_000_000),
            day,
        ),
        (
            r#"{"type": "string", "logicalType": "uuid"}"#,
            Value::Uuid(uuid::Uuid::from_bytes([0xab; 16])),
            format!("{}.avro", "ab".repeat(16)),
        ),
        (
            r#"{"type": "fixed", "name": "Id", "size": 16}"#,
            Value::Fixed(16, vec![0x01; 16]),
            format!("{}.avro", "01".repeat(16)),
        ),
        (
            r#""bytes""#,
            Value::Bytes(vec![0x02; 16]),
            format!("{}.avro", "02".repeat(16)),
        ),
    ];

    for (key_type, key, expected) in cases {
        let dir = TempDirPath::new()?;
        let schema = schema_with_key(key_type);
        let record = keyed_record(key, "payload");
        let bytes = container_bytes(&schema, std::slice::from_ref(&record), false)?;
        let writer = RecordWriter::new(&schema, EncodeConfig::default(), FsyncType::Fast)?;
        let saver = Saver::new(PathDeriver::with_default_extension(dir.path()), writer);

        let n = run_all(
            &saver,
            decode(&bytes[..], &DecodeConfig::default()),
            &Context::background(),
        )?;

        assert_eq!(n, 1, "{key_type}");
        assert_eq!(dir.file_names()?, vec![expected.clone()], "{key_type}");
        assert_eq!(read_container(dir.file_path(&expected))?, vec![record], "{key_type}");
    }
    Ok(())
}
