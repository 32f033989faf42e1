use anyhow::Result;
use apache_avro::types::Value;
use apache_avro::{Schema, Writer};
use keyshard::testing::*;
use keyshard::{DecodeConfig, Error, ErrorKind, Record, RecordSource, decode};

fn drain<S: RecordSource>(mut source: S) -> Vec<keyshard::Result<Record>> {
    let mut out = Vec::new();
    while let Some(item) = source.next_record() {
        out.push(item.cloned());
    }
    out
}

#[test]
fn test_decode_yields_records_in_order() -> Result<()> {
    let records = vec![sample_record(1, "a"), sample_record(2, "b"), sample_record(3, "c")];
    let bytes = container_bytes(SAMPLE_SCHEMA, &records, false)?;

    let mut stream = decode(&bytes[..], &DecodeConfig::default());
    let mut seen = Vec::new();
    while let Some(item) = stream.next_record() {
        seen.push(item?.clone());
    }
    assert_eq!(seen, records);
    assert_eq!(stream.decoded(), 3);
    assert!(stream.next_record().is_none());
    Ok(())
}

#[test]
fn test_buffer_is_refilled_for_each_record() -> Result<()> {
    let records = vec![sample_record(1, "first"), sample_record(2, "second")];
    let bytes = container_bytes(SAMPLE_SCHEMA, &records, true)?;
    let mut stream = decode(&bytes[..], &DecodeConfig::default());

    let first = stream.next_record().unwrap()?;
    assert_eq!(first.get("x"), Some(&Value::String("first".to_string())));
    assert_eq!(first.len(), 2);

    let second = stream.next_record().unwrap()?;
    assert_eq!(second.get("id"), Some(&Value::Int(2)));
    assert_eq!(second.len(), 2);
    Ok(())
}

#[test]
fn test_empty_container() -> Result<()> {
    let bytes = container_bytes(SAMPLE_SCHEMA, &[], false)?;
    let items = drain(decode(&bytes[..], &DecodeConfig::default()));
    assert!(items.is_empty());
    Ok(())
}

#[test]
fn test_bad_header_is_the_first_item() {
    let items = drain(decode(&b"definitely not avro"[..], &DecodeConfig::default()));
    assert_eq!(items.len(), 1);
    let err = items.into_iter().next().unwrap().unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn test_empty_input_is_a_decode_error() {
    let items = drain(decode(&[][..], &DecodeConfig::default()));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_ref().unwrap_err().kind(), ErrorKind::Decode);
}

#[test]
fn test_truncated_stream_ends_after_the_error() -> Result<()> {
    let records = vec![sample_record(1, "a"), sample_record(2, "b")];
    let mut bytes = container_bytes(SAMPLE_SCHEMA, &records, true)?;
    bytes.truncate(bytes.len() - 4);

    let items = drain(decode(&bytes[..], &DecodeConfig::default()));
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), &records[0]);
    assert_eq!(items[1].as_ref().unwrap_err().kind(), ErrorKind::Decode);
    Ok(())
}

#[test]
fn test_non_record_datum_is_rejected() -> Result<()> {
    let schema = Schema::parse_str(r#""int""#)?;
    let mut writer = Writer::new(&schema, Vec::new());
    writer.append(Value::Int(5))?;
    writer.append(Value::Int(6))?;
    let bytes = writer.into_inner()?;

    let items = drain(decode(&bytes[..], &DecodeConfig::default()));
    assert_eq!(items.len(), 1);
    let err = items.into_iter().next().unwrap().unwrap_err();
    assert!(matches!(err, Error::NotARecord { found: "int" }));
    Ok(())
}

#[test]
fn test_nothing_is_read_before_the_first_pull() {
    struct Exploding;
    impl std::io::Read for Exploding {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            panic!("read before first pull")
        }
    }
    let stream = decode(Exploding, &DecodeConfig::default());
    assert_eq!(stream.decoded(), 0);
}
