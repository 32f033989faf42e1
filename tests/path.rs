use keyshard::testing::RecordingKeyWriter;
use keyshard::{Context, Error, INVALID_KEY, PathDeriver, PrimaryKey, StringKeyWriter};
use std::path::PathBuf;

#[test]
fn test_derive_joins_root_key_and_extension() {
    let paths = PathDeriver::with_default_extension("/data/out");
    let path = paths
        .derive(PrimaryKey::Int(1), &StringKeyWriter::default())
        .run(&Context::background())
        .unwrap();
    assert_eq!(path, PathBuf::from("/data/out/00000001.avro"));
}

#[test]
fn test_custom_extension() {
    let paths = PathDeriver::new("out", "bin");
    assert_eq!(paths.extension(), "bin");
    let path = paths
        .derive(PrimaryKey::Long(-1), &StringKeyWriter::default())
        .run(&Context::background())
        .unwrap();
    assert_eq!(path, PathBuf::from("out/ffffffffffffffff.bin"));
}

#[test]
fn test_stages() {
    let paths = PathDeriver::new("root", "avro");
    let ctx = Context::background();
    let name = paths.with_extension("abc".to_string()).run(&ctx).unwrap();
    assert_eq!(name, "abc.avro");
    assert_eq!(paths.join(name).run(&ctx).unwrap(), PathBuf::from("root/abc.avro"));
}

#[test]
fn test_invalid_key_yields_no_path() {
    let paths = PathDeriver::with_default_extension("out");
    let err = paths
        .derive(INVALID_KEY, &StringKeyWriter::default())
        .run(&Context::background())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidKey));
}

#[test]
fn test_derive_uses_the_supplied_writer() {
    let paths = PathDeriver::new("out", "avro");
    let writer = RecordingKeyWriter::new();
    let path = paths
        .derive(PrimaryKey::Short(7), &writer)
        .run(&Context::background())
        .unwrap();
    assert_eq!(path, PathBuf::from("out/short:7.avro"));
    assert_eq!(writer.calls(), vec!["short"]);
}
