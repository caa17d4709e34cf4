//! Byte codec behaviour tests.

use lexhuff::{ByteCodec, ByteCodecConfig, CodecError};
use lexhuff_core::BitReader;

const CORPUS: [&str; 4] = [
    "It was the best of times, it was the worst of times, it was the age of wisdom.",
    "It was the age of foolishness, it was the epoch of belief, it was the epoch of incredulity.",
    "It was the season of Light, it was the season of Darkness.",
    "It was the spring of hope, it was the winter of despair.",
];

fn payload_bits(stream: &[u8]) -> usize {
    BitReader::framed(stream).unwrap().remaining()
}

#[test]
fn test_compresses_excerpt() {
    let mut codec = ByteCodec::default();
    codec.learn(&CORPUS).unwrap();

    let excerpt = b"it was the worst of times";
    let encoded = codec.encode(excerpt).unwrap();
    assert!(payload_bits(&encoded) < excerpt.len() * 8);
    assert_eq!(codec.decode(&encoded).unwrap(), excerpt);
}

#[test]
fn test_untrained_bytes_use_escape() {
    let mut codec = ByteCodec::default();
    codec.learn(&CORPUS).unwrap();
    let tree = codec.code_tree().unwrap();
    let escape = tree.escape_code().unwrap();

    assert!(tree.code(u32::from(b'Z')).is_none());
    let encoded = codec.encode(b"Z").unwrap();
    assert_eq!(payload_bits(&encoded), escape.len as usize + 8);
    assert_eq!(codec.decode(&encoded).unwrap(), b"Z");
}

#[test]
fn test_every_byte_roundtrips() {
    let mut codec = ByteCodec::default();
    codec.learn(&CORPUS).unwrap();

    let all: Vec<u8> = (0..=u8::MAX).rev().collect();
    let encoded = codec.encode(&all).unwrap();
    assert_eq!(codec.decode(&encoded).unwrap(), all);
}

#[test]
fn test_sequential_and_parallel_training_agree() {
    let mut parallel = ByteCodec::default();
    parallel.learn(&CORPUS).unwrap();

    let mut sequential = ByteCodec::new(ByteCodecConfig {
        parallel: false,
        ..Default::default()
    })
    .unwrap();
    sequential.learn(&CORPUS).unwrap();

    assert_eq!(
        parallel.code_tree().unwrap().codes(),
        sequential.code_tree().unwrap().codes()
    );
}

#[test]
fn test_invalid_code_path() {
    let mut codec = ByteCodec::default();
    let empty: [&[u8]; 0] = [];
    codec.learn(&empty).unwrap();

    // Only the all-zero escape path exists, so a leading one bit is invalid.
    assert!(matches!(
        codec.decode(&[0x80, 7]),
        Err(CodecError::MalformedStream(_))
    ));
}

#[test]
fn test_model_roundtrip() {
    let mut a = ByteCodec::with_max_code_length(12).unwrap();
    a.learn(&CORPUS).unwrap();

    let mut b = ByteCodec::default();
    b.load(&a.save().unwrap()).unwrap();

    assert_eq!(b.config().max_code_length, 12);
    for line in CORPUS {
        assert_eq!(
            a.encode(line.as_bytes()).unwrap(),
            b.encode(line.as_bytes()).unwrap()
        );
    }
}

#[test]
fn test_corrupt_model() {
    let mut codec = ByteCodec::default();
    // Three one-bit codes cannot coexist with an escape.
    let mut model = vec![0u8; 256];
    model[b'a' as usize] = 1;
    model[b'b' as usize] = 1;
    model[b'c' as usize] = 1;
    let lengths: Vec<u32> = model.iter().map(|&l| u32::from(l)).collect();
    let blob = lexhuff::io::write_byte_model(9, &lengths).unwrap();

    assert!(matches!(
        codec.load(&blob),
        Err(CodecError::MalformedModel(_))
    ));
    assert!(!codec.is_trained());
}

#[test]
fn test_batch() {
    let mut codec = ByteCodec::default();
    codec.learn(&CORPUS).unwrap();

    let encoded = codec.encode_batch(&CORPUS).unwrap();
    let decoded = codec.decode_batch(&encoded).unwrap();
    for (line, record) in CORPUS.iter().zip(decoded) {
        assert_eq!(line.as_bytes(), record.as_slice());
    }
}
