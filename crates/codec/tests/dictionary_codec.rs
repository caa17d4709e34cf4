//! Dictionary codec behaviour tests.

use lexhuff::{CodecError, DictionaryCodec, DictionaryConfig, MiningConfig, ModelFormat};
use lexhuff_core::{BitPacker, BitReader, Code};

const LOG_LINES: [&str; 6] = [
    "2024-01-05 12:00:01 INFO  server started on port 8080",
    "2024-01-05 12:00:02 INFO  accepted connection from 10.0.0.7",
    "2024-01-05 12:00:02 WARN  slow request: GET /api/items took 512ms",
    "2024-01-05 12:00:03 INFO  accepted connection from 10.0.0.9",
    "2024-01-05 12:00:04 ERROR request failed: GET /api/items/42",
    "2024-01-05 12:00:05 INFO  closed connection from 10.0.0.7",
];

fn trained() -> DictionaryCodec {
    let mut codec = DictionaryCodec::default();
    codec.learn(&LOG_LINES).unwrap();
    codec
}

/// Re-frame the first `keep` bits of an encoded stream.
fn reframe(stream: &[u8], keep: usize) -> Vec<u8> {
    let mut reader = BitReader::framed(stream).unwrap();
    let mut packer = BitPacker::new();
    for _ in 0..keep {
        packer.append_bit(reader.read_bit().unwrap());
    }
    packer.into_framed()
}

fn payload_bits(stream: &[u8]) -> usize {
    BitReader::framed(stream).unwrap().remaining()
}

#[test]
fn test_roundtrip_training_records() {
    let codec = trained();
    for line in LOG_LINES {
        let encoded = codec.encode(line.as_bytes()).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), line.as_bytes());
    }
}

#[test]
fn test_roundtrip_unseen_records() {
    let codec = trained();
    let records: [&[u8]; 4] = [
        b"",
        b"x",
        b"2025-12-31 23:59:59 DEBUG \x00\x01\xfe\xff unexpected",
        "connexion refusée".as_bytes(),
    ];
    for record in records {
        let encoded = codec.encode(record).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), record);
    }
}

#[test]
fn test_compresses_similar_records() {
    let codec = trained();
    let record = b"2024-01-05 12:00:06 INFO  accepted connection from 10.0.0.8";
    let encoded = codec.encode(record).unwrap();
    assert!(payload_bits(&encoded) < record.len() * 8);
}

#[test]
fn test_codes_are_prefix_free() {
    let codec = trained();
    let codes: Vec<Code> = codec
        .code_tree()
        .unwrap()
        .codes()
        .iter()
        .copied()
        .filter(|code| !code.is_empty())
        .collect();

    assert!(codes.len() >= 256);
    for (i, a) in codes.iter().enumerate() {
        for b in &codes[i + 1..] {
            assert!(!a.is_prefix_of(b) && !b.is_prefix_of(a), "{} / {}", a, b);
        }
    }
}

#[test]
fn test_truncated_stream_is_reported() {
    let codec = trained();
    // A byte that never occurs in training gets one of the longest codes.
    let encoded = codec.encode(&[0x00]).unwrap();
    let bits = payload_bits(&encoded);
    assert!(bits >= 2);

    let truncated = reframe(&encoded, bits - 1);
    assert!(matches!(
        codec.decode(&truncated),
        Err(CodecError::MalformedStream(_))
    ));
}

#[test]
fn test_bad_framing_is_reported() {
    let codec = trained();
    let mut encoded = codec.encode(b"INFO").unwrap();
    if let Some(trailer) = encoded.last_mut() {
        *trailer = 9;
    }
    assert!(matches!(
        codec.decode(&encoded),
        Err(CodecError::MalformedStream(_))
    ));
}

#[test]
fn test_empty_training_set() {
    let mut codec = DictionaryCodec::default();
    let empty: [&[u8]; 0] = [];
    codec.learn(&empty).unwrap();

    // Only single bytes, all equally likely.
    assert_eq!(codec.dictionary().unwrap().len(), 256);
    let record = b"anything \x00\xff";
    let encoded = codec.encode(record).unwrap();
    assert_eq!(payload_bits(&encoded), record.len() * 8);
    assert_eq!(codec.decode(&encoded).unwrap(), record);
}

#[test]
fn test_repeated_byte_dictionary() {
    let config = DictionaryConfig {
        mining: MiningConfig {
            threshold: 0.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut codec = DictionaryCodec::new(config).unwrap();
    codec.learn(&["aaaa"]).unwrap();

    let dictionary = codec.dictionary().unwrap();
    for text in ["a", "aa", "aaa", "aaaa"] {
        assert!(dictionary.find(text.as_bytes()).is_some(), "missing {}", text);
    }

    let encoded = codec.encode(b"aaaaaaa").unwrap();
    assert_eq!(codec.decode(&encoded).unwrap(), b"aaaaaaa");
}

#[test]
fn test_model_roundtrip() {
    for format in [ModelFormat::LengthTagged, ModelFormat::ProbabilityTagged] {
        let mut a = DictionaryCodec::builder().format(format).build().unwrap();
        a.learn(&LOG_LINES).unwrap();

        let mut b = DictionaryCodec::builder().format(format).build().unwrap();
        b.load(&a.save().unwrap()).unwrap();

        for line in LOG_LINES {
            assert_eq!(
                a.encode(line.as_bytes()).unwrap(),
                b.encode(line.as_bytes()).unwrap(),
                "{}",
                format
            );
        }
        assert_eq!(b.save().unwrap(), a.save().unwrap());
    }
}

#[test]
fn test_format_mismatch_is_detected() {
    let mut a = DictionaryCodec::builder()
        .format(ModelFormat::ProbabilityTagged)
        .build()
        .unwrap();
    a.learn(&LOG_LINES).unwrap();

    let mut b = DictionaryCodec::default();
    assert!(b.load(&a.save().unwrap()).is_err());
    assert!(!b.is_trained());
}

#[test]
fn test_short_code_limit() {
    let mut codec = DictionaryCodec::builder().max_code_length(10).build().unwrap();
    codec.learn(&LOG_LINES).unwrap();

    // More substrings are mined than 10-bit codes can address.
    let stats = codec.stats().unwrap();
    assert!(stats.symbols <= 1 << 10);
    assert!(stats.longest_code <= 10);
    for line in LOG_LINES {
        let encoded = codec.encode(line.as_bytes()).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), line.as_bytes());
    }
}

#[test]
fn test_code_limit_below_byte_alphabet_is_rejected() {
    assert!(matches!(
        DictionaryCodec::builder().max_code_length(7).build(),
        Err(CodecError::InvalidConfig(_))
    ));

    let mut codec = DictionaryCodec::builder().max_code_length(8).build().unwrap();
    let empty: [&[u8]; 0] = [];
    codec.learn(&empty).unwrap();
    let encoded = codec.encode(b"log").unwrap();
    assert_eq!(payload_bits(&encoded), 24);
}
