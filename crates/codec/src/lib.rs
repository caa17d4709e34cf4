//! Lexhuff - Static Huffman codecs for batches of similar records
//!
//! This crate provides two codecs that are trained once on sample records
//! and then reused to compress many short records with shared structure,
//! such as log lines.
//!
//! # Features
//!
//! - `DictionaryCodec`: mines frequent substrings and Huffman-codes them
//! - `ByteCodec`: Huffman-codes single bytes with an escape for unseen bytes
//! - Compact binary model formats and file helpers
//! - Parallel batch encoding and decoding
//!
//! # Example
//!
//! ```rust
//! use lexhuff::DictionaryCodec;
//!
//! let mut codec = DictionaryCodec::builder().max_code_length(24).build()?;
//! codec.learn(&["GET /index.html 200", "GET /about.html 200"])?;
//!
//! let encoded = codec.encode(b"GET /index.html 404")?;
//! assert_eq!(codec.decode(&encoded)?, b"GET /index.html 404");
//! # Ok::<(), lexhuff::CodecError>(())
//! ```

// Re-export core types
pub use lexhuff_core::{CodecError, Dictionary, DictionaryEntry, Result};
pub use lexhuff_training::MiningConfig;

// Codecs
pub mod codec;
pub use codec::{
    ByteCodec, ByteCodecConfig, Codec, DictionaryCodec, DictionaryCodecBuilder, DictionaryConfig,
    ModelStats,
};

// IO/Serialization
pub mod io;
pub use io::{ModelFormat, ModelLoader, ModelSaver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
