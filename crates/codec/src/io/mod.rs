//! Serialization and deserialization for codec models.
//!
//! This module provides the binary model formats and helpers for saving and
//! loading trained codecs on disk.

pub mod format;
pub mod load;
pub mod save;

pub use format::ModelFormat;
pub use load::{
    read_byte_model, read_length_tagged, read_probability_tagged, LengthTaggedModel, ModelLoader,
};
pub use save::{write_byte_model, write_length_tagged, write_probability_tagged, ModelSaver};
