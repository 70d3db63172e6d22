//! nidl-compiler
//!
//! This crate implements:
//!  1) The semantic type table (`idltypes`),
//!  2) An indentation-aware text emitter (`filewriter`),
//!  3) Schema documents with dependency merging (`document`),
//!  4) Model builders for enums, attributes, components, structs, properties
//!     and messages, resolved in two passes (`model`),
//!  5) C++ header, C++ source and C# backends (`backend`),
//!  6) The generation driver with atomic output (`generator`),
//!  7) Error types (`NidlError`).

pub mod error;
pub mod types;
pub mod utils;
pub mod idltypes;
pub mod filewriter;
pub mod document;
pub mod property;
pub mod component;
pub mod attribute;
pub mod protocol;
pub mod enums;
pub mod model;
pub mod verifier;
pub mod backend;
pub mod generator;

pub use document::{DependencyCache, DependencyOverlay, Document, MergePolicy, DEFAULT_NAMESPACE};
pub use error::NidlError;
pub use filewriter::FileWriter;
pub use generator::{
    parse_version_stamp, read_version_stamp, Generator, GeneratorOptions, GeneratorState, GENERATOR_VERSION,
};
pub use model::{build_model, build_model_from_str, ModelBuilder};
pub use types::Model;
