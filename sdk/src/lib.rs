//! nidl
//!
//! One-stop crate for tools that drive the NIDL schema compiler.
//!
//! - The generator driver and its options (re-exported from the compiler)
//! - SJSON values and the parser (re-exported from the schema crate)
//! - Helpers for dumping a merged schema or its model as JSON or SJSON

use std::path::Path;

pub use nidl_compiler::error::NidlError;
pub use nidl_compiler::{
    build_model, parse_version_stamp, read_version_stamp, Document, Generator, GeneratorOptions, GeneratorState,
    MergePolicy, Model, GENERATOR_VERSION,
};
pub use nidl_schema::{Map, SjsonError, Value};

/// Output format of the dump helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    Json,
    Sjson,
}

/// Load `path`, merge its dependencies and build the model.
pub fn load(path: &Path, options: GeneratorOptions) -> Result<(Document, Model), NidlError> {
    Generator::new(path, options).inspect()
}

/// The merged schema document.
pub fn dump_document(path: &Path, options: GeneratorOptions, format: DumpFormat) -> Result<String, NidlError> {
    let (document, _) = load(path, options)?;
    render(document.root(), format)
}

/// The intermediate model built from the merged document.
pub fn dump_model(path: &Path, options: GeneratorOptions, format: DumpFormat) -> Result<String, NidlError> {
    let (_, model) = load(path, options)?;
    let json = serde_json::to_value(&model).map_err(|e| NidlError::Emit(e.to_string()))?;
    match from_json(json) {
        Value::Object(map) => render(&map, format),
        other => Err(NidlError::Emit(format!("model serialized as {}", other.kind()))),
    }
}

/// Shorthand for [`dump_model`] as pretty JSON with default options.
pub fn model_to_json(path: &Path) -> Result<String, NidlError> {
    dump_model(path, GeneratorOptions::default(), DumpFormat::Json)
}

fn render(root: &Map, format: DumpFormat) -> Result<String, NidlError> {
    match format {
        DumpFormat::Json => serde_json::to_string_pretty(root).map_err(|e| NidlError::Emit(e.to_string())),
        DumpFormat::Sjson => nidl_schema::to_sjson_string(root, "    ").map_err(|e| NidlError::Emit(e.to_string())),
    }
}

/// Convert a `serde_json` value, keeping object key order as serialized.
pub fn from_json(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(0.0)),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Array(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(entries) => {
            Value::Object(entries.into_iter().map(|(k, v)| (k, from_json(v))).collect())
        }
    }
}

pub mod error {
    pub use nidl_compiler::error::NidlError;
    pub use nidl_schema::SjsonError;
}

pub mod schema {
    pub use nidl_schema::{parse, to_sjson_string, Map, Value};
}
