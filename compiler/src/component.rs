//! Components, structs and properties.
//!
//! An entry is one of:
//!  1) a bare type name, giving a single field called `value`,
//!  2) the bare type `"flag"`, giving a zero-field presence tag,
//!  3) an object with a `type` key, giving a single field with metadata,
//!  4) an object without `type`, giving a multi-field struct. Keys starting
//!     with `_` are reserved for struct options.

use std::collections::HashMap;

use nidl_schema::{Map, Value};

use crate::{
    error::NidlError,
    idltypes,
    model::NameTable,
    property::{optional_bool, optional_fourcc, optional_string, parse_field, type_token},
    types::{AggregateDecl, AggregateKind, FieldDecl},
    utils::quote,
};

/// Field name of single-field aggregates.
pub const SINGLE_FIELD_NAME: &str = "value";

const SINGLE_FIELD_KEYS: [&str; 5] = ["type", "default", "description", "hideInInspector", "fourcc"];

pub(crate) fn parse_aggregate(
    kind: AggregateKind,
    name: &str,
    entry: &Value,
    names: &NameTable,
) -> Result<AggregateDecl, NidlError> {
    match *entry {
        Value::String(ref token) if idltypes::is_flag(token) => Ok(flag_marker(kind, name, None, None)),
        Value::String(_) => {
            let field = parse_field(name, SINGLE_FIELD_NAME, entry, names)?;
            Ok(single_field(kind, name, field, None, None))
        }
        Value::Object(ref map) if map.contains_key("type") => parse_single(kind, name, map, names),
        Value::Object(ref map) => parse_struct(kind, name, map, names),
        ref other => Err(NidlError::validation(
            name,
            format!("expected a type name or an object, found {}", other.kind()),
        )),
    }
}

fn parse_single(kind: AggregateKind, name: &str, map: &Map, names: &NameTable) -> Result<AggregateDecl, NidlError> {
    if let Some(key) = map.keys().find(|k| !SINGLE_FIELD_KEYS.contains(k)) {
        return Err(NidlError::validation(name, format!("unknown key {}", quote(key))));
    }
    let fourcc = optional_fourcc(name, map, "fourcc")?;
    let description = optional_string(name, map, "description")?;
    if idltypes::is_flag(type_token(name, map)?) {
        return Ok(flag_marker(kind, name, fourcc, description));
    }

    // The field itself takes everything but the aggregate-level tag.
    let field_entry: Map = map
        .iter()
        .filter(|(k, _)| *k != "fourcc")
        .map(|(k, v)| (k, v.clone()))
        .collect();
    let field = parse_field(name, SINGLE_FIELD_NAME, &Value::Object(field_entry), names)?;
    Ok(single_field(kind, name, field, fourcc, description))
}

fn parse_struct(kind: AggregateKind, name: &str, map: &Map, names: &NameTable) -> Result<AggregateDecl, NidlError> {
    let mut fields: Vec<FieldDecl> = Vec::new();
    let mut seen: HashMap<String, String> = HashMap::new();

    for (field_name, entry) in map.iter() {
        if field_name.starts_with('_') {
            check_reserved_key(name, field_name)?;
            continue;
        }
        let entity = format!("{}.{}", name, field_name);
        if let Some(previous) = seen.insert(field_name.to_ascii_lowercase(), field_name.to_string()) {
            return Err(NidlError::validation(
                entity,
                format!("field name clashes with {}", quote(&previous)),
            ));
        }

        let token = match *entry {
            Value::String(ref token) => Some(token.as_str()),
            Value::Object(ref field) => field.get("type").and_then(Value::as_str),
            _ => None,
        };
        if let Some(token) = token {
            if idltypes::is_flag(token) {
                return Err(NidlError::validation(entity, "a multi-field struct may not contain a flag field"));
            }
            if idltypes::is_resource(token) {
                return Err(NidlError::validation(entity, "a multi-field struct may not contain a resource field"));
            }
        }
        fields.push(parse_field(name, field_name, entry, names)?);
    }

    Ok(AggregateDecl {
        name: name.to_string(),
        kind,
        fields,
        is_single_field: false,
        is_flag_marker: false,
        fourcc: optional_fourcc(name, map, "_fourcc_")?,
        allow_array: optional_bool(name, map, "_array_")?.unwrap_or(false),
        description: optional_string(name, map, "_description_")?,
    })
}

fn check_reserved_key(owner: &str, key: &str) -> Result<(), NidlError> {
    match key {
        "_fourcc_" | "_array_" | "_description_" | "_managed_" => Ok(()),
        _ => Err(NidlError::validation(owner, format!("unknown reserved key {}", quote(key)))),
    }
}

fn flag_marker(kind: AggregateKind, name: &str, fourcc: Option<String>, description: Option<String>) -> AggregateDecl {
    AggregateDecl {
        name: name.to_string(),
        kind,
        fields: Vec::new(),
        is_single_field: false,
        is_flag_marker: true,
        fourcc,
        allow_array: false,
        description,
    }
}

fn single_field(
    kind: AggregateKind,
    name: &str,
    field: FieldDecl,
    fourcc: Option<String>,
    description: Option<String>,
) -> AggregateDecl {
    AggregateDecl {
        name: name.to_string(),
        kind,
        fields: vec![field],
        is_single_field: true,
        is_flag_marker: false,
        fourcc,
        allow_array: false,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeRef;
    use nidl_schema::parse;

    fn aggregate(text: &str) -> Result<AggregateDecl, NidlError> {
        let root = parse(text).unwrap();
        let mut names = NameTable::default();
        names.declare("Other", "structs").unwrap();
        parse_aggregate(AggregateKind::Component, "A", root.get("A").unwrap(), &names)
    }

    #[test]
    fn bare_type_is_single_field() {
        let a = aggregate("A = \"resource\"").unwrap();
        assert!(a.is_single_field);
        assert_eq!(a.fields.len(), 1);
        assert_eq!(a.fields[0].name, "value");
        assert!(a.has_resource_field());
    }

    #[test]
    fn flag_markers_have_no_fields() {
        let a = aggregate("A = \"flag\"").unwrap();
        assert!(a.is_flag_marker);
        assert!(a.fields.is_empty());

        let a = aggregate("A = { type = \"Flag\", fourcc = \"FLAG\" }").unwrap();
        assert!(a.is_flag_marker);
        assert_eq!(a.fourcc.as_deref(), Some("FLAG"));
    }

    #[test]
    fn typed_object_is_single_field_with_metadata() {
        let a = aggregate("A = { type = \"float\", default = 10, fourcc = \"LRAD\", description = \"Range\" }").unwrap();
        assert!(a.is_single_field);
        assert_eq!(a.fourcc.as_deref(), Some("LRAD"));
        assert_eq!(a.fields[0].default_value, "float(10.0f)");
        assert_eq!(a.fields[0].description.as_deref(), Some("Range"));
        assert!(aggregate("A = { type = \"float\", array = true }").is_err());
    }

    #[test]
    fn struct_fields_in_declared_order() {
        let a = aggregate(
            "A = { _fourcc_ = \"AAAA\", _array_ = true, _managed_ = true, position = \"vec3\", rotation = \"quat\", child = \"Other\" }",
        )
        .unwrap();
        assert!(a.is_struct_shaped());
        assert!(a.allow_array);
        assert_eq!(a.fourcc.as_deref(), Some("AAAA"));
        let fields: Vec<_> = a.fields.iter().map(|f| f.native_type()).collect();
        assert_eq!(fields, vec!["Math::vec3", "Math::quat", "Other"]);
        assert_eq!(a.fields[2].ty, TypeRef::Aggregate("Other".into()));
    }

    #[test]
    fn struct_restrictions() {
        let err = aggregate("A = { mesh = \"resource\", scale = \"float\" }").unwrap_err();
        assert_eq!(err.entity(), "A.mesh");
        assert!(aggregate("A = { mesh = { type = \"Resource\" } }").is_err());
        assert!(aggregate("A = { tag = \"flag\" }").is_err());
        assert!(aggregate("A = { _bogus_ = 1 }").is_err());
        assert!(aggregate("A = { x = \"int\", X = \"float\" }").is_err());
        assert!(aggregate("A = { _fourcc_ = \"LONGER\" }").is_err());
        assert!(aggregate("A = 5").is_err());
    }

    #[test]
    fn empty_struct_is_allowed() {
        let a = aggregate("A = {}").unwrap();
        assert!(a.is_struct_shaped());
        assert!(a.fields.is_empty());
    }
}
