//! Field declarations.
//!
//! A field is written either as a bare type name or as an object carrying
//! `type` plus optional `default`, `description` and `hideInInspector`.

use nidl_schema::{Map, Value};

use crate::{
    error::NidlError,
    idltypes::{self, AccessMode},
    model::NameTable,
    types::{FieldDecl, TypeRef},
    utils::{is_identifier, quote},
};

/// Keys accepted inside an object-form field.
const FIELD_KEYS: [&str; 4] = ["type", "default", "description", "hideInInspector"];

/// Build one field of `owner` from its schema entry.
pub(crate) fn parse_field(owner: &str, name: &str, entry: &Value, names: &NameTable) -> Result<FieldDecl, NidlError> {
    let entity = format!("{}.{}", owner, name);
    if !is_identifier(name) {
        return Err(NidlError::validation(entity, "field name is not a valid identifier"));
    }

    match *entry {
        Value::String(ref token) => {
            let ty = names.resolve(&entity, token)?;
            let default_value = default_for(&entity, &ty, &Value::Null, names)?;
            Ok(FieldDecl {
                name: name.to_string(),
                ty,
                default_value,
                has_explicit_default: false,
                access: AccessMode::ReadWrite,
                description: None,
                hide_in_inspector: false,
            })
        }
        Value::Object(ref map) => parse_field_object(&entity, name, map, names),
        ref other => Err(NidlError::validation(
            entity,
            format!("expected a type name or an object, found {}", other.kind()),
        )),
    }
}

fn parse_field_object(entity: &str, name: &str, map: &Map, names: &NameTable) -> Result<FieldDecl, NidlError> {
    if let Some(key) = map.keys().find(|k| !FIELD_KEYS.contains(k)) {
        return Err(NidlError::validation(entity, format!("unknown field key {}", quote(key))));
    }
    let token = type_token(entity, map)?;
    let ty = names.resolve(entity, token)?;
    let default = map.get("default").unwrap_or(&Value::Null);
    let default_value = default_for(entity, &ty, default, names)?;

    Ok(FieldDecl {
        name: name.to_string(),
        ty,
        default_value,
        has_explicit_default: !default.is_null(),
        access: AccessMode::ReadWrite,
        description: optional_string(entity, map, "description")?,
        hide_in_inspector: optional_bool(entity, map, "hideInInspector")?.unwrap_or(false),
    })
}

/// The mandatory `type` key of an object-form entry.
pub(crate) fn type_token<'a>(entity: &str, map: &'a Map) -> Result<&'a str, NidlError> {
    match map.get("type") {
        Some(Value::String(token)) => Ok(token.as_str()),
        Some(other) => Err(NidlError::validation(
            entity,
            format!("\"type\" must be a string, found {}", other.kind()),
        )),
        None => Err(NidlError::validation(entity, "missing required key \"type\"")),
    }
}

/// The initializer for a field: the explicit default rendered for its type,
/// or the type's canonical default. Enum fields accept a key name.
pub(crate) fn default_for(entity: &str, ty: &TypeRef, value: &Value, names: &NameTable) -> Result<String, NidlError> {
    if let (TypeRef::Enum(enum_name), Value::String(key)) = (ty, value) {
        if !names.enum_has_key(enum_name, key) {
            return Err(NidlError::validation(
                entity,
                format!("{} is not a value of enum {}", quote(key), enum_name),
            ));
        }
        return Ok(format!("{}::{}", enum_name, key));
    }
    idltypes::default_to_string(ty.token(), value).map_err(|reason| NidlError::validation(entity, reason))
}

pub(crate) fn optional_string(entity: &str, map: &Map, key: &str) -> Result<Option<String>, NidlError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(NidlError::validation(
            entity,
            format!("{} must be a string, found {}", quote(key), other.kind()),
        )),
    }
}

pub(crate) fn optional_bool(entity: &str, map: &Map, key: &str) -> Result<Option<bool>, NidlError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(NidlError::validation(
            entity,
            format!("{} must be a boolean, found {}", quote(key), other.kind()),
        )),
    }
}

/// A fourcc tag under `key`, validated if present.
pub(crate) fn optional_fourcc(entity: &str, map: &Map, key: &str) -> Result<Option<String>, NidlError> {
    match optional_string(entity, map, key)? {
        Some(tag) if !crate::utils::is_fourcc(&tag) => Err(NidlError::validation(
            entity,
            format!("fourcc {} must be exactly four ASCII characters", quote(&tag)),
        )),
        tag => Ok(tag),
    }
}
