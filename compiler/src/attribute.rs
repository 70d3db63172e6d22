use nidl_schema::{Map, Value};

use crate::{
    error::NidlError,
    idltypes::{self, AccessMode},
    property::{optional_fourcc, optional_string, type_token},
    types::{AggregateDecl, AggregateKind, FieldDecl, TypeRef},
    utils::quote,
};

const ATTRIBUTE_KEYS: [&str; 5] = ["type", "fourcc", "default", "access", "description"];

/// Build one entry of the legacy attribute library. The single field is
/// named after the attribute itself and its type must come from the type
/// table.
pub(crate) fn parse_attribute(name: &str, entry: &Value) -> Result<AggregateDecl, NidlError> {
    let map = match *entry {
        Value::Object(ref map) => map,
        Value::String(_) => return Err(NidlError::validation(name, "attribute requires a fourcc")),
        ref other => {
            return Err(NidlError::validation(
                name,
                format!("expected an object, found {}", other.kind()),
            ))
        }
    };
    if let Some(key) = map.keys().find(|k| !ATTRIBUTE_KEYS.contains(k)) {
        return Err(NidlError::validation(name, format!("unknown key {}", quote(key))));
    }

    let fourcc = match optional_fourcc(name, map, "fourcc")? {
        Some(tag) => tag,
        None => return Err(NidlError::validation(name, "attribute requires a fourcc")),
    };
    let token = type_token(name, map)?;
    let info = match idltypes::lookup(token) {
        Some(info) => info,
        None => {
            return Err(NidlError::UnknownType {
                entity:    name.to_string(),
                type_name: token.to_string(),
            })
        }
    };
    let default = map.get("default").unwrap_or(&Value::Null);
    let default_value =
        idltypes::default_to_string(info.token, default).map_err(|reason| NidlError::validation(name, reason))?;
    let description = optional_string(name, map, "description")?;

    Ok(AggregateDecl {
        name: name.to_string(),
        kind: AggregateKind::Attribute,
        fields: vec![FieldDecl {
            name: name.to_string(),
            ty: TypeRef::Builtin(info.token.to_string()),
            default_value,
            has_explicit_default: !default.is_null(),
            access: access_mode(name, map)?,
            description: description.clone(),
            hide_in_inspector: false,
        }],
        is_single_field: true,
        is_flag_marker: false,
        fourcc: Some(fourcc),
        allow_array: false,
        description,
    })
}

fn access_mode(name: &str, map: &Map) -> Result<AccessMode, NidlError> {
    match map.get("access") {
        None => Ok(AccessMode::ReadWrite),
        Some(Value::String(mode)) => AccessMode::parse(mode)
            .ok_or_else(|| NidlError::validation(name, format!("unknown access mode {}", quote(mode)))),
        Some(other) => Err(NidlError::validation(
            name,
            format!("\"access\" must be a string, found {}", other.kind()),
        )),
    }
}
