//! Messages.
//!
//! ```text
//! messages = {
//!     SetColor = { fourcc = "SCOL", args = { color = "vec4" }, export = true }
//! }
//! ```
//!
//! Argument order is significant: it is the positional order of the
//! generated signature and of the dynamic binding.

use std::collections::HashSet;

use nidl_schema::Value;

use crate::{
    error::NidlError,
    idltypes,
    model::NameTable,
    property::{optional_bool, optional_fourcc, optional_string},
    types::{ArgDecl, MessageDecl},
    utils::{is_identifier, quote},
};

const MESSAGE_KEYS: [&str; 4] = ["fourcc", "args", "export", "description"];

pub(crate) fn parse_message(name: &str, entry: &Value, names: &NameTable) -> Result<MessageDecl, NidlError> {
    let map = entry.as_object().ok_or_else(|| {
        NidlError::validation(name, format!("expected an object, found {}", entry.kind()))
    })?;
    if let Some(key) = map.keys().find(|k| !MESSAGE_KEYS.contains(k)) {
        return Err(NidlError::validation(name, format!("unknown key {}", quote(key))));
    }
    let fourcc = optional_fourcc(name, map, "fourcc")?
        .ok_or_else(|| NidlError::validation(name, "message requires a fourcc"))?;

    let mut args = Vec::new();
    match map.get("args") {
        None | Some(Value::Null) => {}
        Some(Value::Object(arg_map)) => {
            let mut seen = HashSet::new();
            for (arg_name, arg_type) in arg_map.iter() {
                let entity = format!("{}.{}", name, arg_name);
                if !is_identifier(arg_name) {
                    return Err(NidlError::validation(entity, "argument name is not a valid identifier"));
                }
                if !seen.insert(arg_name) {
                    return Err(NidlError::validation(entity, "duplicate argument"));
                }
                let token = arg_type.as_str().ok_or_else(|| {
                    NidlError::validation(&entity, format!("argument type must be a string, found {}", arg_type.kind()))
                })?;
                if idltypes::is_flag(token) {
                    return Err(NidlError::validation(entity, "flag is not an argument type"));
                }
                args.push(ArgDecl {
                    name: arg_name.to_string(),
                    ty:   names.resolve(&entity, token)?,
                });
            }
        }
        Some(other) => {
            return Err(NidlError::validation(
                name,
                format!("\"args\" must be an object, found {}", other.kind()),
            ))
        }
    }

    Ok(MessageDecl {
        name: name.to_string(),
        fourcc,
        args,
        exported: optional_bool(name, map, "export")?.unwrap_or(true),
        description: optional_string(name, map, "description")?,
    })
}

/// `Name(Type const& a, int b)` style parameter list.
pub fn parameter_list(message: &MessageDecl) -> String {
    message
        .args
        .iter()
        .map(|arg| format!("{} {}", arg.ty.argument(), arg.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The argument names, comma separated, for forwarding calls.
pub fn argument_names(message: &MessageDecl) -> String {
    message.args.iter().map(|arg| arg.name.as_str()).collect::<Vec<_>>().join(", ")
}

/// The bare parameter types, for delegate signatures.
pub fn argument_types(message: &MessageDecl) -> String {
    message.args.iter().map(|arg| arg.ty.argument()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeRef;
    use nidl_schema::parse;

    fn message(text: &str) -> Result<MessageDecl, NidlError> {
        let root = parse(text).unwrap();
        let mut names = NameTable::default();
        names.declare_enum("Mode", &["On", "Off"], "enums").unwrap();
        parse_message("M", root.get("M").unwrap(), &names)
    }

    #[test]
    fn args_keep_declared_order() {
        let m = message("M = { fourcc = \"MMMM\", args = { z = \"vec3\", a = \"int\", mode = \"Mode\", e = \"entity\" } }").unwrap();
        let names: Vec<_> = m.args.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "mode", "e"]);
        assert_eq!(m.args[2].ty, TypeRef::Enum("Mode".into()));
        assert!(m.exported);
        assert_eq!(
            parameter_list(&m),
            "Math::vec3 const& z, int a, Mode mode, Game::Entity e"
        );
        assert_eq!(argument_names(&m), "z, a, mode, e");
        assert_eq!(argument_types(&m), "Math::vec3 const&, int, Mode, Game::Entity");
    }

    #[test]
    fn export_flag_and_empty_args() {
        let m = message("M = { fourcc = \"MMMM\", export = false }").unwrap();
        assert!(!m.exported);
        assert!(m.args.is_empty());
        assert_eq!(parameter_list(&m), "");
    }

    #[test]
    fn invalid_messages() {
        assert!(message("M = { args = {} }").is_err());
        assert!(message("M = { fourcc = \"MMM\" }").is_err());
        assert!(message("M = { fourcc = \"MMMM\", args = [\"int\"] }").is_err());
        assert!(message("M = { fourcc = \"MMMM\", args = { a = 1 } }").is_err());
        assert!(message("M = { fourcc = \"MMMM\", args = { a = \"Missing\" } }").is_err());
        assert!(message("M = { fourcc = \"MMMM\", args = { a = \"flag\" } }").is_err());
        assert!(message("M = \"int\"").is_err());
    }
}
