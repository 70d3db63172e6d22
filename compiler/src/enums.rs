use nidl_schema::Value;

use crate::{error::NidlError, types::EnumDecl, utils::is_identifier};

/// Build an enum from an ordered `key -> integer` object. Values may be
/// sparse or repeated.
pub(crate) fn parse_enum(name: &str, entry: &Value) -> Result<EnumDecl, NidlError> {
    let map = entry.as_object().ok_or_else(|| {
        NidlError::validation(name, format!("expected an object of values, found {}", entry.kind()))
    })?;

    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map.iter() {
        let entity = format!("{}.{}", name, key);
        if !is_identifier(key) {
            return Err(NidlError::validation(entity, "enum key is not a valid identifier"));
        }
        let value = value.as_int().ok_or_else(|| {
            NidlError::validation(&entity, format!("expected an integer, found {}", value.kind()))
        })?;
        entries.push((key.to_string(), value));
    }

    Ok(EnumDecl {
        name: name.to_string(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nidl_schema::parse;

    fn enum_decl(text: &str) -> Result<EnumDecl, NidlError> {
        let root = parse(text).unwrap();
        parse_enum("E", root.get("E").unwrap())
    }

    #[test]
    fn sparse_values_count_entries() {
        let e = enum_decl("E = { A = 0, B = 10, C = 10, D = -3 }").unwrap();
        assert_eq!(e.count(), 4);
        assert_eq!(e.entries[1], ("B".to_string(), 10));
        assert!(e.contains("D"));
        assert!(!e.contains("d"));
    }

    #[test]
    fn keys_are_case_sensitive() {
        let e = enum_decl("E = { a = 1, A = 2 }").unwrap();
        assert_eq!(e.count(), 2);
    }

    #[test]
    fn empty_enum() {
        assert_eq!(enum_decl("E = {}").unwrap().count(), 0);
    }

    #[test]
    fn invalid_enums() {
        assert!(enum_decl("E = [1, 2]").is_err());
        assert!(enum_decl("E = { A = 1.5 }").is_err());
        assert!(enum_decl("E = { A = \"x\" }").is_err());
        assert!(enum_decl("E = { \"not valid\" = 1 }").is_err());
    }
}
