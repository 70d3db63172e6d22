use std::collections::HashMap;

use crate::{
    error::NidlError,
    types::{AggregateDecl, Model, TypeRef},
    utils::quote,
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Checks that need the whole model: no aggregate contains itself by value,
/// flag markers are never used as field types, no two declarations share a
/// fourcc, and enumerators are unique across the namespace.
pub fn verify_model(model: &Model) -> Result<(), NidlError> {
    let aggregates: HashMap<&str, &AggregateDecl> =
        model.aggregates.iter().map(|a| (a.name.as_str(), a)).collect();

    // 1) Flag markers carry no storage
    for aggregate in &model.aggregates {
        for field in &aggregate.fields {
            if let TypeRef::Aggregate(ref target) = field.ty {
                if aggregates.get(target.as_str()).map_or(false, |t| t.is_flag_marker) {
                    return Err(NidlError::validation(
                        format!("{}.{}", aggregate.name, field.name),
                        format!("flag marker {} cannot be used as a field type", quote(target)),
                    ));
                }
            }
        }
    }

    // 2) Aggregates may not contain themselves
    let mut state: HashMap<&str, Visit> = HashMap::new();
    fn check_recursion<'m>(
        name: &'m str,
        aggregates: &HashMap<&'m str, &'m AggregateDecl>,
        state: &mut HashMap<&'m str, Visit>,
    ) -> Result<(), NidlError> {
        let aggregate = match aggregates.get(name) {
            Some(aggregate) => *aggregate,
            None => return Ok(()),
        };
        match state.get(name) {
            Some(Visit::InProgress) => {
                return Err(NidlError::validation(
                    name,
                    format!("recursive nesting of {} is not allowed", quote(name)),
                ))
            }
            Some(Visit::Done) => return Ok(()),
            None => {}
        }
        state.insert(name, Visit::InProgress);
        for field in &aggregate.fields {
            if let TypeRef::Aggregate(ref target) = field.ty {
                check_recursion(target.as_str(), aggregates, state)?;
            }
        }
        state.insert(name, Visit::Done);
        Ok(())
    }

    for aggregate in &model.aggregates {
        check_recursion(&aggregate.name, &aggregates, &mut state)?;
    }

    // 3) Fourcc tags identify types at runtime
    let mut tags: HashMap<&str, &str> = HashMap::new();
    let tagged = model
        .attributes
        .iter()
        .chain(&model.aggregates)
        .filter_map(|a| a.fourcc.as_deref().map(|tag| (tag, a.name.as_str())))
        .chain(model.messages.iter().map(|m| (m.fourcc.as_str(), m.name.as_str())));
    for (tag, name) in tagged {
        if let Some(first) = tags.insert(tag, name) {
            return Err(NidlError::validation(
                name,
                format!("fourcc {} is already used by {}", quote(tag), first),
            ));
        }
    }

    // 4) Unscoped enumerators, sentinels included, share the namespace
    let mut enumerators: HashMap<String, &str> = HashMap::new();
    for decl in &model.enums {
        let keys = decl
            .entries
            .iter()
            .map(|(key, _)| key.clone())
            .chain(std::iter::once(decl.sentinel()));
        for key in keys {
            if let Some(first) = enumerators.insert(key.clone(), decl.name.as_str()) {
                return Err(NidlError::validation(
                    format!("{}.{}", decl.name, key),
                    format!("enumerator {} is already declared by enum {}", quote(&key), first),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{error::NidlError, model::build_model_from_str};

    #[test]
    fn self_containment_is_rejected() {
        let err = build_model_from_str("structs = { A = { b = \"B\" }, B = { a = \"A\" } }").unwrap_err();
        assert!(err.reason().contains("recursive nesting"));
        assert!(build_model_from_str("structs = { A = { a = \"A\" } }").is_err());
    }

    #[test]
    fn shared_nesting_is_fine() {
        let model = build_model_from_str(
            "structs = { Leaf = { x = \"int\" }, Left = { l = \"Leaf\" }, Right = { r = \"Leaf\" }, Root = { a = \"Left\", b = \"Right\" } }",
        )
        .unwrap();
        assert_eq!(model.aggregates.len(), 4);
    }

    #[test]
    fn flag_markers_are_not_field_types() {
        let err = build_model_from_str("components = { Tag = \"flag\", Holder = { t = \"Tag\" } }").unwrap_err();
        assert_eq!(err.entity(), "Holder.t");
    }

    #[test]
    fn fourcc_tags_are_unique() {
        let err = build_model_from_str(
            "components = { A = { type = \"int\", fourcc = \"ABCD\" } }\nmessages = { M = { fourcc = \"ABCD\" } }",
        )
        .unwrap_err();
        assert!(matches!(err, NidlError::Validation { ref entity, .. } if entity == "M"));
    }

    #[test]
    fn enumerators_are_unique_across_enums() {
        let err = build_model_from_str("enums = { Light = { Off = 0, On = 1 }, Power = { On = 1, Low = 2 } }").unwrap_err();
        assert_eq!(err.entity(), "Power.On");

        let err = build_model_from_str("enums = { Mode = { A = 0 }, Other = { NumMode = 3 } }").unwrap_err();
        assert_eq!(err.entity(), "Other.NumMode");

        assert!(build_model_from_str("enums = { Mode = { NumMode = 0 } }").is_err());
        assert!(build_model_from_str("enums = { Light = { on = 0, On = 1 }, Power = { ON = 0 } }").is_ok());
    }
}
