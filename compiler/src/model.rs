use std::collections::HashMap;

use log::{debug, warn};
use nidl_schema::Map;

use crate::{
    attribute::parse_attribute,
    component::parse_aggregate,
    document::Document,
    enums::parse_enum,
    error::NidlError,
    idltypes,
    protocol::parse_message,
    types::{AggregateDecl, AggregateKind, EnumDecl, MessageDecl, Model, TypeRef},
    utils::{is_identifier, quote},
    verifier::verify_model,
};

/// Sections whose entries become aggregates, in emission order.
const AGGREGATE_SECTIONS: [AggregateKind; 3] = [AggregateKind::Component, AggregateKind::Struct, AggregateKind::Property];

#[derive(Debug, Clone)]
enum Declared {
    Enum(Vec<String>),
    Aggregate,
    Message,
}

/// Every enum, aggregate and message name of one document, with the
/// section that declared it. Built before any declaration so that fields may
/// refer to types declared later in the file.
#[derive(Debug, Default)]
pub struct NameTable {
    names: HashMap<String, (&'static str, Declared)>,
}

impl NameTable {
    pub fn declare(&mut self, name: &str, section: &'static str) -> Result<(), NidlError> {
        let declared = match section {
            "messages" => Declared::Message,
            _ => Declared::Aggregate,
        };
        self.insert(name, section, declared)
    }

    pub fn declare_enum(&mut self, name: &str, keys: &[&str], section: &'static str) -> Result<(), NidlError> {
        let keys = keys.iter().map(|k| k.to_string()).collect();
        self.insert(name, section, Declared::Enum(keys))
    }

    fn insert(&mut self, name: &str, section: &'static str, declared: Declared) -> Result<(), NidlError> {
        if !is_identifier(name) {
            return Err(NidlError::validation(name, "name is not a valid identifier"));
        }
        if let Some((first, _)) = self.names.get(name) {
            return Err(NidlError::DuplicateName {
                name:   name.to_string(),
                first:  *first,
                second: section,
            });
        }
        self.names.insert(name.to_string(), (section, declared));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn enum_has_key(&self, name: &str, key: &str) -> bool {
        match self.names.get(name) {
            Some((_, Declared::Enum(keys))) => keys.iter().any(|k| k == key),
            _ => false,
        }
    }

    /// Resolve a field type token. Builtins win over declared names; any
    /// other token is passed through unchanged as a native type name.
    pub fn resolve(&self, entity: &str, token: &str) -> Result<TypeRef, NidlError> {
        if let Some(info) = idltypes::lookup(token) {
            return Ok(TypeRef::Builtin(info.token.to_string()));
        }
        match self.names.get(token) {
            Some((_, Declared::Enum(_))) => return Ok(TypeRef::Enum(token.to_string())),
            Some((_, Declared::Aggregate)) => return Ok(TypeRef::Aggregate(token.to_string())),
            Some((section, Declared::Message)) => {
                return Err(NidlError::validation(
                    entity,
                    format!("{} is declared in {} and cannot be used as a type", quote(token), section),
                ))
            }
            None => {}
        }
        if idltypes::is_flag(token) {
            return Err(NidlError::validation(entity, "\"flag\" only declares a presence tag and is not a field type"));
        }
        if token.trim().is_empty() {
            return Err(NidlError::UnknownType {
                entity:    entity.to_string(),
                type_name: token.to_string(),
            });
        }
        warn!("{}: {} is not declared in this schema, using it as a native type", entity, quote(token));
        Ok(TypeRef::Opaque(token.to_string()))
    }
}

/// Builds the [`Model`] of one document. Every accumulator lives on the
/// builder, so concurrent builds never share state.
pub struct ModelBuilder<'a> {
    document:   &'a Document,
    names:      NameTable,
    enums:      Vec<EnumDecl>,
    attributes: Vec<AggregateDecl>,
    aggregates: Vec<AggregateDecl>,
    messages:   Vec<MessageDecl>,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(document: &'a Document) -> Self {
        ModelBuilder {
            document,
            names: NameTable::default(),
            enums: Vec::new(),
            attributes: Vec::new(),
            aggregates: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn build(mut self) -> Result<Model, NidlError> {
        let document = self.document;
        self.collect_names()?;
        debug!("{}: {} names collected", document.path().display(), self.names.len());

        if let Some(enums) = document.section("enums")? {
            for (name, entry) in enums.iter() {
                self.enums.push(parse_enum(name, entry)?);
            }
        }
        if let Some(attributes) = document.section("attributes")? {
            for (name, entry) in attributes.iter() {
                self.attributes.push(parse_attribute(name, entry)?);
            }
        }
        for kind in AGGREGATE_SECTIONS {
            if let Some(section) = document.section(kind.section())? {
                for (name, entry) in section.iter() {
                    self.aggregates.push(parse_aggregate(kind, name, entry, &self.names)?);
                }
            }
        }
        if let Some(messages) = document.section("messages")? {
            for (name, entry) in messages.iter() {
                self.messages.push(parse_message(name, entry, &self.names)?);
            }
        }

        let model = Model {
            namespace:  document.namespace().to_string(),
            includes:   document.includes()?,
            enums:      self.enums,
            attributes: self.attributes,
            aggregates: self.aggregates,
            messages:   self.messages,
        };
        verify_model(&model)?;
        debug!(
            "{}: model built with {} aggregates, {} messages",
            document.path().display(),
            model.aggregates.len(),
            model.messages.len()
        );
        Ok(model)
    }

    fn collect_names(&mut self) -> Result<(), NidlError> {
        let document = self.document;
        if let Some(enums) = document.section("enums")? {
            for (name, entry) in enums.iter() {
                let keys: Vec<&str> = entry.as_object().map(|m| m.keys().collect()).unwrap_or_default();
                self.names.declare_enum(name, &keys, "enums")?;
            }
        }
        for kind in AGGREGATE_SECTIONS {
            if let Some(section) = document.section(kind.section())? {
                declare_all(&mut self.names, section, kind.section())?;
            }
        }
        if let Some(messages) = document.section("messages")? {
            declare_all(&mut self.names, messages, "messages")?;
        }
        Ok(())
    }
}

fn declare_all(names: &mut NameTable, section: &Map, label: &'static str) -> Result<(), NidlError> {
    for name in section.keys() {
        names.declare(name, label)?;
    }
    Ok(())
}

/// Build the model of an already merged document.
pub fn build_model(document: &Document) -> Result<Model, NidlError> {
    ModelBuilder::new(document).build()
}

/// Shorthand used by tests and tools: parse `text` and build its model
/// without touching dependencies.
pub fn build_model_from_str(text: &str) -> Result<Model, NidlError> {
    let document = Document::from_str(std::path::Path::new("<memory>"), text)?;
    build_model(&document)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIGHTS: &str = r#"
        namespace = "Lighting"
        enums = {
            LightType = { Point = 0, Spot = 1, Directional = 4 }
        }
        components = {
            Light = {
                _fourcc_ = "LGHT"
                kind = "LightType"
                color = { type = "vec4", default = [1, 1, 1, 1] }
                target = "Target"
            }
            CastShadows = "flag"
        }
        structs = {
            Target = { entity = "entity", offset = "vec3" }
        }
        messages = {
            SetColor = { fourcc = "SCOL", args = { color = "vec4" } }
        }
    "#;

    #[test]
    fn builds_in_declared_order() {
        let model = build_model_from_str(LIGHTS).unwrap();
        assert_eq!(model.namespace, "Lighting");
        assert_eq!(model.enums[0].count(), 3);
        let names: Vec<_> = model.aggregates.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Light", "CastShadows", "Target"]);

        let light = model.aggregate("Light").unwrap();
        let fields: Vec<_> = light.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["kind", "color", "target"]);
        assert_eq!(light.fields[0].ty, TypeRef::Enum("LightType".into()));
        // Forward reference into a later section.
        assert_eq!(light.fields[2].ty, TypeRef::Aggregate("Target".into()));
        assert_eq!(light.fourcc.as_deref(), Some("LGHT"));

        assert!(model.aggregate("CastShadows").unwrap().is_flag_marker);
        assert!(model.contains_entity_types());
        assert!(!model.contains_resource_types());
        assert_eq!(model.messages[0].args[0].name, "color");
    }

    #[test]
    fn names_are_unique_across_sections() {
        let err = build_model_from_str("components = { A = \"int\" }\nstructs = { A = { x = \"int\" } }").unwrap_err();
        match err {
            NidlError::DuplicateName { name, first, second } => {
                assert_eq!(name, "A");
                assert_eq!(first, "components");
                assert_eq!(second, "structs");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(build_model_from_str("enums = { A = {} }\nmessages = { A = { fourcc = \"AAAA\" } }").is_err());
    }

    #[test]
    fn messages_are_not_types() {
        let err = build_model_from_str(
            "messages = { Ping = { fourcc = \"PING\" } }\ncomponents = { A = \"Ping\" }",
        )
        .unwrap_err();
        assert_eq!(err.entity(), "A.value");
    }

    #[test]
    fn undeclared_types_pass_through() {
        let model =
            build_model_from_str("components = { A = { count = \"uint32_t\", id = \"IndexT\", box = \"Math::bbox\" } }")
                .unwrap();
        let a = model.aggregate("A").unwrap();
        assert_eq!(a.fields[0].ty, TypeRef::Opaque("uint32_t".into()));
        assert_eq!(a.fields[0].native_type(), "uint32_t");
        assert_eq!(a.fields[0].default_value, "uint32_t()");
        assert_eq!(a.fields[1].ty, TypeRef::Opaque("IndexT".into()));
        assert_eq!(a.fields[2].ty, TypeRef::Opaque("Math::bbox".into()));

        let err = build_model_from_str("components = { A = \"\" }").unwrap_err();
        assert!(matches!(err, NidlError::UnknownType { .. }));
    }

    #[test]
    fn builders_share_no_state() {
        let first = build_model_from_str("components = { A = \"int\" }").unwrap();
        let second = build_model_from_str("components = { B = \"int\" }").unwrap();
        assert_eq!(first.aggregates.len(), 1);
        assert_eq!(second.aggregates.len(), 1);
        assert_eq!(second.aggregates[0].name, "B");
    }

    #[test]
    fn name_table_resolution() {
        let mut names = NameTable::default();
        names.declare("Transform", "components").unwrap();
        assert_eq!(names.resolve("x", "FLOAT").unwrap(), TypeRef::Builtin("float".into()));
        assert_eq!(names.resolve("x", "Transform").unwrap(), TypeRef::Aggregate("Transform".into()));
        assert_eq!(names.resolve("x", "Math::bbox").unwrap(), TypeRef::Opaque("Math::bbox".into()));
        assert_eq!(names.resolve("x", "IndexT").unwrap(), TypeRef::Opaque("IndexT".into()));
        assert!(names.resolve("x", "flag").is_err());
    }
}
