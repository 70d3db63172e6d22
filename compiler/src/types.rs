use serde::Serialize;

use crate::idltypes::{self, AccessMode};

/// A resolved field type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "name")]
pub enum TypeRef {
    /// A type from the semantic type table, by canonical token.
    Builtin(String),
    Enum(String),
    Aggregate(String),
    /// An undeclared token, spelled unchanged as a native type.
    Opaque(String),
}

impl TypeRef {
    /// The token handed to the type table.
    pub fn token(&self) -> &str {
        match self {
            TypeRef::Builtin(t) | TypeRef::Enum(t) | TypeRef::Aggregate(t) | TypeRef::Opaque(t) => t,
        }
    }

    pub fn native(&self) -> String {
        idltypes::native_type(self.token())
    }

    pub fn csharp(&self) -> String {
        idltypes::csharp_type(self.token())
    }

    pub fn argument(&self) -> String {
        match self {
            // Enums are plain integers.
            TypeRef::Enum(name) => name.clone(),
            other => idltypes::argument_type(other.token()),
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, TypeRef::Builtin(t) if idltypes::is_resource(t))
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, TypeRef::Builtin(t) if idltypes::is_entity(t))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AggregateKind {
    Component,
    Struct,
    Property,
    Attribute,
}

impl AggregateKind {
    /// The schema section the kind is declared in.
    pub fn section(&self) -> &'static str {
        match *self {
            AggregateKind::Component => "components",
            AggregateKind::Struct => "structs",
            AggregateKind::Property => "properties",
            AggregateKind::Attribute => "attributes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDecl {
    pub name:              String,
    pub ty:                TypeRef,
    /// Initializer expression, explicit or the type's canonical default.
    pub default_value:     String,
    pub has_explicit_default: bool,
    pub access:            AccessMode,
    pub description:       Option<String>,
    pub hide_in_inspector: bool,
}

impl FieldDecl {
    pub fn native_type(&self) -> String {
        self.ty.native()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateDecl {
    pub name:           String,
    pub kind:           AggregateKind,
    pub fields:         Vec<FieldDecl>,
    pub is_single_field: bool,
    pub is_flag_marker: bool,
    pub fourcc:         Option<String>,
    pub allow_array:    bool,
    pub description:    Option<String>,
}

impl AggregateDecl {
    pub fn has_resource_field(&self) -> bool {
        self.fields.iter().any(|f| f.ty.is_resource())
    }

    pub fn has_entity_field(&self) -> bool {
        self.fields.iter().any(|f| f.ty.is_entity())
    }

    /// Multi-field structs get JSON serializers of their own.
    pub fn is_struct_shaped(&self) -> bool {
        !self.is_single_field && !self.is_flag_marker
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgDecl {
    pub name: String,
    pub ty:   TypeRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDecl {
    pub name:     String,
    pub fourcc:   String,
    /// Positional order is significant.
    pub args:     Vec<ArgDecl>,
    pub exported: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDecl {
    pub name:    String,
    pub entries: Vec<(String, i64)>,
}

impl EnumDecl {
    /// The value of the generated `Num<Name>` sentinel: the number of entries,
    /// whatever values they were assigned.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Name of the generated count enumerator.
    pub fn sentinel(&self) -> String {
        format!("Num{}", crate::utils::capitalize(&self.name))
    }
}

/// Everything generated from one (merged) schema document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    pub namespace:  String,
    pub includes:   Vec<String>,
    pub enums:      Vec<EnumDecl>,
    pub attributes: Vec<AggregateDecl>,
    /// Components, structs and properties, in that section order.
    pub aggregates: Vec<AggregateDecl>,
    pub messages:   Vec<MessageDecl>,
}

impl Model {
    pub fn contains_resource_types(&self) -> bool {
        self.attributes.iter().chain(&self.aggregates).any(AggregateDecl::has_resource_field)
    }

    pub fn contains_entity_types(&self) -> bool {
        self.attributes.iter().chain(&self.aggregates).any(AggregateDecl::has_entity_field)
            || self.messages.iter().flat_map(|m| &m.args).any(|a| a.ty.is_entity())
    }

    pub fn aggregate(&self, name: &str) -> Option<&AggregateDecl> {
        self.aggregates.iter().find(|a| a.name == name)
    }

    pub fn find_enum(&self, name: &str) -> Option<&EnumDecl> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Whether the source file needs the JSON serializer block.
    pub fn needs_serializers(&self) -> bool {
        !self.enums.is_empty() || self.aggregates.iter().any(AggregateDecl::is_struct_shaped)
    }

    pub fn exported_messages(&self) -> impl Iterator<Item = &MessageDecl> {
        self.messages.iter().filter(|m| m.exported)
    }
}
