//! The semantic type table.
//!
//! Maps schema-level type tokens (`"vec3"`, `"resource"`, ...) to their native
//! C++ spelling, C# spelling, calling convention, canonical default value and
//! the PascalCase token used to build suffixed names such as `DeclareFloat4`.
//!
//! Lookups are case-insensitive. A token the table does not know is returned
//! unchanged by every spelling function, so schemas can name their own structs,
//! enums and engine types as field types.

use nidl_schema::Value;
use serde::Serialize;

use crate::utils::quote;

/// The type token that declares a zero-field presence tag.
pub const FLAG_TYPE: &str = "flag";

/// Values up to this size are passed by value, larger ones by const reference.
const MAX_BY_VALUE_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PassBy {
    Value,
    ConstRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessMode {
    ReadWrite,
    ReadOnly,
}

impl AccessMode {
    /// Parse an attribute access mode. Returns `None` for unknown modes.
    pub fn parse(token: &str) -> Option<AccessMode> {
        match token.to_ascii_lowercase().as_str() {
            "rw" | "readwrite" => Some(AccessMode::ReadWrite),
            "r" | "ro" | "readonly" => Some(AccessMode::ReadOnly),
            _ => None,
        }
    }

    pub fn as_cpp(&self) -> &'static str {
        match *self {
            AccessMode::ReadWrite => "Attr::ReadWrite",
            AccessMode::ReadOnly => "Attr::ReadOnly",
        }
    }
}

/// How explicit numeric defaults are spelled for a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Literal {
    Integer,
    Float,
    Double,
    Other,
}

#[derive(Debug)]
pub struct TypeInfo {
    pub token:   &'static str,
    pub native:  &'static str,
    pub csharp:  &'static str,
    pub default: &'static str,
    pub camel:   &'static str,
    pub size:    usize,
    literal:     Literal,
}

impl TypeInfo {
    pub fn pass_by(&self) -> PassBy {
        if self.size <= MAX_BY_VALUE_SIZE {
            PassBy::Value
        } else {
            PassBy::ConstRef
        }
    }
}

macro_rules! ty {
    ($token:expr, $native:expr, $csharp:expr, $default:expr, $camel:expr, $size:expr, $literal:ident) => {
        TypeInfo {
            token:   $token,
            native:  $native,
            csharp:  $csharp,
            default: $default,
            camel:   $camel,
            size:    $size,
            literal: Literal::$literal,
        }
    };
}

pub const TYPES: &[TypeInfo] = &[
    ty!("byte",     "uint8_t",                "byte",               "uint8_t(0)",                          "Byte",     1,  Integer),
    ty!("short",    "int16_t",                "short",              "int16_t(0)",                          "Short",    2,  Integer),
    ty!("ushort",   "uint16_t",               "ushort",             "uint16_t(0)",                         "UShort",   2,  Integer),
    ty!("int",      "int",                    "int",                "int(0)",                              "Int",      4,  Integer),
    ty!("uint",     "uint",                   "uint",               "uint(0)",                             "UInt",     4,  Integer),
    ty!("int64",    "int64_t",                "long",               "int64_t(0)",                          "Int64",    8,  Integer),
    ty!("uint64",   "uint64_t",               "ulong",              "uint64_t(0)",                         "UInt64",   8,  Integer),
    ty!("float",    "float",                  "float",              "float(0.0f)",                         "Float",    4,  Float),
    ty!("double",   "double",                 "double",             "double(0.0)",                         "Double",   8,  Double),
    ty!("bool",     "bool",                   "bool",               "bool(false)",                         "Bool",     1,  Other),
    ty!("vec2",     "Math::vec2",             "Mathf.Vector2",      "Math::vec2(0.0f, 0.0f)",              "Float2",   8,  Float),
    ty!("vec3",     "Math::vec3",             "Mathf.Vector3",      "Math::vec3(0.0f, 0.0f, 0.0f)",        "Float3",   12, Float),
    ty!("vec4",     "Math::vec4",             "Mathf.Vector4",      "Math::vec4(0.0f, 0.0f, 0.0f, 0.0f)",  "Float4",   16, Float),
    ty!("quat",     "Math::quat",             "Mathf.Quaternion",   "Math::quat()",                        "Quaternion", 16, Float),
    ty!("mat4",     "Math::mat4",             "Mathf.Matrix",       "Math::mat4()",                        "Matrix44", 64, Float),
    ty!("string",   "Util::String",           "string",             "Util::String(\"\")",                  "String",   40, Other),
    ty!("resource", "Resources::ResourceName", "string",            "Resources::ResourceName(\"\")",       "Resource", 40, Other),
    ty!("entity",   "Game::Entity",           "Nebula.Game.Entity", "Game::Entity::Invalid()",             "Entity",   8,  Integer),
    ty!("guid",     "Util::Guid",             "System.Guid",        "Util::Guid()",                        "Guid",     16, Other),
    ty!("blob",     "Util::Blob",             "byte[]",             "Util::Blob()",                        "Blob",     24, Other),
    ty!("variant",  "Util::Variant",          "object",             "Util::Variant()",                     "Variant",  24, Other),
];

/// Look a token up in the table, ignoring case.
pub fn lookup(token: &str) -> Option<&'static TypeInfo> {
    TYPES.iter().find(|t| t.token.eq_ignore_ascii_case(token))
}

pub fn is_flag(token: &str) -> bool {
    token.eq_ignore_ascii_case(FLAG_TYPE)
}

pub fn is_resource(token: &str) -> bool {
    token.eq_ignore_ascii_case("resource")
}

pub fn is_entity(token: &str) -> bool {
    token.eq_ignore_ascii_case("entity")
}

/// The native spelling used in a field declaration.
pub fn native_type(token: &str) -> String {
    match lookup(token) {
        Some(info) => info.native.to_string(),
        None => token.to_string(),
    }
}

/// The C# spelling. Unknown tokens have `::` mapped to `.`.
pub fn csharp_type(token: &str) -> String {
    match lookup(token) {
        Some(info) => info.csharp.to_string(),
        None => token.replace("::", "."),
    }
}

/// Unknown types are passed by const reference.
pub fn pass_by(token: &str) -> PassBy {
    lookup(token).map(TypeInfo::pass_by).unwrap_or(PassBy::ConstRef)
}

/// The parameter spelling for a value of this type.
pub fn argument_type(token: &str) -> String {
    let native = native_type(token);
    match pass_by(token) {
        PassBy::Value => native,
        PassBy::ConstRef => format!("{} const&", native),
    }
}

/// The canonical default-value expression. Unknown types are
/// value-initialised.
pub fn default_value(token: &str) -> String {
    match lookup(token) {
        Some(info) => info.default.to_string(),
        None => format!("{}()", token),
    }
}

/// The PascalCase token used to build suffixed names.
pub fn camel_notation(token: &str) -> String {
    match lookup(token) {
        Some(info) => info.camel.to_string(),
        None => token.to_string(),
    }
}

/// Render an explicit schema default as an initializer expression of the
/// form `Native(literal)`. `null` yields the canonical default.
pub fn default_to_string(token: &str, value: &Value) -> Result<String, String> {
    if value.is_null() {
        return Ok(default_value(token));
    }
    let style = lookup(token).map(|info| info.literal).unwrap_or(Literal::Other);
    let literal = match *value {
        Value::Array(ref values) => {
            let parts = values
                .iter()
                .map(|v| literal(v, style))
                .collect::<Result<Vec<_>, _>>()?;
            parts.join(", ")
        }
        ref scalar => literal(scalar, style)?,
    };
    Ok(format!("{}({})", native_type(token), literal))
}

fn literal(value: &Value, style: Literal) -> Result<String, String> {
    match *value {
        Value::Bool(b) => Ok(if b { "true" } else { "false" }.to_string()),
        Value::Int(i) => Ok(match style {
            Literal::Float => format!("{}f", float_text(i as f64)),
            Literal::Double => float_text(i as f64),
            Literal::Integer | Literal::Other => i.to_string(),
        }),
        Value::Float(f) => match style {
            Literal::Integer => Err(format!("expected an integer default, found {}", f)),
            Literal::Float => Ok(format!("{}f", float_text(f))),
            Literal::Double | Literal::Other => Ok(float_text(f)),
        },
        Value::String(ref s) => Ok(quote(s)),
        ref other => Err(format!("unsupported default value of kind {}", other.kind())),
    }
}

/// Always keeps a decimal point so the literal reads as floating point.
fn float_text(f: f64) -> String {
    let text = format!("{}", f);
    if text.contains('.') || text.contains('e') || text.contains("inf") || text.contains("NaN") {
        text
    } else {
        format!("{}.0", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(native_type("VEC3"), "Math::vec3");
        assert_eq!(native_type("Float"), "float");
        assert_eq!(camel_notation("vec4"), "Float4");
        assert_eq!(camel_notation("VEC3"), "Float3");
        assert_eq!(camel_notation("quat"), "Quaternion");
        assert_eq!(camel_notation("mat4"), "Matrix44");
    }

    #[test]
    fn unknown_tokens_pass_through() {
        assert_eq!(native_type("Math::bbox"), "Math::bbox");
        assert_eq!(native_type("LightType"), "LightType");
        assert_eq!(camel_notation("LightType"), "LightType");
        assert_eq!(csharp_type("Math::bbox"), "Math.bbox");
        assert_eq!(default_value("Math::bbox"), "Math::bbox()");
        assert_eq!(argument_type("Math::bbox"), "Math::bbox const&");
    }

    #[test]
    fn calling_convention_by_size() {
        assert_eq!(pass_by("int"), PassBy::Value);
        assert_eq!(pass_by("uint64"), PassBy::Value);
        assert_eq!(pass_by("entity"), PassBy::Value);
        assert_eq!(pass_by("vec2"), PassBy::Value);
        assert_eq!(pass_by("vec3"), PassBy::ConstRef);
        assert_eq!(pass_by("string"), PassBy::ConstRef);
        assert_eq!(argument_type("float"), "float");
        assert_eq!(argument_type("mat4"), "Math::mat4 const&");
    }

    #[test]
    fn canonical_defaults_initialize_the_native_type() {
        for info in TYPES {
            let default = default_value(info.token);
            assert!(
                default.starts_with(&format!("{}(", info.native))
                    || default.starts_with(&format!("{}::", info.native)),
                "default {:?} does not construct {:?}",
                default,
                info.native
            );
            let open = default.matches('(').count();
            let close = default.matches(')').count();
            assert_eq!(open, close, "unbalanced default {:?}", default);
            assert!(default.ends_with(')'), "default {:?} is not a call", default);
        }
    }

    #[test]
    fn explicit_defaults() {
        assert_eq!(default_to_string("float", &Value::Float(10.0)).unwrap(), "float(10.0f)");
        assert_eq!(default_to_string("float", &Value::Int(3)).unwrap(), "float(3.0f)");
        assert_eq!(default_to_string("double", &Value::Float(0.25)).unwrap(), "double(0.25)");
        assert_eq!(default_to_string("int", &Value::Int(-4)).unwrap(), "int(-4)");
        assert_eq!(default_to_string("bool", &Value::Bool(true)).unwrap(), "bool(true)");
        assert_eq!(
            default_to_string("string", &Value::from("tjene")).unwrap(),
            "Util::String(\"tjene\")"
        );
        assert_eq!(
            default_to_string(
                "vec4",
                &Value::Array(vec![Value::Int(1), Value::Float(0.88), Value::Float(0.65), Value::Int(1)])
            )
            .unwrap(),
            "Math::vec4(1.0f, 0.88f, 0.65f, 1.0f)"
        );
        assert_eq!(default_to_string("vec3", &Value::Null).unwrap(), default_value("vec3"));
    }

    #[test]
    fn explicit_default_errors() {
        assert!(default_to_string("int", &Value::Float(1.5)).is_err());
        assert!(default_to_string("vec3", &Value::Object(Default::default())).is_err());
    }

    #[test]
    fn access_modes() {
        assert_eq!(AccessMode::parse("RW"), Some(AccessMode::ReadWrite));
        assert_eq!(AccessMode::parse("readOnly"), Some(AccessMode::ReadOnly));
        assert_eq!(AccessMode::parse("r"), Some(AccessMode::ReadOnly));
        assert_eq!(AccessMode::parse("write"), None);
    }
}
