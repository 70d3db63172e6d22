use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::SjsonError,
    value::{Map, Value},
};

lazy_static! {
    static ref BARE_KEY: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
}

/// Serialize a root object back to SJSON text.
///
/// The root is written without braces, one `key = value` entry per line.
/// Nested objects are indented with `indent` per level; lists stay on one
/// line. Keys are only quoted when they are not plain identifiers.
pub fn to_sjson_string(root: &Map, indent: &str) -> Result<String, SjsonError> {
    let mut out = String::new();
    encode_entries(root, indent, 0, &mut out)?;
    Ok(out)
}

fn escape(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
}

fn encode_key(key: &str, out: &mut String) {
    if BARE_KEY.is_match(key) {
        out.push_str(key);
    } else {
        out.push('"');
        escape(key, out);
        out.push('"');
    }
}

fn encode_entries(map: &Map, indent: &str, level: usize, out: &mut String) -> Result<(), SjsonError> {
    for (key, value) in map.iter() {
        out.push_str(&indent.repeat(level));
        encode_key(key, out);
        out.push_str(" = ");
        encode_value(value, indent, level + 1, out)?;
        out.push('\n');
    }
    Ok(())
}

fn encode_value(value: &Value, indent: &str, level: usize, out: &mut String) -> Result<(), SjsonError> {
    match *value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if b { "true" } else { "false" }),
        Value::Int(i) => out.push_str(&i.to_string()),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(SjsonError::Unsupported(format!("non-finite number {}", f)));
            }
            // `{:?}` keeps a decimal point so the value reads back as a float.
            out.push_str(&format!("{:?}", f));
        }
        Value::String(ref s) => {
            out.push('"');
            escape(s, out);
            out.push('"');
        }
        Value::Array(ref values) => {
            out.push('[');
            for (i, element) in values.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                encode_value(element, indent, level, out)?;
            }
            out.push(']');
        }
        Value::Object(ref map) => {
            out.push_str("{\n");
            encode_entries(map, indent, level, out)?;
            out.push_str(&indent.repeat(level - 1));
            out.push('}');
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn write_nested_document() {
        let root = parse(
            r#"
            namespace = "Game"
            components = { Transform = { position = "vec3", "odd key" = [1, 2.5] } }
            "#,
        )
        .unwrap();

        let text = to_sjson_string(&root, "    ").unwrap();
        assert_eq!(
            text,
            "namespace = \"Game\"\n\
             components = {\n    \
             Transform = {\n        \
             position = \"vec3\"\n        \
             \"odd key\" = [1, 2.5]\n    \
             }\n\
             }\n"
        );
    }

    #[test]
    fn written_text_parses_back() {
        let root = parse("s = \"tab\\there \\\"q\\\" \\\\\"\nf = 2.0\nn = null").unwrap();
        let text = to_sjson_string(&root, "\t").unwrap();
        assert_eq!(parse(&text).unwrap(), root);
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let mut root = Map::new();
        root.insert("x", Value::Float(f64::NAN));
        assert!(matches!(to_sjson_string(&root, ""), Err(SjsonError::Unsupported(_))));
    }
}
