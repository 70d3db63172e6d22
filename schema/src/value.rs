use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeSeq, Serializer};

use std::fmt;
use std::ops::Index;

/// An insertion-ordered string-keyed map.
///
/// SJSON objects keep the order in which keys were written, because the
/// compiler emits declarations in that order. Assigning to an existing key
/// replaces the value in place and keeps the original position.
#[derive(Clone, Default, PartialEq)]
pub struct Map {
    entries: IndexMap<String, Value>,
}

impl Map {
    pub fn new() -> Map {
        Map { entries: IndexMap::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Inserts `value` under `key`, returning the previous value if the key
    /// was already present.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Removes `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        self.entries.fmt(f)
    }
}

/// This type holds dynamic SJSON data.
///
/// Numbers keep the integer/float distinction made by the parser: a token
/// containing `.`, `e` or `E` becomes a [Float](#variant.Float).
#[derive(Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(Map),
}

impl Value {
    /// A short name for the kind of value, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match *self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(*self, Value::Null)
    }

    /// A convenience method to extract the value out of a [Bool](#variant.Bool).
    /// Returns `None` for other value kinds.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// A convenience method to extract the value out of an [Int](#variant.Int).
    /// Returns `None` for other value kinds.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(value) => Some(value),
            _ => None,
        }
    }

    /// Extracts a number as `f64`, accepting both [Int](#variant.Int) and
    /// [Float](#variant.Float).
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Int(value) => Some(value as f64),
            Value::Float(value) => Some(value),
            _ => None,
        }
    }

    /// A convenience method to extract the value out of a [String](#variant.String).
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::String(ref value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// A convenience method to get an array of values out of an [Array](#variant.Array).
    /// Returns an empty slice for other value kinds.
    pub fn as_array(&self) -> &[Value] {
        match *self {
            Value::Array(ref values) => values.as_slice(),
            _ => &[],
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match *self {
            Value::Object(ref map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match *self {
            Value::Object(ref mut map) => Some(map),
            _ => None,
        }
    }

    /// Number of elements in an [Array](#variant.Array) or entries in an
    /// [Object](#variant.Object). Returns `0` for other value kinds.
    pub fn len(&self) -> usize {
        match *self {
            Value::Array(ref values) => values.len(),
            Value::Object(ref map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A convenience method to append to an [Array](#variant.Array). Does
    /// nothing for other value kinds.
    pub fn push(&mut self, value: Value) {
        if let Value::Array(ref mut values) = *self {
            values.push(value);
        }
    }

    /// A convenience method to extract a field out of an [Object](#variant.Object).
    /// Returns `None` for other value kinds or if the field isn't present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match *self {
            Value::Object(ref map) => map.get(name),
            _ => None,
        }
    }

    /// A convenience method to update a field on an [Object](#variant.Object).
    /// Does nothing for other value kinds.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Value::Object(ref mut map) = *self {
            map.insert(name, value);
        }
    }

    /// A convenience method to remove a field on an [Object](#variant.Object).
    /// Does nothing for other value kinds.
    pub fn remove(&mut self, name: &str) {
        if let Value::Object(ref mut map) = *self {
            map.remove(name);
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    /// A convenience method that adds support for `self[index]` expressions.
    /// It will panic if this value isn't an [Array](#variant.Array) or if the
    /// provided index is out of bounds.
    fn index(&self, index: usize) -> &Value {
        match *self {
            Value::Array(ref values) => &values[index],
            _ => panic!("cannot index into a non-array value"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match *self {
            Value::Null => write!(f, "null"),
            Value::Bool(value) => value.fmt(f),
            Value::Int(value) => value.fmt(f),
            Value::Float(value) => value.fmt(f),
            Value::String(ref value) => value.fmt(f),
            Value::Array(ref values) => values.fmt(f),
            Value::Object(ref map) => map.fmt(f),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Object(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(value) => serializer.serialize_bool(value),
            Value::Int(value) => serializer.serialize_i64(value),
            Value::Float(value) => serializer.serialize_f64(value),
            Value::String(ref value) => serializer.serialize_str(value),
            Value::Array(ref values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Value::Object(ref map) => map.serialize(serializer),
        }
    }
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(entries: &[(&str, Value)]) -> Value {
        Value::Object(entries.iter().cloned().collect())
    }

    #[test]
    fn value_basic() {
        let value = Value::Array(vec![
            Value::Bool(true),
            Value::Int(-1),
            Value::Float(0.5),
            Value::String("abc".to_owned()),
            Value::Null,
            object(&[
                ("key1", Value::from("value1")),
                ("key2", Value::from("value2")),
            ]),
        ]);

        assert_eq!(value.len(), 6);
        assert_eq!(value[0].as_bool(), Some(true));
        assert_eq!(value[1].as_int(), Some(-1));
        assert_eq!(value[1].as_float(), Some(-1.0));
        assert_eq!(value[2].as_float(), Some(0.5));
        assert_eq!(value[2].as_int(), None);
        assert_eq!(value[3].as_str(), Some("abc"));
        assert!(value[4].is_null());
        assert_eq!(value.get("key1"), None);
        assert_eq!(value[5].get("key1"), Some(&Value::from("value1")));

        assert_eq!(
            format!("{:?}", value),
            "[true, -1, 0.5, \"abc\", null, {key1: \"value1\", key2: \"value2\"}]"
        );
    }

    #[test]
    fn map_keeps_insertion_order() {
        let mut map = Map::new();
        map.insert("zeta", Value::Int(1));
        map.insert("alpha", Value::Int(2));
        map.insert("mid", Value::Int(3));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);

        // Reassignment keeps the first position but takes the last value.
        let old = map.insert("zeta", Value::Int(10));
        assert_eq!(old, Some(Value::Int(1)));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(map.get("zeta"), Some(&Value::Int(10)));
    }

    #[test]
    fn value_push() {
        let mut value = Value::Array(vec![]);
        assert!(value.is_empty());

        value.push(Value::Int(123));
        assert_eq!(value.len(), 1);
        assert_eq!(value[0], Value::Int(123));

        let mut not_array = Value::Int(1);
        not_array.push(Value::Int(2));
        assert_eq!(not_array, Value::Int(1));
    }

    #[test]
    fn value_set_and_remove() {
        let mut value = object(&[("key", Value::from("value"))]);
        value.set("key", Value::from("changed"));
        value.set("other", Value::Bool(false));
        assert_eq!(value.get("key"), Some(&Value::from("changed")));
        assert_eq!(value.len(), 2);

        value.remove("key");
        assert_eq!(value.get("key"), None);
        assert_eq!(value.len(), 1);
    }

    #[test]
    fn serializes_in_insertion_order() {
        let value = object(&[
            ("b", Value::Int(1)),
            ("a", Value::Array(vec![Value::Float(1.5), Value::Null])),
        ]);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"b":1,"a":[1.5,null]}"#
        );
    }

    #[test]
    fn reassignment_keeps_position_and_remove_keeps_order() {
        let mut map: Map = (0..1000).map(|i| (format!("k{}", i), Value::Int(i))).collect();
        assert_eq!(map.insert("k0", Value::from("last")), Some(Value::Int(0)));
        assert_eq!(map.keys().next(), Some("k0"));
        assert_eq!(map.get("k0"), Some(&Value::from("last")));
        assert_eq!(map.get("k999"), Some(&Value::Int(999)));

        map.remove("k1");
        let keys: Vec<_> = map.keys().take(3).collect();
        assert_eq!(keys, ["k0", "k2", "k3"]);
        assert_eq!(map.len(), 999);
    }
}
