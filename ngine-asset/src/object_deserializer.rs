use ngine_base::Name;
use serde_json::Value;

use crate::{AssetError, AssetResult};

/// Hierarchical field reader consumed by asset load hooks.
///
/// Every `deserialize_*` call looks a field up by name in the current scope. An empty name means
/// the element at the current index, which is how arrays and dictionaries are iterated. A missing
/// field yields `None`; a field that exists but does not hold a value of the requested type
/// yields `Some(default)`.
pub trait ObjectDeserializer {
    /// Number of fields or entries in the current scope
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set_index(
        &mut self,
        index: usize,
    );

    fn index(&self) -> usize;

    /// Name of the field (or dictionary key) at the current index
    fn name(&self) -> Name;

    /// Serialization version of the current scope
    fn version(&self) -> u8;

    fn deserialize_u64(
        &self,
        name: &Name,
        default: u64,
    ) -> Option<u64>;

    fn deserialize_i64(
        &self,
        name: &Name,
        default: i64,
    ) -> Option<i64>;

    fn deserialize_bool(
        &self,
        name: &Name,
        default: bool,
    ) -> Option<bool>;

    fn deserialize_f64(
        &self,
        name: &Name,
        default: f64,
    ) -> Option<f64>;

    fn deserialize_string(
        &self,
        name: &Name,
        default: &str,
    ) -> Option<String>;

    /// Enters the named sub-object. Returns false if there is no such field, in which case the
    /// entered scope is empty. Must be balanced by `end_object`.
    fn begin_object(
        &mut self,
        name: &Name,
    ) -> bool;

    fn end_object(&mut self);

    fn begin_array(
        &mut self,
        name: &Name,
    ) -> bool;

    fn end_array(&mut self);

    fn begin_dictionary(
        &mut self,
        name: &Name,
    ) -> bool;

    fn end_dictionary(&mut self);

    // Narrowing forms. A value that does not fit the requested type yields None.

    fn deserialize_u8(
        &self,
        name: &Name,
        default: u8,
    ) -> Option<u8> {
        self.deserialize_u64(name, default as u64)
            .and_then(|x| u8::try_from(x).ok())
    }

    fn deserialize_u16(
        &self,
        name: &Name,
        default: u16,
    ) -> Option<u16> {
        self.deserialize_u64(name, default as u64)
            .and_then(|x| u16::try_from(x).ok())
    }

    fn deserialize_u32(
        &self,
        name: &Name,
        default: u32,
    ) -> Option<u32> {
        self.deserialize_u64(name, default as u64)
            .and_then(|x| u32::try_from(x).ok())
    }

    fn deserialize_i8(
        &self,
        name: &Name,
        default: i8,
    ) -> Option<i8> {
        self.deserialize_i64(name, default as i64)
            .and_then(|x| i8::try_from(x).ok())
    }

    fn deserialize_i16(
        &self,
        name: &Name,
        default: i16,
    ) -> Option<i16> {
        self.deserialize_i64(name, default as i64)
            .and_then(|x| i16::try_from(x).ok())
    }

    fn deserialize_i32(
        &self,
        name: &Name,
        default: i32,
    ) -> Option<i32> {
        self.deserialize_i64(name, default as i64)
            .and_then(|x| i32::try_from(x).ok())
    }

    fn deserialize_f32(
        &self,
        name: &Name,
        default: f32,
    ) -> Option<f32> {
        self.deserialize_f64(name, default as f64)
            .map(|x| x as f32)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum ScopeMode {
    Object,
    Array,
    Dictionary,
}

impl ScopeMode {
    fn list_key(self) -> &'static str {
        match self {
            ScopeMode::Object => "fields",
            ScopeMode::Array | ScopeMode::Dictionary => "entries",
        }
    }
}

struct Scope {
    mode: ScopeMode,
    // Position of the field this scope was entered through, in the parent scope's list
    field: Option<usize>,
    index: usize,
    version: u8,
}

fn list<'v>(
    value: &'v Value,
    key: &str,
) -> &'v [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|x| x.as_slice())
        .unwrap_or_default()
}

fn declared_version(value: &Value) -> Option<u8> {
    value
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|x| u8::try_from(x).ok())
}

/// [`ObjectDeserializer`] over a JSON document of this shape:
///
/// ```json
/// {
///     "version": 0,
///     "fields": [
///         { "name": "count", "value": 10 },
///         { "name": "tags", "entries": [ { "value": "a" }, { "value": "b" } ] },
///         { "name": "lookup", "entries": [ { "key": "k", "value": "v" } ] },
///         { "name": "child", "version": 1, "fields": [ { "name": "x", "value": 1.5 } ] }
///     ]
/// }
/// ```
///
/// Scalars may also be written as strings. A nested object without its own `version` inherits the
/// version of its parent.
pub struct JsonObjectDeserializer {
    document: Value,
    scopes: Vec<Scope>,
}

impl JsonObjectDeserializer {
    pub fn new(
        document: Value,
        default_version: u8,
    ) -> AssetResult<Self> {
        let valid = document.is_object()
            && document
                .get("fields")
                .map(|x| x.is_array())
                .unwrap_or(true);
        if !valid {
            log::warn!("Object archive root must be an object with a fields list");
            return Err(AssetError::InvalidArchive);
        }

        let root = Scope {
            mode: ScopeMode::Object,
            field: None,
            index: 0,
            version: declared_version(&document).unwrap_or(default_version),
        };

        Ok(JsonObjectDeserializer {
            document,
            scopes: vec![root],
        })
    }

    pub fn from_slice(
        bytes: &[u8],
        default_version: u8,
    ) -> AssetResult<Self> {
        let document: Value = serde_json::from_slice(bytes).map_err(|e| {
            log::warn!("Object archive is not valid json: {}", e);
            AssetError::InvalidArchive
        })?;
        Self::new(document, default_version)
    }

    pub fn from_json(
        json: &str,
        default_version: u8,
    ) -> AssetResult<Self> {
        Self::from_slice(json.as_bytes(), default_version)
    }

    fn current(&self) -> &Scope {
        // The root scope is never popped
        &self.scopes[self.scopes.len() - 1]
    }

    fn items(&self) -> &[Value] {
        let mut items = list(&self.document, "fields");
        for scope in &self.scopes[1..] {
            items = match scope.field.and_then(|x| items.get(x)) {
                Some(item) => list(item, scope.mode.list_key()),
                None => &[],
            };
        }

        items
    }

    fn find_field(
        &self,
        name: &Name,
    ) -> Option<usize> {
        let scope = self.current();
        let items = self.items();
        let key = match scope.mode {
            ScopeMode::Object => "name",
            ScopeMode::Dictionary => "key",
            ScopeMode::Array => return (scope.index < items.len()).then(|| scope.index),
        };

        if name.is_empty() {
            (scope.index < items.len()).then(|| scope.index)
        } else {
            items
                .iter()
                .position(|x| x.get(key).and_then(Value::as_str) == Some(name.as_str()))
        }
    }

    fn find_value(
        &self,
        name: &Name,
    ) -> Option<&Value> {
        let index = self.find_field(name)?;
        self.items()[index].get("value")
    }

    fn begin(
        &mut self,
        mode: ScopeMode,
        name: &Name,
    ) -> bool {
        let field = self.find_field(name);
        let parent_version = self.current().version;
        let version = match (mode, field) {
            (ScopeMode::Object, Some(index)) => {
                declared_version(&self.items()[index]).unwrap_or(parent_version)
            }
            _ => parent_version,
        };

        self.scopes.push(Scope {
            mode,
            field,
            index: 0,
            version,
        });

        field.is_some()
    }

    fn end(
        &mut self,
        mode: ScopeMode,
    ) {
        if self.scopes.len() <= 1 {
            log::warn!("Unbalanced end of {:?} scope in object archive", mode);
            return;
        }

        debug_assert_eq!(self.current().mode, mode);
        self.scopes.pop();
    }
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|x| x != 0.0),
        Value::String(s) => match s.chars().next() {
            Some('1' | 't' | 'T' | 'y' | 'Y') => Some(true),
            Some('0' | 'f' | 'F' | 'n' | 'N') => Some(false),
            _ => None,
        },
        _ => None,
    }
}

impl ObjectDeserializer for JsonObjectDeserializer {
    fn len(&self) -> usize {
        self.items().len()
    }

    fn set_index(
        &mut self,
        index: usize,
    ) {
        let last = self.scopes.len() - 1;
        self.scopes[last].index = index;
    }

    fn index(&self) -> usize {
        self.current().index
    }

    fn name(&self) -> Name {
        let scope = self.current();
        let key = match scope.mode {
            ScopeMode::Object => "name",
            ScopeMode::Dictionary => "key",
            ScopeMode::Array => return Name::none(),
        };

        self.items()
            .get(scope.index)
            .and_then(|x| x.get(key))
            .and_then(Value::as_str)
            .map(Name::new)
            .unwrap_or_default()
    }

    fn version(&self) -> u8 {
        self.current().version
    }

    fn deserialize_u64(
        &self,
        name: &Name,
        default: u64,
    ) -> Option<u64> {
        let value = self.find_value(name)?;
        let parsed = match value {
            Value::String(s) => s.trim().parse().ok(),
            _ => value.as_u64(),
        };
        Some(parsed.unwrap_or(default))
    }

    fn deserialize_i64(
        &self,
        name: &Name,
        default: i64,
    ) -> Option<i64> {
        let value = self.find_value(name)?;
        let parsed = match value {
            Value::String(s) => s.trim().parse().ok(),
            _ => value.as_i64(),
        };
        Some(parsed.unwrap_or(default))
    }

    fn deserialize_bool(
        &self,
        name: &Name,
        default: bool,
    ) -> Option<bool> {
        let value = self.find_value(name)?;
        Some(parse_bool(value).unwrap_or(default))
    }

    fn deserialize_f64(
        &self,
        name: &Name,
        default: f64,
    ) -> Option<f64> {
        let value = self.find_value(name)?;
        let parsed = match value {
            Value::String(s) => s.trim().parse().ok(),
            _ => value.as_f64(),
        };
        Some(parsed.unwrap_or(default))
    }

    fn deserialize_string(
        &self,
        name: &Name,
        default: &str,
    ) -> Option<String> {
        let value = self.find_value(name)?;
        Some(match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => default.to_string(),
        })
    }

    fn begin_object(
        &mut self,
        name: &Name,
    ) -> bool {
        self.begin(ScopeMode::Object, name)
    }

    fn end_object(&mut self) {
        self.end(ScopeMode::Object)
    }

    fn begin_array(
        &mut self,
        name: &Name,
    ) -> bool {
        self.begin(ScopeMode::Array, name)
    }

    fn end_array(&mut self) {
        self.end(ScopeMode::Array)
    }

    fn begin_dictionary(
        &mut self,
        name: &Name,
    ) -> bool {
        self.begin(ScopeMode::Dictionary, name)
    }

    fn end_dictionary(&mut self) {
        self.end(ScopeMode::Dictionary)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::BTreeMap;

    const OBJECT_JSON: &str = r#"{
        "fields": [
            { "name": "test", "value": 10 },
            { "name": "long text", "value": "This is a very long text with multiple spaces. It is stored as a plain string value" },
            { "name": "dictionary", "entries": [
                { "key": "test", "value": "hello" },
                { "key": "hello", "value": "world" }
            ] },
            { "name": "array", "entries": [
                { "value": 10 },
                { "value": "13" }
            ] },
            { "name": "object", "version": 1, "fields": [
                { "name": "value", "value": 666 },
                { "name": "flags", "entries": [ { "value": true }, { "value": "no" } ] }
            ] },
            { "name": "ratio", "value": 0.5 },
            { "name": "big", "value": 300 }
        ]
    }"#;

    #[test]
    fn invalid_json_is_rejected() {
        assert!(matches!(
            JsonObjectDeserializer::from_json(r#"{ "fields": [ { "name" "#, 0),
            Err(AssetError::InvalidArchive)
        ));
        assert!(matches!(
            JsonObjectDeserializer::from_json("[1, 2, 3]", 0),
            Err(AssetError::InvalidArchive)
        ));
        assert!(matches!(
            JsonObjectDeserializer::from_json(r#"{ "fields": 3 }"#, 0),
            Err(AssetError::InvalidArchive)
        ));
    }

    #[test]
    fn read_object_document() {
        let mut archive = JsonObjectDeserializer::from_json(OBJECT_JSON, 0).unwrap();
        assert_eq!(archive.version(), 0);
        assert_eq!(archive.len(), 7);

        assert_eq!(archive.deserialize_i32(&Name::new("test"), 0), Some(10));
        assert_eq!(
            archive
                .deserialize_string(&Name::new("long text"), "")
                .unwrap(),
            "This is a very long text with multiple spaces. It is stored as a plain string value"
        );

        // Dictionary
        let mut dictionary = BTreeMap::default();
        assert!(archive.begin_dictionary(&Name::new("dictionary")));
        assert_eq!(archive.version(), 0);
        assert_eq!(archive.len(), 2);
        for i in 0..archive.len() {
            archive.set_index(i);
            let key = archive.name();
            let value = archive.deserialize_string(&Name::none(), "").unwrap();
            dictionary.insert(key.to_string(), value);
        }

        assert_eq!(
            archive.deserialize_string(&Name::new("test"), ""),
            Some("hello".to_string())
        );
        // Exists but is not a number
        assert_eq!(archive.deserialize_i16(&Name::new("test"), 0), Some(0));
        archive.end_dictionary();

        assert_eq!(dictionary["test"], "hello");
        assert_eq!(dictionary["hello"], "world");

        // Array
        assert!(archive.begin_array(&Name::new("array")));
        assert_eq!(archive.version(), 0);
        let mut array = Vec::default();
        for i in 0..archive.len() {
            archive.set_index(i);
            array.push(archive.deserialize_i32(&Name::none(), 0).unwrap());
        }
        assert_eq!(array, vec![10, 13]);
        assert!(archive.name().is_empty());
        archive.end_array();

        // Sub-object with its own version
        assert!(archive.begin_object(&Name::new("object")));
        assert_eq!(archive.version(), 1);
        assert_eq!(archive.deserialize_i32(&Name::new("value"), 0), Some(666));
        assert!(archive.begin_array(&Name::new("flags")));
        assert_eq!(archive.version(), 1);
        archive.set_index(0);
        assert_eq!(archive.deserialize_bool(&Name::none(), false), Some(true));
        archive.set_index(1);
        assert_eq!(archive.deserialize_bool(&Name::none(), true), Some(false));
        archive.end_array();
        archive.end_object();
        assert_eq!(archive.version(), 0);

        assert_eq!(archive.deserialize_f32(&Name::new("ratio"), 0.0), Some(0.5));
        assert_eq!(archive.deserialize_u8(&Name::new("big"), 0), None);
        assert_eq!(archive.deserialize_u16(&Name::new("big"), 0), Some(300));

        // Missing fields
        assert_eq!(archive.deserialize_i8(&Name::new("unexisting"), 0), None);
        assert!(!archive.begin_object(&Name::new("unexisting")));
        assert!(archive.is_empty());
        archive.end_object();
        assert_eq!(archive.len(), 7);
    }

    #[test]
    fn root_version_defaults_to_entry_version() {
        let archive = JsonObjectDeserializer::from_json(r#"{ "fields": [] }"#, 4).unwrap();
        assert_eq!(archive.version(), 4);

        let archive =
            JsonObjectDeserializer::from_json(r#"{ "version": 2, "fields": [] }"#, 4).unwrap();
        assert_eq!(archive.version(), 2);
    }

    #[test]
    fn iterate_object_fields() {
        let mut archive = JsonObjectDeserializer::from_json(OBJECT_JSON, 0).unwrap();
        archive.set_index(5);
        assert_eq!(archive.index(), 5);
        assert_eq!(archive.name(), "ratio");
        assert_eq!(archive.deserialize_f64(&Name::none(), 0.0), Some(0.5));
    }
}
