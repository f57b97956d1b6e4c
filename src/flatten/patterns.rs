//! Schema Node Detection
//!
//! Detects which kind of node a raw JSON Schema value is. This is pure
//! pattern detection; the walker decides what each kind turns into.

use serde_json::Value;

use super::classify::{declares_type, type_names};
use crate::schema::FieldType;

/// Kind of a single schema node
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode<'a> {
    /// `{"$ref": "#/definitions/X"}`
    Ref(&'a str),
    /// `{"enum": [...]}`
    Enum,
    /// `{"type": "integer"}` or `{"type": ["integer", "null"]}`
    Scalar,
    /// Object with structure: properties and/or wildcard entries
    Object(ObjectNode<'a>),
    /// `{"type": "array", "items": ...}`
    Array(ArrayItems<'a>),
    /// Anything carried as an embedded `json` value
    Opaque,
}

impl SchemaNode<'_> {
    /// Leaf nodes become fields; the rest become related entities
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Enum | Self::Scalar | Self::Opaque)
    }
}

/// Items declaration of an array node
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayItems<'a> {
    /// Homogeneous array, one schema for every element
    Single(&'a Value),
    /// `items` given as a list of schemas
    Tuple(usize),
}

/// Structural parts of an object node, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectNode<'a> {
    pub properties: Vec<(&'a str, &'a Value)>,
    pub required: Vec<&'a str>,
    /// `additionalProperties`, unless absent or `false`
    pub additional: Option<&'a Value>,
    pub patterns: Vec<(&'a str, &'a Value)>,
}

impl<'a> ObjectNode<'a> {
    /// Single-property object wrapping a non-object value as `$value`
    pub fn wrap_value(value: &'a Value) -> Self {
        Self {
            properties: vec![(VALUE_FIELD, value)],
            required: vec![VALUE_FIELD],
            ..Self::default()
        }
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(&name)
    }

    /// Whether any wildcard entries are declared
    pub fn has_wildcards(&self) -> bool {
        self.additional.is_some() || !self.patterns.is_empty()
    }
}

/// Field holding the element/entry value of a synthetic entity
pub const VALUE_FIELD: &str = "$value";

/// Field holding the matched key of an additional/pattern property entry
pub const PROPERTY_FIELD: &str = "$property";

/// Detect the kind of a single schema node
pub fn detect_node(node: &Value) -> SchemaNode<'_> {
    if let Some(target) = node.get("$ref").and_then(Value::as_str) {
        return SchemaNode::Ref(target);
    }

    if node.get("enum").map(Value::is_array).unwrap_or(false) {
        return SchemaNode::Enum;
    }

    let untyped = node.get("type").is_none();

    if declares_type(node, "array") || (untyped && node.get("items").is_some()) {
        return match node.get("items") {
            Some(Value::Array(items)) => SchemaNode::Array(ArrayItems::Tuple(items.len())),
            Some(items) => SchemaNode::Array(ArrayItems::Single(items)),
            None => SchemaNode::Opaque,
        };
    }

    if declares_type(node, "object") || untyped {
        let object = detect_object(node);
        if node.get("properties").is_some() || object.has_wildcards() {
            return SchemaNode::Object(object);
        }
        return SchemaNode::Opaque;
    }

    let (names, _) = type_names(node);
    match names.as_slice() {
        [single] if FieldType::from_json_type(single).is_some() => SchemaNode::Scalar,
        _ => SchemaNode::Opaque,
    }
}

fn detect_object(node: &Value) -> ObjectNode<'_> {
    let properties = node
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.iter().map(|(name, prop)| (name.as_str(), prop)).collect())
        .unwrap_or_default();

    let required = node
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let additional = node
        .get("additionalProperties")
        .filter(|v| v.as_bool() != Some(false));

    let patterns = node
        .get("patternProperties")
        .and_then(Value::as_object)
        .map(|props| props.iter().map(|(pattern, prop)| (pattern.as_str(), prop)).collect())
        .unwrap_or_default();

    ObjectNode {
        properties,
        required,
        additional,
        patterns,
    }
}
