//! Flattened entity model
//!
//! The output of [`crate::flatten`]: a set of relational entity descriptors,
//! keyed by entity name, in discovery order (parents before children).

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Semantic kind of a flattened field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Boolean,
    Integer,
    Number,
    String,
    Enum,
    /// Embedded arbitrary value (opaque object, wildcard value)
    Json,
}

impl FieldType {
    /// Map a JSON Schema scalar type name
    pub fn from_json_type(type_str: &str) -> Option<Self> {
        match type_str {
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    /// JSON Schema `type` name used when mapping back to a validation schema
    pub fn json_type(&self) -> Option<&'static str> {
        match self {
            Self::Boolean => Some("boolean"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::String => Some("string"),
            Self::Json => Some("object"),
            Self::Enum => None,
        }
    }
}

/// Root-most identity a reference field derives from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub entity: String,
    pub field: String,
    pub depth: u32,
}

/// Immediate parent field a reference value is copied from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub entity: String,
    pub field: String,
}

/// A single flattened field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,

    /// Declared default; `Some(Value::Null)` is an explicit `default: null`
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub identity: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<Relation>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl FieldDescriptor {
    /// Create a plain field of the given type
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            enum_values: None,
            nullable: false,
            default: None,
            identity: false,
            reference: None,
            relation: None,
        }
    }

    /// Mark this field as part of the entity's key
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    /// Whether this field was synthesized from an ancestor's key
    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }
}

/// One flattened, relationally-shaped record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// JSON Pointer of the node this entity was produced from
    pub origin: String,

    pub fields: IndexMap<String, FieldDescriptor>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_entities: Vec<String>,

    /// Raw schema for synthetic entities whose rows can't be described by fields alone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_schema: Option<Value>,
}

impl Entity {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            fields: IndexMap::new(),
            related_entities: Vec::new(),
            custom_schema: None,
        }
    }

    /// Identity fields in declaration order
    pub fn identity_fields(&self) -> impl Iterator<Item = (&String, &FieldDescriptor)> {
        self.fields.iter().filter(|(_, field)| field.identity)
    }

    pub fn has_identity(&self) -> bool {
        self.fields.values().any(|field| field.identity)
    }
}

/// All entities produced by one flatten call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityMap(pub(crate) IndexMap<String, Entity>);

impl EntityMap {
    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entities in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entity)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn into_inner(self) -> IndexMap<String, Entity> {
        self.0
    }
}

impl From<IndexMap<String, Entity>> for EntityMap {
    fn from(entities: IndexMap<String, Entity>) -> Self {
        Self(entities)
    }
}

impl<'a> IntoIterator for &'a EntityMap {
    type Item = (&'a String, &'a Entity);
    type IntoIter = indexmap::map::Iter<'a, String, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
