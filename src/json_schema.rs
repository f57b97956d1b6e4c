//! Reverse Mapping
//!
//! Builds a single composite JSON Schema describing a flattened entity map:
//! one definition per entity and one top-level array property per entity
//! whose items reference that definition.

use jsonschema::{Draft, JSONSchema};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::{json, Map, Value};

use crate::error::{Result, SchemaError};
use crate::flatten::names::escape_token;
use crate::schema::{Entity, EntityMap, FieldDescriptor, FieldType};

/// Characters that may not appear raw in a URI fragment, plus `%` and `#`
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// `$ref` to the definition of entity `name`
fn definition_ref(name: &str) -> String {
    let token = escape_token(name);
    format!("#/definitions/{}", utf8_percent_encode(&token, FRAGMENT))
}

/// Composite JSON Schema for `entities`
pub fn to_json_schema(entities: &EntityMap) -> Value {
    let mut definitions = Map::new();
    let mut properties = Map::new();

    for (name, entity) in entities {
        definitions.insert(name.clone(), entity_definition(entity));
        properties.insert(
            name.clone(),
            json!({
                "type": "array",
                "items": { "$ref": definition_ref(name) },
            }),
        );
    }

    json!({
        "definitions": definitions,
        "properties": properties,
        "type": "object",
    })
}

fn entity_definition(entity: &Entity) -> Value {
    let properties: Map<String, Value> = entity
        .fields
        .iter()
        .map(|(name, field)| (name.clone(), field_schema(field)))
        .collect();

    let mut definition = Map::new();
    definition.insert("type".to_string(), json!("object"));
    definition.insert("properties".to_string(), Value::Object(properties));

    let required: Vec<&str> = entity.identity_fields().map(|(name, _)| name.as_str()).collect();
    if !required.is_empty() {
        definition.insert("required".to_string(), json!(required));
    }

    Value::Object(definition)
}

fn field_schema(field: &FieldDescriptor) -> Value {
    let mut schema = Map::new();

    if field.field_type == FieldType::Enum {
        let mut values = field.enum_values.clone().unwrap_or_default();
        if field.nullable {
            values.push(Value::Null);
        }
        schema.insert("enum".to_string(), Value::Array(values));
    } else {
        let mut types = Vec::new();
        if let Some(name) = field.field_type.json_type() {
            types.push(name);
        }
        if field.nullable {
            types.push("null");
        }
        schema.insert("type".to_string(), json!(types));
    }

    if let Some(default) = &field.default {
        schema.insert("default".to_string(), default.clone());
    }

    Value::Object(schema)
}

/// Compile a generated document as Draft 7, rejecting invalid output
pub fn compile_json_schema(schema: &Value) -> Result<JSONSchema> {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| SchemaError::InvalidOutput(e.to_string()))
}
