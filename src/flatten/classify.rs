//! Type Classification
//!
//! Maps a leaf schema node's `type`/`enum` declaration onto a [`FieldType`],
//! extracting nullability. Classification never fails: anything it does not
//! recognize is carried as an opaque `json` field.

use serde_json::Value;

use crate::schema::{FieldDescriptor, FieldType};

/// Result of classifying a leaf node
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub field_type: FieldType,
    /// Enum literals with `null` removed, present iff `field_type` is `Enum`
    pub enum_values: Option<Vec<Value>>,
    pub nullable: bool,
}

impl Classification {
    fn of(field_type: FieldType, nullable: bool) -> Self {
        Self {
            field_type,
            enum_values: None,
            nullable,
        }
    }

    /// Build the field descriptor for this classification
    pub fn into_field(self, default: Option<Value>) -> FieldDescriptor {
        let mut field = FieldDescriptor::new(self.field_type);
        field.enum_values = self.enum_values;
        field.nullable = self.nullable;
        field.default = default;
        field
    }
}

/// Classify a leaf schema node
pub fn classify(node: &Value) -> Classification {
    // `additionalProperties: true` accepts any value, including null
    if node.as_bool() == Some(true) {
        return Classification::of(FieldType::Json, true);
    }

    if let Some(values) = node.get("enum").and_then(Value::as_array) {
        let nullable = values.iter().any(Value::is_null);
        let literals: Vec<Value> = values.iter().filter(|v| !v.is_null()).cloned().collect();
        return Classification {
            field_type: FieldType::Enum,
            enum_values: Some(literals),
            nullable,
        };
    }

    let (names, nullable) = type_names(node);
    match names.as_slice() {
        [single] => {
            let field_type = FieldType::from_json_type(single).unwrap_or_else(|| {
                if !matches!(*single, "object" | "array") {
                    tracing::warn!(type_name = *single, "unrecognized type, treating as json");
                }
                FieldType::Json
            });
            Classification::of(field_type, nullable)
        }
        _ => Classification::of(FieldType::Json, nullable),
    }
}

/// Non-null type names declared by a node, and whether `null` was among them
pub(crate) fn type_names(node: &Value) -> (Vec<&str>, bool) {
    match node.get("type") {
        Some(Value::String(name)) if name == "null" => (Vec::new(), true),
        Some(Value::String(name)) => (vec![name.as_str()], false),
        Some(Value::Array(names)) => {
            let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            let nullable = names.contains(&"null");
            (names.into_iter().filter(|n| *n != "null").collect(), nullable)
        }
        _ => (Vec::new(), false),
    }
}

/// Whether a node's `type` names `kind`, alone or in a union with `null`
pub(crate) fn declares_type(node: &Value, kind: &str) -> bool {
    let (names, _) = type_names(node);
    names == [kind]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_scalars() {
        for (name, expected) in [
            ("boolean", FieldType::Boolean),
            ("integer", FieldType::Integer),
            ("number", FieldType::Number),
            ("string", FieldType::String),
        ] {
            let c = classify(&json!({ "type": name }));
            assert_eq!(c.field_type, expected);
            assert!(!c.nullable);
            assert!(c.enum_values.is_none());
        }
    }

    #[test]
    fn test_classify_nullable_union() {
        let c = classify(&json!({ "type": ["integer", "null"] }));
        assert_eq!(c.field_type, FieldType::Integer);
        assert!(c.nullable);
    }

    #[test]
    fn test_classify_enum_strips_null() {
        let c = classify(&json!({ "enum": ["option1", "option2", null] }));
        assert_eq!(c.field_type, FieldType::Enum);
        assert_eq!(c.enum_values, Some(vec![json!("option1"), json!("option2")]));
        assert!(c.nullable);
    }

    #[test]
    fn test_classify_opaque() {
        assert_eq!(classify(&json!({ "type": "object" })).field_type, FieldType::Json);
        assert_eq!(classify(&json!({})).field_type, FieldType::Json);
        assert_eq!(
            classify(&json!({ "type": ["string", "integer"] })).field_type,
            FieldType::Json
        );

        let c = classify(&json!({ "type": ["object", "null"] }));
        assert_eq!(c.field_type, FieldType::Json);
        assert!(c.nullable);
    }

    #[test]
    fn test_classify_true_schema() {
        let c = classify(&json!(true));
        assert_eq!(c.field_type, FieldType::Json);
        assert!(c.nullable);
    }

    #[test]
    fn test_into_field_keeps_default() {
        let field = classify(&json!({ "type": "integer" })).into_field(Some(json!(0)));
        assert_eq!(field.default, Some(json!(0)));
    }
}
