//! Recursive Descent
//!
//! Walks a JSON Schema document from its root object and produces one
//! [`Entity`] per object, array element and wildcard entry. Leaf properties
//! of an object become fields first, so the entity's identity is final
//! before any related entity derives its reference fields from it.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use super::classify::classify;
use super::names::{child_name, pointer_join, ChildName, WildcardCounter};
use super::patterns::{
    detect_node, ArrayItems, ObjectNode, SchemaNode, PROPERTY_FIELD, VALUE_FIELD,
};
use super::references::reference_fields;
use crate::error::{Result, SchemaError, UnsupportedSchema};
use crate::schema::{Entity, EntityMap, FieldDescriptor, FieldType};

/// A node with its `$ref` chain followed to the end
struct Resolved<'s> {
    node: &'s Value,
    /// Pointers followed, in order
    pointers: Vec<String>,
    /// First `default` declared along the chain
    default: Option<Value>,
}

/// A related entity waiting for its parent's fields to be final
struct Child<'s> {
    name: String,
    origin: String,
    /// `$ref` pointers followed to reach this child
    pointers: Vec<String>,
    body: ObjectNode<'s>,
    intrinsic: IndexMap<String, FieldDescriptor>,
    custom_schema: Option<Value>,
}

/// Single-use flattening state for one document
pub struct Flattener<'s> {
    document: &'s Value,
    entities: IndexMap<String, Entity>,
    /// `$ref` targets on the active recursion path
    active_refs: Vec<String>,
}

impl<'s> Flattener<'s> {
    pub fn new(document: &'s Value) -> Self {
        Self {
            document,
            entities: IndexMap::new(),
            active_refs: Vec::new(),
        }
    }

    /// Flatten the document, naming its root entity `root_entity`
    pub fn flatten(mut self, root_entity: &str) -> Result<EntityMap> {
        let object = match detect_node(self.document) {
            SchemaNode::Object(object) => object,
            other => {
                return Err(SchemaError::InvalidFormat(format!(
                    "root schema must describe an object, found {:?}",
                    other
                )))
            }
        };

        self.active_refs.push("#".to_string());
        self.flatten_object(root_entity, &object, Entity::new("#"))?;

        tracing::debug!(root = root_entity, entities = self.entities.len(), "schema flattened");
        Ok(EntityMap(self.entities))
    }

    fn flatten_object(
        &mut self,
        name: &str,
        object: &ObjectNode<'s>,
        mut entity: Entity,
    ) -> Result<()> {
        let origin = entity.origin.clone();
        let mut children = Vec::new();

        for &(property, value) in &object.properties {
            let property_origin = pointer_join(&origin, &["properties", property]);
            let resolved = self.resolve(value, &property_origin)?;

            match detect_node(resolved.node) {
                SchemaNode::Object(body) => {
                    children.push(object_child(name, property, property_origin, resolved, body));
                }
                SchemaNode::Array(items) => {
                    let child = self.array_child(name, property, property_origin, resolved, items)?;
                    children.push(child);
                }
                _ => {
                    let mut field = classify(resolved.node).into_field(resolved.default);
                    field.identity = object.is_required(property);
                    insert_field(&mut entity, name, property, field)?;
                }
            }
        }

        let mut wildcards = WildcardCounter::default();
        if let Some(additional) = object.additional {
            let entry_origin = pointer_join(&origin, &["additionalProperties"]);
            children.push(self.wildcard_child(name, wildcards.next(), entry_origin, additional)?);
        }
        for &(pattern, value) in &object.patterns {
            let entry_origin = pointer_join(&origin, &["patternProperties", pattern]);
            children.push(self.wildcard_child(name, wildcards.next(), entry_origin, value)?);
        }

        tracing::debug!(
            entity = name,
            origin = %origin,
            fields = entity.fields.len(),
            "entity discovered"
        );
        self.entities.insert(name.to_string(), entity);

        for child in children {
            self.enter(name, child)?;
        }

        Ok(())
    }

    /// Build a child entity under `parent`, or link the existing one
    fn enter(&mut self, parent: &str, child: Child<'s>) -> Result<()> {
        if let Some(target) = child.pointers.iter().find(|p| self.active_refs.contains(*p)) {
            return Err(UnsupportedSchema::RelationToItself {
                target: target.clone(),
                origin: child.origin,
            }
            .into());
        }

        let parent_entity = self
            .entities
            .get(parent)
            .ok_or_else(|| {
                SchemaError::InvalidFormat(format!("unknown parent entity '{}'", parent))
            })?;

        if !parent_entity.has_identity() {
            return Err(UnsupportedSchema::NotIdentifiable {
                entity: parent.to_string(),
                origin: child.origin,
            }
            .into());
        }

        if let Some(existing) = self.entities.get(&child.name) {
            if existing.origin != child.origin {
                return Err(SchemaError::EntityNameCollision {
                    name: child.name,
                    existing: existing.origin.clone(),
                    origin: child.origin,
                });
            }
            tracing::debug!(entity = %child.name, related_to = parent, "sharing entity");
            self.link(parent, &child.name);
            return Ok(());
        }

        let mut entity = Entity::new(child.origin);
        entity.fields = reference_fields(parent, parent_entity)?;
        for (field_name, field) in child.intrinsic {
            insert_field(&mut entity, &child.name, &field_name, field)?;
        }
        entity.custom_schema = child.custom_schema;

        self.link(parent, &child.name);

        let depth = self.active_refs.len();
        self.active_refs.extend(child.pointers);
        let result = self.flatten_object(&child.name, &child.body, entity);
        self.active_refs.truncate(depth);
        result
    }

    fn link(&mut self, parent: &str, child: &str) {
        if let Some(entity) = self.entities.get_mut(parent) {
            if !entity.related_entities.iter().any(|name| name == child) {
                entity.related_entities.push(child.to_string());
            }
        }
    }

    fn array_child(
        &self,
        parent: &str,
        property: &str,
        property_origin: String,
        resolved: Resolved<'s>,
        items: ArrayItems<'s>,
    ) -> Result<Child<'s>> {
        let base = resolved.pointers.last().cloned().unwrap_or(property_origin);
        let items = match items {
            ArrayItems::Single(items) => items,
            ArrayItems::Tuple(_) => {
                return Err(UnsupportedSchema::TupleArray { origin: base }.into())
            }
        };

        let items_origin = pointer_join(&base, &["items"]);
        let item = self.resolve(items, &items_origin)?;
        let (name, origin) = match item.pointers.last() {
            Some(pointer) => (child_name(parent, ChildName::Reference(pointer)), pointer.clone()),
            None => (child_name(parent, ChildName::Items(property)), items_origin),
        };

        let mut pointers = resolved.pointers;
        pointers.extend(item.pointers);

        let child = match detect_node(item.node) {
            SchemaNode::Object(body) => Child {
                name,
                origin,
                pointers,
                body,
                intrinsic: IndexMap::new(),
                custom_schema: None,
            },
            _ => {
                let properties = value_properties(item.node.clone());
                Child {
                    name,
                    origin,
                    pointers,
                    body: ObjectNode::wrap_value(item.node),
                    intrinsic: IndexMap::new(),
                    custom_schema: Some(custom_schema(&[VALUE_FIELD], properties)),
                }
            }
        };
        Ok(child)
    }

    fn wildcard_child(
        &self,
        parent: &str,
        index: usize,
        origin: String,
        value: &'s Value,
    ) -> Result<Child<'s>> {
        let name = child_name(parent, ChildName::Wildcard(index));
        let mut intrinsic = IndexMap::new();
        intrinsic.insert(
            PROPERTY_FIELD.to_string(),
            FieldDescriptor::new(FieldType::String).identity(),
        );

        if value.as_bool() == Some(true) {
            let mut properties = property_key();
            properties.insert(VALUE_FIELD.to_string(), json!({ "type": ["object", "null"] }));
            return Ok(Child {
                name,
                origin,
                pointers: Vec::new(),
                body: ObjectNode::wrap_value(value),
                intrinsic,
                custom_schema: Some(custom_schema(&[PROPERTY_FIELD, VALUE_FIELD], properties)),
            });
        }

        let resolved = self.resolve(value, &origin)?;
        let origin = resolved.pointers.last().cloned().unwrap_or(origin);
        let child = match detect_node(resolved.node) {
            SchemaNode::Object(body) => {
                let mut properties = property_key();
                for &(property, schema) in &body.properties {
                    properties.insert(property.to_string(), schema.clone());
                }
                let mut required = vec![PROPERTY_FIELD];
                required.extend(body.required.iter().copied());
                Child {
                    name,
                    origin,
                    pointers: resolved.pointers,
                    custom_schema: Some(custom_schema(&required, properties)),
                    body,
                    intrinsic,
                }
            }
            _ => {
                let mut properties = property_key();
                properties.insert(VALUE_FIELD.to_string(), resolved.node.clone());
                Child {
                    name,
                    origin,
                    pointers: resolved.pointers,
                    body: ObjectNode::wrap_value(resolved.node),
                    intrinsic,
                    custom_schema: Some(custom_schema(&[PROPERTY_FIELD, VALUE_FIELD], properties)),
                }
            }
        };
        Ok(child)
    }

    /// Follow `$ref` until a concrete node is reached
    fn resolve(&self, value: &'s Value, origin: &str) -> Result<Resolved<'s>> {
        let mut node = value;
        let mut pointers: Vec<String> = Vec::new();
        let mut default = value.get("default").cloned();

        while let Some(target) = node.get("$ref").and_then(Value::as_str) {
            if pointers.iter().any(|p| p == target) {
                return Err(UnsupportedSchema::RelationToItself {
                    target: target.to_string(),
                    origin: origin.to_string(),
                }
                .into());
            }
            node = lookup(self.document, target).ok_or_else(|| SchemaError::UnresolvedReference {
                reference: target.to_string(),
                origin: origin.to_string(),
            })?;
            pointers.push(target.to_string());
            if default.is_none() {
                default = node.get("default").cloned();
            }
        }

        Ok(Resolved { node, pointers, default })
    }
}

fn object_child<'s>(
    parent: &str,
    property: &str,
    property_origin: String,
    resolved: Resolved<'s>,
    body: ObjectNode<'s>,
) -> Child<'s> {
    let (name, origin) = match resolved.pointers.last() {
        Some(pointer) => (child_name(parent, ChildName::Reference(pointer)), pointer.clone()),
        None => (child_name(parent, ChildName::Property(property)), property_origin),
    };
    Child {
        name,
        origin,
        pointers: resolved.pointers,
        body,
        intrinsic: IndexMap::new(),
        custom_schema: None,
    }
}

/// Resolve a local JSON Pointer reference against the document
fn lookup<'s>(document: &'s Value, target: &str) -> Option<&'s Value> {
    match target.strip_prefix('#')? {
        "" => Some(document),
        pointer => document.pointer(pointer),
    }
}

fn insert_field(
    entity: &mut Entity,
    entity_name: &str,
    field_name: &str,
    field: FieldDescriptor,
) -> Result<()> {
    if entity.fields.contains_key(field_name) {
        return Err(SchemaError::FieldAlreadyMapped {
            entity: entity_name.to_string(),
            field: field_name.to_string(),
        });
    }
    tracing::trace!(entity = entity_name, field = field_name, "field mapped");
    entity.fields.insert(field_name.to_string(), field);
    Ok(())
}

fn property_key() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(PROPERTY_FIELD.to_string(), json!({ "type": "string" }));
    properties
}

fn value_properties(schema: Value) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(VALUE_FIELD.to_string(), schema);
    properties
}

fn custom_schema(required: &[&str], properties: Map<String, Value>) -> Value {
    json!({
        "type": "object",
        "required": required,
        "properties": properties,
    })
}
