//! Reference Chain Building
//!
//! Computes the synthetic foreign-key fields a child entity inherits from
//! its parent's identity fields. Each field names the root-most identity it
//! derives from (`reference`) and the parent field it is copied from
//! (`relation`).

use indexmap::IndexMap;

use super::names::reference_field_name;
use crate::error::{Result, SchemaError};
use crate::schema::{Entity, FieldDescriptor, Reference, Relation};

/// Reference fields to inject into a direct child of `parent`
pub fn reference_fields(
    parent: &str,
    entity: &Entity,
) -> Result<IndexMap<String, FieldDescriptor>> {
    let mut fields = IndexMap::new();

    for (name, source) in entity.identity_fields() {
        let reference = match &source.reference {
            Some(inherited) => Reference {
                entity: inherited.entity.clone(),
                field: inherited.field.clone(),
                depth: inherited.depth + 1,
            },
            None => Reference {
                entity: parent.to_string(),
                field: name.clone(),
                depth: 1,
            },
        };

        let field_name = reference_field_name(&reference.entity, &reference.field);
        let mut field = FieldDescriptor::new(source.field_type).identity();
        field.enum_values = source.enum_values.clone();
        field.relation = Some(Relation {
            entity: parent.to_string(),
            field: name.clone(),
        });
        field.reference = Some(reference);

        if fields.insert(field_name.clone(), field).is_some() {
            return Err(SchemaError::FieldAlreadyMapped {
                entity: parent.to_string(),
                field: field_name,
            });
        }
    }

    Ok(fields)
}
