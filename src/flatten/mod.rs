//! Schema Flattening
//!
//! Turns a nested JSON Schema document into a flat map of named entities,
//! each a table-like record with scalar fields, identity fields and
//! synthetic reference fields tying it to its ancestors.
//!
//! ```text
//! collection                      { id* }
//! ├── collection/complexObject    { $collection~id*, name }
//! │   └── collection/complexObject[@0]
//! │                               { $collection~id*, $property*, $value* }
//! └── collection/tags[@]          { $collection~id*, $value* }
//! ```

pub mod analysis;
pub mod classify;
pub mod names;
pub mod patterns;
pub mod references;
pub mod walker;

pub use analysis::{EntityGraph, ReferenceViolation};
pub use classify::{classify, Classification};
pub use patterns::{detect_node, ArrayItems, ObjectNode, SchemaNode, PROPERTY_FIELD, VALUE_FIELD};
pub use walker::Flattener;

use serde_json::Value;

use crate::error::Result;
use crate::schema::EntityMap;

/// Flatten `schema` into entities, naming the root entity `root_entity`
pub fn flatten(schema: &Value, root_entity: &str) -> Result<EntityMap> {
    Flattener::new(schema).flatten(root_entity)
}
