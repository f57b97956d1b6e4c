//! Schema Flatten
//!
//! Flattens nested JSON Schema documents into a set of relational entities
//! suitable for loading into tabular storage, and maps entity sets back to
//! a composite JSON Schema.
//!
//! ## Features
//!
//! - **Flattening**: every object, array element and wildcard entry becomes a
//!   named entity with scalar fields
//! - **Identity Propagation**: required scalars form an entity's key; children
//!   inherit it as `$<root>~<field>` reference fields
//! - **Reverse Mapping**: a single Draft 7 document describing all entities
//! - **Relation Analysis**: referential completeness checks and load order
//! - **Parameter Remapping**: selector-based renaming of loose options
//!
//! ## Example
//!
//! ```text
//! { "type": "object",                     collection
//!   "properties": {                         id*        integer
//!     "id":   { "type": "integer" },
//!     "tags": { "type": "array",          collection/tags[@]
//!               "items": {                  $collection~id*  integer → collection.id
//!                 "type": "string" } } },   $value*          string
//!   "required": ["id"] }
//! ```

pub mod checksum;
pub mod config;
pub mod config_mapping;
pub mod error;
pub mod flatten;
pub mod json_schema;
pub mod loader;
pub mod schema;

pub use checksum::Checksum;
pub use config::FlattenConfig;
pub use config_mapping::ConfigMapping;
pub use error::{Result, SchemaError, UnsupportedSchema};
pub use flatten::{flatten, EntityGraph, Flattener, ReferenceViolation};
pub use json_schema::{compile_json_schema, to_json_schema};
pub use schema::{Entity, EntityMap, FieldDescriptor, FieldType, Reference, Relation};
