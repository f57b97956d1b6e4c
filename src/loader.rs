//! Schema Loading
//!
//! Reads schema documents from disk and discovers schema files under a
//! directory for batch flattening.

use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::config::LoaderConfig;
use crate::error::{Result, SchemaError};
use crate::flatten::flatten;
use crate::schema::EntityMap;

/// Read and parse a single schema document
pub fn load_schema(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    let schema: Value = serde_json::from_str(&content)?;
    if !schema.is_object() {
        return Err(SchemaError::InvalidFormat(format!(
            "{} does not contain a JSON object",
            path.display()
        )));
    }
    Ok(schema)
}

/// Default root entity name for a schema file: `orders.schema.json` → `orders`
pub fn root_entity_name(path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("root");
    stem.strip_suffix(".schema").unwrap_or(stem).to_string()
}

/// Load and flatten a schema file
pub fn flatten_file(path: &Path, root_entity: Option<&str>) -> Result<EntityMap> {
    let schema = load_schema(path)?;
    let name = root_entity
        .map(str::to_string)
        .unwrap_or_else(|| root_entity_name(path));
    flatten(&schema, &name)
}

/// Schema files under `dir`, sorted by path
pub fn discover(dir: &Path, config: &LoaderConfig) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().map(|e| e != config.extension.as_str()).unwrap_or(true) {
            continue;
        }

        let relative_path = path.strip_prefix(dir).unwrap_or(path);
        if is_skipped(relative_path, &config.skip_prefixes) {
            tracing::debug!(path = %relative_path.display(), "skipping schema file");
            continue;
        }

        found.push(path.to_path_buf());
    }

    found.sort();
    Ok(found)
}

/// Output file for each schema under `dir`, mirroring its relative directory
///
/// `dir/a/orders.schema.json` maps to `output_dir/a/orders.entities.json`.
/// Two schemas mapping to the same output file are rejected.
pub fn batch_targets(
    dir: &Path,
    schemas: &[PathBuf],
    output_dir: &Path,
) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
    let mut targets = Vec::with_capacity(schemas.len());

    for schema in schemas {
        let relative = schema.strip_prefix(dir).unwrap_or(schema);
        let file_name = format!("{}.entities.json", root_entity_name(schema));
        let target = match relative.parent() {
            Some(parent) => output_dir.join(parent).join(file_name),
            None => output_dir.join(file_name),
        };

        if let Some(previous) = claimed.insert(target.clone(), schema.as_path()) {
            return Err(SchemaError::InvalidFormat(format!(
                "{} and {} both write {}",
                previous.display(),
                schema.display(),
                target.display()
            )));
        }
        targets.push((schema.clone(), target));
    }

    Ok(targets)
}

fn is_skipped(relative_path: &Path, skip_prefixes: &[String]) -> bool {
    relative_path.components().any(|component| match component {
        Component::Normal(part) => {
            let part = part.to_string_lossy();
            skip_prefixes.iter().any(|prefix| part.starts_with(prefix.as_str()))
        }
        _ => false,
    })
}
