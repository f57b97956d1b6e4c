//! Parameter Remapping
//!
//! An ordered set of `(selector, mapper)` rules that rename, pass through or
//! rewrite loosely-named parameters into a canonical parameter map. Selectors
//! are regular expressions matched anywhere in the parameter name.

use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SchemaError};

/// Maps one matched parameter `(value, name, all parameters)` to output entries
pub type Mapper =
    Arc<dyn Fn(&Value, &str, &Map<String, Value>) -> Option<Map<String, Value>> + Send + Sync>;

#[derive(Clone)]
struct Rule {
    selector: String,
    pattern: Regex,
    mapper: Mapper,
}

#[derive(Clone, Default)]
pub struct ConfigMapping {
    rules: Vec<Rule>,
}

impl ConfigMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `mapper` for parameters matching `selector`
    pub fn remap<F>(&mut self, selector: &str, mapper: F) -> Result<&mut Self>
    where
        F: Fn(&Value, &str, &Map<String, Value>) -> Option<Map<String, Value>>
            + Send
            + Sync
            + 'static,
    {
        if self.rules.iter().any(|rule| rule.selector == selector) {
            return Err(SchemaError::SelectorAlreadyMapped {
                selector: selector.to_string(),
            });
        }

        let pattern = Regex::new(selector).map_err(|source| SchemaError::InvalidSelector {
            selector: selector.to_string(),
            source,
        })?;

        self.rules.push(Rule {
            selector: selector.to_string(),
            pattern,
            mapper: Arc::new(mapper),
        });
        Ok(self)
    }

    /// Emit matching parameters under `new_name`
    pub fn rename(&mut self, selector: &str, new_name: &str) -> Result<&mut Self> {
        let new_name = new_name.to_string();
        self.remap(selector, move |value, _, _| single(&new_name, value))
    }

    /// Emit matching parameters under their own name
    pub fn as_is(&mut self, selector: &str) -> Result<&mut Self> {
        self.remap(selector, |value, name, _| single(name, value))
    }

    /// Copy of this mapping with extra rules registered by `modifier`
    pub fn extended<F>(&self, modifier: F) -> Result<Self>
    where
        F: FnOnce(&mut ConfigMapping) -> Result<()>,
    {
        let mut copy = self.clone();
        modifier(&mut copy)?;
        Ok(copy)
    }

    /// Apply every rule, in registration order, to every matching parameter
    pub fn apply(&self, values: &Map<String, Value>) -> Map<String, Value> {
        let mut mapped = Map::new();

        for rule in &self.rules {
            for (name, value) in values {
                if !rule.pattern.is_match(name) {
                    continue;
                }
                if let Some(entries) = (rule.mapper)(value, name, values) {
                    tracing::trace!(
                        selector = %rule.selector,
                        parameter = %name,
                        "parameter mapped"
                    );
                    mapped.extend(entries);
                }
            }
        }

        mapped
    }

    /// Whether any selector matches `name`
    pub fn matches(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.pattern.is_match(name))
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.selector.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for ConfigMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigMapping")
            .field("selectors", &self.selectors().collect::<Vec<_>>())
            .finish()
    }
}

fn single(name: &str, value: &Value) -> Option<Map<String, Value>> {
    if value.is_null() {
        return None;
    }
    let mut entry = Map::new();
    entry.insert(name.to_string(), value.clone());
    Some(entry)
}
