//! Relation Analysis
//!
//! Builds a parent → child graph over a flattened [`EntityMap`] and checks
//! that its reference fields form a complete, acyclic chain back to the
//! root entity.

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

use crate::error::{Result, SchemaError};
use crate::schema::{Entity, EntityMap, Reference, Relation};

// =============================================================================
// Violations
// =============================================================================

/// A broken relation between two entities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceViolation {
    pub entity: String,
    /// Offending field, when the violation is about a single field
    pub field: Option<String>,
    pub reason: String,
}

impl ReferenceViolation {
    fn entity(entity: &str, reason: String) -> Self {
        Self {
            entity: entity.to_string(),
            field: None,
            reason,
        }
    }

    fn field(entity: &str, field: &str, reason: String) -> Self {
        Self {
            entity: entity.to_string(),
            field: Some(field.to_string()),
            reason,
        }
    }
}

impl std::fmt::Display for ReferenceViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}.{}: {}", self.entity, field, self.reason),
            None => write!(f, "{}: {}", self.entity, self.reason),
        }
    }
}

// =============================================================================
// Entity Graph
// =============================================================================

/// Parent → child relation graph; edges carry the child's reference fields
pub struct EntityGraph<'a> {
    entities: &'a EntityMap,
    graph: DiGraph<String, Vec<String>>,
    index: HashMap<String, NodeIndex>,
}

impl<'a> EntityGraph<'a> {
    pub fn from_entities(entities: &'a EntityMap) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        for name in entities.names() {
            index.insert(name.clone(), graph.add_node(name.clone()));
        }

        for (name, entity) in entities {
            let parent = index[name.as_str()];
            for related in &entity.related_entities {
                let Some(&child) = index.get(related.as_str()) else {
                    continue;
                };
                let labels = entities
                    .get(related)
                    .map(|child| relation_fields(child, name))
                    .unwrap_or_default();
                graph.add_edge(parent, child, labels);
            }
        }

        Self {
            entities,
            graph,
            index,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Entities that list `name` as related
    pub fn parents(&self, name: &str) -> Vec<&str> {
        let Some(&node) = self.index.get(name) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| self.graph[e.source()].as_str())
            .collect()
    }

    /// Check referential completeness of every entity
    pub fn validate(&self) -> Vec<ReferenceViolation> {
        let mut violations = Vec::new();

        for (name, entity) in self.entities {
            let mut seen = Vec::new();
            for related in &entity.related_entities {
                if !self.entities.contains(related) {
                    violations.push(ReferenceViolation::entity(
                        name,
                        format!("related entity '{}' does not exist", related),
                    ));
                }
                if seen.contains(&related) {
                    violations.push(ReferenceViolation::entity(
                        name,
                        format!("related entity '{}' listed more than once", related),
                    ));
                }
                seen.push(related);
            }

            let parents = self.parents(name);
            if parents.len() > 1 {
                violations.push(ReferenceViolation::entity(
                    name,
                    format!("entity has {} parents: {:?}", parents.len(), parents),
                ));
            }

            for (field_name, field) in &entity.fields {
                let reference = field.reference.as_ref();
                let relation = field.relation.as_ref();
                if let Some(reason) = self.check_reference(name, field_name, reference, relation) {
                    violations.push(ReferenceViolation::field(name, field_name, reason));
                }
            }
        }

        if is_cyclic_directed(&self.graph) {
            violations.push(ReferenceViolation::entity(
                self.entities.names().next().map(String::as_str).unwrap_or("<empty>"),
                "relation graph contains a cycle".to_string(),
            ));
        }

        violations
    }

    fn check_reference(
        &self,
        entity: &str,
        field_name: &str,
        reference: Option<&Reference>,
        relation: Option<&Relation>,
    ) -> Option<String> {
        let (reference, relation) = match (reference, relation) {
            (None, None) => return None,
            (Some(reference), Some(relation)) => (reference, relation),
            _ => return Some("reference and relation must be declared together".to_string()),
        };

        if !self.parents(entity).contains(&relation.entity.as_str()) {
            return Some(format!("'{}' does not list this entity as related", relation.entity));
        }

        let Some(parent) = self.entities.get(&relation.entity) else {
            return Some(format!("relation entity '{}' does not exist", relation.entity));
        };
        let Some(source) = parent.fields.get(&relation.field) else {
            return Some(format!("'{}' has no field '{}'", relation.entity, relation.field));
        };
        if !source.identity {
            return Some(format!(
                "'{}.{}' is not an identity field",
                relation.entity, relation.field
            ));
        }

        let expected = match &source.reference {
            Some(inherited) => Reference {
                entity: inherited.entity.clone(),
                field: inherited.field.clone(),
                depth: inherited.depth + 1,
            },
            None => Reference {
                entity: relation.entity.clone(),
                field: relation.field.clone(),
                depth: 1,
            },
        };
        if *reference != expected {
            return Some(format!(
                "reference {}.{} (depth {}) does not match {}.{} (depth {})",
                reference.entity,
                reference.field,
                reference.depth,
                expected.entity,
                expected.field,
                expected.depth
            ));
        }

        if !field_name.starts_with('$') {
            return Some("reference fields must use a '$' name".to_string());
        }

        None
    }

    /// Entity names ordered parents before children
    pub fn load_order(&self) -> Result<Vec<String>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            SchemaError::InvalidFormat(format!(
                "relation cycle through entity '{}'",
                self.graph[cycle.node_id()]
            ))
        })?;
        Ok(sorted.into_iter().map(|node| self.graph[node].clone()).collect())
    }

    /// Export as GraphViz DOT
    pub fn to_dot(&self) -> String {
        let mut output = String::new();

        output.push_str("digraph EntityGraph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=record, fontname=\"Helvetica\", fontsize=10];\n");
        output.push_str("  edge [fontname=\"Helvetica\", fontsize=8, fontcolor=\"#808080\"];\n");
        output.push('\n');

        for (name, entity) in self.entities {
            let identity: Vec<&str> = entity
                .identity_fields()
                .filter(|(_, field)| !field.is_reference())
                .map(|(field, _)| field.as_str())
                .collect();
            output.push_str(&format!(
                "  \"{}\" [label=\"{{{}|{}}}\"];\n",
                escape_dot(name),
                escape_record(name),
                escape_record(&identity.join(", "))
            ));
        }

        output.push('\n');

        for edge in self.graph.edge_references() {
            let source = &self.graph[edge.source()];
            let target = &self.graph[edge.target()];
            output.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                escape_dot(source),
                escape_dot(target),
                escape_dot(&edge.weight().join("\\n"))
            ));
        }

        output.push_str("}\n");
        output
    }
}

/// Reference fields of `child` whose relation points at `parent`
fn relation_fields(child: &Entity, parent: &str) -> Vec<String> {
    child
        .fields
        .iter()
        .filter(|(_, field)| field.relation.as_ref().map(|r| r.entity == parent).unwrap_or(false))
        .map(|(name, _)| name.clone())
        .collect()
}

fn escape_dot(text: &str) -> String {
    text.replace('"', "\\\"")
}

fn escape_record(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '{' | '}' | '|' | '<' | '>' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
