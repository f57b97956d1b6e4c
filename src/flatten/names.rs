//! Entity Naming
//!
//! Derives stable, path-like entity names and JSON Pointer origins.
//!
//! | Discovered as                    | Name            |
//! |----------------------------------|-----------------|
//! | inline object property `p`       | `E/p`           |
//! | inline array items of `p`        | `E/p[@]`        |
//! | `$ref` to `#/definitions/X`      | `E/X`           |
//! | N-th wildcard entry under `E`    | `E[@N]`         |

/// How a child entity was reached from its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildName<'a> {
    /// Inline object property
    Property(&'a str),
    /// Inline items of an array property
    Items(&'a str),
    /// Target of a `$ref` (JSON Pointer)
    Reference(&'a str),
    /// additionalProperties/patternProperties entry, by index
    Wildcard(usize),
}

/// Name a child entity of `parent`
pub fn child_name(parent: &str, child: ChildName<'_>) -> String {
    match child {
        ChildName::Property(property) => format!("{}/{}", parent, property),
        ChildName::Items(property) => format!("{}/{}[@]", parent, property),
        ChildName::Reference(pointer) => format!("{}/{}", parent, definition_name(pointer)),
        ChildName::Wildcard(index) => format!("{}[@{}]", parent, index),
    }
}

/// Leaf name of a `$ref` target, e.g. `item` for `#/definitions/item`
pub fn definition_name(pointer: &str) -> String {
    let last = pointer.rsplit('/').next().unwrap_or(pointer);
    unescape_token(last)
}

/// Synthetic reference field name: `$<entity>~<field>`
pub fn reference_field_name(entity: &str, field: &str) -> String {
    format!("${}~{}", entity, field)
}

/// Per-parent counter for wildcard entries, in declaration order
#[derive(Debug, Default)]
pub struct WildcardCounter(usize);

impl WildcardCounter {
    pub fn next(&mut self) -> usize {
        let index = self.0;
        self.0 += 1;
        index
    }
}

/// Escape a JSON Pointer reference token (RFC 6901)
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Undo [`escape_token`]
pub fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Append escaped tokens to a JSON Pointer
pub fn pointer_join(base: &str, tokens: &[&str]) -> String {
    let mut pointer = base.to_string();
    for token in tokens {
        pointer.push('/');
        pointer.push_str(&escape_token(token));
    }
    pointer
}
