//! Fingerprints for flattened output

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::Result;
use crate::schema::EntityMap;

/// SHA256 fingerprint of serialized output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Fingerprint of an entity map; equal maps in equal order hash equally
    pub fn of_entities(entities: &EntityMap) -> Result<Self> {
        Ok(Self::from_bytes(&serde_json::to_vec(entities)?))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use serde_json::json;

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "integer" },
                "tags": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["id"]
        })
    }

    #[test]
    fn test_checksum_consistency() {
        let first = Checksum::of_entities(&flatten(&schema(), "collection").unwrap()).unwrap();
        let second = Checksum::of_entities(&flatten(&schema(), "collection").unwrap()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 64);
    }

    #[test]
    fn test_checksum_different_content() {
        let first = Checksum::of_entities(&flatten(&schema(), "collection").unwrap()).unwrap();
        let renamed = Checksum::of_entities(&flatten(&schema(), "other").unwrap()).unwrap();
        assert_ne!(first, renamed);
    }

    #[test]
    fn test_checksum_of_compact_serialization() {
        let entities = flatten(&schema(), "collection").unwrap();
        let compact = serde_json::to_vec(&entities).unwrap();
        assert_eq!(Checksum::of_entities(&entities).unwrap(), Checksum::from_bytes(&compact));
    }
}
