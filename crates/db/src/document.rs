use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::StoreError;

/// Generated identifier of a stored document.
///
/// UUID v7, so lexical order of the hyphenated form follows creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse a client-supplied id.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| StoreError::InvalidId { id: raw.to_string() })
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// A stored document: generated id, store-maintained version, free-form fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub schema_version: u64,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            id: DocumentId::generate(),
            schema_version: 0,
            fields,
        }
    }

    /// Overwrite fields from `patch`; bumps the version when anything changed.
    pub fn apply_patch(&mut self, patch: &Map<String, Value>) -> bool {
        let mut modified = false;
        for (key, value) in patch {
            if self.fields.get(key) != Some(value) {
                self.fields.insert(key.clone(), value.clone());
                modified = true;
            }
        }
        if modified {
            self.schema_version += 1;
        }
        modified
    }
}

/// Result of an update-by-id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateOutcome {
    pub(crate) fn unmatched() -> Self {
        Self::default()
    }

    pub(crate) fn matched(modified: bool) -> Self {
        Self {
            matched_count: 1,
            modified_count: u64::from(modified),
        }
    }
}
