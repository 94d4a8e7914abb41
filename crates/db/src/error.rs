use thiserror::Error;

/// Errors raised by document store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The identifier is not a well-formed document id.
    #[error("invalid document id '{id}'")]
    InvalidId { id: String },

    /// A document could not be encoded or decoded.
    #[error("failed to convert document: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A field value cannot be stored in the type the collection expects.
    #[error("cannot store field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// The backend itself failed (I/O, transaction, poisoned lock, runtime).
    #[error("storage backend failure: {message}")]
    Backend { message: String },
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Whether the store rejected the request itself rather than failing to run it.
    ///
    /// Malformed ids and unconvertible values are caller problems; backend
    /// failures are infrastructure problems.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidId { .. } | Self::InvalidField { .. } | Self::Serialization(_)
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_classification() {
        assert!(StoreError::InvalidId { id: "x".into() }.is_rejection());
        assert!(StoreError::InvalidField {
            field: "price".into(),
            reason: "not a number".into(),
        }
        .is_rejection());
        assert!(!StoreError::backend("disk full").is_rejection());
    }

    #[test]
    fn messages_name_the_cause() {
        let err = StoreError::InvalidId {
            id: "not-an-id".into(),
        };
        assert_eq!(err.to_string(), "invalid document id 'not-an-id'");
        assert_eq!(
            StoreError::backend("commit failed").to_string(),
            "storage backend failure: commit failed"
        );
    }
}
