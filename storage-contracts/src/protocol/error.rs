// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageErrorKind {
    /// The presentable variant has no implementation of the operation
    Unsupported,
    /// The operation was refused or could not complete; the message says why
    Failed,
    /// Another operation on the same drive is still outstanding
    Busy,
    NotFound,
    InvalidInput,
    /// Error surfaced verbatim from the privileged device-operation layer
    Transport,
}

impl StorageErrorKind {
    pub fn code(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::NotFound => 404,
            Self::Busy => 423,
            Self::Failed => 500,
            Self::Unsupported => 501,
            Self::Transport => 502,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Unsupported, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Failed, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::NotFound, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_roundtrips() {
        let error = StorageError::new(StorageErrorKind::Busy, "create already in progress");
        let json = serde_json::to_string(&error).expect("serialize error");
        let parsed: StorageError = serde_json::from_str(&json).expect("deserialize error");
        assert_eq!(parsed, error);
        assert!(json.contains("\"busy\""));
    }

    #[test]
    fn display_includes_kind_and_message() {
        let error = StorageError::failed("Insufficient space");
        assert_eq!(error.to_string(), "Failed: Insufficient space");
        assert_eq!(error.kind.code(), 500);
    }
}
