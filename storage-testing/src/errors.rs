// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use storage_contracts::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestingError {
    #[error("invalid config {path:?}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },
    #[error("spec not found for '{spec_name}' in {dir:?}")]
    SpecNotFound { spec_name: String, dir: PathBuf },
    #[error("invalid spec '{spec_name}': {reason}")]
    SpecInvalid { spec_name: String, reason: String },
    #[error("no presentable with id '{id}'")]
    PresentableNotFound { id: String },
    #[error("invalid size '{value}': {reason}")]
    InvalidSize { value: String, reason: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, TestingError>;
