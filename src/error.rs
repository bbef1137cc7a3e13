use rmcp::ErrorData as RpcError;

use thiserror::Error;
use tokio::io;

use crate::storage::StorageError;

pub type ServiceResult<T> = core::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing arguments.
    #[error("{0}")]
    Validation(String),
    /// An idea position outside the current collection.
    #[error("{}", range_message(*index, *len))]
    Range { index: i64, len: usize },
    /// A destructive operation without an explicit confirmation.
    #[error("{0}")]
    Permission(String),
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    RpcError(#[from] RpcError),
    #[error("{0}")]
    IoError(#[from] io::Error),
    #[error("{0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("{0}")]
    FromString(String),
}

impl ServiceError {
    /// Stable name reported alongside the message in tool error results.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "ValidationError",
            ServiceError::Range { .. } => "RangeError",
            ServiceError::Permission(_) => "PermissionError",
            ServiceError::Storage(StorageError::Corrupt { .. }) => "StorageCorrupt",
            ServiceError::Storage(_) => "StorageError",
            ServiceError::RpcError(_) => "RpcError",
            ServiceError::IoError(_) => "IoError",
            ServiceError::SerdeJsonError(_) => "SerializationError",
            ServiceError::FromString(_) => "Error",
        }
    }
}

fn range_message(index: i64, len: usize) -> String {
    if len == 0 {
        format!("Invalid idea index {index}. No ideas have been saved yet")
    } else {
        format!(
            "Invalid idea index {index}. Must be between 0 and {}",
            len - 1
        )
    }
}
