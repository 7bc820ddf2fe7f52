use thiserror::Error;

/// Core runtime errors.
///
/// Aggregation degrades by omission for data-quality issues and only raises
/// `InvalidInput` for structurally invalid calls. Purchase and unlock
/// operations classify collaborator failures into this taxonomy before they
/// cross the component boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Actor is not connected")]
    NotAuthenticated,

    #[error("Insufficient balance: {msg}")]
    InsufficientBalance { msg: String },

    #[error("Purchase already in progress for release '{release_id}'")]
    PurchaseAlreadyInProgress { release_id: String },

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Gate unlock failed for '{file_name}': {msg}")]
    GateUnlockFailed { file_name: String, msg: String },

    #[error("Collaborator '{source_name}' failed: {msg}")]
    Collaborator { source_name: String, msg: String },
}

impl CoreError {
    pub fn collaborator(source_name: &str, msg: impl Into<String>) -> Self {
        Self::Collaborator {
            source_name: source_name.to_string(),
            msg: msg.into(),
        }
    }

    pub fn gate_unlock(file_name: &str, msg: impl Into<String>) -> Self {
        Self::GateUnlockFailed {
            file_name: file_name.to_string(),
            msg: msg.into(),
        }
    }
}
