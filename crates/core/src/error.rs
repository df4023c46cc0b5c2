use crate::types::DbId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Payload does not have the shape the backend expects
    /// (e.g. an array where an object is required).
    #[error("Unexpected data shape: {0}")]
    DataShape(String),

    #[error("Invalid wizard transition: {0}")]
    InvalidTransition(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Short message suitable for a toast, without the variant prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { entity, id } => format!("{entity} {id} was not found"),
            Self::Validation(msg)
            | Self::DataShape(msg)
            | Self::InvalidTransition(msg)
            | Self::Conflict(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::Internal(msg) => msg.clone(),
        }
    }
}
