use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum EmailDeliveryError {
    #[error("Failed to serialize template data: {0}")]
    SerializationFailed(String),

    #[error("Failed to enqueue email: {0}")]
    EnqueueFailed(String),
}
