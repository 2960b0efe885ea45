use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Decode engine error: {0}")]
    Engine(String),

    #[error("No remote command is registered with the now-playing session")]
    NoRegisteredCommands,

    #[error("Cannot set the audio session category: {0}")]
    CannotSetCategory(String),

    #[error("Cannot activate the audio session: {0}")]
    CannotActivateSession(String),

    #[error("Cannot reactivate the audio session: {0}")]
    CannotReactivateSession(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the error comes from configuring the now-playing session.
    ///
    /// These are reported synchronously to whoever configures the player and
    /// are never retried.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            BridgeError::NoRegisteredCommands
                | BridgeError::CannotSetCategory(_)
                | BridgeError::CannotActivateSession(_)
                | BridgeError::CannotReactivateSession(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
