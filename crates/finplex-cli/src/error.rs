use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] finplex_core::CoreError),

    #[error(transparent)]
    Validation(#[from] finplex_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    /// The command ran and produced an error body, already written to stdout.
    #[error("{kind} (status {status})")]
    Response { status: u16, kind: String },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Core(error) => status_exit_code(error.status_code()),
            Self::Validation(_) | Self::Command(_) => 2,
            Self::Response { status, .. } => status_exit_code(*status),
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

const fn status_exit_code(status: u16) -> u8 {
    match status {
        400 => 2,
        404 => 3,
        _ => 5,
    }
}
