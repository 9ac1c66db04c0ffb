/// Error type shared by every stage of the embedding pipeline.
///
/// Each variant is fatal: the run stops at the first error and the process
/// exits with a failure status. Non-fatal conditions (a guessed symbol name,
/// an unrecognized CPU) are reported through `tracing::warn!` instead.
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedError {
    /// Flags that parsed but cannot form a usable configuration.
    #[error("{0}")]
    Config(String),

    /// No registered target matches the architecture hint or triple.
    #[error("could not initialize the target: {0}")]
    BackendLookup(String),

    /// The target exists but rejected the requested option combination.
    #[error("could not allocate target machine: {0}")]
    BackendInstantiation(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The target cannot render the module in the requested form.
    #[error("{0}")]
    Emission(String),
}

impl EmbedError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        EmbedError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, EmbedError>;
