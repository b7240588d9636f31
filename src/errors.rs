use crate::events::ClientId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the server from starting
#[derive(Debug, Error)]
pub enum MudError {
    /// I/O related errors (binding the listener, socket options)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from loading or writing `weemud.toml`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Why a send to a client did not happen
///
/// `NotFound` is expected (the client left before the game loop caught up)
/// and is ignored by the public send methods. `Transport` tears the
/// connection down.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("client {0} is not connected")]
    NotFound(ClientId),

    #[error("transport failure: {0}")]
    Transport(#[from] io::Error),
}

/// Result type alias for server operations
pub type MudResult<T> = Result<T, MudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SendError::NotFound(ClientId::new(7));
        assert_eq!(err.to_string(), "client 7 is not connected");

        let err: MudError = io::Error::new(io::ErrorKind::AddrInUse, "taken").into();
        assert_eq!(err.to_string(), "I/O error: taken");
    }
}
