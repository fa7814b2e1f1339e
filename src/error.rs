//! Error types for imap-repository

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or contradictory configuration. Fatal at
    /// construction time; never produced by a running repository.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport or authentication failure while establishing a
    /// session. Propagated to whichever operation needed the
    /// connection; this layer does not retry.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol command failed on an established session.
    #[error("IMAP error: {0}")]
    Imap(String),

    /// The server refused to create a folder.
    #[error("Repository {repository} could not create folder {folder}: {response}")]
    Create {
        repository: String,
        folder: String,
        response: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
