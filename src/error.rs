//! Error types for the credential exchange engine

use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the SAML to STS exchange and the profile lifecycle
#[derive(Debug, Error)]
pub enum Error {
    /// The assertion is not base64 or not a well-formed SAML document
    #[error("Malformed SAML assertion: {0}")]
    MalformedAssertion(String),

    /// The assertion carries no binding for the requested account and role
    #[error("Role '{role_name}' in account {account_id} is not authorized by the SAML assertion")]
    RoleNotAuthorized {
        account_id: String,
        role_name: String,
    },

    /// Session duration outside the range STS accepts
    #[error(
        "Invalid session duration: {0} seconds (must be between {min} and {max})",
        min = crate::constants::MIN_SESSION_DURATION_SECS,
        max = crate::constants::MAX_SESSION_DURATION_SECS
    )]
    InvalidDuration(i64),

    /// Neither an override nor a stored duration exists for a profile
    #[error("Profile '{0}' has no recorded session duration; pass --duration")]
    MissingDuration(String),

    /// STS or browser collaborator failure
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Failed to read credentials file {}", path.display())]
    StoreRead {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Failed to write credentials file {}", path.display())]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
