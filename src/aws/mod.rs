use aws_smithy_types::{DateTime, date_time::Format};

pub mod credentials;
pub mod roles;
pub mod sts;

/// AWS temporary credentials structure
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime,
}

impl Credentials {
    /// Expiration as RFC 3339, the form written to the credentials file
    pub fn expiration_rfc3339(&self) -> String {
        format_expiration(&self.expiration)
    }
}

pub(crate) fn format_expiration(expiration: &DateTime) -> String {
    expiration
        .fmt(Format::DateTime)
        .unwrap_or_else(|_| "unknown".to_string())
}

// Re-export commonly used types (functions should be accessed via module path)
pub use credentials::{IniProfileStore, Profile, ProfileStore};
pub use roles::RoleBinding;
pub use sts::{DurationFallback, SdkStsTransport, StsTransport};
