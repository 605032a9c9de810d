use std::{env, path::PathBuf};

use dirs;

/// Configuration directory name under `~/.config`
pub const CONFIG_DIR_NAME: &str = "samlroll";

/// Configuration file name inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config";

/// Chrome user data directory name
pub const CHROME_USER_DATA_DIR_NAME: &str = "chrome-user-data";

/// AWS configuration directory name
pub const AWS_CONFIG_DIR_NAME: &str = ".aws";

/// AWS shared credentials file name
pub const AWS_CREDENTIALS_FILE_NAME: &str = "credentials";

/// Default App ID URI for AWS SAML (used as Issuer in SAML request)
pub const DEFAULT_APP_ID_URI: &str = "https://signin.aws.amazon.com/saml";

/// AWS SAML endpoint URL (where SAML response is posted)
pub const AWS_SAML_ENDPOINT: &str = "https://signin.aws.amazon.com/saml";

/// SAML attribute carrying `provider-arn,role-arn` pairs
pub const AWS_ROLE_ATTRIBUTE: &str = "https://aws.amazon.com/SAML/Attributes/Role";

/// SAML attribute carrying the session name of the principal
pub const AWS_ROLE_SESSION_NAME_ATTRIBUTE: &str =
    "https://aws.amazon.com/SAML/Attributes/RoleSessionName";

/// Lower bound STS accepts for `DurationSeconds`
pub const MIN_SESSION_DURATION_SECS: i64 = 900;

/// Upper bound STS accepts for `DurationSeconds`
pub const MAX_SESSION_DURATION_SECS: i64 = 43_200;

/// Session length for interactive logins when nothing else is given
pub const DEFAULT_SESSION_DURATION_SECS: i64 = 3600;

/// How long to wait for the user to finish the browser login
pub const DEFAULT_BROWSER_TIMEOUT_SECS: u64 = 300;

/// Default AWS region for STS operations when no region is configured
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

fn home_dir() -> Option<PathBuf> {
    dirs::home_dir().or_else(|| {
        env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from)
    })
}

/// Get the default Chrome user data directory path
/// Always returns: ~/.config/samlroll/chrome-user-data (on all platforms)
pub fn default_chrome_user_data_dir() -> Option<PathBuf> {
    home_dir().map(|home| {
        home.join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CHROME_USER_DATA_DIR_NAME)
    })
}

/// Get the samlroll config file path
/// Respects SAMLROLL_CONFIG_FILE environment variable if set
pub fn get_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("SAMLROLL_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }

    home_dir().map(|home| {
        home.join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    })
}

/// Get the AWS credentials file path
/// Respects AWS_SHARED_CREDENTIALS_FILE environment variable if set
pub fn get_aws_credentials_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("AWS_SHARED_CREDENTIALS_FILE") {
        return Some(PathBuf::from(path));
    }

    home_dir().map(|home| {
        home.join(AWS_CONFIG_DIR_NAME)
            .join(AWS_CREDENTIALS_FILE_NAME)
    })
}
