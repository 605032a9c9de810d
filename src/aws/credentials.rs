use std::{
    io::Write,
    path::{Path, PathBuf},
};

use aws_smithy_types::{DateTime, date_time::Format};
use ini::{Ini, Properties};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{Credentials, format_expiration};
use crate::error::{Error, Result};

const ACCESS_KEY_ID: &str = "aws_access_key_id";
const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
const SESSION_TOKEN: &str = "aws_session_token";
const SESSION_EXPIRATION: &str = "aws_session_expiration";
const ACCOUNT_ID: &str = "saml_account_id";
const ROLE_NAME: &str = "saml_role_name";
const SESSION_DURATION: &str = "saml_session_duration";

/// A named credentials profile and what is needed to renew it
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub account_id: Option<String>,
    pub role_name: Option<String>,
    pub duration_seconds: Option<i64>,
    pub credentials: Option<Credentials>,
}

impl Profile {
    /// Account and role, when both are recorded and non-empty
    pub fn renewal_target(&self) -> Option<(&str, &str)> {
        let account_id = self.account_id.as_deref().filter(|s| !s.is_empty())?;
        let role_name = self.role_name.as_deref().filter(|s| !s.is_empty())?;
        Some((account_id, role_name))
    }

    pub fn is_renewable(&self) -> bool {
        self.renewal_target().is_some()
    }

    fn from_section(name: &str, section: &Properties) -> Self {
        Self {
            name: name.to_string(),
            account_id: section.get(ACCOUNT_ID).map(str::to_string),
            role_name: section.get(ROLE_NAME).map(str::to_string),
            duration_seconds: section
                .get(SESSION_DURATION)
                .and_then(|s| s.trim().parse().ok()),
            credentials: credentials_from_section(section),
        }
    }
}

/// Static keys without a parseable expiration are not ours to report
fn credentials_from_section(section: &Properties) -> Option<Credentials> {
    let expiration = section.get(SESSION_EXPIRATION)?;
    let expiration = DateTime::from_str(expiration, Format::DateTime)
        .or_else(|_| DateTime::from_str(expiration, Format::DateTimeWithOffset))
        .ok()?;

    Some(Credentials {
        access_key_id: section.get(ACCESS_KEY_ID)?.to_string(),
        secret_access_key: section.get(SECRET_ACCESS_KEY)?.to_string(),
        session_token: section.get(SESSION_TOKEN)?.to_string(),
        expiration,
    })
}

/// Durable mapping from profile name to renewal data and credentials
pub trait ProfileStore {
    /// Create the profile or overwrite all of these fields in place
    fn upsert(
        &mut self,
        name: &str,
        account_id: &str,
        role_name: &str,
        duration_seconds: i64,
        credentials: &Credentials,
    ) -> Result<()>;

    /// All profiles in stored order, or those named exactly `name_filter`
    fn get(&self, name_filter: Option<&str>) -> Result<Vec<Profile>>;
}

/// Profiles kept in the AWS shared credentials file
///
/// Each write rewrites the whole file through a temporary file in the same
/// directory followed by a rename, so readers see either the old or the new
/// file. A symlinked path is resolved first and the link is left in place. There is no locking: two processes writing the same file at once
/// can lose one of the updates.
#[derive(Debug, Clone)]
pub struct IniProfileStore {
    path: PathBuf,
}

impl IniProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Ini> {
        if !self.path.exists() {
            return Ok(Ini::new());
        }
        Ini::load_from_file(&self.path).map_err(|source| Error::StoreRead {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, ini: &Ini) -> Result<()> {
        let write_err = |source: std::io::Error| Error::StoreWrite {
            path: self.path.clone(),
            source,
        };

        // write through a symlinked credentials file to the file it points at
        let target = if self.path.exists() {
            std::fs::canonicalize(&self.path).map_err(write_err)?
        } else {
            self.path.clone()
        };
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(write_err)?;

        // NamedTempFile is created with mode 0600 on unix
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        ini.write_to(&mut tmp).map_err(write_err)?;
        tmp.flush().map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&target).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

impl ProfileStore for IniProfileStore {
    fn upsert(
        &mut self,
        name: &str,
        account_id: &str,
        role_name: &str,
        duration_seconds: i64,
        credentials: &Credentials,
    ) -> Result<()> {
        let mut ini = self.load()?;

        ini.with_section(Some(name))
            .set(ACCESS_KEY_ID, &credentials.access_key_id)
            .set(SECRET_ACCESS_KEY, &credentials.secret_access_key)
            .set(SESSION_TOKEN, &credentials.session_token)
            .set(SESSION_EXPIRATION, format_expiration(&credentials.expiration))
            .set(ACCOUNT_ID, account_id)
            .set(ROLE_NAME, role_name)
            .set(SESSION_DURATION, duration_seconds.to_string());

        self.write(&ini)?;

        info!("Credentials saved to profile: {}", name);
        Ok(())
    }

    fn get(&self, name_filter: Option<&str>) -> Result<Vec<Profile>> {
        let ini = self.load()?;

        let profiles: Vec<Profile> = ini
            .iter()
            .filter_map(|(name, section)| name.map(|n| (n, section)))
            .filter(|(name, _)| name_filter.is_none_or(|filter| filter == *name))
            .map(|(name, section)| Profile::from_section(name, section))
            .collect();

        debug!(
            "Loaded {} profile(s) from {}",
            profiles.len(),
            self.path.display()
        );
        Ok(profiles)
    }
}
