use crate::constants::{self, DEFAULT_APP_ID_URI, DEFAULT_BROWSER_TIMEOUT_SECS};
use anyhow::{Context, Result};
use dialoguer::{Input, theme::ColorfulTheme};
use ini::{Ini, Properties};
use std::{path::PathBuf, time::Duration};
use tokio::fs;
use uuid::Uuid;

/// Settings for one identity provider, stored as a section of the config file
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub app_id_uri: String,
    pub azure_tenant_id: String,
    pub chrome_user_data_dir: PathBuf,
    pub browser_timeout_secs: u64,
    pub sts_region: Option<String>,
}

impl Config {
    fn from_ini_section(section: &Properties) -> Result<Self> {
        Ok(Self {
            app_id_uri: section
                .get("app_id_uri")
                .unwrap_or(DEFAULT_APP_ID_URI)
                .to_string(),
            azure_tenant_id: section.get("azure_tenant_id").unwrap_or("").to_string(),
            chrome_user_data_dir: match section.get("chrome_user_data_dir") {
                Some(dir) => PathBuf::from(dir),
                None => default_chrome_user_data_dir()?,
            },
            browser_timeout_secs: section
                .get("browser_timeout_secs")
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_BROWSER_TIMEOUT_SECS),
            sts_region: section
                .get("sts_region")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }

    fn save_to_ini(&self, ini: &mut Ini, idp: &str) {
        ini.with_section(Some(idp))
            .set("app_id_uri", &self.app_id_uri)
            .set("azure_tenant_id", &self.azure_tenant_id)
            .set(
                "chrome_user_data_dir",
                self.chrome_user_data_dir.to_string_lossy(),
            )
            .set(
                "browser_timeout_secs",
                self.browser_timeout_secs.to_string(),
            )
            .set("sts_region", self.sts_region.as_deref().unwrap_or(""));
    }

    pub fn browser_timeout(&self) -> Duration {
        Duration::from_secs(self.browser_timeout_secs)
    }
}

/// Load the settings of `idp`
///
/// A missing file or section yields defaults; browser logins then fail on the
/// empty tenant while `--assertion-file` runs still work.
pub async fn load(idp: &str) -> Result<Config> {
    let path = get_config_path()?;

    if !fs::try_exists(&path).await.unwrap_or(false) {
        return Config::from_ini_section(&Properties::new());
    }

    let ini = Ini::load_from_file(&path)
        .with_context(|| format!("Failed to load config file {}", path.display()))?;

    match ini.section(Some(idp)) {
        Some(section) => Config::from_ini_section(section),
        None => Config::from_ini_section(&Properties::new()),
    }
}

pub async fn save(idp: &str, config: &Config) -> Result<()> {
    let path = get_config_path()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut ini = if path.exists() {
        Ini::load_from_file(&path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?
    } else {
        Ini::new()
    };

    config.save_to_ini(&mut ini, idp);

    ini.write_to_file(&path)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

pub async fn configure_interactive(idp: &str) -> Result<()> {
    println!("Configuring samlroll identity provider: {idp}");

    let existing = load(idp).await?;
    if !existing.azure_tenant_id.is_empty() {
        println!("Press Enter to keep current values, or type new values.");
    }
    println!();

    let theme = ColorfulTheme::default();

    let azure_tenant_id = Input::<String>::with_theme(&theme)
        .with_prompt("Azure Tenant ID")
        .default(existing.azure_tenant_id.clone())
        .allow_empty(!existing.azure_tenant_id.is_empty())
        .validate_with(|input: &String| {
            if input.is_empty() {
                Err("Azure Tenant ID is required")
            } else if !is_valid_uuid(input) {
                Err("Azure Tenant ID must be a valid UUID (xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx)")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .context("Failed to read Azure Tenant ID")?;

    let app_id_uri = Input::<String>::with_theme(&theme)
        .with_prompt("App ID URI")
        .default(existing.app_id_uri)
        .interact_text()
        .context("Failed to read App ID URI")?;

    let chrome_user_data_dir = Input::<String>::with_theme(&theme)
        .with_prompt("Chrome User Data Directory")
        .default(existing.chrome_user_data_dir.to_string_lossy().to_string())
        .interact_text()
        .context("Failed to read Chrome user data directory")?;

    let browser_timeout_secs = Input::<u64>::with_theme(&theme)
        .with_prompt("Browser login timeout (seconds)")
        .default(existing.browser_timeout_secs)
        .validate_with(|input: &u64| {
            if *input > 0 {
                Ok(())
            } else {
                Err("Timeout must be positive")
            }
        })
        .interact_text()
        .context("Failed to read browser timeout")?;

    let sts_region = Input::<String>::with_theme(&theme)
        .with_prompt("STS region (empty for the AWS SDK default)")
        .default(existing.sts_region.unwrap_or_default())
        .allow_empty(true)
        .interact_text()
        .context("Failed to read STS region")?;

    let config = Config {
        app_id_uri,
        azure_tenant_id,
        chrome_user_data_dir: PathBuf::from(chrome_user_data_dir),
        browser_timeout_secs,
        sts_region: Some(sts_region).filter(|s| !s.is_empty()),
    };

    save(idp, &config).await?;

    println!("\nConfiguration saved successfully.");
    Ok(())
}

fn get_config_path() -> Result<PathBuf> {
    constants::get_config_path().context("Failed to determine samlroll config path")
}

fn default_chrome_user_data_dir() -> Result<PathBuf> {
    constants::default_chrome_user_data_dir()
        .context("Could not determine home directory. Please set HOME environment variable.")
}

/// Hyphenated form only; tenant IDs are always shown that way in the portal
fn is_valid_uuid(s: &str) -> bool {
    s.len() == 36 && Uuid::try_parse(s).is_ok()
}
