pub mod completions;
pub mod configure;
pub mod list;
pub mod login;
pub mod refresh;

pub use completions::CompletionsCommand;
pub use configure::ConfigureCommand;
pub use list::ListCommand;
pub use login::LoginCommand;
pub use refresh::RefreshCommand;

use anyhow::{Context, Result};
use clap::Args;
use std::{io::Read, path::PathBuf};
use tracing::info;

use crate::{
    aws::IniProfileStore,
    browser, config,
    constants::{self, AWS_SAML_ENDPOINT},
    idp::IdentityProvider,
    saml::{SamlAssertion, SamlRequest},
};

/// Flags every subcommand sees
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub idp: String,
    pub credentials_file: Option<PathBuf>,
}

impl GlobalOptions {
    pub fn profile_store(&self) -> Result<IniProfileStore> {
        let path = match &self.credentials_file {
            Some(path) => path.clone(),
            None => constants::get_aws_credentials_path()
                .context("Could not determine the AWS credentials file path")?,
        };
        Ok(IniProfileStore::new(path))
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct AssertionArgs {
    #[arg(
        long,
        value_name = "PATH",
        help = "Read a base64 SAML response from a file (`-` for stdin) instead of opening a browser"
    )]
    pub assertion_file: Option<PathBuf>,
}

impl AssertionArgs {
    /// Get an assertion from the file given, or through a browser login
    pub async fn obtain(&self, global: &GlobalOptions) -> Result<SamlAssertion> {
        match &self.assertion_file {
            Some(path) if path.as_os_str() == "-" => {
                let mut encoded = String::new();
                std::io::stdin()
                    .read_to_string(&mut encoded)
                    .context("Failed to read SAML response from stdin")?;
                Ok(SamlAssertion::new(encoded))
            }
            Some(path) => {
                let encoded = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read SAML response from {}", path.display()))?;
                Ok(SamlAssertion::new(encoded))
            }
            None => browser_assertion(&global.idp).await,
        }
    }
}

async fn browser_assertion(idp_name: &str) -> Result<SamlAssertion> {
    let config = config::load(idp_name)
        .await
        .with_context(|| format!("Failed to load configuration for '{idp_name}'"))?;
    let idp = IdentityProvider::from_config(&config)?;

    let request = SamlRequest {
        issuer: config.app_id_uri.clone(),
        acs_url: AWS_SAML_ENDPOINT.to_string(),
    };
    let encoded_request = request
        .generate()
        .context("Failed to create SAML request")?;
    let auth_url = idp.build_auth_url(&encoded_request);

    info!("Opening browser for authentication...");
    browser::capture_assertion(
        &auth_url,
        &config.chrome_user_data_dir,
        config.browser_timeout(),
    )
    .await
    .context("Failed to complete browser authentication")
}
