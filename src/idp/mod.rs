pub mod azure;

use anyhow::{Result, bail};

use self::azure::AzureProvider;
use crate::config::Config;

/// Identity Provider enum using composition pattern
/// Each variant contains a provider-specific struct with its own implementation
#[derive(Debug, Clone)]
pub enum IdentityProvider {
    Azure(AzureProvider),
}

impl IdentityProvider {
    /// Pick the provider configured for this IdP section
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.azure_tenant_id.is_empty() {
            bail!("No Azure tenant configured. Run `samlroll configure` or pass --assertion-file");
        }
        Ok(Self::Azure(AzureProvider::new(config.azure_tenant_id.clone())))
    }

    /// Build SAML authentication URL with the provided SAML request
    pub fn build_auth_url(&self, saml_request: &str) -> String {
        match self {
            Self::Azure(provider) => provider.build_auth_url(saml_request),
        }
    }
}
