use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::{Client as StsClient, error::DisplayErrorContext};
use tracing::{debug, info};

use super::{Credentials, RoleBinding};
use crate::{
    constants::{
        DEFAULT_AWS_REGION, DEFAULT_SESSION_DURATION_SECS, MAX_SESSION_DURATION_SECS,
        MIN_SESSION_DURATION_SECS,
    },
    error::{Error, Result},
    saml::SamlAssertion,
};

/// Remote side of the exchange
///
/// Implementations make exactly one call per invocation; retries are the
/// caller's decision.
#[async_trait]
pub trait StsTransport: Send + Sync {
    async fn assume_role_with_saml(
        &self,
        principal_arn: &str,
        role_arn: &str,
        saml_assertion: &str,
        duration_seconds: i32,
    ) -> Result<Credentials>;
}

/// [`StsTransport`] backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct SdkStsTransport {
    client: StsClient,
}

impl SdkStsTransport {
    /// Build an STS client that signs nothing, since the assertion is the
    /// authentication.
    ///
    /// Region priority: explicit argument, then the SDK chain (ENV vars,
    /// config file), then [`DEFAULT_AWS_REGION`].
    pub async fn new(region: Option<&str>) -> Self {
        let loader = aws_config::defaults(BehaviorVersion::latest()).no_credentials();
        let loader = match region {
            Some(region) => loader.region(Region::new(region.to_string())),
            None => loader,
        };
        let loaded = loader.load().await;

        let config = match loaded.region() {
            Some(region) => {
                info!("Using region: {}", region);
                loaded
            }
            None => {
                info!(
                    "No region configured, using default {} for STS",
                    DEFAULT_AWS_REGION
                );
                aws_config::defaults(BehaviorVersion::latest())
                    .no_credentials()
                    .region(Region::new(DEFAULT_AWS_REGION))
                    .load()
                    .await
            }
        };

        Self {
            client: StsClient::new(&config),
        }
    }
}

#[async_trait]
impl StsTransport for SdkStsTransport {
    async fn assume_role_with_saml(
        &self,
        principal_arn: &str,
        role_arn: &str,
        saml_assertion: &str,
        duration_seconds: i32,
    ) -> Result<Credentials> {
        info!("Calling AWS STS AssumeRoleWithSAML");
        debug!("Role ARN: {}", role_arn);
        debug!("Principal ARN: {}", principal_arn);
        debug!("Duration: {} seconds", duration_seconds);

        let response = self
            .client
            .assume_role_with_saml()
            .role_arn(role_arn)
            .principal_arn(principal_arn)
            .saml_assertion(saml_assertion)
            .duration_seconds(duration_seconds)
            .send()
            .await
            .map_err(|e| {
                Error::Transport(format!(
                    "AssumeRoleWithSAML for {role_arn} failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let sts_creds = response
            .credentials()
            .ok_or_else(|| Error::Transport("AWS STS returned no credentials".to_string()))?;

        Ok(Credentials {
            access_key_id: sts_creds.access_key_id().to_string(),
            secret_access_key: sts_creds.secret_access_key().to_string(),
            session_token: sts_creds.session_token().to_string(),
            expiration: *sts_creds.expiration(),
        })
    }
}

/// What to use when neither the caller nor the profile names a duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationFallback {
    /// Interactive login: [`DEFAULT_SESSION_DURATION_SECS`]
    SessionDefault,
    /// Bulk refresh: no implicit value
    None,
}

/// Pick the session length: explicit request, then stored, then fallback
pub fn resolve_duration(
    requested: Option<i64>,
    stored: Option<i64>,
    fallback: DurationFallback,
) -> Option<i64> {
    requested.or(stored).or(match fallback {
        DurationFallback::SessionDefault => Some(DEFAULT_SESSION_DURATION_SECS),
        DurationFallback::None => None,
    })
}

/// Reject durations STS would refuse; values are never clamped
pub fn validate_duration(duration_seconds: i64) -> Result<i32> {
    if !(MIN_SESSION_DURATION_SECS..=MAX_SESSION_DURATION_SECS).contains(&duration_seconds) {
        return Err(Error::InvalidDuration(duration_seconds));
    }
    i32::try_from(duration_seconds).map_err(|_| Error::InvalidDuration(duration_seconds))
}

/// Trade an assertion and one of its bindings for fresh credentials
pub async fn exchange(
    transport: &dyn StsTransport,
    binding: &RoleBinding,
    assertion: &SamlAssertion,
    duration_seconds: i64,
) -> Result<Credentials> {
    let duration = validate_duration(duration_seconds)?;

    let credentials = transport
        .assume_role_with_saml(
            &binding.principal_arn,
            &binding.role_arn,
            assertion.as_str(),
            duration,
        )
        .await?;

    info!(
        "Obtained credentials for {} in {} valid until {}",
        binding.role_name,
        binding.account_id,
        credentials.expiration_rfc3339()
    );
    Ok(credentials)
}
