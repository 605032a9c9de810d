//! Bulk renewal of stored profiles from a single assertion

use aws_smithy_types::DateTime;
use tracing::{debug, info, warn};

use crate::{
    aws::{
        DurationFallback, Profile, ProfileStore, RoleBinding, StsTransport, roles,
        sts::{self, resolve_duration},
    },
    error::{Error, Result},
    saml::SamlAssertion,
};

/// Result of one profile in a refresh pass
#[derive(Debug)]
pub enum RefreshStatus {
    Renewed { expiration: DateTime },
    /// No account or role recorded; never sent to STS
    Skipped,
    Failed(Error),
}

#[derive(Debug)]
pub struct RefreshOutcome {
    pub name: String,
    pub status: RefreshStatus,
}

impl RefreshOutcome {
    pub fn is_renewed(&self) -> bool {
        matches!(self.status, RefreshStatus::Renewed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, RefreshStatus::Failed(_))
    }
}

/// Renew every eligible profile (or the one named) with a shared assertion
///
/// Only an undecodable assertion or an unreadable store abort the pass.
/// Everything else is recorded on the affected profile and the pass moves
/// on, so outcomes come back one per profile in store order.
pub async fn refresh_profiles(
    transport: &dyn StsTransport,
    store: &mut dyn ProfileStore,
    assertion: &SamlAssertion,
    name_filter: Option<&str>,
    override_duration: Option<i64>,
) -> Result<Vec<RefreshOutcome>> {
    let bindings = roles::parse_bindings(assertion)?;
    let profiles = store.get(name_filter)?;

    if profiles.is_empty() {
        info!("No profiles to refresh");
    }

    let mut outcomes = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let status = match profile.renewal_target() {
            Some((account_id, role_name)) => {
                let renewed = renew(
                    transport,
                    store,
                    assertion,
                    &bindings,
                    &profile,
                    (account_id, role_name),
                    override_duration,
                )
                .await;
                match renewed {
                    Ok(expiration) => RefreshStatus::Renewed { expiration },
                    Err(e) => {
                        warn!("Failed to refresh profile {}: {}", profile.name, e);
                        RefreshStatus::Failed(e)
                    }
                }
            }
            None => {
                debug!("Skipping profile {}: no account or role recorded", profile.name);
                RefreshStatus::Skipped
            }
        };

        outcomes.push(RefreshOutcome {
            name: profile.name,
            status,
        });
    }

    Ok(outcomes)
}

async fn renew(
    transport: &dyn StsTransport,
    store: &mut dyn ProfileStore,
    assertion: &SamlAssertion,
    bindings: &[RoleBinding],
    profile: &Profile,
    (account_id, role_name): (&str, &str),
    override_duration: Option<i64>,
) -> Result<DateTime> {
    let binding = roles::resolve(bindings, account_id, role_name)?;
    let duration = resolve_duration(
        override_duration,
        profile.duration_seconds,
        DurationFallback::None,
    )
    .ok_or_else(|| Error::MissingDuration(profile.name.clone()))?;

    let credentials = sts::exchange(transport, binding, assertion, duration).await?;
    store.upsert(&profile.name, account_id, role_name, duration, &credentials)?;

    info!("Refreshed profile {}", profile.name);
    Ok(credentials.expiration)
}
