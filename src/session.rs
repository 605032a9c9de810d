//! Interactive login: one selection, one exchange, optional persistence

use aws_smithy_types::DateTime;
use tracing::info;

use crate::{
    aws::{
        Credentials, DurationFallback, ProfileStore, StsTransport, roles,
        sts::{self, resolve_duration},
    },
    error::{Error, Result},
    saml::SamlAssertion,
};

/// The account and role picked for this login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSelection {
    pub account_id: String,
    pub account_alias: Option<String>,
    pub role_name: String,
    pub principal_name: String,
}

/// What a successful login reports back to the user
#[derive(Debug, Clone)]
pub struct LoginSummary {
    pub account_alias: Option<String>,
    pub account_id: String,
    pub principal_name: String,
    pub role_name: String,
    pub expiration: DateTime,
    pub credentials: Credentials,
}

/// Exchange the assertion for the selected role and, when a profile name is
/// given, persist the result under it.
///
/// Any failure aborts before the store is touched. The duration falls back
/// to the profile's recorded one, then to the default session length.
pub async fn perform_login(
    transport: &dyn StsTransport,
    store: &mut dyn ProfileStore,
    selection: &ConsoleSelection,
    assertion: &SamlAssertion,
    requested_duration: Option<i64>,
    profile_name: Option<&str>,
) -> Result<LoginSummary> {
    let bindings = roles::parse_bindings(assertion)?;
    let binding = roles::resolve(&bindings, &selection.account_id, &selection.role_name)?;

    let stored_duration = match profile_name {
        Some(name) => store
            .get(Some(name))?
            .into_iter()
            .find_map(|p| p.duration_seconds),
        None => None,
    };
    let duration = resolve_duration(
        requested_duration,
        stored_duration,
        DurationFallback::SessionDefault,
    )
    .ok_or_else(|| Error::MissingDuration(profile_name.unwrap_or_default().to_string()))?;

    let credentials = sts::exchange(transport, binding, assertion, duration).await?;

    if let Some(name) = profile_name {
        store.upsert(
            name,
            &selection.account_id,
            &selection.role_name,
            duration,
            &credentials,
        )?;
    }

    info!(
        "Logged in as {} with role {} in account {}",
        selection.principal_name, selection.role_name, selection.account_id
    );

    Ok(LoginSummary {
        account_alias: selection.account_alias.clone(),
        account_id: selection.account_id.clone(),
        principal_name: selection.principal_name.clone(),
        role_name: selection.role_name.clone(),
        expiration: credentials.expiration,
        credentials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::DEFAULT_SESSION_DURATION_SECS,
        testing::{FakeTransport, MemoryProfileStore, assertion_with_roles, profile},
    };

    fn selection(account_id: &str, role_name: &str) -> ConsoleSelection {
        ConsoleSelection {
            account_id: account_id.to_string(),
            account_alias: Some("corp-prod".to_string()),
            role_name: role_name.to_string(),
            principal_name: "jane@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_without_profile_does_not_write() {
        let transport = FakeTransport::default();
        let mut store = MemoryProfileStore::default();
        let assertion = assertion_with_roles(&[("111111111111", "Admin")]);

        let summary = perform_login(
            &transport,
            &mut store,
            &selection("111111111111", "Admin"),
            &assertion,
            None,
            None,
        )
        .await
        .unwrap();

        assert_eq!(summary.account_id, "111111111111");
        assert_eq!(summary.account_alias.as_deref(), Some("corp-prod"));
        assert_eq!(summary.principal_name, "jane@example.com");
        assert_eq!(summary.role_name, "Admin");
        assert_eq!(summary.expiration, summary.credentials.expiration);
        assert!(store.upserts.is_empty());
        assert_eq!(
            transport.calls()[0].duration_seconds,
            DEFAULT_SESSION_DURATION_SECS as i32
        );
    }

    #[tokio::test]
    async fn test_login_with_profile_upserts_everything() {
        let transport = FakeTransport::default();
        let mut store = MemoryProfileStore::default();
        let assertion = assertion_with_roles(&[("111111111111", "Admin")]);

        let summary = perform_login(
            &transport,
            &mut store,
            &selection("111111111111", "Admin"),
            &assertion,
            Some(7200),
            Some("prod"),
        )
        .await
        .unwrap();

        assert_eq!(store.upserts.len(), 1);
        let upsert = &store.upserts[0];
        assert_eq!(upsert.name, "prod");
        assert_eq!(upsert.account_id, "111111111111");
        assert_eq!(upsert.role_name, "Admin");
        assert_eq!(upsert.duration_seconds, 7200);
        assert_eq!(upsert.credentials, summary.credentials);
    }

    #[tokio::test]
    async fn test_login_reuses_stored_duration() {
        let transport = FakeTransport::default();
        let mut store =
            MemoryProfileStore::with_profiles(vec![profile("prod", "111111111111", "Admin", Some(1800))]);
        let assertion = assertion_with_roles(&[("111111111111", "Admin")]);

        perform_login(
            &transport,
            &mut store,
            &selection("111111111111", "Admin"),
            &assertion,
            None,
            Some("prod"),
        )
        .await
        .unwrap();

        assert_eq!(transport.calls()[0].duration_seconds, 1800);
        assert_eq!(store.upserts[0].duration_seconds, 1800);
    }

    #[tokio::test]
    async fn test_login_profile_without_stored_duration_uses_session_default() {
        let transport = FakeTransport::default();
        let mut store =
            MemoryProfileStore::with_profiles(vec![profile("prod", "111111111111", "Admin", None)]);
        let assertion = assertion_with_roles(&[("111111111111", "Admin")]);

        perform_login(
            &transport,
            &mut store,
            &selection("111111111111", "Admin"),
            &assertion,
            None,
            Some("prod"),
        )
        .await
        .unwrap();

        assert_eq!(
            store.upserts[0].duration_seconds,
            DEFAULT_SESSION_DURATION_SECS
        );
    }

    #[tokio::test]
    async fn test_login_unauthorized_role_is_fatal_and_writes_nothing() {
        let transport = FakeTransport::default();
        let mut store = MemoryProfileStore::default();
        let assertion = assertion_with_roles(&[("111111111111", "Admin")]);

        let err = perform_login(
            &transport,
            &mut store,
            &selection("111111111111", "Dev"),
            &assertion,
            None,
            Some("prod"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::RoleNotAuthorized { .. }));
        assert!(transport.calls().is_empty());
        assert!(store.upserts.is_empty());
    }

    #[tokio::test]
    async fn test_login_invalid_duration_writes_nothing() {
        let transport = FakeTransport::default();
        let mut store = MemoryProfileStore::default();
        let assertion = assertion_with_roles(&[("111111111111", "Admin")]);

        let err = perform_login(
            &transport,
            &mut store,
            &selection("111111111111", "Admin"),
            &assertion,
            Some(60),
            Some("prod"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::InvalidDuration(60)));
        assert!(store.upserts.is_empty());
    }

    #[tokio::test]
    async fn test_login_transport_failure_writes_nothing() {
        let transport = FakeTransport::failing_for("Admin");
        let mut store = MemoryProfileStore::default();
        let assertion = assertion_with_roles(&[("111111111111", "Admin")]);

        let err = perform_login(
            &transport,
            &mut store,
            &selection("111111111111", "Admin"),
            &assertion,
            None,
            Some("prod"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert!(store.upserts.is_empty());
    }

    #[tokio::test]
    async fn test_login_malformed_assertion() {
        let transport = FakeTransport::default();
        let mut store = MemoryProfileStore::default();

        let err = perform_login(
            &transport,
            &mut store,
            &selection("111111111111", "Admin"),
            &SamlAssertion::new("<<not base64>>"),
            None,
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::MalformedAssertion(_)));
    }
}
