//! Fakes and fixtures shared by unit tests

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use aws_smithy_types::DateTime;
use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{
    aws::{Credentials, Profile, ProfileStore, RoleBinding, StsTransport},
    constants::{AWS_ROLE_ATTRIBUTE, AWS_ROLE_SESSION_NAME_ATTRIBUTE},
    error::{Error, Result},
    saml::SamlAssertion,
};

pub fn role_arn(account_id: &str, role_name: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{role_name}")
}

pub fn provider_arn(account_id: &str) -> String {
    format!("arn:aws:iam::{account_id}:saml-provider/Corp")
}

pub fn binding(account_id: &str, role_name: &str) -> RoleBinding {
    RoleBinding {
        account_id: account_id.to_string(),
        role_name: role_name.to_string(),
        role_arn: role_arn(account_id, role_name),
        principal_arn: provider_arn(account_id),
    }
}

/// Base64 SAML response granting the given roles to `jane@example.com`
pub fn assertion_with_roles(roles: &[(&str, &str)]) -> SamlAssertion {
    let role_attribute = if roles.is_empty() {
        String::new()
    } else {
        let values: String = roles
            .iter()
            .map(|(account, role)| {
                format!(
                    "<saml2:AttributeValue>{},{}</saml2:AttributeValue>",
                    provider_arn(account),
                    role_arn(account, role)
                )
            })
            .collect();
        format!(r#"<saml2:Attribute Name="{AWS_ROLE_ATTRIBUTE}">{values}</saml2:Attribute>"#)
    };

    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<saml2p:Response xmlns:saml2p="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml2="urn:oasis:names:tc:SAML:2.0:assertion">
  <saml2:Assertion>
    <saml2:AttributeStatement>
      <saml2:Attribute Name="{AWS_ROLE_SESSION_NAME_ATTRIBUTE}"><saml2:AttributeValue>jane@example.com</saml2:AttributeValue></saml2:Attribute>
      {role_attribute}
    </saml2:AttributeStatement>
  </saml2:Assertion>
</saml2p:Response>"#
    );

    SamlAssertion::new(STANDARD.encode(xml))
}

pub fn credentials(access_key_id: &str, expires_at: i64) -> Credentials {
    Credentials {
        access_key_id: access_key_id.to_string(),
        secret_access_key: format!("secret-{access_key_id}"),
        session_token: format!("token-{access_key_id}"),
        expiration: DateTime::from_secs(expires_at),
    }
}

pub fn profile(name: &str, account_id: &str, role_name: &str, duration: Option<i64>) -> Profile {
    Profile {
        name: name.to_string(),
        account_id: Some(account_id.to_string()),
        role_name: Some(role_name.to_string()),
        duration_seconds: duration,
        credentials: None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StsCall {
    pub principal_arn: String,
    pub role_arn: String,
    pub assertion: String,
    pub duration_seconds: i32,
}

/// Transport minting numbered credentials, optionally failing for some roles
#[derive(Debug, Default)]
pub struct FakeTransport {
    calls: Mutex<Vec<StsCall>>,
    minted: AtomicUsize,
    failing_roles: Vec<String>,
}

impl FakeTransport {
    pub fn failing_for(role_name: &str) -> Self {
        Self {
            failing_roles: vec![role_name.to_string()],
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<StsCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StsTransport for FakeTransport {
    async fn assume_role_with_saml(
        &self,
        principal_arn: &str,
        role_arn: &str,
        saml_assertion: &str,
        duration_seconds: i32,
    ) -> Result<Credentials> {
        self.calls.lock().unwrap().push(StsCall {
            principal_arn: principal_arn.to_string(),
            role_arn: role_arn.to_string(),
            assertion: saml_assertion.to_string(),
            duration_seconds,
        });

        let role_name = role_arn.rsplit('/').next().unwrap_or_default();
        if self.failing_roles.iter().any(|r| r == role_name) {
            return Err(Error::Transport(format!("access denied for {role_arn}")));
        }

        let n = self.minted.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(credentials(
            &format!("ASIA-{role_name}-{n}"),
            1_700_000_000 + i64::from(duration_seconds),
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Upsert {
    pub name: String,
    pub account_id: String,
    pub role_name: String,
    pub duration_seconds: i64,
    pub credentials: Credentials,
}

/// In-memory store recording every upsert
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    pub profiles: Vec<Profile>,
    pub upserts: Vec<Upsert>,
    pub failing_writes: Vec<String>,
}

impl MemoryProfileStore {
    pub fn with_profiles(profiles: Vec<Profile>) -> Self {
        Self {
            profiles,
            ..Self::default()
        }
    }
}

impl ProfileStore for MemoryProfileStore {
    fn upsert(
        &mut self,
        name: &str,
        account_id: &str,
        role_name: &str,
        duration_seconds: i64,
        credentials: &Credentials,
    ) -> Result<()> {
        if self.failing_writes.iter().any(|n| n == name) {
            return Err(Error::StoreWrite {
                path: "memory".into(),
                source: std::io::Error::other("disk full"),
            });
        }

        self.upserts.push(Upsert {
            name: name.to_string(),
            account_id: account_id.to_string(),
            role_name: role_name.to_string(),
            duration_seconds,
            credentials: credentials.clone(),
        });

        let updated = Profile {
            name: name.to_string(),
            account_id: Some(account_id.to_string()),
            role_name: Some(role_name.to_string()),
            duration_seconds: Some(duration_seconds),
            credentials: Some(credentials.clone()),
        };
        match self.profiles.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = updated,
            None => self.profiles.push(updated),
        }
        Ok(())
    }

    fn get(&self, name_filter: Option<&str>) -> Result<Vec<Profile>> {
        Ok(self
            .profiles
            .iter()
            .filter(|p| name_filter.is_none_or(|n| n == p.name))
            .cloned()
            .collect())
    }
}
