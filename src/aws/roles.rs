use tracing::{debug, warn};

use crate::{
    constants::AWS_ROLE_ATTRIBUTE,
    error::{Error, Result},
    saml::SamlAssertion,
};

/// One assumable role granted by an assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleBinding {
    pub account_id: String,
    pub role_name: String,
    pub role_arn: String,
    pub principal_arn: String,
}

impl RoleBinding {
    /// ARNペアの解析（AWS固有フォーマット）
    ///
    /// IdPs disagree on the order of the two ARNs, so the one naming a
    /// `role/` resource is taken as the role regardless of position.
    fn parse_arn_pair(arn_pair: &str) -> Option<Self> {
        let parts: Vec<&str> = arn_pair.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return None;
        }

        let (role_arn, principal_arn) = if parts[0].contains(":role/") {
            (parts[0], parts[1])
        } else {
            (parts[1], parts[0])
        };

        let (account_id, role_name) = split_role_arn(role_arn)?;
        if !principal_arn.contains(":saml-provider/") {
            return None;
        }

        Some(RoleBinding {
            account_id: account_id.to_string(),
            role_name: role_name.to_string(),
            role_arn: role_arn.to_string(),
            principal_arn: principal_arn.to_string(),
        })
    }
}

/// Account ID and role name of `arn:<partition>:iam::<account>:role/<path>/<name>`
fn split_role_arn(role_arn: &str) -> Option<(&str, &str)> {
    let fields: Vec<&str> = role_arn.splitn(6, ':').collect();
    match fields.as_slice() {
        ["arn", _partition, "iam", "", account_id, resource] if !account_id.is_empty() => {
            let name = resource.strip_prefix("role/")?.rsplit('/').next()?;
            (!name.is_empty()).then_some((*account_id, name))
        }
        _ => None,
    }
}

/// Extract every role binding an assertion grants
///
/// Fails only when the assertion cannot be decoded. An assertion without
/// the AWS role attribute yields an empty list. When the same account and
/// role appear twice the first binding wins.
pub fn parse_bindings(assertion: &SamlAssertion) -> Result<Vec<RoleBinding>> {
    let response = assertion.decode()?;
    let values = response.get_attribute_values(AWS_ROLE_ATTRIBUTE)?;

    let mut bindings: Vec<RoleBinding> = Vec::with_capacity(values.len());
    for value in &values {
        let Some(binding) = RoleBinding::parse_arn_pair(value) else {
            warn!("Ignoring unrecognized role attribute value: {}", value);
            continue;
        };

        if find_by_account_and_role(&bindings, &binding.account_id, &binding.role_name).is_some() {
            warn!(
                "Duplicate binding for role {} in account {}, keeping the first",
                binding.role_name, binding.account_id
            );
            continue;
        }
        bindings.push(binding);
    }

    debug!("Assertion grants {} role binding(s)", bindings.len());
    Ok(bindings)
}

/// Exact, case-sensitive lookup by account ID and role name
pub fn find_by_account_and_role<'a>(
    bindings: &'a [RoleBinding],
    account_id: &str,
    role_name: &str,
) -> Option<&'a RoleBinding> {
    bindings
        .iter()
        .find(|b| b.account_id == account_id && b.role_name == role_name)
}

/// Turn a selection into the ARN pair STS needs
pub fn resolve<'a>(
    bindings: &'a [RoleBinding],
    account_id: &str,
    role_name: &str,
) -> Result<&'a RoleBinding> {
    find_by_account_and_role(bindings, account_id, role_name).ok_or_else(|| {
        Error::RoleNotAuthorized {
            account_id: account_id.to_string(),
            role_name: role_name.to_string(),
        }
    })
}
