use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use dialoguer::{Select, theme::ColorfulTheme};
use tracing::info;

use super::{AssertionArgs, GlobalOptions};
use crate::{
    aws::{Credentials, RoleBinding, SdkStsTransport, roles},
    config,
    constants::AWS_ROLE_SESSION_NAME_ATTRIBUTE,
    session::{self, ConsoleSelection, LoginSummary},
};

#[derive(Debug, Clone, Default, Args)]
pub struct LoginCommand {
    #[arg(short = 'p', long, help = "Save the credentials under this AWS profile")]
    pub profile: Option<String>,

    #[arg(short = 'a', long = "account", help = "AWS account ID to log in to")]
    pub account_id: Option<String>,

    #[arg(short = 'r', long = "role", help = "IAM role name to assume")]
    pub role_name: Option<String>,

    #[arg(
        short = 'd',
        long = "duration",
        value_name = "SECONDS",
        help = "Session duration (900-43200)"
    )]
    pub duration_seconds: Option<i64>,

    #[command(flatten)]
    pub assertion: AssertionArgs,
}

impl LoginCommand {
    pub async fn execute(self, global: &GlobalOptions) -> Result<()> {
        let assertion = self.assertion.obtain(global).await?;

        let bindings = roles::parse_bindings(&assertion)?;
        let binding = self.choose_binding(&bindings)?;

        let principal_name = assertion
            .decode()?
            .get_attribute_value(AWS_ROLE_SESSION_NAME_ATTRIBUTE)?
            .unwrap_or_else(|| "unknown".to_string());

        let selection = ConsoleSelection {
            account_id: binding.account_id.clone(),
            account_alias: None,
            role_name: binding.role_name.clone(),
            principal_name,
        };

        let config = config::load(&global.idp).await?;
        let transport = SdkStsTransport::new(config.sts_region.as_deref()).await;
        let mut store = global.profile_store()?;

        info!(
            "Requesting credentials for role {} in account {}",
            selection.role_name, selection.account_id
        );
        let summary = session::perform_login(
            &transport,
            &mut store,
            &selection,
            &assertion,
            self.duration_seconds,
            self.profile.as_deref(),
        )
        .await
        .context("Login failed")?;

        match &self.profile {
            Some(profile) => {
                println!("{}", describe(&summary));
                println!(
                    "Credentials saved to profile {profile} in {}",
                    store.path().display()
                );
            }
            None => {
                // stdout stays eval-able
                eprintln!("{}", describe(&summary));
                print!("{}", export_lines(&summary.credentials));
            }
        }

        Ok(())
    }

    fn choose_binding<'a>(&self, bindings: &'a [RoleBinding]) -> Result<&'a RoleBinding> {
        if let (Some(account_id), Some(role_name)) = (&self.account_id, &self.role_name) {
            return Ok(roles::resolve(bindings, account_id, role_name)?);
        }

        let matching = candidates(
            bindings,
            self.account_id.as_deref(),
            self.role_name.as_deref(),
        );
        match matching.as_slice() {
            [] if bindings.is_empty() => bail!("The SAML response grants no AWS roles"),
            [] => bail!("No role in the SAML response matches the given account or role"),
            [only] => Ok(*only),
            _ => prompt_for_binding(&matching),
        }
    }
}

fn candidates<'a>(
    bindings: &'a [RoleBinding],
    account_id: Option<&str>,
    role_name: Option<&str>,
) -> Vec<&'a RoleBinding> {
    bindings
        .iter()
        .filter(|b| account_id.is_none_or(|a| a == b.account_id))
        .filter(|b| role_name.is_none_or(|r| r == b.role_name))
        .collect()
}

fn prompt_for_binding<'a>(candidates: &[&'a RoleBinding]) -> Result<&'a RoleBinding> {
    let items: Vec<String> = candidates
        .iter()
        .map(|b| format!("{} / {}", b.account_id, b.role_name))
        .collect();

    let index = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a role")
        .items(&items)
        .default(0)
        .interact()
        .context("Failed to read role selection")?;

    candidates
        .get(index)
        .copied()
        .ok_or_else(|| anyhow!("Invalid role selection"))
}

fn describe(summary: &LoginSummary) -> String {
    let account = match &summary.account_alias {
        Some(alias) => format!("{alias} ({})", summary.account_id),
        None => summary.account_id.clone(),
    };
    format!(
        "Logged in to {account} as {} with role {}. Expires at {}",
        summary.principal_name,
        summary.role_name,
        summary.credentials.expiration_rfc3339()
    )
}

fn export_lines(credentials: &Credentials) -> String {
    format!(
        "export AWS_ACCESS_KEY_ID={}\nexport AWS_SECRET_ACCESS_KEY={}\nexport AWS_SESSION_TOKEN={}\n",
        credentials.access_key_id, credentials.secret_access_key, credentials.session_token
    )
}
