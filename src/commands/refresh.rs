use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::{AssertionArgs, GlobalOptions};
use crate::{
    aws::{SdkStsTransport, format_expiration},
    config,
    refresh::{self, RefreshOutcome, RefreshStatus},
};

#[derive(Debug, Clone, Args)]
pub struct RefreshCommand {
    #[arg(short = 'p', long, help = "Refresh only this profile")]
    pub profile: Option<String>,

    #[arg(
        short = 'd',
        long = "duration",
        value_name = "SECONDS",
        help = "Override the recorded session duration for every profile"
    )]
    pub duration_seconds: Option<i64>,

    #[arg(long, help = "Print the outcome as JSON")]
    pub json: bool,

    #[command(flatten)]
    pub assertion: AssertionArgs,
}

#[derive(Debug, Serialize)]
struct OutcomeRow<'a> {
    profile: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a RefreshOutcome> for OutcomeRow<'a> {
    fn from(outcome: &'a RefreshOutcome) -> Self {
        let (status, expiration, error) = match &outcome.status {
            RefreshStatus::Renewed { expiration } => {
                ("renewed", Some(format_expiration(expiration)), None)
            }
            RefreshStatus::Skipped => ("skipped", None, None),
            RefreshStatus::Failed(e) => ("failed", None, Some(e.to_string())),
        };
        Self {
            profile: &outcome.name,
            status,
            expiration,
            error,
        }
    }
}

impl RefreshCommand {
    /// Per-profile failures are reported but do not fail the command
    pub async fn execute(self, global: &GlobalOptions) -> Result<()> {
        let mut store = global.profile_store()?;
        let assertion = self.assertion.obtain(global).await?;

        let config = config::load(&global.idp).await?;
        let transport = SdkStsTransport::new(config.sts_region.as_deref()).await;

        let outcomes = refresh::refresh_profiles(
            &transport,
            &mut store,
            &assertion,
            self.profile.as_deref(),
            self.duration_seconds,
        )
        .await
        .context("Refresh aborted")?;

        if self.json {
            println!("{}", render_json(&outcomes)?);
        } else {
            print!("{}", render_text(&outcomes));
        }

        Ok(())
    }
}

fn render_json(outcomes: &[RefreshOutcome]) -> Result<String> {
    let rows: Vec<OutcomeRow> = outcomes.iter().map(OutcomeRow::from).collect();
    serde_json::to_string_pretty(&rows).context("Failed to serialize refresh outcome")
}

fn render_text(outcomes: &[RefreshOutcome]) -> String {
    if outcomes.is_empty() {
        return "No profiles to refresh\n".to_string();
    }

    let mut out = String::new();
    for row in outcomes.iter().map(OutcomeRow::from) {
        let detail = row.expiration.or(row.error).unwrap_or_default();
        out.push_str(format!("{:<24} {:<8} {}", row.profile, row.status, detail).trim_end());
        out.push('\n');
    }

    let renewed = outcomes.iter().filter(|o| o.is_renewed()).count();
    let failed = outcomes.iter().filter(|o| o.is_failed()).count();
    out.push_str(&format!(
        "{renewed} renewed, {} skipped, {failed} failed\n",
        outcomes.len() - renewed - failed
    ));
    out
}
