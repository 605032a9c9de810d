use anyhow::{Context, Result};
use aws_smithy_types::DateTime;
use clap::Args;
use serde::Serialize;
use std::time::SystemTime;

use super::GlobalOptions;
use crate::aws::{Profile, ProfileStore};

#[derive(Debug, Clone, Args)]
pub struct ListCommand {
    #[arg(short = 'p', long, help = "Show only this profile")]
    pub profile: Option<String>,

    #[arg(long, help = "Print the profiles as JSON")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ProfileRow<'a> {
    profile: &'a str,
    account_id: Option<&'a str>,
    role_name: Option<&'a str>,
    duration_seconds: Option<i64>,
    renewable: bool,
    expiration: Option<String>,
    expired: Option<bool>,
}

impl<'a> ProfileRow<'a> {
    fn new(profile: &'a Profile, now: &DateTime) -> Self {
        let credentials = profile.credentials.as_ref();
        Self {
            profile: &profile.name,
            account_id: profile.account_id.as_deref(),
            role_name: profile.role_name.as_deref(),
            duration_seconds: profile.duration_seconds,
            renewable: profile.is_renewable(),
            expiration: credentials.map(|c| c.expiration_rfc3339()),
            expired: credentials.map(|c| c.expiration.secs() <= now.secs()),
        }
    }
}

impl ListCommand {
    pub async fn execute(self, global: &GlobalOptions) -> Result<()> {
        let store = global.profile_store()?;
        let profiles = store.get(self.profile.as_deref())?;

        let now = DateTime::from(SystemTime::now());
        let rows: Vec<ProfileRow> = profiles.iter().map(|p| ProfileRow::new(p, &now)).collect();

        if self.json {
            let json =
                serde_json::to_string_pretty(&rows).context("Failed to serialize profiles")?;
            println!("{json}");
        } else {
            print!("{}", render_text(&rows));
        }

        Ok(())
    }
}

fn render_text(rows: &[ProfileRow]) -> String {
    if rows.is_empty() {
        return "No profiles found\n".to_string();
    }

    let mut out = format!(
        "{:<24} {:<14} {:<24} {:>8}  {}\n",
        "PROFILE", "ACCOUNT", "ROLE", "DURATION", "EXPIRES"
    );
    for row in rows {
        let expires = match (&row.expiration, row.expired) {
            (Some(at), Some(true)) => format!("{at} (expired)"),
            (Some(at), _) => at.clone(),
            (None, _) => "-".to_string(),
        };
        let duration = row
            .duration_seconds
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let line = format!(
            "{:<24} {:<14} {:<24} {:>8}  {}",
            row.profile,
            row.account_id.unwrap_or("-"),
            row.role_name.unwrap_or("-"),
            duration,
            expires
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
