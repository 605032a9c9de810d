use anyhow::Result;
use clap::Args;

use super::GlobalOptions;
use crate::config;

#[derive(Debug, Clone, Args)]
pub struct ConfigureCommand {}

impl ConfigureCommand {
    /// Edit the config section named by `--idp`
    pub async fn execute(self, global: &GlobalOptions) -> Result<()> {
        config::configure_interactive(&global.idp).await
    }
}
