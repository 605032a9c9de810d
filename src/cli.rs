use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{
    CompletionsCommand, ConfigureCommand, GlobalOptions, ListCommand, LoginCommand,
    RefreshCommand,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "samlroll", version, about = "Exchange SAML assertions for AWS credentials and keep profiles fresh", long_about = None, arg_required_else_help = false)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "default",
        help = "Identity provider configuration to use"
    )]
    pub idp: String,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "AWS shared credentials file (default: $AWS_SHARED_CREDENTIALS_FILE or ~/.aws/credentials)"
    )]
    pub credentials_file: Option<PathBuf>,

    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Log in to one account and role with a SAML assertion")]
    Login(LoginCommand),
    #[command(about = "Renew every stored profile from one SAML assertion")]
    Refresh(RefreshCommand),
    #[command(about = "Show stored profiles and their expiration")]
    List(ListCommand),
    #[command(about = "Configure the identity provider and browser settings")]
    Configure(ConfigureCommand),
    #[command(about = "Generate shell completion scripts for samlroll")]
    Completions(CompletionsCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let global = GlobalOptions {
            idp: self.idp,
            credentials_file: self.credentials_file,
        };
        let command = self
            .command
            .unwrap_or_else(|| Commands::Login(LoginCommand::default()));

        match command {
            Commands::Login(cmd) => cmd.execute(&global).await,
            Commands::Refresh(cmd) => cmd.execute(&global).await,
            Commands::List(cmd) => cmd.execute(&global).await,
            Commands::Configure(cmd) => cmd.execute(&global).await,
            Commands::Completions(cmd) => {
                cmd.execute();
                Ok(())
            }
        }
    }
}
