pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

#[derive(Parser)]
#[command(name = "protoctl")]
#[command(about = "Protocol Admin CLI - inspect and deploy the managed repository")]
#[command(version)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "PROTOCOL_ADMIN_URL",
        default_value = "http://127.0.0.1:5000",
        help = "Server base URL"
    )]
    pub server: String,

    #[arg(long, global = true, env = "PROTOCOL_ADMIN_TOKEN", hide_env_values = true, help = "Bearer token")]
    pub token: Option<String>,

    #[arg(long, global = true, help = "Print raw JSON responses")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Show working tree status")]
    Status,

    #[command(about = "Show recent commits")]
    Log {
        #[arg(long, short = 'n', help = "Number of commits")]
        limit: Option<u32>,
    },

    #[command(about = "Show ahead/behind counts against the remote")]
    Branch,

    #[command(about = "Pull the current branch")]
    Pull,

    #[command(about = "Commit, build and publish")]
    Deploy {
        #[arg(long, short = 'm', help = "Commit message")]
        message: String,
    },

    #[command(about = "Mint a token with the configured JWT_SECRET")]
    Token {
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "viewer", help = "admin, editor or viewer")]
        role: Role,
        #[arg(long, help = "Override the configured expiry")]
        expiry_hours: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Token {
            user_id,
            username,
            role,
            expiry_hours,
        } => commands::token::handle(user_id, &username, role, expiry_hours, output_format),
        command => {
            let client = client::ApiClient::new(&cli.server, cli.token)?;
            commands::git::handle(&client, command, output_format).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_deploy_with_message() {
        let cli = Cli::try_parse_from(["protoctl", "--server", "http://x:1", "deploy", "-m", "ship it"]).unwrap();
        assert_eq!(cli.server, "http://x:1");
        match cli.command {
            Commands::Deploy { message } => assert_eq!(message, "ship it"),
            _ => panic!("expected deploy"),
        }
    }

    #[test]
    fn parses_token_role() {
        let cli = Cli::try_parse_from([
            "protoctl", "token", "--user-id", "4", "--username", "dana", "--role", "editor",
        ])
        .unwrap();
        match cli.command {
            Commands::Token { user_id, role, .. } => {
                assert_eq!(user_id, 4);
                assert_eq!(role, Role::Editor);
            }
            _ => panic!("expected token"),
        }
    }

    #[test]
    fn deploy_requires_message() {
        assert!(Cli::try_parse_from(["protoctl", "deploy"]).is_err());
    }
}
