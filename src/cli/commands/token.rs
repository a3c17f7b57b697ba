use anyhow::Context;
use serde_json::json;

use crate::auth::{generate_jwt, AuthKeys, Claims, Role};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;

pub fn handle(
    user_id: i64,
    username: &str,
    role: Role,
    expiry_hours: Option<u64>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let security = &config::config().security;
    let keys = AuthKeys::from_config(security).context("JWT_SECRET must be set to mint tokens")?;
    let hours = expiry_hours.unwrap_or(keys.expiry_hours());

    let token = generate_jwt(&keys, &Claims::new(user_id, username, role, hours)?)?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "token generated",
            Some(json!({ "token": token, "role": role, "expires_in_hours": hours })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
