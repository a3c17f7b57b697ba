use serde_json::{json, Value};

use crate::cli::client::{ApiClient, ApiReply};
use crate::cli::utils::print_json;
use crate::cli::{Commands, OutputFormat};

pub async fn handle(client: &ApiClient, command: Commands, output_format: OutputFormat) -> anyhow::Result<()> {
    let reply = match &command {
        Commands::Status => client.get("/api/git/status").await?,
        Commands::Log { limit } => {
            let path = match limit {
                Some(limit) => format!("/api/git/log?limit={}", limit),
                None => "/api/git/log".to_string(),
            };
            client.get(&path).await?
        }
        Commands::Branch => client.get("/api/git/branch-status").await?,
        Commands::Pull => client.post("/api/git/pull", None).await?,
        Commands::Deploy { message } => {
            client
                .post("/api/git/deploy", Some(json!({ "commit_message": message })))
                .await?
        }
        Commands::Token { .. } => anyhow::bail!("token is handled locally"),
    };

    if output_format == OutputFormat::Json {
        print_json(&reply.body)?;
        return finish(&reply);
    }

    if !reply.success() {
        if let Some(steps) = reply.body.get("steps").and_then(Value::as_array) {
            print_steps(steps);
        }
        return finish(&reply);
    }

    let data = reply.data();
    match command {
        Commands::Status => print_status(data),
        Commands::Log { .. } => print_log(data),
        Commands::Branch => print_branch(data),
        Commands::Pull => {
            println!("✓ {}", text(data, "message"));
            let output = text(data, "output");
            if !output.trim().is_empty() {
                println!("{}", output.trim_end());
            }
        }
        Commands::Deploy { .. } => {
            if let Some(steps) = data.get("steps").and_then(Value::as_array) {
                print_steps(steps);
            }
            println!("✓ {}", text(data, "message"));
        }
        Commands::Token { .. } => {}
    }
    Ok(())
}

fn finish(reply: &ApiReply) -> anyhow::Result<()> {
    if reply.success() {
        return Ok(());
    }
    match reply.body.get("code").and_then(Value::as_str) {
        Some(code) => anyhow::bail!("[{}] {}", code, reply.error_message()),
        None => anyhow::bail!("{}", reply.error_message()),
    }
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn print_status(data: &Value) {
    println!("On branch {}", text(data, "current_branch"));
    match data.get("changed_files").and_then(Value::as_array) {
        Some(files) if !files.is_empty() => {
            for file in files {
                println!("{} {}", text(file, "status"), text(file, "filename"));
            }
        }
        _ => println!("Working tree clean"),
    }
}

fn print_log(data: &Value) {
    for commit in data.as_array().into_iter().flatten() {
        println!(
            "{}  {}  {}  {}",
            text(commit, "hash"),
            text(commit, "date"),
            text(commit, "author"),
            text(commit, "message")
        );
    }
}

fn print_branch(data: &Value) {
    let branch = text(data, "current_branch");
    if data.get("has_remote").and_then(Value::as_bool).unwrap_or(false) {
        println!(
            "{}: {} ahead, {} behind",
            branch,
            data["ahead"].as_u64().unwrap_or(0),
            data["behind"].as_u64().unwrap_or(0)
        );
    } else {
        println!("{}: no remote branch", branch);
    }
}

fn print_steps(steps: &[Value]) {
    for step in steps {
        let marker = if text(step, "status") == "warning" { "!" } else { "✓" };
        println!("{} {}", marker, text(step, "step"));
        for line in text(step, "output").lines() {
            println!("    {}", line);
        }
    }
}
