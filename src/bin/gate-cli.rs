use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use method_gate::config::load_config;
use method_gate::security::MethodPolicy;

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Offline tooling for method-gate configurations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file and print the effective method policy
    Check {
        config: PathBuf,
    },
    /// Evaluate one request method against a config file
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,

        /// Request path used to select route rules
        #[arg(short, long, default_value = "/")]
        path: String,

        /// Method token as it would arrive on the wire
        method: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            let config = load_config(&config)?;
            let summary = match MethodPolicy::from_config(&config.security) {
                Ok(Some(policy)) => {
                    let rules: Vec<_> = policy
                        .rules()
                        .map(|(prefix, guard)| {
                            json!({
                                "path_prefix": prefix,
                                "allowed": guard.map(|g| allowed(g.allowlist().methods())),
                            })
                        })
                        .collect();
                    json!({
                        "enforced": true,
                        "global": policy.global().map(|g| allowed(g.allowlist().methods())),
                        "route_rules": rules,
                    })
                }
                Ok(None) => json!({ "enforced": false }),
                // load_config already validated the policy.
                Err(errors) => return Err(errors[0].clone().into()),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Evaluate {
            config,
            path,
            method,
        } => {
            let config = load_config(&config)?;
            let policy = MethodPolicy::from_config(&config.security)
                .map_err(|errors| errors[0].clone())?;

            let output = match policy.as_ref().and_then(|p| p.guard_for(&path)) {
                Some(guard) => json!({
                    "enforced": true,
                    "decision": guard.evaluate(&method),
                }),
                None => json!({ "enforced": false }),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn allowed(methods: &[axum::http::Method]) -> Vec<&str> {
    methods.iter().map(|m| m.as_str()).collect()
}
