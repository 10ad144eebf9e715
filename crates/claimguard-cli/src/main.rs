//! ClaimGuard CLI
//!
//! Command-line front end for the output-compliance pipeline: validate
//! text against a channel, inspect statistics and pending actions, and
//! run connection probes.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

use claimguard_core::{output_source, ConfirmationMethod, ConfirmationStatus, OutputChannel, OutputContext};
use claimguard_gate::{ComplianceGate, GateConfig};
use claimguard_probe::{ConnectionValidator, ProbeConfig};

#[derive(Parser, Debug)]
#[command(name = "claimguard")]
#[command(about = "Output-compliance gatekeeper for unverified action claims", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "claimguard.yaml")]
    config: String,

    /// Data directory override
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate text against a channel and print the decision
    Check {
        /// Text to validate; read from stdin when omitted
        text: Option<String>,

        /// Channel the text is destined for
        #[arg(short = 'C', long, default_value = "api_response")]
        channel: String,

        /// Treat the claims as confirmed via this method
        #[arg(long)]
        confirmed_via: Option<String>,
    },

    /// Print compliance statistics
    Stats,

    /// Inspect or confirm pending actions
    Pending {
        #[command(subcommand)]
        action: PendingCommand,
    },

    /// Run a connection validation probe
    Probe {
        /// Action type selecting the endpoint set
        #[arg(default_value = "general")]
        action_type: String,

        /// Base URL of the backend to probe
        #[arg(long, default_value = "http://127.0.0.1:80")]
        base_url: String,

        /// Bypass any cached validation
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum PendingCommand {
    /// List pending actions
    List,

    /// Confirm a pending action
    Clear {
        /// Id of the action to confirm
        id: String,

        /// Confirmation method
        #[arg(long, default_value = "human_confirmation")]
        method: String,

        /// Who confirmed it
        #[arg(long, default_value = "operator")]
        operator: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let mut config = if Path::new(&cli.config).exists() {
        GateConfig::load(Path::new(&cli.config))?
    } else {
        GateConfig::persistent("./claimguard_data")
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = Some(data_dir);
    }

    match cli.command {
        Command::Check {
            text,
            channel,
            confirmed_via,
        } => {
            let gate = ComplianceGate::new(config)?;
            let content = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("could not read stdin")?;
                    buf
                }
            };

            let channel: OutputChannel = channel.parse()?;
            let mut context = OutputContext::new(channel, output_source!("claimguard-cli"));
            if let Some(method) = confirmed_via {
                let method: ConfirmationMethod = method.parse()?;
                context = context.with_confirmation(ConfirmationStatus::confirmed(method));
            }

            let result = gate.validate(&content, &context);
            println!("{}", serde_json::to_string_pretty(&result)?);

            if result.blocked {
                std::process::exit(1);
            }
        }

        Command::Stats => {
            let gate = ComplianceGate::new(config)?;
            println!("{}", serde_json::to_string_pretty(&gate.stats())?);
        }

        Command::Pending { action } => {
            let gate = ComplianceGate::new(config)?;
            match action {
                PendingCommand::List => {
                    println!("{}", serde_json::to_string_pretty(&gate.pending_actions())?);
                }
                PendingCommand::Clear {
                    id,
                    method,
                    operator,
                } => {
                    let method: ConfirmationMethod = method.parse()?;
                    let outcome = gate.clear_pending(&id, method, &operator)?;
                    info!(id = %id, outcome = ?outcome, "pending action cleared");
                    println!("{id}: {outcome:?}");
                }
            }
        }

        Command::Probe {
            action_type,
            base_url,
            force,
        } => {
            let validator = ConnectionValidator::new(ProbeConfig {
                base_url,
                data_dir: config.data_dir,
                ..ProbeConfig::default()
            })?;

            let result = if force {
                validator.force_fresh_validation(&action_type, None).await
            } else {
                validator.validate_fresh_connection(&action_type, None).await
            };
            println!("{}", serde_json::to_string_pretty(&result)?);

            if !result.validation_passed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Initialize tracing with an env-filter; `-v` lowers the floor to debug
fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}
