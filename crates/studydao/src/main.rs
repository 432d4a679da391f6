// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! StudyDAO - stake into study groups and prove the work.
//!
//! This is the binary entry point for the StudyDAO client.

mod commands;
mod context;
mod doctor;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use studydao_chain::NewGroup;
use studydao_core::{Address, StudyDaoError};

use crate::commands::NotesInput;
use crate::context::AppContext;

/// StudyDAO - stake into study groups and prove the work.
#[derive(Parser, Debug)]
#[command(name = "studydao", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Token balance of an account.
    Balance {
        #[arg(long)]
        account: Option<Address>,
    },
    /// List active study groups from the registry.
    Groups,
    /// Details of one study group.
    Group {
        #[arg(long)]
        group: Option<Address>,
    },
    /// Membership standing of an account in a group.
    Member {
        #[arg(long)]
        account: Option<Address>,
        #[arg(long)]
        group: Option<Address>,
    },
    /// Balance plus every group an account belongs to.
    Portfolio {
        #[arg(long)]
        account: Option<Address>,
    },
    /// On-chain sessions of a group.
    Sessions {
        #[arg(long)]
        group: Option<Address>,
    },
    /// Allow a group to pull staking tokens.
    Approve {
        /// Decimal token amount, e.g. `10` or `2.5`.
        #[arg(long)]
        amount: String,
        #[arg(long)]
        spender: Option<Address>,
    },
    /// Join a study group by staking.
    Join {
        #[arg(long)]
        group: Option<Address>,
    },
    /// Claim rewards after the group deadline.
    Claim {
        #[arg(long)]
        group: Option<Address>,
    },
    /// Persist, score and commit a study session.
    Submit {
        #[command(flatten)]
        notes: NotesInput,
        /// Session length in minutes.
        #[arg(long)]
        duration: u64,
        #[arg(long)]
        group: Option<Address>,
        /// Skip the wallet and leave the session off-chain.
        #[arg(long)]
        offchain: bool,
    },
    /// Deploy a new study group through the registry.
    CreateGroup {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        subject: String,
        /// Stake per member as a decimal token amount.
        #[arg(long)]
        stake: String,
        #[arg(long, default_value_t = 10)]
        max_members: u64,
        #[arg(long, default_value_t = 30)]
        days: u64,
    },
    /// Approve every unverified session of a group.
    ApproveSessions {
        #[arg(long)]
        group: Option<Address>,
    },
    /// Score notes without storing or committing them.
    Assess {
        #[command(flatten)]
        notes: NotesInput,
    },
    /// Check connectivity to every configured collaborator.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => studydao_config::load_and_validate_path(path),
        None => studydao_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            studydao_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.log.level);

    let ctx = match AppContext::from_config(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("studydao: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&ctx, cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("studydao: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(ctx: &AppContext, command: Commands) -> Result<ExitCode, StudyDaoError> {
    match command {
        Commands::Balance { account } => commands::balance(ctx, account).await?,
        Commands::Groups => commands::groups(ctx).await?,
        Commands::Group { group } => commands::group(ctx, group).await?,
        Commands::Member { account, group } => commands::member(ctx, account, group).await?,
        Commands::Portfolio { account } => commands::portfolio(ctx, account).await?,
        Commands::Sessions { group } => commands::sessions(ctx, group).await?,
        Commands::Approve { amount, spender } => commands::approve(ctx, &amount, spender).await?,
        Commands::Join { group } => commands::join(ctx, group).await?,
        Commands::Claim { group } => commands::claim(ctx, group).await?,
        Commands::Submit {
            notes,
            duration,
            group,
            offchain,
        } => commands::submit(ctx, &notes, duration, group, offchain).await?,
        Commands::CreateGroup {
            title,
            description,
            subject,
            stake,
            max_members,
            days,
        } => {
            let group = NewGroup {
                title,
                description,
                subject,
                stake_amount: stake,
                max_members,
                duration_days: days,
            };
            commands::create_group(ctx, &group).await?
        }
        Commands::ApproveSessions { group } => commands::approve_sessions(ctx, group).await?,
        Commands::Assess { notes } => commands::assess(ctx, &notes).await?,
        Commands::Doctor { plain } => {
            let failures = doctor::run_doctor(ctx, plain).await?;
            if failures > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("studydao={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
