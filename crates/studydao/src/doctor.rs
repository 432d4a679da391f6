// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `studydao doctor` command implementation.
//!
//! Probes every external collaborator through its adapter health check and
//! reports the outcome as a checklist.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use studydao_core::{Adapter, HealthStatus, StudyDaoError};
use studydao_scoring::QualityScorer;

use crate::context::AppContext;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn from_health(name: &str, health: Result<HealthStatus, StudyDaoError>, start: Instant) -> Self {
        let (status, message) = match health {
            Ok(HealthStatus::Healthy) => (CheckStatus::Pass, "ok".to_string()),
            Ok(HealthStatus::Degraded(reason)) => (CheckStatus::Warn, reason),
            Ok(HealthStatus::Unhealthy(reason)) => (CheckStatus::Fail, reason),
            Err(e) => (CheckStatus::Fail, e.to_string()),
        };
        Self {
            name: name.to_string(),
            status,
            message,
            duration: start.elapsed(),
        }
    }
}

/// Run the `studydao doctor` command.
///
/// Returns the number of failed checks.
pub async fn run_doctor(ctx: &AppContext, plain: bool) -> Result<usize, StudyDaoError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = vec![
        check_rpc(ctx).await,
        check_chain_id(ctx).await,
        check_contracts(ctx),
        check_store(ctx).await,
        check_scoring(ctx).await,
    ];

    println!();
    println!("  studydao doctor");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", render_line(result, use_color));
    }
    println!();

    let failures = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    let warnings = results
        .iter()
        .filter(|r| r.status == CheckStatus::Warn)
        .count();
    if failures + warnings == 0 {
        println!("  All checks passed.");
    } else {
        let issues = failures + warnings;
        let word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {word} found.");
    }
    println!();

    Ok(failures)
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!(
            "    {symbol} {:<20} {message} ({duration_ms}ms)",
            result.name
        )
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

async fn check_rpc(ctx: &AppContext) -> CheckResult {
    let start = Instant::now();
    let health = ctx.reader().health_check().await;
    CheckResult::from_health("RPC endpoint", health, start)
}

async fn check_chain_id(ctx: &AppContext) -> CheckResult {
    let start = Instant::now();
    let expected = ctx.config.chain.chain_id;
    let (status, message) = match ctx.read_only().chain_id().await {
        Ok(id) if id == expected => (CheckStatus::Pass, format!("{id}")),
        Ok(id) => (
            CheckStatus::Warn,
            format!("node reports {id}, expected {expected}"),
        ),
        Err(e) => (CheckStatus::Fail, e.to_string()),
    };
    CheckResult {
        name: "Chain id".to_string(),
        status,
        message,
        duration: start.elapsed(),
    }
}

fn check_contracts(ctx: &AppContext) -> CheckResult {
    let start = Instant::now();
    let addresses = ctx.ledger.addresses();
    let missing: Vec<&str> = [
        ("token", addresses.token.is_none()),
        ("study group", addresses.study_group.is_none()),
        ("factory", addresses.factory.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, missing)| missing.then_some(name))
    .collect();
    let (status, message) = if missing.is_empty() {
        (CheckStatus::Pass, "all addresses set".to_string())
    } else {
        (CheckStatus::Warn, format!("not set: {}", missing.join(", ")))
    };
    CheckResult {
        name: "Contracts".to_string(),
        status,
        message,
        duration: start.elapsed(),
    }
}

async fn check_store(ctx: &AppContext) -> CheckResult {
    let start = Instant::now();
    let health = match studydao_storage::open_store(&ctx.config.storage).await {
        Ok(store) => store.health_check().await,
        Err(e) => Err(e),
    };
    CheckResult::from_health("Session store", health, start)
}

async fn check_scoring(ctx: &AppContext) -> CheckResult {
    let start = Instant::now();
    let health = match QualityScorer::from_config(&ctx.config.scoring) {
        Ok(scorer) => scorer.health_check().await,
        Err(e) => Err(e),
    };
    CheckResult::from_health("Quality scoring", health, start)
}
