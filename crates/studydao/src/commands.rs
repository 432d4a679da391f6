// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ledger, scoring and submission command handlers.

use std::path::PathBuf;

use serde::Serialize;
use studydao_chain::NewGroup;
use studydao_core::{Address, QualityAssessor, StudyDaoError};
use studydao_scoring::QualityScorer;
use studydao_workflow::SubmissionRequest;
use tracing::info;

use crate::context::AppContext;

/// Study notes given inline or as a file.
#[derive(Debug, Clone, clap::Args)]
#[group(required = true, multiple = false)]
pub struct NotesInput {
    /// Notes text.
    #[arg(long)]
    pub notes: Option<String>,
    /// Read notes from a file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

impl NotesInput {
    pub fn read(&self) -> Result<String, StudyDaoError> {
        match (&self.notes, &self.file) {
            (Some(notes), _) => Ok(notes.clone()),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                StudyDaoError::Validation(format!("cannot read {}: {e}", path.display()))
            }),
            (None, None) => Err(StudyDaoError::Validation("no notes given".into())),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), StudyDaoError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| StudyDaoError::Internal(format!("failed to render output: {e}")))?;
    println!("{text}");
    Ok(())
}

pub async fn balance(ctx: &AppContext, account: Option<Address>) -> Result<(), StudyDaoError> {
    let account = ctx.account_or(account)?;
    let balance = ctx.ledger.token_balance(&ctx.read_only(), account).await?;
    println!("{balance}");
    Ok(())
}

pub async fn groups(ctx: &AppContext) -> Result<(), StudyDaoError> {
    let groups = ctx.ledger.all_groups(&ctx.read_only()).await?;
    print_json(&groups)
}

pub async fn group(ctx: &AppContext, group: Option<Address>) -> Result<(), StudyDaoError> {
    let conn = ctx.read_only();
    let details = ctx.ledger.group_info(&conn, group).await?;
    let members = ctx.ledger.member_count(&conn, group).await?;
    print_json(&serde_json::json!({ "group": details, "memberCount": members }))
}

pub async fn member(
    ctx: &AppContext,
    account: Option<Address>,
    group: Option<Address>,
) -> Result<(), StudyDaoError> {
    let account = ctx.account_or(account)?;
    let info = ctx
        .ledger
        .member_info(&ctx.read_only(), account, group)
        .await?;
    print_json(&info)
}

pub async fn portfolio(ctx: &AppContext, account: Option<Address>) -> Result<(), StudyDaoError> {
    let account = ctx.account_or(account)?;
    let portfolio = ctx
        .ledger
        .member_portfolio(&ctx.read_only(), account)
        .await?;
    print_json(&portfolio)
}

pub async fn sessions(ctx: &AppContext, group: Option<Address>) -> Result<(), StudyDaoError> {
    let conn = ctx.read_only();
    let count = ctx.ledger.session_count(&conn, group).await?;
    let mut sessions = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
    for index in 0..count {
        sessions.push(ctx.ledger.session(&conn, group, index).await?);
    }
    print_json(&sessions)
}

pub async fn approve(
    ctx: &AppContext,
    amount: &str,
    spender: Option<Address>,
) -> Result<(), StudyDaoError> {
    let conn = ctx.signed().await?;
    let tx = ctx.ledger.approve_tokens(&conn, amount, spender).await?;
    println!("{tx}");
    Ok(())
}

pub async fn join(ctx: &AppContext, group: Option<Address>) -> Result<(), StudyDaoError> {
    let conn = ctx.signed().await?;
    let tx = ctx.ledger.join_study_group(&conn, group).await?;
    println!("{tx}");
    Ok(())
}

pub async fn claim(ctx: &AppContext, group: Option<Address>) -> Result<(), StudyDaoError> {
    let conn = ctx.signed().await?;
    let tx = ctx.ledger.claim_rewards(&conn, group).await?;
    println!("{tx}");
    Ok(())
}

pub async fn create_group(ctx: &AppContext, group: &NewGroup) -> Result<(), StudyDaoError> {
    let conn = ctx.signed().await?;
    let created = ctx.ledger.create_group(&conn, group).await?;
    print_json(&created)
}

pub async fn approve_sessions(
    ctx: &AppContext,
    group: Option<Address>,
) -> Result<(), StudyDaoError> {
    let conn = ctx.signed().await?;
    let approved = ctx.ledger.approve_pending_sessions(&conn, group).await?;
    info!(count = approved.len(), "pending sessions approved");
    for (index, tx) in approved {
        println!("{index}\t{tx}");
    }
    Ok(())
}

pub async fn submit(
    ctx: &AppContext,
    notes: &NotesInput,
    duration_minutes: u64,
    group: Option<Address>,
    offchain: bool,
) -> Result<(), StudyDaoError> {
    let conn = if offchain {
        ctx.read_only()
    } else {
        ctx.signed().await?
    };
    let author = match ctx.account_or(None) {
        Ok(account) => account.to_string(),
        Err(_) => "anonymous".to_string(),
    };
    let request = SubmissionRequest {
        author,
        group,
        notes: notes.read()?,
        duration_minutes,
    };
    let result = ctx.workflow().await?.execute(&request, &conn).await?;
    print_json(&result)
}

pub async fn assess(ctx: &AppContext, notes: &NotesInput) -> Result<(), StudyDaoError> {
    let scorer = QualityScorer::from_config(&ctx.config.scoring)?;
    let assessment = scorer.assess(&notes.read()?).await;
    print_json(&assessment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_notes_win() {
        let input = NotesInput {
            notes: Some("solidity gas".into()),
            file: None,
        };
        assert_eq!(input.read().unwrap(), "solidity gas");
    }

    #[test]
    fn unreadable_file_is_a_validation_error() {
        let input = NotesInput {
            notes: None,
            file: Some(PathBuf::from("/nonexistent/studydao/notes.md")),
        };
        assert!(matches!(input.read(), Err(StudyDaoError::Validation(_))));
    }
}
