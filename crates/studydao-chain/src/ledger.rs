// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ledger access layer: domain reads and writes against the registry, study
//! group and token contracts.
//!
//! Every operation takes the [`ChainConnection`] explicitly. Reads are pure
//! request/response; writes block until the transaction has one
//! confirmation.

use studydao_core::types::{
    GroupCreation, GroupDetails, GroupSummary, LedgerCommitResult, MemberInfo, MemberPortfolio,
    Membership, SessionRecord,
};
use studydao_core::{Address, StudyDaoError, TxHash, Wei};
use tracing::{debug, info, warn};

use crate::abi::{self, AbiError, Token};
use crate::connection::{ChainConnection, TransactionReceipt};
use crate::contracts::{self, AuthData, ContractAddresses};
use crate::units;

/// Arguments of a `submitStudySession` write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSubmission {
    pub duration: u64,
    pub fingerprint: String,
    pub analysis: String,
}

/// Arguments of a `createGroup` write. `stake_amount` is a decimal token amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub stake_amount: String,
    pub max_members: u64,
    pub duration_days: u64,
}

/// Reads and writes the StudyDAO contracts.
#[derive(Debug, Clone)]
pub struct Ledger {
    addresses: ContractAddresses,
    clock: fn() -> u64,
}

fn system_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

fn decode_error(what: &str, err: AbiError) -> StudyDaoError {
    StudyDaoError::ChainRead {
        message: format!("{what}: undecodable return data"),
        source: Some(Box::new(err)),
    }
}

fn to_u64(what: &str, value: u128) -> Result<u64, StudyDaoError> {
    u64::try_from(value)
        .map_err(|_| StudyDaoError::chain_read(format!("{what}: value {value} exceeds u64")))
}

impl Ledger {
    pub fn new(addresses: ContractAddresses) -> Self {
        Self {
            addresses,
            clock: system_millis,
        }
    }

    /// Replaces the wall clock used for `authData` nonces and expiries.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn addresses(&self) -> &ContractAddresses {
        &self.addresses
    }

    async fn call(
        &self,
        conn: &ChainConnection,
        to: Address,
        signature: &str,
        args: &[Token],
    ) -> Result<Vec<u8>, StudyDaoError> {
        debug!(contract = %to, function = signature, "eth_call");
        conn.call(to, &abi::encode_call(signature, args)).await
    }

    async fn read_uint(
        &self,
        conn: &ChainConnection,
        to: Address,
        signature: &str,
        args: &[Token],
    ) -> Result<u128, StudyDaoError> {
        let data = self.call(conn, to, signature, args).await?;
        let [value] = abi::decode_exact(&[abi::ParamType::Uint], &data)
            .map_err(|e| decode_error(signature, e))?;
        value.into_uint().map_err(|e| decode_error(signature, e))
    }

    async fn send(
        &self,
        conn: &ChainConnection,
        to: Address,
        signature: &str,
        args: &[Token],
    ) -> Result<TransactionReceipt, StudyDaoError> {
        let name = signature.split('(').next().unwrap_or(signature);
        conn.send_and_confirm(to, abi::encode_call(signature, args), name)
            .await
    }

    // --- Token ---

    /// Raw token balance in wei.
    pub async fn token_balance_wei(
        &self,
        conn: &ChainConnection,
        account: Address,
    ) -> Result<Wei, StudyDaoError> {
        let token = self.addresses.token()?;
        self.read_uint(conn, token, contracts::BALANCE_OF, &[Token::Address(account)])
            .await
    }

    /// Token balance as an 18-decimal string (`"1.0"`, `"0.5"`).
    pub async fn token_balance(
        &self,
        conn: &ChainConnection,
        account: Address,
    ) -> Result<String, StudyDaoError> {
        Ok(units::format_token(self.token_balance_wei(conn, account).await?))
    }

    /// Approves `spender` (default: the configured study group) to pull
    /// `amount` tokens.
    pub async fn approve_tokens(
        &self,
        conn: &ChainConnection,
        amount: &str,
        spender: Option<Address>,
    ) -> Result<TxHash, StudyDaoError> {
        let token = self.addresses.token()?;
        let spender = self.addresses.group_or_default(spender)?;
        let wei = units::parse_token(amount)?;
        let receipt = self
            .send(
                conn,
                token,
                contracts::APPROVE,
                &[Token::Address(spender), Token::Uint(wei)],
            )
            .await?;
        Ok(receipt.transaction_hash)
    }

    // --- Registry ---

    /// Active groups of the registry. Unreadable slots are logged and
    /// skipped; an unconfigured registry yields an empty list.
    pub async fn all_groups(
        &self,
        conn: &ChainConnection,
    ) -> Result<Vec<GroupSummary>, StudyDaoError> {
        let Some(factory) = self.addresses.factory else {
            debug!("no registry address configured, no groups to list");
            return Ok(Vec::new());
        };
        let count = self.read_uint(conn, factory, contracts::GROUP_COUNT, &[]).await?;
        let count = to_u64(contracts::GROUP_COUNT, count)?;

        let mut groups = Vec::new();
        for id in 0..count {
            match self.group_slot(conn, factory, id).await {
                Ok((summary, true)) => groups.push(summary),
                Ok((summary, false)) => {
                    debug!(id, group = %summary.address, "skipping inactive group");
                }
                Err(e) => warn!(id, error = %e, "failed to read group slot, skipping"),
            }
        }
        Ok(groups)
    }

    async fn group_slot(
        &self,
        conn: &ChainConnection,
        factory: Address,
        id: u64,
    ) -> Result<(GroupSummary, bool), StudyDaoError> {
        let data = self
            .call(conn, factory, contracts::GROUPS, &[Token::Uint(u128::from(id))])
            .await?;
        let decode = |e| decode_error(contracts::GROUPS, e);
        let [address, title, creator, created_at, active] =
            abi::decode_exact(&contracts::group_slot_types(), &data).map_err(decode)?;
        let summary = GroupSummary {
            id,
            address: address.into_address().map_err(decode)?,
            title: title.into_string().map_err(decode)?,
            creator: creator.into_address().map_err(decode)?,
            created_at: to_u64("createdAt", created_at.into_uint().map_err(decode)?)?,
        };
        Ok((summary, active.into_bool().map_err(decode)?))
    }

    /// Deploys a new group through the registry.
    ///
    /// The new address comes from the first registry log whose first indexed
    /// topic holds an address. Without such a log, the newest registry slot is
    /// used when its creator is the signer.
    pub async fn create_group(
        &self,
        conn: &ChainConnection,
        group: &NewGroup,
    ) -> Result<GroupCreation, StudyDaoError> {
        if group.duration_days == 0 {
            return Err(StudyDaoError::Validation(
                "group duration must be at least one day".into(),
            ));
        }
        if group.title.trim().is_empty() {
            return Err(StudyDaoError::Validation("group title must not be empty".into()));
        }
        let factory = self.addresses.factory.ok_or_else(|| {
            StudyDaoError::Config("contracts.factory_address is not set".into())
        })?;
        let stake = units::parse_token(&group.stake_amount)?;

        let receipt = self
            .send(
                conn,
                factory,
                contracts::CREATE_GROUP,
                &[
                    Token::String(group.title.clone()),
                    Token::String(group.description.clone()),
                    Token::String(group.subject.clone()),
                    Token::Uint(stake),
                    Token::Uint(u128::from(group.max_members)),
                    Token::Uint(u128::from(group.duration_days)),
                ],
            )
            .await?;

        let mut group_address = created_group_from_logs(&receipt, factory);
        if group_address.is_none() {
            group_address = self.newest_group_of_signer(conn, factory).await;
        }
        info!(
            tx = %receipt.transaction_hash,
            group = ?group_address.map(|a| a.to_string()),
            "study group created"
        );
        Ok(GroupCreation {
            transaction_hash: receipt.transaction_hash,
            group_address,
        })
    }

    async fn newest_group_of_signer(
        &self,
        conn: &ChainConnection,
        factory: Address,
    ) -> Option<Address> {
        let signer = conn.signer()?.account();
        let count = self
            .read_uint(conn, factory, contracts::GROUP_COUNT, &[])
            .await
            .ok()?;
        let last = u64::try_from(count.checked_sub(1)?).ok()?;
        match self.group_slot(conn, factory, last).await {
            Ok((summary, _)) if summary.creator == signer => Some(summary.address),
            _ => None,
        }
    }

    // --- Study group reads ---

    pub async fn group_info(
        &self,
        conn: &ChainConnection,
        group: Option<Address>,
    ) -> Result<GroupDetails, StudyDaoError> {
        let group = self.addresses.group_or_default(group)?;
        let data = self.call(conn, group, contracts::GET_GROUP_INFO, &[]).await?;
        let decode = |e| decode_error(contracts::GET_GROUP_INFO, e);
        let [info] = abi::decode_exact(&contracts::group_info_types(), &data).map_err(decode)?;
        let fields: [Token; 8] = info
            .into_tuple()
            .map_err(decode)?
            .try_into()
            .map_err(|v: Vec<Token>| {
                decode(AbiError::Arity {
                    expected: 8,
                    actual: v.len(),
                })
            })?;
        let [title, description, subject, stake, max_members, deadline, creator, active] = fields;

        let deadline_secs = to_u64("deadline", deadline.into_uint().map_err(decode)?)?;
        Ok(GroupDetails {
            title: title.into_string().map_err(decode)?,
            description: description.into_string().map_err(decode)?,
            subject: subject.into_string().map_err(decode)?,
            stake_amount: units::format_token(stake.into_uint().map_err(decode)?),
            max_members: to_u64("maxMembers", max_members.into_uint().map_err(decode)?)?,
            deadline: deadline_secs.checked_mul(1000).ok_or_else(|| {
                StudyDaoError::chain_read(format!("deadline {deadline_secs} out of range"))
            })?,
            creator: creator.into_address().map_err(decode)?,
            is_active: active.into_bool().map_err(decode)?,
        })
    }

    /// Member standing. `is_member` is `stakedAmount > 0`; `has_joined` is
    /// `joinedAt > 0`.
    pub async fn member_info(
        &self,
        conn: &ChainConnection,
        account: Address,
        group: Option<Address>,
    ) -> Result<MemberInfo, StudyDaoError> {
        let group = self.addresses.group_or_default(group)?;
        let data = self
            .call(conn, group, contracts::MEMBERS, &[Token::Address(account)])
            .await?;
        let decode = |e| decode_error(contracts::MEMBERS, e);
        let [_, staked, joined_at, withdrawn, hours, sessions] =
            abi::decode_exact(&contracts::member_types(), &data).map_err(decode)?;

        let staked = staked.into_uint().map_err(decode)?;
        let joined_at = to_u64("joinedAt", joined_at.into_uint().map_err(decode)?)?;
        Ok(MemberInfo {
            staked_amount: units::format_token(staked),
            study_hours: to_u64("studyHours", hours.into_uint().map_err(decode)?)?,
            completed_sessions: to_u64(
                "completedSessions",
                sessions.into_uint().map_err(decode)?,
            )?,
            has_withdrawn: withdrawn.into_bool().map_err(decode)?,
            is_member: staked > 0,
            has_joined: joined_at > 0,
            joined_at,
        })
    }

    pub async fn member_count(
        &self,
        conn: &ChainConnection,
        group: Option<Address>,
    ) -> Result<u64, StudyDaoError> {
        let group = self.addresses.group_or_default(group)?;
        let count = self
            .read_uint(conn, group, contracts::GET_MEMBER_COUNT, &[])
            .await?;
        to_u64(contracts::GET_MEMBER_COUNT, count)
    }

    pub async fn session_count(
        &self,
        conn: &ChainConnection,
        group: Option<Address>,
    ) -> Result<u64, StudyDaoError> {
        let group = self.addresses.group_or_default(group)?;
        let count = self
            .read_uint(conn, group, contracts::SESSION_COUNT, &[])
            .await?;
        to_u64(contracts::SESSION_COUNT, count)
    }

    pub async fn session(
        &self,
        conn: &ChainConnection,
        group: Option<Address>,
        index: u64,
    ) -> Result<SessionRecord, StudyDaoError> {
        let group = self.addresses.group_or_default(group)?;
        let data = self
            .call(conn, group, contracts::SESSIONS, &[Token::Uint(u128::from(index))])
            .await?;
        let decode = |e| decode_error(contracts::SESSIONS, e);
        let [member, start, duration, hash, verified, rewarded, timestamp, analysis] =
            abi::decode_exact(&contracts::session_types(), &data).map_err(decode)?;
        Ok(SessionRecord {
            index,
            member: member.into_address().map_err(decode)?,
            start_time: to_u64("startTime", start.into_uint().map_err(decode)?)?,
            duration: to_u64("duration", duration.into_uint().map_err(decode)?)?,
            submission_hash: hash.into_string().map_err(decode)?,
            verified: verified.into_bool().map_err(decode)?,
            rewarded: rewarded.into_bool().map_err(decode)?,
            timestamp: to_u64("timestamp", timestamp.into_uint().map_err(decode)?)?,
            ai_analysis: analysis.into_string().map_err(decode)?,
        })
    }

    // --- Study group writes ---

    pub async fn join_study_group(
        &self,
        conn: &ChainConnection,
        group: Option<Address>,
    ) -> Result<TxHash, StudyDaoError> {
        let group = self.addresses.group_or_default(group)?;
        let receipt = self.send(conn, group, contracts::JOIN_GROUP, &[]).await?;
        Ok(receipt.transaction_hash)
    }

    pub async fn claim_rewards(
        &self,
        conn: &ChainConnection,
        group: Option<Address>,
    ) -> Result<TxHash, StudyDaoError> {
        let group = self.addresses.group_or_default(group)?;
        let receipt = self.send(conn, group, contracts::CLAIM_REWARDS, &[]).await?;
        Ok(receipt.transaction_hash)
    }

    /// Submits a scored session and reports its index.
    ///
    /// The index is `sessionCount() - 1` read after confirmation, so a
    /// concurrent submission to the same group can shift it.
    pub async fn submit_session(
        &self,
        conn: &ChainConnection,
        submission: &SessionSubmission,
        group: Option<Address>,
    ) -> Result<LedgerCommitResult, StudyDaoError> {
        let group = self.addresses.group_or_default(group)?;
        let auth = AuthData::for_submission(
            submission.duration,
            &submission.fingerprint,
            &submission.analysis,
            (self.clock)(),
        );
        let receipt = self
            .send(
                conn,
                group,
                contracts::SUBMIT_STUDY_SESSION,
                &[auth.into_token()],
            )
            .await?;

        let count = self.session_count(conn, Some(group)).await.map_err(|e| {
            StudyDaoError::ChainWrite {
                message: format!(
                    "session submitted in {} but sessionCount could not be read",
                    receipt.transaction_hash
                ),
                revert_reason: None,
                source: Some(Box::new(e)),
            }
        })?;
        let session_index = count.saturating_sub(1);
        info!(
            tx = %receipt.transaction_hash,
            group = %group,
            session_index,
            "study session committed"
        );
        Ok(LedgerCommitResult {
            transaction_hash: receipt.transaction_hash,
            session_index,
        })
    }

    pub async fn verify_session(
        &self,
        conn: &ChainConnection,
        group: Option<Address>,
        index: u64,
        approved: bool,
    ) -> Result<TxHash, StudyDaoError> {
        let group = self.addresses.group_or_default(group)?;
        let auth = AuthData::for_approval((self.clock)());
        let receipt = self
            .send(
                conn,
                group,
                contracts::VERIFY_SESSION,
                &[
                    Token::Uint(u128::from(index)),
                    Token::Bool(approved),
                    auth.into_token(),
                ],
            )
            .await?;
        Ok(receipt.transaction_hash)
    }

    /// Approves every session of the group that is not yet verified.
    pub async fn approve_pending_sessions(
        &self,
        conn: &ChainConnection,
        group: Option<Address>,
    ) -> Result<Vec<(u64, TxHash)>, StudyDaoError> {
        let group = self.addresses.group_or_default(group)?;
        let count = self.session_count(conn, Some(group)).await?;
        info!(group = %group, count, "approving pending sessions");

        let mut approved = Vec::new();
        for index in 0..count {
            let session = self.session(conn, Some(group), index).await?;
            if session.verified {
                debug!(index, "session already verified");
                continue;
            }
            let tx = self.verify_session(conn, Some(group), index, true).await?;
            info!(index, tx = %tx, "session approved");
            approved.push((index, tx));
        }
        Ok(approved)
    }

    // --- Aggregates ---

    /// Balance plus every active group where `account` is a member.
    pub async fn member_portfolio(
        &self,
        conn: &ChainConnection,
        account: Address,
    ) -> Result<MemberPortfolio, StudyDaoError> {
        let balance = self.token_balance(conn, account).await?;
        let groups = self.all_groups(conn).await?;

        let mut memberships = Vec::new();
        for group in groups {
            let reads = futures::future::try_join(
                self.member_info(conn, account, Some(group.address)),
                self.group_info(conn, Some(group.address)),
            )
            .await;
            match reads {
                Ok((member, details)) if member.is_member => memberships.push(Membership {
                    group,
                    details,
                    member,
                }),
                Ok(_) => {}
                Err(e) => warn!(group = %group.address, error = %e, "skipping unreadable group"),
            }
        }

        let total_study_hours = memberships.iter().map(|m| m.member.study_hours).sum();
        let total_sessions = memberships.iter().map(|m| m.member.completed_sessions).sum();
        Ok(MemberPortfolio {
            account,
            balance,
            memberships,
            total_study_hours,
            total_sessions,
        })
    }
}

/// Address from the first log of `emitter` whose first indexed topic is a
/// left-padded address.
pub fn created_group_from_logs(receipt: &TransactionReceipt, emitter: Address) -> Option<Address> {
    receipt
        .logs
        .iter()
        .filter(|log| log.address == emitter)
        .find_map(|log| {
            let topic = abi::from_hex(log.topics.get(1)?).ok()?;
            if topic.len() != 32 || topic[..12].iter().any(|b| *b != 0) {
                return None;
            }
            let mut addr = [0u8; 20];
            addr.copy_from_slice(&topic[12..]);
            Some(Address(addr))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ReceiptLog;

    fn receipt(logs: Vec<ReceiptLog>) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: TxHash([1u8; 32]),
            block_number: Some("0x1".into()),
            status: Some("0x1".into()),
            logs,
        }
    }

    #[test]
    fn group_address_from_indexed_topic() {
        let factory = Address([0xfa; 20]);
        let created = Address([0x42; 20]);
        let topic = format!("0x{}{}", "00".repeat(12), "42".repeat(20));
        let logs = vec![
            ReceiptLog {
                address: Address([0x01; 20]),
                topics: vec!["0x00".into(), topic.clone()],
                data: "0x".into(),
            },
            ReceiptLog {
                address: factory,
                topics: vec![abi::to_hex(&abi::keccak256("GroupCreated")), topic],
                data: "0x".into(),
            },
        ];
        assert_eq!(created_group_from_logs(&receipt(logs), factory), Some(created));
    }

    #[test]
    fn non_address_topic_is_ignored() {
        let factory = Address([0xfa; 20]);
        let logs = vec![ReceiptLog {
            address: factory,
            topics: vec!["0x00".into(), format!("0x{}", "ff".repeat(32))],
            data: "0x".into(),
        }];
        assert_eq!(created_group_from_logs(&receipt(logs), factory), None);
        assert_eq!(created_group_from_logs(&receipt(Vec::new()), factory), None);
    }

    #[test]
    fn u64_conversion_rejects_large_values() {
        assert_eq!(to_u64("x", 7).unwrap(), 7);
        assert!(to_u64("x", u128::from(u64::MAX) + 1).is_err());
    }
}
