// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the ledger, storage, scoring, and workflow crates.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

use crate::error::StudyDaoError;

/// Token amount in the smallest on-chain unit (18-decimal fixed point).
///
/// Amounts above `u128::MAX` wei are rejected at decode time.
pub type Wei = u128;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator an adapter talks to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    ChainTransport,
    SessionStore,
    QualityAssessor,
}

// --- Ledger identifiers ---

/// A 20-byte account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl FromStr for Address {
    type Err = StudyDaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| StudyDaoError::Validation(format!("invalid address `{s}`: {e}")))?;
        let arr: [u8; 20] = bytes.try_into().map_err(|_| {
            StudyDaoError::Validation(format!("invalid address `{s}`: expected 20 bytes"))
        })?;
        Ok(Address(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A 32-byte transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl FromStr for TxHash {
    type Err = StudyDaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| StudyDaoError::Validation(format!("invalid tx hash `{s}`: {e}")))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            StudyDaoError::Validation(format!("invalid tx hash `{s}`: expected 32 bytes"))
        })?;
        Ok(TxHash(arr))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// --- Ledger read models ---

/// One active entry of the group registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    /// Registry slot index.
    pub id: u64,
    pub address: Address,
    pub title: String,
    pub creator: Address,
    /// Creation time, seconds since the Unix epoch.
    pub created_at: u64,
}

/// Aggregate metadata of a single study group contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetails {
    pub title: String,
    pub description: String,
    pub subject: String,
    /// Required stake, as a human-readable decimal token amount.
    pub stake_amount: String,
    pub max_members: u64,
    /// Deadline in milliseconds since the Unix epoch.
    pub deadline: u64,
    pub creator: Address,
    pub is_active: bool,
}

/// A member's standing inside one study group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub staked_amount: String,
    pub study_hours: u64,
    pub completed_sessions: u64,
    pub has_withdrawn: bool,
    /// Derived at read time: `stakedAmount > 0`.
    pub is_member: bool,
    /// Derived at read time: `joinedAt > 0`. True for members that later
    /// withdrew their whole stake.
    pub has_joined: bool,
    /// Join time, seconds since the Unix epoch (0 if never joined).
    pub joined_at: u64,
}

/// One submitted study session as stored by a group contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub index: u64,
    pub member: Address,
    pub start_time: u64,
    pub duration: u64,
    pub submission_hash: String,
    pub verified: bool,
    pub rewarded: bool,
    pub timestamp: u64,
    pub ai_analysis: String,
}

/// A group the member belongs to, with both registry and contract views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub group: GroupSummary,
    pub details: GroupDetails,
    pub member: MemberInfo,
}

/// Everything the profile view shows for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPortfolio {
    pub account: Address,
    pub balance: String,
    pub memberships: Vec<Membership>,
    pub total_study_hours: u64,
    pub total_sessions: u64,
}

/// Outcome of a confirmed `submitStudySession` write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerCommitResult {
    pub transaction_hash: TxHash,
    /// `sessionCount() - 1` read after confirmation; racy under concurrent
    /// submitters to the same group.
    pub session_index: u64,
}

/// Outcome of a confirmed `createGroup` write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCreation {
    pub transaction_hash: TxHash,
    /// Address from the `GroupCreated` log, if the receipt carried one.
    pub group_address: Option<Address>,
}

// --- Session store ---

/// A study session about to be made durable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudySession {
    pub user_id: String,
    pub group_id: String,
    pub notes: String,
    pub duration: u64,
    pub timestamp: DateTime<Utc>,
}

/// Fingerprint assigned to a submission by the session store.
///
/// This is an opaque correlation id, not a digest of the notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Fingerprint {
    /// Identifier generated by the store for the inserted record.
    Stored(String),
    /// Timestamp-derived identifier used because the insert failed.
    Synthesized(String),
}

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        match self {
            Fingerprint::Stored(s) | Fingerprint::Synthesized(s) => s,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        matches!(self, Fingerprint::Synthesized(_))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Quality assessment ---

/// Verdict label derived from the normalized score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum QualityLabel {
    #[strum(serialize = "genuine study")]
    #[serde(rename = "genuine study")]
    Genuine,
    #[strum(serialize = "low quality")]
    #[serde(rename = "low quality")]
    LowQuality,
    #[strum(serialize = "needs improvement")]
    #[serde(rename = "needs improvement")]
    NeedsImprovement,
}

/// Which scoring path produced an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssessmentSource {
    Remote { model: String },
    Heuristic,
}

/// Diagnostic fields attached to an assessment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDetails {
    pub word_count: Option<usize>,
    pub has_structure: Option<bool>,
    pub has_code: Option<bool>,
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Normalized quality verdict for one set of study notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAssessment {
    /// Confidence in `[0, 1]` that the notes reflect genuine study.
    pub score: f64,
    pub label: QualityLabel,
    pub analysis: String,
    pub details: AssessmentDetails,
    pub source: AssessmentSource,
    /// Why the remote path was not used, when it was expected to be.
    pub degraded_reason: Option<String>,
}

// --- Workflow ---

/// Stages of the submission pipeline, in execution order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Started,
    Persisted,
    Scored,
    Committed,
}

/// A stage that completed on a fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    pub stage: WorkflowStage,
    pub reason: String,
}

/// Aggregate result of one submission workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult {
    pub success: bool,
    pub submission_fingerprint: Fingerprint,
    pub quality_assessment: QualityAssessment,
    pub duration_minutes: u64,
    pub ledger_commit_result: Option<LedgerCommitResult>,
    pub user_facing_message: String,
    pub degradations: Vec<Degradation>,
}

impl WorkflowResult {
    /// True when any stage fell back instead of completing normally.
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}
