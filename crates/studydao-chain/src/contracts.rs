// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call surface of the token, registry and study group contracts.

use studydao_config::model::ContractsConfig;
use studydao_core::{Address, StudyDaoError};

use crate::abi::{self, ParamType, Token};

// Token contract.
pub const BALANCE_OF: &str = "balanceOf(address)";
pub const APPROVE: &str = "approve(address,uint256)";

// Registry (factory) contract.
pub const GROUP_COUNT: &str = "groupCount()";
pub const GROUPS: &str = "groups(uint256)";
pub const CREATE_GROUP: &str = "createGroup(string,string,string,uint256,uint256,uint256)";

// Study group contract.
pub const GET_GROUP_INFO: &str = "getGroupInfo()";
pub const MEMBERS: &str = "members(address)";
pub const GET_MEMBER_COUNT: &str = "getMemberCount()";
pub const JOIN_GROUP: &str = "joinGroup()";
pub const CLAIM_REWARDS: &str = "claimRewards()";
pub const SESSION_COUNT: &str = "sessionCount()";
pub const SESSIONS: &str = "sessions(uint256)";
pub const SUBMIT_STUDY_SESSION: &str =
    "submitStudySession((uint256,uint256,bytes32,(bytes32,bytes,bytes)[],bytes,bool,bytes))";
pub const VERIFY_SESSION: &str =
    "verifySession(uint256,bool,(uint256,uint256,bytes32,(bytes32,bytes,bytes)[],bytes,bool,bytes))";

/// Seconds an authorization payload stays valid.
pub const AUTH_VALIDITY_SECS: u64 = 3600;

/// Attestation tag for AI-verified session submissions.
pub const AI_VERIFICATION_TAG: &str = "ai-verification";

/// Attestation tag for operator approvals.
pub const AUTO_APPROVE_TAG: &str = "auto-approve";

/// Return layout of `groups(uint256)`.
pub fn group_slot_types() -> [ParamType; 5] {
    [
        ParamType::Address,
        ParamType::String,
        ParamType::Address,
        ParamType::Uint,
        ParamType::Bool,
    ]
}

/// Return layout of `getGroupInfo()`: a single tuple.
pub fn group_info_types() -> [ParamType; 1] {
    [ParamType::Tuple(vec![
        ParamType::String,
        ParamType::String,
        ParamType::String,
        ParamType::Uint,
        ParamType::Uint,
        ParamType::Uint,
        ParamType::Address,
        ParamType::Bool,
    ])]
}

/// Return layout of `members(address)`.
pub fn member_types() -> [ParamType; 6] {
    [
        ParamType::Address,
        ParamType::Uint,
        ParamType::Uint,
        ParamType::Bool,
        ParamType::Uint,
        ParamType::Uint,
    ]
}

/// Return layout of `sessions(uint256)`.
pub fn session_types() -> [ParamType; 8] {
    [
        ParamType::Address,
        ParamType::Uint,
        ParamType::Uint,
        ParamType::String,
        ParamType::Bool,
        ParamType::Bool,
        ParamType::Uint,
        ParamType::String,
    ]
}

/// Parameter layout of the `authData` tuple.
pub fn auth_data_type() -> ParamType {
    ParamType::Tuple(vec![
        ParamType::Uint,
        ParamType::Uint,
        ParamType::FixedBytes32,
        ParamType::Array(Box::new(ParamType::Tuple(vec![
            ParamType::FixedBytes32,
            ParamType::Bytes,
            ParamType::Bytes,
        ]))),
        ParamType::Bytes,
        ParamType::Bool,
        ParamType::Bytes,
    ])
}

/// Configured contract addresses, parsed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub token: Option<Address>,
    pub study_group: Option<Address>,
    pub factory: Option<Address>,
}

impl ContractAddresses {
    pub fn from_config(config: &ContractsConfig) -> Result<Self, StudyDaoError> {
        fn parse(value: &Option<String>) -> Result<Option<Address>, StudyDaoError> {
            value.as_deref().map(str::parse).transpose()
        }
        Ok(Self {
            token: parse(&config.token_address)?,
            study_group: parse(&config.study_group_address)?,
            factory: parse(&config.factory_address)?,
        })
    }

    pub fn token(&self) -> Result<Address, StudyDaoError> {
        self.token
            .ok_or_else(|| StudyDaoError::Config("contracts.token_address is not set".into()))
    }

    /// The explicit group, or the configured default study group.
    pub fn group_or_default(&self, group: Option<Address>) -> Result<Address, StudyDaoError> {
        group.or(self.study_group).ok_or_else(|| {
            StudyDaoError::Config(
                "no study group given and contracts.study_group_address is not set".into(),
            )
        })
    }
}

/// One attestation entry inside `authData`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    pub hash: [u8; 32],
    pub signature: Vec<u8>,
    pub metadata: Vec<u8>,
}

/// Authorization payload accepted by `submitStudySession` and `verifySession`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthData {
    pub nonce: u128,
    pub expiry: u128,
    pub context_hash: [u8; 32],
    pub attestations: Vec<Attestation>,
    pub result: Vec<u8>,
    pub require_user_signature: bool,
    pub user_signature: Vec<u8>,
}

impl AuthData {
    /// Payload with a single attestation tagged `tag`, issued at `now_millis`.
    pub fn attested(tag: &str, signature: Vec<u8>, result: Vec<u8>, now_millis: u64) -> Self {
        let now_secs = now_millis / 1000;
        Self {
            nonce: u128::from(now_millis),
            expiry: u128::from(now_secs + AUTH_VALIDITY_SECS),
            context_hash: [0u8; 32],
            attestations: vec![Attestation {
                hash: abi::keccak256(tag),
                signature,
                metadata: Vec::new(),
            }],
            result,
            require_user_signature: false,
            user_signature: Vec::new(),
        }
    }

    /// The payload attached to an AI-scored session submission.
    pub fn for_submission(duration: u64, fingerprint: &str, analysis: &str, now_millis: u64) -> Self {
        let result = abi::encode(&[
            Token::Uint(u128::from(duration)),
            Token::String(fingerprint.to_string()),
            Token::String(analysis.to_string()),
        ]);
        Self::attested(AI_VERIFICATION_TAG, vec![0x12; 65], result, now_millis)
    }

    /// The payload attached to an operator approval.
    pub fn for_approval(now_millis: u64) -> Self {
        Self::attested(AUTO_APPROVE_TAG, vec![0x00; 65], Vec::new(), now_millis)
    }

    pub fn into_token(self) -> Token {
        Token::Tuple(vec![
            Token::Uint(self.nonce),
            Token::Uint(self.expiry),
            Token::FixedBytes32(self.context_hash),
            Token::Array(
                self.attestations
                    .into_iter()
                    .map(|a| {
                        Token::Tuple(vec![
                            Token::FixedBytes32(a.hash),
                            Token::Bytes(a.signature),
                            Token::Bytes(a.metadata),
                        ])
                    })
                    .collect(),
            ),
            Token::Bytes(self.result),
            Token::Bool(self.require_user_signature),
            Token::Bytes(self.user_signature),
        ])
    }
}
