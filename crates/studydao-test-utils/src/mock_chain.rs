// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory chain that answers JSON-RPC like a node with the StudyDAO
//! contracts deployed.
//!
//! `MockChain` implements `ChainTransport`, so the real ledger code runs
//! against it unchanged: calldata is ABI-decoded by selector, state changes
//! are applied on `eth_sendTransaction`, and receipts are served from
//! `eth_getTransactionReceipt`. Failures (unreadable registry slots,
//! reverting writes, unknown chains) are injected per test.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use studydao_chain::abi::{self, ParamType, Token};
use studydao_chain::contracts;
use studydao_core::{
    Adapter, AdapterType, Address, ChainTransport, HealthStatus, RpcError, StudyDaoError, Wei,
};

/// A member entry of a mock study group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockMember {
    pub staked: Wei,
    pub joined_at: u64,
    pub has_withdrawn: bool,
    pub study_hours: u64,
    pub completed_sessions: u64,
}

/// A session stored by a mock study group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockSession {
    pub member: Address,
    pub start_time: u64,
    pub duration: u64,
    pub submission_hash: String,
    pub verified: bool,
    pub rewarded: bool,
    pub timestamp: u64,
    pub ai_analysis: String,
}

/// A deployed mock study group contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockGroup {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub stake: Wei,
    pub max_members: u64,
    pub deadline_secs: u64,
    pub creator: Address,
    pub active: bool,
    pub created_at: u64,
    pub members: BTreeMap<Address, MockMember>,
    pub sessions: Vec<MockSession>,
}

impl MockGroup {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            description: format!("{title} description"),
            subject: "Blockchain".to_string(),
            stake: 10 * 10u128.pow(18),
            max_members: 10,
            deadline_secs: 1_800_000_000,
            creator: Address([0xc0; 20]),
            active: true,
            created_at: 1_700_000_000,
            members: BTreeMap::new(),
            sessions: Vec::new(),
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn with_member(mut self, account: Address, member: MockMember) -> Self {
        self.members.insert(account, member);
        self
    }
}

#[derive(Debug, Default)]
struct ChainState {
    chain_id: u64,
    accounts: Vec<Address>,
    token: Option<Address>,
    factory: Option<Address>,
    balances: HashMap<Address, Wei>,
    registry: Vec<Address>,
    groups: HashMap<Address, MockGroup>,
    failing_slots: HashSet<u64>,
    revert_reason: Option<String>,
    reject_code: Option<i64>,
    known_chains: HashSet<u64>,
    receipt_delay: u32,
    receipts: HashMap<String, (Value, u32)>,
    sent: Vec<(Address, [u8; 4])>,
    methods: Vec<String>,
    nonce: u64,
}

/// In-memory node and wallet for ledger tests.
#[derive(Debug)]
pub struct MockChain {
    state: Mutex<ChainState>,
}

fn remote(code: i64, message: impl Into<String>) -> RpcError {
    RpcError::Remote {
        code,
        message: message.into(),
        data: None,
    }
}

fn reverted(reason: &str) -> RpcError {
    RpcError::Remote {
        code: 3,
        message: format!("execution reverted: {reason}"),
        data: Some(json!(abi::to_hex(&abi::encode_revert_reason(reason)))),
    }
}

fn field<'a>(params: &'a Value, name: &str) -> Option<&'a str> {
    params.get(0)?.get(name)?.as_str()
}

fn address_field(params: &Value, name: &str) -> Result<Address, RpcError> {
    field(params, name)
        .ok_or_else(|| remote(-32602, format!("missing {name}")))?
        .parse()
        .map_err(|e: StudyDaoError| remote(-32602, e.to_string()))
}

fn split_calldata(params: &Value) -> Result<([u8; 4], Vec<u8>), RpcError> {
    let data = field(params, "data").ok_or_else(|| remote(-32602, "missing data"))?;
    let bytes = abi::from_hex(data).map_err(|e| remote(-32602, e.to_string()))?;
    if bytes.len() < 4 {
        return Err(remote(-32602, "calldata shorter than a selector"));
    }
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&bytes[..4]);
    Ok((sel, bytes[4..].to_vec()))
}

fn bad_args(e: abi::AbiError) -> RpcError {
    remote(-32602, format!("bad calldata: {e}"))
}

fn is(sel: [u8; 4], signature: &str) -> bool {
    sel == abi::selector(signature)
}

impl MockChain {
    /// A chain with id `chain_id` and no contracts.
    pub fn new(chain_id: u64) -> Self {
        let mut state = ChainState {
            chain_id,
            ..ChainState::default()
        };
        state.known_chains.insert(chain_id);
        Self {
            state: Mutex::new(state),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ChainState) -> R) -> R {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.with_state(|s| s.accounts = accounts);
    }

    pub fn set_token(&self, token: Address) {
        self.with_state(|s| s.token = Some(token));
    }

    pub fn set_balance(&self, account: Address, wei: Wei) {
        self.with_state(|s| {
            s.balances.insert(account, wei);
        });
    }

    pub fn set_factory(&self, factory: Address) {
        self.with_state(|s| s.factory = Some(factory));
    }

    /// Deploys `group` at `address` and appends it to the registry.
    pub fn add_group(&self, address: Address, group: MockGroup) {
        self.with_state(|s| {
            s.registry.push(address);
            s.groups.insert(address, group);
        });
    }

    /// Deploys `group` at `address` without registering it.
    pub fn deploy_group(&self, address: Address, group: MockGroup) {
        self.with_state(|s| {
            s.groups.insert(address, group);
        });
    }

    pub fn set_member(&self, group: Address, account: Address, member: MockMember) {
        self.with_state(|s| {
            if let Some(g) = s.groups.get_mut(&group) {
                g.members.insert(account, member);
            }
        });
    }

    pub fn add_session(&self, group: Address, session: MockSession) {
        self.with_state(|s| {
            if let Some(g) = s.groups.get_mut(&group) {
                g.sessions.push(session);
            }
        });
    }

    /// Makes `groups(index)` revert.
    pub fn fail_group_slot(&self, index: u64) {
        self.with_state(|s| {
            s.failing_slots.insert(index);
        });
    }

    /// Every subsequent transaction is mined with status `0x0` and reverts
    /// with `reason` when replayed.
    pub fn revert_writes(&self, reason: &str) {
        self.with_state(|s| s.revert_reason = Some(reason.to_string()));
    }

    /// Every subsequent `eth_sendTransaction` is refused with `code`.
    pub fn reject_writes(&self, code: i64) {
        self.with_state(|s| s.reject_code = Some(code));
    }

    /// Moves the wallet to `chain_id` and forgets every other chain, so
    /// switching back answers 4902 until the chain is added.
    pub fn move_wallet_to(&self, chain_id: u64) {
        self.with_state(|s| {
            s.chain_id = chain_id;
            s.known_chains = HashSet::from([chain_id]);
        });
    }

    /// Receipts become visible after this many polls.
    pub fn set_receipt_delay(&self, polls: u32) {
        self.with_state(|s| s.receipt_delay = polls);
    }

    pub fn group(&self, address: Address) -> Option<MockGroup> {
        self.with_state(|s| s.groups.get(&address).cloned())
    }

    pub fn registry(&self) -> Vec<Address> {
        self.with_state(|s| s.registry.clone())
    }

    /// `(to, selector)` of every transaction sent so far.
    pub fn sent_transactions(&self) -> Vec<(Address, [u8; 4])> {
        self.with_state(|s| s.sent.clone())
    }

    /// How many times `method` was requested.
    pub fn request_count(&self, method: &str) -> usize {
        self.with_state(|s| s.methods.iter().filter(|m| *m == method).count())
    }
}

impl ChainState {
    fn group(&self, to: Address) -> Result<&MockGroup, RpcError> {
        self.groups
            .get(&to)
            .ok_or_else(|| remote(-32000, format!("no contract at {to}")))
    }

    fn group_mut(&mut self, to: Address) -> Result<&mut MockGroup, RpcError> {
        self.groups
            .get_mut(&to)
            .ok_or_else(|| remote(-32000, format!("no contract at {to}")))
    }

    fn call(&self, to: Address, sel: [u8; 4], args: &[u8]) -> Result<Vec<u8>, RpcError> {
        if Some(to) == self.token {
            if is(sel, contracts::BALANCE_OF) {
                let [who] = abi::decode_exact(&[ParamType::Address], args).map_err(bad_args)?;
                let who = who.into_address().map_err(bad_args)?;
                let balance = self.balances.get(&who).copied().unwrap_or(0);
                return Ok(abi::encode(&[Token::Uint(balance)]));
            }
            return Err(reverted("unknown token function"));
        }

        if Some(to) == self.factory {
            if is(sel, contracts::GROUP_COUNT) {
                return Ok(abi::encode(&[Token::Uint(self.registry.len() as u128)]));
            }
            if is(sel, contracts::GROUPS) {
                let [index] = abi::decode_exact(&[ParamType::Uint], args).map_err(bad_args)?;
                let index = index.into_uint().map_err(bad_args)? as u64;
                if self.failing_slots.contains(&index) {
                    return Err(reverted("slot unavailable"));
                }
                let address = self
                    .registry
                    .get(index as usize)
                    .copied()
                    .ok_or_else(|| reverted("index out of bounds"))?;
                let g = self.group(address)?;
                return Ok(abi::encode(&[
                    Token::Address(address),
                    Token::String(g.title.clone()),
                    Token::Address(g.creator),
                    Token::Uint(u128::from(g.created_at)),
                    Token::Bool(g.active),
                ]));
            }
            return Err(reverted("unknown factory function"));
        }

        let g = self.group(to)?;
        if is(sel, contracts::GET_GROUP_INFO) {
            return Ok(abi::encode(&[Token::Tuple(vec![
                Token::String(g.title.clone()),
                Token::String(g.description.clone()),
                Token::String(g.subject.clone()),
                Token::Uint(g.stake),
                Token::Uint(u128::from(g.max_members)),
                Token::Uint(u128::from(g.deadline_secs)),
                Token::Address(g.creator),
                Token::Bool(g.active),
            ])]));
        }
        if is(sel, contracts::MEMBERS) {
            let [who] = abi::decode_exact(&[ParamType::Address], args).map_err(bad_args)?;
            let who = who.into_address().map_err(bad_args)?;
            let m = g.members.get(&who).cloned().unwrap_or_default();
            let member_address = if m.joined_at > 0 { who } else { Address::ZERO };
            return Ok(abi::encode(&[
                Token::Address(member_address),
                Token::Uint(m.staked),
                Token::Uint(u128::from(m.joined_at)),
                Token::Bool(m.has_withdrawn),
                Token::Uint(u128::from(m.study_hours)),
                Token::Uint(u128::from(m.completed_sessions)),
            ]));
        }
        if is(sel, contracts::GET_MEMBER_COUNT) {
            let count = g.members.values().filter(|m| m.staked > 0).count();
            return Ok(abi::encode(&[Token::Uint(count as u128)]));
        }
        if is(sel, contracts::SESSION_COUNT) {
            return Ok(abi::encode(&[Token::Uint(g.sessions.len() as u128)]));
        }
        if is(sel, contracts::SESSIONS) {
            let [index] = abi::decode_exact(&[ParamType::Uint], args).map_err(bad_args)?;
            let index = index.into_uint().map_err(bad_args)? as usize;
            let s = g.sessions.get(index).ok_or_else(|| reverted("no such session"))?;
            return Ok(abi::encode(&[
                Token::Address(s.member),
                Token::Uint(u128::from(s.start_time)),
                Token::Uint(u128::from(s.duration)),
                Token::String(s.submission_hash.clone()),
                Token::Bool(s.verified),
                Token::Bool(s.rewarded),
                Token::Uint(u128::from(s.timestamp)),
                Token::String(s.ai_analysis.clone()),
            ]));
        }
        Err(reverted("unknown group function"))
    }

    /// Applies a transaction and returns the logs it emits.
    fn execute(
        &mut self,
        from: Address,
        to: Address,
        sel: [u8; 4],
        args: &[u8],
    ) -> Result<Vec<Value>, RpcError> {
        if Some(to) == self.token && is(sel, contracts::APPROVE) {
            return Ok(Vec::new());
        }

        if Some(to) == self.factory && is(sel, contracts::CREATE_GROUP) {
            let [title, description, subject, stake, max_members, days] = abi::decode_exact(
                &[
                    ParamType::String,
                    ParamType::String,
                    ParamType::String,
                    ParamType::Uint,
                    ParamType::Uint,
                    ParamType::Uint,
                ],
                args,
            )
            .map_err(bad_args)?;
            let title = title.into_string().map_err(bad_args)?;
            let mut group = MockGroup::new(&title);
            group.description = description.into_string().map_err(bad_args)?;
            group.subject = subject.into_string().map_err(bad_args)?;
            group.stake = stake.into_uint().map_err(bad_args)?;
            group.max_members = max_members.into_uint().map_err(bad_args)? as u64;
            group.deadline_secs = group.created_at + days.into_uint().map_err(bad_args)? as u64 * 86_400;
            group.creator = from;

            let digest = abi::keccak256(format!("group-{}", self.registry.len()));
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&digest[12..]);
            let address = Address(bytes);
            self.registry.push(address);
            self.groups.insert(address, group);

            let mut topic = [0u8; 32];
            topic[12..].copy_from_slice(&address.0);
            return Ok(vec![json!({
                "address": to.to_string(),
                "topics": [
                    abi::to_hex(&abi::keccak256("GroupCreated(address,address,string)")),
                    abi::to_hex(&topic),
                ],
                "data": "0x",
            })]);
        }

        let group = self.group_mut(to)?;
        if is(sel, contracts::JOIN_GROUP) {
            let stake = group.stake;
            let member = group.members.entry(from).or_default();
            member.staked = stake;
            member.joined_at = 1_700_000_100;
            return Ok(Vec::new());
        }
        if is(sel, contracts::CLAIM_REWARDS) {
            return Ok(Vec::new());
        }
        if is(sel, contracts::SUBMIT_STUDY_SESSION) {
            let [auth] =
                abi::decode_exact(&[contracts::auth_data_type()], args).map_err(bad_args)?;
            let fields = auth.into_tuple().map_err(bad_args)?;
            let result = fields
                .get(4)
                .cloned()
                .ok_or_else(|| remote(-32602, "authData without result"))?
                .into_bytes()
                .map_err(bad_args)?;
            let [duration, fingerprint, analysis] = abi::decode_exact(
                &[ParamType::Uint, ParamType::String, ParamType::String],
                &result,
            )
            .map_err(bad_args)?;
            group.sessions.push(MockSession {
                member: from,
                start_time: 1_700_000_200,
                duration: duration.into_uint().map_err(bad_args)? as u64,
                submission_hash: fingerprint.into_string().map_err(bad_args)?,
                verified: false,
                rewarded: false,
                timestamp: 1_700_000_200,
                ai_analysis: analysis.into_string().map_err(bad_args)?,
            });
            return Ok(Vec::new());
        }
        if is(sel, contracts::VERIFY_SESSION) {
            let [index, approved, _auth] = abi::decode_exact(
                &[ParamType::Uint, ParamType::Bool, contracts::auth_data_type()],
                args,
            )
            .map_err(bad_args)?;
            let index = index.into_uint().map_err(bad_args)? as usize;
            let approved = approved.into_bool().map_err(bad_args)?;
            let session = group
                .sessions
                .get_mut(index)
                .ok_or_else(|| reverted("no such session"))?;
            session.verified = approved;
            return Ok(Vec::new());
        }
        Err(reverted("unknown function"))
    }

    fn send(&mut self, params: &Value) -> Result<Value, RpcError> {
        if let Some(code) = self.reject_code {
            return Err(remote(code, "User denied transaction signature."));
        }
        let from = address_field(params, "from")?;
        if !self.accounts.contains(&from) {
            return Err(remote(4100, format!("account {from} not authorized")));
        }
        let to = address_field(params, "to")?;
        let (sel, args) = split_calldata(params)?;
        self.sent.push((to, sel));
        self.nonce += 1;
        let hash = abi::to_hex(&abi::keccak256(format!("tx-{}", self.nonce)));

        let (status, logs) = if self.revert_reason.is_some() {
            ("0x0", Vec::new())
        } else {
            ("0x1", self.execute(from, to, sel, &args)?)
        };
        let receipt = json!({
            "transactionHash": hash,
            "blockNumber": format!("0x{:x}", 100 + self.nonce),
            "status": status,
            "logs": logs,
        });
        self.receipts
            .insert(hash.clone(), (receipt, self.receipt_delay));
        Ok(json!(hash))
    }

    fn receipt(&mut self, params: &Value) -> Value {
        let Some(hash) = params.get(0).and_then(Value::as_str) else {
            return Value::Null;
        };
        match self.receipts.get_mut(hash) {
            Some((_, remaining)) if *remaining > 0 => {
                *remaining -= 1;
                Value::Null
            }
            Some((receipt, _)) => receipt.clone(),
            None => Value::Null,
        }
    }

    fn handle(&mut self, method: &str, params: &Value) -> Result<Value, RpcError> {
        self.methods.push(method.to_string());
        match method {
            "eth_chainId" => Ok(json!(format!("0x{:x}", self.chain_id))),
            "eth_accounts" | "eth_requestAccounts" => Ok(json!(self
                .accounts
                .iter()
                .map(Address::to_string)
                .collect::<Vec<_>>())),
            "eth_call" => {
                let to = address_field(params, "to")?;
                if field(params, "from").is_some() {
                    if let Some(reason) = &self.revert_reason {
                        return Err(reverted(reason));
                    }
                }
                let (sel, args) = split_calldata(params)?;
                self.call(to, sel, &args).map(|data| json!(abi::to_hex(&data)))
            }
            "eth_sendTransaction" => self.send(params),
            "eth_getTransactionReceipt" => Ok(self.receipt(params)),
            "wallet_switchEthereumChain" => {
                let target = field(params, "chainId")
                    .and_then(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16).ok())
                    .ok_or_else(|| remote(-32602, "missing chainId"))?;
                if !self.known_chains.contains(&target) {
                    return Err(remote(4902, "Unrecognized chain ID"));
                }
                self.chain_id = target;
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                let target = field(params, "chainId")
                    .and_then(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16).ok())
                    .ok_or_else(|| remote(-32602, "missing chainId"))?;
                self.known_chains.insert(target);
                self.chain_id = target;
                Ok(Value::Null)
            }
            other => Err(remote(-32601, format!("method {other} not found"))),
        }
    }
}

#[async_trait]
impl Adapter for MockChain {
    fn name(&self) -> &str {
        "mock-chain"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ChainTransport
    }

    async fn health_check(&self) -> Result<HealthStatus, StudyDaoError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ChainTransport for MockChain {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.with_state(|s| s.handle(method, &params))
    }
}
