// SPDX-FileCopyrightText: 2026 StudyDAO Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Solidity ABI head/tail codec for the subset of types the contracts use.
//!
//! Integers are limited to `u128`; a `uint256` word with any of its upper
//! 16 bytes set fails to decode with [`AbiError::Overflow`].

use sha3::{Digest, Keccak256};
use studydao_core::Address;
use thiserror::Error;

const WORD: usize = 32;

/// Selector of the standard `Error(string)` revert payload.
const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Selector of the standard `Panic(uint256)` revert payload.
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AbiError {
    #[error("abi data truncated")]
    Truncated,
    #[error("abi integer does not fit in 128 bits")]
    Overflow,
    #[error("abi bool word is neither 0 nor 1")]
    InvalidBool,
    #[error("abi string is not valid UTF-8")]
    InvalidUtf8,
    #[error("expected {expected} token")]
    UnexpectedToken { expected: &'static str },
    #[error("expected {expected} values, decoded {actual}")]
    Arity { expected: usize, actual: usize },
}

/// Static description of an ABI type, used to drive decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Uint,
    Address,
    Bool,
    FixedBytes32,
    Bytes,
    String,
    Array(Box<ParamType>),
    Tuple(Vec<ParamType>),
}

impl ParamType {
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::Tuple(items) => items.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }

    fn head_size(&self) -> usize {
        match self {
            ParamType::Tuple(items) if !self.is_dynamic() => {
                items.iter().map(ParamType::head_size).sum()
            }
            _ => WORD,
        }
    }
}

/// A concrete ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Uint(u128),
    Address(Address),
    Bool(bool),
    FixedBytes32([u8; 32]),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Token>),
    Tuple(Vec<Token>),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        match self {
            Token::Bytes(_) | Token::String(_) | Token::Array(_) => true,
            Token::Tuple(items) => items.iter().any(Token::is_dynamic),
            _ => false,
        }
    }

    fn head_size(&self) -> usize {
        match self {
            Token::Tuple(items) if !self.is_dynamic() => items.iter().map(Token::head_size).sum(),
            _ => WORD,
        }
    }

    pub fn into_uint(self) -> Result<u128, AbiError> {
        match self {
            Token::Uint(v) => Ok(v),
            _ => Err(AbiError::UnexpectedToken { expected: "uint" }),
        }
    }

    pub fn into_address(self) -> Result<Address, AbiError> {
        match self {
            Token::Address(a) => Ok(a),
            _ => Err(AbiError::UnexpectedToken { expected: "address" }),
        }
    }

    pub fn into_bool(self) -> Result<bool, AbiError> {
        match self {
            Token::Bool(b) => Ok(b),
            _ => Err(AbiError::UnexpectedToken { expected: "bool" }),
        }
    }

    pub fn into_string(self) -> Result<String, AbiError> {
        match self {
            Token::String(s) => Ok(s),
            _ => Err(AbiError::UnexpectedToken { expected: "string" }),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>, AbiError> {
        match self {
            Token::Bytes(b) => Ok(b),
            _ => Err(AbiError::UnexpectedToken { expected: "bytes" }),
        }
    }

    pub fn into_tuple(self) -> Result<Vec<Token>, AbiError> {
        match self {
            Token::Tuple(items) => Ok(items),
            _ => Err(AbiError::UnexpectedToken { expected: "tuple" }),
        }
    }

    pub fn into_array(self) -> Result<Vec<Token>, AbiError> {
        match self {
            Token::Array(items) => Ok(items),
            _ => Err(AbiError::UnexpectedToken { expected: "array" }),
        }
    }
}

/// Keccak-256 digest.
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data.as_ref()));
    out
}

/// First four bytes of the keccak of a canonical function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for `signature` applied to `args`.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend(encode(args));
    data
}

/// Encode a sequence of tokens as a tuple body.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len: usize = tokens.iter().map(Token::head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
            tail.extend(encode_value(token));
        } else {
            head.extend(encode_value(token));
        }
    }

    head.extend(tail);
    head
}

fn encode_value(token: &Token) -> Vec<u8> {
    match token {
        Token::Uint(v) => uint_word(*v).to_vec(),
        Token::Address(a) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(&a.0);
            word.to_vec()
        }
        Token::Bool(b) => uint_word(u128::from(*b)).to_vec(),
        Token::FixedBytes32(b) => b.to_vec(),
        Token::Bytes(b) => encode_byte_string(b),
        Token::String(s) => encode_byte_string(s.as_bytes()),
        Token::Array(items) => {
            let mut out = uint_word(items.len() as u128).to_vec();
            out.extend(encode(items));
            out
        }
        Token::Tuple(items) => encode(items),
    }
}

fn encode_byte_string(bytes: &[u8]) -> Vec<u8> {
    let padded = bytes.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(WORD + padded);
    out.extend_from_slice(&uint_word(bytes.len() as u128));
    out.extend_from_slice(bytes);
    out.resize(WORD + padded, 0);
    out
}

fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Decode a tuple body into tokens of the given types.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    let mut tokens = Vec::with_capacity(types.len());
    let mut pos = 0usize;

    for ty in types {
        if ty.is_dynamic() {
            let offset = read_usize(data, pos)?;
            let tail = data.get(offset..).ok_or(AbiError::Truncated)?;
            tokens.push(decode_value(ty, tail)?);
            pos += WORD;
        } else {
            let slice = data.get(pos..).ok_or(AbiError::Truncated)?;
            tokens.push(decode_value(ty, slice)?);
            pos += ty.head_size();
        }
    }

    Ok(tokens)
}

/// Decode exactly `N` values, for destructuring call results.
pub fn decode_exact<const N: usize>(
    types: &[ParamType; N],
    data: &[u8],
) -> Result<[Token; N], AbiError> {
    let tokens = decode(types, data)?;
    let actual = tokens.len();
    tokens
        .try_into()
        .map_err(|_| AbiError::Arity { expected: N, actual })
}

fn decode_value(ty: &ParamType, data: &[u8]) -> Result<Token, AbiError> {
    match ty {
        ParamType::Uint => Ok(Token::Uint(read_u128(data, 0)?)),
        ParamType::Address => {
            let word = read_word(data, 0)?;
            let mut addr = [0u8; 20];
            addr.copy_from_slice(&word[12..]);
            Ok(Token::Address(Address(addr)))
        }
        ParamType::Bool => match read_u128(data, 0)? {
            0 => Ok(Token::Bool(false)),
            1 => Ok(Token::Bool(true)),
            _ => Err(AbiError::InvalidBool),
        },
        ParamType::FixedBytes32 => Ok(Token::FixedBytes32(*read_word(data, 0)?)),
        ParamType::Bytes => Ok(Token::Bytes(read_byte_string(data)?.to_vec())),
        ParamType::String => {
            let bytes = read_byte_string(data)?;
            String::from_utf8(bytes.to_vec())
                .map(Token::String)
                .map_err(|_| AbiError::InvalidUtf8)
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, 0)?;
            // Every element occupies at least one word; reject lengths the
            // payload cannot possibly hold before allocating.
            if len > data.len() / WORD {
                return Err(AbiError::Truncated);
            }
            let types = vec![(**inner).clone(); len];
            Ok(Token::Array(decode(&types, &data[WORD..])?))
        }
        ParamType::Tuple(items) => Ok(Token::Tuple(decode(items, data)?)),
    }
}

fn read_word(data: &[u8], pos: usize) -> Result<&[u8; WORD], AbiError> {
    let end = pos.checked_add(WORD).ok_or(AbiError::Truncated)?;
    data.get(pos..end)
        .and_then(|s| s.try_into().ok())
        .ok_or(AbiError::Truncated)
}

fn read_u128(data: &[u8], pos: usize) -> Result<u128, AbiError> {
    let word = read_word(data, pos)?;
    if word[..16].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow);
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

fn read_usize(data: &[u8], pos: usize) -> Result<usize, AbiError> {
    usize::try_from(read_u128(data, pos)?).map_err(|_| AbiError::Overflow)
}

fn read_byte_string(data: &[u8]) -> Result<&[u8], AbiError> {
    let len = read_usize(data, 0)?;
    let end = WORD.checked_add(len).ok_or(AbiError::Truncated)?;
    data.get(WORD..end).ok_or(AbiError::Truncated)
}

/// Extract a human-readable reason from revert data.
///
/// Understands `Error(string)` and `Panic(uint256)`; anything else yields `None`.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    let (sel, body) = data.split_at_checked(4)?;
    if sel == ERROR_SELECTOR {
        let [reason] = decode_exact(&[ParamType::String], body).ok()?;
        return reason.into_string().ok();
    }
    if sel == PANIC_SELECTOR {
        let [code] = decode_exact(&[ParamType::Uint], body).ok()?;
        return code.into_uint().ok().map(|c| format!("panic code 0x{c:02x}"));
    }
    None
}

/// Encode an `Error(string)` revert payload.
pub fn encode_revert_reason(reason: &str) -> Vec<u8> {
    let mut data = ERROR_SELECTOR.to_vec();
    data.extend(encode(&[Token::String(reason.to_string())]));
    data
}

/// `0x`-prefixed lowercase hex.
pub fn to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Parse `0x`-prefixed (or bare) hex into bytes.
pub fn from_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_hex(v: u128) -> String {
        hex::encode(uint_word(v))
    }

    #[test]
    fn keccak_of_empty_input() {
        assert_eq!(
            hex::encode(keccak256([])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn well_known_selectors() {
        assert_eq!(selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(selector("approve(address,uint256)"), [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(selector("Error(string)"), ERROR_SELECTOR);
        assert_eq!(selector("Panic(uint256)"), PANIC_SELECTOR);
    }

    /// The `sam(bytes,bool,uint256[])` example from the Solidity ABI docs.
    #[test]
    fn encodes_solidity_docs_example() {
        let data = encode_call(
            "sam(bytes,bool,uint256[])",
            &[
                Token::Bytes(b"dave".to_vec()),
                Token::Bool(true),
                Token::Array(vec![Token::Uint(1), Token::Uint(2), Token::Uint(3)]),
            ],
        );

        let mut expected = String::from("a5643bf2");
        expected.push_str(&word_hex(0x60));
        expected.push_str(&word_hex(1));
        expected.push_str(&word_hex(0xa0));
        expected.push_str(&word_hex(4));
        expected.push_str(&format!("{:0<64}", hex::encode(b"dave")));
        expected.push_str(&word_hex(3));
        expected.push_str(&word_hex(1));
        expected.push_str(&word_hex(2));
        expected.push_str(&word_hex(3));

        assert_eq!(hex::encode(data), expected);
    }

    #[test]
    fn static_tuple_is_inlined() {
        let encoded = encode(&[
            Token::Uint(7),
            Token::Tuple(vec![Token::Bool(true), Token::Uint(9)]),
        ]);
        assert_eq!(encoded.len(), 3 * WORD);
        let decoded = decode(
            &[
                ParamType::Uint,
                ParamType::Tuple(vec![ParamType::Bool, ParamType::Uint]),
            ],
            &encoded,
        )
        .unwrap();
        assert_eq!(decoded[1], Token::Tuple(vec![Token::Bool(true), Token::Uint(9)]));
    }

    #[test]
    fn nested_dynamic_tuple_array_decodes() {
        let attestation = Token::Tuple(vec![
            Token::FixedBytes32([0x11; 32]),
            Token::Bytes(vec![0x12; 65]),
            Token::Bytes(vec![]),
        ]);
        let tokens = vec![Token::Tuple(vec![
            Token::Uint(1),
            Token::Array(vec![attestation.clone(), attestation]),
            Token::String("notes".into()),
        ])];
        let ty = ParamType::Tuple(vec![
            ParamType::Uint,
            ParamType::Array(Box::new(ParamType::Tuple(vec![
                ParamType::FixedBytes32,
                ParamType::Bytes,
                ParamType::Bytes,
            ]))),
            ParamType::String,
        ]);
        assert_eq!(decode(&[ty], &encode(&tokens)).unwrap(), tokens);
    }

    #[test]
    fn oversized_uint_is_rejected() {
        let mut word = [0u8; WORD];
        word[0] = 1;
        assert_eq!(decode(&[ParamType::Uint], &word), Err(AbiError::Overflow));
    }

    #[test]
    fn truncated_string_is_rejected() {
        let mut data = encode(&[Token::String("hello world".into())]);
        data.truncate(data.len() - WORD);
        assert_eq!(decode(&[ParamType::String], &data), Err(AbiError::Truncated));
    }

    #[test]
    fn absurd_array_length_is_rejected_without_allocating() {
        let mut data = uint_word(WORD as u128).to_vec();
        data.extend_from_slice(&uint_word(u64::MAX as u128));
        let ty = ParamType::Array(Box::new(ParamType::Uint));
        assert_eq!(decode(&[ty], &data), Err(AbiError::Truncated));
    }

    #[test]
    fn revert_reasons_decode() {
        let data = encode_revert_reason("Group is full");
        assert_eq!(decode_revert_reason(&data).as_deref(), Some("Group is full"));

        let mut panic = PANIC_SELECTOR.to_vec();
        panic.extend(encode(&[Token::Uint(0x11)]));
        assert_eq!(decode_revert_reason(&panic).as_deref(), Some("panic code 0x11"));

        assert_eq!(decode_revert_reason(&[0xde, 0xad]), None);
        assert_eq!(decode_revert_reason(&[0xde, 0xad, 0xbe, 0xef]), None);
    }
}
