//! # ABI Codec
//!
//! Solidity head/tail encoding for the parameter types the contract uses.
//!
//! Static values occupy one 32-byte big-endian word in the head. A `string`
//! puts its byte offset (relative to the start of the tuple) in the head and
//! `length ‖ bytes ‖ zero padding` in the tail.

use primitive_types::U256;
use std::fmt;
use thiserror::Error;

use crate::domain::{Address, Hash32};

/// Size of one ABI word.
pub const WORD: usize = 32;

/// Codec failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    /// Data ended before the expected word.
    #[error("ABI data truncated: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        available: usize,
    },

    /// A word does not fit the target Rust type.
    #[error("ABI value out of range for {0}")]
    Overflow(ParamType),

    /// A bool word other than 0 or 1.
    #[error("invalid ABI bool")]
    InvalidBool,

    /// A string whose bytes are not UTF-8.
    #[error("invalid UTF-8 in ABI string")]
    InvalidUtf8,

    /// A token of the wrong type was supplied or requested.
    #[error("ABI type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Declared type.
        expected: ParamType,
        /// Actual type.
        found: ParamType,
    },

    /// Argument count does not match the signature.
    #[error("ABI arity mismatch: expected {expected} values, got {got}")]
    Arity {
        /// Declared parameter count.
        expected: usize,
        /// Supplied value count.
        got: usize,
    },

    /// Calldata shorter than a selector or with an unknown selector.
    #[error("unknown function selector 0x{}", hex::encode(.0))]
    UnknownSelector([u8; 4]),

    /// A log whose topics do not match the event layout.
    #[error("malformed log: {0}")]
    MalformedLog(String),
}

/// Parameter types appearing in the HerbTraceability ABI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// `string`
    String,
    /// `address`
    Address,
    /// `int256`
    Int256,
    /// `uint256`
    Uint256,
    /// `bool`
    Bool,
    /// `bytes32`
    Bytes32,
}

impl ParamType {
    /// Canonical Solidity name, as used in signatures.
    pub const fn canonical(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Address => "address",
            Self::Int256 => "int256",
            Self::Uint256 => "uint256",
            Self::Bool => "bool",
            Self::Bytes32 => "bytes32",
        }
    }

    /// Dynamic types are encoded through an offset.
    pub const fn is_dynamic(&self) -> bool {
        matches!(self, Self::String)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

/// A single ABI value.
///
/// `int256` values are held as `i64`: scaled coordinates never exceed that
/// range, and decoding rejects words that do not sign-extend from 64 bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// `string`
    String(String),
    /// `address`
    Address(Address),
    /// `int256`
    Int(i64),
    /// `uint256`
    Uint(U256),
    /// `bool`
    Bool(bool),
    /// `bytes32`
    FixedBytes(Hash32),
}

impl Token {
    /// Type of this token.
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::String(_) => ParamType::String,
            Self::Address(_) => ParamType::Address,
            Self::Int(_) => ParamType::Int256,
            Self::Uint(_) => ParamType::Uint256,
            Self::Bool(_) => ParamType::Bool,
            Self::FixedBytes(_) => ParamType::Bytes32,
        }
    }

    /// Shorthand for a `uint256` from a `u64`.
    pub fn uint(value: u64) -> Self {
        Self::Uint(U256::from(value))
    }

    fn mismatch(&self, expected: ParamType) -> AbiError {
        AbiError::TypeMismatch {
            expected,
            found: self.param_type(),
        }
    }

    /// Take the value of a `string` token.
    pub fn into_string(self) -> Result<String, AbiError> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(other.mismatch(ParamType::String)),
        }
    }

    /// Take the value of an `address` token.
    pub fn into_address(self) -> Result<Address, AbiError> {
        match self {
            Self::Address(a) => Ok(a),
            other => Err(other.mismatch(ParamType::Address)),
        }
    }

    /// Take the value of an `int256` token.
    pub fn into_int(self) -> Result<i64, AbiError> {
        match self {
            Self::Int(v) => Ok(v),
            other => Err(other.mismatch(ParamType::Int256)),
        }
    }

    /// Take the value of a `uint256` token.
    pub fn into_uint(self) -> Result<U256, AbiError> {
        match self {
            Self::Uint(v) => Ok(v),
            other => Err(other.mismatch(ParamType::Uint256)),
        }
    }

    /// Take a `uint256` that must fit in 64 bits.
    pub fn into_u64(self) -> Result<u64, AbiError> {
        let value = self.into_uint()?;
        if value > U256::from(u64::MAX) {
            return Err(AbiError::Overflow(ParamType::Uint256));
        }
        Ok(value.low_u64())
    }

    /// Take the value of a `bool` token.
    pub fn into_bool(self) -> Result<bool, AbiError> {
        match self {
            Self::Bool(b) => Ok(b),
            other => Err(other.mismatch(ParamType::Bool)),
        }
    }

    /// Take the value of a `bytes32` token.
    pub fn into_bytes32(self) -> Result<Hash32, AbiError> {
        match self {
            Self::FixedBytes(h) => Ok(h),
            other => Err(other.mismatch(ParamType::Bytes32)),
        }
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encode a tuple of tokens.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::String(s) => {
                head.extend_from_slice(&usize_word(head_len + tail.len()));
                tail.extend_from_slice(&usize_word(s.len()));
                tail.extend_from_slice(s.as_bytes());
                tail.resize(tail.len() + padding(s.len()), 0);
            }
            static_token => head.extend_from_slice(&static_word(static_token)),
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Encode one static token as a word.
pub fn static_word(token: &Token) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    match token {
        Token::Address(addr) => word[12..].copy_from_slice(addr.as_bytes()),
        Token::Int(v) => {
            if *v < 0 {
                word = [0xff; WORD];
            }
            word[24..].copy_from_slice(&v.to_be_bytes());
        }
        Token::Uint(v) => v.to_big_endian(&mut word),
        Token::Bool(b) => word[31] = u8::from(*b),
        Token::FixedBytes(h) => word.copy_from_slice(h.as_bytes()),
        // Strings are never static; hashing them is the caller's business.
        Token::String(_) => {}
    }
    word
}

fn usize_word(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[24..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

fn padding(len: usize) -> usize {
    (WORD - len % WORD) % WORD
}

// =============================================================================
// DECODING
// =============================================================================

/// Decode a tuple of the given types.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    types
        .iter()
        .enumerate()
        .map(|(i, ty)| {
            let word = read_word(data, i * WORD)?;
            if ty.is_dynamic() {
                let offset = word_to_usize(&word, *ty)?;
                decode_string(data, offset).map(Token::String)
            } else {
                decode_static(*ty, &word)
            }
        })
        .collect()
}

/// Decode a single static word.
pub fn decode_static(ty: ParamType, word: &[u8; WORD]) -> Result<Token, AbiError> {
    match ty {
        ParamType::Address => {
            if word[..12].iter().any(|b| *b != 0) {
                return Err(AbiError::Overflow(ty));
            }
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&word[12..]);
            Ok(Token::Address(Address::new(bytes)))
        }
        ParamType::Int256 => {
            let mut low = [0u8; 8];
            low.copy_from_slice(&word[24..]);
            let value = i64::from_be_bytes(low);
            let fill = if value < 0 { 0xff } else { 0x00 };
            if word[..24].iter().any(|b| *b != fill) {
                return Err(AbiError::Overflow(ty));
            }
            Ok(Token::Int(value))
        }
        ParamType::Uint256 => Ok(Token::Uint(U256::from_big_endian(word))),
        ParamType::Bool => match (word[..31].iter().all(|b| *b == 0), word[31]) {
            (true, 0) => Ok(Token::Bool(false)),
            (true, 1) => Ok(Token::Bool(true)),
            _ => Err(AbiError::InvalidBool),
        },
        ParamType::Bytes32 => Ok(Token::FixedBytes(Hash32::new(*word))),
        ParamType::String => Err(AbiError::TypeMismatch {
            expected: ParamType::Bytes32,
            found: ParamType::String,
        }),
    }
}

fn decode_string(data: &[u8], offset: usize) -> Result<String, AbiError> {
    let len_word = read_word(data, offset)?;
    let len = word_to_usize(&len_word, ParamType::String)?;
    let start = offset + WORD;
    let end = start.checked_add(len).ok_or(AbiError::Overflow(ParamType::String))?;
    if end > data.len() {
        return Err(AbiError::Truncated {
            needed: end,
            available: data.len(),
        });
    }
    String::from_utf8(data[start..end].to_vec()).map_err(|_| AbiError::InvalidUtf8)
}

/// Read the 32-byte word starting at `offset`.
pub fn read_word(data: &[u8], offset: usize) -> Result<[u8; WORD], AbiError> {
    let end = offset.checked_add(WORD).ok_or(AbiError::Truncated {
        needed: usize::MAX,
        available: data.len(),
    })?;
    let slice = data.get(offset..end).ok_or(AbiError::Truncated {
        needed: end,
        available: data.len(),
    })?;
    let mut word = [0u8; WORD];
    word.copy_from_slice(slice);
    Ok(word)
}

fn word_to_usize(word: &[u8; WORD], ty: ParamType) -> Result<usize, AbiError> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow(ty));
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(low)).map_err(|_| AbiError::Overflow(ty))
}

// =============================================================================
// READING DECODED VALUES
// =============================================================================

/// Sequential reader over a decoded tuple.
pub struct TokenReader {
    tokens: std::vec::IntoIter<Token>,
    consumed: usize,
}

impl TokenReader {
    /// Wrap decoded tokens.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter(),
            consumed: 0,
        }
    }

    /// Next token, whatever its type.
    pub fn next_token(&mut self) -> Result<Token, AbiError> {
        let token = self.tokens.next().ok_or(AbiError::Arity {
            expected: self.consumed + 1,
            got: self.consumed,
        })?;
        self.consumed += 1;
        Ok(token)
    }

    /// Next `string`.
    pub fn string(&mut self) -> Result<String, AbiError> {
        self.next_token()?.into_string()
    }

    /// Next `address`.
    pub fn address(&mut self) -> Result<Address, AbiError> {
        self.next_token()?.into_address()
    }

    /// Next `int256`.
    pub fn int(&mut self) -> Result<i64, AbiError> {
        self.next_token()?.into_int()
    }

    /// Next `uint256`, which must fit in 64 bits.
    pub fn u64(&mut self) -> Result<u64, AbiError> {
        self.next_token()?.into_u64()
    }

    /// Next `bool`.
    pub fn bool(&mut self) -> Result<bool, AbiError> {
        self.next_token()?.into_bool()
    }

    /// Next `bytes32`.
    pub fn bytes32(&mut self) -> Result<Hash32, AbiError> {
        self.next_token()?.into_bytes32()
    }
}
