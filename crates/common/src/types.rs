use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::utils::codec;

pub const HASH_LENGTH: usize = 32;
pub const NULLIFIER_LENGTH: usize = 32;

// --- NewTypes ---

/// 32-byte transaction or block digest. Ordering is raw-byte lexicographic,
/// which the fee index relies on for tie-breaking.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash(pub [u8; HASH_LENGTH]);

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        // Strip 0x prefix if present
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        if bytes.len() != HASH_LENGTH {
            return Err(serde::de::Error::custom("Invalid hash length"));
        }
        let mut arr = [0u8; HASH_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Hash(arr))
    }
}

impl Hash {
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut arr = [0u8; HASH_LENGTH];
        let len = bytes.len().min(HASH_LENGTH);
        arr[..len].copy_from_slice(&bytes[..len]);
        Hash(arr)
    }
}

/// Opaque identifier of a consumed note. Two transactions carrying the same
/// nullifier spend the same output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Nullifier(pub [u8; NULLIFIER_LENGTH]);

impl fmt::Debug for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nullifier({})", hex::encode(self.0))
    }
}

impl fmt::Display for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for Nullifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Nullifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        if bytes.len() != NULLIFIER_LENGTH {
            return Err(serde::de::Error::custom("Invalid nullifier length"));
        }
        let mut arr = [0u8; NULLIFIER_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Nullifier(arr))
    }
}

impl Nullifier {
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut arr = [0u8; NULLIFIER_LENGTH];
        let len = bytes.len().min(NULLIFIER_LENGTH);
        arr[..len].copy_from_slice(&bytes[..len]);
        Nullifier(arr)
    }
}

// --- Domain Structs ---

/// One consumed note of a transaction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Spend {
    pub nullifier: Nullifier,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TransactionBody {
    pub hash: Hash,

    pub fee: i64,

    /// Block height after which the transaction is invalid, 0 means never
    pub expiration_sequence: u32,

    pub spends: Vec<Spend>,

    /// Coinbase-style payout to the block producer
    #[serde(default)]
    pub miners_fee: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Transaction {
    pub body: TransactionBody,
}

impl Transaction {
    pub fn hash(&self) -> Hash {
        self.body.hash
    }

    pub fn fee(&self) -> i64 {
        self.body.fee
    }

    pub fn expiration_sequence(&self) -> u32 {
        self.body.expiration_sequence
    }

    pub fn spends(&self) -> impl Iterator<Item = &Spend> {
        self.body.spends.iter()
    }

    pub fn is_miners_fee(&self) -> bool {
        self.body.miners_fee
    }

    /// Canonical byte encoding via the common codec
    pub fn serialize(&self) -> crate::error::Result<Vec<u8>> {
        codec::serialize(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BlockHeader {
    pub timestamp: i64,
    pub prev_block_hash: Hash,
    pub block_hash: Hash,
    /// Block height
    pub sequence: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}
