use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Serialize any serde-compatible type to JSON bytes.
/// Note: a binary format like bincode would shrink the encoding, the pool's
/// byte accounting only needs the length to be deterministic.
pub fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize JSON bytes to a type.
pub fn deserialize<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Transaction;

    #[test]
    fn test_round_trip() {
        let mut tx = Transaction::default();
        tx.body.fee = 17;

        let bytes = serialize(&tx).unwrap();
        let decoded: Transaction = deserialize(&bytes).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_deserialize_garbage_fails() {
        let result: crate::error::Result<Transaction> = deserialize(b"not json");
        assert!(result.is_err());
    }
}
