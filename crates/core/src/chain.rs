//! Chain collaborator traits
//!
//! The pool never validates or stores blocks itself, it reads the tip,
//! resolves headers, and defers expiry decisions to the chain's verifier.

use async_trait::async_trait;

use vanir_common::types::{BlockHeader, Hash};

/// Expiry rule the chain enforces on transactions.
pub trait TransactionVerifier: Send + Sync {
    fn is_expired_sequence(&self, expiration_sequence: u32, head_sequence: u32) -> bool;
}

/// The canonical rule: an expiration sequence of 0 never expires, anything
/// else expires once the head reaches it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceVerifier;

impl TransactionVerifier for SequenceVerifier {
    fn is_expired_sequence(&self, expiration_sequence: u32, head_sequence: u32) -> bool {
        expiration_sequence != 0 && expiration_sequence <= head_sequence
    }
}

// Trait to decouple the pool from the chain implementation
#[async_trait]
pub trait ChainView: Send + Sync {
    /// Current tip header, if the chain has one.
    fn head(&self) -> Option<BlockHeader>;

    /// Verifier injected by the chain.
    fn verifier(&self) -> &dyn TransactionVerifier;

    /// Resolve a header by block hash.
    async fn get_header(&self, hash: &Hash) -> Option<BlockHeader>;
}
