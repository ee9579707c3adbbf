//! Transaction Pool
//!
//! In-memory pool of candidate transactions awaiting inclusion in a block.
//! Four indexes are kept over the same membership: the canonical hash map,
//! the nullifier map guarding against double spends, a fee-ordered queue the
//! block producer drains, and an expiration-ordered queue the connect-time
//! sweep drains. All four are mutated together through `add_transaction` /
//! `delete_transaction`, nothing else writes them.

use std::collections::HashMap;

use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use vanir_common::error::Result;
use vanir_common::types::{
    Block, BlockHeader, Hash, Nullifier, Transaction, HASH_LENGTH, NULLIFIER_LENGTH,
};

use crate::chain::ChainView;
use crate::events::ChainEvent;
use crate::metrics::METRICS;
use crate::queue::{Keyed, KeyedPriorityQueue};

/// Estimated bytes per fee queue slot: 32-byte hash plus 8-byte fee.
const QUEUE_SLOT_BYTES: usize = 40;

/// Fee index row. The maximum entry is the highest fee, ties going to the
/// lexicographically larger hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeEntry {
    pub fee: i64,
    pub hash: Hash,
}

impl Ord for FeeEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.fee
            .cmp(&other.fee)
            .then_with(|| self.hash.cmp(&other.hash))
    }
}

impl PartialOrd for FeeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Keyed for FeeEntry {
    type Key = Hash;

    fn key(&self) -> Hash {
        self.hash
    }
}

/// Expiration index row. The maximum entry is the one expiring soonest, so
/// the sweep always peeks at the next candidate. A sequence of 0 never
/// expires and sorts behind every real expiration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirationEntry {
    pub expiration_sequence: u32,
    pub hash: Hash,
}

impl ExpirationEntry {
    fn sort_sequence(&self) -> u64 {
        if self.expiration_sequence == 0 {
            u64::MAX
        } else {
            self.expiration_sequence as u64
        }
    }
}

impl Ord for ExpirationEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .sort_sequence()
            .cmp(&self.sort_sequence())
            .then_with(|| other.hash.cmp(&self.hash))
    }
}

impl PartialOrd for ExpirationEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Keyed for ExpirationEntry {
    type Key = Hash;

    fn key(&self) -> Hash {
        self.hash
    }
}

/// Pool statistics
#[derive(Debug, Clone)]
pub struct MemPoolStats {
    pub size: usize,
    pub size_bytes: usize,
}

pub struct MemPool {
    transactions: HashMap<Hash, Transaction>,
    transactions_bytes: usize,
    nullifiers: HashMap<Nullifier, Hash>,
    nullifiers_bytes: usize,
    fee_queue: KeyedPriorityQueue<FeeEntry>,
    expiration_queue: KeyedPriorityQueue<ExpirationEntry>,
    head: Option<BlockHeader>,
}

impl MemPool {
    pub fn new() -> Self {
        Self {
            transactions: HashMap::new(),
            transactions_bytes: 0,
            nullifiers: HashMap::new(),
            nullifiers_bytes: 0,
            fee_queue: KeyedPriorityQueue::new(),
            expiration_queue: KeyedPriorityQueue::new(),
            head: None,
        }
    }

    pub fn size(&self) -> usize {
        self.transactions.len()
    }

    /// Estimated memory footprint of the pool.
    pub fn size_bytes(&self) -> usize {
        self.transactions_bytes + self.nullifiers_bytes + self.fee_queue.len() * QUEUE_SLOT_BYTES
    }

    pub fn exists(&self, hash: &Hash) -> bool {
        self.transactions.contains_key(hash)
    }

    pub fn get(&self, hash: &Hash) -> Option<&Transaction> {
        self.transactions.get(hash)
    }

    /// Chain tip as last observed by the pool.
    pub fn head(&self) -> Option<&BlockHeader> {
        self.head.as_ref()
    }

    pub fn stats(&self) -> MemPoolStats {
        MemPoolStats {
            size: self.size(),
            size_bytes: self.size_bytes(),
        }
    }

    /// Fee-descending snapshot of the pool for block production.
    ///
    /// Membership is fixed at the moment of the call; entries deleted from
    /// the live map before the iterator reaches them are skipped.
    pub fn ordered_transactions(&self) -> OrderedTransactions<'_> {
        OrderedTransactions {
            pool: self,
            queue: self.fee_queue.clone(),
        }
    }

    /// Decide whether a network-validated transaction joins the pool.
    ///
    /// Rejects duplicates and expired transactions outright. A transaction
    /// conflicting on a nullifier replaces the incumbent only with a strictly
    /// greater fee; one call may evict several incumbents. Equal-fee
    /// conflicts reject the incoming transaction.
    pub fn accept<C: ChainView>(&mut self, transaction: Transaction, chain: &C) -> Result<bool> {
        let hash = transaction.hash();
        if self.exists(&hash) {
            return Ok(false);
        }

        let head_sequence = chain.head().map(|h| h.sequence).unwrap_or(0);
        if chain
            .verifier()
            .is_expired_sequence(transaction.expiration_sequence(), head_sequence)
        {
            debug!(
                "Rejecting tx {}: expired sequence {} at head {}",
                hash,
                transaction.expiration_sequence(),
                head_sequence
            );
            return Ok(false);
        }

        for spend in transaction.spends() {
            // A mapping whose owner is gone is stale, the nullifier is free
            let incumbent = self
                .nullifiers
                .get(&spend.nullifier)
                .and_then(|owner| self.transactions.get(owner))
                .cloned();

            if let Some(incumbent) = incumbent {
                if transaction.fee() > incumbent.fee() {
                    debug!(
                        "Evicting tx {} for higher-fee conflict {}",
                        incumbent.hash(),
                        hash
                    );
                    self.delete_transaction(&incumbent)?;
                    METRICS.inc_txs_evicted();
                } else {
                    return Ok(false);
                }
            }
        }

        let added = self.add_transaction(transaction)?;
        if added {
            METRICS.inc_txs_accepted();
            debug!("Accepted tx {}", hash);
        }
        Ok(added)
    }

    /// React to a block joining the main chain: drop its transactions from
    /// the pool, sweep everything the new height expires, then adopt the
    /// block's header as the observed head. Returns how many pool members
    /// were removed.
    pub fn on_connect_block<C: ChainView>(&mut self, block: &Block, chain: &C) -> Result<usize> {
        let mut deleted = 0;
        for transaction in &block.transactions {
            if self.delete_transaction(transaction)? {
                deleted += 1;
            }
        }

        // The connected block is the tip if the chain has nothing newer
        let head_sequence = chain
            .head()
            .map(|h| h.sequence)
            .unwrap_or(block.header.sequence);

        loop {
            let next_expired = match self.expiration_queue.peek() {
                Some(entry) => chain
                    .verifier()
                    .is_expired_sequence(entry.expiration_sequence, head_sequence),
                None => break,
            };
            if !next_expired {
                break;
            }

            // Pop before the lookup so a stale entry cannot stall the sweep
            let entry = self
                .expiration_queue
                .pop()
                .expect("peeked entry must be poppable");
            let transaction = match self.transactions.get(&entry.hash) {
                Some(tx) => tx.clone(),
                None => continue,
            };

            debug!(
                "Expiring tx {} (sequence {}) at head {}",
                entry.hash, entry.expiration_sequence, head_sequence
            );
            self.delete_transaction(&transaction)?;
            deleted += 1;
        }

        self.head = Some(block.header.clone());
        debug!(
            "Connected block {} seq={}, removed {} txs",
            block.header.block_hash, block.header.sequence, deleted
        );
        Ok(deleted)
    }

    /// React to a block leaving the main chain: put its transactions back
    /// into the pool (the miner's fee cannot be replayed and is skipped) and
    /// rewind the observed head to the block's parent.
    ///
    /// Conflicts are impossible here, the disconnected block was valid, so
    /// reinsertion is best-effort and duplicates are silently skipped. An
    /// unknown parent leaves the head unset, a soft error.
    pub async fn on_disconnect_block<C: ChainView>(
        &mut self,
        block: &Block,
        chain: &C,
    ) -> Result<()> {
        let mut added = 0;
        for transaction in &block.transactions {
            if transaction.is_miners_fee() {
                continue;
            }
            if self.add_transaction(transaction.clone())? {
                added += 1;
            }
        }

        let parent = chain.get_header(&block.header.prev_block_hash).await;
        if parent.is_none() {
            warn!(
                "Unknown parent header {} after disconnecting block {}",
                block.header.prev_block_hash, block.header.block_hash
            );
        }
        self.head = parent;

        debug!(
            "Disconnected block {} seq={}, reinserted {} txs",
            block.header.block_hash, block.header.sequence, added
        );
        Ok(())
    }

    /// Consume chain events in emission order until the channel closes.
    /// Handler failures are logged and do not stop the loop.
    pub async fn run<C: ChainView>(
        &mut self,
        chain: &C,
        mut events: broadcast::Receiver<ChainEvent>,
    ) {
        loop {
            match events.recv().await {
                Ok(ChainEvent::Connected(block)) => {
                    if let Err(e) = self.on_connect_block(&block, chain) {
                        error!("Failed to process connected block: {}", e);
                    }
                }
                Ok(ChainEvent::Disconnected(block)) => {
                    if let Err(e) = self.on_disconnect_block(&block, chain).await {
                        error!("Failed to process disconnected block: {}", e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Chain event stream lagged, {} events missed", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Insert into all four indexes. Idempotent by hash.
    fn add_transaction(&mut self, transaction: Transaction) -> Result<bool> {
        let hash = transaction.hash();
        if self.transactions.contains_key(&hash) {
            return Ok(false);
        }

        let serialized_len = transaction.serialize()?.len();
        self.transactions_bytes += serialized_len + HASH_LENGTH;

        for spend in transaction.spends() {
            if self.nullifiers.insert(spend.nullifier, hash).is_none() {
                self.nullifiers_bytes += NULLIFIER_LENGTH + HASH_LENGTH;
            }
        }

        self.fee_queue.push(FeeEntry {
            fee: transaction.fee(),
            hash,
        });
        self.expiration_queue.push(ExpirationEntry {
            expiration_sequence: transaction.expiration_sequence(),
            hash,
        });
        self.transactions.insert(hash, transaction);

        self.update_gauges();
        Ok(true)
    }

    /// Remove from all four indexes. Idempotent by hash. Nullifier entries
    /// are released only while they still point at this transaction.
    fn delete_transaction(&mut self, transaction: &Transaction) -> Result<bool> {
        let hash = transaction.hash();
        let stored = match self.transactions.remove(&hash) {
            Some(tx) => tx,
            None => return Ok(false),
        };

        // Mirror the accounting done at insert by serializing the stored copy
        self.transactions_bytes -= stored.serialize()?.len() + HASH_LENGTH;
        self.fee_queue.remove(&hash);
        self.expiration_queue.remove(&hash);

        for spend in stored.spends() {
            if self.nullifiers.get(&spend.nullifier) == Some(&hash) {
                self.nullifiers.remove(&spend.nullifier);
                self.nullifiers_bytes -= NULLIFIER_LENGTH + HASH_LENGTH;
            }
        }

        self.update_gauges();
        Ok(true)
    }

    fn update_gauges(&self) {
        METRICS.set_mem_pool_size(self.transactions.len() as u64);
        METRICS.set_mem_pool_bytes(self.size_bytes() as u64);
    }
}

impl Default for MemPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy fee-descending drain over a queue snapshot, see
/// [`MemPool::ordered_transactions`].
pub struct OrderedTransactions<'a> {
    pool: &'a MemPool,
    queue: KeyedPriorityQueue<FeeEntry>,
}

impl<'a> Iterator for OrderedTransactions<'a> {
    type Item = &'a Transaction;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(entry) = self.queue.pop() {
            if let Some(transaction) = self.pool.transactions.get(&entry.hash) {
                return Some(transaction);
            }
        }
        None
    }
}
