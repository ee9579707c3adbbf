//! Chain-event scenarios against a mock chain: connect eviction, the
//! expiration sweep, disconnect reinsertion, and the broadcast-driven loop.

use std::collections::HashMap;

use vanir_common::types::{Block, BlockHeader, Hash, Spend, Transaction};
use vanir_core::chain::{ChainView, SequenceVerifier, TransactionVerifier};
use vanir_core::events::ChainEventPublisher;
use vanir_core::mempool::MemPool;

struct MockChain {
    head: Option<BlockHeader>,
    headers: HashMap<Hash, BlockHeader>,
    verifier: SequenceVerifier,
}

impl MockChain {
    fn new(head: Option<BlockHeader>) -> Self {
        Self {
            head,
            headers: HashMap::new(),
            verifier: SequenceVerifier,
        }
    }

    fn with_header(mut self, header: BlockHeader) -> Self {
        self.headers.insert(header.block_hash, header);
        self
    }
}

#[async_trait::async_trait]
impl ChainView for MockChain {
    fn head(&self) -> Option<BlockHeader> {
        self.head.clone()
    }

    fn verifier(&self) -> &dyn TransactionVerifier {
        &self.verifier
    }

    async fn get_header(&self, hash: &Hash) -> Option<BlockHeader> {
        self.headers.get(hash).cloned()
    }
}

fn tx(id: u8, fee: i64) -> Transaction {
    let mut tx = Transaction::default();
    tx.body.hash.0[0] = id;
    tx.body.fee = fee;
    tx
}

fn tx_expiring(id: u8, fee: i64, expiration_sequence: u32) -> Transaction {
    let mut tx = tx(id, fee);
    tx.body.expiration_sequence = expiration_sequence;
    tx
}

fn miners_fee_tx(id: u8) -> Transaction {
    let mut tx = tx(id, 0);
    tx.body.miners_fee = true;
    tx
}

fn header(sequence: u32, id: u8, prev_id: u8) -> BlockHeader {
    let mut header = BlockHeader::default();
    header.sequence = sequence;
    header.block_hash = Hash::from_slice(&[id; 32]);
    header.prev_block_hash = Hash::from_slice(&[prev_id; 32]);
    header
}

fn block(header: BlockHeader, transactions: Vec<Transaction>) -> Block {
    Block {
        header,
        transactions,
    }
}

#[test]
fn test_connect_evicts_confirmed_transactions() {
    let mut pool = MemPool::new();
    let chain = MockChain::new(Some(header(1, 0xa0, 0x90)));

    let t1 = tx(1, 5);
    let t2 = tx(2, 9);
    pool.accept(t1.clone(), &chain).unwrap();
    pool.accept(t2.clone(), &chain).unwrap();

    let b = block(header(2, 0xb0, 0xa0), vec![miners_fee_tx(0xee), t1.clone()]);
    let chain = MockChain::new(Some(b.header.clone()));

    let deleted = pool.on_connect_block(&b, &chain).unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(pool.size(), 1);
    assert!(!pool.exists(&t1.hash()));
    assert!(pool.exists(&t2.hash()));
    assert_eq!(pool.head(), Some(&b.header));
}

#[tokio::test]
async fn test_disconnect_reinserts_without_miners_fee() {
    let mut pool = MemPool::new();
    let parent = header(1, 0xa0, 0x90);
    let chain = MockChain::new(Some(parent.clone()));

    let t1 = tx(1, 5);
    let t2 = tx(2, 9);
    pool.accept(t1.clone(), &chain).unwrap();
    pool.accept(t2.clone(), &chain).unwrap();

    let b = block(header(2, 0xb0, 0xa0), vec![miners_fee_tx(0xee), t1.clone()]);
    let chain = MockChain::new(Some(b.header.clone())).with_header(parent.clone());

    pool.on_connect_block(&b, &chain).unwrap();
    assert_eq!(pool.size(), 1);

    pool.on_disconnect_block(&b, &chain).await.unwrap();
    assert_eq!(pool.size(), 2);
    assert!(pool.exists(&t1.hash()));
    assert!(pool.exists(&t2.hash()));
    assert!(!pool.exists(&miners_fee_tx(0xee).hash()));
    assert_eq!(pool.head(), Some(&parent));
}

#[tokio::test]
async fn test_disconnect_with_unknown_parent_unsets_head() {
    let mut pool = MemPool::new();
    let b = block(header(2, 0xb0, 0xa0), vec![tx(1, 5)]);
    let chain = MockChain::new(Some(b.header.clone()));

    pool.on_disconnect_block(&b, &chain).await.unwrap();
    assert_eq!(pool.size(), 1);
    assert!(pool.head().is_none());
}

#[tokio::test]
async fn test_disconnect_skips_duplicates() {
    let mut pool = MemPool::new();
    let parent = header(1, 0xa0, 0x90);
    let chain = MockChain::new(Some(parent.clone())).with_header(parent.clone());

    let t1 = tx(1, 5);
    pool.accept(t1.clone(), &chain).unwrap();

    // The block carries a transaction the pool already holds
    let b = block(header(2, 0xb0, 0xa0), vec![t1.clone()]);
    pool.on_disconnect_block(&b, &chain).await.unwrap();
    assert_eq!(pool.size(), 1);
}

#[test]
fn test_expiration_sweep_on_connect() {
    let mut pool = MemPool::new();
    let chain = MockChain::new(Some(header(0, 0xa0, 0x90)));

    let t1 = tx_expiring(1, 5, 10);
    let t2 = tx_expiring(2, 9, 20);
    pool.accept(t1.clone(), &chain).unwrap();
    pool.accept(t2.clone(), &chain).unwrap();

    let b = block(header(15, 0xb0, 0xa0), vec![]);
    let chain = MockChain::new(Some(b.header.clone()));

    let deleted = pool.on_connect_block(&b, &chain).unwrap();
    assert_eq!(deleted, 1);
    assert!(!pool.exists(&t1.hash()));
    assert!(pool.exists(&t2.hash()));
}

#[tokio::test]
async fn test_reorg_round_trip_restores_pool() {
    let mut pool = MemPool::new();
    let parent = header(1, 0xa0, 0x90);
    let chain = MockChain::new(Some(parent.clone()));

    let t1 = tx(1, 5);
    let t2 = tx(2, 9);
    pool.accept(t1.clone(), &chain).unwrap();
    pool.accept(t2.clone(), &chain).unwrap();

    let b = block(header(2, 0xb0, 0xa0), vec![t1.clone()]);
    let chain = MockChain::new(Some(b.header.clone())).with_header(parent.clone());

    pool.on_connect_block(&b, &chain).unwrap();
    assert_eq!(pool.size(), 1);

    pool.on_disconnect_block(&b, &chain).await.unwrap();

    assert_eq!(pool.size(), 2);
    assert!(pool.exists(&t1.hash()));
    assert!(pool.exists(&t2.hash()));
    assert_eq!(pool.head(), Some(&parent));
}

#[tokio::test]
async fn test_event_loop_matches_direct_calls() {
    vanir_common::utils::logging::init_test_logging();

    let mut pool = MemPool::new();
    let parent = header(1, 0xa0, 0x90);
    let chain = MockChain::new(Some(parent.clone())).with_header(parent.clone());

    let t1 = tx(1, 5);
    let t2 = tx(2, 9);
    pool.accept(t1.clone(), &chain).unwrap();
    pool.accept(t2.clone(), &chain).unwrap();

    let publisher = ChainEventPublisher::new(16);
    let events = publisher.subscribe();

    let b = block(header(2, 0xb0, 0xa0), vec![t1.clone()]);
    publisher.publish_connected(b.clone());
    publisher.publish_disconnected(b.clone());
    drop(publisher);

    // The loop drains the buffered events and returns once the channel closes
    pool.run(&chain, events).await;

    assert_eq!(pool.size(), 2);
    assert!(pool.exists(&t1.hash()));
    assert!(pool.exists(&t2.hash()));
    assert_eq!(pool.head(), Some(&parent));
}

#[test]
fn test_ordered_transactions_drain_fee_descending() {
    let mut pool = MemPool::new();
    let chain = MockChain::new(Some(header(1, 0xa0, 0x90)));

    for (id, fee) in [(1u8, 3i64), (2, 10), (3, 7), (4, 10)] {
        pool.accept(tx(id, fee), &chain).unwrap();
    }

    let fees: Vec<i64> = pool.ordered_transactions().map(|t| t.fee()).collect();
    assert_eq!(fees, vec![10, 10, 7, 3]);
}

#[test]
fn test_replacement_interacts_with_connect() {
    let mut pool = MemPool::new();
    let chain = MockChain::new(Some(header(1, 0xa0, 0x90)));

    let conflict = Spend {
        nullifier: vanir_common::types::Nullifier::from_slice(&[7; 32]),
    };
    let mut t1 = tx(1, 5);
    t1.body.spends.push(conflict);
    let mut t2 = tx(2, 10);
    t2.body.spends.push(conflict);

    pool.accept(t1.clone(), &chain).unwrap();
    pool.accept(t2.clone(), &chain).unwrap();
    assert_eq!(pool.size(), 1);

    // Connecting a block with the replaced (evicted) transaction is a no-op
    let b = block(header(2, 0xb0, 0xa0), vec![t1.clone()]);
    let chain = MockChain::new(Some(b.header.clone()));
    let deleted = pool.on_connect_block(&b, &chain).unwrap();
    assert_eq!(deleted, 0);
    assert!(pool.exists(&t2.hash()));
}
