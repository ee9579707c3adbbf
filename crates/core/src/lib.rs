pub mod chain;
pub mod config;
pub mod events;
pub mod mempool;
pub mod metrics;
pub mod queue;

// Re-export commonly used types
pub use chain::{ChainView, SequenceVerifier, TransactionVerifier};
pub use events::{ChainEvent, ChainEventPublisher};
pub use mempool::{MemPool, MemPoolStats, OrderedTransactions};
pub use queue::{Keyed, KeyedPriorityQueue};
