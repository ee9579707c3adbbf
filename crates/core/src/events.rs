//! Chain Event Module
//!
//! Broadcast channel the chain uses to notify consumers (the transaction
//! pool among them) of blocks being connected to or disconnected from the
//! main chain.

use tokio::sync::broadcast;
use tracing::debug;

use vanir_common::types::Block;

/// Events emitted by the chain as the main chain advances or reorganizes
#[derive(Debug, Clone)]
pub enum ChainEvent {
    /// Block was connected to the head of the main chain
    Connected(Block),
    /// Block was disconnected during a reorganization
    Disconnected(Block),
}

/// Publisher side of the chain event stream
pub struct ChainEventPublisher {
    sender: broadcast::Sender<ChainEvent>,
}

impl ChainEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events emitted from this point on
    pub fn subscribe(&self) -> broadcast::Receiver<ChainEvent> {
        self.sender.subscribe()
    }

    /// Publish event to all subscribers
    pub fn publish(&self, event: ChainEvent) {
        if let Err(e) = self.sender.send(event) {
            debug!("No subscribers to receive chain event: {:?}", e);
        }
    }

    pub fn publish_connected(&self, block: Block) {
        debug!(
            "Publishing connected block seq={}",
            block.header.sequence
        );
        self.publish(ChainEvent::Connected(block));
    }

    pub fn publish_disconnected(&self, block: Block) {
        debug!(
            "Publishing disconnected block seq={}",
            block.header.sequence
        );
        self.publish(ChainEvent::Disconnected(block));
    }

    /// Active subscriber count
    pub fn active_subscribers(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChainEventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}
