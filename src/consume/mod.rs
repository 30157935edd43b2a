//! Message broker side of the pipeline.
//!
//! Broker client is abstracted by [`ConsumerGroup`], [`PartitionClaim`],
//! [`ConsumerSession`] and [`Delivery`]. Every claimed partition is consumed
//! by its own [`ConsumptionBridge`] task under a [`ConsumerSupervisor`],
//! which rejoins the group after failures.

pub use bridge::{BridgeStats, ConsumptionBridge, Handled};
pub use error::ConsumptionError;
#[cfg(any(test, feature = "test_util"))]
pub use memory::{MemoryClaim, MemoryConsumerGroup, MemoryDelivery, MemorySession, MemoryTopic};
pub use settings::{BridgeSettings, SupervisorSettings};
pub use shutdown::{shutdown_signal, Shutdown, ShutdownTrigger};
pub use supervisor::{ConsumerSupervisor, SupervisorReport};

mod bridge;
mod error;
#[cfg(any(test, feature = "test_util"))]
mod memory;
mod settings;
mod shutdown;
mod supervisor;

/// Single message received from a partition
pub trait Delivery: Send + Sync {
    fn partition(&self) -> i32;

    fn offset(&self) -> i64;

    fn payload(&self) -> &[u8];
}

/// Ordered stream of deliveries from one partition
///
/// `Ok(None)` ends the claim normally, for example on rebalance.
#[trait_variant::make(PartitionClaim: Send)]
pub trait LocalPartitionClaim {
    type Delivery: Delivery;

    fn partition(&self) -> i32;

    async fn next_delivery(&mut self) -> Result<Option<Self::Delivery>, ConsumptionError>;
}

/// Membership in a consumer group, shared by all claims of one assignment
pub trait ConsumerSession: Clone + Send + Sync + 'static {
    type Delivery: Delivery;

    /// Marks delivery as processed, so it is not redelivered to the group
    fn acknowledge(&self, delivery: &Self::Delivery);
}

/// Partitions assigned to this consumer for the lifetime of a session
#[derive(Debug)]
pub struct Assignment<S, C> {
    pub session: S,
    pub claims: Vec<C>,
}

#[trait_variant::make(ConsumerGroup: Send)]
pub trait LocalConsumerGroup {
    type Session: ConsumerSession;
    type Claim: PartitionClaim<Delivery = <Self::Session as ConsumerSession>::Delivery>
        + Send
        + 'static;

    async fn join(&mut self) -> Result<Assignment<Self::Session, Self::Claim>, ConsumptionError>;
}
