//! In-memory message broker for tests and demos.
//!
//! Single member consumer group over a [`MemoryTopic`]: every join assigns
//! all partitions, claims start from the last acknowledged offset, so
//! anything not acknowledged before a failure is delivered again.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::Poll;

use rustc_hash::FxHashMap;
use tokio::sync::Notify;

use crate::consume::{
    Assignment, ConsumerGroup, ConsumerSession, ConsumptionError, Delivery, PartitionClaim,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDelivery {
    partition: i32,
    offset: i64,
    payload: Vec<u8>,
}

impl Delivery for MemoryDelivery {
    fn partition(&self) -> i32 {
        self.partition
    }

    fn offset(&self) -> i64 {
        self.offset
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }
}

#[derive(Debug, Default)]
struct Partition {
    log: Mutex<Vec<Vec<u8>>>,
    fail_next: AtomicBool,
}

#[derive(Debug)]
struct Topic {
    partitions: Vec<Partition>,
    committed: Mutex<FxHashMap<i32, i64>>,
    acknowledged: AtomicU64,
    joins: AtomicU64,
    join_failures: AtomicUsize,
    generation: AtomicU64,
    closed: AtomicBool,
    changed: Notify,
}

/// Partitioned append-only log with committed offsets
#[derive(Debug, Clone)]
pub struct MemoryTopic {
    inner: Arc<Topic>,
}

impl MemoryTopic {
    pub fn new(partitions: usize) -> Self {
        Self {
            inner: Arc::new(Topic {
                partitions: (0..partitions).map(|_| Partition::default()).collect(),
                committed: Mutex::new(FxHashMap::default()),
                acknowledged: AtomicU64::new(0),
                joins: AtomicU64::new(0),
                join_failures: AtomicUsize::new(0),
                generation: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                changed: Notify::new(),
            }),
        }
    }

    /// Appends payload to partition and returns its offset
    pub fn publish(&self, partition: i32, payload: impl Into<Vec<u8>>) -> Option<i64> {
        let offset = {
            let mut log = lock(&self.inner.partition(partition)?.log);
            log.push(payload.into());
            log.len() as i64 - 1
        };

        self.inner.changed.notify_waiters();
        Some(offset)
    }

    /// Offset of the next delivery after the last acknowledged one
    pub fn committed(&self, partition: i32) -> i64 {
        lock(&self.inner.committed)
            .get(&partition)
            .copied()
            .unwrap_or(0)
    }

    /// Number of acknowledgements received so far, including repeated ones
    pub fn acknowledged(&self) -> u64 {
        self.inner.acknowledged.load(Ordering::Acquire)
    }

    /// Number of successful group joins
    pub fn joins(&self) -> u64 {
        self.inner.joins.load(Ordering::Acquire)
    }

    pub fn fail_next_join(&self) {
        self.inner.join_failures.fetch_add(1, Ordering::AcqRel);
    }

    /// Makes next delivery request on partition fail once
    pub fn fail_partition(&self, partition: i32) {
        if let Some(partition) = self.inner.partition(partition) {
            partition.fail_next.store(true, Ordering::Release);
            self.inner.changed.notify_waiters();
        }
    }

    /// Ends every claim of the current session as a rebalance would
    pub fn rebalance(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.changed.notify_waiters();
    }

    /// Lets active claims drain published messages, new joins are rejected
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.changed.notify_waiters();
    }

    pub fn consumer_group(&self) -> MemoryConsumerGroup {
        MemoryConsumerGroup {
            topic: self.clone(),
        }
    }
}

impl Topic {
    fn partition(&self, partition: i32) -> Option<&Partition> {
        usize::try_from(partition)
            .ok()
            .and_then(|index| self.partitions.get(index))
    }

    fn take_join_failure(&self) -> bool {
        self.join_failures
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |failures| {
                failures.checked_sub(1)
            })
            .is_ok()
    }
}

#[derive(Debug)]
pub struct MemoryConsumerGroup {
    topic: MemoryTopic,
}

impl ConsumerGroup for MemoryConsumerGroup {
    type Session = MemorySession;
    type Claim = MemoryClaim;

    async fn join(&mut self) -> Result<Assignment<MemorySession, MemoryClaim>, ConsumptionError> {
        let topic = &self.topic.inner;

        if topic.closed.load(Ordering::Acquire) || topic.take_join_failure() {
            return Err(ConsumptionError::Disconnected);
        }

        topic.joins.fetch_add(1, Ordering::AcqRel);
        let generation = topic.generation.load(Ordering::Acquire);
        let claims = (0..topic.partitions.len() as i32)
            .map(|partition| MemoryClaim {
                topic: self.topic.clone(),
                partition,
                position: self.topic.committed(partition),
                generation,
            })
            .collect();

        Ok(Assignment {
            session: MemorySession {
                topic: self.topic.clone(),
            },
            claims,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MemorySession {
    topic: MemoryTopic,
}

impl ConsumerSession for MemorySession {
    type Delivery = MemoryDelivery;

    fn acknowledge(&self, delivery: &MemoryDelivery) {
        let mut committed = lock(&self.topic.inner.committed);
        let offset = committed.entry(delivery.partition).or_insert(0);
        *offset = (*offset).max(delivery.offset + 1);
        self.topic.inner.acknowledged.fetch_add(1, Ordering::AcqRel);
    }
}

#[derive(Debug)]
pub struct MemoryClaim {
    topic: MemoryTopic,
    partition: i32,
    position: i64,
    generation: u64,
}

impl MemoryClaim {
    fn poll_log(&mut self) -> Result<Poll<Option<MemoryDelivery>>, ConsumptionError> {
        let topic = &self.topic.inner;
        let partition = topic
            .partition(self.partition)
            .ok_or(ConsumptionError::UnknownPartition(self.partition))?;

        if partition.fail_next.swap(false, Ordering::AcqRel) {
            return Err(ConsumptionError::Disconnected);
        }

        if topic.generation.load(Ordering::Acquire) != self.generation {
            return Ok(Poll::Ready(None));
        }

        let payload = lock(&partition.log).get(self.position as usize).cloned();
        if let Some(payload) = payload {
            let delivery = MemoryDelivery {
                partition: self.partition,
                offset: self.position,
                payload,
            };
            self.position += 1;
            return Ok(Poll::Ready(Some(delivery)));
        }

        if topic.closed.load(Ordering::Acquire) {
            return Ok(Poll::Ready(None));
        }

        Ok(Poll::Pending)
    }
}

impl PartitionClaim for MemoryClaim {
    type Delivery = MemoryDelivery;

    fn partition(&self) -> i32 {
        self.partition
    }

    async fn next_delivery(&mut self) -> Result<Option<MemoryDelivery>, ConsumptionError> {
        let topic = Arc::clone(&self.topic.inner);

        loop {
            let changed = topic.changed.notified();

            if let Poll::Ready(delivery) = self.poll_log()? {
                return Ok(delivery);
            }

            changed.await;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
