//! Per-minute rollup of request log events streamed from message broker partitions.
//!
//! Events are decoded from `key=value` payloads, folded into the live
//! window by a single writer and reported once the window is closed:
//!
//! ```text
//! ConsumerSupervisor -> ConsumptionBridge (per partition) -> EventDecoder
//!     -> AggregatorService -> WindowAccumulator -> SummaryReporter
//! ```
//!
//! A window is closed when an event from a later window arrives, or on
//! an idle timer when [`aggregate::AggregatorSettings::with_idle_flush`] is
//! used. Empty windows are never reported.
//!
//! ```
//! use logpulse::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (summaries, mut received) = tokio::sync::mpsc::unbounded_channel();
//! let (handle, task) = AggregatorService::spawn(
//!     AggregatorSettings::default(),
//!     ChannelReporter::new(summaries),
//! );
//!
//! let event = EventDecoder::default()
//!     .decode(b"request_id=1 path=/api status=200 latency=12")
//!     .unwrap();
//! handle
//!     .add(event.status, event.latency_millis, Clock::system().now())
//!     .await
//!     .unwrap();
//!
//! drop(handle);
//! task.await.unwrap();
//! assert_eq!(received.recv().await.unwrap().total(), 1);
//! # }
//! ```
#![warn(missing_debug_implementations, unreachable_pub)]

pub mod aggregate;
pub mod consume;
pub mod decode;
pub mod report;
pub mod time;

pub(crate) mod sync;

pub mod prelude {
    pub use crate::aggregate::{
        AggregatorHandle, AggregatorService, AggregatorSettings, EventSink, SharedAggregator,
        WindowSummary,
    };
    pub use crate::consume::{
        shutdown_signal, BridgeSettings, ConsumerGroup, ConsumerSession, ConsumerSupervisor,
        ConsumptionBridge, Delivery, PartitionClaim, SupervisorSettings,
    };
    pub use crate::decode::{DecodePolicy, EventDecoder, LogEvent};
    pub use crate::report::{ChannelReporter, SummaryReporter, TracingReporter};
    pub use crate::time::Clock;
}
