//! Per-window accounting of decoded events.
//!
//! [`Aggregator`] decides when a window is closed, [`AggregatorService`] and
//! [`SharedAggregator`] make it safe to feed from many partitions at once.

pub use aggregator::Aggregator;
pub use error::AggregatorClosed;
pub use service::{AggregatorHandle, AggregatorService};
pub use settings::AggregatorSettings;
pub use shared::SharedAggregator;
pub use sink::{EventSink, LocalEventSink};
pub use storage::*;
pub use summary::WindowSummary;
pub use window::{StatusClass, WindowAccumulator};

mod aggregator;
mod error;
mod service;
mod settings;
mod shared;
mod sink;
mod storage;
mod summary;
mod window;
