//! Module that automatically chooses which sync structs to import
//!
//! Used to facilitate `loom` model tests of [`SharedAggregator`](crate::aggregate::SharedAggregator)

#[cfg(loom)]
pub(crate) use loom::sync::{Arc, Mutex, MutexGuard};

#[cfg(not(loom))]
pub(crate) use std::sync::{Arc, Mutex, MutexGuard};

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicU64, Ordering};
