//! Wall-clock utilities used to bucket events into fixed windows.

#[doc(hidden)]
pub use std::time::{Duration, SystemTime};

pub use clock::Clock;
pub use window_start::WindowStart;

mod clock;
mod window_start;

/// Length of the window used for rollups when nothing else is configured
pub const ONE_MINUTE: Duration = Duration::from_secs(60);
