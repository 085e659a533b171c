//! In-process hopping window counters.
//!
//! Counters keep their whole state in memory, using atomics for the bucket that
//! is currently accumulating and a readers-writer lock for closed buckets.
//!
//! # Key Characteristics
//!
//! - **Thread-safe:** Safe for concurrent use across multiple threads
//! - **Fixed memory:** One `u64` per bucket, allocated once
//! - **Low latency:** Recording an event is an atomic add plus a shared-lock check
//! - **Process-scoped:** State is not shared across processes and is lost on restart
//!
//! # Types
//!
//! - [`HoppingWindowCounter`]: a single counter
//! - [`HoppingCounterRegistry`]: one counter per key, backed by [`DashMap`](dashmap::DashMap)
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use hops::HoppingWindowCounter;
//!
//! let counter = HoppingWindowCounter::try_new(5, Duration::from_secs(60)).unwrap();
//!
//! // In a request handler
//! counter.observe();
//!
//! // In a metrics scrape
//! let requests_last_5_minutes = counter.value();
//! assert_eq!(requests_last_5_minutes, 1);
//! ```

mod hopping_window_counter;
pub use hopping_window_counter::*;

mod hopping_counter_registry;
pub use hopping_counter_registry::*;
