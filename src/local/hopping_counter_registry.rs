use std::{
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::{Clock, HoppingWindowCounter, HoppingWindowOptions, HopsError, SystemClock};

/// One [`HoppingWindowCounter`] per key, all sharing the same window and clock.
///
/// Useful for per-user or per-endpoint accounting where the set of keys is not
/// known up front.
///
/// # Semantics & Limitations
///
/// **Lazy creation:**
/// - A key's counter is created by its first [`observe`](Self::observe)
/// - [`value`](Self::value) on an unknown key returns 0 and creates nothing
///
/// **Memory growth:**
/// - Keys are not removed automatically
/// - Call [`cleanup`](Self::cleanup) or start
///   [`run_cleanup_loop`](Self::run_cleanup_loop) to drop keys whose window is
///   empty
///
/// # Examples
///
/// ```
/// use hops::{HopUnit, HoppingCounterRegistry, HoppingWindowOptions, WindowUnits};
///
/// let registry = HoppingCounterRegistry::new(HoppingWindowOptions {
///     window_units: WindowUnits::try_from(60).unwrap(),
///     unit: HopUnit::seconds(1).unwrap(),
/// })
/// .unwrap();
///
/// registry.observe("user_123");
/// registry.observe_many("user_123", 4);
///
/// assert_eq!(registry.value("user_123"), 5);
/// assert_eq!(registry.value("user_456"), 0);
/// ```
pub struct HoppingCounterRegistry<C: Clock + Clone = SystemClock> {
    options: HoppingWindowOptions,
    window_size: Duration,
    clock: C,
    counters: DashMap<String, HoppingWindowCounter<C>>,
    cleanup_stop: Mutex<Option<Arc<AtomicBool>>>,
}

impl HoppingCounterRegistry<SystemClock> {
    /// Create a registry driven by the system clock.
    pub fn new(options: HoppingWindowOptions) -> Result<Self, HopsError> {
        Self::with_clock(options, SystemClock)
    }
} // end of impl

impl<C: Clock + Clone> HoppingCounterRegistry<C> {
    /// Create a registry whose counters read time from `clock`.
    pub fn with_clock(options: HoppingWindowOptions, clock: C) -> Result<Self, HopsError> {
        let window_size = options.window()?;

        Ok(Self {
            options,
            window_size,
            clock,
            counters: DashMap::new(),
            cleanup_stop: Mutex::new(None),
        })
    } // end constructor

    /// Record one event for `key`.
    pub fn observe(&self, key: &str) {
        self.observe_many(key, 1);
    } // end method observe

    /// Record `count` events for `key`.
    ///
    /// # Arguments
    ///
    /// - `key`: Unique identifier of the counted resource (e.g. `"user_123"`)
    /// - `count`: Number of events to record
    ///
    /// # Behavior
    ///
    /// 1. If `key` already has a counter, record on it under a shared map hold
    /// 2. Otherwise create the counter with the registry's options and clock, then
    ///    record on it
    ///
    /// # Examples
    ///
    /// ```
    /// use hops::{HopUnit, HoppingCounterRegistry, HoppingWindowOptions, WindowUnits};
    ///
    /// let registry = HoppingCounterRegistry::new(HoppingWindowOptions {
    ///     window_units: WindowUnits::try_from(10).unwrap(),
    ///     unit: HopUnit::seconds(1).unwrap(),
    /// })
    /// .unwrap();
    ///
    /// registry.observe_many("api_endpoint", 3);
    /// assert_eq!(registry.value("api_endpoint"), 3);
    /// ```
    pub fn observe_many(&self, key: &str, count: u64) {
        if let Some(counter) = self.counters.get(key) {
            counter.observe_many(count);
            return;
        }

        let counter = self
            .counters
            .entry(key.to_string())
            .or_insert_with(|| self.new_counter());
        counter.observe_many(count);
    } // end method observe_many

    /// Number of events recorded for `key` within the window.
    ///
    /// # Returns
    ///
    /// The key's [`HoppingWindowCounter::value`], or 0 for an unknown key. Reading
    /// never creates a counter.
    pub fn value(&self, key: &str) -> u64 {
        self.counters
            .get(key)
            .map(|counter| HoppingWindowCounter::<C>::value(&counter))
            .unwrap_or(0)
    } // end method value

    /// Drop the counter for `key`. Returns whether it existed.
    pub fn remove(&self, key: &str) -> bool {
        self.counters.remove(key).is_some()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Currently tracked keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.counters.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Options every counter in this registry is built with.
    pub fn options(&self) -> &HoppingWindowOptions {
        &self.options
    }

    /// Remove every key whose window holds no events.
    ///
    /// # Returns
    ///
    /// Number of keys removed.
    ///
    /// # Behavior
    ///
    /// Realigns every counter to now and drops those reading 0, i.e. keys idle for
    /// at least a whole window. Keys observed concurrently with the pass may be
    /// kept until the next one.
    ///
    /// # Examples
    ///
    /// ```
    /// use hops::{HopUnit, HoppingCounterRegistry, HoppingWindowOptions, WindowUnits};
    ///
    /// let registry = HoppingCounterRegistry::new(HoppingWindowOptions {
    ///     window_units: WindowUnits::try_from(60).unwrap(),
    ///     unit: HopUnit::seconds(1).unwrap(),
    /// })
    /// .unwrap();
    ///
    /// registry.observe("active");
    /// assert_eq!(registry.cleanup(), 0);
    /// assert_eq!(registry.len(), 1);
    /// ```
    pub fn cleanup(&self) -> usize {
        let mut removed = 0;
        self.counters.retain(|_, counter| {
            let keep = counter.value() > 0;
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            tracing::debug!(removed, remaining = self.counters.len(), "hops.cleanup");
        }

        removed
    } // end method cleanup

    fn new_counter(&self) -> HoppingWindowCounter<C> {
        HoppingWindowCounter::from_parts(self.options, self.window_size, self.clock.clone())
    }
} // end of impl

impl<C: Clock + Clone + 'static> HoppingCounterRegistry<C> {
    /// Run [`cleanup`](Self::cleanup) every `interval` on a background thread.
    ///
    /// The first pass runs immediately. Calling this while a loop is running does
    /// nothing. The thread only holds a weak reference, so dropping the last
    /// [`Arc`] ends the loop.
    pub fn run_cleanup_loop(self: &Arc<Self>, interval: Duration) {
        let mut cleanup_stop = self.cleanup_stop.lock();
        if cleanup_stop.is_some() {
            return;
        }

        let stop = Arc::new(AtomicBool::new(false));
        *cleanup_stop = Some(Arc::clone(&stop));

        let registry: Weak<Self> = Arc::downgrade(self);
        tracing::info!(?interval, "hops.cleanup_loop.start");

        thread::spawn(move || {
            loop {
                if stop.load(Ordering::Relaxed) {
                    break;
                }

                let Some(registry) = registry.upgrade() else {
                    break;
                };
                registry.cleanup();
                drop(registry);

                thread::sleep(interval);
            }
        });
    } // end method run_cleanup_loop

    /// Stop the background cleanup loop, if any. Safe to call repeatedly.
    pub fn stop_cleanup_loop(&self) {
        if let Some(stop) = self.cleanup_stop.lock().take() {
            stop.store(true, Ordering::Relaxed);
            tracing::info!("hops.cleanup_loop.stop");
        }
    } // end method stop_cleanup_loop
} // end of impl

impl<C: Clock + Clone> Drop for HoppingCounterRegistry<C> {
    fn drop(&mut self) {
        if let Some(stop) = self.cleanup_stop.get_mut().take() {
            stop.store(true, Ordering::Relaxed);
        }
    }
}
