//! RandomSupplyCache — buffered numbers with threshold replenishment
//!
//! Consumers take numbers from the front of a FIFO buffer. When a request
//! leaves the buffer at or below the low-water mark, a background task
//! fetches one block from the source and appends it to the back.
//!
//! Locking:
//! - `buffer` and `quota` are short critical sections, never held across
//!   an `.await`, so the network round-trip never blocks consumers.
//! - Only one replenish runs at a time (`replenishing` flag, released by a
//!   drop guard on every exit path). Blocks are therefore appended whole
//!   and in fetch order.
//!
//! A failed fetch (rate limit, transport error, timeout, bad data) zeroes
//! the quota. Replenishing then stays off until [`RandomSupplyCache::reset_quota`]
//! is called, while consumers keep draining whatever is left.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use slots_core::{NumberFetcher, SlotError, SlotResult};

use crate::config::SupplyConfig;
use crate::source::{NumberSource, SourceError};

/// Remaining allowance as last reported by the source
///
/// `None` means nothing has been reported yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Quota {
    pub bits_left: Option<u64>,
    pub requests_left: Option<u64>,
}

impl Quota {
    fn exhausted() -> Self {
        Self {
            bits_left: Some(0),
            requests_left: Some(0),
        }
    }

    /// Requests we may still make; an unknown allowance counts as one
    pub fn requests_available(&self) -> u64 {
        self.requests_left.unwrap_or(1)
    }
}

/// What a replenish attempt did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplenishOutcome {
    /// Block fetched, this many numbers appended
    Appended(usize),
    /// No requests left, source not contacted
    QuotaExhausted,
    /// Another replenish is in flight
    AlreadyRunning,
    /// Fetch failed; quota has been zeroed
    Failed(SourceError),
}

/// Releases the in-flight flag when dropped
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RandomSupplyCache {
    config: SupplyConfig,
    source: Arc<dyn NumberSource>,
    buffer: Mutex<VecDeque<i32>>,
    quota: Mutex<Quota>,
    replenishing: AtomicBool,
    /// Handle to ourselves for background replenish tasks
    me: Weak<RandomSupplyCache>,
}

impl RandomSupplyCache {
    pub fn new(config: SupplyConfig, source: Arc<dyn NumberSource>) -> SlotResult<Arc<Self>> {
        config.validate()?;

        Ok(Arc::new_cyclic(|me| Self {
            buffer: Mutex::new(VecDeque::with_capacity(config.block_amount)),
            config,
            source,
            quota: Mutex::new(Quota::default()),
            replenishing: AtomicBool::new(false),
            me: me.clone(),
        }))
    }

    /// Log the setup and, if configured, fill the buffer
    pub async fn start(&self) -> Option<ReplenishOutcome> {
        log::info!(
            "[Supply] Cache on {} source: low water {}, max {} per request, \
             block {} in {}..={}, replenish on start: {}",
            self.source.name(),
            self.config.low_water_mark,
            self.config.max_per_request,
            self.config.block_amount,
            self.config.domain_low,
            self.config.domain_high,
            self.config.replenish_on_start
        );

        if self.config.replenish_on_start {
            Some(self.replenish().await)
        } else {
            None
        }
    }

    /// Take `amount` numbers from the front of the buffer
    ///
    /// Never waits for a replenish: an insufficient buffer is reported as
    /// [`SlotError::Unavailable`] so the caller can retry later.
    pub fn request(&self, amount: usize) -> SlotResult<Vec<i32>> {
        if amount == 0 {
            return Ok(Vec::new());
        }
        if amount > self.config.max_per_request {
            return Err(SlotError::ResourceExhausted(format!(
                "Requested {} numbers, at most {} per request",
                amount, self.config.max_per_request
            )));
        }

        let taken = {
            let mut buffer = self.buffer.lock();
            if buffer.len() < amount {
                Err(buffer.len())
            } else {
                let numbers: Vec<i32> = buffer.drain(..amount).collect();
                Ok((numbers, buffer.len()))
            }
        };

        match taken {
            Ok((numbers, remaining)) => {
                self.check_threshold(remaining);
                Ok(numbers)
            }
            Err(available) => {
                log::error!(
                    "[Supply] Requested {} numbers but only {} in stock; \
                     raise the low water mark to keep up",
                    amount,
                    available
                );
                self.check_threshold(available);
                Err(SlotError::Unavailable(format!(
                    "Requested {} numbers, {} available",
                    amount, available
                )))
            }
        }
    }

    /// Fetch one block and append it
    pub async fn replenish(&self) -> ReplenishOutcome {
        let Some(_in_flight) = InFlight::acquire(&self.replenishing) else {
            log::debug!("[Supply] Replenish already in flight");
            return ReplenishOutcome::AlreadyRunning;
        };

        let quota = *self.quota.lock();
        log::debug!(
            "[Supply] Quota: bits left {:?}, requests left {:?}",
            quota.bits_left,
            quota.requests_left
        );
        if quota.requests_available() == 0 {
            log::warn!(
                "[Supply] No requests left at the source, serving the remaining {} numbers",
                self.len()
            );
            return ReplenishOutcome::QuotaExhausted;
        }

        let (low, high) = self.domain();
        let fetch = self.source.fetch_block(self.config.block_amount, low, high);
        let result = match tokio::time::timeout(self.config.fetch_timeout(), fetch).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Transport(format!(
                "No answer within {}ms",
                self.config.fetch_timeout_ms
            ))),
        };
        let result = result.and_then(|block| {
            let stray = block.numbers.iter().copied().find(|n| !(low..=high).contains(n));
            if let Some(n) = stray {
                return Err(SourceError::Malformed(format!(
                    "{} is outside {}..={}",
                    n, low, high
                )));
            }
            Ok(block)
        });

        match result {
            Ok(block) => {
                let appended = block.numbers.len();
                let size = {
                    let mut buffer = self.buffer.lock();
                    buffer.extend(block.numbers);
                    buffer.len()
                };
                *self.quota.lock() = Quota {
                    bits_left: Some(block.bits_left),
                    requests_left: Some(block.requests_left),
                };
                log::info!(
                    "[Supply] Appended block {} ({} numbers), {} in stock",
                    block.id,
                    appended,
                    size
                );
                ReplenishOutcome::Appended(appended)
            }
            Err(e) => {
                *self.quota.lock() = Quota::exhausted();
                match &e {
                    SourceError::RateLimited(_) => {
                        log::warn!("[Supply] Source allowance used up: {}", e)
                    }
                    _ => log::error!("[Supply] Could not fetch next block: {}", e),
                }
                ReplenishOutcome::Failed(e)
            }
        }
    }

    /// Overwrite the quota, e.g. once the source's daily allowance renews
    pub fn reset_quota(&self, bits_left: u64, requests_left: u64) {
        *self.quota.lock() = Quota {
            bits_left: Some(bits_left),
            requests_left: Some(requests_left),
        };
        log::info!(
            "[Supply] Quota reset to {} bits / {} requests",
            bits_left,
            requests_left
        );
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    pub fn quota(&self) -> Quota {
        *self.quota.lock()
    }

    pub fn config(&self) -> &SupplyConfig {
        &self.config
    }

    /// Inclusive range of the numbers handed out
    pub fn domain(&self) -> (i32, i32) {
        (self.config.domain_low, self.config.domain_high)
    }

    /// Schedule a replenish when stock is at or below the low water mark.
    /// Returns whether one was scheduled.
    fn check_threshold(&self, remaining: usize) -> bool {
        if remaining > self.config.low_water_mark {
            log::debug!(
                "[Supply] {} in stock, above low water mark {}",
                remaining,
                self.config.low_water_mark
            );
            return false;
        }
        if self.replenishing.load(Ordering::Acquire) {
            return false;
        }
        if self.quota().requests_available() == 0 {
            log::debug!(
                "[Supply] {} in stock, at or below low water mark {}, quota exhausted",
                remaining,
                self.config.low_water_mark
            );
            return false;
        }
        let Some(me) = self.me.upgrade() else {
            return false;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                log::debug!(
                    "[Supply] {} in stock, at or below low water mark {}, replenishing",
                    remaining,
                    self.config.low_water_mark
                );
                handle.spawn(async move {
                    me.replenish().await;
                });
                true
            }
            Err(_) => {
                log::warn!("[Supply] Low on numbers but no async runtime to replenish from");
                false
            }
        }
    }
}

#[async_trait]
impl NumberFetcher for RandomSupplyCache {
    async fn fetch(&self, amount: usize) -> SlotResult<Vec<i32>> {
        self.request(amount)
    }
}
