//! Per-client token buckets
//!
//! Each [`ClientKey`] owns one bucket holding up to `burst` tokens that refill continuously at
//! `rps` tokens per second. An admitted request spends one token. Buckets are created full on
//! first sight of a key and are only ever removed wholesale by [`AdmissionController::flush`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::RateLimitConfig;

/// Identity a rate limit is tracked against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key on the peer IP only, so every connection from one host shares a bucket
    pub fn from_addr(addr: &SocketAddr) -> Self {
        Self(addr.ip().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdmissionConfigError {
    #[error("Refill rate must be a positive number of requests per second, got {0}")]
    InvalidRate(f64),

    #[error("Burst capacity must be at least 1")]
    InvalidBurst,

    #[error("Flush interval must be non-zero and representable as a deadline, got {0:?}")]
    InvalidFlushInterval(Duration),
}

/// Parameters applied to newly created buckets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketSettings {
    rps: f64,
    burst: u32,
}

impl BucketSettings {
    pub fn new(rps: f64, burst: u32) -> Result<Self, AdmissionConfigError> {
        if !rps.is_finite() || rps <= 0.0 {
            return Err(AdmissionConfigError::InvalidRate(rps));
        }
        if burst == 0 {
            return Err(AdmissionConfigError::InvalidBurst);
        }
        Ok(Self { rps, burst })
    }

    pub fn rps(&self) -> f64 {
        self.rps
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(settings: BucketSettings, now: Instant) -> Self {
        let capacity = f64::from(settings.burst);
        Self {
            tokens: capacity,
            capacity,
            refill_per_sec: settings.rps,
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        // A caller may have read the clock before a racing caller that got the lock first.
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = self.last_refill.max(now);
    }

    fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
struct Registry {
    settings: BucketSettings,
    buckets: HashMap<ClientKey, TokenBucket>,
}

/// Admits or rejects requests per client identity
///
/// Shared between request tasks behind an `Arc`. All bucket mutation happens under one mutex,
/// so the read-modify-write of a bucket is atomic and a flush swaps the whole map at once.
#[derive(Debug)]
pub struct AdmissionController {
    registry: Mutex<Registry>,
    flush_interval: Duration,
}

impl AdmissionController {
    pub fn new(settings: BucketSettings, flush_interval: Duration) -> Self {
        Self {
            registry: Mutex::new(Registry {
                settings,
                buckets: HashMap::new(),
            }),
            flush_interval,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Result<Self, AdmissionConfigError> {
        let settings = BucketSettings::new(config.requests_per_second, config.burst)?;
        Ok(Self::new(settings, config.flush_interval()))
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // Bucket arithmetic cannot panic midway, so a poisoned registry is still consistent.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Try to spend one token for `key`. `false` means the request must be rejected.
    pub fn allow(&self, key: &ClientKey) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// [`allow`](Self::allow) with an explicit observation time
    pub fn allow_at(&self, key: &ClientKey, now: Instant) -> bool {
        let mut registry = self.lock();
        let settings = registry.settings;

        if let Some(bucket) = registry.buckets.get_mut(key) {
            return bucket.try_acquire(now);
        }

        let mut bucket = TokenBucket::full(settings, now);
        let admitted = bucket.try_acquire(now);
        registry.buckets.insert(key.clone(), bucket);
        admitted
    }

    /// Change the parameters used for buckets created from now on.
    ///
    /// Existing buckets keep their rate and capacity until the next flush.
    pub fn configure(&self, rps: f64, burst: u32) -> Result<(), AdmissionConfigError> {
        let settings = BucketSettings::new(rps, burst)?;
        self.lock().settings = settings;
        tracing::info!(rps, burst, "Admission settings updated for new clients");
        Ok(())
    }

    pub fn settings(&self) -> BucketSettings {
        self.lock().settings
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    /// Discard every bucket. Returns how many clients were being tracked.
    pub fn flush(&self) -> usize {
        let previous = std::mem::take(&mut self.lock().buckets);
        previous.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.lock().buckets.len()
    }

    /// Tokens currently held by `key` as of its last observation
    pub fn tokens(&self, key: &ClientKey) -> Option<f64> {
        self.lock().buckets.get(key).map(|bucket| bucket.tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    fn controller(rps: f64, burst: u32) -> AdmissionController {
        let settings = BucketSettings::new(rps, burst).unwrap();
        AdmissionController::new(settings, Duration::from_secs(300))
    }

    #[test]
    fn test_fresh_client_gets_full_burst() {
        let limiter = controller(10.0, 20);
        let key = ClientKey::new("10.0.0.1");
        let now = Instant::now();

        for _ in 0..20 {
            assert!(limiter.allow_at(&key, now));
        }
        assert!(!limiter.allow_at(&key, now));
    }

    #[test]
    fn test_tokens_refill_continuously() {
        let limiter = controller(10.0, 2);
        let key = ClientKey::new("10.0.0.1");
        let start = Instant::now();

        assert!(limiter.allow_at(&key, start));
        assert!(limiter.allow_at(&key, start));
        assert!(!limiter.allow_at(&key, start));

        // 50ms at 10 rps is half a token
        assert!(!limiter.allow_at(&key, start + Duration::from_millis(50)));
        assert!(limiter.allow_at(&key, start + Duration::from_millis(150)));
    }

    #[test]
    fn test_refill_is_capped_at_burst() {
        let limiter = controller(10.0, 3);
        let key = ClientKey::new("10.0.0.1");
        let start = Instant::now();

        assert!(limiter.allow_at(&key, start));
        assert!(limiter.allow_at(&key, start + Duration::from_secs(3600)));

        let tokens = limiter.tokens(&key).unwrap();
        assert!((tokens - 2.0).abs() < 1e-9, "tokens = {}", tokens);
    }

    #[test]
    fn test_stale_timestamp_does_not_rewind_bucket() {
        let limiter = controller(10.0, 1);
        let key = ClientKey::new("10.0.0.1");
        let later = Instant::now() + Duration::from_secs(1);

        assert!(limiter.allow_at(&key, later));
        assert!(!limiter.allow_at(&key, later - Duration::from_millis(500)));
        assert!(!limiter.allow_at(&key, later + Duration::from_millis(50)));
        assert!(limiter.allow_at(&key, later + Duration::from_millis(120)));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = controller(1.0, 1);
        let now = Instant::now();
        let a = ClientKey::new("10.0.0.1");
        let b = ClientKey::new("10.0.0.2");

        assert!(limiter.allow_at(&a, now));
        assert!(!limiter.allow_at(&a, now));
        assert!(limiter.allow_at(&b, now));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_concurrent_callers_never_overspend() {
        const CALLERS: usize = 64;
        const TOKENS: u32 = 10;

        let limiter = Arc::new(controller(0.001, TOKENS));
        let key = ClientKey::new("10.0.0.1");
        let now = Instant::now();
        let barrier = Arc::new(Barrier::new(CALLERS));

        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let key = key.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    limiter.allow_at(&key, now)
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|admitted| *admitted)
            .count();

        assert_eq!(admitted, TOKENS as usize);
    }

    #[test]
    fn test_configure_only_affects_new_buckets() {
        let limiter = controller(10.0, 2);
        let now = Instant::now();
        let old = ClientKey::new("10.0.0.1");
        let new = ClientKey::new("10.0.0.2");

        assert!(limiter.allow_at(&old, now));
        limiter.configure(10.0, 5).unwrap();

        assert!(limiter.allow_at(&old, now));
        assert!(!limiter.allow_at(&old, now));

        for _ in 0..5 {
            assert!(limiter.allow_at(&new, now));
        }
        assert!(!limiter.allow_at(&new, now));
        assert_eq!(limiter.settings().burst(), 5);
    }

    #[test]
    fn test_configure_rejects_invalid_values() {
        let limiter = controller(10.0, 2);
        assert_eq!(
            limiter.configure(0.0, 5),
            Err(AdmissionConfigError::InvalidRate(0.0))
        );
        assert_eq!(limiter.configure(1.0, 0), Err(AdmissionConfigError::InvalidBurst));
        assert!(limiter.configure(f64::NAN, 1).is_err());
        assert_eq!(limiter.settings().burst(), 2);
    }

    #[test]
    fn test_flush_resets_every_client() {
        let limiter = controller(1.0, 1);
        let now = Instant::now();
        let key = ClientKey::new("10.0.0.1");

        assert!(limiter.allow_at(&key, now));
        assert!(!limiter.allow_at(&key, now));

        assert_eq!(limiter.flush(), 1);
        assert_eq!(limiter.tracked_clients(), 0);
        assert!(limiter.allow_at(&key, now));
    }

    #[test]
    fn test_client_key_ignores_port() {
        let a: SocketAddr = "192.168.1.7:50000".parse().unwrap();
        let b: SocketAddr = "192.168.1.7:50001".parse().unwrap();
        assert_eq!(ClientKey::from_addr(&a), ClientKey::from_addr(&b));
        assert_eq!(ClientKey::from_addr(&a).as_str(), "192.168.1.7");
    }
}
