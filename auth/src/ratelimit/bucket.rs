use std::time::Duration;
use std::time::Instant;

/// Token bucket refilling continuously up to a fixed capacity.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_second: f64,
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    /// Create a full bucket.
    pub fn new(capacity: u32, refill_per_second: f64, now: Instant) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            capacity,
            refill_per_second: refill_per_second.max(0.0),
            tokens: capacity,
            last_refill: now,
            last_seen: now,
        }
    }

    /// Take one token if available.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);
        self.last_seen = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time until one token is available, zero if one already is.
    pub fn time_until_available(&mut self, now: Instant) -> Duration {
        self.refill(now);

        if self.tokens >= 1.0 {
            return Duration::ZERO;
        }
        if self.refill_per_second == 0.0 {
            return Duration::MAX;
        }
        Duration::try_from_secs_f64((1.0 - self.tokens) / self.refill_per_second)
            .unwrap_or(Duration::MAX)
    }

    /// Whether the bucket is full and has seen no request for at least `idle`.
    pub fn is_idle(&mut self, now: Instant, idle: Duration) -> bool {
        let untouched_for = now.saturating_duration_since(self.last_seen);
        self.refill(now);
        self.tokens >= self.capacity && untouched_for >= idle
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        if elapsed.is_zero() {
            return;
        }

        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_per_second)
            .min(self.capacity);
        self.last_refill = now;
    }
}
