// Rolling event-rate counter
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);

/// Counts events and reports the per-second rate over the last minute
#[derive(Debug)]
pub struct Meter {
    total: AtomicU64,
    /// (second since start, events in that second), oldest first
    buckets: Mutex<VecDeque<(u64, u64)>>,
    start: Instant,
}

impl Meter {
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            buckets: Mutex::new(VecDeque::new()),
            start: Instant::now(),
        }
    }

    /// Record `n` events
    pub fn mark(&self, n: u64) {
        self.mark_at(n, Instant::now());
    }

    /// Events recorded since creation
    pub fn count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Mean events per second over the last minute
    pub fn rate1(&self) -> f64 {
        self.rate_at(Instant::now())
    }

    fn mark_at(&self, n: u64, now: Instant) {
        self.total.fetch_add(n, Ordering::Relaxed);

        let second = self.second_of(now);
        let mut buckets = self.buckets.lock().unwrap_or_else(|p| p.into_inner());
        let same_second = matches!(buckets.back(), Some((s, _)) if *s == second);
        if same_second {
            if let Some((_, count)) = buckets.back_mut() {
                *count += n;
            }
        } else {
            buckets.push_back((second, n));
        }
        Self::evict(&mut buckets, second);
    }

    fn rate_at(&self, now: Instant) -> f64 {
        let second = self.second_of(now);
        let mut buckets = self.buckets.lock().unwrap_or_else(|p| p.into_inner());
        Self::evict(&mut buckets, second);

        let events: u64 = buckets.iter().map(|(_, c)| c).sum();
        events as f64 / WINDOW.as_secs_f64()
    }

    fn second_of(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.start).as_secs()
    }

    fn evict(buckets: &mut VecDeque<(u64, u64)>, second: u64) {
        let horizon = second.saturating_sub(WINDOW.as_secs() - 1);
        while matches!(buckets.front(), Some((s, _)) if *s < horizon) {
            buckets.pop_front();
        }
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}
