use std::time::{Duration, Instant};

/// Polling rate limiter: `due` fires at most once per interval, measured
/// against the caller's clock. Fires immediately on first call so a freshly
/// started gateway does not sit silent for a full interval.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn due(&mut self, now: Instant) -> bool {
        let ready = match self.last {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= self.interval,
        };
        if ready {
            self.last = Some(now);
        }
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_immediately_then_waits() {
        let mut pacer = Pacer::new(Duration::from_millis(50));
        let t0 = Instant::now();
        assert!(pacer.due(t0));
        assert!(!pacer.due(t0 + Duration::from_millis(10)));
        assert!(!pacer.due(t0 + Duration::from_millis(49)));
        assert!(pacer.due(t0 + Duration::from_millis(50)));
    }

    #[test]
    fn spacing_is_at_least_interval_under_fast_polling() {
        let interval = Duration::from_millis(50);
        let mut pacer = Pacer::new(interval);
        let t0 = Instant::now();

        // Poll every 7ms for a second, record when the pacer fires.
        let mut fired = Vec::new();
        for i in 0..150 {
            let now = t0 + Duration::from_millis(7 * i);
            if pacer.due(now) {
                fired.push(now);
            }
        }

        assert!(fired.len() > 2);
        for pair in fired.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= interval);
        }
    }

    #[test]
    fn slow_polling_fires_every_time() {
        let mut pacer = Pacer::new(Duration::from_millis(50));
        let t0 = Instant::now();
        for i in 0..5 {
            assert!(pacer.due(t0 + Duration::from_millis(200 * i)));
        }
    }
}
