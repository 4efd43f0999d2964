use std::time::{Duration, Instant};

/// Watchdog over the most recent operator command.
///
/// Both gateways share the same failure model: the last command stays in
/// force only while it is fresh, and freshness is re-checked every tick
/// from elapsed wall-clock time alone, so the gate trips even when no
/// further datagram ever arrives.
#[derive(Debug)]
pub struct FreshnessGate<T> {
    timeout: Duration,
    last: Option<(T, Instant)>,
}

impl<T> FreshnessGate<T> {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last: None,
        }
    }

    /// Store a newly received command and reset the freshness timer.
    pub fn accept(&mut self, command: T, now: Instant) {
        self.last = Some((command, now));
    }

    /// Stale when nothing has ever arrived, or the last arrival is older
    /// than the watchdog timeout.
    pub fn is_stale(&self, now: Instant) -> bool {
        match &self.last {
            None => true,
            Some((_, at)) => now.saturating_duration_since(*at) > self.timeout,
        }
    }

    /// The command currently in force, or `None` once stale.
    pub fn effective(&self, now: Instant) -> Option<&T> {
        if self.is_stale(now) {
            None
        } else {
            self.last.as_ref().map(|(cmd, _)| cmd)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(1500);

    #[test]
    fn stale_before_any_command() {
        let gate: FreshnessGate<u32> = FreshnessGate::new(TIMEOUT);
        assert!(gate.is_stale(Instant::now()));
        assert!(gate.effective(Instant::now()).is_none());
    }

    #[test]
    fn holds_within_timeout() {
        let mut gate = FreshnessGate::new(TIMEOUT);
        let t0 = Instant::now();
        gate.accept(7u32, t0);

        let t1 = t0 + Duration::from_millis(1400);
        assert!(!gate.is_stale(t1));
        assert_eq!(gate.effective(t1), Some(&7));
    }

    #[test]
    fn trips_after_timeout_without_new_input() {
        let mut gate = FreshnessGate::new(TIMEOUT);
        let t0 = Instant::now();
        gate.accept(7u32, t0);

        let t1 = t0 + Duration::from_millis(1501);
        assert!(gate.is_stale(t1));
        assert!(gate.effective(t1).is_none());
    }

    #[test]
    fn boundary_is_inclusive() {
        // Exactly the timeout is still fresh; staleness requires strictly more.
        let mut gate = FreshnessGate::new(TIMEOUT);
        let t0 = Instant::now();
        gate.accept(7u32, t0);
        assert!(!gate.is_stale(t0 + TIMEOUT));
    }

    #[test]
    fn new_command_resets_timer() {
        let mut gate = FreshnessGate::new(TIMEOUT);
        let t0 = Instant::now();
        gate.accept(1u32, t0);

        let t1 = t0 + Duration::from_millis(1000);
        gate.accept(2u32, t1);

        let t2 = t1 + Duration::from_millis(1000);
        assert!(!gate.is_stale(t2));
        assert_eq!(gate.effective(t2), Some(&2));
    }
}
