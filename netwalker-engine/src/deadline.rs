use std::time::{Duration, Instant};

/// The global discovery deadline: an anchor instant plus a timeout, with a
/// bounded number of resets. Exceeding the bound (default 10) means no
/// further queuing can extend the deadline (spec §4.6 "Deadline reset").
pub struct Deadline {
    anchor: Instant,
    timeout: Duration,
    resets_used: u32,
    max_resets: u32,
}

impl Deadline {
    pub fn new(timeout: Duration, max_resets: u32) -> Self {
        Self {
            anchor: Instant::now(),
            timeout,
            resets_used: 0,
            max_resets,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.anchor.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.timeout.saturating_sub(self.elapsed())
    }

    pub fn expired(&self) -> bool {
        self.elapsed() >= self.timeout
    }

    pub fn resets_used(&self) -> u32 {
        self.resets_used
    }

    /// Called when a worker reports that new devices were queued. If
    /// remaining time has dropped under 20% of the timeout and the reset
    /// budget is not exhausted, grants a fresh `timeout` from now and
    /// returns `true`. Otherwise leaves the deadline untouched.
    pub fn maybe_reset(&mut self) -> bool {
        if self.resets_used >= self.max_resets {
            return false;
        }
        let threshold = self.timeout.mul_f64(0.2);
        if self.remaining() >= threshold {
            return false;
        }
        self.anchor = Instant::now();
        self.resets_used += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resets_are_capped_at_the_configured_maximum() {
        let mut deadline = Deadline::new(Duration::from_millis(10), 2);
        std::thread::sleep(Duration::from_millis(9));
        assert!(deadline.maybe_reset());
        assert_eq!(deadline.resets_used(), 1);

        std::thread::sleep(Duration::from_millis(9));
        assert!(deadline.maybe_reset());
        assert_eq!(deadline.resets_used(), 2);

        std::thread::sleep(Duration::from_millis(9));
        assert!(!deadline.maybe_reset());
        assert_eq!(deadline.resets_used(), 2);
    }

    #[test]
    fn reset_is_a_no_op_while_plenty_of_time_remains() {
        let mut deadline = Deadline::new(Duration::from_secs(60), 10);
        assert!(!deadline.maybe_reset());
        assert_eq!(deadline.resets_used(), 0);
    }
}
