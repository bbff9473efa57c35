use std::time::{Duration, Instant};

/// A time budget started at a fixed instant.
///
/// Every polling loop in the driver asks the same question each iteration:
/// has more than `budget` elapsed since `start`? A budget is spent once the
/// elapsed time is strictly greater than it, so a loop keeps polling through
/// the final instant of its budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    /// Starts a new budget of `budget` from now.
    pub fn after(budget: Duration) -> Deadline {
        Deadline {
            start: Instant::now(),
            budget,
        }
    }

    /// Time passed since the deadline was started.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time left before the budget is spent, zero once it is.
    #[inline]
    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    /// Returns `true` once the elapsed time exceeds the budget.
    #[inline]
    pub fn expired(&self) -> bool {
        self.elapsed() > self.budget
    }

    /// The total budget.
    #[inline]
    pub fn budget(&self) -> Duration {
        self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::Deadline;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn expires_after_budget() {
        let deadline = Deadline::after(Duration::from_millis(10));
        assert!(!deadline.expired());
        assert!(deadline.remaining() <= Duration::from_millis(10));

        sleep(Duration::from_millis(15));
        assert!(deadline.expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
        assert!(deadline.elapsed() >= deadline.budget());
    }
}
