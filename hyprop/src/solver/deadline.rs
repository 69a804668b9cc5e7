use std::time::{Duration, Instant};

/// Absolute point in monotonic time after which the search stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    /// `None` when the budget overflows the clock; such a deadline never expires.
    at: Option<Instant>,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(budget),
        }
    }

    pub fn after_millis(budget_ms: u64) -> Self {
        Self::after(Duration::from_millis(budget_ms))
    }

    pub const fn never() -> Self {
        Self { at: None }
    }

    pub fn expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }
}
