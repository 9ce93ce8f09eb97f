//! Cooperative wall-clock deadline.
//!
//! Checked at safe points between phases; nothing is cancelled preemptively.
//! Built on `tokio::time::Instant` so paused-clock tests are deterministic.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    /// Start a deadline that expires `budget` from now.
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    pub fn is_exceeded(&self) -> bool {
        self.elapsed() >= self.budget
    }

    /// The smaller of `limit` and the time left, so a sub-call never outlives the budget.
    pub fn cap(&self, limit: Duration) -> Duration {
        limit.min(self.remaining())
    }
}
