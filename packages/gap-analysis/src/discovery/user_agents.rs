//! Desktop User-Agent pool for search-engine requests.

use std::sync::atomic::{AtomicUsize, Ordering};

pub const DESKTOP_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_7_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

/// Round-robin cursor over [`DESKTOP_USER_AGENTS`].
///
/// Owned by one searcher; concurrent callers each get the next entry.
#[derive(Debug, Default)]
pub struct UserAgentRotation {
    cursor: AtomicUsize,
}

impl UserAgentRotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at a random offset so separate processes don't march in lockstep.
    pub fn randomized() -> Self {
        Self {
            cursor: AtomicUsize::new(fastrand::usize(..DESKTOP_USER_AGENTS.len())),
        }
    }

    pub fn next_agent(&self) -> &'static str {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        DESKTOP_USER_AGENTS[i % DESKTOP_USER_AGENTS.len()]
    }
}
