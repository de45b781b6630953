//! Short-TTL memoization of assembled comment pages.
//!
//! The cache is an injected capability with no authority over correctness:
//! every mutation resets the whole namespace, and a zero TTL disables caching
//! entirely without changing observable behavior.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::models::CommentPage;

/// Default time-to-live for cached pages.
pub const DEFAULT_PAGE_CACHE_TTL: Duration = Duration::from_secs(300);

/// Cache of `list(page, limit)` results, keyed by the pagination parameters.
pub trait CommentPageCache: Send + Sync {
    fn get(&self, page: usize, limit: usize) -> Option<CommentPage>;
    fn set(&self, page: usize, limit: usize, value: CommentPage);
    /// Drop every cached page. Called on any successful mutation; coarse by
    /// design, so no page-membership bookkeeping is needed.
    fn reset(&self);
}

struct CacheEntry {
    expires_at: Instant,
    page: CommentPage,
}

pub struct InMemoryPageCache {
    ttl: Duration,
    entries: Mutex<HashMap<(usize, usize), CacheEntry>>,
}

impl InMemoryPageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPageCache {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_CACHE_TTL)
    }
}

impl CommentPageCache for InMemoryPageCache {
    fn get(&self, page: usize, limit: usize) -> Option<CommentPage> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(&(page, limit)) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.page.clone()),
            Some(_) => {
                entries.remove(&(page, limit));
                None
            }
            None => None,
        }
    }

    fn set(&self, page: usize, limit: usize, value: CommentPage) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            (page, limit),
            CacheEntry {
                expires_at: Instant::now() + self.ttl,
                page: value,
            },
        );
    }

    fn reset(&self) {
        self.entries.lock().unwrap().clear();
    }
}
