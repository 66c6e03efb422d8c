//! Injectable time and id generation.
//!
//! The engine stamps records through these seams so tests can pin time and
//! ids deterministically.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub trait TimeProvider: Send + Sync {
    /// Current unix time in seconds.
    fn now_unix(&self) -> i64;
}

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Time and id providers bundled for the engine.
#[derive(Clone)]
pub struct RuntimeContext {
    pub time: Arc<dyn TimeProvider>,
    pub ids: Arc<dyn IdGenerator>,
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self {
            time: Arc::new(SystemTimeProvider),
            ids: Arc::new(UuidGenerator),
        }
    }
}

pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_unix(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Fixed-clock provider for tests.
pub struct FixedTimeProvider {
    pub timestamp: i64,
}

impl FixedTimeProvider {
    pub fn new(timestamp: i64) -> Self {
        Self { timestamp }
    }
}

impl TimeProvider for FixedTimeProvider {
    fn now_unix(&self) -> i64 {
        self.timestamp
    }
}

/// Prefixed counter ids for tests.
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, id)
    }
}
