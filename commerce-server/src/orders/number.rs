//! Order number generation
//!
//! `ORD-<millis>` reference numbers: unique and strictly increasing in
//! issuance order. A display/reference convenience, not a concurrency
//! primitive — uniqueness is ultimately backed by the UNIQUE column.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

#[derive(Debug, Default)]
pub struct OrderNumberGenerator {
    last: AtomicI64,
}

impl OrderNumberGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next reference number. Bumps past the previous value when two
    /// orders land in the same millisecond.
    pub fn next(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self.last.compare_exchange_weak(
                prev,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return format!("ORD-{candidate}"),
                Err(actual) => prev = actual,
            }
        }
    }
}
