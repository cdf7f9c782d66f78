use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};

use crate::db_types::OrderNumber;

pub const DEFAULT_ORDER_PREFIX: &str = "ORD";
const SUFFIX_MODULUS: u32 = 1000;

/// Generates order numbers of the form `<prefix><unix millis><3-digit suffix>`.
///
/// The suffix comes from a process-wide counter that starts at a random value and advances by one for every number
/// handed out, so that orders created in the same millisecond still get distinct numbers. The database's unique
/// constraint on `order_number` is the final arbiter across processes.
#[derive(Debug)]
pub struct OrderNumberGenerator {
    prefix: String,
    counter: AtomicU32,
}

impl Default for OrderNumberGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ORDER_PREFIX)
    }
}

impl OrderNumberGenerator {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        let seed = rand::random::<u32>() % SUFFIX_MODULUS;
        Self { prefix: prefix.into(), counter: AtomicU32::new(seed) }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn next_at(&self, now: &DateTime<Utc>) -> OrderNumber {
        let suffix = self.counter.fetch_add(1, Ordering::Relaxed) % SUFFIX_MODULUS;
        OrderNumber(format!("{}{}{suffix:03}", self.prefix, now.timestamp_millis()))
    }

    pub fn next(&self) -> OrderNumber {
        self.next_at(&Utc::now())
    }
}
