//! Partial-failure runner for bulk operations.
//!
//! Items are processed one after another. A failing item is recorded with its
//! key and the run moves on; nothing is retried or rolled back.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A failed item of a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemError {
    /// Key identifying the item, usually an id.
    pub key: String,
    /// Why the item failed.
    pub message: String,
}

/// Outcome of a bulk operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkOutcome<T> {
    /// Number of items that succeeded.
    pub succeeded_count: usize,
    /// One entry per failed item, in input order.
    pub errors: Vec<BulkItemError>,
    /// Records produced by the successful items, in input order.
    pub records: Vec<T>,
}

impl<T> Default for BulkOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded_count: 0,
            errors: Vec::new(),
            records: Vec::new(),
        }
    }
}

impl<T> BulkOutcome<T> {
    /// Returns true if every item succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run `op` over every item, collecting successes and failures.
#[must_use]
pub fn run_bulk<I, T, K, F>(items: I, key: K, mut op: F) -> BulkOutcome<T>
where
    I: IntoIterator,
    K: Fn(&I::Item) -> String,
    F: FnMut(I::Item) -> Result<T>,
{
    let mut outcome = BulkOutcome::default();

    for item in items {
        let key = key(&item);
        match op(item) {
            Ok(record) => {
                outcome.succeeded_count += 1;
                outcome.records.push(record);
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Bulk item failed");
                outcome.errors.push(BulkItemError {
                    key,
                    message: e.to_string(),
                });
            }
        }
    }

    outcome
}
