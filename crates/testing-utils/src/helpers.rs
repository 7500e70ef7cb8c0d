//! Test helper utilities and common testing patterns
//!
//! This module provides utilities for setting up test environments,
//! seeding worker rosters and building call contexts.

use std::time::Duration;

use chrono::Utc;
use reports_core::{CallContext, Department, Worker};
use tokio::time::sleep;

use crate::builders::WorkerBuilder;
use crate::mocks::MockRecordStore;

/// Call timeout used by tests that do not exercise timeouts
pub const TEST_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// A call context with a generous timeout and no cancellation
pub fn test_context() -> CallContext {
    CallContext::with_timeout(TEST_CALL_TIMEOUT)
}

/// A call context with a short timeout, for hang scenarios
pub fn short_context() -> CallContext {
    CallContext::with_timeout(Duration::from_millis(100))
}

/// Test environment setup utilities
pub struct TestEnv;

impl TestEnv {
    /// Register `count` workers named `<department>-<n>` in the mock roster
    pub fn seed_workers(store: &MockRecordStore, department: Department, count: usize) -> Vec<Worker> {
        (1..=count)
            .map(|n| {
                let worker = WorkerBuilder::new()
                    .with_id(&format!("{}-{}", department.as_str(), n))
                    .with_department(department)
                    .build();
                store.workers.add(worker.clone());
                worker
            })
            .collect()
    }

    /// Wait for a condition to be true with timeout
    pub async fn wait_for<F, Fut>(mut condition: F, timeout: Duration) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let start = std::time::Instant::now();

        while start.elapsed() < timeout {
            if condition().await {
                return true;
            }
            sleep(Duration::from_millis(20)).await;
        }

        false
    }

    /// Generate unique test names based on timestamp
    pub fn unique_name(prefix: &str) -> String {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or(0);
        format!("{}_{}", prefix, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_workers() {
        let store = MockRecordStore::new();
        let workers = TestEnv::seed_workers(&store, Department::Systems, 3);

        assert_eq!(workers.len(), 3);
        assert_eq!(workers[0].id, "systems-1");
        assert!(workers.iter().all(|w| w.belongs_to(Department::Systems)));
    }

    #[test]
    fn test_unique_name() {
        let name = TestEnv::unique_name("place");
        assert!(name.starts_with("place_"));
    }
}
