use futures::lock::{Mutex, OwnedMutexGuard};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// One async mutex per employee, so two scans of the same employee are
/// resolved one after the other.
///
/// Entries are only evicted after sitting idle, never by size, so a lock that
/// is held (and was therefore just accessed) keeps its identity.
pub struct EmployeeLocks {
    locks: Cache<u64, Arc<Mutex<()>>>,
}

impl EmployeeLocks {
    pub fn new(idle: Duration) -> Self {
        Self {
            locks: Cache::builder().time_to_idle(idle).build(),
        }
    }

    /// Waits until no other resolution holds the employee's lock.
    pub async fn acquire(&self, employee_id: u64) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .get_with(employee_id, async { Arc::new(Mutex::new(())) })
            .await;
        lock.lock_owned().await
    }
}

impl Default for EmployeeLocks {
    fn default() -> Self {
        // 30 min idle
        Self::new(Duration::from_secs(1800))
    }
}
