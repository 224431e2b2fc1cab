//! Per-fund exclusive locking so concurrent trades against the same fund
//! cannot both stage, evaluate, and commit against a stale cash/holdings
//! snapshot (the double-spend scenario in the compliance design).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A registry of one `tokio::sync::Mutex` per fund, created lazily. The
/// registry mutex itself is only ever held long enough to clone (or
/// insert) the fund's `Arc`, never across the `.await` that follows.
#[derive(Default)]
pub struct FundLocks {
    locks: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl FundLocks {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquires the exclusive lock for `fund_id`. The returned guard holds
    /// the lock until dropped; callers hold it from the start of the
    /// availability check through the end of the commit.
    pub async fn acquire(&self, fund_id: i64) -> OwnedMutexGuard<()> {
        let fund_lock = {
            let mut locks = self.locks.lock().expect("fund lock registry poisoned");
            locks
                .entry(fund_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        fund_lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn distinct_funds_do_not_contend() {
        let locks = FundLocks::new();
        let _g1 = locks.acquire(1).await;
        let _g2 = locks.acquire(2).await;
    }

    #[tokio::test]
    async fn same_fund_serializes() {
        let locks = Arc::new(FundLocks::new());
        let guard = locks.acquire(1).await;

        let locks2 = locks.clone();
        let handle = tokio::spawn(async move {
            let _g = locks2.acquire(1).await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!handle.is_finished());
        drop(guard);
        handle.await.unwrap();
    }
}
