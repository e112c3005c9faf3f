use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::config::CONFIG;
use crate::error::LedgerError;

/// Per-aggregate mutual exclusion: one async mutex per aggregate id, so
/// concurrent operations on different wallets or transactions proceed
/// independently while operations on the same one serialize. Waiting past
/// the configured budget yields `Busy` instead of blocking indefinitely.
#[derive(Default)]
pub struct AggregateLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl AggregateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: Uuid) -> Result<OwnedMutexGuard<()>, LedgerError> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        tokio::time::timeout(Duration::from_millis(CONFIG.lock_wait_ms), lock.lock_owned())
            .await
            .map_err(|_| LedgerError::Busy)
    }

    /// Locks two aggregates in ascending id order so concurrent transfers
    /// cannot deadlock against each other. The ids must differ.
    pub async fn acquire_pair(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> Result<(OwnedMutexGuard<()>, OwnedMutexGuard<()>), LedgerError> {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let first_guard = self.acquire(first).await?;
        let second_guard = self.acquire(second).await?;
        Ok((first_guard, second_guard))
    }
}
