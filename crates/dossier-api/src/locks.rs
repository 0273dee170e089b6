//! Per-subject serialisation of mutating requests.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per subject. Different subjects never contend.
#[derive(Clone, Default)]
pub struct SubjectLocks {
  inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl SubjectLocks {
  pub fn new() -> Self { Self::default() }

  /// Wait for exclusive access to `subject_id`'s files and ledger.
  pub async fn lock(&self, subject_id: Uuid) -> OwnedMutexGuard<()> {
    let lock = {
      let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
      // Entries only the map still holds are idle.
      map.retain(|_, l| Arc::strong_count(l) > 1);
      map.entry(subject_id).or_default().clone()
    };
    lock.lock_owned().await
  }

  #[cfg(test)]
  fn tracked(&self) -> usize {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
  }
}
