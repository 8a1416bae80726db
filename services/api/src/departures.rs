//! Employees who left the company
//!
//! Their access tokens stay cryptographically valid until they expire, so the
//! auth middleware refuses any token whose subject is listed here. The set is
//! loaded from the employee table at startup and grows when a resignation is
//! approved.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct Departures {
    ids: Arc<RwLock<HashSet<Uuid>>>,
}

impl Departures {
    pub fn new(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            ids: Arc::new(RwLock::new(ids.into_iter().collect())),
        }
    }

    pub async fn insert(&self, id: Uuid) {
        self.ids.write().await.insert(id);
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.ids.read().await.contains(&id)
    }

    pub async fn len(&self) -> usize {
        self.ids.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_the_same_set() {
        let known = Uuid::new_v4();
        let departures = Departures::new([known]);
        let shared = departures.clone();

        let later = Uuid::new_v4();
        shared.insert(later).await;

        assert!(departures.contains(known).await);
        assert!(departures.contains(later).await);
        assert!(!departures.contains(Uuid::new_v4()).await);
        assert_eq!(departures.len().await, 2);
    }
}
