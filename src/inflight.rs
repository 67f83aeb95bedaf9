//! Per-item in-flight transition tracking.
//!
//! Two bulk status updates touching the same order item must not race; the
//! second one is rejected with a conflict while the first guard is alive,
//! instead of letting the last response win.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InflightTransitions {
    inner: Arc<Mutex<HashSet<Uuid>>>,
}

impl InflightTransitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim every id or none. The returned guard releases them on drop, so a
    /// handler that errors out mid-way still frees its items.
    pub fn try_claim(&self, ids: &[Uuid]) -> Result<InflightGuard, Uuid> {
        let mut held = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(dup) = ids.iter().find(|id| held.contains(id)) {
            return Err(*dup);
        }
        held.extend(ids.iter().copied());
        Ok(InflightGuard { ids: ids.to_vec(), registry: Arc::clone(&self.inner) })
    }
}

pub struct InflightGuard {
    ids: Vec<Uuid>,
    registry: Arc<Mutex<HashSet<Uuid>>>,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        let mut held = match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for id in &self.ids {
            held.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_claims_rejected() {
        let registry = InflightTransitions::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let guard = registry.try_claim(&[a, b]).unwrap();
        assert_eq!(registry.try_claim(&[b]).err(), Some(b));
        // A claim overlapping on any id takes nothing.
        let c = Uuid::new_v4();
        assert!(registry.try_claim(&[c, a]).is_err());
        assert!(registry.try_claim(&[c]).is_ok());
        drop(guard);
    }

    #[test]
    fn single_claim_blocks_overlapping_bulk_claim() {
        let registry = InflightTransitions::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        // A single-item hold (a refund completion, a payment) must reject a
        // bulk claim touching that item, and the other way round.
        let single = registry.try_claim(&[a]).unwrap();
        assert_eq!(registry.try_claim(&[a, b]).err(), Some(a));
        drop(single);
        let bulk = registry.try_claim(&[a, b]).unwrap();
        assert_eq!(registry.try_claim(&[a]).err(), Some(a));
        drop(bulk);
    }

    #[test]
    fn drop_releases_items() {
        let registry = InflightTransitions::new();
        let a = Uuid::new_v4();
        let guard = registry.try_claim(&[a]).unwrap();
        drop(guard);
        assert!(registry.try_claim(&[a]).is_ok());
    }
}
