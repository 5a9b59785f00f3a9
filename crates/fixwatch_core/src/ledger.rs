//! Fix attempt records for one monitoring session.

use std::collections::HashSet;

use parking_lot::Mutex;

use fixwatch_patterns::FixKey;

/// The set of fix keys already attempted in this session.
///
/// Keys are claimed before the fix runs and never released, so the same
/// (action, target) is attempted at most once even when the two output
/// streams and the watcher race on the same error.
#[derive(Debug, Default)]
pub struct FixLedger {
    claimed: Mutex<HashSet<FixKey>>,
}

impl FixLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`. Returns `false` if it was already claimed.
    pub fn try_claim(&self, key: &FixKey) -> bool {
        self.claimed.lock().insert(key.clone())
    }

    pub fn contains(&self, key: &FixKey) -> bool {
        self.claimed.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.claimed.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.lock().is_empty()
    }

    /// Claimed keys, sorted.
    pub fn keys(&self) -> Vec<FixKey> {
        let mut keys: Vec<_> = self.claimed.lock().iter().cloned().collect();
        keys.sort();
        keys
    }
}
