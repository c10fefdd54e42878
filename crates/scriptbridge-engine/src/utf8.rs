//! Accounting for UTF-8 buffers handed out by the engine
//!
//! Every encoded buffer gets an allocation id. Releasing an id that is not
//! outstanding counts as a double free.

use rustc_hash::FxHashSet;

/// Outstanding UTF-8 allocations
#[derive(Default)]
pub struct Utf8Ledger {
    next_id: u64,
    outstanding: FxHashSet<u64>,
    allocated: u64,
    released: u64,
    double_frees: u64,
}

impl Utf8Ledger {
    /// Issue a new allocation id
    pub fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.allocated += 1;
        self.outstanding.insert(self.next_id);
        self.next_id
    }

    /// Release an allocation. Returns false on a double or foreign free.
    pub fn release(&mut self, id: u64) -> bool {
        if self.outstanding.remove(&id) {
            self.released += 1;
            true
        } else {
            self.double_frees += 1;
            false
        }
    }

    /// Buffers not yet released
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Buffers ever allocated
    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    /// Buffers released
    pub fn released(&self) -> u64 {
        self.released
    }

    /// Releases of ids that were not outstanding
    pub fn double_frees(&self) -> u64 {
        self.double_frees
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_once() {
        let mut ledger = Utf8Ledger::default();
        let a = ledger.allocate();
        let b = ledger.allocate();
        assert_ne!(a, b);
        assert_eq!(ledger.outstanding(), 2);
        assert!(ledger.release(a));
        assert!(!ledger.release(a));
        assert_eq!(ledger.double_frees(), 1);
        assert_eq!(ledger.outstanding(), 1);
        assert_eq!(ledger.released(), 1);
        assert_eq!(ledger.allocated(), 2);
    }
}
