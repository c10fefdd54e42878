//! Reference edges registered by native code
//!
//! An edge `owner -> target` keeps `target` alive for as long as `owner` is
//! reachable. Edges form a multiset: adding the same pair twice requires two
//! removals.

use rustc_hash::FxHashMap;
use scriptbridge_sdk::HeapRef;

/// Owner-to-target edge multiset
#[derive(Default)]
pub struct ReferenceEdges {
    edges: FxHashMap<HeapRef, Vec<HeapRef>>,
}

impl ReferenceEdges {
    /// Create an empty edge set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one edge
    pub fn add(&mut self, owner: HeapRef, target: HeapRef) {
        self.edges.entry(owner).or_default().push(target);
    }

    /// Remove one occurrence of an edge. Returns false if none existed.
    pub fn remove(&mut self, owner: HeapRef, target: HeapRef) -> bool {
        let Some(targets) = self.edges.get_mut(&owner) else {
            return false;
        };
        let Some(pos) = targets.iter().position(|&t| t == target) else {
            return false;
        };
        targets.swap_remove(pos);
        if targets.is_empty() {
            self.edges.remove(&owner);
        }
        true
    }

    /// Number of occurrences of an edge
    pub fn count(&self, owner: HeapRef, target: HeapRef) -> usize {
        self.edges
            .get(&owner)
            .map(|targets| targets.iter().filter(|&&t| t == target).count())
            .unwrap_or(0)
    }

    /// Targets held by an owner
    pub fn targets(&self, owner: HeapRef) -> &[HeapRef] {
        self.edges.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of edges
    pub fn len(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Whether there are no edges
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Drop edges whose owner no longer satisfies `alive`
    pub fn retain_owners(&mut self, mut alive: impl FnMut(HeapRef) -> bool) {
        self.edges.retain(|&owner, _| alive(owner));
    }

    /// Drop every edge
    pub fn clear(&mut self) {
        self.edges.clear();
    }
}
