//! GC root tracking
//!
//! Roots are values native code keeps alive explicitly. A value rooted
//! twice must be unrooted twice.

use scriptbridge_sdk::{HeapRef, ScriptValue};

/// Root set for garbage collection
#[derive(Default)]
pub struct RootSet {
    roots: Vec<HeapRef>,
}

impl RootSet {
    /// Create an empty root set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root. Primitives are ignored.
    pub fn add(&mut self, value: ScriptValue) {
        if let Some(r) = value.as_heap_ref() {
            self.roots.push(r);
        }
    }

    /// Remove one occurrence of a root. Returns false if it was not rooted.
    pub fn remove(&mut self, value: ScriptValue) -> bool {
        let Some(r) = value.as_heap_ref() else {
            return false;
        };
        match self.roots.iter().rposition(|&root| root == r) {
            Some(pos) => {
                self.roots.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    /// Drop every root
    pub fn clear(&mut self) {
        self.roots.clear();
    }

    /// Iterate over all roots
    pub fn iter(&self) -> impl Iterator<Item = HeapRef> + '_ {
        self.roots.iter().copied()
    }

    /// Get total number of roots
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether the root set is empty
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_are_not_rooted() {
        let mut roots = RootSet::new();
        roots.add(ScriptValue::int(1));
        roots.add(ScriptValue::null());
        assert!(roots.is_empty());
    }

    #[test]
    fn test_rooting_is_counted() {
        let mut roots = RootSet::new();
        let v = ScriptValue::object(HeapRef::new(1, 0));
        roots.add(v);
        roots.add(v);
        assert_eq!(roots.len(), 2);
        assert!(roots.remove(v));
        assert_eq!(roots.iter().collect::<Vec<_>>(), vec![HeapRef::new(1, 0)]);
        assert!(roots.remove(v));
        assert!(!roots.remove(v));
    }
}
