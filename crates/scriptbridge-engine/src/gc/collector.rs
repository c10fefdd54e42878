//! Mark-sweep garbage collector

use std::time::{Duration, Instant};

use scriptbridge_sdk::HeapRef;

use super::edges::ReferenceEdges;
use super::roots::RootSet;
use crate::heap::Heap;

/// Garbage collector statistics
#[derive(Debug, Clone, Default)]
pub struct GcStats {
    /// Total number of collections
    pub collections: usize,

    /// Total cells freed
    pub objects_freed: usize,

    /// Total pause time across all collections
    pub total_pause_time: Duration,

    /// Last collection duration
    pub last_pause_time: Duration,

    /// Maximum pause time
    pub max_pause_time: Duration,

    /// Cells marked in last collection
    pub last_marked_count: usize,

    /// Cells freed in last collection
    pub last_freed_count: usize,

    /// Live cells after last collection
    pub live_objects: usize,
}

impl GcStats {
    fn update(&mut self, pause_time: Duration, marked: usize, freed: usize, live_objects: usize) {
        self.collections += 1;
        self.objects_freed += freed;
        self.total_pause_time += pause_time;
        self.last_pause_time = pause_time;
        if pause_time > self.max_pause_time {
            self.max_pause_time = pause_time;
        }
        self.last_marked_count = marked;
        self.last_freed_count = freed;
        self.live_objects = live_objects;
    }
}

/// Mark-sweep collector state
#[derive(Default)]
pub struct Collector {
    stats: GcStats,
}

impl Collector {
    /// Create a collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a full collection. Returns the number of cells freed.
    pub fn collect(&mut self, heap: &mut Heap, roots: &RootSet, edges: &mut ReferenceEdges) -> usize {
        let start = Instant::now();

        let marked = Self::mark(heap, roots, edges);
        let marked_count = marked.iter().filter(|&&m| m).count();
        let freed = heap.sweep(&marked);
        edges.retain_owners(|owner| heap.is_live(owner));

        self.stats
            .update(start.elapsed(), marked_count, freed, heap.live_count());
        tracing::debug!(
            marked = marked_count,
            freed,
            live = heap.live_count(),
            "garbage collection finished"
        );
        freed
    }

    fn mark(heap: &Heap, roots: &RootSet, edges: &ReferenceEdges) -> Vec<bool> {
        let mut marked = vec![false; heap.capacity()];
        let mut worklist: Vec<HeapRef> = roots.iter().collect();

        while let Some(r) = worklist.pop() {
            let Some(cell) = heap.get(r) else {
                continue;
            };
            let seen = &mut marked[r.slot as usize];
            if *seen {
                continue;
            }
            *seen = true;
            cell.trace(&mut worklist);
            worklist.extend_from_slice(edges.targets(r));
        }

        marked
    }

    /// Get GC statistics
    pub fn stats(&self) -> &GcStats {
        &self.stats
    }
}
