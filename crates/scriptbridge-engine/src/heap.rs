//! Slot heap for engine cells
//!
//! Cells live in a vector of slots. Freed slots go on a free list and bump
//! their generation, so a [`HeapRef`] taken before the free no longer
//! resolves.

use scriptbridge_sdk::HeapRef;

use crate::object::HeapCell;

struct Slot {
    generation: u16,
    cell: Option<HeapCell>,
}

/// Heap of engine cells
#[derive(Default)]
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    total_allocations: usize,
}

impl Heap {
    /// Create an empty heap
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a cell, reusing a free slot when one exists
    pub fn allocate(&mut self, cell: HeapCell) -> HeapRef {
        self.live += 1;
        self.total_allocations += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.cell = Some(cell);
            return HeapRef::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            cell: Some(cell),
        });
        HeapRef::new(index, 0)
    }

    /// Resolve a reference; `None` when the cell was freed
    pub fn get(&self, r: HeapRef) -> Option<&HeapCell> {
        let slot = self.slots.get(r.slot as usize)?;
        if slot.generation != r.generation {
            return None;
        }
        slot.cell.as_ref()
    }

    /// Resolve a reference mutably
    pub fn get_mut(&mut self, r: HeapRef) -> Option<&mut HeapCell> {
        let slot = self.slots.get_mut(r.slot as usize)?;
        if slot.generation != r.generation {
            return None;
        }
        slot.cell.as_mut()
    }

    /// Whether the reference still resolves
    pub fn is_live(&self, r: HeapRef) -> bool {
        self.get(r).is_some()
    }

    /// Number of slots (live or free)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live cells
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Allocations since creation
    pub fn total_allocations(&self) -> usize {
        self.total_allocations
    }

    /// Free every live cell whose slot is not marked. Returns the number freed.
    pub fn sweep(&mut self, marked: &[bool]) -> usize {
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.cell.is_some() && !marked.get(index).copied().unwrap_or(false) {
                slot.cell = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                freed += 1;
            }
        }
        self.live -= freed;
        freed
    }
}
