//! Garbage collection
//!
//! A mark-sweep collector over the slot heap. Reachability starts from the
//! root set and follows object properties, array elements and the
//! reference edges native code registers between cells.

mod collector;
mod edges;
mod roots;

pub use collector::{Collector, GcStats};
pub use edges::ReferenceEdges;
pub use roots::RootSet;
