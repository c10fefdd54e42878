//! Bridge configuration

use crate::defaults::{DEFAULT_INT64_REPR, DEFAULT_MAP_CONTAINER, DEFAULT_MAX_DEPTH};

/// Scripting container that receives a string-keyed map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapContainer {
    /// An array object carrying the entries as named properties. A map with
    /// a `length` or array-index key falls back to a plain object. An empty
    /// map reads back as an empty list.
    Array,
    /// A plain object
    Object,
}

/// Scripting representation of 64-bit integers, which do not fit a double.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Int64Repr {
    /// Decimal string (`"9007199254740993"`)
    String,
    /// Two-element array `[high, low]` of unsigned 32-bit halves
    Uint32Pair,
}

/// Options shared by every conversion a runtime performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Nesting limit for the generic converter
    pub max_depth: usize,
    /// Container for emitted maps
    pub map_container: MapContainer,
    /// Representation for emitted 64-bit integers
    pub int64_repr: Int64Repr,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            map_container: DEFAULT_MAP_CONTAINER,
            int64_repr: DEFAULT_INT64_REPR,
        }
    }
}

impl BridgeOptions {
    /// Set the nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the map container
    pub fn with_map_container(mut self, container: MapContainer) -> Self {
        self.map_container = container;
        self
    }

    /// Set the 64-bit integer representation
    pub fn with_int64_repr(mut self, repr: Int64Repr) -> Self {
        self.int64_repr = repr;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BridgeOptions::default();
        assert_eq!(options.max_depth, 64);
        assert_eq!(options.map_container, MapContainer::Array);
        assert_eq!(options.int64_repr, Int64Repr::String);
    }

    #[test]
    fn test_builders() {
        let options = BridgeOptions::default()
            .with_max_depth(3)
            .with_map_container(MapContainer::Object)
            .with_int64_repr(Int64Repr::Uint32Pair);
        assert_eq!(options.max_depth, 3);
        assert_eq!(options.map_container, MapContainer::Object);
        assert_eq!(options.int64_repr, Int64Repr::Uint32Pair);
    }
}
