//! Default constants for bridge configuration.

use crate::options::{Int64Repr, MapContainer};

/// Deepest nesting the generic converter will walk. Cyclic object graphs
/// fail with `DepthExceeded` once they reach it.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Container used when emitting string-keyed maps to the scripting side.
pub const DEFAULT_MAP_CONTAINER: MapContainer = MapContainer::Array;

/// Representation of 64-bit integers on the scripting side.
pub const DEFAULT_INT64_REPR: Int64Repr = Int64Repr::String;

/// Prefix of the script-level error raised when an argument fails to convert.
pub const ARGUMENT_ERROR_PREFIX: &str = "Error processing arguments";
