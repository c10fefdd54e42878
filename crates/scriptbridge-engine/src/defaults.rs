//! Default constants for engine configuration.

/// Live-cell count that triggers an automatic collection on allocation.
/// Zero disables automatic collection; values held only on the native stack
/// are not roots, so embedders opt in explicitly.
pub const DEFAULT_GC_THRESHOLD: usize = 0;

/// Largest array length the engine will allocate.
pub const DEFAULT_MAX_ARRAY_LENGTH: u32 = 1 << 24;

/// Name of the realm created with the engine.
pub const DEFAULT_REALM_NAME: &str = "main";
