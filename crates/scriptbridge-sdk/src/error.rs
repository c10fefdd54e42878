//! Error types shared by the engine and the bridge

/// Result type for bridge and engine operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Failure while converting a value or operating on the engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// The scripting value has the wrong type for the requested conversion
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// A required property is absent
    #[error("Property '{property}' is missing")]
    PropertyMissing {
        /// Property name
        property: String,
    },

    /// A property exists but cannot be coerced to the required type
    #[error("Property '{property}' is not coercible: {reason}")]
    NotCoercible {
        /// Property name
        property: String,
        /// What went wrong
        reason: String,
    },

    /// A value kind the tagged value model cannot represent
    #[error("Unsupported variant: {kind}")]
    UnsupportedVariant {
        /// Description of the rejected value
        kind: String,
    },

    /// A fixed-size array had the wrong number of elements
    #[error("Array length mismatch: expected {expected}, got {got}")]
    ArrayLengthMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// The engine failed to allocate a value or buffer
    #[error("Allocation failed: {0}")]
    AllocationFailure(String),

    /// No native proxy is registered for the scripting object
    #[error("No native proxy registered for object")]
    ProxyMissing,

    /// The handle refers to a cell that has been collected
    #[error("Stale handle: the referenced value has been collected")]
    StaleHandle,

    /// A function was invoked outside its own realm
    #[error("Cross-realm call: function belongs to realm {expected}, current realm is {current}")]
    CrossRealm {
        /// Realm owning the function
        expected: u32,
        /// Realm that was current at the call
        current: u32,
    },

    /// The callback holder was already released
    #[error("Callback has been released")]
    CallbackReleased,

    /// Nested structure exceeded the configured depth
    #[error("Maximum nesting depth of {limit} exceeded")]
    DepthExceeded {
        /// Configured limit
        limit: usize,
    },

    /// The bridge runtime is not running
    #[error("Bridge runtime has been shut down")]
    RuntimeShutDown,

    /// Engine-level failure (script exception, invalid operation)
    #[error("{0}")]
    Engine(String),
}

impl BridgeError {
    /// Shorthand for a [`BridgeError::TypeMismatch`]
    pub fn type_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        BridgeError::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Shorthand for a [`BridgeError::UnsupportedVariant`]
    pub fn unsupported(kind: impl Into<String>) -> Self {
        BridgeError::UnsupportedVariant { kind: kind.into() }
    }

    /// Shorthand for a [`BridgeError::PropertyMissing`]
    pub fn missing(property: impl Into<String>) -> Self {
        BridgeError::PropertyMissing {
            property: property.into(),
        }
    }
}

impl From<String> for BridgeError {
    fn from(s: String) -> Self {
        BridgeError::Engine(s)
    }
}

impl From<&str> for BridgeError {
    fn from(s: &str) -> Self {
        BridgeError::Engine(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = BridgeError::type_mismatch("array", "object");
        assert_eq!(err.to_string(), "Type mismatch: expected array, got object");

        let err = BridgeError::ArrayLengthMismatch { expected: 16, got: 3 };
        assert_eq!(err.to_string(), "Array length mismatch: expected 16, got 3");

        let err = BridgeError::missing("width");
        assert_eq!(err.to_string(), "Property 'width' is missing");
    }

    #[test]
    fn test_from_string() {
        let err: BridgeError = "boom".into();
        assert_eq!(err, BridgeError::Engine("boom".to_string()));
    }
}
