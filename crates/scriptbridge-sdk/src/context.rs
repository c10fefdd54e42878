//! ScriptContext trait - abstract scripting-engine operations
//!
//! Defines the capabilities the bridge consumes from the embedded scripting
//! engine. Converters, the identity table and callback holders program
//! against this trait; the engine crate provides the concrete
//! implementation.

use crate::error::BridgeResult;
use crate::value::ScriptValue;

/// Identifier of a class registered with the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

/// Identifier of an engine realm (global environment)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RealmId(pub u32);

/// Information about a class in the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    /// Class ID in the registry
    pub id: ClassId,
    /// Class name
    pub name: String,
}

/// Own property key of an object, as reported by enumeration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Integer index key (`obj[3]`)
    Index(u32),
    /// String key (`obj.name`)
    Name(String),
}

impl PropertyKey {
    /// The string form of the key, as the engine would report it
    pub fn to_key_string(&self) -> String {
        match self {
            PropertyKey::Index(i) => i.to_string(),
            PropertyKey::Name(n) => n.clone(),
        }
    }
}

/// UTF-8 buffer produced by [`ScriptContext::encode_utf8`].
///
/// Each buffer carries the allocation id the engine issued for it and must be
/// handed back through [`ScriptContext::release_utf8`] exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct EncodedUtf8 {
    id: u64,
    text: String,
}

impl EncodedUtf8 {
    /// Create a buffer (engine side)
    pub fn new(id: u64, text: String) -> Self {
        Self { id, text }
    }

    /// Allocation id issued by the engine
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The encoded text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Abstract scripting-engine context.
///
/// All methods take `&self`: the engine uses interior mutability so that a
/// native function invoked through [`ScriptContext::call_function`] can call
/// back into the same context.
pub trait ScriptContext {
    // ========================================================================
    // Value Creation
    // ========================================================================

    /// Allocate a string
    fn create_string(&self, s: &str) -> BridgeResult<ScriptValue>;

    /// Allocate a plain object, optionally an instance of a registered class
    fn create_object(&self, class: Option<ClassId>) -> BridgeResult<ScriptValue>;

    /// Allocate an array of `len` undefined elements
    fn create_array(&self, len: u32) -> BridgeResult<ScriptValue>;

    // ========================================================================
    // Type Tests
    // ========================================================================

    /// Whether the value is an array object
    fn is_array(&self, value: ScriptValue) -> bool;

    /// Whether the value is a callable object
    fn is_function(&self, value: ScriptValue) -> bool;

    /// Whether the value's heap cell is still alive (primitives are always live)
    fn is_live(&self, value: ScriptValue) -> bool;

    /// Class of an object, if it was created from a registered class
    fn object_class(&self, value: ScriptValue) -> BridgeResult<Option<ClassId>>;

    /// Get class info by ID
    fn class_info(&self, class: ClassId) -> BridgeResult<ClassInfo>;

    // ========================================================================
    // Strings
    // ========================================================================

    /// Encode a string value into a UTF-8 buffer owned by the caller
    fn encode_utf8(&self, value: ScriptValue) -> BridgeResult<EncodedUtf8>;

    /// Release a buffer returned by [`ScriptContext::encode_utf8`]
    fn release_utf8(&self, buffer: EncodedUtf8);

    // ========================================================================
    // Coercion
    // ========================================================================

    /// ToString: returns a string value
    fn to_js_string(&self, value: ScriptValue) -> BridgeResult<ScriptValue>;

    /// ToNumber: may return NaN
    fn to_number(&self, value: ScriptValue) -> BridgeResult<f64>;

    /// ToBoolean
    fn to_boolean(&self, value: ScriptValue) -> bool;

    // ========================================================================
    // Object Operations
    // ========================================================================

    /// Get a property; absent properties read as `undefined`
    fn get_property(&self, object: ScriptValue, name: &str) -> BridgeResult<ScriptValue>;

    /// Set a property
    fn set_property(&self, object: ScriptValue, name: &str, value: ScriptValue)
        -> BridgeResult<()>;

    /// Whether the object has an own property with this name
    fn has_property(&self, object: ScriptValue, name: &str) -> BridgeResult<bool>;

    /// Own enumerable keys: index keys ascending, then names in insertion order
    fn own_property_keys(&self, object: ScriptValue) -> BridgeResult<Vec<PropertyKey>>;

    // ========================================================================
    // Array Operations
    // ========================================================================

    /// Get array length
    fn array_len(&self, array: ScriptValue) -> BridgeResult<u32>;

    /// Get array element (out of range reads as `undefined`)
    fn array_get(&self, array: ScriptValue, index: u32) -> BridgeResult<ScriptValue>;

    /// Set array element, growing the array when needed
    fn array_set(&self, array: ScriptValue, index: u32, value: ScriptValue) -> BridgeResult<()>;

    // ========================================================================
    // Function Execution
    // ========================================================================

    /// Call a function with an explicit receiver, in the current realm
    fn call_function(
        &self,
        this: ScriptValue,
        function: ScriptValue,
        args: &[ScriptValue],
    ) -> BridgeResult<ScriptValue>;

    // ========================================================================
    // Reachability
    // ========================================================================

    /// Record a strong edge: `target` stays alive while `owner` is alive
    fn add_reference_edge(&self, owner: ScriptValue, target: ScriptValue) -> BridgeResult<()>;

    /// Remove one edge previously added with the same pair
    fn remove_reference_edge(&self, owner: ScriptValue, target: ScriptValue)
        -> BridgeResult<()>;

    /// Keep a value alive across collections until a matching
    /// [`ScriptContext::unroot_value`]. Rooting is counted; primitives are
    /// ignored.
    fn root_value(&self, value: ScriptValue);

    /// Undo one [`ScriptContext::root_value`]. Returns false if the value
    /// was not rooted.
    fn unroot_value(&self, value: ScriptValue) -> bool;

    // ========================================================================
    // Realms
    // ========================================================================

    /// Realm that is current
    fn current_realm(&self) -> RealmId;

    /// Realm a heap value was created in
    fn realm_of(&self, value: ScriptValue) -> BridgeResult<RealmId>;

    /// Make `realm` current, returning the previously current realm
    fn enter_realm(&self, realm: RealmId) -> RealmId;

    // ========================================================================
    // Lifecycle and Errors
    // ========================================================================

    /// Whether the engine is in its global teardown/finalization phase
    fn is_finalizing(&self) -> bool;

    /// Raise a script-level error report
    fn report_error(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_key_string() {
        assert_eq!(PropertyKey::Index(3).to_key_string(), "3");
        assert_eq!(PropertyKey::Name("x".into()).to_key_string(), "x");
    }

    #[test]
    fn test_encoded_utf8_accessors() {
        let buf = EncodedUtf8::new(9, "héllo".to_string());
        assert_eq!(buf.id(), 9);
        assert_eq!(buf.as_str(), "héllo");
        assert_eq!(buf.len(), 6);
        assert!(!buf.is_empty());
    }
}
