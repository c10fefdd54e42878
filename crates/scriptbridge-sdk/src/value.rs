//! ScriptValue - NaN-boxed u64 handle for scripting-engine values
//!
//! Primitive values are stored inline. Strings and objects (including arrays
//! and functions) are referenced through a [`HeapRef`]: a slot index plus a
//! generation counter, so a handle whose cell was collected can be detected
//! instead of silently aliasing a newer cell.
//!
//! # Encoding
//!
//! ```text
//! f64 (number): Any value where upper 13 bits != 0x1FFF (raw IEEE 754)
//! Tagged:       0xFFF8 + 3-bit tag + 48-bit payload (NaN-boxed)
//!   - object:    0xFFF8000000000000 | gen << 32 | slot   [tag=000]
//!   - i32 (int): 0xFFF8001000000000 | (i32 as u64)       [tag=001]
//!   - bool:      0xFFF8002000000000 | (b as u64)         [tag=010]
//!   - string:    0xFFF8003000000000 | gen << 32 | slot   [tag=011]
//!   - undefined: 0xFFF8004000000000                      [tag=100]
//!   - null:      0xFFF8005000000000                      [tag=101]
//! ```
//!
//! NaN doubles are canonicalized to the positive quiet NaN so they never
//! collide with the tagged space.

/// Reference to a heap cell owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapRef {
    /// Slot index in the engine heap
    pub slot: u32,
    /// Generation of the slot when the cell was allocated
    pub generation: u16,
}

impl HeapRef {
    /// Create a heap reference
    pub const fn new(slot: u32, generation: u16) -> Self {
        Self { slot, generation }
    }

    const fn to_payload(self) -> u64 {
        ((self.generation as u64) << 32) | self.slot as u64
    }

    const fn from_payload(payload: u64) -> Self {
        Self {
            slot: (payload & PAYLOAD_MASK_32) as u32,
            generation: ((payload >> 32) & 0xFFFF) as u16,
        }
    }
}

/// NaN-boxed 64-bit handle to a scripting-engine value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ScriptValue(u64);

const NAN_BOX_BASE: u64 = 0xFFF8_0000_0000_0000;
const TAG_SHIFT: u64 = 48;
const TAG_MASK: u64 = 0x7 << TAG_SHIFT;
const PAYLOAD_MASK: u64 = 0x0000_FFFF_FFFF_FFFF;
const PAYLOAD_MASK_32: u64 = 0x0000_0000_FFFF_FFFF;

const TAG_OBJECT: u64 = 0x0;
const TAG_I32: u64 = 0x1;
const TAG_BOOL: u64 = 0x2;
const TAG_STRING: u64 = 0x3;
const TAG_UNDEFINED: u64 = 0x4;
const TAG_NULL: u64 = 0x5;

const UNDEFINED_BITS: u64 = NAN_BOX_BASE | (TAG_UNDEFINED << TAG_SHIFT);
const NULL_BITS: u64 = NAN_BOX_BASE | (TAG_NULL << TAG_SHIFT);
const TRUE_BITS: u64 = NAN_BOX_BASE | (TAG_BOOL << TAG_SHIFT) | 1;
const FALSE_BITS: u64 = NAN_BOX_BASE | (TAG_BOOL << TAG_SHIFT);
const CANONICAL_NAN: u64 = 0x7FF8_0000_0000_0000;

impl ScriptValue {
    // ========================================================================
    // Raw bits
    // ========================================================================

    /// Create from raw u64 bits
    #[inline(always)]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Get raw u64 bits
    #[inline(always)]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    /// The `undefined` value
    #[inline]
    pub const fn undefined() -> Self {
        Self(UNDEFINED_BITS)
    }

    /// The `null` value
    #[inline]
    pub const fn null() -> Self {
        Self(NULL_BITS)
    }

    /// Create a boolean value
    #[inline]
    pub const fn bool(b: bool) -> Self {
        Self(if b { TRUE_BITS } else { FALSE_BITS })
    }

    /// Create an int32 number
    #[inline]
    pub const fn int(i: i32) -> Self {
        Self(NAN_BOX_BASE | (TAG_I32 << TAG_SHIFT) | (i as u32 as u64))
    }

    /// Create a double number (NaN is canonicalized)
    #[inline]
    pub fn double(f: f64) -> Self {
        if f.is_nan() {
            Self(CANONICAL_NAN)
        } else {
            Self(f.to_bits())
        }
    }

    /// Create a number, using the int32 encoding when the value is integral
    /// and fits.
    pub fn number(f: f64) -> Self {
        if f.fract() == 0.0
            && f >= i32::MIN as f64
            && f <= i32::MAX as f64
            && !(f == 0.0 && f.is_sign_negative())
        {
            Self::int(f as i32)
        } else {
            Self::double(f)
        }
    }

    /// Create an object handle (plain objects, arrays and functions)
    #[inline]
    pub const fn object(r: HeapRef) -> Self {
        Self(NAN_BOX_BASE | (TAG_OBJECT << TAG_SHIFT) | r.to_payload())
    }

    /// Create a string handle
    #[inline]
    pub const fn string(r: HeapRef) -> Self {
        Self(NAN_BOX_BASE | (TAG_STRING << TAG_SHIFT) | r.to_payload())
    }

    // ========================================================================
    // Type checks
    // ========================================================================

    #[inline]
    const fn is_nan_boxed(&self) -> bool {
        (self.0 & NAN_BOX_BASE) == NAN_BOX_BASE
    }

    #[inline]
    const fn get_tag(&self) -> u64 {
        (self.0 & TAG_MASK) >> TAG_SHIFT
    }

    /// Check if value is `undefined`
    #[inline]
    pub const fn is_undefined(&self) -> bool {
        self.0 == UNDEFINED_BITS
    }

    /// Check if value is `null`
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.0 == NULL_BITS
    }

    /// Check if value is `null` or `undefined`
    #[inline]
    pub const fn is_nullish(&self) -> bool {
        self.is_null() || self.is_undefined()
    }

    /// Check if value is a boolean
    #[inline]
    pub const fn is_bool(&self) -> bool {
        self.is_nan_boxed() && self.get_tag() == TAG_BOOL
    }

    /// Check if value is an int32 number
    #[inline]
    pub const fn is_int(&self) -> bool {
        self.is_nan_boxed() && self.get_tag() == TAG_I32
    }

    /// Check if value is a double number
    #[inline]
    pub const fn is_double(&self) -> bool {
        !self.is_nan_boxed()
    }

    /// Check if value is a number of either encoding
    #[inline]
    pub const fn is_number(&self) -> bool {
        self.is_int() || self.is_double()
    }

    /// Check if value is a string handle
    #[inline]
    pub const fn is_string(&self) -> bool {
        self.is_nan_boxed() && self.get_tag() == TAG_STRING
    }

    /// Check if value is an object handle
    #[inline]
    pub const fn is_object(&self) -> bool {
        self.is_nan_boxed() && self.get_tag() == TAG_OBJECT
    }

    /// Check if value refers to a heap cell (string or object)
    #[inline]
    pub const fn is_heap(&self) -> bool {
        self.is_string() || self.is_object()
    }

    /// Check if value is a string, number or boolean
    #[inline]
    pub const fn is_primitive_scalar(&self) -> bool {
        self.is_string() || self.is_number() || self.is_bool()
    }

    // ========================================================================
    // Extractors
    // ========================================================================

    /// Extract boolean value
    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        if self.is_bool() {
            Some((self.0 & PAYLOAD_MASK) != 0)
        } else {
            None
        }
    }

    /// Extract int32 value
    #[inline]
    pub const fn as_int(&self) -> Option<i32> {
        if self.is_int() {
            Some((self.0 & PAYLOAD_MASK_32) as u32 as i32)
        } else {
            None
        }
    }

    /// Extract double value (only for the double encoding)
    #[inline]
    pub fn as_double(&self) -> Option<f64> {
        if self.is_double() {
            Some(f64::from_bits(self.0))
        } else {
            None
        }
    }

    /// Extract a number from either encoding
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self.as_int() {
            Some(i) => Some(i as f64),
            None => self.as_double(),
        }
    }

    /// Heap reference of a string or object
    #[inline]
    pub const fn as_heap_ref(&self) -> Option<HeapRef> {
        if self.is_heap() {
            Some(HeapRef::from_payload(self.0 & PAYLOAD_MASK))
        } else {
            None
        }
    }

    /// Heap reference of an object
    #[inline]
    pub const fn as_object_ref(&self) -> Option<HeapRef> {
        if self.is_object() {
            self.as_heap_ref()
        } else {
            None
        }
    }

    /// Heap reference of a string
    #[inline]
    pub const fn as_string_ref(&self) -> Option<HeapRef> {
        if self.is_string() {
            self.as_heap_ref()
        } else {
            None
        }
    }

    /// Get the scripting-level type name
    pub const fn type_name(&self) -> &'static str {
        if !self.is_nan_boxed() {
            "number"
        } else {
            match self.get_tag() {
                TAG_OBJECT => "object",
                TAG_I32 => "number",
                TAG_BOOL => "boolean",
                TAG_STRING => "string",
                TAG_UNDEFINED => "undefined",
                TAG_NULL => "null",
                _ => "unknown",
            }
        }
    }
}

impl Default for ScriptValue {
    fn default() -> Self {
        Self::undefined()
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        Self::bool(b)
    }
}

impl From<i32> for ScriptValue {
    fn from(i: i32) -> Self {
        Self::int(i)
    }
}

impl From<f64> for ScriptValue {
    fn from(f: f64) -> Self {
        Self::double(f)
    }
}

impl std::fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.is_nan_boxed() {
            return write!(f, "ScriptValue::Double({})", f64::from_bits(self.0));
        }
        let r = HeapRef::from_payload(self.0 & PAYLOAD_MASK);
        match self.get_tag() {
            TAG_OBJECT => write!(f, "ScriptValue::Object({}#{})", r.slot, r.generation),
            TAG_I32 => write!(f, "ScriptValue::Int({})", (self.0 & PAYLOAD_MASK_32) as u32 as i32),
            TAG_BOOL => write!(f, "ScriptValue::Bool({})", (self.0 & PAYLOAD_MASK) != 0),
            TAG_STRING => write!(f, "ScriptValue::String({}#{})", r.slot, r.generation),
            TAG_UNDEFINED => write!(f, "ScriptValue::Undefined"),
            TAG_NULL => write!(f, "ScriptValue::Null"),
            _ => write!(f, "ScriptValue::Unknown({:#x})", self.0),
        }
    }
}
