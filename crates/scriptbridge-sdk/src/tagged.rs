//! TaggedValue - the native side's closed value model
//!
//! Generic conversion walks scripting values into this type and back.
//! The variant set is closed: anything the engine can hold that has no
//! variant here is rejected during conversion.

use std::collections::{BTreeMap, HashMap};

/// Native dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum TaggedValue {
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// Double-precision float
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Ordered list
    List(Vec<TaggedValue>),
    /// String-keyed map; iteration order is not significant
    Map(HashMap<String, TaggedValue>),
    /// Integer-keyed map, iterated in ascending key order
    IntKeyMap(BTreeMap<i32, TaggedValue>),
}

impl TaggedValue {
    /// Numeric value as the narrowest variant: `Int` when integral, finite
    /// and within i32 range, `Double` otherwise.
    pub fn from_number(n: f64) -> Self {
        if n.is_finite()
            && n.fract() == 0.0
            && n >= i32::MIN as f64
            && n <= i32::MAX as f64
            && !(n == 0.0 && n.is_sign_negative())
        {
            TaggedValue::Int(n as i32)
        } else {
            TaggedValue::Double(n)
        }
    }

    /// Empty string-keyed map
    pub fn empty_map() -> Self {
        TaggedValue::Map(HashMap::new())
    }

    /// Variant name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            TaggedValue::Bool(_) => "bool",
            TaggedValue::Int(_) => "int",
            TaggedValue::Double(_) => "double",
            TaggedValue::String(_) => "string",
            TaggedValue::List(_) => "list",
            TaggedValue::Map(_) => "map",
            TaggedValue::IntKeyMap(_) => "int-key map",
        }
    }

    /// Whether the value is a list or map
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            TaggedValue::List(_) | TaggedValue::Map(_) | TaggedValue::IntKeyMap(_)
        )
    }

    /// Nesting depth: scalars are 0, a flat list or map is 1
    pub fn depth(&self) -> usize {
        match self {
            TaggedValue::List(items) => 1 + items.iter().map(Self::depth).max().unwrap_or(0),
            TaggedValue::Map(map) => 1 + map.values().map(Self::depth).max().unwrap_or(0),
            TaggedValue::IntKeyMap(map) => 1 + map.values().map(Self::depth).max().unwrap_or(0),
            _ => 0,
        }
    }

    /// Numeric view of `Int` and `Double`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TaggedValue::Int(i) => Some(*i as f64),
            TaggedValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Borrow the string of a `String` variant
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TaggedValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the items of a `List` variant
    pub fn as_list(&self) -> Option<&[TaggedValue]> {
        match self {
            TaggedValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the entries of a `Map` variant
    pub fn as_map(&self) -> Option<&HashMap<String, TaggedValue>> {
        match self {
            TaggedValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<bool> for TaggedValue {
    fn from(b: bool) -> Self {
        TaggedValue::Bool(b)
    }
}

impl From<i32> for TaggedValue {
    fn from(i: i32) -> Self {
        TaggedValue::Int(i)
    }
}

impl From<f64> for TaggedValue {
    fn from(d: f64) -> Self {
        TaggedValue::Double(d)
    }
}

impl From<&str> for TaggedValue {
    fn from(s: &str) -> Self {
        TaggedValue::String(s.to_string())
    }
}

impl From<String> for TaggedValue {
    fn from(s: String) -> Self {
        TaggedValue::String(s)
    }
}

impl From<Vec<TaggedValue>> for TaggedValue {
    fn from(items: Vec<TaggedValue>) -> Self {
        TaggedValue::List(items)
    }
}

impl From<HashMap<String, TaggedValue>> for TaggedValue {
    fn from(map: HashMap<String, TaggedValue>) -> Self {
        TaggedValue::Map(map)
    }
}

impl From<BTreeMap<i32, TaggedValue>> for TaggedValue {
    fn from(map: BTreeMap<i32, TaggedValue>) -> Self {
        TaggedValue::IntKeyMap(map)
    }
}
