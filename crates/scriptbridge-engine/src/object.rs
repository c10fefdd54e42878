//! Heap cell payloads: strings, objects, arrays and native functions

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use scriptbridge_sdk::{BridgeResult, ClassId, HeapRef, PropertyKey, RealmId, ScriptContext, ScriptValue};

/// Native function body callable from the engine.
///
/// Receives the context (for reentrant calls), the receiver and the
/// arguments.
pub type NativeFunction =
    Arc<dyn Fn(&dyn ScriptContext, ScriptValue, &[ScriptValue]) -> BridgeResult<ScriptValue> + Send + Sync>;

/// A heap cell: payload plus the realm it was created in.
pub struct HeapCell {
    /// Realm current at allocation
    pub realm: RealmId,
    /// Payload
    pub kind: CellKind,
}

/// Heap cell payload
pub enum CellKind {
    /// Immutable string
    String(Box<str>),
    /// Plain object or array
    Object(ObjectCell),
    /// Callable native function
    Function(FunctionCell),
}

impl HeapCell {
    /// Push every heap reference held by this cell
    pub fn trace(&self, out: &mut Vec<HeapRef>) {
        match &self.kind {
            CellKind::String(_) => {}
            CellKind::Object(obj) => {
                if let Some(elements) = &obj.elements {
                    out.extend(elements.iter().filter_map(|v| v.as_heap_ref()));
                }
                obj.props.trace(out);
            }
            CellKind::Function(func) => func.props.trace(out),
        }
    }

    /// Own property map, for objects and functions
    pub fn props(&self) -> Option<&PropertyMap> {
        match &self.kind {
            CellKind::Object(obj) => Some(&obj.props),
            CellKind::Function(func) => Some(&func.props),
            CellKind::String(_) => None,
        }
    }

    /// Mutable own property map, for objects and functions
    pub fn props_mut(&mut self) -> Option<&mut PropertyMap> {
        match &mut self.kind {
            CellKind::Object(obj) => Some(&mut obj.props),
            CellKind::Function(func) => Some(&mut func.props),
            CellKind::String(_) => None,
        }
    }
}

/// Plain object or array.
#[derive(Default)]
pub struct ObjectCell {
    /// Class the object was instantiated from
    pub class: Option<ClassId>,
    /// Dense elements; `Some` marks the object as an array
    pub elements: Option<Vec<ScriptValue>>,
    /// Own properties
    pub props: PropertyMap,
}

impl ObjectCell {
    /// Plain object
    pub fn plain(class: Option<ClassId>) -> Self {
        Self {
            class,
            ..Default::default()
        }
    }

    /// Array of `len` undefined elements
    pub fn array(len: usize) -> Self {
        Self {
            class: None,
            elements: Some(vec![ScriptValue::undefined(); len]),
            props: PropertyMap::default(),
        }
    }

    /// Whether this object is an array
    pub fn is_array(&self) -> bool {
        self.elements.is_some()
    }
}

/// Native function object.
pub struct FunctionCell {
    /// Function name, used for ToString
    pub name: String,
    /// Body
    pub body: NativeFunction,
    /// Own properties
    pub props: PropertyMap,
}

// ============================================================================
// PropertyMap
// ============================================================================

/// Own property storage: index keys kept sorted, string keys in insertion order.
#[derive(Default)]
pub struct PropertyMap {
    indexed: BTreeMap<u32, ScriptValue>,
    named: Vec<(String, ScriptValue)>,
    lookup: FxHashMap<String, usize>,
}

impl PropertyMap {
    /// Get a property value
    pub fn get(&self, name: &str) -> Option<ScriptValue> {
        match parse_index(name) {
            Some(i) => self.indexed.get(&i).copied(),
            None => self.lookup.get(name).map(|&slot| self.named[slot].1),
        }
    }

    /// Insert or overwrite a property
    pub fn set(&mut self, name: &str, value: ScriptValue) {
        if let Some(i) = parse_index(name) {
            self.indexed.insert(i, value);
            return;
        }
        match self.lookup.get(name) {
            Some(&slot) => self.named[slot].1 = value,
            None => {
                self.lookup.insert(name.to_string(), self.named.len());
                self.named.push((name.to_string(), value));
            }
        }
    }

    /// Whether a property exists
    pub fn contains(&self, name: &str) -> bool {
        match parse_index(name) {
            Some(i) => self.indexed.contains_key(&i),
            None => self.lookup.contains_key(name),
        }
    }

    /// Keys: index keys ascending, then names in insertion order
    pub fn keys(&self) -> Vec<PropertyKey> {
        self.indexed
            .keys()
            .map(|&i| PropertyKey::Index(i))
            .chain(self.named.iter().map(|(n, _)| PropertyKey::Name(n.clone())))
            .collect()
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.indexed.len() + self.named.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn trace(&self, out: &mut Vec<HeapRef>) {
        out.extend(self.indexed.values().filter_map(|v| v.as_heap_ref()));
        out.extend(self.named.iter().filter_map(|(_, v)| v.as_heap_ref()));
    }
}

/// Canonical array index: decimal digits, no leading zero, below 2^32 - 1.
pub fn parse_index(name: &str) -> Option<u32> {
    if name.is_empty() || name.len() > 10 || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if name.len() > 1 && name.starts_with('0') {
        return None;
    }
    match name.parse::<u64>() {
        Ok(n) if n < u32::MAX as u64 => Some(n as u32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("42"), Some(42));
        assert_eq!(parse_index("042"), None);
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("1.5"), None);
        assert_eq!(parse_index("4294967295"), None);
        assert_eq!(parse_index("x"), None);
        assert_eq!(parse_index(""), None);
    }

    #[test]
    fn test_property_map_order() {
        let mut props = PropertyMap::default();
        props.set("b", ScriptValue::int(1));
        props.set("2", ScriptValue::int(2));
        props.set("a", ScriptValue::int(3));
        props.set("0", ScriptValue::int(4));
        props.set("b", ScriptValue::int(5));

        assert_eq!(
            props.keys(),
            vec![
                PropertyKey::Index(0),
                PropertyKey::Index(2),
                PropertyKey::Name("b".into()),
                PropertyKey::Name("a".into()),
            ]
        );
        assert_eq!(props.get("b"), Some(ScriptValue::int(5)));
        assert_eq!(props.len(), 4);
        assert!(props.contains("2"));
        assert!(!props.contains("c"));
    }

    #[test]
    fn test_trace_collects_heap_refs() {
        let mut obj = ObjectCell::array(2);
        let r = HeapRef::new(3, 1);
        if let Some(elements) = obj.elements.as_mut() {
            elements[1] = ScriptValue::string(r);
        }
        obj.props.set("k", ScriptValue::object(HeapRef::new(4, 0)));
        let cell = HeapCell {
            realm: RealmId(0),
            kind: CellKind::Object(obj),
        };
        let mut out = Vec::new();
        cell.trace(&mut out);
        assert_eq!(out, vec![r, HeapRef::new(4, 0)]);
    }
}
