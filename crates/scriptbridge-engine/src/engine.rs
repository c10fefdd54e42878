//! Engine - the concrete `ScriptContext`
//!
//! All state sits behind one `parking_lot::Mutex`. The lock is never held
//! while a native function body runs, so bodies can call back into the
//! engine through the context they receive.

use parking_lot::Mutex;
use std::sync::Arc;

use scriptbridge_sdk::{
    BridgeError, BridgeResult, ClassId, ClassInfo, EncodedUtf8, HeapRef, PropertyKey, RealmId,
    ScriptContext, ScriptValue,
};

use crate::coerce::{number_to_string, string_to_number};
use crate::defaults::{DEFAULT_GC_THRESHOLD, DEFAULT_MAX_ARRAY_LENGTH, DEFAULT_REALM_NAME};
use crate::gc::{Collector, GcStats, ReferenceEdges, RootSet};
use crate::heap::Heap;
use crate::object::{parse_index, CellKind, FunctionCell, HeapCell, ObjectCell, PropertyMap};
use crate::realm::RealmRegistry;
use crate::utf8::Utf8Ledger;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Live-cell count that triggers collection on allocation (0 = never)
    pub gc_threshold: usize,
    /// Largest array length that may be allocated or grown to
    pub max_array_length: u32,
    /// Name of the initial realm
    pub realm_name: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            gc_threshold: DEFAULT_GC_THRESHOLD,
            max_array_length: DEFAULT_MAX_ARRAY_LENGTH,
            realm_name: DEFAULT_REALM_NAME.to_string(),
        }
    }
}

struct EngineState {
    heap: Heap,
    roots: RootSet,
    edges: ReferenceEdges,
    collector: Collector,
    realms: RealmRegistry,
    current_realm: RealmId,
    classes: Vec<ClassInfo>,
    utf8: Utf8Ledger,
    reported_errors: Vec<String>,
    finalizing: bool,
}

/// In-process scripting engine.
pub struct Engine {
    options: EngineOptions,
    state: Mutex<EngineState>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with default options
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Create an engine with the given options
    pub fn with_options(options: EngineOptions) -> Self {
        let realms = RealmRegistry::new(&options.realm_name);
        let current_realm = realms.initial();
        Self {
            state: Mutex::new(EngineState {
                heap: Heap::new(),
                roots: RootSet::new(),
                edges: ReferenceEdges::new(),
                collector: Collector::new(),
                realms,
                current_realm,
                classes: Vec::new(),
                utf8: Utf8Ledger::default(),
                reported_errors: Vec::new(),
                finalizing: false,
            }),
            options,
        }
    }

    /// Engine options
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    // ========================================================================
    // Functions, classes and realms
    // ========================================================================

    /// Create a native function in the current realm
    pub fn create_function<F>(&self, name: &str, body: F) -> BridgeResult<ScriptValue>
    where
        F: Fn(&dyn ScriptContext, ScriptValue, &[ScriptValue]) -> BridgeResult<ScriptValue>
            + Send
            + Sync
            + 'static,
    {
        let mut state = self.state.lock();
        let r = state.allocate(
            CellKind::Function(FunctionCell {
                name: name.to_string(),
                body: Arc::new(body),
                props: PropertyMap::default(),
            }),
            self.options.gc_threshold,
        );
        Ok(ScriptValue::object(r))
    }

    /// Register a class usable with `create_object`
    pub fn register_class(&self, name: &str) -> ClassId {
        let mut state = self.state.lock();
        let id = ClassId(state.classes.len() as u32);
        state.classes.push(ClassInfo {
            id,
            name: name.to_string(),
        });
        id
    }

    /// Register a new realm
    pub fn create_realm(&self, name: &str) -> RealmId {
        self.state.lock().realms.create(name)
    }

    // ========================================================================
    // Rooting and collection
    // ========================================================================

    /// Keep a value alive across collections
    pub fn root(&self, value: ScriptValue) {
        self.state.lock().roots.add(value);
    }

    /// Undo one `root` call. Returns false if the value was not rooted.
    pub fn unroot(&self, value: ScriptValue) -> bool {
        self.state.lock().roots.remove(value)
    }

    /// Run a full collection. Returns the number of cells freed.
    pub fn collect_garbage(&self) -> usize {
        self.state.lock().collect()
    }

    /// Collector statistics
    pub fn gc_stats(&self) -> GcStats {
        self.state.lock().collector.stats().clone()
    }

    /// Number of live heap cells
    pub fn live_cells(&self) -> usize {
        self.state.lock().heap.live_count()
    }

    /// How many times the edge `owner -> target` is registered
    pub fn reference_edge_count(&self, owner: ScriptValue, target: ScriptValue) -> usize {
        match (owner.as_heap_ref(), target.as_heap_ref()) {
            (Some(o), Some(t)) => self.state.lock().edges.count(o, t),
            _ => 0,
        }
    }

    /// Whether the edge `owner -> target` is registered at least once
    pub fn has_reference_edge(&self, owner: ScriptValue, target: ScriptValue) -> bool {
        self.reference_edge_count(owner, target) > 0
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Enter the finalization phase
    pub fn begin_teardown(&self) {
        tracing::debug!("engine teardown started");
        self.state.lock().finalizing = true;
    }

    /// Drop every root and edge, collect everything, leave finalization
    pub fn end_teardown(&self) -> usize {
        let mut state = self.state.lock();
        state.roots.clear();
        state.edges.clear();
        let freed = state.collect();
        state.finalizing = false;
        tracing::debug!(freed, "engine teardown finished");
        freed
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// UTF-8 buffers encoded but not yet released
    pub fn outstanding_utf8(&self) -> usize {
        self.state.lock().utf8.outstanding()
    }

    /// UTF-8 buffers ever encoded
    pub fn utf8_allocations(&self) -> u64 {
        self.state.lock().utf8.allocated()
    }

    /// Releases of buffers that were not outstanding
    pub fn utf8_double_frees(&self) -> u64 {
        self.state.lock().utf8.double_frees()
    }

    /// Drain the errors reported through `report_error`
    pub fn take_reported_errors(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().reported_errors)
    }

    /// Read a string value directly, without going through the UTF-8 ledger
    pub fn read_string(&self, value: ScriptValue) -> BridgeResult<String> {
        let state = self.state.lock();
        state.string(value).map(str::to_string)
    }
}

impl EngineState {
    fn allocate(&mut self, kind: CellKind, gc_threshold: usize) -> HeapRef {
        if gc_threshold > 0 && self.heap.live_count() >= gc_threshold {
            self.collect();
        }
        let realm = self.current_realm;
        self.heap.allocate(HeapCell { realm, kind })
    }

    fn collect(&mut self) -> usize {
        self.collector
            .collect(&mut self.heap, &self.roots, &mut self.edges)
    }

    fn cell(&self, value: ScriptValue) -> BridgeResult<&HeapCell> {
        let r = value
            .as_heap_ref()
            .ok_or_else(|| BridgeError::type_mismatch("object", value.type_name()))?;
        self.heap.get(r).ok_or(BridgeError::StaleHandle)
    }

    fn cell_mut(&mut self, value: ScriptValue) -> BridgeResult<&mut HeapCell> {
        let r = value
            .as_heap_ref()
            .ok_or_else(|| BridgeError::type_mismatch("object", value.type_name()))?;
        self.heap.get_mut(r).ok_or(BridgeError::StaleHandle)
    }

    fn string(&self, value: ScriptValue) -> BridgeResult<&str> {
        if !value.is_string() {
            return Err(BridgeError::type_mismatch("string", value.type_name()));
        }
        match &self.cell(value)?.kind {
            CellKind::String(s) => Ok(s),
            _ => Err(BridgeError::type_mismatch("string", "object")),
        }
    }

    fn object(&self, value: ScriptValue) -> BridgeResult<&ObjectCell> {
        if !value.is_object() {
            return Err(BridgeError::type_mismatch("object", value.type_name()));
        }
        match &self.cell(value)?.kind {
            CellKind::Object(obj) => Ok(obj),
            CellKind::Function(_) => Err(BridgeError::type_mismatch("object", "function")),
            CellKind::String(_) => Err(BridgeError::type_mismatch("object", "string")),
        }
    }

    fn array(&self, value: ScriptValue) -> BridgeResult<&Vec<ScriptValue>> {
        self.object(value)?
            .elements
            .as_ref()
            .ok_or_else(|| BridgeError::type_mismatch("array", "object"))
    }

    fn array_mut(&mut self, value: ScriptValue) -> BridgeResult<&mut Vec<ScriptValue>> {
        match &mut self.cell_mut(value)?.kind {
            CellKind::Object(ObjectCell {
                elements: Some(elements),
                ..
            }) => Ok(elements),
            _ => Err(BridgeError::type_mismatch("array", value.type_name())),
        }
    }

    fn stringify(&self, value: ScriptValue, visiting: &mut Vec<HeapRef>) -> BridgeResult<String> {
        if let Some(b) = value.as_bool() {
            return Ok(b.to_string());
        }
        if let Some(n) = value.as_number() {
            return Ok(number_to_string(n));
        }
        if value.is_undefined() {
            return Ok("undefined".to_string());
        }
        if value.is_null() {
            return Ok("null".to_string());
        }
        if value.is_string() {
            return self.string(value).map(str::to_string);
        }
        let r = value
            .as_object_ref()
            .ok_or_else(|| BridgeError::type_mismatch("value", value.type_name()))?;
        match &self.cell(value)?.kind {
            CellKind::Function(f) => Ok(format!("function {}() {{ [native code] }}", f.name)),
            CellKind::Object(ObjectCell {
                elements: Some(elements),
                ..
            }) => {
                if visiting.contains(&r) {
                    return Ok(String::new());
                }
                visiting.push(r);
                let mut parts = Vec::with_capacity(elements.len());
                for element in elements {
                    if element.is_nullish() {
                        parts.push(String::new());
                    } else {
                        parts.push(self.stringify(*element, visiting)?);
                    }
                }
                visiting.pop();
                Ok(parts.join(","))
            }
            CellKind::Object(_) => Ok("[object Object]".to_string()),
            CellKind::String(s) => Ok(s.to_string()),
        }
    }

    fn numeric(&self, value: ScriptValue) -> BridgeResult<f64> {
        if let Some(n) = value.as_number() {
            return Ok(n);
        }
        if let Some(b) = value.as_bool() {
            return Ok(if b { 1.0 } else { 0.0 });
        }
        if value.is_undefined() {
            return Ok(f64::NAN);
        }
        if value.is_null() {
            return Ok(0.0);
        }
        if value.is_string() {
            return Ok(string_to_number(self.string(value)?));
        }
        match &self.cell(value)?.kind {
            CellKind::Object(obj) if obj.is_array() => {
                Ok(string_to_number(&self.stringify(value, &mut Vec::new())?))
            }
            _ => Ok(f64::NAN),
        }
    }
}

impl ScriptContext for Engine {
    // ========================================================================
    // Value Creation
    // ========================================================================

    fn create_string(&self, s: &str) -> BridgeResult<ScriptValue> {
        let mut state = self.state.lock();
        let r = state.allocate(CellKind::String(s.into()), self.options.gc_threshold);
        Ok(ScriptValue::string(r))
    }

    fn create_object(&self, class: Option<ClassId>) -> BridgeResult<ScriptValue> {
        let mut state = self.state.lock();
        if let Some(id) = class {
            if id.0 as usize >= state.classes.len() {
                return Err(BridgeError::Engine(format!("Class {} not found", id.0)));
            }
        }
        let r = state.allocate(
            CellKind::Object(ObjectCell::plain(class)),
            self.options.gc_threshold,
        );
        Ok(ScriptValue::object(r))
    }

    fn create_array(&self, len: u32) -> BridgeResult<ScriptValue> {
        if len > self.options.max_array_length {
            return Err(BridgeError::AllocationFailure(format!(
                "array length {} exceeds limit {}",
                len, self.options.max_array_length
            )));
        }
        let mut state = self.state.lock();
        let r = state.allocate(
            CellKind::Object(ObjectCell::array(len as usize)),
            self.options.gc_threshold,
        );
        Ok(ScriptValue::object(r))
    }

    // ========================================================================
    // Type Tests
    // ========================================================================

    fn is_array(&self, value: ScriptValue) -> bool {
        let state = self.state.lock();
        state.object(value).map(ObjectCell::is_array).unwrap_or(false)
    }

    fn is_function(&self, value: ScriptValue) -> bool {
        if !value.is_object() {
            return false;
        }
        let state = self.state.lock();
        let is_function = matches!(state.cell(value).map(|c| &c.kind), Ok(CellKind::Function(_)));
        is_function
    }

    fn is_live(&self, value: ScriptValue) -> bool {
        match value.as_heap_ref() {
            Some(r) => self.state.lock().heap.is_live(r),
            None => true,
        }
    }

    fn object_class(&self, value: ScriptValue) -> BridgeResult<Option<ClassId>> {
        let state = self.state.lock();
        let cell = state.cell(value)?;
        match &cell.kind {
            CellKind::Object(obj) => Ok(obj.class),
            CellKind::Function(_) => Ok(None),
            CellKind::String(_) => Err(BridgeError::type_mismatch("object", "string")),
        }
    }

    fn class_info(&self, class: ClassId) -> BridgeResult<ClassInfo> {
        let state = self.state.lock();
        state
            .classes
            .get(class.0 as usize)
            .cloned()
            .ok_or_else(|| BridgeError::Engine(format!("Class {} not found", class.0)))
    }

    // ========================================================================
    // Strings
    // ========================================================================

    fn encode_utf8(&self, value: ScriptValue) -> BridgeResult<EncodedUtf8> {
        let mut state = self.state.lock();
        let text = state.string(value)?.to_string();
        let id = state.utf8.allocate();
        tracing::trace!(id, len = text.len(), "utf8 buffer encoded");
        Ok(EncodedUtf8::new(id, text))
    }

    fn release_utf8(&self, buffer: EncodedUtf8) {
        let mut state = self.state.lock();
        if !state.utf8.release(buffer.id()) {
            tracing::warn!(id = buffer.id(), "release of utf8 buffer that is not outstanding");
        }
    }

    // ========================================================================
    // Coercion
    // ========================================================================

    fn to_js_string(&self, value: ScriptValue) -> BridgeResult<ScriptValue> {
        if value.is_string() {
            return Ok(value);
        }
        let mut state = self.state.lock();
        let text = state.stringify(value, &mut Vec::new())?;
        let r = state.allocate(CellKind::String(text.into()), self.options.gc_threshold);
        Ok(ScriptValue::string(r))
    }

    fn to_number(&self, value: ScriptValue) -> BridgeResult<f64> {
        if let Some(n) = value.as_number() {
            return Ok(n);
        }
        self.state.lock().numeric(value)
    }

    fn to_boolean(&self, value: ScriptValue) -> bool {
        if let Some(b) = value.as_bool() {
            return b;
        }
        if let Some(n) = value.as_number() {
            return n != 0.0 && !n.is_nan();
        }
        if value.is_nullish() {
            return false;
        }
        if value.is_string() {
            let state = self.state.lock();
            return state.string(value).map(|s| !s.is_empty()).unwrap_or(false);
        }
        true
    }

    // ========================================================================
    // Object Operations
    // ========================================================================

    fn get_property(&self, object: ScriptValue, name: &str) -> BridgeResult<ScriptValue> {
        if !object.is_object() {
            return Err(BridgeError::type_mismatch("object", object.type_name()));
        }
        let state = self.state.lock();
        let cell = state.cell(object)?;
        if let CellKind::Object(ObjectCell {
            elements: Some(elements),
            ..
        }) = &cell.kind
        {
            if name == "length" {
                return Ok(ScriptValue::number(elements.len() as f64));
            }
            if let Some(i) = parse_index(name) {
                return Ok(elements
                    .get(i as usize)
                    .copied()
                    .unwrap_or_else(ScriptValue::undefined));
            }
        }
        Ok(cell
            .props()
            .and_then(|p| p.get(name))
            .unwrap_or_else(ScriptValue::undefined))
    }

    fn set_property(
        &self,
        object: ScriptValue,
        name: &str,
        value: ScriptValue,
    ) -> BridgeResult<()> {
        if !object.is_object() {
            return Err(BridgeError::type_mismatch("object", object.type_name()));
        }
        if self.is_array(object) {
            if let Some(i) = parse_index(name) {
                return self.array_set(object, i, value);
            }
            if name == "length" {
                let len = self.to_number(value)?;
                if len.is_nan() || len < 0.0 || len.fract() != 0.0 {
                    return Err(BridgeError::Engine("Invalid array length".to_string()));
                }
                if len > self.options.max_array_length as f64 {
                    return Err(BridgeError::AllocationFailure(format!(
                        "array length {} exceeds limit {}",
                        len, self.options.max_array_length
                    )));
                }
                let mut state = self.state.lock();
                state
                    .array_mut(object)?
                    .resize(len as usize, ScriptValue::undefined());
                return Ok(());
            }
        }
        let mut state = self.state.lock();
        let props = state
            .cell_mut(object)?
            .props_mut()
            .ok_or_else(|| BridgeError::type_mismatch("object", "string"))?;
        props.set(name, value);
        Ok(())
    }

    fn has_property(&self, object: ScriptValue, name: &str) -> BridgeResult<bool> {
        if !object.is_object() {
            return Err(BridgeError::type_mismatch("object", object.type_name()));
        }
        let state = self.state.lock();
        let cell = state.cell(object)?;
        if let CellKind::Object(ObjectCell {
            elements: Some(elements),
            ..
        }) = &cell.kind
        {
            if name == "length" {
                return Ok(true);
            }
            if let Some(i) = parse_index(name) {
                return Ok((i as usize) < elements.len());
            }
        }
        Ok(cell.props().map(|p| p.contains(name)).unwrap_or(false))
    }

    fn own_property_keys(&self, object: ScriptValue) -> BridgeResult<Vec<PropertyKey>> {
        if !object.is_object() {
            return Err(BridgeError::type_mismatch("object", object.type_name()));
        }
        let state = self.state.lock();
        let cell = state.cell(object)?;
        let mut keys = Vec::new();
        if let CellKind::Object(ObjectCell {
            elements: Some(elements),
            ..
        }) = &cell.kind
        {
            keys.extend((0..elements.len() as u32).map(PropertyKey::Index));
        }
        if let Some(props) = cell.props() {
            keys.extend(props.keys());
        }
        Ok(keys)
    }

    // ========================================================================
    // Array Operations
    // ========================================================================

    fn array_len(&self, array: ScriptValue) -> BridgeResult<u32> {
        let state = self.state.lock();
        Ok(state.array(array)?.len() as u32)
    }

    fn array_get(&self, array: ScriptValue, index: u32) -> BridgeResult<ScriptValue> {
        let state = self.state.lock();
        Ok(state
            .array(array)?
            .get(index as usize)
            .copied()
            .unwrap_or_else(ScriptValue::undefined))
    }

    fn array_set(&self, array: ScriptValue, index: u32, value: ScriptValue) -> BridgeResult<()> {
        if index >= self.options.max_array_length {
            return Err(BridgeError::AllocationFailure(format!(
                "array index {} exceeds limit {}",
                index, self.options.max_array_length
            )));
        }
        let mut state = self.state.lock();
        let elements = state.array_mut(array)?;
        let i = index as usize;
        if i >= elements.len() {
            elements.resize(i + 1, ScriptValue::undefined());
        }
        elements[i] = value;
        Ok(())
    }

    // ========================================================================
    // Function Execution
    // ========================================================================

    fn call_function(
        &self,
        this: ScriptValue,
        function: ScriptValue,
        args: &[ScriptValue],
    ) -> BridgeResult<ScriptValue> {
        let body = {
            let state = self.state.lock();
            if !function.is_object() {
                return Err(BridgeError::type_mismatch("function", function.type_name()));
            }
            let cell = state.cell(function)?;
            let CellKind::Function(f) = &cell.kind else {
                return Err(BridgeError::type_mismatch("function", "object"));
            };
            if cell.realm != state.current_realm {
                return Err(BridgeError::CrossRealm {
                    expected: cell.realm.0,
                    current: state.current_realm.0,
                });
            }
            f.body.clone()
        };
        body(self, this, args)
    }

    // ========================================================================
    // Reachability
    // ========================================================================

    fn root_value(&self, value: ScriptValue) {
        self.root(value);
    }

    fn unroot_value(&self, value: ScriptValue) -> bool {
        self.unroot(value)
    }

    fn add_reference_edge(&self, owner: ScriptValue, target: ScriptValue) -> BridgeResult<()> {
        let owner_ref = owner
            .as_object_ref()
            .ok_or_else(|| BridgeError::type_mismatch("object", owner.type_name()))?;
        let Some(target_ref) = target.as_heap_ref() else {
            return Ok(());
        };
        let mut state = self.state.lock();
        if !state.heap.is_live(owner_ref) || !state.heap.is_live(target_ref) {
            return Err(BridgeError::StaleHandle);
        }
        state.edges.add(owner_ref, target_ref);
        Ok(())
    }

    fn remove_reference_edge(&self, owner: ScriptValue, target: ScriptValue) -> BridgeResult<()> {
        let owner_ref = owner
            .as_object_ref()
            .ok_or_else(|| BridgeError::type_mismatch("object", owner.type_name()))?;
        let Some(target_ref) = target.as_heap_ref() else {
            return Ok(());
        };
        let mut state = self.state.lock();
        if !state.heap.is_live(owner_ref) {
            return Err(BridgeError::StaleHandle);
        }
        if state.edges.remove(owner_ref, target_ref) {
            Ok(())
        } else {
            Err(BridgeError::Engine("No such reference edge".to_string()))
        }
    }

    // ========================================================================
    // Realms
    // ========================================================================

    fn current_realm(&self) -> RealmId {
        self.state.lock().current_realm
    }

    fn realm_of(&self, value: ScriptValue) -> BridgeResult<RealmId> {
        let state = self.state.lock();
        if value.is_heap() {
            Ok(state.cell(value)?.realm)
        } else {
            Ok(state.current_realm)
        }
    }

    fn enter_realm(&self, realm: RealmId) -> RealmId {
        let mut state = self.state.lock();
        let previous = state.current_realm;
        if state.realms.contains(realm) {
            state.current_realm = realm;
        } else {
            tracing::warn!(realm = realm.0, "enter_realm with unknown realm ignored");
        }
        previous
    }

    // ========================================================================
    // Lifecycle and Errors
    // ========================================================================

    fn is_finalizing(&self) -> bool {
        self.state.lock().finalizing
    }

    fn report_error(&self, message: &str) {
        tracing::debug!(message, "script error reported");
        self.state.lock().reported_errors.push(message.to_string());
    }
}
