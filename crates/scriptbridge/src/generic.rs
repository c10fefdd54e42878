//! Generic value conversion
//!
//! Walks arbitrary scripting values into [`TaggedValue`] and back. Arrays
//! become lists, plain objects become string-keyed maps, scalars map to the
//! matching scalar variant. An empty array with named properties is read as
//! a map, which is how maps are emitted under [`MapContainer::Array`].
//! Functions, native-bound objects and nested `null`/`undefined` have no
//! variant and abort the conversion.

use std::collections::{BTreeMap, HashMap};

use scriptbridge_sdk::{
    describe, BridgeError, BridgeResult, PropertyKey, RootScope, ScriptContext, ScriptValue,
    TaggedValue,
};

use crate::options::{BridgeOptions, MapContainer};
use crate::proxy::ProxyTable;
use crate::report::reported;
use crate::string::TransientString;

/// Converter between scripting values and [`TaggedValue`].
///
/// Holds no scratch state; one converter may be used for any number of
/// conversions, including reentrant ones.
pub struct TaggedConverter<'a> {
    ctx: &'a dyn ScriptContext,
    options: &'a BridgeOptions,
    proxies: Option<&'a ProxyTable>,
}

impl<'a> TaggedConverter<'a> {
    /// Converter with the given options and no identity table
    pub fn new(ctx: &'a dyn ScriptContext, options: &'a BridgeOptions) -> Self {
        Self {
            ctx,
            options,
            proxies: None,
        }
    }

    /// Also reject objects registered in `proxies` as native-bound
    pub fn with_proxies(mut self, proxies: &'a ProxyTable) -> Self {
        self.proxies = Some(proxies);
        self
    }

    // ========================================================================
    // Scripting -> native
    // ========================================================================

    /// Convert any supported value. A top-level `null`/`undefined` gives an
    /// empty map.
    pub fn to_tagged(&self, value: ScriptValue) -> BridgeResult<TaggedValue> {
        if value.is_nullish() {
            return Ok(TaggedValue::empty_map());
        }
        reported(self.ctx, "value", self.convert(value, 0))
    }

    /// Convert an object's string-keyed properties. `null`/`undefined` gives
    /// an empty map.
    pub fn to_tagged_map(&self, value: ScriptValue) -> BridgeResult<TaggedValue> {
        if value.is_nullish() {
            return Ok(TaggedValue::empty_map());
        }
        let result = self
            .require_container(value)
            .and_then(|_| self.convert_map(value, 0))
            .map(TaggedValue::Map);
        reported(self.ctx, "map", result)
    }

    /// Convert an object's integer-keyed properties. `null`/`undefined` gives
    /// an empty map.
    pub fn to_tagged_int_map(&self, value: ScriptValue) -> BridgeResult<TaggedValue> {
        if value.is_nullish() {
            return Ok(TaggedValue::IntKeyMap(BTreeMap::new()));
        }
        let result = self
            .require_container(value)
            .and_then(|_| self.convert_int_map(value, 0))
            .map(TaggedValue::IntKeyMap);
        reported(self.ctx, "int-key map", result)
    }

    /// Convert an array
    pub fn to_tagged_list(&self, value: ScriptValue) -> BridgeResult<TaggedValue> {
        let result = if self.ctx.is_array(value) {
            self.convert_list(value, 0).map(TaggedValue::List)
        } else {
            Err(BridgeError::type_mismatch("array", describe(self.ctx, value)))
        };
        reported(self.ctx, "list", result)
    }

    /// Convert a variadic argument list into one list
    pub fn args_to_tagged(&self, args: &[ScriptValue]) -> BridgeResult<TaggedValue> {
        let result = args
            .iter()
            .map(|arg| self.convert(*arg, 0))
            .collect::<BridgeResult<Vec<_>>>()
            .map(TaggedValue::List);
        reported(self.ctx, "arguments", result)
    }

    fn require_container(&self, value: ScriptValue) -> BridgeResult<()> {
        if !value.is_object() || self.ctx.is_function(value) {
            return Err(BridgeError::type_mismatch("object", describe(self.ctx, value)));
        }
        self.reject_native_bound(value)
    }

    fn reject_native_bound(&self, value: ScriptValue) -> BridgeResult<()> {
        let bound = self
            .proxies
            .is_some_and(|p| p.lookup_object(value).is_some())
            || self.ctx.object_class(value)?.is_some();
        if bound {
            return Err(unsupported("native-bound object"));
        }
        Ok(())
    }

    fn enter(&self, depth: usize) -> BridgeResult<usize> {
        if depth >= self.options.max_depth {
            return Err(BridgeError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }
        Ok(depth + 1)
    }

    fn convert(&self, value: ScriptValue, depth: usize) -> BridgeResult<TaggedValue> {
        if let Some(b) = value.as_bool() {
            return Ok(TaggedValue::Bool(b));
        }
        if let Some(i) = value.as_int() {
            return Ok(TaggedValue::Int(i));
        }
        if let Some(d) = value.as_double() {
            return Ok(TaggedValue::Double(d));
        }
        if value.is_string() {
            let view = TransientString::from_handle(self.ctx, value)?;
            return Ok(TaggedValue::String(view.as_str().to_owned()));
        }
        if value.is_nullish() {
            return Err(unsupported(value.type_name()));
        }
        if self.ctx.is_function(value) {
            return Err(unsupported("function"));
        }
        self.reject_native_bound(value)?;

        if self.ctx.is_array(value) {
            if self.has_named_keys(value)? {
                tracing::trace!(depth, "converting array used as a map");
                return self.convert_map(value, depth).map(TaggedValue::Map);
            }
            tracing::trace!(depth, "converting array");
            self.convert_list(value, depth).map(TaggedValue::List)
        } else {
            tracing::trace!(depth, "converting object");
            self.convert_map(value, depth).map(TaggedValue::Map)
        }
    }

    /// An array carrying named properties is a map container when it has no
    /// elements. With elements either reading would drop data, so it is
    /// rejected.
    fn has_named_keys(&self, array: ScriptValue) -> BridgeResult<bool> {
        let named = self
            .ctx
            .own_property_keys(array)?
            .iter()
            .any(|key| matches!(key, PropertyKey::Name(_)));
        if named && self.ctx.array_len(array)? > 0 {
            return Err(unsupported("array with named properties"));
        }
        Ok(named)
    }

    fn convert_list(&self, array: ScriptValue, depth: usize) -> BridgeResult<Vec<TaggedValue>> {
        let child = self.enter(depth)?;
        let len = self.ctx.array_len(array)?;
        let mut items = Vec::with_capacity(len as usize);
        for i in 0..len {
            let element = self.ctx.array_get(array, i)?;
            items.push(self.convert(element, child)?);
        }
        Ok(items)
    }

    fn convert_map(
        &self,
        object: ScriptValue,
        depth: usize,
    ) -> BridgeResult<HashMap<String, TaggedValue>> {
        let child = self.enter(depth)?;
        let mut map = HashMap::new();
        for key in self.ctx.own_property_keys(object)? {
            let PropertyKey::Name(name) = key else {
                continue;
            };
            let element = self.ctx.get_property(object, &name)?;
            let converted = self.convert(element, child)?;
            map.insert(name, converted);
        }
        Ok(map)
    }

    fn convert_int_map(
        &self,
        object: ScriptValue,
        depth: usize,
    ) -> BridgeResult<BTreeMap<i32, TaggedValue>> {
        let child = self.enter(depth)?;
        let is_array = self.ctx.is_array(object);
        let mut map = BTreeMap::new();
        for key in self.ctx.own_property_keys(object)? {
            let index = match &key {
                PropertyKey::Index(i) => i32::try_from(*i).ok(),
                PropertyKey::Name(name) => name.parse::<i32>().ok(),
            };
            let Some(index) = index else {
                tracing::trace!(key = %key.to_key_string(), "skipping non-integer key");
                continue;
            };
            let element = self.ctx.get_property(object, &key.to_key_string())?;
            // Array holes
            if is_array && element.is_undefined() {
                continue;
            }
            map.insert(index, self.convert(element, child)?);
        }
        Ok(map)
    }

    // ========================================================================
    // Native -> scripting
    // ========================================================================

    /// Build the scripting value for a tagged value
    pub fn from_tagged(&self, value: &TaggedValue) -> BridgeResult<ScriptValue> {
        self.emit(value, 0)
    }

    /// Build a map container from string-keyed entries
    pub fn from_tagged_map(&self, map: &HashMap<String, TaggedValue>) -> BridgeResult<ScriptValue> {
        self.emit_map(map, 0)
    }

    /// Build a map container from integer-keyed entries, assigned in
    /// ascending key order
    pub fn from_tagged_int_map(&self, map: &BTreeMap<i32, TaggedValue>) -> BridgeResult<ScriptValue> {
        self.emit_int_map(map, 0)
    }

    /// Build an array
    pub fn from_tagged_list(&self, items: &[TaggedValue]) -> BridgeResult<ScriptValue> {
        self.emit_list(items, 0)
    }

    fn emit(&self, value: &TaggedValue, depth: usize) -> BridgeResult<ScriptValue> {
        match value {
            TaggedValue::Bool(b) => Ok(ScriptValue::bool(*b)),
            TaggedValue::Int(i) => Ok(ScriptValue::int(*i)),
            TaggedValue::Double(d) => Ok(ScriptValue::double(*d)),
            TaggedValue::String(s) => self.ctx.create_string(s),
            TaggedValue::List(items) => self.emit_list(items, depth),
            TaggedValue::Map(map) => self.emit_map(map, depth),
            TaggedValue::IntKeyMap(map) => self.emit_int_map(map, depth),
        }
    }

    fn emit_list(&self, items: &[TaggedValue], depth: usize) -> BridgeResult<ScriptValue> {
        let child = self.enter(depth)?;
        let len = u32::try_from(items.len()).map_err(|_| {
            BridgeError::AllocationFailure(format!("list of {} elements", items.len()))
        })?;
        let mut roots = RootScope::new(self.ctx);
        let array = roots.root(self.ctx.create_array(len)?);
        for (i, item) in (0..len).zip(items) {
            let element = self.emit(item, child)?;
            self.ctx.array_set(array, i, element)?;
        }
        Ok(array)
    }

    fn new_map_container<'k>(
        &self,
        mut keys: impl Iterator<Item = &'k str>,
    ) -> BridgeResult<ScriptValue> {
        match self.options.map_container {
            MapContainer::Array if keys.any(is_array_slot) => {
                tracing::debug!("map key collides with an array slot, using an object");
                self.ctx.create_object(None)
            }
            MapContainer::Array => self.ctx.create_array(0),
            MapContainer::Object => self.ctx.create_object(None),
        }
    }

    fn emit_map(&self, map: &HashMap<String, TaggedValue>, depth: usize) -> BridgeResult<ScriptValue> {
        let child = self.enter(depth)?;
        let mut roots = RootScope::new(self.ctx);
        let container = roots.root(self.new_map_container(map.keys().map(String::as_str))?);
        for (key, item) in map {
            let element = self.emit(item, child)?;
            self.ctx.set_property(container, key, element)?;
        }
        Ok(container)
    }

    fn emit_int_map(&self, map: &BTreeMap<i32, TaggedValue>, depth: usize) -> BridgeResult<ScriptValue> {
        let child = self.enter(depth)?;
        let mut roots = RootScope::new(self.ctx);
        let container = roots.root(self.new_map_container(std::iter::empty())?);
        for (key, item) in map {
            let element = self.emit(item, child)?;
            self.ctx.set_property(container, &key.to_string(), element)?;
        }
        Ok(container)
    }
}

/// Whether setting `key` on an array would change its elements or length
/// instead of adding a named property.
fn is_array_slot(key: &str) -> bool {
    key == "length"
        || key
            .parse::<u32>()
            .is_ok_and(|i| i != u32::MAX && i.to_string() == key)
}

fn unsupported(kind: &str) -> BridgeError {
    tracing::warn!(kind, "value has no tagged representation");
    BridgeError::unsupported(kind)
}

/// [`TaggedConverter::to_tagged`] with default options
pub fn to_tagged(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<TaggedValue> {
    TaggedConverter::new(ctx, &BridgeOptions::default()).to_tagged(value)
}

/// [`TaggedConverter::from_tagged`] with default options
pub fn from_tagged(ctx: &dyn ScriptContext, value: &TaggedValue) -> BridgeResult<ScriptValue> {
    TaggedConverter::new(ctx, &BridgeOptions::default()).from_tagged(value)
}
