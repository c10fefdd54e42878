//! Wrapper types for scripting arrays and objects
//!
//! These types give typed, named access to scripting containers through the
//! `ScriptContext` trait, without depending on engine internals.

use crate::context::{PropertyKey, ScriptContext};
use crate::convert::{coerce_to_string, number_not_nan};
use crate::error::{BridgeError, BridgeResult};
use crate::value::ScriptValue;

// ============================================================================
// RootScope
// ============================================================================

/// Values kept rooted until the scope is dropped.
///
/// Any allocation may run a collection, so a container under construction
/// must stay rooted until it is handed back to the caller.
pub struct RootScope<'a> {
    ctx: &'a dyn ScriptContext,
    rooted: Vec<ScriptValue>,
}

impl<'a> RootScope<'a> {
    /// Empty scope
    pub fn new(ctx: &'a dyn ScriptContext) -> Self {
        Self {
            ctx,
            rooted: Vec::new(),
        }
    }

    /// Root `value` for the rest of the scope and return it
    pub fn root(&mut self, value: ScriptValue) -> ScriptValue {
        if value.as_heap_ref().is_some() {
            self.ctx.root_value(value);
            self.rooted.push(value);
        }
        value
    }

    /// Number of heap values held
    pub fn len(&self) -> usize {
        self.rooted.len()
    }

    /// Whether the scope holds nothing
    pub fn is_empty(&self) -> bool {
        self.rooted.is_empty()
    }

    /// The context values are rooted in
    pub fn context(&self) -> &'a dyn ScriptContext {
        self.ctx
    }
}

impl Drop for RootScope<'_> {
    fn drop(&mut self) {
        for value in self.rooted.drain(..).rev() {
            self.ctx.unroot_value(value);
        }
    }
}

// ============================================================================
// ScriptArray
// ============================================================================

/// Wrapper for a scripting array with typed element access.
pub struct ScriptArray<'a> {
    value: ScriptValue,
    ctx: &'a dyn ScriptContext,
}

impl<'a> ScriptArray<'a> {
    /// Wrap a value as an array. Fails unless the engine reports an array.
    pub fn wrap(ctx: &'a dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        if !value.is_object() || !ctx.is_array(value) {
            return Err(BridgeError::type_mismatch("array", describe(ctx, value)));
        }
        Ok(Self { value, ctx })
    }

    /// Allocate a new array of `len` undefined elements
    pub fn new(ctx: &'a dyn ScriptContext, len: u32) -> BridgeResult<Self> {
        let value = ctx.create_array(len)?;
        Ok(Self { value, ctx })
    }

    /// Allocate a new array rooted by `roots`
    pub fn new_in(roots: &mut RootScope<'a>, len: u32) -> BridgeResult<Self> {
        let array = Self::new(roots.context(), len)?;
        roots.root(array.value);
        Ok(array)
    }

    /// Allocate an array holding `items`. The items stay rooted while the
    /// array is allocated.
    pub fn from_values(ctx: &'a dyn ScriptContext, items: &[ScriptValue]) -> BridgeResult<Self> {
        let mut roots = RootScope::new(ctx);
        for item in items {
            roots.root(*item);
        }
        let array = Self::new(ctx, items.len() as u32)?;
        for (i, item) in items.iter().enumerate() {
            array.set(i as u32, *item)?;
        }
        Ok(array)
    }

    /// Get array length
    pub fn len(&self) -> BridgeResult<u32> {
        self.ctx.array_len(self.value)
    }

    /// Check if array is empty
    pub fn is_empty(&self) -> BridgeResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Get element at index
    pub fn get(&self, index: u32) -> BridgeResult<ScriptValue> {
        self.ctx.array_get(self.value, index)
    }

    /// Set element at index
    pub fn set(&self, index: u32, value: ScriptValue) -> BridgeResult<()> {
        self.ctx.array_set(self.value, index, value)
    }

    /// Get element as a number; NaN is rejected
    pub fn get_number(&self, index: u32) -> BridgeResult<f64> {
        let v = self.get(index)?;
        number_not_nan(self.ctx, v)
    }

    /// Collect all elements
    pub fn to_vec(&self) -> BridgeResult<Vec<ScriptValue>> {
        let len = self.len()?;
        let mut result = Vec::with_capacity(len as usize);
        for i in 0..len {
            result.push(self.get(i)?);
        }
        Ok(result)
    }

    /// Get the underlying value
    pub fn into_value(self) -> ScriptValue {
        self.value
    }

    /// Get the underlying value without consuming the wrapper
    pub fn value(&self) -> ScriptValue {
        self.value
    }
}

// ============================================================================
// ScriptObject
// ============================================================================

/// Wrapper for a scripting object with named property access.
///
/// Number getters distinguish an absent property
/// ([`BridgeError::PropertyMissing`]) from one that does not coerce
/// ([`BridgeError::NotCoercible`]).
pub struct ScriptObject<'a> {
    value: ScriptValue,
    ctx: &'a dyn ScriptContext,
}

impl<'a> ScriptObject<'a> {
    /// Wrap a value as an object. Fails for primitives, null and undefined.
    pub fn wrap(ctx: &'a dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        if !value.is_object() {
            return Err(BridgeError::type_mismatch("object", value.type_name()));
        }
        Ok(Self { value, ctx })
    }

    /// Allocate a new plain object
    pub fn new(ctx: &'a dyn ScriptContext) -> BridgeResult<Self> {
        let value = ctx.create_object(None)?;
        Ok(Self { value, ctx })
    }

    /// Allocate a new plain object rooted by `roots`
    pub fn new_in(roots: &mut RootScope<'a>) -> BridgeResult<Self> {
        let obj = Self::new(roots.context())?;
        roots.root(obj.value);
        Ok(obj)
    }

    /// Get a property (`undefined` when absent)
    pub fn get(&self, name: &str) -> BridgeResult<ScriptValue> {
        self.ctx.get_property(self.value, name)
    }

    /// Get a property, `None` when it reads as `undefined`
    pub fn get_optional(&self, name: &str) -> BridgeResult<Option<ScriptValue>> {
        let v = self.get(name)?;
        Ok(if v.is_undefined() { None } else { Some(v) })
    }

    /// Get a property that must be present
    pub fn get_required(&self, name: &str) -> BridgeResult<ScriptValue> {
        self.get_optional(name)?
            .ok_or_else(|| BridgeError::missing(name))
    }

    /// Required numeric property; NaN is accepted
    pub fn get_number(&self, name: &str) -> BridgeResult<f64> {
        let v = self.get_required(name)?;
        self.ctx.to_number(v).map_err(|e| not_coercible(name, e))
    }

    /// Required numeric property; NaN is rejected
    pub fn get_number_strict(&self, name: &str) -> BridgeResult<f64> {
        let n = self.get_number(name)?;
        if n.is_nan() {
            return Err(BridgeError::NotCoercible {
                property: name.to_string(),
                reason: "value is NaN".to_string(),
            });
        }
        Ok(n)
    }

    /// Optional numeric property; NaN is rejected when present
    pub fn get_optional_number(&self, name: &str) -> BridgeResult<Option<f64>> {
        if self.get_optional(name)?.is_none() {
            return Ok(None);
        }
        self.get_number_strict(name).map(Some)
    }

    /// Required property coerced with ToBoolean
    pub fn get_bool(&self, name: &str) -> BridgeResult<bool> {
        let v = self.get_required(name)?;
        Ok(self.ctx.to_boolean(v))
    }

    /// Required property coerced with ToString
    pub fn get_string(&self, name: &str) -> BridgeResult<String> {
        let v = self.get_required(name)?;
        coerce_to_string(self.ctx, v).map_err(|e| not_coercible(name, e))
    }

    /// Whether the object has an own property with this name
    pub fn has(&self, name: &str) -> BridgeResult<bool> {
        self.ctx.has_property(self.value, name)
    }

    /// Own enumerable keys
    pub fn keys(&self) -> BridgeResult<Vec<PropertyKey>> {
        self.ctx.own_property_keys(self.value)
    }

    /// Set a property
    pub fn set(&self, name: &str, value: ScriptValue) -> BridgeResult<()> {
        self.ctx.set_property(self.value, name, value)
    }

    /// Set a numeric property, using the int encoding for integral values
    pub fn set_number(&self, name: &str, n: f64) -> BridgeResult<()> {
        self.set(name, ScriptValue::number(n))
    }

    /// Set an int32 property
    pub fn set_int(&self, name: &str, i: i32) -> BridgeResult<()> {
        self.set(name, ScriptValue::int(i))
    }

    /// Set a boolean property
    pub fn set_bool(&self, name: &str, b: bool) -> BridgeResult<()> {
        self.set(name, ScriptValue::bool(b))
    }

    /// Set a string property
    pub fn set_string(&self, name: &str, s: &str) -> BridgeResult<()> {
        let v = self.ctx.create_string(s)?;
        self.set(name, v)
    }

    /// Get the underlying value
    pub fn into_value(self) -> ScriptValue {
        self.value
    }

    /// Get the underlying value without consuming the wrapper
    pub fn value(&self) -> ScriptValue {
        self.value
    }

    /// Get a reference to the context
    pub fn context(&self) -> &'a dyn ScriptContext {
        self.ctx
    }
}

fn not_coercible(name: &str, err: BridgeError) -> BridgeError {
    BridgeError::NotCoercible {
        property: name.to_string(),
        reason: err.to_string(),
    }
}

/// Type name that distinguishes arrays and functions from plain objects.
pub fn describe(ctx: &dyn ScriptContext, value: ScriptValue) -> &'static str {
    if value.is_object() {
        if ctx.is_array(value) {
            return "array";
        }
        if ctx.is_function(value) {
            return "function";
        }
    }
    value.type_name()
}
