//! Traits for converting between scripting values and Rust values.
//!
//! `FromScript` extracts a Rust value from a [`ScriptValue`] using the
//! engine's coercion rules; `ToScript` builds a scripting value from a Rust
//! value. Primitive implementations live here; struct conversions live in
//! the bridge crate.
//!
//! # Example
//!
//! ```ignore
//! use scriptbridge_sdk::{FromScript, ScriptContext, ScriptObject, BridgeResult, ScriptValue};
//!
//! struct Pair { a: f64, b: f64 }
//!
//! impl FromScript for Pair {
//!     fn from_script(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
//!         let obj = ScriptObject::wrap(ctx, value)?;
//!         Ok(Pair { a: obj.get_number("a")?, b: obj.get_number("b")? })
//!     }
//! }
//! ```

use crate::context::ScriptContext;
use crate::error::{BridgeError, BridgeResult};
use crate::types::{RootScope, ScriptArray};
use crate::value::ScriptValue;

/// Convert a scripting value into a Rust value.
pub trait FromScript: Sized {
    /// Convert, returning an error if the value cannot be coerced
    fn from_script(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self>;
}

/// Convert a Rust value into a scripting value.
pub trait ToScript {
    /// Convert, allocating in the engine when needed
    fn to_script(&self, ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue>;
}

// ============================================================================
// Coercion helpers
// ============================================================================

/// ToNumber, rejecting NaN.
pub fn number_not_nan(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<f64> {
    let n = ctx.to_number(value)?;
    if n.is_nan() {
        return Err(BridgeError::type_mismatch("number", value.type_name()));
    }
    Ok(n)
}

/// ToString followed by a UTF-8 copy. The engine buffer is released before
/// returning.
pub fn coerce_to_string(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<String> {
    let string = if value.is_string() {
        value
    } else {
        ctx.to_js_string(value)?
    };
    let buffer = ctx.encode_utf8(string)?;
    let text = buffer.as_str().to_owned();
    ctx.release_utf8(buffer);
    Ok(text)
}

// ============================================================================
// Primitive Type Implementations
// ============================================================================

impl FromScript for ScriptValue {
    fn from_script(_ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        Ok(value)
    }
}

impl ToScript for ScriptValue {
    fn to_script(&self, _ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        Ok(*self)
    }
}

impl FromScript for bool {
    fn from_script(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        Ok(ctx.to_boolean(value))
    }
}

impl ToScript for bool {
    fn to_script(&self, _ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        Ok(ScriptValue::bool(*self))
    }
}

impl FromScript for i32 {
    fn from_script(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        if let Some(i) = value.as_int() {
            return Ok(i);
        }
        Ok(number_not_nan(ctx, value)? as i32)
    }
}

impl ToScript for i32 {
    fn to_script(&self, _ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        Ok(ScriptValue::int(*self))
    }
}

impl FromScript for u32 {
    fn from_script(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        Ok(number_not_nan(ctx, value)? as u32)
    }
}

impl ToScript for u32 {
    fn to_script(&self, _ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        Ok(ScriptValue::number(*self as f64))
    }
}

impl FromScript for u16 {
    fn from_script(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        Ok(number_not_nan(ctx, value)? as u16)
    }
}

impl ToScript for u16 {
    fn to_script(&self, _ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        Ok(ScriptValue::int(*self as i32))
    }
}

impl FromScript for f64 {
    fn from_script(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        ctx.to_number(value)
    }
}

impl ToScript for f64 {
    fn to_script(&self, _ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        Ok(ScriptValue::double(*self))
    }
}

impl FromScript for f32 {
    fn from_script(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        Ok(ctx.to_number(value)? as f32)
    }
}

impl ToScript for f32 {
    fn to_script(&self, _ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        Ok(ScriptValue::double(*self as f64))
    }
}

/// Strings, numbers and booleans are coerced; null and undefined read as
/// the empty string.
impl FromScript for String {
    fn from_script(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        if value.is_nullish() {
            return Ok(String::new());
        }
        if !value.is_primitive_scalar() {
            return Err(BridgeError::type_mismatch("string", value.type_name()));
        }
        coerce_to_string(ctx, value)
    }
}

impl ToScript for str {
    fn to_script(&self, ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        ctx.create_string(self)
    }
}

impl ToScript for String {
    fn to_script(&self, ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        ctx.create_string(self)
    }
}

impl<T: FromScript> FromScript for Option<T> {
    fn from_script(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        if value.is_nullish() {
            Ok(None)
        } else {
            T::from_script(ctx, value).map(Some)
        }
    }
}

impl<T: ToScript> ToScript for Option<T> {
    fn to_script(&self, ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        match self {
            Some(v) => v.to_script(ctx),
            None => Ok(ScriptValue::null()),
        }
    }
}

impl<T: FromScript> FromScript for Vec<T> {
    fn from_script(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        let array = ScriptArray::wrap(ctx, value)?;
        let len = array.len()?;
        let mut out = Vec::with_capacity(len as usize);
        for i in 0..len {
            out.push(T::from_script(ctx, array.get(i)?)?);
        }
        Ok(out)
    }
}

impl<T: ToScript> ToScript for [T] {
    fn to_script(&self, ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        let mut roots = RootScope::new(ctx);
        let array = ScriptArray::new_in(&mut roots, self.len() as u32)?;
        for (i, item) in self.iter().enumerate() {
            array.set(i as u32, item.to_script(ctx)?)?;
        }
        Ok(array.into_value())
    }
}

impl<T: ToScript> ToScript for Vec<T> {
    fn to_script(&self, ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        self.as_slice().to_script(ctx)
    }
}
