//! Transient string views
//!
//! [`TransientString`] owns a UTF-8 buffer encoded by the engine for as long
//! as it is alive. The buffer goes back to the engine exactly once: when the
//! view is reset or dropped, on every exit path.

use std::fmt;

use scriptbridge_sdk::{describe, BridgeError, BridgeResult, EncodedUtf8, ScriptContext, ScriptValue};

use crate::report::reported;

/// UTF-8 view of a scripting string, scoped to the enclosing call.
pub struct TransientString<'a> {
    ctx: &'a dyn ScriptContext,
    buffer: Option<EncodedUtf8>,
}

impl<'a> TransientString<'a> {
    /// An empty view holding no buffer
    pub fn empty(ctx: &'a dyn ScriptContext) -> Self {
        Self { ctx, buffer: None }
    }

    /// View of a string, number or boolean (coerced with ToString).
    /// `null` and `undefined` give an empty view.
    pub fn from_value(ctx: &'a dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        let mut view = Self::empty(ctx);
        view.set_value(value)?;
        Ok(view)
    }

    /// View of a string handle
    pub fn from_handle(ctx: &'a dyn ScriptContext, string: ScriptValue) -> BridgeResult<Self> {
        let mut view = Self::empty(ctx);
        view.set_handle(string)?;
        Ok(view)
    }

    /// Re-point the view at another value, releasing the current buffer first
    pub fn set_value(&mut self, value: ScriptValue) -> BridgeResult<()> {
        self.release();
        if value.is_nullish() {
            return Ok(());
        }
        if value.is_string() {
            return self.set_handle(value);
        }
        if !value.is_primitive_scalar() {
            return Err(BridgeError::type_mismatch(
                "string, number or boolean",
                describe(self.ctx, value),
            ));
        }
        let string = self.ctx.to_js_string(value)?;
        self.set_handle(string)
    }

    /// Re-point the view at a string handle, releasing the current buffer first
    pub fn set_handle(&mut self, string: ScriptValue) -> BridgeResult<()> {
        self.release();
        if !string.is_string() {
            return Err(BridgeError::type_mismatch("string", string.type_name()));
        }
        let buffer = self
            .ctx
            .encode_utf8(string)
            .map_err(|e| match e {
                BridgeError::StaleHandle | BridgeError::TypeMismatch { .. } => e,
                other => BridgeError::AllocationFailure(other.to_string()),
            })?;
        self.buffer = Some(buffer);
        Ok(())
    }

    /// The text; empty when no buffer is held
    pub fn as_str(&self) -> &str {
        self.buffer.as_ref().map(EncodedUtf8::as_str).unwrap_or("")
    }

    /// The UTF-8 bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    /// Whether the text is empty
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Copy the text out; the buffer is released when `self` drops
    pub fn into_string(self) -> String {
        self.as_str().to_owned()
    }

    fn release(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.ctx.release_utf8(buffer);
        }
    }
}

impl Drop for TransientString<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl AsRef<str> for TransientString<'_> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TransientString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for TransientString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TransientString").field(&self.as_str()).finish()
    }
}

/// Owned copy of a string-like argument (see [`TransientString::from_value`])
pub fn to_string(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<String> {
    reported(
        ctx,
        "string",
        TransientString::from_value(ctx, value).map(TransientString::into_string),
    )
}

/// Allocate a scripting string
pub fn string_to_value(ctx: &dyn ScriptContext, s: &str) -> BridgeResult<ScriptValue> {
    ctx.create_string(s)
}
