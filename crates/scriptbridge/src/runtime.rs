//! Bridge runtime lifecycle
//!
//! [`BridgeRuntime`] owns the state that outlives a single conversion: the
//! native identity table and the callback holders. It is created by the
//! embedder next to the engine and shut down before the engine is torn down.
//!
//! # Example
//!
//! ```rust,ignore
//! use scriptbridge::{BridgeOptions, BridgeRuntime, NativeHandle};
//!
//! let mut runtime = BridgeRuntime::new(BridgeOptions::default());
//! let object = runtime.wrap(&engine, NativeHandle::new(addr).unwrap(), None)?;
//! let id = runtime.add_callback(&engine, object, on_event, Some(object))?;
//! runtime.invoke_callback(&engine, id, &[])?;
//! runtime.shutdown(&engine);
//! ```

use scriptbridge_sdk::{BridgeError, BridgeResult, ClassId, ScriptContext, ScriptValue, TaggedValue};

use crate::callback::{CallbackHandle, CallbackId, CallbackRegistry};
use crate::generic::TaggedConverter;
use crate::options::BridgeOptions;
use crate::proxy::{NativeHandle, NativeProxy, ProxyFlags, ProxyTable};

/// Runtime-owned bridge state.
pub struct BridgeRuntime {
    options: BridgeOptions,
    proxies: ProxyTable,
    callbacks: CallbackRegistry,
    running: bool,
}

impl Default for BridgeRuntime {
    fn default() -> Self {
        Self::new(BridgeOptions::default())
    }
}

impl BridgeRuntime {
    /// Create a running runtime
    pub fn new(options: BridgeOptions) -> Self {
        tracing::debug!(?options, "bridge runtime started");
        Self {
            options,
            proxies: ProxyTable::new(),
            callbacks: CallbackRegistry::new(),
            running: true,
        }
    }

    /// Options in effect
    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// The identity table
    pub fn proxies(&self) -> &ProxyTable {
        &self.proxies
    }

    /// The callback holders
    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    /// Whether [`BridgeRuntime::shutdown`] has not run yet
    pub fn is_running(&self) -> bool {
        self.running
    }

    fn ensure_running(&self) -> BridgeResult<()> {
        if self.running {
            Ok(())
        } else {
            Err(BridgeError::RuntimeShutDown)
        }
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Scripting object for an exposed native object (see [`ProxyTable::wrap`])
    pub fn wrap(
        &mut self,
        ctx: &dyn ScriptContext,
        native: NativeHandle,
        class: Option<ClassId>,
    ) -> BridgeResult<ScriptValue> {
        self.ensure_running()?;
        self.proxies.wrap(ctx, native, class)
    }

    /// [`BridgeRuntime::wrap`] with explicit flags
    pub fn wrap_with_flags(
        &mut self,
        ctx: &dyn ScriptContext,
        native: NativeHandle,
        class: Option<ClassId>,
        flags: ProxyFlags,
    ) -> BridgeResult<ScriptValue> {
        self.ensure_running()?;
        self.proxies.wrap_with_flags(ctx, native, class, flags)
    }

    /// Native handle behind a scripting object
    pub fn unwrap(
        &self,
        ctx: &dyn ScriptContext,
        value: ScriptValue,
    ) -> BridgeResult<(NativeHandle, NativeProxy)> {
        self.ensure_running()?;
        self.proxies.unwrap(ctx, value)
    }

    /// The native object was destroyed: release its callbacks, then forget
    /// its proxy.
    pub fn native_destroyed(
        &mut self,
        ctx: &dyn ScriptContext,
        native: NativeHandle,
    ) -> Option<NativeProxy> {
        let released = self.callbacks.remove_for_native(ctx, &self.proxies, native);
        let proxy = self.proxies.remove_native(native);
        tracing::debug!(native = native.addr(), released, "native object destroyed");
        proxy
    }

    /// Purge state tied to collected objects. Returns the purged proxies so
    /// the embedder can destroy natives the scripting side owned.
    pub fn collect(&mut self, ctx: &dyn ScriptContext) -> Vec<NativeProxy> {
        let purged = self.proxies.sweep(ctx);
        let released = self.callbacks.remove_dead_owners(ctx, &self.proxies);
        if released > 0 {
            tracing::debug!(released, "dropped callbacks of collected owners");
        }
        purged
    }

    // ========================================================================
    // Callbacks
    // ========================================================================

    /// Hold `function` (called with `receiver` as `this`) for later
    /// invocation, kept alive by `owner` when one is given.
    ///
    /// Without an owner the holder keeps only bare handles: the caller must
    /// keep `function` and `receiver` reachable, e.g. with
    /// [`ScriptContext::root_value`], for as long as the callback may run.
    /// Invoking a collected function fails with
    /// [`BridgeError::StaleHandle`].
    pub fn add_callback(
        &mut self,
        ctx: &dyn ScriptContext,
        receiver: ScriptValue,
        function: ScriptValue,
        owner: Option<ScriptValue>,
    ) -> BridgeResult<CallbackId> {
        self.ensure_running()?;
        let mut handle = CallbackHandle::new(receiver, function);
        handle.attach(ctx, &self.proxies, owner)?;
        Ok(self.callbacks.register(handle))
    }

    /// Invoke a held callback
    pub fn invoke_callback(
        &self,
        ctx: &dyn ScriptContext,
        id: CallbackId,
        args: &[ScriptValue],
    ) -> BridgeResult<ScriptValue> {
        self.ensure_running()?;
        self.callbacks.invoke(ctx, id, args)
    }

    /// Release a held callback. Returns false if the id is unknown.
    pub fn remove_callback(&mut self, ctx: &dyn ScriptContext, id: CallbackId) -> bool {
        self.callbacks.remove(ctx, &self.proxies, id)
    }

    // ========================================================================
    // Generic conversion
    // ========================================================================

    /// Converter bound to this runtime's options and identity table
    pub fn converter<'a>(&'a self, ctx: &'a dyn ScriptContext) -> TaggedConverter<'a> {
        TaggedConverter::new(ctx, &self.options).with_proxies(&self.proxies)
    }

    /// See [`TaggedConverter::to_tagged`]
    pub fn to_tagged(&self, ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<TaggedValue> {
        self.ensure_running()?;
        self.converter(ctx).to_tagged(value)
    }

    /// See [`TaggedConverter::from_tagged`]
    pub fn from_tagged(&self, ctx: &dyn ScriptContext, value: &TaggedValue) -> BridgeResult<ScriptValue> {
        self.ensure_running()?;
        self.converter(ctx).from_tagged(value)
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    /// Release every callback and clear the identity table. Idempotent.
    pub fn shutdown(&mut self, ctx: &dyn ScriptContext) {
        if !self.running {
            return;
        }
        let callbacks = self.callbacks.clear(ctx, &self.proxies);
        let proxies = self.proxies.len();
        self.proxies.clear();
        self.running = false;
        tracing::debug!(callbacks, proxies, "bridge runtime shut down");
    }
}
