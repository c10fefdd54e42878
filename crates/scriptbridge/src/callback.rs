//! Callback reference holders
//!
//! A [`CallbackHandle`] keeps a scripting function and its receiver alive
//! while native code may still call them, by registering both as reference
//! edges from an owner object. Release severs those edges, but only while
//! the owner's proxy still points at the native object seen at attach time.

use std::collections::BTreeMap;

use scriptbridge_sdk::{BridgeError, BridgeResult, RealmId, ScriptContext, ScriptValue};

use crate::proxy::{NativeHandle, ProxyTable};

/// Lifecycle of a callback holder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackState {
    /// Created, no edges registered
    Unattached,
    /// Edges registered (when an owner was given)
    Attached,
    /// Edges severed; invoking is rejected
    Released,
}

/// Makes a realm current for its lifetime, restoring the previous one on drop.
pub struct RealmGuard<'a> {
    ctx: &'a dyn ScriptContext,
    previous: RealmId,
}

impl<'a> RealmGuard<'a> {
    /// Enter `realm`
    pub fn enter(ctx: &'a dyn ScriptContext, realm: RealmId) -> Self {
        let previous = ctx.enter_realm(realm);
        Self { ctx, previous }
    }
}

impl Drop for RealmGuard<'_> {
    fn drop(&mut self) {
        self.ctx.enter_realm(self.previous);
    }
}

/// Native-held reference to a scripting function plus its receiver.
#[derive(Debug)]
pub struct CallbackHandle {
    receiver: ScriptValue,
    function: ScriptValue,
    owner: Option<ScriptValue>,
    owner_native: Option<NativeHandle>,
    state: CallbackState,
}

impl CallbackHandle {
    /// Holder for `function`, to be called with `receiver` as `this`
    pub fn new(receiver: ScriptValue, function: ScriptValue) -> Self {
        Self {
            receiver,
            function,
            owner: None,
            owner_native: None,
            state: CallbackState::Unattached,
        }
    }

    /// Register the receiver and function as edges from `owner`.
    ///
    /// With no owner (or a null one) nothing is registered, and the holder
    /// relies on the caller to root both values
    /// ([`ScriptContext::root_value`]).
    pub fn attach(
        &mut self,
        ctx: &dyn ScriptContext,
        proxies: &ProxyTable,
        owner: Option<ScriptValue>,
    ) -> BridgeResult<()> {
        match self.state {
            CallbackState::Unattached => {}
            CallbackState::Attached => {
                return Err(BridgeError::Engine("Callback is already attached".to_string()))
            }
            CallbackState::Released => return Err(BridgeError::CallbackReleased),
        }
        if !ctx.is_function(self.function) {
            return Err(BridgeError::type_mismatch("function", self.function.type_name()));
        }

        if let Some(owner) = owner.filter(|o| !o.is_nullish()) {
            ctx.add_reference_edge(owner, self.receiver)?;
            if let Err(err) = ctx.add_reference_edge(owner, self.function) {
                if let Err(undo) = ctx.remove_reference_edge(owner, self.receiver) {
                    tracing::warn!(error = %undo, "failed to undo receiver edge");
                }
                return Err(err);
            }
            self.owner = Some(owner);
            self.owner_native = proxies.native_for(owner);
            tracing::debug!(
                ?owner,
                owner_native = self.owner_native.map(NativeHandle::addr),
                "callback attached"
            );
        }
        self.state = CallbackState::Attached;
        Ok(())
    }

    /// Sever the edges registered by [`CallbackHandle::attach`].
    ///
    /// Safe to call repeatedly. Edges are left alone when the holder was
    /// never attached, when the engine is finalizing, or when the owner's
    /// current proxy no longer matches the native object recorded at attach.
    pub fn release(&mut self, ctx: &dyn ScriptContext, proxies: &ProxyTable) {
        match self.state {
            CallbackState::Attached => {}
            CallbackState::Unattached | CallbackState::Released => {
                self.state = CallbackState::Released;
                return;
            }
        }
        self.state = CallbackState::Released;

        let Some(owner) = self.owner else {
            return;
        };
        if ctx.is_finalizing() {
            tracing::trace!("callback release skipped during finalization");
            return;
        }
        // Edges go away with a collected owner.
        if !ctx.is_live(owner) {
            tracing::trace!(?owner, "callback owner already collected");
            return;
        }
        if let Some(expected) = self.owner_native {
            let current = proxies.native_for(owner);
            if current != Some(expected) {
                tracing::debug!(
                    expected = expected.addr(),
                    current = current.map(NativeHandle::addr),
                    "owner proxy changed, leaving edges to the collector"
                );
                return;
            }
        }

        for target in [self.receiver, self.function] {
            if let Err(err) = ctx.remove_reference_edge(owner, target) {
                tracing::warn!(error = %err, "failed to remove callback edge");
            }
        }
        tracing::debug!(?owner, "callback released");
    }

    /// Call the function with the stored receiver, inside the function's realm
    pub fn invoke(&self, ctx: &dyn ScriptContext, args: &[ScriptValue]) -> BridgeResult<ScriptValue> {
        if self.state == CallbackState::Released {
            return Err(BridgeError::CallbackReleased);
        }
        let realm = ctx.realm_of(self.function)?;
        let _guard = RealmGuard::enter(ctx, realm);
        ctx.call_function(self.receiver, self.function, args)
    }

    /// Current state
    pub fn state(&self) -> CallbackState {
        self.state
    }

    /// The receiver (`this`)
    pub fn receiver(&self) -> ScriptValue {
        self.receiver
    }

    /// The function
    pub fn function(&self) -> ScriptValue {
        self.function
    }

    /// The owner recorded at attach
    pub fn owner(&self) -> Option<ScriptValue> {
        self.owner
    }

    /// The owner's native handle recorded at attach
    pub fn owner_native(&self) -> Option<NativeHandle> {
        self.owner_native
    }
}

// ============================================================================
// CallbackRegistry
// ============================================================================

/// Identifier of a registered callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

impl CallbackId {
    /// Raw id
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Callback holders owned by a runtime, in registration order.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    next_id: u64,
    handles: BTreeMap<CallbackId, CallbackHandle>,
}

impl CallbackRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a holder
    pub fn register(&mut self, handle: CallbackHandle) -> CallbackId {
        self.next_id += 1;
        let id = CallbackId(self.next_id);
        self.handles.insert(id, handle);
        id
    }

    /// Borrow a holder
    pub fn get(&self, id: CallbackId) -> Option<&CallbackHandle> {
        self.handles.get(&id)
    }

    /// Invoke a holder
    pub fn invoke(
        &self,
        ctx: &dyn ScriptContext,
        id: CallbackId,
        args: &[ScriptValue],
    ) -> BridgeResult<ScriptValue> {
        self.handles
            .get(&id)
            .ok_or(BridgeError::CallbackReleased)?
            .invoke(ctx, args)
    }

    /// Release and drop a holder. Returns false if the id is unknown.
    pub fn remove(&mut self, ctx: &dyn ScriptContext, proxies: &ProxyTable, id: CallbackId) -> bool {
        match self.handles.remove(&id) {
            Some(mut handle) => {
                handle.release(ctx, proxies);
                true
            }
            None => false,
        }
    }

    /// Release and drop every holder whose owner was attached as `native`.
    pub fn remove_for_native(
        &mut self,
        ctx: &dyn ScriptContext,
        proxies: &ProxyTable,
        native: NativeHandle,
    ) -> usize {
        let ids: Vec<CallbackId> = self
            .handles
            .iter()
            .filter(|(_, h)| h.owner_native == Some(native))
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.remove(ctx, proxies, *id);
        }
        ids.len()
    }

    /// Release and drop every holder whose owner has been collected
    pub fn remove_dead_owners(&mut self, ctx: &dyn ScriptContext, proxies: &ProxyTable) -> usize {
        let ids: Vec<CallbackId> = self
            .handles
            .iter()
            .filter(|(_, h)| h.owner.is_some_and(|owner| !ctx.is_live(owner)))
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.remove(ctx, proxies, *id);
        }
        ids.len()
    }

    /// Release and drop every holder
    pub fn clear(&mut self, ctx: &dyn ScriptContext, proxies: &ProxyTable) -> usize {
        let handles = std::mem::take(&mut self.handles);
        let count = handles.len();
        for (_, mut handle) in handles {
            handle.release(ctx, proxies);
        }
        count
    }

    /// Number of holders
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptbridge_engine::Engine;

    fn noop(engine: &Engine) -> ScriptValue {
        engine
            .create_function("noop", |_, _, _| Ok(ScriptValue::undefined()))
            .unwrap()
    }

    #[test]
    fn test_release_without_attach_is_noop() {
        let engine = Engine::new();
        let proxies = ProxyTable::new();
        let mut handle = CallbackHandle::new(ScriptValue::undefined(), noop(&engine));
        handle.release(&engine, &proxies);
        assert_eq!(handle.state(), CallbackState::Released);
        handle.release(&engine, &proxies);
        assert_eq!(handle.state(), CallbackState::Released);
    }

    #[test]
    fn test_attach_requires_function() {
        let engine = Engine::new();
        let proxies = ProxyTable::new();
        let obj = engine.create_object(None).unwrap();
        let mut handle = CallbackHandle::new(ScriptValue::undefined(), obj);
        assert!(matches!(
            handle.attach(&engine, &proxies, None),
            Err(BridgeError::TypeMismatch { .. })
        ));
        assert_eq!(handle.state(), CallbackState::Unattached);
    }

    #[test]
    fn test_attach_twice_fails() {
        let engine = Engine::new();
        let proxies = ProxyTable::new();
        let mut handle = CallbackHandle::new(ScriptValue::undefined(), noop(&engine));
        handle.attach(&engine, &proxies, None).unwrap();
        assert!(handle.attach(&engine, &proxies, None).is_err());
        handle.release(&engine, &proxies);
        assert_eq!(
            handle.attach(&engine, &proxies, None),
            Err(BridgeError::CallbackReleased)
        );
    }

    #[test]
    fn test_null_owner_registers_nothing() {
        let engine = Engine::new();
        let proxies = ProxyTable::new();
        let mut handle = CallbackHandle::new(ScriptValue::undefined(), noop(&engine));
        handle
            .attach(&engine, &proxies, Some(ScriptValue::null()))
            .unwrap();
        assert_eq!(handle.owner(), None);
        assert_eq!(handle.state(), CallbackState::Attached);
    }

    #[test]
    fn test_realm_guard_restores() {
        let engine = Engine::new();
        let other = engine.create_realm("other");
        let main = engine.current_realm();
        {
            let _guard = RealmGuard::enter(&engine, other);
            assert_eq!(engine.current_realm(), other);
        }
        assert_eq!(engine.current_realm(), main);
    }
}
