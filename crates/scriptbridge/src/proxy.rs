//! Native-handle identity table
//!
//! Maps native object addresses to the scripting objects that represent
//! them, and back. A native handle has at most one live proxy: wrapping the
//! same handle twice returns the same scripting object.

use std::num::NonZeroUsize;
use std::ops::BitOr;

use rustc_hash::FxHashMap;
use scriptbridge_sdk::{BridgeError, BridgeResult, ClassId, HeapRef, ScriptContext, ScriptValue};

/// Opaque address of a native object. Never dereferenced by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(NonZeroUsize);

impl NativeHandle {
    /// Handle from a raw address; `None` for null
    pub fn new(addr: usize) -> Option<Self> {
        NonZeroUsize::new(addr).map(Self)
    }

    /// Handle from a pointer; `None` for null
    pub fn from_ptr<T>(ptr: *const T) -> Option<Self> {
        Self::new(ptr as usize)
    }

    /// The raw address
    pub fn addr(self) -> usize {
        self.0.get()
    }
}

/// Proxy flag bitset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProxyFlags(u8);

impl ProxyFlags {
    /// No flags: the scripting side owns destruction of the native object
    pub const NONE: Self = Self(0);
    /// The native object is merely exposed; collection must not free it
    pub const DO_NOT_FREE: Self = Self(1);

    /// Whether every bit of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bits
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for ProxyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One identity-table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeProxy {
    /// Native object address
    pub native: NativeHandle,
    /// Scripting object standing for it
    pub object: ScriptValue,
    /// Ownership flags
    pub flags: ProxyFlags,
    /// Class the scripting object was created from
    pub class: Option<ClassId>,
}

impl NativeProxy {
    /// Whether collecting the scripting object may destroy the native object
    pub fn owns_native(&self) -> bool {
        !self.flags.contains(ProxyFlags::DO_NOT_FREE)
    }
}

/// Bidirectional native <-> scripting identity map.
#[derive(Default)]
pub struct ProxyTable {
    by_native: FxHashMap<NativeHandle, NativeProxy>,
    by_object: FxHashMap<HeapRef, NativeHandle>,
}

impl ProxyTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripting object for `native`, created from `class` on first use.
    ///
    /// The new proxy is flagged [`ProxyFlags::DO_NOT_FREE`]: an exposed
    /// native object stays owned by native code.
    pub fn wrap(
        &mut self,
        ctx: &dyn ScriptContext,
        native: NativeHandle,
        class: Option<ClassId>,
    ) -> BridgeResult<ScriptValue> {
        self.wrap_with_flags(ctx, native, class, ProxyFlags::DO_NOT_FREE)
    }

    /// [`ProxyTable::wrap`] with explicit flags for a newly created proxy
    pub fn wrap_with_flags(
        &mut self,
        ctx: &dyn ScriptContext,
        native: NativeHandle,
        class: Option<ClassId>,
        flags: ProxyFlags,
    ) -> BridgeResult<ScriptValue> {
        if let Some(existing) = self.by_native.get(&native) {
            if ctx.is_live(existing.object) {
                return Ok(existing.object);
            }
            tracing::debug!(native = native.addr(), "replacing proxy whose object was collected");
            self.remove_native(native);
        }

        let object = ctx.create_object(class)?;
        self.insert(NativeProxy {
            native,
            object,
            flags,
            class,
        })?;
        tracing::debug!(native = native.addr(), ?object, "native proxy created");
        Ok(object)
    }

    /// Register an existing scripting object as the proxy for `native`,
    /// replacing any previous mapping of either side.
    pub fn register(
        &mut self,
        native: NativeHandle,
        object: ScriptValue,
        flags: ProxyFlags,
        class: Option<ClassId>,
    ) -> BridgeResult<()> {
        self.remove_native(native);
        self.remove_object(object);
        self.insert(NativeProxy {
            native,
            object,
            flags,
            class,
        })
    }

    fn insert(&mut self, proxy: NativeProxy) -> BridgeResult<()> {
        let r = proxy
            .object
            .as_object_ref()
            .ok_or_else(|| BridgeError::type_mismatch("object", proxy.object.type_name()))?;
        self.by_object.insert(r, proxy.native);
        self.by_native.insert(proxy.native, proxy);
        Ok(())
    }

    /// Native handle and proxy record behind a scripting object
    pub fn unwrap(
        &self,
        ctx: &dyn ScriptContext,
        value: ScriptValue,
    ) -> BridgeResult<(NativeHandle, NativeProxy)> {
        let r = value
            .as_object_ref()
            .ok_or_else(|| BridgeError::type_mismatch("object", value.type_name()))?;
        if !ctx.is_live(value) {
            return Err(BridgeError::StaleHandle);
        }
        let native = self.by_object.get(&r).ok_or(BridgeError::ProxyMissing)?;
        let proxy = self.by_native.get(native).ok_or(BridgeError::ProxyMissing)?;
        Ok((*native, proxy.clone()))
    }

    /// Proxy registered for a native handle
    pub fn lookup_native(&self, native: NativeHandle) -> Option<&NativeProxy> {
        self.by_native.get(&native)
    }

    /// Proxy registered for a scripting object
    pub fn lookup_object(&self, value: ScriptValue) -> Option<&NativeProxy> {
        let r = value.as_object_ref()?;
        self.by_object.get(&r).and_then(|n| self.by_native.get(n))
    }

    /// Native handle behind a scripting object
    pub fn native_for(&self, value: ScriptValue) -> Option<NativeHandle> {
        self.lookup_object(value).map(|p| p.native)
    }

    /// Forget the proxy of a native handle (native object destroyed)
    pub fn remove_native(&mut self, native: NativeHandle) -> Option<NativeProxy> {
        let proxy = self.by_native.remove(&native)?;
        if let Some(r) = proxy.object.as_object_ref() {
            self.by_object.remove(&r);
        }
        Some(proxy)
    }

    /// Forget the proxy of a scripting object
    pub fn remove_object(&mut self, value: ScriptValue) -> Option<NativeProxy> {
        let r = value.as_object_ref()?;
        let native = self.by_object.remove(&r)?;
        self.by_native.remove(&native)
    }

    /// Purge proxies whose scripting object was collected. Returns them so
    /// the caller can destroy natives the scripting side owned.
    pub fn sweep(&mut self, ctx: &dyn ScriptContext) -> Vec<NativeProxy> {
        let dead: Vec<NativeHandle> = self
            .by_native
            .values()
            .filter(|p| !ctx.is_live(p.object))
            .map(|p| p.native)
            .collect();
        let purged: Vec<NativeProxy> = dead
            .into_iter()
            .filter_map(|native| self.remove_native(native))
            .collect();
        if !purged.is_empty() {
            tracing::debug!(count = purged.len(), "purged proxies of collected objects");
        }
        purged
    }

    /// Drop every mapping
    pub fn clear(&mut self) {
        self.by_native.clear();
        self.by_object.clear();
    }

    /// Number of proxies
    pub fn len(&self) -> usize {
        self.by_native.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.by_native.is_empty()
    }
}
