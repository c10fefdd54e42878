//! scriptbridge - value marshalling between native code and a scripting engine
//!
//! The bridge sits on top of any engine implementing
//! [`ScriptContext`](scriptbridge_sdk::ScriptContext) and provides:
//!
//! - **Strings**: scoped UTF-8 views ([`TransientString`]) that hand their
//!   buffer back to the engine exactly once
//! - **Typed records**: geometry, colors, render vertices, text and resource
//!   descriptors ([`convert`])
//! - **Generic values**: arbitrary scripting values to and from
//!   [`TaggedValue`](scriptbridge_sdk::TaggedValue) ([`TaggedConverter`])
//! - **Identity**: one scripting proxy per native object ([`ProxyTable`])
//! - **Callbacks**: scripting functions held alive by reference edges from
//!   an owner and invoked in their own realm ([`CallbackRegistry`])
//!
//! [`BridgeRuntime`] ties the stateful parts together for one engine.

#![warn(missing_docs)]

pub mod callback;
pub mod convert;
pub mod defaults;
pub mod generic;
pub mod options;
pub mod proxy;
pub mod report;
pub mod runtime;
pub mod string;

pub use callback::{CallbackHandle, CallbackId, CallbackRegistry, CallbackState, RealmGuard};
pub use generic::{from_tagged, to_tagged, TaggedConverter};
pub use options::{BridgeOptions, Int64Repr, MapContainer};
pub use proxy::{NativeHandle, NativeProxy, ProxyFlags, ProxyTable};
pub use report::report_argument_error;
pub use runtime::BridgeRuntime;
pub use string::{string_to_value, to_string, TransientString};

pub use scriptbridge_sdk::{
    BridgeError, BridgeResult, FromScript, RootScope, ScriptContext, ScriptValue, TaggedValue,
    ToScript,
};
