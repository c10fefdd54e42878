//! scriptbridge SDK - value handles and the engine capability trait
//!
//! This crate holds the types shared by the scripting engine and the
//! marshalling layer: the NaN-boxed [`ScriptValue`] handle, the
//! [`ScriptContext`] trait the engine implements, the [`BridgeError`]
//! taxonomy, the native [`TaggedValue`] model, and typed wrappers for
//! scripting arrays and objects.
//!
//! # Example
//!
//! ```ignore
//! use scriptbridge_sdk::{FromScript, ScriptContext, ScriptValue};
//!
//! fn read_count(ctx: &dyn ScriptContext, value: ScriptValue) -> i32 {
//!     i32::from_script(ctx, value).unwrap_or(0)
//! }
//! ```

#![warn(missing_docs)]

pub mod context;
pub mod convert;
pub mod error;
pub mod tagged;
pub mod types;
pub mod value;

pub use context::{ClassId, ClassInfo, EncodedUtf8, PropertyKey, RealmId, ScriptContext};
pub use convert::{coerce_to_string, number_not_nan, FromScript, ToScript};
pub use error::{BridgeError, BridgeResult};
pub use tagged::TaggedValue;
pub use types::{describe, RootScope, ScriptArray, ScriptObject};
pub use value::{HeapRef, ScriptValue};
