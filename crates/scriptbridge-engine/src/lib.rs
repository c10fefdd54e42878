//! scriptbridge engine
//!
//! An in-process scripting engine that implements
//! [`ScriptContext`](scriptbridge_sdk::ScriptContext): generation-checked
//! heap handles, plain objects, arrays, native functions and classes,
//! ECMAScript-style coercions, realms, a mark-sweep collector that honours
//! native reference edges, UTF-8 buffer accounting and a finalization phase.
//!
//! It is the collaborator the bridge is exercised against; embedders with a
//! production engine implement the same trait on their own context type.

#![warn(missing_docs)]

pub mod coerce;
pub mod defaults;
pub mod engine;
pub mod gc;
pub mod heap;
pub mod object;
pub mod realm;
pub mod utf8;

pub use engine::{Engine, EngineOptions};
pub use gc::GcStats;
pub use object::NativeFunction;
