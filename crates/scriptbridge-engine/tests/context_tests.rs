//! Engine Context Tests
//!
//! Exercises the engine through the `ScriptContext` trait object, the way
//! the bridge sees it:
//! - SDK conversion traits and typed wrappers
//! - Reference edges and collection
//! - Realm switching
//! - Finalization
//!
//! # Running Tests
//! ```bash
//! cargo test -p scriptbridge-engine --test context_tests
//! ```

use proptest::prelude::*;
use scriptbridge_engine::Engine;
use scriptbridge_sdk::{
    BridgeError, FromScript, PropertyKey, ScriptArray, ScriptContext, ScriptObject, ScriptValue,
    ToScript,
};

// ===== Conversion Trait Tests =====

#[test]
fn test_primitive_from_script() {
    let engine = Engine::new();
    let ctx: &dyn ScriptContext = &engine;

    assert_eq!(i32::from_script(ctx, ScriptValue::double(7.9)).unwrap(), 7);
    assert_eq!(i32::from_script(ctx, ScriptValue::double(-7.9)).unwrap(), -7);
    let s = ctx.create_string("12").unwrap();
    assert_eq!(u16::from_script(ctx, s).unwrap(), 12);
    assert!(matches!(
        i32::from_script(ctx, ScriptValue::undefined()),
        Err(BridgeError::TypeMismatch { .. })
    ));
    assert!(f64::from_script(ctx, ScriptValue::undefined()).unwrap().is_nan());
    assert!(bool::from_script(ctx, ScriptValue::int(2)).unwrap());
}

#[test]
fn test_string_from_script() {
    let engine = Engine::new();
    let ctx: &dyn ScriptContext = &engine;

    assert_eq!(String::from_script(ctx, ScriptValue::int(42)).unwrap(), "42");
    assert_eq!(String::from_script(ctx, ScriptValue::bool(false)).unwrap(), "false");
    assert_eq!(String::from_script(ctx, ScriptValue::null()).unwrap(), "");
    let obj = ctx.create_object(None).unwrap();
    assert!(String::from_script(ctx, obj).is_err());
    assert_eq!(engine.outstanding_utf8(), 0);
}

#[test]
fn test_vec_round_trip_through_traits() {
    let engine = Engine::new();
    let ctx: &dyn ScriptContext = &engine;

    let value = vec![1i32, 2, 3].to_script(ctx).unwrap();
    assert!(ctx.is_array(value));
    assert_eq!(Vec::<i32>::from_script(ctx, value).unwrap(), vec![1, 2, 3]);

    let names = vec!["a".to_string(), "b".to_string()].to_script(ctx).unwrap();
    assert_eq!(
        Vec::<String>::from_script(ctx, names).unwrap(),
        vec!["a".to_string(), "b".to_string()]
    );
}

#[test]
fn test_option_maps_nullish() {
    let engine = Engine::new();
    let ctx: &dyn ScriptContext = &engine;

    assert_eq!(Option::<i32>::from_script(ctx, ScriptValue::null()).unwrap(), None);
    assert_eq!(Option::<i32>::from_script(ctx, ScriptValue::int(4)).unwrap(), Some(4));
    assert!(None::<i32>.to_script(ctx).unwrap().is_null());
}

// ===== Typed Wrapper Tests =====

#[test]
fn test_script_object_getters() {
    let engine = Engine::new();
    let ctx: &dyn ScriptContext = &engine;

    let obj = ScriptObject::new(ctx).unwrap();
    obj.set_number("x", 1.5).unwrap();
    obj.set("nan", ScriptValue::double(f64::NAN)).unwrap();
    obj.set_string("label", "hi").unwrap();

    assert_eq!(obj.get_number("x").unwrap(), 1.5);
    assert!(obj.get_number("nan").unwrap().is_nan());
    assert!(matches!(
        obj.get_number_strict("nan"),
        Err(BridgeError::NotCoercible { .. })
    ));
    assert!(matches!(
        obj.get_number("y"),
        Err(BridgeError::PropertyMissing { .. })
    ));
    assert_eq!(obj.get_optional_number("y").unwrap(), None);
    assert_eq!(obj.get_string("label").unwrap(), "hi");
    assert_eq!(
        obj.keys().unwrap(),
        vec![
            PropertyKey::Name("x".into()),
            PropertyKey::Name("nan".into()),
            PropertyKey::Name("label".into()),
        ]
    );
}

#[test]
fn test_script_array_wrap_rejects_objects() {
    let engine = Engine::new();
    let ctx: &dyn ScriptContext = &engine;

    let obj = ctx.create_object(None).unwrap();
    match ScriptArray::wrap(ctx, obj) {
        Err(BridgeError::TypeMismatch { expected, got }) => {
            assert_eq!(expected, "array");
            assert_eq!(got, "object");
        }
        _ => panic!("expected type mismatch"),
    }
    let arr = ScriptArray::from_values(ctx, &[ScriptValue::int(1), ScriptValue::int(2)]).unwrap();
    assert_eq!(arr.len().unwrap(), 2);
    assert_eq!(arr.get_number(1).unwrap(), 2.0);
}

// ===== Reachability Tests =====

#[test]
fn test_reference_edges_keep_targets_alive() {
    let engine = Engine::new();
    let ctx: &dyn ScriptContext = &engine;

    let owner = ctx.create_object(None).unwrap();
    engine.root(owner);
    let target = engine
        .create_function("cb", |_, _, _| Ok(ScriptValue::undefined()))
        .unwrap();

    ctx.add_reference_edge(owner, target).unwrap();
    engine.collect_garbage();
    assert!(ctx.is_live(target));

    ctx.remove_reference_edge(owner, target).unwrap();
    engine.collect_garbage();
    assert!(!ctx.is_live(target));
}

#[test]
fn test_removing_unknown_edge_fails() {
    let engine = Engine::new();
    let ctx: &dyn ScriptContext = &engine;

    let owner = ctx.create_object(None).unwrap();
    let target = ctx.create_object(None).unwrap();
    assert!(ctx.remove_reference_edge(owner, target).is_err());
}

#[test]
fn test_edge_on_collected_owner_is_stale() {
    let engine = Engine::new();
    let ctx: &dyn ScriptContext = &engine;

    let owner = ctx.create_object(None).unwrap();
    let target = ctx.create_object(None).unwrap();
    engine.root(target);
    ctx.add_reference_edge(owner, target).unwrap();
    engine.collect_garbage();

    assert_eq!(
        ctx.remove_reference_edge(owner, target),
        Err(BridgeError::StaleHandle)
    );
}

// ===== Lifecycle Tests =====

#[test]
fn test_teardown_flag_and_sweep() {
    let engine = Engine::new();
    let obj = engine.create_object(None).unwrap();
    engine.root(obj);

    assert!(!engine.is_finalizing());
    engine.begin_teardown();
    assert!(engine.is_finalizing());
    assert_eq!(engine.end_teardown(), 1);
    assert!(!engine.is_finalizing());
    assert_eq!(engine.live_cells(), 0);
}

#[test]
fn test_report_error_is_recorded() {
    let engine = Engine::new();
    engine.report_error("bad argument");
    assert_eq!(engine.take_reported_errors(), vec!["bad argument".to_string()]);
    assert!(engine.take_reported_errors().is_empty());
}

// ===== Properties =====

proptest! {
    #[test]
    fn prop_number_to_string_reparses(n in -1.0e15f64..1.0e15) {
        let engine = Engine::new();
        let ctx: &dyn ScriptContext = &engine;
        let s = ctx.to_js_string(ScriptValue::double(n)).unwrap();
        let back = ctx.to_number(s).unwrap();
        prop_assert_eq!(back, n);
    }

    #[test]
    fn prop_rooted_objects_survive_collection(count in 1usize..40, keep_every in 1usize..5) {
        let engine = Engine::new();
        let mut kept = Vec::new();
        for i in 0..count {
            let obj = engine.create_object(None).unwrap();
            if i % keep_every == 0 {
                engine.root(obj);
                kept.push(obj);
            }
        }
        engine.collect_garbage();
        prop_assert_eq!(engine.live_cells(), kept.len());
        for obj in kept {
            prop_assert!(engine.is_live(obj));
        }
    }
}
