//! Generic Conversion Tests
//!
//! Exercises the tagged-value converter end to end:
//! - Nested arrays and objects
//! - Map containers and integer-keyed maps
//! - Rejected values and error reporting
//! - Collection while a conversion allocates
//! - Round-trip properties over generated values
//!
//! # Running Tests
//! ```bash
//! cargo test -p scriptbridge --test generic_tests
//! ```

use std::collections::{BTreeMap, HashMap};

use proptest::prelude::*;
use scriptbridge::{
    from_tagged, to_tagged, BridgeError, BridgeOptions, BridgeRuntime, MapContainer, NativeHandle,
    TaggedConverter,
};
use scriptbridge_engine::{Engine, EngineOptions};
use scriptbridge_sdk::{ScriptArray, ScriptContext, ScriptObject, ScriptValue, TaggedValue};

fn string(engine: &Engine, s: &str) -> ScriptValue {
    engine.create_string(s).unwrap()
}

/// Engine that collects before every allocation
fn collecting_engine() -> Engine {
    Engine::with_options(EngineOptions {
        gc_threshold: 1,
        ..Default::default()
    })
}

fn map(entries: &[(&str, TaggedValue)]) -> TaggedValue {
    TaggedValue::Map(
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<HashMap<_, _>>(),
    )
}

// ===== Scripting -> Tagged =====

#[test]
fn test_mixed_array_converts_to_list() {
    let engine = Engine::new();
    let inner = ScriptObject::new(&engine).unwrap();
    inner.set_string("k", "v").unwrap();
    let array = ScriptArray::from_values(
        &engine,
        &[string(&engine, "a"), ScriptValue::int(3), inner.value()],
    )
    .unwrap();

    let tagged = to_tagged(&engine, array.value()).unwrap();
    assert_eq!(
        tagged,
        TaggedValue::List(vec![
            TaggedValue::String("a".to_string()),
            TaggedValue::Int(3),
            map(&[("k", TaggedValue::String("v".to_string()))]),
        ])
    );
    assert_eq!(engine.outstanding_utf8(), 0);
}

#[test]
fn test_top_level_nullish_is_empty_map() {
    let engine = Engine::new();
    assert_eq!(
        to_tagged(&engine, ScriptValue::undefined()).unwrap(),
        TaggedValue::empty_map()
    );
    assert_eq!(
        to_tagged(&engine, ScriptValue::null()).unwrap(),
        TaggedValue::empty_map()
    );
}

#[test]
fn test_nested_null_is_rejected_and_reported() {
    let engine = Engine::new();
    let obj = ScriptObject::new(&engine).unwrap();
    obj.set("nothing", ScriptValue::null()).unwrap();

    let err = to_tagged(&engine, obj.value()).unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedVariant { .. }));
    let reported = engine.take_reported_errors();
    assert_eq!(reported.len(), 1);
    assert!(reported[0].starts_with("Error processing arguments: "));
}

#[test]
fn test_function_property_is_rejected() {
    let engine = Engine::new();
    let f = engine
        .create_function("f", |_, _, _| Ok(ScriptValue::undefined()))
        .unwrap();
    let array = ScriptArray::from_values(&engine, &[ScriptValue::int(1), f]).unwrap();
    assert!(matches!(
        to_tagged(&engine, array.value()),
        Err(BridgeError::UnsupportedVariant { .. })
    ));
}

#[test]
fn test_wrapped_native_is_rejected_by_runtime() {
    let engine = Engine::new();
    let mut runtime = BridgeRuntime::default();
    let proxy = runtime
        .wrap(&engine, NativeHandle::new(0x1000).unwrap(), None)
        .unwrap();
    let array = ScriptArray::from_values(&engine, &[proxy]).unwrap();
    assert!(runtime.to_tagged(&engine, array.value()).is_err());
}

#[test]
fn test_self_referencing_object_hits_depth_limit() {
    let engine = Engine::new();
    let options = BridgeOptions::default().with_max_depth(8);
    let obj = ScriptObject::new(&engine).unwrap();
    obj.set("me", obj.value()).unwrap();

    let err = TaggedConverter::new(&engine, &options)
        .to_tagged(obj.value())
        .unwrap_err();
    assert_eq!(err, BridgeError::DepthExceeded { limit: 8 });
}

#[test]
fn test_int_map_reads_numeric_names() {
    let engine = Engine::new();
    let options = BridgeOptions::default();
    let obj = ScriptObject::new(&engine).unwrap();
    obj.set_bool("2", true).unwrap();
    obj.set_int("-5", 7).unwrap();
    obj.set_int("name", 0).unwrap();

    let tagged = TaggedConverter::new(&engine, &options)
        .to_tagged_int_map(obj.value())
        .unwrap();
    let expected: BTreeMap<i32, TaggedValue> =
        [(-5, TaggedValue::Int(7)), (2, TaggedValue::Bool(true))]
            .into_iter()
            .collect();
    assert_eq!(tagged, TaggedValue::IntKeyMap(expected));
}

// ===== Tagged -> Scripting =====

#[test]
fn test_default_map_container_is_array() {
    let engine = Engine::new();
    let options = BridgeOptions::default();
    let converter = TaggedConverter::new(&engine, &options);
    let value = from_tagged(&engine, &map(&[("answer", TaggedValue::Int(42))])).unwrap();

    assert!(engine.is_array(value));
    assert_eq!(engine.array_len(value).unwrap(), 0);
    assert_eq!(
        engine.get_property(value, "answer").unwrap(),
        ScriptValue::int(42)
    );
    // Named entries on the array read back through either entry point.
    assert_eq!(
        converter.to_tagged_map(value).unwrap(),
        map(&[("answer", TaggedValue::Int(42))])
    );
    assert_eq!(
        to_tagged(&engine, value).unwrap(),
        map(&[("answer", TaggedValue::Int(42))])
    );
}

#[test]
fn test_default_options_keep_nested_maps() {
    let engine = Engine::new();
    let value = map(&[("a", map(&[("b", TaggedValue::Int(2))]))]);
    let script = from_tagged(&engine, &value).unwrap();
    assert_eq!(to_tagged(&engine, script).unwrap(), value);
}

#[test]
fn test_named_array_with_elements_is_rejected() {
    let engine = Engine::new();
    let array = ScriptArray::from_values(&engine, &[ScriptValue::int(1)]).unwrap();
    engine
        .set_property(array.value(), "label", ScriptValue::int(2))
        .unwrap();
    assert!(matches!(
        to_tagged(&engine, array.value()),
        Err(BridgeError::UnsupportedVariant { .. })
    ));
    assert_eq!(engine.take_reported_errors().len(), 1);
}

#[test]
fn test_int_map_round_trip_in_both_containers() {
    let engine = Engine::new();
    let entries: BTreeMap<i32, TaggedValue> = [
        (0, TaggedValue::String("zero".to_string())),
        (3, TaggedValue::Double(0.5)),
        (10, TaggedValue::List(vec![])),
    ]
    .into_iter()
    .collect();

    for container in [MapContainer::Array, MapContainer::Object] {
        let options = BridgeOptions::default().with_map_container(container);
        let converter = TaggedConverter::new(&engine, &options);
        let value = converter.from_tagged_int_map(&entries).unwrap();
        assert_eq!(
            converter.to_tagged_int_map(value).unwrap(),
            TaggedValue::IntKeyMap(entries.clone()),
            "{container:?}"
        );
    }
}

#[test]
fn test_doubles_keep_their_encoding() {
    let engine = Engine::new();
    let value = from_tagged(&engine, &TaggedValue::Double(2.0)).unwrap();
    assert_eq!(value.as_double(), Some(2.0));
    assert_eq!(to_tagged(&engine, value).unwrap(), TaggedValue::Double(2.0));
}

// ===== Collection During Conversion =====

#[test]
fn test_from_tagged_survives_collection_on_every_allocation() {
    let engine = collecting_engine();
    let value = TaggedValue::List(vec![
        TaggedValue::String("a".to_string()),
        TaggedValue::String("b".to_string()),
        map(&[
            ("name", TaggedValue::String("c".to_string())),
            ("tags", TaggedValue::List(vec![TaggedValue::String("d".to_string())])),
        ]),
    ]);

    let script = from_tagged(&engine, &value).unwrap();
    assert!(engine.gc_stats().collections > 0);
    assert_eq!(to_tagged(&engine, script).unwrap(), value);

    // Nothing stays rooted once the conversion returns.
    engine.collect_garbage();
    assert_eq!(engine.live_cells(), 0);
}

#[test]
fn test_int_map_survives_collection_on_every_allocation() {
    let engine = collecting_engine();
    let options = BridgeOptions::default().with_map_container(MapContainer::Object);
    let converter = TaggedConverter::new(&engine, &options);
    let entries: BTreeMap<i32, TaggedValue> = [
        (1, TaggedValue::String("one".to_string())),
        (2, TaggedValue::String("two".to_string())),
    ]
    .into_iter()
    .collect();

    let script = converter.from_tagged_int_map(&entries).unwrap();
    assert_eq!(
        converter.to_tagged_int_map(script).unwrap(),
        TaggedValue::IntKeyMap(entries)
    );
}

// ===== Round-Trip Properties =====

fn tagged_strategy() -> impl Strategy<Value = TaggedValue> {
    tagged_values(0..4)
}

/// Generated values whose maps have `map_len` entries. The array map
/// container cannot tell an empty map from an empty list.
fn tagged_values(map_len: std::ops::Range<usize>) -> impl Strategy<Value = TaggedValue> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(TaggedValue::Bool),
        any::<i32>().prop_map(TaggedValue::Int),
        (-1.0e9f64..1.0e9).prop_map(TaggedValue::Double),
        "[a-zA-Z0-9 ]{0,8}".prop_map(TaggedValue::String),
    ];
    leaf.prop_recursive(4, 32, 4, move |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(TaggedValue::List),
            prop::collection::hash_map("[a-z]{1,6}", inner, map_len.clone())
                .prop_map(TaggedValue::Map),
        ]
    })
}

proptest! {
    #[test]
    fn prop_tagged_round_trip_with_object_maps(value in tagged_strategy()) {
        let engine = Engine::new();
        let options = BridgeOptions::default().with_map_container(MapContainer::Object);
        let converter = TaggedConverter::new(&engine, &options);

        let script = converter.from_tagged(&value).unwrap();
        let back = converter.to_tagged(script).unwrap();
        prop_assert_eq!(back, value);
        prop_assert_eq!(engine.outstanding_utf8(), 0);
    }

    #[test]
    fn prop_tagged_round_trip_with_default_options(value in tagged_values(1..4)) {
        let engine = Engine::new();
        let script = from_tagged(&engine, &value).unwrap();
        prop_assert_eq!(to_tagged(&engine, script).unwrap(), value);
        prop_assert_eq!(engine.outstanding_utf8(), 0);
    }

    #[test]
    fn prop_tagged_round_trip_under_collection(value in tagged_values(1..4)) {
        let engine = collecting_engine();
        let script = from_tagged(&engine, &value).unwrap();
        prop_assert_eq!(to_tagged(&engine, script).unwrap(), value);
    }

    #[test]
    fn prop_args_convert_one_by_one(ints in prop::collection::vec(any::<i32>(), 0..8)) {
        let engine = Engine::new();
        let args: Vec<ScriptValue> = ints.iter().copied().map(ScriptValue::int).collect();
        let options = BridgeOptions::default();
        let tagged = TaggedConverter::new(&engine, &options).args_to_tagged(&args).unwrap();
        let expected = TaggedValue::List(ints.into_iter().map(TaggedValue::Int).collect());
        prop_assert_eq!(tagged, expected);
    }
}
