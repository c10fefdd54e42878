//! Homogeneous container conversions
//!
//! Unlike the generic converter these do not coerce elements: a string
//! vector only accepts strings and a number vector only accepts numbers.

use std::collections::BTreeMap;

use scriptbridge_sdk::{
    describe, BridgeError, BridgeResult, PropertyKey, RootScope, ScriptArray, ScriptContext,
    ScriptObject, ScriptValue, TaggedValue,
};

use crate::generic::TaggedConverter;
use crate::options::BridgeOptions;
use crate::report::reported;
use crate::string::TransientString;

fn read_elements<T>(
    ctx: &dyn ScriptContext,
    value: ScriptValue,
    read: impl Fn(ScriptValue) -> BridgeResult<T>,
) -> BridgeResult<Vec<T>> {
    let array = ScriptArray::wrap(ctx, value)?;
    let len = array.len()?;
    let mut out = Vec::with_capacity(len as usize);
    for i in 0..len {
        out.push(read(array.get(i)?)?);
    }
    Ok(out)
}

fn strict_string(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<String> {
    if !value.is_string() {
        return Err(BridgeError::type_mismatch("string", describe(ctx, value)));
    }
    TransientString::from_handle(ctx, value).map(TransientString::into_string)
}

fn strict_number(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<f64> {
    value
        .as_number()
        .ok_or_else(|| BridgeError::type_mismatch("number", describe(ctx, value)))
}

/// Array of strings
pub fn to_string_vec(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Vec<String>> {
    let result = read_elements(ctx, value, |v| strict_string(ctx, v));
    reported(ctx, "string vector", result)
}

/// Array of numbers, truncated to i32
pub fn to_i32_vec(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Vec<i32>> {
    let result = read_elements(ctx, value, |v| strict_number(ctx, v).map(|n| n as i32));
    reported(ctx, "int vector", result)
}

/// Array of numbers, narrowed to f32
pub fn to_f32_vec(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Vec<f32>> {
    let result = read_elements(ctx, value, |v| strict_number(ctx, v).map(|n| n as f32));
    reported(ctx, "float vector", result)
}

/// Strings to an array
pub fn string_vec_to_value(ctx: &dyn ScriptContext, items: &[String]) -> BridgeResult<ScriptValue> {
    let mut roots = RootScope::new(ctx);
    let values = items
        .iter()
        .map(|s| ctx.create_string(s).map(|value| roots.root(value)))
        .collect::<BridgeResult<Vec<_>>>()?;
    Ok(ScriptArray::from_values(ctx, &values)?.into_value())
}

/// Integers to an array
pub fn i32_vec_to_value(ctx: &dyn ScriptContext, items: &[i32]) -> BridgeResult<ScriptValue> {
    let values: Vec<ScriptValue> = items.iter().copied().map(ScriptValue::int).collect();
    Ok(ScriptArray::from_values(ctx, &values)?.into_value())
}

/// Floats to an array
pub fn f32_vec_to_value(ctx: &dyn ScriptContext, items: &[f32]) -> BridgeResult<ScriptValue> {
    let values: Vec<ScriptValue> = items
        .iter()
        .map(|n| ScriptValue::number(*n as f64))
        .collect();
    Ok(ScriptArray::from_values(ctx, &values)?.into_value())
}

fn read_string_map(
    ctx: &dyn ScriptContext,
    value: ScriptValue,
) -> BridgeResult<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    if value.is_nullish() {
        return Ok(map);
    }
    if ctx.is_function(value) {
        return Err(BridgeError::type_mismatch("object", "function"));
    }
    let obj = ScriptObject::wrap(ctx, value)?;
    for key in obj.keys()? {
        let PropertyKey::Name(name) = key else {
            continue;
        };
        let element = obj.get(&name)?;
        let text = strict_string(ctx, element).map_err(|_| BridgeError::NotCoercible {
            property: name.clone(),
            reason: format!("expected string, got {}", describe(ctx, element)),
        })?;
        map.insert(name, text);
    }
    Ok(map)
}

/// Object with string values to a sorted map. `null`/`undefined` gives an
/// empty map; integer keys are skipped.
pub fn to_string_map(
    ctx: &dyn ScriptContext,
    value: ScriptValue,
) -> BridgeResult<BTreeMap<String, String>> {
    reported(ctx, "string map", read_string_map(ctx, value))
}

/// Map to a plain object with string values
pub fn string_map_to_value(
    ctx: &dyn ScriptContext,
    map: &BTreeMap<String, String>,
) -> BridgeResult<ScriptValue> {
    let mut roots = RootScope::new(ctx);
    let obj = ScriptObject::new_in(&mut roots)?;
    for (key, text) in map {
        obj.set_string(key, text)?;
    }
    Ok(obj.into_value())
}

/// Variadic call arguments as one tagged list, each argument converted
/// generically.
pub fn variadic_to_tagged(ctx: &dyn ScriptContext, args: &[ScriptValue]) -> BridgeResult<TaggedValue> {
    TaggedConverter::new(ctx, &BridgeOptions::default()).args_to_tagged(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptbridge_engine::Engine;

    #[test]
    fn test_string_vec_rejects_numbers() {
        let engine = Engine::new();
        let a = engine.create_string("a").unwrap();
        let array = ScriptArray::from_values(&engine, &[a, ScriptValue::int(1)]).unwrap();
        assert!(matches!(
            to_string_vec(&engine, array.value()),
            Err(BridgeError::TypeMismatch { .. })
        ));
        assert_eq!(engine.outstanding_utf8(), 0);
    }

    #[test]
    fn test_string_vec_round_trip() {
        let engine = Engine::new();
        let items = vec!["x".to_string(), String::new(), "ünï".to_string()];
        let value = string_vec_to_value(&engine, &items).unwrap();
        assert_eq!(to_string_vec(&engine, value).unwrap(), items);
    }

    #[test]
    fn test_number_vecs() {
        let engine = Engine::new();
        let value = f32_vec_to_value(&engine, &[1.5, -2.0]).unwrap();
        assert_eq!(to_f32_vec(&engine, value).unwrap(), vec![1.5, -2.0]);
        assert_eq!(to_i32_vec(&engine, value).unwrap(), vec![1, -2]);

        let s = engine.create_string("3").unwrap();
        let mixed = ScriptArray::from_values(&engine, &[ScriptValue::int(1), s]).unwrap();
        assert!(to_i32_vec(&engine, mixed.value()).is_err());
    }

    #[test]
    fn test_string_map() {
        let engine = Engine::new();
        assert!(to_string_map(&engine, ScriptValue::null()).unwrap().is_empty());

        let obj = ScriptObject::new(&engine).unwrap();
        obj.set_string("b", "2").unwrap();
        obj.set_string("a", "1").unwrap();
        obj.set("7", engine.create_string("skipped").unwrap()).unwrap();
        let map = to_string_map(&engine, obj.value()).unwrap();
        assert_eq!(
            map.into_iter().collect::<Vec<_>>(),
            vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
        );

        obj.set_int("c", 3).unwrap();
        assert!(matches!(
            to_string_map(&engine, obj.value()),
            Err(BridgeError::NotCoercible { .. })
        ));
    }

    #[test]
    fn test_variadic() {
        let engine = Engine::new();
        let list = variadic_to_tagged(&engine, &[ScriptValue::bool(true)]).unwrap();
        assert_eq!(list, TaggedValue::List(vec![TaggedValue::Bool(true)]));
        assert_eq!(
            variadic_to_tagged(&engine, &[]).unwrap(),
            TaggedValue::List(vec![])
        );
    }
}
