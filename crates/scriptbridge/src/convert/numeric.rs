//! Integer conversions
//!
//! 32-bit and narrower integers go through ToNumber (NaN rejected) and a
//! saturating truncation. 64-bit integers do not fit a double, so they travel
//! as decimal strings or as `[high, low]` pairs of 32-bit halves.

use scriptbridge_sdk::{
    number_not_nan, BridgeError, BridgeResult, ScriptArray, ScriptContext, ScriptValue,
};

use crate::options::Int64Repr;
use crate::report::reported;
use crate::string::TransientString;

/// ToNumber truncated to i32
pub fn to_i32(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<i32> {
    let result = match value.as_int() {
        Some(i) => Ok(i),
        None => number_not_nan(ctx, value).map(|n| n as i32),
    };
    reported(ctx, "int32", result)
}

/// ToNumber truncated to u32
pub fn to_u32(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<u32> {
    reported(ctx, "uint32", number_not_nan(ctx, value).map(|n| n as u32))
}

/// ToNumber truncated to u16
pub fn to_u16(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<u16> {
    reported(ctx, "uint16", number_not_nan(ctx, value).map(|n| n as u16))
}

/// Same as [`to_u16`]
pub fn to_ushort(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<u16> {
    to_u16(ctx, value)
}

/// Signed size through the int32 path
pub fn to_ssize(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<isize> {
    to_i32(ctx, value).map(|i| i as isize)
}

/// Int32 value
pub fn i32_to_value(n: i32) -> ScriptValue {
    ScriptValue::int(n)
}

/// Number value (int encoding when it fits)
pub fn u32_to_value(n: u32) -> ScriptValue {
    ScriptValue::number(n as f64)
}

/// Int32 value
pub fn u16_to_value(n: u16) -> ScriptValue {
    ScriptValue::int(n as i32)
}

/// Int32 value; sizes beyond the int32 range are rejected
pub fn ssize_to_value(n: isize) -> BridgeResult<ScriptValue> {
    i32::try_from(n)
        .map(ScriptValue::int)
        .map_err(|_| BridgeError::type_mismatch("int32-range size", n.to_string()))
}

// ============================================================================
// 64-bit
// ============================================================================

/// 64-bit signed integer from a `[high, low]` pair or from the leading
/// decimal integer of the value's string form. Text without a leading
/// integer reads as 0; out-of-range values saturate.
pub fn to_i64(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<i64> {
    let result = leading_integer(ctx, value).map(|n| match n {
        Wide::Pair(bits) => bits as i64,
        Wide::Parsed(n) => n.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
    });
    reported(ctx, "int64", result)
}

/// 64-bit unsigned integer, read like [`to_i64`]. Negative text wraps
/// around.
pub fn to_u64(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<u64> {
    let result = leading_integer(ctx, value).map(|n| match n {
        Wide::Pair(bits) => bits,
        Wide::Parsed(n) if n < 0 => (n.max(i64::MIN as i128) as i64) as u64,
        Wide::Parsed(n) => n.min(u64::MAX as i128) as u64,
    });
    reported(ctx, "uint64", result)
}

/// Scripting form of an i64
pub fn i64_to_value(ctx: &dyn ScriptContext, n: i64, repr: Int64Repr) -> BridgeResult<ScriptValue> {
    match repr {
        Int64Repr::String => ctx.create_string(&n.to_string()),
        Int64Repr::Uint32Pair => pair_to_value(ctx, n as u64),
    }
}

/// Scripting form of a u64
pub fn u64_to_value(ctx: &dyn ScriptContext, n: u64, repr: Int64Repr) -> BridgeResult<ScriptValue> {
    match repr {
        Int64Repr::String => ctx.create_string(&n.to_string()),
        Int64Repr::Uint32Pair => pair_to_value(ctx, n),
    }
}

fn pair_to_value(ctx: &dyn ScriptContext, bits: u64) -> BridgeResult<ScriptValue> {
    let high = (bits >> 32) as u32;
    let low = (bits & 0xffff_ffff) as u32;
    let array = ScriptArray::from_values(
        ctx,
        &[ScriptValue::number(high as f64), ScriptValue::number(low as f64)],
    )?;
    Ok(array.into_value())
}

enum Wide {
    Pair(u64),
    Parsed(i128),
}

fn leading_integer(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Wide> {
    if let Some(bits) = read_pair(ctx, value)? {
        return Ok(Wide::Pair(bits));
    }
    let mut view = TransientString::empty(ctx);
    if value.is_string() {
        view.set_handle(value)?;
    } else {
        view.set_handle(ctx.to_js_string(value)?)?;
    }
    Ok(Wide::Parsed(parse_leading_integer(view.as_str())))
}

fn read_pair(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Option<u64>> {
    if !ctx.is_array(value) || ctx.array_len(value)? != 2 {
        return Ok(None);
    }
    let half = |i| -> BridgeResult<Option<u32>> {
        let n = ctx.array_get(value, i)?.as_number();
        Ok(n.filter(|n| n.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(n))
            .map(|n| n as u32))
    };
    match (half(0)?, half(1)?) {
        (Some(high), Some(low)) => Ok(Some(((high as u64) << 32) | low as u64)),
        _ => Ok(None),
    }
}

/// Leading decimal integer after optional whitespace and sign; 0 when
/// there is none. Saturates far outside the 64-bit range.
fn parse_leading_integer(text: &str) -> i128 {
    let s = text.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i128, |acc, d| acc.saturating_mul(10).saturating_add((d - b'0') as i128));
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptbridge_engine::Engine;

    #[test]
    fn test_parse_leading_integer() {
        assert_eq!(parse_leading_integer("  42abc"), 42);
        assert_eq!(parse_leading_integer("-17"), -17);
        assert_eq!(parse_leading_integer("+5"), 5);
        assert_eq!(parse_leading_integer("abc"), 0);
        assert_eq!(parse_leading_integer(""), 0);
        assert_eq!(parse_leading_integer("1.9"), 1);
    }

    #[test]
    fn test_narrow_casts_truncate_and_saturate() {
        let engine = Engine::new();
        assert_eq!(to_i32(&engine, ScriptValue::double(-3.7)).unwrap(), -3);
        assert_eq!(to_u16(&engine, ScriptValue::int(70000)).unwrap(), u16::MAX);
        assert_eq!(to_u32(&engine, ScriptValue::int(-1)).unwrap(), 0);
        assert_eq!(to_ssize(&engine, ScriptValue::int(9)).unwrap(), 9);
    }

    #[test]
    fn test_nan_is_rejected_and_reported() {
        let engine = Engine::new();
        assert!(to_i32(&engine, ScriptValue::undefined()).is_err());
        assert_eq!(engine.take_reported_errors().len(), 1);
    }

    #[test]
    fn test_int64_string_form() {
        let engine = Engine::new();
        let v = i64_to_value(&engine, -9_007_199_254_740_993, Int64Repr::String).unwrap();
        assert_eq!(engine.read_string(v).unwrap(), "-9007199254740993");
        assert_eq!(to_i64(&engine, v).unwrap(), -9_007_199_254_740_993);

        let max = u64_to_value(&engine, u64::MAX, Int64Repr::String).unwrap();
        assert_eq!(to_u64(&engine, max).unwrap(), u64::MAX);
        assert_eq!(to_i64(&engine, max).unwrap(), i64::MAX);
    }

    #[test]
    fn test_int64_pair_form() {
        let engine = Engine::new();
        let n = 0x1234_5678_9abc_def0u64 as i64;
        let v = i64_to_value(&engine, n, Int64Repr::Uint32Pair).unwrap();
        assert!(engine.is_array(v));
        assert_eq!(engine.array_get(v, 0).unwrap().as_number(), Some(0x1234_5678u32 as f64));
        assert_eq!(to_i64(&engine, v).unwrap(), n);
        assert_eq!(to_i64(&engine, ScriptValue::int(12)).unwrap(), 12);
    }

    #[test]
    fn test_ssize_range() {
        assert_eq!(ssize_to_value(5).unwrap(), ScriptValue::int(5));
        assert!(ssize_to_value(i32::MAX as isize + 1).is_err());
    }
}
