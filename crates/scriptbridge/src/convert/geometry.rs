//! Geometry and math conversions
//!
//! Scripting-side shapes:
//!
//! | type | shape |
//! |---|---|
//! | [`Point`], [`Vec2`] | `{x, y}` |
//! | [`Size`] | `{width, height}` |
//! | [`Rect`] | `{x, y, width, height}` |
//! | [`Acceleration`] | `{x, y, z, timestamp}` |
//! | [`AffineTransform`] | `{a, b, c, d, tx, ty}` |
//! | [`Vec3`] | `{x, y, z}` |
//! | [`Vec4`], [`Quat`] | `{x, y, z, w}` |
//! | [`Mat4`] | array of 16 numbers, column-major |
//!
//! Point, size, rect, acceleration and transform fields accept NaN; the
//! glam vector, quaternion and matrix types do not.

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use scriptbridge_sdk::{
    describe, BridgeError, BridgeResult, FromScript, RootScope, ScriptArray, ScriptContext,
    ScriptObject, ScriptValue, ToScript,
};

use crate::report::reported;

/// 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Point at `(x, y)`
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 2D extent
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Size {
    /// Size of `width` by `height`
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Bottom-left corner
    pub origin: Point,
    /// Extent
    pub size: Size,
}

impl Rect {
    /// Rectangle from origin and extent components
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }
}

/// Accelerometer sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Acceleration {
    /// X axis
    pub x: f64,
    /// Y axis
    pub y: f64,
    /// Z axis
    pub z: f64,
    /// Sample time
    pub timestamp: f64,
}

/// 2D affine transform `[a c tx; b d ty]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    /// Row 1, column 1
    pub a: f32,
    /// Row 2, column 1
    pub b: f32,
    /// Row 1, column 2
    pub c: f32,
    /// Row 2, column 2
    pub d: f32,
    /// X translation
    pub tx: f32,
    /// Y translation
    pub ty: f32,
}

impl AffineTransform {
    /// The identity transform
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ============================================================================
// Readers (unreported; the public functions report)
// ============================================================================

fn read_numbers<const N: usize>(
    ctx: &dyn ScriptContext,
    value: ScriptValue,
    names: [&str; N],
    allow_nan: bool,
) -> BridgeResult<[f64; N]> {
    let obj = ScriptObject::wrap(ctx, value)?;
    let mut out = [0.0; N];
    for (slot, name) in out.iter_mut().zip(names) {
        *slot = if allow_nan {
            obj.get_number(name)?
        } else {
            obj.get_number_strict(name)?
        };
    }
    Ok(out)
}

fn write_numbers(ctx: &dyn ScriptContext, fields: &[(&str, f64)]) -> BridgeResult<ScriptValue> {
    let obj = ScriptObject::new(ctx)?;
    for (name, n) in fields {
        obj.set_number(name, *n)?;
    }
    Ok(obj.into_value())
}

pub(crate) fn read_point(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Point> {
    let [x, y] = read_numbers(ctx, value, ["x", "y"], true)?;
    Ok(Point::new(x as f32, y as f32))
}

pub(crate) fn read_vec2(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Vec2> {
    let [x, y] = read_numbers(ctx, value, ["x", "y"], false)?;
    Ok(Vec2::new(x as f32, y as f32))
}

pub(crate) fn read_vec3(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Vec3> {
    let [x, y, z] = read_numbers(ctx, value, ["x", "y", "z"], false)?;
    Ok(Vec3::new(x as f32, y as f32, z as f32))
}

pub(crate) fn vec3_value(ctx: &dyn ScriptContext, v: Vec3) -> BridgeResult<ScriptValue> {
    write_numbers(
        ctx,
        &[("x", v.x as f64), ("y", v.y as f64), ("z", v.z as f64)],
    )
}

fn read_array_of<T>(
    ctx: &dyn ScriptContext,
    value: ScriptValue,
    read: impl Fn(&dyn ScriptContext, ScriptValue) -> BridgeResult<T>,
) -> BridgeResult<Vec<T>> {
    let array = ScriptArray::wrap(ctx, value)?;
    let len = array.len()?;
    let mut out = Vec::with_capacity(len as usize);
    for i in 0..len {
        out.push(read(ctx, array.get(i)?)?);
    }
    Ok(out)
}

fn write_array_of<T>(
    ctx: &dyn ScriptContext,
    items: &[T],
    write: impl Fn(&dyn ScriptContext, &T) -> BridgeResult<ScriptValue>,
) -> BridgeResult<ScriptValue> {
    let mut roots = RootScope::new(ctx);
    let values = items
        .iter()
        .map(|item| write(ctx, item).map(|value| roots.root(value)))
        .collect::<BridgeResult<Vec<_>>>()?;
    Ok(ScriptArray::from_values(ctx, &values)?.into_value())
}

// ============================================================================
// Point, Size, Rect
// ============================================================================

/// `{x, y}` to a point
pub fn to_point(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Point> {
    reported(ctx, "point", read_point(ctx, value))
}

/// Point to `{x, y}`
pub fn point_to_value(ctx: &dyn ScriptContext, p: &Point) -> BridgeResult<ScriptValue> {
    write_numbers(ctx, &[("x", p.x as f64), ("y", p.y as f64)])
}

/// Array of `{x, y}` to points
pub fn to_point_array(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Vec<Point>> {
    reported(ctx, "point array", read_array_of(ctx, value, read_point))
}

/// Points to an array of `{x, y}`
pub fn point_array_to_value(ctx: &dyn ScriptContext, points: &[Point]) -> BridgeResult<ScriptValue> {
    write_array_of(ctx, points, point_to_value)
}

/// `{width, height}` to a size
pub fn to_size(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Size> {
    let result = read_numbers(ctx, value, ["width", "height"], true)
        .map(|[w, h]| Size::new(w as f32, h as f32));
    reported(ctx, "size", result)
}

/// Size to `{width, height}`
pub fn size_to_value(ctx: &dyn ScriptContext, s: &Size) -> BridgeResult<ScriptValue> {
    write_numbers(ctx, &[("width", s.width as f64), ("height", s.height as f64)])
}

/// `{x, y, width, height}` to a rect
pub fn to_rect(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Rect> {
    let result = read_numbers(ctx, value, ["x", "y", "width", "height"], true)
        .map(|[x, y, w, h]| Rect::new(x as f32, y as f32, w as f32, h as f32));
    reported(ctx, "rect", result)
}

/// Rect to `{x, y, width, height}`
pub fn rect_to_value(ctx: &dyn ScriptContext, r: &Rect) -> BridgeResult<ScriptValue> {
    write_numbers(
        ctx,
        &[
            ("x", r.origin.x as f64),
            ("y", r.origin.y as f64),
            ("width", r.size.width as f64),
            ("height", r.size.height as f64),
        ],
    )
}

// ============================================================================
// Acceleration, AffineTransform
// ============================================================================

/// `{x, y, z, timestamp}` to an acceleration sample
pub fn to_acceleration(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Acceleration> {
    let result = read_numbers(ctx, value, ["x", "y", "z", "timestamp"], true).map(
        |[x, y, z, timestamp]| Acceleration { x, y, z, timestamp },
    );
    reported(ctx, "acceleration", result)
}

/// Acceleration sample to `{x, y, z, timestamp}`
pub fn acceleration_to_value(ctx: &dyn ScriptContext, a: &Acceleration) -> BridgeResult<ScriptValue> {
    write_numbers(
        ctx,
        &[("x", a.x), ("y", a.y), ("z", a.z), ("timestamp", a.timestamp)],
    )
}

/// `{a, b, c, d, tx, ty}` to a transform
pub fn to_affine_transform(
    ctx: &dyn ScriptContext,
    value: ScriptValue,
) -> BridgeResult<AffineTransform> {
    let result = read_numbers(ctx, value, ["a", "b", "c", "d", "tx", "ty"], true).map(
        |[a, b, c, d, tx, ty]| AffineTransform {
            a: a as f32,
            b: b as f32,
            c: c as f32,
            d: d as f32,
            tx: tx as f32,
            ty: ty as f32,
        },
    );
    reported(ctx, "affine transform", result)
}

/// Transform to `{a, b, c, d, tx, ty}`
pub fn affine_transform_to_value(
    ctx: &dyn ScriptContext,
    t: &AffineTransform,
) -> BridgeResult<ScriptValue> {
    write_numbers(
        ctx,
        &[
            ("a", t.a as f64),
            ("b", t.b as f64),
            ("c", t.c as f64),
            ("d", t.d as f64),
            ("tx", t.tx as f64),
            ("ty", t.ty as f64),
        ],
    )
}

// ============================================================================
// Vectors, quaternion, matrix
// ============================================================================

/// `{x, y}` to a vector
pub fn to_vec2(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Vec2> {
    reported(ctx, "vec2", read_vec2(ctx, value))
}

/// Vector to `{x, y}`
pub fn vec2_to_value(ctx: &dyn ScriptContext, v: Vec2) -> BridgeResult<ScriptValue> {
    write_numbers(ctx, &[("x", v.x as f64), ("y", v.y as f64)])
}

/// Array of `{x, y}` to vectors
pub fn to_vec2_list(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Vec<Vec2>> {
    reported(ctx, "vec2 list", read_array_of(ctx, value, read_vec2))
}

/// Vectors to an array of `{x, y}`
pub fn vec2_list_to_value(ctx: &dyn ScriptContext, list: &[Vec2]) -> BridgeResult<ScriptValue> {
    write_array_of(ctx, list, |ctx, v| vec2_to_value(ctx, *v))
}

/// `{x, y, z}` to a vector
pub fn to_vec3(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Vec3> {
    reported(ctx, "vec3", read_vec3(ctx, value))
}

/// Vector to `{x, y, z}`
pub fn vec3_to_value(ctx: &dyn ScriptContext, v: Vec3) -> BridgeResult<ScriptValue> {
    vec3_value(ctx, v)
}

/// `{x, y, z, w}` to a vector
pub fn to_vec4(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Vec4> {
    let result = read_numbers(ctx, value, ["x", "y", "z", "w"], false)
        .map(|[x, y, z, w]| Vec4::new(x as f32, y as f32, z as f32, w as f32));
    reported(ctx, "vec4", result)
}

/// Vector to `{x, y, z, w}`
pub fn vec4_to_value(ctx: &dyn ScriptContext, v: Vec4) -> BridgeResult<ScriptValue> {
    write_numbers(
        ctx,
        &[
            ("x", v.x as f64),
            ("y", v.y as f64),
            ("z", v.z as f64),
            ("w", v.w as f64),
        ],
    )
}

/// `{x, y, z, w}` to a quaternion (not normalized)
pub fn to_quat(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Quat> {
    let result = read_numbers(ctx, value, ["x", "y", "z", "w"], false)
        .map(|[x, y, z, w]| Quat::from_xyzw(x as f32, y as f32, z as f32, w as f32));
    reported(ctx, "quaternion", result)
}

/// Quaternion to `{x, y, z, w}`
pub fn quat_to_value(ctx: &dyn ScriptContext, q: Quat) -> BridgeResult<ScriptValue> {
    write_numbers(
        ctx,
        &[
            ("x", q.x as f64),
            ("y", q.y as f64),
            ("z", q.z as f64),
            ("w", q.w as f64),
        ],
    )
}

const MAT4_LEN: usize = 16;

fn read_mat4(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Mat4> {
    if !ctx.is_array(value) {
        return Err(BridgeError::type_mismatch("array", describe(ctx, value)));
    }
    let array = ScriptArray::wrap(ctx, value)?;
    let len = array.len()? as usize;
    if len != MAT4_LEN {
        return Err(BridgeError::ArrayLengthMismatch {
            expected: MAT4_LEN,
            got: len,
        });
    }
    let mut cols = [0.0f32; MAT4_LEN];
    for (i, slot) in (0u32..).zip(cols.iter_mut()) {
        let element = array.get(i)?;
        let n = element
            .as_number()
            .ok_or_else(|| BridgeError::type_mismatch("number", describe(ctx, element)))?;
        *slot = n as f32;
    }
    Ok(Mat4::from_cols_array(&cols))
}

/// Array of exactly 16 numbers (column-major) to a matrix. Elements are not
/// coerced: each must already be a number.
pub fn to_mat4(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Mat4> {
    reported(ctx, "matrix", read_mat4(ctx, value))
}

/// Matrix to an array of 16 numbers, column-major
pub fn mat4_to_value(ctx: &dyn ScriptContext, m: &Mat4) -> BridgeResult<ScriptValue> {
    let values: Vec<ScriptValue> = m
        .to_cols_array()
        .iter()
        .map(|n| ScriptValue::double(*n as f64))
        .collect();
    Ok(ScriptArray::from_values(ctx, &values)?.into_value())
}

// ============================================================================
// Trait implementations
// ============================================================================

impl FromScript for Point {
    fn from_script(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        read_point(ctx, value)
    }
}

impl ToScript for Point {
    fn to_script(&self, ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        point_to_value(ctx, self)
    }
}

impl ToScript for Size {
    fn to_script(&self, ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        size_to_value(ctx, self)
    }
}

impl ToScript for Rect {
    fn to_script(&self, ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        rect_to_value(ctx, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptbridge_engine::Engine;
    use scriptbridge_sdk::PropertyKey;

    #[test]
    fn test_point_round_trip_keeps_int_encoding() {
        let engine = Engine::new();
        let obj = ScriptObject::new(&engine).unwrap();
        obj.set_int("x", 1).unwrap();
        obj.set_int("y", 2).unwrap();

        let p = to_point(&engine, obj.value()).unwrap();
        assert_eq!(p, Point::new(1.0, 2.0));

        let back = point_to_value(&engine, &p).unwrap();
        assert_eq!(engine.get_property(back, "x").unwrap(), ScriptValue::int(1));
        assert_eq!(engine.get_property(back, "y").unwrap(), ScriptValue::int(2));
        assert_eq!(
            engine.own_property_keys(back).unwrap(),
            vec![PropertyKey::Name("x".into()), PropertyKey::Name("y".into())]
        );
    }

    #[test]
    fn test_point_accepts_nan_vec2_does_not() {
        let engine = Engine::new();
        let obj = ScriptObject::new(&engine).unwrap();
        obj.set_number("x", f64::NAN).unwrap();
        obj.set_int("y", 0).unwrap();
        assert!(to_point(&engine, obj.value()).unwrap().x.is_nan());
        assert!(matches!(
            to_vec2(&engine, obj.value()),
            Err(BridgeError::NotCoercible { .. })
        ));
        assert_eq!(engine.take_reported_errors().len(), 1);
    }

    #[test]
    fn test_missing_field_fails() {
        let engine = Engine::new();
        let obj = ScriptObject::new(&engine).unwrap();
        obj.set_int("width", 3).unwrap();
        assert_eq!(
            to_size(&engine, obj.value()),
            Err(BridgeError::missing("height"))
        );
    }

    #[test]
    fn test_vec4_keeps_w() {
        let engine = Engine::new();
        let v = Vec4::new(1.0, 2.0, 3.0, 4.0);
        let value = vec4_to_value(&engine, v).unwrap();
        assert_eq!(to_vec4(&engine, value).unwrap(), v);
    }

    #[test]
    fn test_mat4_identity_round_trip() {
        let engine = Engine::new();
        let value = mat4_to_value(&engine, &Mat4::IDENTITY).unwrap();
        assert_eq!(engine.array_len(value).unwrap(), 16);
        assert_eq!(to_mat4(&engine, value).unwrap(), Mat4::IDENTITY);
    }

    #[test]
    fn test_mat4_is_column_major() {
        let engine = Engine::new();
        let m = Mat4::from_translation(Vec3::new(7.0, 8.0, 9.0));
        let value = mat4_to_value(&engine, &m).unwrap();
        assert_eq!(engine.array_get(value, 12).unwrap().as_number(), Some(7.0));
        assert_eq!(to_mat4(&engine, value).unwrap(), m);
    }

    #[test]
    fn test_mat4_rejects_bad_input() {
        let engine = Engine::new();
        let obj = engine.create_object(None).unwrap();
        assert!(matches!(
            to_mat4(&engine, obj),
            Err(BridgeError::TypeMismatch { .. })
        ));

        let short = ScriptArray::from_values(&engine, &[ScriptValue::int(1); 15]).unwrap();
        assert_eq!(
            to_mat4(&engine, short.value()),
            Err(BridgeError::ArrayLengthMismatch {
                expected: 16,
                got: 15
            })
        );

        let mut values = [ScriptValue::int(0); 16];
        values[3] = engine.create_string("1").unwrap();
        let stringy = ScriptArray::from_values(&engine, &values).unwrap();
        assert!(matches!(
            to_mat4(&engine, stringy.value()),
            Err(BridgeError::TypeMismatch { .. })
        ));
        assert_eq!(engine.take_reported_errors().len(), 3);
    }

    #[test]
    fn test_point_array() {
        let engine = Engine::new();
        let points = vec![Point::new(0.5, 1.0), Point::new(-2.0, 3.25)];
        let value = point_array_to_value(&engine, &points).unwrap();
        assert_eq!(to_point_array(&engine, value).unwrap(), points);
        assert!(to_point_array(&engine, ScriptValue::int(1)).is_err());
    }

    #[test]
    fn test_traits_delegate() {
        let engine = Engine::new();
        let value = Point::new(3.0, 4.0).to_script(&engine).unwrap();
        assert_eq!(Point::from_script(&engine, value).unwrap(), Point::new(3.0, 4.0));
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0).to_script(&engine).unwrap();
        assert_eq!(to_rect(&engine, rect).unwrap(), Rect::new(1.0, 2.0, 3.0, 4.0));
    }
}
