//! Color conversions
//!
//! Byte colors read `{r, g, b[, a]}` with each channel truncated and
//! saturated into `0..=255`. Float colors use the same 0-255 scale on the
//! scripting side and 0-1 natively.

use scriptbridge_sdk::{BridgeResult, FromScript, ScriptContext, ScriptObject, ScriptValue, ToScript};

use crate::report::reported;

/// RGB color with byte channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color3B {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Color3B {
    /// White
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Black
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// Blue
    pub const BLUE: Self = Self::new(0, 0, 255);

    /// Color from channels
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// RGBA color with byte channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color4B {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Color4B {
    /// Color from channels
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// RGBA color with float channels in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color4F {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Color4F {
    /// Color from channels
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

fn channels<const N: usize>(
    ctx: &dyn ScriptContext,
    value: ScriptValue,
    names: [&str; N],
) -> BridgeResult<[f64; N]> {
    let obj = ScriptObject::wrap(ctx, value)?;
    let mut out = [0.0; N];
    for (slot, name) in out.iter_mut().zip(names) {
        *slot = obj.get_number(name)?;
    }
    Ok(out)
}

fn write_ints(ctx: &dyn ScriptContext, fields: &[(&str, i32)]) -> BridgeResult<ScriptValue> {
    let obj = ScriptObject::new(ctx)?;
    for (name, n) in fields {
        obj.set_int(name, *n)?;
    }
    Ok(obj.into_value())
}

pub(crate) fn read_color3b(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Color3B> {
    let [r, g, b] = channels(ctx, value, ["r", "g", "b"])?;
    Ok(Color3B::new(r as u8, g as u8, b as u8))
}

pub(crate) fn read_color4b(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Color4B> {
    let [r, g, b, a] = channels(ctx, value, ["r", "g", "b", "a"])?;
    Ok(Color4B::new(r as u8, g as u8, b as u8, a as u8))
}

/// `{r, g, b}` to a byte color
pub fn to_color3b(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Color3B> {
    reported(ctx, "color3b", read_color3b(ctx, value))
}

/// Byte color to `{r, g, b}`
pub fn color3b_to_value(ctx: &dyn ScriptContext, c: &Color3B) -> BridgeResult<ScriptValue> {
    write_ints(ctx, &[("r", c.r as i32), ("g", c.g as i32), ("b", c.b as i32)])
}

/// `{r, g, b, a}` to a byte color
pub fn to_color4b(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Color4B> {
    reported(ctx, "color4b", read_color4b(ctx, value))
}

/// Byte color to `{r, g, b, a}`
pub fn color4b_to_value(ctx: &dyn ScriptContext, c: &Color4B) -> BridgeResult<ScriptValue> {
    write_ints(
        ctx,
        &[
            ("r", c.r as i32),
            ("g", c.g as i32),
            ("b", c.b as i32),
            ("a", c.a as i32),
        ],
    )
}

/// `{r, g, b, a}` on the 0-255 scale to a float color
pub fn to_color4f(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Color4F> {
    let result = channels(ctx, value, ["r", "g", "b", "a"]).map(|[r, g, b, a]| {
        Color4F::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    });
    reported(ctx, "color4f", result)
}

/// Float color to `{r, g, b, a}` on the 0-255 scale, rounded to integers so
/// that channels read with [`to_color4f`] come back unchanged
pub fn color4f_to_value(ctx: &dyn ScriptContext, c: &Color4F) -> BridgeResult<ScriptValue> {
    let scale = |channel: f32| (channel * 255.0).round() as i32;
    write_ints(
        ctx,
        &[
            ("r", scale(c.r)),
            ("g", scale(c.g)),
            ("b", scale(c.b)),
            ("a", scale(c.a)),
        ],
    )
}

/// The `a` channel of a color-like object. Unlike the color readers this
/// does not report: callers probe for opacity and fall back when absent.
pub fn to_opacity(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<i32> {
    let obj = ScriptObject::wrap(ctx, value)?;
    Ok(obj.get_number("a")? as i32)
}

impl FromScript for Color3B {
    fn from_script(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        read_color3b(ctx, value)
    }
}

impl ToScript for Color3B {
    fn to_script(&self, ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        color3b_to_value(ctx, self)
    }
}

impl FromScript for Color4B {
    fn from_script(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Self> {
        read_color4b(ctx, value)
    }
}

impl ToScript for Color4B {
    fn to_script(&self, ctx: &dyn ScriptContext) -> BridgeResult<ScriptValue> {
        color4b_to_value(ctx, self)
    }
}
