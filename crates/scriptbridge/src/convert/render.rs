//! Rendering record conversions: blend functions, texture coordinates and
//! textured colored vertices.

use glam::Vec3;
use scriptbridge_sdk::{
    BridgeResult, RootScope, ScriptArray, ScriptContext, ScriptObject, ScriptValue,
};

use super::color::{color4b_to_value, read_color4b, Color4B};
use super::geometry::{read_vec3, vec3_value};
use crate::report::reported;

/// Source and destination blend factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlendFunc {
    /// Source factor
    pub src: u32,
    /// Destination factor
    pub dst: u32,
}

/// Texture coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tex2F {
    /// Horizontal coordinate
    pub u: f32,
    /// Vertical coordinate
    pub v: f32,
}

/// Vertex with position, byte color and texture coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct V3fC4bT2f {
    /// Position
    pub vertices: Vec3,
    /// Color
    pub colors: Color4B,
    /// Texture coordinate
    pub tex_coords: Tex2F,
}

/// Four vertices of a textured quad
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct V3fC4bT2fQuad {
    /// Top left
    pub tl: V3fC4bT2f,
    /// Bottom left
    pub bl: V3fC4bT2f,
    /// Top right
    pub tr: V3fC4bT2f,
    /// Bottom right
    pub br: V3fC4bT2f,
}

/// `{src, dst}` to blend factors
pub fn to_blend_func(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<BlendFunc> {
    let result = ScriptObject::wrap(ctx, value).and_then(|obj| {
        Ok(BlendFunc {
            src: obj.get_number("src")? as u32,
            dst: obj.get_number("dst")? as u32,
        })
    });
    reported(ctx, "blend function", result)
}

/// Blend factors to `{src, dst}`
pub fn blend_func_to_value(ctx: &dyn ScriptContext, f: &BlendFunc) -> BridgeResult<ScriptValue> {
    let obj = ScriptObject::new(ctx)?;
    obj.set_number("src", f.src as f64)?;
    obj.set_number("dst", f.dst as f64)?;
    Ok(obj.into_value())
}

fn read_tex2f(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Tex2F> {
    let obj = ScriptObject::wrap(ctx, value)?;
    Ok(Tex2F {
        u: obj.get_number_strict("x")? as f32,
        v: obj.get_number_strict("y")? as f32,
    })
}

/// `{x, y}` to a texture coordinate
pub fn to_tex2f(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Tex2F> {
    reported(ctx, "tex2f", read_tex2f(ctx, value))
}

/// Texture coordinate to `{x, y}`
pub fn tex2f_to_value(ctx: &dyn ScriptContext, t: &Tex2F) -> BridgeResult<ScriptValue> {
    let obj = ScriptObject::new(ctx)?;
    obj.set_number("x", t.u as f64)?;
    obj.set_number("y", t.v as f64)?;
    Ok(obj.into_value())
}

fn read_vertex(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<V3fC4bT2f> {
    let obj = ScriptObject::wrap(ctx, value)?;
    Ok(V3fC4bT2f {
        vertices: read_vec3(ctx, obj.get_required("v3f")?)?,
        colors: read_color4b(ctx, obj.get_required("c4b")?)?,
        tex_coords: read_tex2f(ctx, obj.get_required("t2f")?)?,
    })
}

/// `{v3f, c4b, t2f}` to a vertex
pub fn to_vertex(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<V3fC4bT2f> {
    reported(ctx, "vertex", read_vertex(ctx, value))
}

/// Vertex to `{v3f, c4b, t2f}`
pub fn vertex_to_value(ctx: &dyn ScriptContext, v: &V3fC4bT2f) -> BridgeResult<ScriptValue> {
    let mut roots = RootScope::new(ctx);
    let obj = ScriptObject::new_in(&mut roots)?;
    obj.set("v3f", vec3_value(ctx, v.vertices)?)?;
    obj.set("c4b", color4b_to_value(ctx, &v.colors)?)?;
    obj.set("t2f", tex2f_to_value(ctx, &v.tex_coords)?)?;
    Ok(obj.into_value())
}

/// `{tl, bl, tr, br}` to a quad
pub fn to_quad(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<V3fC4bT2fQuad> {
    let result = ScriptObject::wrap(ctx, value).and_then(|obj| {
        Ok(V3fC4bT2fQuad {
            tl: read_vertex(ctx, obj.get_required("tl")?)?,
            bl: read_vertex(ctx, obj.get_required("bl")?)?,
            tr: read_vertex(ctx, obj.get_required("tr")?)?,
            br: read_vertex(ctx, obj.get_required("br")?)?,
        })
    });
    reported(ctx, "quad", result)
}

/// Quad to `{tl, bl, tr, br}`
pub fn quad_to_value(ctx: &dyn ScriptContext, q: &V3fC4bT2fQuad) -> BridgeResult<ScriptValue> {
    let mut roots = RootScope::new(ctx);
    let obj = ScriptObject::new_in(&mut roots)?;
    for (name, vertex) in [("tl", &q.tl), ("bl", &q.bl), ("tr", &q.tr), ("br", &q.br)] {
        obj.set(name, vertex_to_value(ctx, vertex)?)?;
    }
    Ok(obj.into_value())
}

/// Array of `{v3f, c4b, t2f}` to vertices
pub fn to_vertex_list(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<Vec<V3fC4bT2f>> {
    let result: BridgeResult<Vec<V3fC4bT2f>> = ScriptArray::wrap(ctx, value)
        .and_then(|array| array.to_vec())
        .and_then(|items| items.into_iter().map(|v| read_vertex(ctx, v)).collect());
    reported(ctx, "vertex list", result)
}

/// Vertices to an array of `{v3f, c4b, t2f}`
pub fn vertex_list_to_value(ctx: &dyn ScriptContext, list: &[V3fC4bT2f]) -> BridgeResult<ScriptValue> {
    let mut roots = RootScope::new(ctx);
    let values = list
        .iter()
        .map(|v| vertex_to_value(ctx, v).map(|value| roots.root(value)))
        .collect::<BridgeResult<Vec<_>>>()?;
    Ok(ScriptArray::from_values(ctx, &values)?.into_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptbridge_engine::Engine;
    use scriptbridge_sdk::BridgeError;

    fn sample_vertex(seed: f32) -> V3fC4bT2f {
        V3fC4bT2f {
            vertices: Vec3::new(seed, seed + 1.0, seed + 2.0),
            colors: Color4B::new(10, 20, 30, 255),
            tex_coords: Tex2F { u: 0.25, v: 0.75 },
        }
    }

    #[test]
    fn test_tex2f_maps_xy_to_uv() {
        let engine = Engine::new();
        let obj = ScriptObject::new(&engine).unwrap();
        obj.set_number("x", 0.5).unwrap();
        obj.set_number("y", 1.0).unwrap();
        assert_eq!(
            to_tex2f(&engine, obj.value()).unwrap(),
            Tex2F { u: 0.5, v: 1.0 }
        );
    }

    #[test]
    fn test_blend_func() {
        let engine = Engine::new();
        let f = BlendFunc { src: 1, dst: 0x0303 };
        let value = blend_func_to_value(&engine, &f).unwrap();
        assert_eq!(to_blend_func(&engine, value).unwrap(), f);
    }

    #[test]
    fn test_quad_round_trip() {
        let engine = Engine::new();
        let quad = V3fC4bT2fQuad {
            tl: sample_vertex(0.0),
            bl: sample_vertex(1.0),
            tr: sample_vertex(2.0),
            br: sample_vertex(3.0),
        };
        let value = quad_to_value(&engine, &quad).unwrap();
        assert_eq!(to_quad(&engine, value).unwrap(), quad);
    }

    #[test]
    fn test_vertex_missing_color_fails() {
        let engine = Engine::new();
        let value = vertex_to_value(&engine, &sample_vertex(0.0)).unwrap();
        engine
            .set_property(value, "c4b", ScriptValue::undefined())
            .unwrap();
        assert_eq!(to_vertex(&engine, value), Err(BridgeError::missing("c4b")));
    }

    #[test]
    fn test_vertex_list() {
        let engine = Engine::new();
        let list = vec![sample_vertex(5.0), sample_vertex(-1.5)];
        let value = vertex_list_to_value(&engine, &list).unwrap();
        assert_eq!(to_vertex_list(&engine, value).unwrap(), list);
        let obj = engine.create_object(None).unwrap();
        assert!(to_vertex_list(&engine, obj).is_err());
    }
}
