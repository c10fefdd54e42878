//! Typed conversions between native records and scripting values
//!
//! Inbound readers (`to_*`) report failures to the engine as
//! `"Error processing arguments: ..."` before returning them. Outbound
//! writers (`*_to_value`) only return the error.
//!
//! Records are plain objects with fixed property names, for example a
//! [`geometry::Point`] is `{x, y}` and a [`color::Color4B`] is
//! `{r, g, b, a}`. Matrices and vector lists are arrays.

pub mod collections;
pub mod color;
pub mod geometry;
pub mod numeric;
pub mod render;
pub mod resource;
pub mod text;

pub use collections::{
    f32_vec_to_value, i32_vec_to_value, string_map_to_value, string_vec_to_value, to_f32_vec,
    to_i32_vec, to_string_map, to_string_vec, variadic_to_tagged,
};
pub use color::{Color3B, Color4B, Color4F};
pub use geometry::{Acceleration, AffineTransform, Point, Rect, Size};
pub use render::{BlendFunc, Tex2F, V3fC4bT2f, V3fC4bT2fQuad};
pub use resource::{ManifestAsset, ResourceData, Uniform};
pub use text::{
    FontDefinition, FontShadow, FontStroke, GlyphCollection, TextHAlignment, TextVAlignment,
    TtfConfig,
};
