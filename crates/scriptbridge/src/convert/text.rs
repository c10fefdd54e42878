//! Text rendering configuration: TrueType font setup and font definitions.

use scriptbridge_sdk::{
    BridgeError, BridgeResult, RootScope, ScriptContext, ScriptObject, ScriptValue,
};

use super::color::{color3b_to_value, read_color3b, Color3B};
use super::geometry::Size;
use crate::report::reported;
use crate::string::TransientString;

/// Glyph set pre-rendered for a TrueType font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlyphCollection {
    /// Glyphs rendered on demand
    #[default]
    Dynamic,
    /// NeHe tutorial character set
    Nehe,
    /// Printable ASCII
    Ascii,
    /// Caller-supplied characters
    Custom,
}

impl GlyphCollection {
    /// Collection from its numeric value
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::Dynamic),
            1 => Some(Self::Nehe),
            2 => Some(Self::Ascii),
            3 => Some(Self::Custom),
            _ => None,
        }
    }
}

/// TrueType font configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TtfConfig {
    /// Font file path
    pub font_file_path: String,
    /// Point size, whole points
    pub font_size: f32,
    /// Glyph set
    pub glyphs: GlyphCollection,
    /// Characters for [`GlyphCollection::Custom`]
    pub custom_glyphs: Option<String>,
    /// Render with a distance field
    pub distance_field_enabled: bool,
    /// Outline thickness
    pub outline_size: i32,
}

impl Default for TtfConfig {
    fn default() -> Self {
        Self {
            font_file_path: String::new(),
            font_size: 12.0,
            glyphs: GlyphCollection::Dynamic,
            custom_glyphs: None,
            distance_field_enabled: false,
            outline_size: 0,
        }
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextHAlignment {
    /// Left
    #[default]
    Left,
    /// Center
    Center,
    /// Right
    Right,
}

/// Vertical text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextVAlignment {
    /// Top
    #[default]
    Top,
    /// Center
    Center,
    /// Bottom
    Bottom,
}

impl TextHAlignment {
    fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::Left),
            1 => Some(Self::Center),
            2 => Some(Self::Right),
            _ => None,
        }
    }

    fn index(self) -> i32 {
        self as i32
    }
}

impl TextVAlignment {
    fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::Top),
            1 => Some(Self::Center),
            2 => Some(Self::Bottom),
            _ => None,
        }
    }

    fn index(self) -> i32 {
        self as i32
    }
}

/// Drop shadow settings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FontShadow {
    /// Whether a shadow is drawn
    pub enabled: bool,
    /// Offset from the glyphs
    pub offset: Size,
    /// Blur radius
    pub blur: f32,
    /// Opacity
    pub opacity: f32,
}

/// Outline settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontStroke {
    /// Whether an outline is drawn
    pub enabled: bool,
    /// Outline color
    pub color: Color3B,
    /// Outline width
    pub size: f32,
}

impl Default for FontStroke {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Color3B::BLACK,
            size: 0.0,
        }
    }
}

/// System font rendering definition
#[derive(Debug, Clone, PartialEq)]
pub struct FontDefinition {
    /// Font family name
    pub font_name: String,
    /// Point size
    pub font_size: f32,
    /// Horizontal alignment
    pub alignment: TextHAlignment,
    /// Vertical alignment
    pub vert_alignment: TextVAlignment,
    /// Fill color
    pub fill_color: Color3B,
    /// Bounding box; zero means unbounded
    pub dimensions: Size,
    /// Shadow
    pub shadow: FontShadow,
    /// Outline
    pub stroke: FontStroke,
}

const DEFAULT_FONT_NAME: &str = "Arial";
const DEFAULT_FONT_SIZE: f32 = 32.0;

impl Default for FontDefinition {
    fn default() -> Self {
        Self {
            font_name: DEFAULT_FONT_NAME.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            alignment: TextHAlignment::Left,
            vert_alignment: TextVAlignment::Top,
            fill_color: Color3B::WHITE,
            dimensions: Size::default(),
            shadow: FontShadow::default(),
            stroke: FontStroke::default(),
        }
    }
}

// ============================================================================
// Readers
// ============================================================================

/// ToNumber of a property that is not `undefined`; NaN passes through.
fn number_if_present(obj: &ScriptObject<'_>, name: &str) -> BridgeResult<Option<f64>> {
    match obj.get_optional(name)? {
        Some(v) => obj.context().to_number(v).map(Some),
        None => Ok(None),
    }
}

fn string_if_present(obj: &ScriptObject<'_>, name: &str) -> BridgeResult<Option<String>> {
    match obj.get_optional(name)? {
        Some(v) => TransientString::from_value(obj.context(), v)
            .map(TransientString::into_string)
            .map(Some),
        None => Ok(None),
    }
}

fn enum_value<T>(name: &str, n: f64, from_index: fn(i32) -> Option<T>) -> BridgeResult<T> {
    from_index(n as i32).ok_or_else(|| BridgeError::NotCoercible {
        property: name.to_string(),
        reason: format!("{n} is not a valid value"),
    })
}

fn read_ttf_config(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<TtfConfig> {
    let obj = ScriptObject::wrap(ctx, value)?;
    let mut config = TtfConfig::default();

    if let Some(path) = string_if_present(&obj, "fontFilePath")? {
        config.font_file_path = path;
    }
    if let Some(n) = number_if_present(&obj, "fontSize")? {
        config.font_size = (n as i32) as f32;
    }
    if let Some(n) = number_if_present(&obj, "outlineSize")? {
        config.outline_size = n as i32;
    }
    if let Some(n) = number_if_present(&obj, "glyphs")? {
        config.glyphs = enum_value("glyphs", n, GlyphCollection::from_index)?;
    }
    let custom = string_if_present(&obj, "customGlyphs")?;
    if config.glyphs == GlyphCollection::Custom {
        config.custom_glyphs = custom.filter(|s| !s.is_empty());
    }
    if let Some(v) = obj.get_optional("distanceFieldEnable")? {
        config.distance_field_enabled = ctx.to_boolean(v);
    }
    Ok(config)
}

/// Object to a TrueType configuration; every property is optional.
pub fn to_ttf_config(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<TtfConfig> {
    reported(ctx, "ttf config", read_ttf_config(ctx, value))
}

fn read_font_definition(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<FontDefinition> {
    let obj = ScriptObject::wrap(ctx, value)?;
    let mut def = FontDefinition::default();

    if let Some(name) = string_if_present(&obj, "fontName")? {
        if !name.is_empty() {
            def.font_name = name;
        }
    }
    if let Some(n) = number_if_present(&obj, "fontSize")? {
        def.font_size = n as f32;
    }
    if let Some(n) = number_if_present(&obj, "textAlign")? {
        def.alignment = enum_value("textAlign", n, TextHAlignment::from_index)?;
    }
    if let Some(n) = number_if_present(&obj, "verticalAlign")? {
        def.vert_alignment = enum_value("verticalAlign", n, TextVAlignment::from_index)?;
    }
    if let Some(fill) = obj.get_optional("fillStyle")? {
        def.fill_color = read_color3b(ctx, fill)?;
    }
    if let (Some(w), Some(h)) = (
        number_if_present(&obj, "boundingWidth")?,
        number_if_present(&obj, "boundingHeight")?,
    ) {
        def.dimensions = Size::new(w as f32, h as f32);
    }

    if let Some(enabled) = obj.get_optional("shadowEnabled")? {
        def.shadow.enabled = ctx.to_boolean(enabled);
        if def.shadow.enabled {
            def.shadow.offset = Size::new(5.0, 5.0);
            def.shadow.blur = 1.0;
            def.shadow.opacity = 1.0;
            if let (Some(x), Some(y)) = (
                number_if_present(&obj, "shadowOffsetX")?,
                number_if_present(&obj, "shadowOffsetY")?,
            ) {
                def.shadow.offset = Size::new(x as f32, y as f32);
            }
            if let Some(blur) = number_if_present(&obj, "shadowBlur")? {
                def.shadow.blur = blur as f32;
            }
            if let Some(opacity) = number_if_present(&obj, "shadowOpacity")? {
                def.shadow.opacity = opacity as f32;
            }
        }
    }

    if let Some(enabled) = obj.get_optional("strokeEnabled")? {
        def.stroke.enabled = ctx.to_boolean(enabled);
        if def.stroke.enabled {
            def.stroke.size = 1.0;
            def.stroke.color = Color3B::BLUE;
            if let Some(style) = obj.get_optional("strokeStyle")? {
                def.stroke.color = read_color3b(ctx, style)?;
            }
            if let Some(width) = number_if_present(&obj, "lineWidth")? {
                def.stroke.size = width as f32;
            }
        }
    }
    Ok(def)
}

/// Object to a font definition, filling defaults for absent properties.
pub fn to_font_definition(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<FontDefinition> {
    reported(ctx, "font definition", read_font_definition(ctx, value))
}

/// Font definition to its scripting shape
pub fn font_definition_to_value(
    ctx: &dyn ScriptContext,
    def: &FontDefinition,
) -> BridgeResult<ScriptValue> {
    let mut roots = RootScope::new(ctx);
    let obj = ScriptObject::new_in(&mut roots)?;
    obj.set_string("fontName", &def.font_name)?;
    obj.set_number("fontSize", def.font_size as f64)?;
    obj.set_int("textAlign", def.alignment.index())?;
    obj.set_int("verticalAlign", def.vert_alignment.index())?;
    obj.set("fillStyle", color3b_to_value(ctx, &def.fill_color)?)?;
    obj.set_number("boundingWidth", def.dimensions.width as f64)?;
    obj.set_number("boundingHeight", def.dimensions.height as f64)?;

    obj.set_bool("shadowEnabled", def.shadow.enabled)?;
    obj.set_number("shadowOffsetX", def.shadow.offset.width as f64)?;
    obj.set_number("shadowOffsetY", def.shadow.offset.height as f64)?;
    obj.set_number("shadowBlur", def.shadow.blur as f64)?;
    obj.set_number("shadowOpacity", def.shadow.opacity as f64)?;

    obj.set_bool("strokeEnabled", def.stroke.enabled)?;
    obj.set("strokeStyle", color3b_to_value(ctx, &def.stroke.color)?)?;
    obj.set_number("lineWidth", def.stroke.size as f64)?;
    Ok(obj.into_value())
}
