//! Resource descriptors: loadable resources, shader uniforms and
//! downloadable manifest assets.

use scriptbridge_sdk::{BridgeResult, RootScope, ScriptContext, ScriptObject, ScriptValue};

use crate::report::reported;
use crate::string::TransientString;

/// A loadable resource file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceData {
    /// Resource kind code
    pub kind: i32,
    /// File path
    pub file: String,
    /// Sprite sheet path, empty when unused
    pub plist: String,
}

/// Shader uniform description
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Uniform {
    /// Uniform location
    pub location: i32,
    /// Array size
    pub size: i32,
    /// GL type enum
    pub kind: u32,
    /// Uniform name
    pub name: String,
}

/// Asset entry of a download manifest
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ManifestAsset {
    /// Content hash
    pub md5: String,
    /// Relative path
    pub path: String,
    /// Stored compressed
    pub compressed: bool,
    /// Size in bytes
    pub size: f64,
    /// Download state code
    pub download_state: i32,
}

fn read_resource_data(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<ResourceData> {
    let obj = ScriptObject::wrap(ctx, value)?;
    let text = |name: &str| -> BridgeResult<String> {
        TransientString::from_value(ctx, obj.get(name)?).map(TransientString::into_string)
    };
    Ok(ResourceData {
        kind: obj.get_number("type")? as i32,
        file: text("name")?,
        plist: text("plist")?,
    })
}

/// `{type, name, plist}` to a resource descriptor. `name` and `plist`
/// read as empty when absent.
pub fn to_resource_data(ctx: &dyn ScriptContext, value: ScriptValue) -> BridgeResult<ResourceData> {
    reported(ctx, "resource data", read_resource_data(ctx, value))
}

/// Resource descriptor to `{type, file, plist}`
pub fn resource_data_to_value(
    ctx: &dyn ScriptContext,
    data: &ResourceData,
) -> BridgeResult<ScriptValue> {
    let mut roots = RootScope::new(ctx);
    let obj = ScriptObject::new_in(&mut roots)?;
    obj.set_int("type", data.kind)?;
    obj.set_string("file", &data.file)?;
    obj.set_string("plist", &data.plist)?;
    Ok(obj.into_value())
}

/// Uniform to `{location, size, type, name}`
pub fn uniform_to_value(ctx: &dyn ScriptContext, uniform: &Uniform) -> BridgeResult<ScriptValue> {
    let mut roots = RootScope::new(ctx);
    let obj = ScriptObject::new_in(&mut roots)?;
    obj.set_int("location", uniform.location)?;
    obj.set_int("size", uniform.size)?;
    obj.set_number("type", uniform.kind as f64)?;
    obj.set_string("name", &uniform.name)?;
    Ok(obj.into_value())
}

/// Manifest asset to `{md5, path, compressed, size, downloadState}`
pub fn asset_to_value(ctx: &dyn ScriptContext, asset: &ManifestAsset) -> BridgeResult<ScriptValue> {
    let mut roots = RootScope::new(ctx);
    let obj = ScriptObject::new_in(&mut roots)?;
    obj.set_string("md5", &asset.md5)?;
    obj.set_string("path", &asset.path)?;
    obj.set_bool("compressed", asset.compressed)?;
    obj.set_number("size", asset.size)?;
    obj.set_int("downloadState", asset.download_state)?;
    Ok(obj.into_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptbridge_engine::Engine;
    use scriptbridge_sdk::BridgeError;

    #[test]
    fn test_resource_data_reads_name_writes_file() {
        let engine = Engine::new();
        let obj = ScriptObject::new(&engine).unwrap();
        obj.set_string("type", "2").unwrap();
        obj.set_string("name", "hero.png").unwrap();
        let data = to_resource_data(&engine, obj.value()).unwrap();
        assert_eq!(
            data,
            ResourceData {
                kind: 2,
                file: "hero.png".to_string(),
                plist: String::new(),
            }
        );

        let out = resource_data_to_value(&engine, &data).unwrap();
        let out = ScriptObject::wrap(&engine, out).unwrap();
        assert_eq!(out.get_string("file").unwrap(), "hero.png");
        assert_eq!(out.get("name").unwrap(), ScriptValue::undefined());
        assert_eq!(engine.outstanding_utf8(), 0);
    }

    #[test]
    fn test_resource_data_needs_type() {
        let engine = Engine::new();
        let obj = ScriptObject::new(&engine).unwrap();
        assert_eq!(
            to_resource_data(&engine, obj.value()),
            Err(BridgeError::missing("type"))
        );
    }

    #[test]
    fn test_uniform_and_asset_shapes() {
        let engine = Engine::new();
        let uniform = Uniform {
            location: 3,
            size: 1,
            kind: 0x8B5C,
            name: "u_mvp".to_string(),
        };
        let u = ScriptObject::wrap(&engine, uniform_to_value(&engine, &uniform).unwrap()).unwrap();
        assert_eq!(u.get("type").unwrap(), ScriptValue::int(0x8B5C));
        assert_eq!(u.get_string("name").unwrap(), "u_mvp");

        let asset = ManifestAsset {
            md5: "abc".to_string(),
            path: "res/a.png".to_string(),
            compressed: true,
            size: 1024.0,
            download_state: 2,
        };
        let a = ScriptObject::wrap(&engine, asset_to_value(&engine, &asset).unwrap()).unwrap();
        assert!(a.get_bool("compressed").unwrap());
        assert_eq!(a.get("downloadState").unwrap(), ScriptValue::int(2));
        assert_eq!(a.get_number("size").unwrap(), 1024.0);
    }
}
