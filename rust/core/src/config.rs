// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Export configuration

/// What to do when the geometry of a single custom-model face fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorPolicy {
    /// Abort the whole export on the first geometry failure
    Abort,
    /// Log the failure, drop that face, keep exporting
    #[default]
    SkipFace,
}

/// Toggles for one export job.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExportConfig {
    /// Merge coplanar same-block faces into rectangles instead of 1x1 quads.
    pub optimize: bool,
    /// Emit per-vertex normals.
    pub export_normals: bool,
    /// Emit per-vertex texture coordinates.
    pub export_uvs: bool,
    /// Emit a material library for the data sets.
    pub export_materials: bool,
    /// Copy textures out of the resource pack.
    pub export_textures: bool,
    /// Translate the finished mesh so its bounding box is centered on the origin.
    pub center_object: bool,
    /// Skip faces that look out of the region through its outer boundary.
    pub exclude_edge_faces: bool,
    /// Skip blocks on the outermost layer of the region.
    pub interior_only: bool,
    /// Folder that receives exported textures.
    pub texture_folder: String,
    /// Resource pack consulted by the texture exporter.
    pub resource_pack: String,
    /// Failure handling for custom-model faces.
    pub error_policy: ErrorPolicy,
    /// Seed for geometric sampling so repeated exports are identical.
    pub rng_seed: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            optimize: true,
            export_normals: true,
            export_uvs: true,
            export_materials: true,
            export_textures: false,
            center_object: false,
            exclude_edge_faces: false,
            interior_only: false,
            texture_folder: "textures".into(),
            resource_pack: String::new(),
            error_policy: ErrorPolicy::default(),
            rng_seed: 0x5EED,
        }
    }
}

impl ExportConfig {
    /// Load configuration from `SCHEM_MESH_*` environment variables.
    /// Missing or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ExportConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(default)
        };
        Self {
            optimize: flag("SCHEM_MESH_OPTIMIZE", defaults.optimize),
            export_normals: flag("SCHEM_MESH_EXPORT_NORMALS", defaults.export_normals),
            export_uvs: flag("SCHEM_MESH_EXPORT_UVS", defaults.export_uvs),
            export_materials: flag("SCHEM_MESH_EXPORT_MATERIALS", defaults.export_materials),
            export_textures: flag("SCHEM_MESH_EXPORT_TEXTURES", defaults.export_textures),
            center_object: flag("SCHEM_MESH_CENTER_OBJECT", defaults.center_object),
            exclude_edge_faces: flag("SCHEM_MESH_EXCLUDE_EDGE_FACES", defaults.exclude_edge_faces),
            interior_only: flag("SCHEM_MESH_INTERIOR_ONLY", defaults.interior_only),
            texture_folder: lookup("SCHEM_MESH_TEXTURE_FOLDER").unwrap_or(defaults.texture_folder),
            resource_pack: lookup("SCHEM_MESH_RESOURCE_PACK").unwrap_or(defaults.resource_pack),
            error_policy: match lookup("SCHEM_MESH_ERROR_POLICY").as_deref() {
                Some("abort") => ErrorPolicy::Abort,
                Some("skip_face") | Some("skip") => ErrorPolicy::SkipFace,
                _ => defaults.error_policy,
            },
            rng_seed: lookup("SCHEM_MESH_RNG_SEED")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rng_seed),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
