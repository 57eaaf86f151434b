// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON loading for export configuration and block tables

use crate::error::{Error, Result};
use schem_mesh_core::{BlockTable, ExportConfig};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Reject configurations the exporter cannot honour
pub fn validate_config(config: &ExportConfig) -> Result<()> {
    if config.export_textures && config.texture_folder.trim().is_empty() {
        return Err(Error::Config(
            "texture_folder must be set when export_textures is enabled".into(),
        ));
    }
    Ok(())
}

/// Parse an export configuration; missing fields keep their defaults
pub fn parse_config(json: &str) -> Result<ExportConfig> {
    let config: ExportConfig = serde_json::from_str(json)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<ExportConfig> {
    let path = path.as_ref();
    let config = parse_config(&fs::read_to_string(path)?)?;
    debug!(path = %path.display(), "Loaded export config");
    Ok(config)
}

/// Parse a block table and reject entries with unusable model boxes
pub fn parse_block_table(json: &str) -> Result<BlockTable> {
    let table: BlockTable = serde_json::from_str(json)?;
    table.validate()?;
    Ok(table)
}

pub fn load_block_table(path: impl AsRef<Path>) -> Result<BlockTable> {
    let path = path.as_ref();
    let table = parse_block_table(&fs::read_to_string(path)?)?;
    debug!(path = %path.display(), entries = table.len(), "Loaded block table");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schem_mesh_core::{Block, BlockCatalog, ErrorPolicy, Side};

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config(r#"{"optimize": false, "error_policy": "abort"}"#).unwrap();
        assert!(!config.optimize);
        assert_eq!(config.error_policy, ErrorPolicy::Abort);
        assert!(config.export_normals);
        assert_eq!(config.texture_folder, "textures");
    }

    #[test]
    fn test_texture_export_needs_folder() {
        let err = parse_config(r#"{"export_textures": true, "texture_folder": " "}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(parse_config(r#"{"export_textures": true}"#).is_ok());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse_config("{optimize"), Err(Error::Json(_))));
        assert!(matches!(parse_block_table("{}"), Err(Error::Json(_))));
    }

    #[test]
    fn test_block_table_rejects_flat_model_box() {
        let json = r#"[{"id": 44, "name": "slab", "textures": "stone_slab",
            "model": [{"min": [0.0, 0.5, 0.0], "max": [1.0, 0.5, 1.0]}]}]"#;
        let err = parse_block_table(json).unwrap_err();
        assert!(
            matches!(err, Error::Core(schem_mesh_core::Error::Catalog(_))),
            "{err:?}"
        );
        assert!(err.to_string().contains("44"));
    }

    #[test]
    fn test_load_from_files() {
        let dir = std::env::temp_dir().join(format!("schem-mesh-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let config_path = dir.join("export.json");
        let table_path = dir.join("blocks.json");
        fs::write(&config_path, r#"{"center_object": true}"#).unwrap();
        fs::write(
            &table_path,
            r#"[{"id": 17, "name": "log", "textures": {"top": "log_top", "bottom": "log_top", "side": "log_side"}}]"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert!(config.center_object);
        let table = load_block_table(&table_path).unwrap();
        assert_eq!(table.texture_for(Block::new(17, 3), Side::Top), "log_top");

        assert!(matches!(load_config(dir.join("missing.json")), Err(Error::Io(_))));
        fs::remove_dir_all(&dir).unwrap();
    }
}
