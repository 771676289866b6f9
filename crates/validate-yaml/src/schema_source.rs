//! Loading the `--schema` file: either a resource bundle with a
//! `definitions` list, or a single schema.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use quarto_yaml_validation::{ResourceBundle, Schema, SchemaModel, SchemaRegistry};
use tracing::debug;

/// Id a standalone schema is registered under when it has no `$id`.
const STANDALONE_ID: &str = "schema";

pub struct LoadedSchema {
    pub model: SchemaModel,
    /// The schema documents are checked against
    pub id: String,
}

/// Load `path` and pick the schema to validate with.
///
/// Without `schema_id`, a bundle validates against its last definition and
/// a standalone schema against itself.
pub fn load(path: &Path, schema_id: Option<&str>) -> Result<LoadedSchema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
    let file_name = path.display().to_string();

    let root = quarto_yaml::parse(&text, Some(&file_name));
    let loaded = if root.get("definitions").is_some() {
        let bundle = ResourceBundle::from_text(&text, Some(&file_name))
            .with_context(|| format!("Failed to load schema bundle {}", path.display()))?;
        let id = match schema_id {
            Some(id) => id.to_string(),
            None => bundle
                .definitions
                .last()
                .map(|definition| definition.id.clone())
                .with_context(|| format!("Schema bundle {} defines no schemas", path.display()))?,
        };
        let model = SchemaModel::from_bundle(bundle)
            .with_context(|| format!("Failed to load schema bundle {}", path.display()))?;
        LoadedSchema { model, id }
    } else {
        let schema = Schema::from_text(&text, Some(&file_name))
            .with_context(|| format!("Failed to load schema from {}", path.display()))?;
        let id = schema_id
            .map(str::to_string)
            .or_else(|| schema.annotations().id.clone())
            .unwrap_or_else(|| STANDALONE_ID.to_string());
        let mut registry = SchemaRegistry::new();
        registry.register_with_nested(id.clone(), schema);
        LoadedSchema {
            model: SchemaModel::from_registry(registry),
            id,
        }
    };

    loaded
        .model
        .ref_schema(&loaded.id)
        .with_context(|| format!("No schema '{}' in {}", loaded.id, path.display()))?;
    debug!(schema = %loaded.id, schemas = loaded.model.registry().len(), "schema loaded");
    Ok(loaded)
}
