//! The schema model: every known schema, addressable by id.
//!
//! A model is built once from a [`ResourceBundle`] and is immutable after
//! that. The process-wide instance sits behind a single-init barrier
//! ([`SchemaModel::ensure_loaded`]); every reader afterwards gets the same
//! `Arc` snapshot without locking.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};

use quarto_source_map::Range;
use quarto_yaml::AnnotatedParse;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ModelError, ModelResult, SchemaError, SchemaResolutionError, SchemaResult};
use crate::schema::{Schema, SchemaRegistry};

static MODEL: OnceLock<Arc<SchemaModel>> = OnceLock::new();
static INIT: Mutex<()> = Mutex::new(());

/// One named schema in a bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDefinition {
    pub id: String,
    pub schema: Schema,
}

/// Descriptions for the nodes of one schema graph, in traversal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionList {
    pub id: String,
    pub descriptions: Vec<String>,
}

/// The resources a model is built from.
///
/// The text form is YAML or JSON:
///
/// ```yaml
/// definitions:
///   - id: date
///     schema: string
///   - id: front-matter
///     schema:
///       object:
///         properties:
///           date: { ref: date }
/// descriptions:
///   - id: front-matter
///     descriptions: ["Document metadata", "Publication date", "A date"]
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceBundle {
    pub definitions: Vec<SchemaDefinition>,
    pub descriptions: Vec<DescriptionList>,
}

impl ResourceBundle {
    /// Parse a bundle; `.json` file names select the JSON parser.
    pub fn from_text(text: &str, file_name: Option<&str>) -> SchemaResult<ResourceBundle> {
        let root = quarto_yaml::parse(text, file_name);
        if let Some(error) = root.errors.first() {
            return Err(SchemaError::Syntax {
                message: error.message.clone(),
                location: Range::new(error.start, error.end),
            });
        }

        let mut bundle = ResourceBundle::default();
        if let Some(definitions) = root.get("definitions") {
            for item in list(definitions, "definitions")? {
                bundle.definitions.push(SchemaDefinition {
                    id: required_string(item, "id")?,
                    schema: Schema::from_annotated(required(item, "schema")?)?,
                });
            }
        }
        if let Some(descriptions) = root.get("descriptions") {
            for item in list(descriptions, "descriptions")? {
                let texts = required(item, "descriptions")?;
                bundle.descriptions.push(DescriptionList {
                    id: required_string(item, "id")?,
                    descriptions: list(texts, "descriptions")?
                        .iter()
                        .map(|text| {
                            text.result
                                .as_str()
                                .map(str::to_string)
                                .ok_or_else(|| invalid(text, "descriptions must be strings"))
                        })
                        .collect::<SchemaResult<Vec<_>>>()?,
                });
            }
        }
        Ok(bundle)
    }
}

fn invalid(node: &AnnotatedParse, message: &str) -> SchemaError {
    SchemaError::InvalidStructure {
        message: message.to_string(),
        location: node.range(),
    }
}

fn list<'a>(node: &'a AnnotatedParse, field: &str) -> SchemaResult<&'a [AnnotatedParse]> {
    if node.is_array() {
        Ok(node.items())
    } else {
        Err(invalid(node, &format!("'{}' must be an array", field)))
    }
}

fn required<'a>(node: &'a AnnotatedParse, field: &str) -> SchemaResult<&'a AnnotatedParse> {
    node.get(field).ok_or_else(|| SchemaError::MissingField {
        field: field.to_string(),
        location: node.range(),
    })
}

fn required_string(node: &AnnotatedParse, field: &str) -> SchemaResult<String> {
    let value = required(node, field)?;
    value
        .result
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(value, &format!("'{}' must be a string", field)))
}

/// Where a schema node lives: a registered id plus child indices
/// (as numbered by [`Schema::children`]) from that schema down.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaAddress {
    pub id: String,
    pub path: Vec<usize>,
}

impl SchemaAddress {
    fn child(&self, index: usize) -> SchemaAddress {
        let mut path = self.path.clone();
        path.push(index);
        SchemaAddress {
            id: self.id.clone(),
            path,
        }
    }
}

/// Registry of schemas plus the description lists they were built with.
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    registry: SchemaRegistry,
    descriptions: Vec<DescriptionList>,
}

impl SchemaModel {
    /// Build a standalone model.
    ///
    /// Each definition is registered under its id, along with any nested
    /// schema carrying its own `$id`. Description lists are then patched in.
    pub fn from_bundle(bundle: ResourceBundle) -> SchemaResult<SchemaModel> {
        let mut model = SchemaModel::default();
        for definition in bundle.definitions {
            model
                .registry
                .register_with_nested(definition.id, definition.schema);
        }
        for list in &bundle.descriptions {
            model.patch_descriptions(&list.id, &list.descriptions)?;
        }
        model.descriptions = bundle.descriptions;
        info!(
            schemas = model.registry.len(),
            description_lists = model.descriptions.len(),
            "schema model built"
        );
        Ok(model)
    }

    pub fn from_registry(registry: SchemaRegistry) -> SchemaModel {
        SchemaModel {
            registry,
            descriptions: Vec::new(),
        }
    }

    /// Populate the process-wide model exactly once and return it.
    ///
    /// The first caller runs `loader`; concurrent callers wait for it and
    /// then share its result. If the loader fails, the barrier stays open and
    /// a later call may try again.
    pub fn ensure_loaded<F>(loader: F) -> ModelResult<Arc<SchemaModel>>
    where
        F: FnOnce() -> ModelResult<SchemaModel>,
    {
        if let Some(model) = MODEL.get() {
            return Ok(Arc::clone(model));
        }
        let _guard = INIT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(model) = MODEL.get() {
            return Ok(Arc::clone(model));
        }
        debug!("loading schema model");
        let model = Arc::new(loader()?);
        let _ = MODEL.set(Arc::clone(&model));
        Ok(model)
    }

    /// The process-wide model, if [`ensure_loaded`](Self::ensure_loaded) has run.
    pub fn get() -> ModelResult<Arc<SchemaModel>> {
        MODEL.get().cloned().ok_or(ModelError::NotInitialized)
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn descriptions(&self) -> &[DescriptionList] {
        &self.descriptions
    }

    pub fn ref_schema(&self, id: &str) -> Result<&Schema, SchemaResolutionError> {
        self.registry
            .resolve(id)
            .ok_or_else(|| SchemaResolutionError::UnknownId(id.to_string()))
    }

    /// Every node reachable from `root_id`, depth-first pre-order.
    ///
    /// A `Ref` node is visited, then the schema it names, unless that id
    /// was already entered. `True` and `False` are never visited. Refs to
    /// unknown ids are skipped.
    pub fn schema_traversal(&self, root_id: &str) -> Result<Vec<SchemaAddress>, SchemaResolutionError> {
        let root = self.ref_schema(root_id)?;
        let mut visited_ids = HashSet::from([root_id.to_string()]);
        let mut out = Vec::new();
        let address = SchemaAddress {
            id: root_id.to_string(),
            path: Vec::new(),
        };
        self.traverse(root, address, &mut visited_ids, &mut out);
        Ok(out)
    }

    fn traverse(
        &self,
        schema: &Schema,
        address: SchemaAddress,
        visited_ids: &mut HashSet<String>,
        out: &mut Vec<SchemaAddress>,
    ) {
        if matches!(schema, Schema::True | Schema::False) {
            return;
        }
        out.push(address.clone());
        if let Schema::Ref(r) = schema
            && let Some(target) = self.registry.resolve(&r.reference)
            && visited_ids.insert(r.reference.clone())
        {
            let target_address = SchemaAddress {
                id: r.reference.clone(),
                path: Vec::new(),
            };
            self.traverse(target, target_address, visited_ids, out);
        }
        for (index, child) in schema.children().into_iter().enumerate() {
            self.traverse(child, address.child(index), visited_ids, out);
        }
    }

    /// The node at `address`.
    pub fn resolve_address(&self, address: &SchemaAddress) -> Option<&Schema> {
        let mut schema = self.registry.resolve(&address.id)?;
        for &index in &address.path {
            schema = schema.children().into_iter().nth(index)?;
        }
        Some(schema)
    }

    fn resolve_address_mut(&mut self, address: &SchemaAddress) -> Option<&mut Schema> {
        let mut schema = self.registry.resolve_mut(&address.id)?;
        for &index in &address.path {
            schema = schema.children_mut().into_iter().nth(index)?;
        }
        Some(schema)
    }

    /// Visit every node reachable from `root_id`, in traversal order.
    pub fn walk_schema<F>(&self, root_id: &str, mut visitor: F) -> Result<(), SchemaResolutionError>
    where
        F: FnMut(&SchemaAddress, &Schema),
    {
        for address in self.schema_traversal(root_id)? {
            if let Some(schema) = self.resolve_address(&address) {
                visitor(&address, schema);
            }
        }
        Ok(())
    }

    /// Give the n-th node of `root_id`'s traversal the n-th description.
    ///
    /// The text is stored both as the `description` annotation and under
    /// the `description` tag.
    pub fn patch_descriptions(&mut self, root_id: &str, descriptions: &[String]) -> SchemaResult<()> {
        let addresses = self
            .schema_traversal(root_id)
            .map_err(|_| SchemaError::UnresolvedRef(root_id.to_string()))?;
        if addresses.len() != descriptions.len() {
            return Err(SchemaError::DescriptionCountMismatch {
                id: root_id.to_string(),
                expected: addresses.len(),
                got: descriptions.len(),
            });
        }
        for (address, description) in addresses.iter().zip(descriptions) {
            let annotations = self
                .resolve_address_mut(address)
                .and_then(Schema::annotations_mut);
            if let Some(annotations) = annotations {
                annotations.description = Some(description.clone());
                annotations
                    .tags
                    .get_or_insert_with(Default::default)
                    .insert("description".to_string(), serde_json::json!(description));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"
definitions:
  - id: date
    schema: string
  - id: front-matter
    schema:
      object:
        properties:
          title: string
          date:
            ref: date
          draft: boolean
  - id: tree
    schema:
      object:
        properties:
          children:
            arrayOf:
              ref: tree
"#;

    fn model() -> SchemaModel {
        SchemaModel::from_bundle(ResourceBundle::from_text(BUNDLE, None).unwrap()).unwrap()
    }

    fn kinds(model: &SchemaModel, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        model
            .walk_schema(id, |address, schema| {
                out.push(format!("{}{:?}:{}", address.id, address.path, schema.type_name()))
            })
            .unwrap();
        out
    }

    #[test]
    fn test_bundle_definitions() {
        let model = model();
        let ids: Vec<&str> = model.registry().ids().map(String::as_str).collect();
        assert_eq!(ids, vec!["date", "front-matter", "tree"]);
        assert!(matches!(model.ref_schema("date"), Ok(Schema::String(_))));
        assert_eq!(
            model.ref_schema("nope"),
            Err(SchemaResolutionError::UnknownId("nope".into()))
        );
    }

    #[test]
    fn test_traversal_order_follows_refs() {
        assert_eq!(
            kinds(&model(), "front-matter"),
            vec![
                "front-matter[]:object",
                "front-matter[0]:string",
                "front-matter[1]:$ref",
                "date[]:string",
                "front-matter[2]:boolean",
            ]
        );
    }

    #[test]
    fn test_traversal_terminates_on_cycles() {
        assert_eq!(
            kinds(&model(), "tree"),
            vec!["tree[]:object", "tree[0]:array", "tree[0, 0]:$ref"]
        );
    }

    #[test]
    fn test_patch_descriptions_uses_traversal_order() {
        let mut model = model();
        let descriptions: Vec<String> = ["Front matter", "Title", "Date ref", "A date", "Draft"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        model.patch_descriptions("front-matter", &descriptions).unwrap();

        let mut seen = Vec::new();
        model
            .walk_schema("front-matter", |_, schema| {
                seen.push(schema.annotations().description.clone().unwrap_or_default())
            })
            .unwrap();
        assert_eq!(seen, descriptions);

        let date = model.ref_schema("date").unwrap();
        let tags = date.annotations().tags.as_ref().unwrap();
        assert_eq!(tags["description"], serde_json::json!("A date"));
    }

    #[test]
    fn test_patch_descriptions_length_mismatch() {
        let mut model = model();
        let result = model.patch_descriptions("front-matter", &["only one".to_string()]);
        assert_eq!(
            result,
            Err(SchemaError::DescriptionCountMismatch {
                id: "front-matter".into(),
                expected: 5,
                got: 1,
            })
        );
    }

    #[test]
    fn test_bundle_descriptions_applied() {
        let text = format!(
            "{}descriptions:\n  - id: date\n    descriptions: [\"Publication date\"]\n",
            BUNDLE
        );
        let model = SchemaModel::from_bundle(ResourceBundle::from_text(&text, None).unwrap()).unwrap();
        assert_eq!(model.descriptions().len(), 1);
        assert_eq!(
            model.ref_schema("date").unwrap().annotations().description.as_deref(),
            Some("Publication date")
        );
    }

    #[test]
    fn test_json_bundle() {
        let text = r#"{"definitions": [{"id": "flag", "schema": "boolean"}]}"#;
        let bundle = ResourceBundle::from_text(text, Some("schemas.json")).unwrap();
        assert_eq!(bundle.definitions.len(), 1);
        assert_eq!(bundle.definitions[0].id, "flag");
    }

    #[test]
    fn test_bundle_missing_schema() {
        let err = ResourceBundle::from_text("definitions:\n  - id: x\n", None).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField { ref field, .. } if field == "schema"));
    }
}
