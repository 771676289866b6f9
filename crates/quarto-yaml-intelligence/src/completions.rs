//! Completions for the YAML under the cursor.
//!
//! The cursor path comes from indentation rather than the parse tree,
//! because the text being typed is usually not valid YAML yet. The path
//! selects schemas in the model; object schemas offer their keys, enums,
//! booleans and `completions` annotations offer values.

use std::collections::HashSet;

use quarto_error_reporting::text::edit_distance;
use quarto_yaml_validation::{Schema, SchemaAnnotations, SchemaModel, SchemaRegistry};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::YamlIntelligenceContext;
use crate::error::Result;

/// How deep refs are followed when collecting candidate schemas.
const MAX_REF_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    Key,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub label: String,
    /// Text to insert
    pub value: String,
    pub kind: CompletionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Ask the editor to complete again after this one is accepted
    pub suggest_on_accept: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResult {
    /// The partial word the completions replace
    pub token: String,
    pub completions: Vec<Completion>,
    /// Same token, same completion context: hosts may reuse earlier results
    pub cache_token: String,
}

/// Completions at the cursor of `ctx`.
pub fn get_completions(ctx: &YamlIntelligenceContext, model: &SchemaModel) -> Result<CompletionResult> {
    let Some(extracted) = ctx.extract_yaml() else {
        return Ok(CompletionResult::default());
    };
    let Some(cursor) = extracted.cursor else {
        return Ok(CompletionResult::default());
    };
    let Some(schema) = ctx.resolve_schema(model)? else {
        return Ok(CompletionResult::default());
    };

    let position = CursorContext::at(extracted.source.value(), cursor);
    let registry = model.registry();
    let targets = schemas_at(&schema, &position.path, registry);
    let candidates = match position.kind {
        CompletionKind::Key => key_completions(ctx, &targets, &position.siblings, registry),
        CompletionKind::Value => value_completions(&targets, registry),
    };
    let completions = rank(&position.token, candidates);
    debug!(
        path = %position.path.join("."),
        token = %position.token,
        count = completions.len(),
        "completions"
    );

    Ok(CompletionResult {
        cache_token: format!(
            "{}:{}:{}",
            ctx.schema_id(),
            position.path.join("."),
            match position.kind {
                CompletionKind::Key => "key",
                CompletionKind::Value => "value",
            }
        ),
        token: position.token,
        completions,
    })
}

/// What the cursor is in the middle of typing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CursorContext {
    kind: CompletionKind,
    /// Keys from the root to the mapping (key mode) or value (value mode)
    path: Vec<String>,
    token: String,
    /// Keys already present next to the one being typed
    siblings: HashSet<String>,
}

#[derive(Debug, Clone, Copy)]
struct LineShape<'t> {
    /// Column of the first character after indentation and `- ` markers
    column: usize,
    body: &'t str,
    list_item: bool,
}

impl<'t> LineShape<'t> {
    fn of(line: &'t str) -> Option<Self> {
        let trimmed = line.trim_start_matches(' ');
        if trimmed.trim().is_empty() || trimmed.starts_with('#') {
            return None;
        }
        let mut column = line.len() - trimmed.len();
        let mut body = trimmed;
        let mut list_item = false;
        while let Some(rest) = body.strip_prefix("- ") {
            column += 2;
            body = rest;
            list_item = true;
        }
        Some(LineShape {
            column,
            body,
            list_item,
        })
    }

    /// `(key, rest)` for `key: rest` and `key:` lines.
    fn key(&self) -> Option<(&'t str, &'t str)> {
        let colon = self
            .body
            .find(": ")
            .or_else(|| self.body.trim_end().strip_suffix(':').map(str::len))?;
        let key = self.body[..colon].trim();
        let rest = self.body.get(colon + 1..).unwrap_or("");
        (!key.is_empty()).then_some((key, rest))
    }

    fn opens_block(&self) -> bool {
        self.key().is_some_and(|(_, rest)| rest.trim().is_empty())
    }
}

impl CursorContext {
    fn at(text: &str, cursor: usize) -> CursorContext {
        let line_start = text[..cursor].rfind('\n').map_or(0, |i| i + 1);
        let line_end = text[cursor..].find('\n').map_or(text.len(), |i| cursor + i);
        let prefix = &text[line_start..cursor];

        let indent = prefix.len() - prefix.trim_start_matches(' ').len();
        let mut body = &prefix[indent..];
        let mut column = indent;
        while let Some(rest) = body.strip_prefix("- ") {
            column += 2;
            body = rest;
        }

        let above: Vec<&str> = text[..line_start].lines().collect();
        let below: Vec<&str> = text.get(line_end + 1..).unwrap_or("").lines().collect();
        let mut path = ancestors(&above, column);
        let siblings = siblings(&above, &below, column);

        let current = LineShape {
            column,
            body,
            list_item: false,
        };
        match current.key() {
            Some((key, rest)) => {
                path.push(key.to_string());
                let token = rest
                    .rsplit(['[', ',', ' '])
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_string();
                CursorContext {
                    kind: CompletionKind::Value,
                    path,
                    token,
                    siblings,
                }
            }
            None => CursorContext {
                kind: CompletionKind::Key,
                path,
                token: body.trim().to_string(),
                siblings,
            },
        }
    }
}

/// Keys of the enclosing blocks, outermost first.
fn ancestors(above: &[&str], column: usize) -> Vec<String> {
    let mut path = Vec::new();
    let mut current = column;
    for line in above.iter().rev() {
        if current == 0 {
            break;
        }
        let Some(shape) = LineShape::of(line) else {
            continue;
        };
        if shape.column < current && shape.opens_block() {
            if let Some((key, _)) = shape.key() {
                path.push(key.to_string());
            }
            current = shape.column;
        } else if shape.column < current {
            current = shape.column;
        }
    }
    path.reverse();
    path
}

/// Keys at `column` in the same mapping as the cursor line.
fn siblings(above: &[&str], below: &[&str], column: usize) -> HashSet<String> {
    let mut keys = HashSet::new();
    for line in above.iter().rev() {
        let Some(shape) = LineShape::of(line) else {
            continue;
        };
        if shape.column < column {
            break;
        }
        if shape.column == column {
            if let Some((key, _)) = shape.key() {
                keys.insert(key.to_string());
            }
            if shape.list_item {
                break;
            }
        }
    }
    for line in below {
        let Some(shape) = LineShape::of(line) else {
            continue;
        };
        if shape.column < column || shape.list_item {
            break;
        }
        if shape.column == column
            && let Some((key, _)) = shape.key()
        {
            keys.insert(key.to_string());
        }
    }
    keys
}

/// Concrete schemas a value at `path` may be checked against.
///
/// Refs and combinators are looked through; arrays contribute both
/// themselves and their items, so a path through a list reaches the
/// items' properties.
fn schemas_at<'s>(root: &'s Schema, path: &[String], registry: &'s SchemaRegistry) -> Vec<&'s Schema> {
    let mut current = Vec::new();
    expand(root, registry, 0, &mut current);
    for key in path {
        let mut next = Vec::new();
        for schema in &current {
            let Schema::Object(object) = schema else {
                continue;
            };
            if let Some(property) = object.properties.get(key) {
                expand(property, registry, 0, &mut next);
            }
            for (pattern, property) in &object.pattern_properties {
                if pattern.is_match(key) {
                    expand(property, registry, 0, &mut next);
                }
            }
            if let Some(additional) = object.additional_properties.as_deref()
                && !object.properties.contains_key(key)
            {
                expand(additional, registry, 0, &mut next);
            }
        }
        current = next;
    }
    current
}

fn expand<'s>(schema: &'s Schema, registry: &'s SchemaRegistry, depth: usize, out: &mut Vec<&'s Schema>) {
    if depth > MAX_REF_DEPTH {
        return;
    }
    match schema {
        Schema::Ref(r) => {
            if let Some(target) = registry.resolve(&r.reference) {
                expand(target, registry, depth + 1, out);
            }
        }
        Schema::AnyOf(s) => s.schemas.iter().for_each(|c| expand(c, registry, depth + 1, out)),
        Schema::AllOf(s) => s.schemas.iter().for_each(|c| expand(c, registry, depth + 1, out)),
        Schema::Array(a) => {
            out.push(schema);
            if let Some(items) = a.items.as_deref() {
                expand(items, registry, depth + 1, out);
            }
        }
        _ => out.push(schema),
    }
}

/// Annotations to show for `schema`, looking through a bare ref.
fn annotations_of<'s>(schema: &'s Schema, registry: &'s SchemaRegistry) -> &'s SchemaAnnotations {
    match schema {
        Schema::Ref(r) if r.annotations.description.is_none() => registry
            .resolve(&r.reference)
            .map_or(&r.annotations, |target| target.annotations()),
        other => other.annotations(),
    }
}

fn description_of(annotations: &SchemaAnnotations) -> Option<String> {
    annotations.description.clone().or_else(|| {
        annotations
            .tags
            .as_ref()
            .and_then(|tags| tags.get("description"))
            .and_then(|d| d.as_str())
            .map(str::to_string)
    })
}

fn key_completions(
    ctx: &YamlIntelligenceContext,
    targets: &[&Schema],
    present: &HashSet<String>,
    registry: &SchemaRegistry,
) -> Vec<Completion> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for target in targets {
        let Schema::Object(object) = target else {
            continue;
        };
        for (name, property) in &object.properties {
            let annotations = annotations_of(property, registry);
            if annotations.hidden == Some(true)
                || present.contains(name)
                || !ctx.accepts(property)
                || !seen.insert(name.clone())
            {
                continue;
            }
            out.push(Completion {
                label: name.clone(),
                value: format!("{}: ", name),
                kind: CompletionKind::Key,
                description: description_of(annotations),
                documentation: annotations.documentation.clone(),
                suggest_on_accept: !value_completions(&[property], registry).is_empty(),
            });
        }
    }
    out
}

fn value_completions(targets: &[&Schema], registry: &SchemaRegistry) -> Vec<Completion> {
    let mut expanded = Vec::new();
    for target in targets {
        expand(target, registry, 0, &mut expanded);
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for schema in expanded {
        let annotations = schema.annotations();
        let mut values: Vec<String> = match schema {
            Schema::Enum(e) => e
                .values
                .iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Schema::Boolean(_) => vec!["true".to_string(), "false".to_string()],
            _ => Vec::new(),
        };
        values.extend(annotations.completions.iter().flatten().cloned());
        for value in values {
            if !seen.insert(value.clone()) {
                continue;
            }
            out.push(Completion {
                label: value.clone(),
                value,
                kind: CompletionKind::Value,
                description: description_of(annotations),
                documentation: annotations.documentation.clone(),
                suggest_on_accept: false,
            });
        }
    }
    out
}

/// Keep completions whose start is within a few edits of `token`, closest
/// first, then in declaration order.
fn rank(token: &str, completions: Vec<Completion>) -> Vec<Completion> {
    if token.is_empty() {
        return completions;
    }
    let token = token.to_lowercase();
    let width = token.chars().count();
    let threshold = width / 3;
    let mut scored: Vec<(usize, usize, Completion)> = completions
        .into_iter()
        .enumerate()
        .filter_map(|(order, completion)| {
            let start: String = completion.label.to_lowercase().chars().take(width).collect();
            let distance = edit_distance(&token, &start);
            (distance <= threshold).then_some((distance, order, completion))
        })
        .collect();
    scored.sort_by_key(|(distance, order, _)| (*distance, *order));
    scored.into_iter().map(|(_, _, completion)| completion).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FileType;
    use quarto_yaml_validation::ResourceBundle;

    const BUNDLE: &str = r#"
definitions:
  - id: author
    schema:
      anyOf:
        - string
        - object:
            properties:
              name: string
              affiliation: string
  - id: front-matter
    schema:
      object:
        properties:
          title:
            string:
              description: Document title
          toc:
            boolean:
              description: Include a table of contents
          author:
            maybeArrayOf:
              ref: author
          theme:
            enum: [cosmo, cerulean, darkly]
          keep-tex:
            boolean:
              tags:
                formats: [pdf]
          internal:
            string:
              hidden: true
          format:
            object:
              properties:
                html:
                  object:
                    properties:
                      toc: boolean
                      theme: string
"#;

    fn model() -> SchemaModel {
        SchemaModel::from_bundle(ResourceBundle::from_text(BUNDLE, None).unwrap()).unwrap()
    }

    fn complete(code: &str, row: usize, column: usize) -> CompletionResult {
        let ctx = YamlIntelligenceContext::new(code, FileType::Markdown).with_position(row, column);
        get_completions(&ctx, &model()).unwrap()
    }

    fn labels(result: &CompletionResult) -> Vec<&str> {
        result.completions.iter().map(|c| c.label.as_str()).collect()
    }

    #[test]
    fn test_key_completion_filters_by_token() {
        let result = complete("---\nti\n---\n", 1, 2);
        assert_eq!(result.token, "ti");
        assert_eq!(labels(&result), vec!["title"]);
        let title = &result.completions[0];
        assert_eq!(title.value, "title: ");
        assert_eq!(title.kind, CompletionKind::Key);
        assert_eq!(title.description.as_deref(), Some("Document title"));
        assert!(!title.suggest_on_accept);
    }

    #[test]
    fn test_key_completion_skips_present_and_hidden() {
        let result = complete("---\ntitle: x\n\n---\n", 2, 0);
        assert_eq!(
            labels(&result),
            vec!["toc", "author", "theme", "keep-tex", "format"]
        );
        let toc = &result.completions[0];
        assert!(toc.suggest_on_accept);
        assert_eq!(result.cache_token, "front-matter::key");
    }

    #[test]
    fn test_nested_key_completion() {
        let result = complete("---\nformat:\n  html:\n    t\n---\n", 3, 5);
        assert_eq!(labels(&result), vec!["toc", "theme"]);
        assert_eq!(result.cache_token, "front-matter:format.html:key");
    }

    #[test]
    fn test_enum_value_completion() {
        let result = complete("---\ntheme: co\n---\n", 1, 9);
        assert_eq!(result.token, "co");
        assert_eq!(labels(&result), vec!["cosmo"]);
        assert_eq!(result.completions[0].kind, CompletionKind::Value);

        let result = complete("---\ntheme: \n---\n", 1, 7);
        assert_eq!(labels(&result), vec!["cosmo", "cerulean", "darkly"]);
    }

    #[test]
    fn test_boolean_value_completion() {
        let result = complete("---\ntoc: \n---\n", 1, 5);
        assert_eq!(labels(&result), vec!["true", "false"]);
        assert_eq!(
            result.completions[0].description.as_deref(),
            Some("Include a table of contents")
        );
    }

    #[test]
    fn test_completion_inside_list_item() {
        let result = complete("---\nauthor:\n  - name: Ann\n    af\n---\n", 3, 6);
        assert_eq!(labels(&result), vec!["affiliation"]);
    }

    #[test]
    fn test_format_specific_keys() {
        let mut ctx = YamlIntelligenceContext::new("---\nkee\n---\n", FileType::Markdown)
            .with_position(1, 3);
        assert_eq!(labels(&get_completions(&ctx, &model()).unwrap()), vec!["keep-tex"]);
        ctx.formats = vec!["html".to_string()];
        assert!(get_completions(&ctx, &model()).unwrap().completions.is_empty());
        ctx.formats = vec!["html".to_string(), "pdf".to_string()];
        assert_eq!(labels(&get_completions(&ctx, &model()).unwrap()), vec!["keep-tex"]);
    }

    #[test]
    fn test_typo_tolerance_grows_with_token() {
        let result = complete("---\nthee\n---\n", 1, 4);
        assert_eq!(labels(&result), vec!["theme"]);
    }

    #[test]
    fn test_cursor_outside_yaml() {
        let result = complete("---\ntitle: x\n---\nBody text\n", 3, 2);
        assert_eq!(result, CompletionResult::default());
    }

    #[test]
    fn test_cursor_context_shapes() {
        let text = "a:\n  b:\n    - c: 1\n      d";
        let ctx = CursorContext::at(text, text.len());
        assert_eq!(ctx.kind, CompletionKind::Key);
        assert_eq!(ctx.path, vec!["a", "b"]);
        assert_eq!(ctx.token, "d");
        assert!(ctx.siblings.contains("c"));

        let text = "list: [one, tw";
        let ctx = CursorContext::at(text, text.len());
        assert_eq!(ctx.kind, CompletionKind::Value);
        assert_eq!(ctx.path, vec!["list"]);
        assert_eq!(ctx.token, "tw");
    }

    #[test]
    fn test_json_wire_shape() {
        let result = complete("---\ntoc: t\n---\n", 1, 6);
        insta::assert_snapshot!(serde_json::to_string_pretty(&result).unwrap(), @r#"
        {
          "token": "t",
          "completions": [
            {
              "label": "true",
              "value": "true",
              "kind": "value",
              "description": "Include a table of contents",
              "suggestOnAccept": false
            }
          ],
          "cacheToken": "front-matter:toc:value"
        }
        "#);
    }
}
