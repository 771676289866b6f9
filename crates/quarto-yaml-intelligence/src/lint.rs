//! Lint: syntax errors and schema violations for the YAML in a buffer.

use quarto_error_reporting::{DiagnosticKind, ErrorLocation, TidyverseError};
use quarto_source_map::{MappedString, Position, Range};
use quarto_yaml::AnnotatedParse;
use quarto_yaml_validation::{
    SchemaModel, ValidatorOptions, attach_location, locate, validate_with_options,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::YamlIntelligenceContext;
use crate::error::Result;

/// One problem, positioned in the host's buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintDiagnostic {
    pub start: Position,
    pub end: Position,
    pub severity: DiagnosticKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// The full diagnostic, for hover text and the problems panel
    pub error: TidyverseError,
}

impl LintDiagnostic {
    fn from_error(error: TidyverseError) -> Self {
        let origin = Position::new(0, 0);
        let ErrorLocation { start, end } = error.location.unwrap_or(ErrorLocation {
            start: origin,
            end: origin,
        });
        let message = match error.error.first() {
            Some(detail) => format!("{}\n{}", error.heading, detail),
            None => error.heading.clone(),
        };
        LintDiagnostic {
            start,
            end,
            severity: DiagnosticKind::Error,
            message,
            code: error.code.clone(),
            error,
        }
    }
}

/// Lint the YAML in `ctx`'s buffer.
///
/// A document with syntax errors reports only those: validating a partial
/// tree would flag everything the parser could not reach.
pub fn get_lint(
    ctx: &YamlIntelligenceContext,
    model: &SchemaModel,
    options: &ValidatorOptions,
) -> Result<Vec<LintDiagnostic>> {
    let Some(extracted) = ctx.extract_yaml() else {
        return Ok(Vec::new());
    };
    let parse = parse_source(&extracted.source, ctx.path.as_deref());

    if parse.has_errors() {
        debug!(count = parse.errors.len(), "yaml syntax errors");
        return Ok(syntax_errors(&parse, is_json(ctx.path.as_deref()))
            .into_iter()
            .map(LintDiagnostic::from_error)
            .collect());
    }

    let Some(schema) = ctx.resolve_schema(model)? else {
        return Ok(Vec::new());
    };
    let outcome = validate_with_options(&schema, &parse, model.registry(), options);
    debug!(count = outcome.errors.len(), schema = ctx.schema_id(), "validated");
    Ok(locate(&outcome.errors, &parse.source)
        .into_iter()
        .map(LintDiagnostic::from_error)
        .collect())
}

pub(crate) fn parse_source(source: &MappedString, path: Option<&str>) -> AnnotatedParse {
    if is_json(path) {
        quarto_yaml::parse_json(source)
    } else {
        quarto_yaml::parse_yaml(source)
    }
}

fn is_json(path: Option<&str>) -> bool {
    path.is_some_and(|p| p.to_ascii_lowercase().ends_with(".json"))
}

fn syntax_errors(parse: &AnnotatedParse, json: bool) -> Vec<TidyverseError> {
    let (heading, code) = if json {
        ("JSON syntax error", "Q-1-2")
    } else {
        ("YAML syntax error", "Q-1-1")
    };
    parse
        .errors
        .iter()
        .map(|error| {
            let mut located = TidyverseError::new(heading).with_code(code);
            located.add_error(error.message.clone());
            attach_location(&mut located, Range::new(error.start, error.end), &parse.source);
            located
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FileType;
    use quarto_yaml_validation::ResourceBundle;

    fn model() -> SchemaModel {
        let bundle = ResourceBundle::from_text(
            r#"
definitions:
  - id: front-matter
    schema:
      object:
        properties:
          title: string
          toc: boolean
        closed: true
"#,
            None,
        )
        .unwrap();
        SchemaModel::from_bundle(bundle).unwrap()
    }

    fn lint(ctx: &YamlIntelligenceContext) -> Vec<LintDiagnostic> {
        get_lint(ctx, &model(), &ValidatorOptions::default()).unwrap()
    }

    #[test]
    fn test_front_matter_violations_point_into_document() {
        let code = "---\ntitle: Hi\ntoc: maybe\n---\n\nBody\n";
        let ctx = YamlIntelligenceContext::new(code, FileType::Markdown).with_path("doc.qmd");
        let diagnostics = lint(&ctx);
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.start, Position::new(2, 5));
        assert_eq!(d.end, Position::new(2, 10));
        assert_eq!(d.code.as_deref(), Some("Q-1-11"));
        assert_eq!(d.error.file_name.as_deref(), Some("doc.qmd"));
        assert!(d.message.starts_with("Field \"toc\" has value \"maybe\""));
    }

    #[test]
    fn test_syntax_errors_only() {
        let code = "---\ntitle: [unclosed\ntoc: maybe\n---\n";
        let diagnostics = lint(&YamlIntelligenceContext::new(code, FileType::Markdown));
        assert!(!diagnostics.is_empty());
        assert!(diagnostics.iter().all(|d| d.code.as_deref() == Some("Q-1-1")));
        assert!(diagnostics[0].start.line >= 1);
    }

    #[test]
    fn test_no_yaml_no_diagnostics() {
        let ctx = YamlIntelligenceContext::new("# Title\n", FileType::Markdown);
        assert!(lint(&ctx).is_empty());
    }

    #[test]
    fn test_unknown_schema_fails_open() {
        let ctx = YamlIntelligenceContext::new("anything: [1]\n", FileType::Yaml);
        assert!(lint(&ctx).is_empty());
    }

    #[test]
    fn test_inline_schema() {
        let mut ctx = YamlIntelligenceContext::new("count: x\n", FileType::Yaml);
        ctx.schema = Some(serde_json::json!({"object": {"properties": {"count": "number"}}}));
        let diagnostics = lint(&ctx);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].start, Position::new(0, 7));

        ctx.schema = Some(serde_json::json!({"strng": {}}));
        assert!(get_lint(&ctx, &model(), &ValidatorOptions::default()).is_err());
    }

    #[test]
    fn test_json_syntax_error_code() {
        let ctx = YamlIntelligenceContext::new("{\"a\": ", FileType::Yaml).with_path("data.json");
        let diagnostics = lint(&ctx);
        assert_eq!(diagnostics[0].code.as_deref(), Some("Q-1-2"));
    }
}
