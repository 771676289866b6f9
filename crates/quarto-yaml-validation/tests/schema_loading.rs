use quarto_yaml_validation::{ResourceBundle, Schema, SchemaError, SchemaModel};

/// Schemas written in JSON read the same as their YAML spelling
#[test]
fn test_json_and_yaml_schemas_agree() {
    let yaml = Schema::from_text(
        "object:\n  properties:\n    toc: boolean\n    format:\n      enum: [html, pdf]\n  required: [format]\n",
        None,
    )
    .unwrap();
    let json = Schema::from_text(
        r#"{"object": {"properties": {"toc": "boolean", "format": {"enum": ["html", "pdf"]}}, "required": ["format"]}}"#,
        Some("schema.json"),
    )
    .unwrap();
    assert_eq!(yaml, json);
}

/// Malformed schemas point at the offending field
#[test]
fn test_schema_errors_are_located() {
    let text = "object:\n  properties:\n    toc: bolean\n";
    match Schema::from_text(text, None) {
        Err(SchemaError::InvalidType { name, location }) => {
            assert_eq!(name, "bolean");
            assert_eq!(&text[location.start..location.end], "bolean");
        }
        other => panic!("Expected InvalidType, got {:?}", other),
    }

    let text = "string:\n  pattern: \"(unclosed\"\n";
    match Schema::from_text(text, None) {
        Err(SchemaError::InvalidPattern { pattern, location, .. }) => {
            assert_eq!(pattern, "(unclosed");
            assert!(text[location.start..location.end].contains("(unclosed"));
        }
        other => panic!("Expected InvalidPattern, got {:?}", other),
    }
}

/// Bundles register nested `$id`s and apply descriptions in traversal order
#[test]
fn test_bundle_with_nested_ids_and_descriptions() {
    let bundle = ResourceBundle::from_text(
        r#"
definitions:
  - id: format
    schema:
      object:
        properties:
          toc:
            boolean:
              $id: toc-flag
          theme: string
descriptions:
  - id: format
    descriptions: ["Format options", "Show a table of contents", "Bootstrap theme"]
"#,
        None,
    )
    .unwrap();
    let model = SchemaModel::from_bundle(bundle).unwrap();

    let ids: Vec<&str> = model.registry().ids().map(String::as_str).collect();
    assert_eq!(ids, vec!["format", "toc-flag"]);

    let format = model.ref_schema("format").unwrap();
    assert_eq!(
        format.annotations().description.as_deref(),
        Some("Format options")
    );
    let descriptions: Vec<Option<String>> = format
        .children()
        .iter()
        .map(|c| c.annotations().description.clone())
        .collect();
    assert_eq!(
        descriptions,
        vec![
            Some("Show a table of contents".to_string()),
            Some("Bootstrap theme".to_string())
        ]
    );
}

#[test]
fn test_bundle_description_count_must_match() {
    let bundle = ResourceBundle::from_text(
        "definitions:\n  - id: flag\n    schema: boolean\ndescriptions:\n  - id: flag\n    descriptions: [one, two]\n",
        None,
    )
    .unwrap();
    assert!(matches!(
        SchemaModel::from_bundle(bundle),
        Err(SchemaError::DescriptionCountMismatch { expected: 1, got: 2, .. })
    ));
}

#[test]
fn test_walk_visits_shared_schemas_once() {
    let bundle = ResourceBundle::from_text(
        r#"
definitions:
  - id: date
    schema: string
  - id: dates
    schema:
      object:
        properties:
          created: { ref: date }
          modified: { ref: date }
"#,
        None,
    )
    .unwrap();
    let model = SchemaModel::from_bundle(bundle).unwrap();
    let mut visited = Vec::new();
    model
        .walk_schema("dates", |address, schema| {
            visited.push(format!("{}{:?}:{}", address.id, address.path, schema.type_name()))
        })
        .unwrap();
    assert_eq!(
        visited,
        vec![
            "dates[]:object",
            "dates[0]:$ref",
            "date[]:string",
            "dates[1]:$ref",
        ]
    );
}
