//! End-to-end checks: parse, validate, locate.

use quarto_yaml_validation::{
    ResourceBundle, Schema, SchemaModel, SchemaRegistry, ValidationErrorKind, locate, validate,
};

const FRONT_MATTER_BUNDLE: &str = r#"
definitions:
  - id: author
    schema:
      anyOf:
        - string
        - object:
            properties:
              name: string
              affiliation: string
            required: [name]
            closed: true
  - id: front-matter
    schema:
      object:
        properties:
          title: string
          author:
            maybeArrayOf:
              ref: author
          toc: boolean
          toc-depth:
            number:
              minimum: 1
              maximum: 6
          format:
            enum: [html, pdf, docx]
        closed: true
"#;

fn front_matter_model() -> SchemaModel {
    SchemaModel::from_bundle(ResourceBundle::from_text(FRONT_MATTER_BUNDLE, None).unwrap()).unwrap()
}

fn check(model: &SchemaModel, doc: &str) -> Vec<quarto_yaml_validation::ValidationError> {
    let parse = quarto_yaml::parse(doc, None);
    assert!(!parse.has_errors(), "fixture must parse: {:?}", parse.errors);
    let schema = model.ref_schema("front-matter").unwrap();
    validate(schema, &parse, model.registry()).errors
}

#[test]
fn items_array_reports_the_bad_element() {
    let schema = Schema::from_text("object:\n  properties:\n    items:\n      arrayOf: string\n", None)
        .unwrap();
    let parse = quarto_yaml::parse(r#"{"items": ["apple", "banana", 7]}"#, Some("doc.json"));
    let outcome = validate(&schema, &parse, &SchemaRegistry::new());

    assert_eq!(outcome.errors.len(), 1);
    assert_eq!((outcome.errors[0].start, outcome.errors[0].end), (30, 31));

    let located = locate(&outcome.errors, &parse.source);
    assert!(located[0].heading.contains("must be a string"));
    insta::assert_snapshot!(located[0].to_text(false), @r#"
        Array entry 3 with value 7 must be a string
        doc.json:1:31
        ✖ The value is a number, but a string is expected
        ℹ items.[2]
        ℹ Schema: object > properties:items > array > items > string
        1: {"items": ["apple", "banana", 7]}
                                         ~
    "#);
}

#[test]
fn valid_front_matter_passes() {
    let model = front_matter_model();
    let doc = "title: Report\nauthor:\n  - Ann\n  - name: Bo\n    affiliation: Lab\ntoc: true\ntoc-depth: 3\nformat: pdf\n";
    assert!(check(&model, doc).is_empty());
}

#[test]
fn errors_stay_local_to_their_values() {
    let model = front_matter_model();
    let doc = "title: 12\ntoc: maybe\ntoc-depth: 9\nformat: htm\n";
    let errors = check(&model, doc);
    let spans: Vec<&str> = errors.iter().map(|e| &doc[e.start..e.end]).collect();
    assert_eq!(spans, vec!["12", "maybe", "9", "htm"]);
    assert_eq!(errors[3].suggestions, vec!["html"]);
}

#[test]
fn any_of_failure_is_one_error() {
    let model = front_matter_model();
    let doc = "author:\n  name: Ann\n  affilation: Lab\n";
    let errors = check(&model, doc);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0].kind,
        ValidationErrorKind::NoMatchingAlternative { .. }
    ));
    assert_eq!(errors[0].suggestions, vec!["affiliation"]);

    let located = locate(&errors, &quarto_yaml::parse(doc, None).source);
    assert_eq!(located.len(), 1);
    assert_eq!(located[0].info["did-you-mean"], "Did you mean \"affiliation\"?");
}

#[test]
fn unknown_keys_are_flagged_at_the_key() {
    let model = front_matter_model();
    let doc = "titel: Report\n";
    let errors = check(&model, doc);
    assert_eq!(errors.len(), 1);
    assert_eq!(&doc[errors[0].start..errors[0].end], "titel");
    assert_eq!(errors[0].suggestions, vec!["title"]);
}

#[test]
fn json_documents_validate_like_yaml() {
    let model = front_matter_model();
    let schema = model.ref_schema("front-matter").unwrap();
    let yaml = quarto_yaml::parse("toc: 1\n", None);
    let json = quarto_yaml::parse(r#"{"toc": 1}"#, Some("meta.json"));
    let from_yaml = validate(schema, &yaml, model.registry());
    let from_json = validate(schema, &json, model.registry());
    assert_eq!(from_yaml.errors.len(), 1);
    assert_eq!(from_json.errors.len(), 1);
    assert_eq!(from_yaml.errors[0].kind, from_json.errors[0].kind);
}

#[test]
fn recursive_schemas_validate() {
    let bundle = ResourceBundle::from_text(
        "definitions:\n  - id: node\n    schema:\n      object:\n        properties:\n          label: string\n          children:\n            arrayOf:\n              ref: node\n        closed: true\n",
        None,
    )
    .unwrap();
    let model = SchemaModel::from_bundle(bundle).unwrap();
    let doc = "label: a\nchildren:\n  - label: b\n    children:\n      - label: c\n        colour: red\n";
    let parse = quarto_yaml::parse(doc, None);
    let errors = validate(model.ref_schema("node").unwrap(), &parse, model.registry()).errors;
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].instance_path.to_string(),
        "children.[0].children.[0].colour"
    );
}

#[test]
fn validation_is_repeatable() {
    let model = front_matter_model();
    let doc = "title: [1]\nformat: odt\nextra: 1\n";
    let first = check(&model, doc);
    let second = check(&model, doc);
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}
