//! Whole-tree checks for annotated parses.

use quarto_source_map::{MappedString, mapped_index_to_line_col, mapped_string};
use quarto_yaml::{AnnotatedParse, parse_json, parse_yaml};

fn outline(node: &AnnotatedParse) -> String {
    let mut lines = Vec::new();
    push_outline(node, 0, &mut lines);
    lines.join("\n")
}

fn push_outline(node: &AnnotatedParse, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    if node.is_scalar() {
        lines.push(format!(
            "{indent}{} {}..{} {:?}",
            node.kind.as_str(),
            node.start,
            node.end,
            node.text()
        ));
    } else {
        lines.push(format!(
            "{indent}{} {}..{}",
            node.kind.as_str(),
            node.start,
            node.end
        ));
        for child in &node.components {
            push_outline(child, depth + 1, lines);
        }
    }
}

#[test]
fn test_front_matter_outline() {
    let source = MappedString::original(
        "title: Demo\nformat:\n  html:\n    toc: true\nauthors: [Ann, Bo]\n",
        Some("_quarto.yml"),
    );
    let parse = parse_yaml(&source);
    assert!(!parse.has_errors());
    insta::assert_snapshot!(outline(&parse), @r#"
    object 0..60
      string 0..5 "title"
      string 7..11 "Demo"
      string 12..18 "format"
      object 22..41
        string 22..26 "html"
        object 32..41
          string 32..35 "toc"
          boolean 37..41 "true"
      string 42..49 "authors"
      array 51..60
        string 52..55 "Ann"
        string 57..59 "Bo"
    "#);
}

#[test]
fn test_json_and_yaml_trees_agree() {
    let json = parse_json(&MappedString::original(
        r#"{"a": [1, {"b": "c"}], "d": null}"#,
        None,
    ));
    let yaml = parse_yaml(&MappedString::original(
        r#"{"a": [1, {"b": "c"}], "d": null}"#,
        None,
    ));
    assert_eq!(json.result, yaml.result);
    assert_eq!(outline(&json), outline(&yaml));
}

#[test]
fn test_ranges_map_back_through_extraction() {
    let document = MappedString::original(
        "---\ntitle: Demo\nlist: [1, 2]\n---\n\nBody text.\n",
        Some("index.qmd"),
    );
    let front_matter = mapped_string(&document, vec![(4..29).into()]).unwrap();
    assert_eq!(front_matter.value(), "title: Demo\nlist: [1, 2]\n");

    let parse = parse_yaml(&front_matter);
    let second = &parse.get("list").unwrap().items()[1];
    assert_eq!(second.text(), "2");

    let to_line_col = mapped_index_to_line_col(&parse.source);
    let position = to_line_col(second.start).unwrap();
    assert_eq!((position.line, position.column), (2, 10));
}

#[test]
fn test_every_range_is_well_formed() {
    let source = MappedString::original(
        "a: &x [1, 'two', \"three\"]\nb: *x\nc:\n  - ? k\n    : v\n  - |\n    text\nd: ~\n",
        None,
    );
    let parse = parse_yaml(&source);
    fn check(node: &AnnotatedParse, len: usize) {
        assert!(node.start <= node.end, "{node:?}");
        assert!(node.end <= len);
        for child in &node.components {
            check(child, len);
        }
    }
    check(&parse, source.len());
}
