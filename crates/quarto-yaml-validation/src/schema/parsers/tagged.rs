//! Tagged scalar schema parser
//!
//! ```yaml
//! tagged: "!expr"
//! ```
//!
//! or, constraining the text behind the tag:
//!
//! ```yaml
//! tagged:
//!   tag: "!expr"
//!   schema: string
//! ```

use quarto_yaml::AnnotatedParse;

use crate::error::SchemaResult;
use crate::schema::Schema;
use crate::schema::annotations::parse_annotations;
use crate::schema::helpers::{get_hash_string, structure_error};
use crate::schema::parser::from_annotated;
use crate::schema::types::TaggedSchema;

pub(in crate::schema) fn parse_tagged_schema(node: &AnnotatedParse) -> SchemaResult<Schema> {
    if let Some(tag) = node.result.as_str() {
        return Ok(Schema::Tagged(TaggedSchema {
            annotations: Default::default(),
            tag: normalize_tag(tag),
            schema: None,
        }));
    }

    let tag = get_hash_string(node, "tag")?
        .ok_or_else(|| structure_error(node, "tagged schema requires a 'tag' key"))?;
    let schema = match node.get("schema") {
        Some(inner) => Some(Box::new(from_annotated(inner)?)),
        None => None,
    };

    Ok(Schema::Tagged(TaggedSchema {
        annotations: parse_annotations(node)?,
        tag: normalize_tag(&tag),
        schema,
    }))
}

fn normalize_tag(tag: &str) -> String {
    if tag.starts_with('!') {
        tag.to_string()
    } else {
        format!("!{}", tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of(text: &str) -> AnnotatedParse {
        quarto_yaml::parse(text, None).get("tagged").unwrap().clone()
    }

    #[test]
    fn test_short_form() {
        match parse_tagged_schema(&value_of("tagged: \"!expr\"\n")).unwrap() {
            Schema::Tagged(t) => {
                assert_eq!(t.tag, "!expr");
                assert!(t.schema.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_long_form_without_bang() {
        match parse_tagged_schema(&value_of("tagged:\n  tag: expr\n  schema: string\n")).unwrap() {
            Schema::Tagged(t) => {
                assert_eq!(t.tag, "!expr");
                assert!(matches!(t.schema.as_deref(), Some(Schema::String(_))));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
