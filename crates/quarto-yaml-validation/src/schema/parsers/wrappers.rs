//! Schema wrapper parser
//!
//! The `schema` key adds annotations (description, completions, ...) to a
//! schema without nesting them under the type key:
//!
//! ```yaml
//! schema:
//!   anyOf:
//!     - boolean
//!     - string
//! description: "A boolean or string"
//! completions: ["true", "false", "auto"]
//! ```

use quarto_yaml::AnnotatedParse;

use crate::error::SchemaResult;
use crate::schema::Schema;
use crate::schema::annotations::{merge_annotations, parse_annotations};
use crate::schema::helpers::structure_error;
use crate::schema::parser::from_annotated;

/// Parse a schema wrapper; outer annotations override the inner schema's.
pub(in crate::schema) fn parse_schema_wrapper(node: &AnnotatedParse) -> SchemaResult<Schema> {
    let schema_node = node
        .get("schema")
        .ok_or_else(|| structure_error(node, "schema wrapper requires 'schema' key"))?;

    let inner_schema = from_annotated(schema_node)?;
    let outer_annotations = parse_annotations(node)?;
    let inner_annotations = inner_schema.annotations().clone();

    Ok(inner_schema.with_annotations(merge_annotations(inner_annotations, outer_annotations)))
}
