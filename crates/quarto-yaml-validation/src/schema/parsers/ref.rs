//! Reference schema parser
//!
//! `ref: "schema-id"` or `$ref: "schema-id"` point at another schema's id.
//! References stay symbolic and are resolved against the registry while
//! validating, which is what lets schemas refer to each other in cycles.

use quarto_yaml::AnnotatedParse;

use crate::error::SchemaResult;
use crate::schema::Schema;
use crate::schema::helpers::structure_error;
use crate::schema::types::RefSchema;

/// Parse a reference schema
pub(in crate::schema) fn parse_ref_schema(node: &AnnotatedParse) -> SchemaResult<Schema> {
    let reference = node
        .result
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| structure_error(node, "ref must be a string"))?;

    Ok(Schema::Ref(RefSchema {
        annotations: Default::default(),
        reference,
    }))
}
