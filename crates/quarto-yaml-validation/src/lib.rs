// Schema validation for source-annotated YAML and JSON
//
// Schemas are read from YAML or JSON into a `Schema` DAG, registered by id
// in a `SchemaModel`, and checked against `AnnotatedParse` trees. Every
// violation keeps the narrowest source range responsible for it, and
// `locate` turns violations into line/column diagnostics for editors.

pub mod error;
pub mod locate;
pub mod model;
pub mod schema;
pub mod validator;

pub use error::{
    InstancePath, ModelError, ModelResult, PathSegment, SchemaError, SchemaPath,
    SchemaResolutionError, SchemaResult, ValidationError, ValidationErrorKind,
};
pub use locate::{attach_location, locate};
pub use model::{DescriptionList, ResourceBundle, SchemaAddress, SchemaDefinition, SchemaModel};
pub use schema::{Schema, SchemaAnnotations, SchemaRegistry};
pub use validator::{
    ValidationContext, ValidationOutcome, ValidatorOptions, closest_matches, describe_schema,
    navigate, validate, validate_with_options,
};
