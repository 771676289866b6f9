//! YAML intelligence for editors: lint and completions for the YAML in
//! project files, document front matter and code cell options.
//!
//! [`get_lint`] and [`get_completions`] can be called directly. Editors
//! usually go through a [`Worker`], which owns the schema model and serves
//! [`Request`]s one at a time off the host's thread.
//!
//! ```no_run
//! # async fn demo() -> Result<(), quarto_yaml_intelligence::DispatchError> {
//! use quarto_yaml_intelligence::{FileType, Worker, WorkerConfig, YamlIntelligenceContext};
//! use quarto_yaml_validation::{ModelError, ResourceBundle, SchemaModel};
//!
//! let handle = Worker::spawn(WorkerConfig::default(), || {
//!     let text = std::fs::read_to_string("schemas.yml").map_err(|e| ModelError::Load(e.to_string()))?;
//!     Ok(SchemaModel::from_bundle(ResourceBundle::from_text(&text, Some("schemas.yml"))?)?)
//! });
//! let ctx = YamlIntelligenceContext::new("---\ntitle: 1\n---\n", FileType::Markdown);
//! for diagnostic in handle.get_lint(&ctx).await? {
//!     println!("{}:{} {}", diagnostic.start.line, diagnostic.start.column, diagnostic.message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod completions;
pub mod context;
pub mod error;
pub mod lint;
pub mod protocol;
pub mod worker;

pub use completions::{Completion, CompletionKind, CompletionResult, get_completions};
pub use context::{
    CELL_OPTIONS_SCHEMA, CursorPosition, ExtractedYaml, FRONT_MATTER_SCHEMA, FileType,
    PROJECT_CONFIG_SCHEMA, YamlIntelligenceContext,
};
pub use error::{DispatchError, ProtocolError, Result};
pub use lint::{LintDiagnostic, get_lint};
pub use protocol::{GET_COMPLETIONS, GET_LINT, Request, Response, ResponseBody, handle_request};
pub use worker::{Worker, WorkerConfig, WorkerHandle};
