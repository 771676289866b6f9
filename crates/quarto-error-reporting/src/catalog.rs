//! Error code catalog.
//!
//! Codes have the form `Q-<subsystem>-<number>`. Subsystem 0 is internal,
//! subsystem 1 covers YAML/JSON syntax and schema validation.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Metadata for one error code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorCodeInfo {
    pub subsystem: String,
    pub title: String,
    pub message_template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
    pub since_version: String,
}

/// The catalog, embedded from `error_catalog.json` at compile time.
pub static ERROR_CATALOG: Lazy<HashMap<String, ErrorCodeInfo>> = Lazy::new(|| {
    serde_json::from_str(include_str!("../error_catalog.json"))
        .expect("embedded error catalog is valid JSON")
});

/// Look up an error code.
///
/// ```
/// use quarto_error_reporting::catalog::get_error_info;
///
/// assert_eq!(get_error_info("Q-1-11").unwrap().title, "Type Mismatch");
/// ```
pub fn get_error_info(code: &str) -> Option<&'static ErrorCodeInfo> {
    ERROR_CATALOG.get(code)
}

pub fn get_docs_url(code: &str) -> Option<&'static str> {
    get_error_info(code).and_then(|info| info.docs_url.as_deref())
}

pub fn get_subsystem(code: &str) -> Option<&'static str> {
    get_error_info(code).map(|info| info.subsystem.as_str())
}
