//! Request/response messages exchanged with the editor host.
//!
//! A request names a method and carries a [`YamlIntelligenceContext`] as
//! its arguments. Every request gets exactly one response with the same
//! id, either a result or a [`ProtocolError`].

use quarto_yaml_validation::{SchemaModel, ValidatorOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::completions::get_completions;
use crate::context::YamlIntelligenceContext;
use crate::error::{ProtocolError, Result};
use crate::lint::get_lint;

pub const GET_LINT: &str = "getLint";
pub const GET_COMPLETIONS: &str = "getCompletions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub args: Value,
}

impl Request {
    pub fn new(id: u64, method: impl Into<String>, ctx: &YamlIntelligenceContext) -> Request {
        Request {
            id,
            method: method.into(),
            args: serde_json::to_value(ctx).unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(flatten)]
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseBody {
    Result(Value),
    Error(ProtocolError),
}

impl Response {
    pub fn error(id: u64, error: ProtocolError) -> Response {
        Response {
            id,
            body: ResponseBody::Error(error),
        }
    }

    pub fn into_result(self) -> Result<Value> {
        match self.body {
            ResponseBody::Result(value) => Ok(value),
            ResponseBody::Error(error) => Err(error),
        }
    }
}

/// Serve one request against `model`.
///
/// `None` means the model never loaded; every request is then answered
/// with [`ProtocolError::NotInitialized`].
pub fn handle_request(
    request: &Request,
    model: Option<&SchemaModel>,
    options: &ValidatorOptions,
) -> Response {
    debug!(id = request.id, method = %request.method, "handling request");
    match dispatch(request, model, options) {
        Ok(value) => Response {
            id: request.id,
            body: ResponseBody::Result(value),
        },
        Err(error) => {
            debug!(id = request.id, %error, "request failed");
            Response::error(request.id, error)
        }
    }
}

fn dispatch(request: &Request, model: Option<&SchemaModel>, options: &ValidatorOptions) -> Result<Value> {
    if request.method != GET_LINT && request.method != GET_COMPLETIONS {
        return Err(ProtocolError::UnknownMethod(request.method.clone()));
    }
    let model = model.ok_or(ProtocolError::NotInitialized)?;
    let ctx: YamlIntelligenceContext = serde_json::from_value(request.args.clone())
        .map_err(|e| ProtocolError::MalformedRequest(e.to_string()))?;

    let value = if request.method == GET_LINT {
        serde_json::to_value(get_lint(&ctx, model, options)?)
    } else {
        // Editors filter completion lists themselves; max_suggestions is lint only
        serde_json::to_value(get_completions(&ctx, model)?)
    };
    value.map_err(|e| ProtocolError::MalformedRequest(e.to_string()))
}
