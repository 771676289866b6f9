//! Scalar type resolution.
//!
//! Implicit resolution is limited to the JSON-compatible core: null, boolean,
//! integer and float. YAML 1.1 booleans (`yes`, `no`, `on`, `off`) and
//! timestamps stay strings so front matter values are not silently coerced.

use once_cell::sync::Lazy;
use regex::Regex;
use yaml_rust2::parser::Tag;
use yaml_rust2::scanner::TScalarStyle;

use crate::value::{TaggedValue, Value};

const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?[0-9]+$").expect("valid regex"));
static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?$").expect("valid regex")
});

/// Resolve a scalar event into a value.
pub(crate) fn resolve_scalar(text: &str, style: TScalarStyle, tag: Option<&Tag>) -> Value {
    if let Some(tag) = tag {
        if tag.handle == CORE_TAG_PREFIX {
            return resolve_core_tag(text, &tag.suffix);
        }
        return Value::Tagged(Box::new(TaggedValue {
            tag: tag_name(tag),
            value: Value::String(text.to_string()),
        }));
    }

    match style {
        TScalarStyle::Plain => resolve_plain(text),
        _ => Value::String(text.to_string()),
    }
}

/// Render a tag as written in the source (`!expr`, `!!binary`, ...).
fn tag_name(tag: &Tag) -> String {
    if tag.handle.is_empty() {
        format!("!{}", tag.suffix)
    } else if tag.handle == "!" || tag.handle.ends_with('!') {
        format!("{}{}", tag.handle, tag.suffix)
    } else {
        format!("!<{}{}>", tag.handle, tag.suffix)
    }
}

fn resolve_core_tag(text: &str, suffix: &str) -> Value {
    match suffix {
        "null" => Value::Null,
        "bool" => match resolve_plain(text) {
            b @ Value::Bool(_) => b,
            _ => Value::String(text.to_string()),
        },
        "int" => parse_int(text).unwrap_or_else(|| Value::String(text.to_string())),
        "float" => parse_float(text)
            .or_else(|| parse_int(text).and_then(|v| v.as_f64()).map(Value::Float))
            .unwrap_or_else(|| Value::String(text.to_string())),
        _ => Value::String(text.to_string()),
    }
}

/// Resolve an untagged plain scalar.
pub(crate) fn resolve_plain(text: &str) -> Value {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => return Value::Null,
        "true" | "True" | "TRUE" => return Value::Bool(true),
        "false" | "False" | "FALSE" => return Value::Bool(false),
        _ => {}
    }
    parse_int(text)
        .or_else(|| parse_float(text))
        .unwrap_or_else(|| Value::String(text.to_string()))
}

fn parse_int(text: &str) -> Option<Value> {
    if let Some(hex) = text.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(Value::Integer);
    }
    if let Some(oct) = text.strip_prefix("0o") {
        return i64::from_str_radix(oct, 8).ok().map(Value::Integer);
    }
    if !INT_RE.is_match(text) {
        return None;
    }
    // Integers beyond i64 degrade to floats
    Some(match text.parse::<i64>() {
        Ok(i) => Value::Integer(i),
        Err(_) => Value::Float(text.parse::<f64>().ok()?),
    })
}

fn parse_float(text: &str) -> Option<Value> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return Some(Value::Float(f64::INFINITY));
        }
        "-.inf" | "-.Inf" | "-.INF" => return Some(Value::Float(f64::NEG_INFINITY)),
        ".nan" | ".NaN" | ".NAN" => return Some(Value::Float(f64::NAN)),
        _ => {}
    }
    if !FLOAT_RE.is_match(text) {
        return None;
    }
    text.parse::<f64>().ok().map(Value::Float)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_literals() {
        assert_eq!(resolve_plain("~"), Value::Null);
        assert_eq!(resolve_plain(""), Value::Null);
        assert_eq!(resolve_plain("True"), Value::Bool(true));
        assert_eq!(resolve_plain("FALSE"), Value::Bool(false));
        assert_eq!(resolve_plain("42"), Value::Integer(42));
        assert_eq!(resolve_plain("-7"), Value::Integer(-7));
        assert_eq!(resolve_plain("0x1F"), Value::Integer(31));
        assert_eq!(resolve_plain("0o17"), Value::Integer(15));
        assert_eq!(resolve_plain("1.5"), Value::Float(1.5));
        assert_eq!(resolve_plain("1e3"), Value::Float(1000.0));
        assert_eq!(resolve_plain(".5"), Value::Float(0.5));
        assert_eq!(resolve_plain("-.inf"), Value::Float(f64::NEG_INFINITY));
    }

    #[test]
    fn test_yaml_11_literals_stay_strings() {
        for text in ["yes", "no", "on", "off", "Yes", "OFF", "y", "n"] {
            assert_eq!(resolve_plain(text), Value::String(text.to_string()), "{text}");
        }
    }

    #[test]
    fn test_dates_stay_strings() {
        assert_eq!(
            resolve_plain("2024-01-15"),
            Value::String("2024-01-15".to_string())
        );
        assert_eq!(
            resolve_plain("12:30:00"),
            Value::String("12:30:00".to_string())
        );
    }

    #[test]
    fn test_quoted_scalars_are_strings() {
        assert_eq!(
            resolve_scalar("true", TScalarStyle::DoubleQuoted, None),
            Value::String("true".to_string())
        );
        assert_eq!(
            resolve_scalar("1", TScalarStyle::SingleQuoted, None),
            Value::String("1".to_string())
        );
    }

    #[test]
    fn test_custom_tag_builds_sentinel() {
        let tag = Tag {
            handle: "!".to_string(),
            suffix: "expr".to_string(),
        };
        let value = resolve_scalar("params$x", TScalarStyle::Plain, Some(&tag));
        let tagged = value.as_tagged().unwrap();
        assert_eq!(tagged.tag, "!expr");
        assert_eq!(tagged.value, Value::String("params$x".to_string()));
    }

    #[test]
    fn test_core_tags_coerce() {
        let tag = |suffix: &str| Tag {
            handle: CORE_TAG_PREFIX.to_string(),
            suffix: suffix.to_string(),
        };
        assert_eq!(
            resolve_scalar("42", TScalarStyle::Plain, Some(&tag("str"))),
            Value::String("42".to_string())
        );
        assert_eq!(
            resolve_scalar("42", TScalarStyle::DoubleQuoted, Some(&tag("int"))),
            Value::Integer(42)
        );
        assert_eq!(
            resolve_scalar("3", TScalarStyle::Plain, Some(&tag("float"))),
            Value::Float(3.0)
        );
    }
}
