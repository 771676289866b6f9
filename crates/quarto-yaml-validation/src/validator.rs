// YAML validation engine

use std::collections::HashSet;

use quarto_error_reporting::text::edit_distance;
use quarto_source_map::Range;
use quarto_yaml::{AnnotatedParse, NodeKind, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{
    InstancePath, PathSegment, SchemaPath, ValidationError, ValidationErrorKind,
};
use crate::schema::{
    AnyOfSchema, ArraySchema, EnumSchema, NumberSchema, ObjectSchema, RefSchema, Schema,
    SchemaRegistry, StringSchema, TaggedSchema,
};

/// How deep [`describe_schema`] follows references before naming them.
const MAX_DESCRIBE_DEPTH: usize = 6;

/// Tunables for a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidatorOptions {
    /// Upper bound on "did you mean" suggestions per error
    pub max_suggestions: usize,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        ValidatorOptions { max_suggestions: 3 }
    }
}

/// Every violation found, in document order of discovery.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub errors: Vec<ValidationError>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate an annotated parse against a schema with default options.
///
/// Validation never stops at the first problem: every violation is
/// collected, each located at the narrowest responsible range.
///
/// ```
/// use quarto_yaml_validation::{Schema, SchemaRegistry, validate};
///
/// let schema = Schema::from_text("object:\n  properties:\n    toc: boolean\n", None).unwrap();
/// let doc = quarto_yaml::parse("toc: maybe\n", None);
/// let outcome = validate(&schema, &doc, &SchemaRegistry::new());
/// assert_eq!(outcome.errors.len(), 1);
/// assert_eq!(outcome.errors[0].range().start, 5);
/// ```
pub fn validate(
    schema: &Schema,
    parse: &AnnotatedParse,
    registry: &SchemaRegistry,
) -> ValidationOutcome {
    validate_with_options(schema, parse, registry, &ValidatorOptions::default())
}

pub fn validate_with_options(
    schema: &Schema,
    parse: &AnnotatedParse,
    registry: &SchemaRegistry,
    options: &ValidatorOptions,
) -> ValidationOutcome {
    let mut context = ValidationContext::new(registry, options);
    validate_generic(parse, schema, &mut context);
    if context.ref_cycle {
        debug!("schema reference cycle reached with no other verdict; ignored");
    }
    ValidationOutcome {
        errors: context.errors,
    }
}

/// Validation context tracks state during validation
pub struct ValidationContext<'a> {
    /// Reference to the schema registry for ref resolution
    registry: &'a SchemaRegistry,
    options: &'a ValidatorOptions,
    /// Current instance path (e.g., ["format", "html", "toc"])
    instance_path: InstancePath,
    /// Current schema path (e.g., ["object", "properties", "format"])
    schema_path: SchemaPath,
    /// Collected validation errors
    errors: Vec<ValidationError>,
    /// Refs currently being expanded, with the node range they apply to
    active_refs: Vec<(String, usize, usize)>,
    /// Set when a ref was reached again on the node it is expanding. A
    /// branch that only got here has not matched.
    ref_cycle: bool,
}

impl<'a> ValidationContext<'a> {
    pub fn new(registry: &'a SchemaRegistry, options: &'a ValidatorOptions) -> Self {
        Self {
            registry,
            options,
            instance_path: InstancePath::new(),
            schema_path: SchemaPath::new(),
            errors: Vec::new(),
            active_refs: Vec::new(),
            ref_cycle: false,
        }
    }

    /// A context at the same position with no errors, for trying a branch.
    fn fork(&self) -> ValidationContext<'a> {
        ValidationContext {
            registry: self.registry,
            options: self.options,
            instance_path: self.instance_path.clone(),
            schema_path: self.schema_path.clone(),
            errors: Vec::new(),
            active_refs: self.active_refs.clone(),
            ref_cycle: false,
        }
    }

    /// Record an error about `node` failing `schema`, located at `range`.
    fn add_error_at(
        &mut self,
        kind: ValidationErrorKind,
        range: Range,
        node: &AnnotatedParse,
        schema: &Schema,
    ) -> &mut ValidationError {
        let mut error = ValidationError::new(kind, range, self.instance_path.clone())
            .with_schema_path(self.schema_path.clone());
        error.expected = describe_schema(schema, self.registry);
        error.value = verbatim(node);
        error.error_message = schema.annotations().error_message.clone();
        self.errors.push(error);
        let last = self.errors.len() - 1;
        &mut self.errors[last]
    }

    /// Record an error located at the node itself.
    fn add_error(
        &mut self,
        kind: ValidationErrorKind,
        node: &AnnotatedParse,
        schema: &Schema,
    ) -> &mut ValidationError {
        self.add_error_at(kind, node.range(), node, schema)
    }

    fn type_mismatch(&mut self, node: &AnnotatedParse, schema: &Schema) {
        let expected = describe_schema(schema, self.registry);
        self.add_error(
            ValidationErrorKind::TypeMismatch {
                expected,
                got: value_type_name(&node.result),
            },
            node,
            schema,
        );
    }

    /// Execute a function with a new instance path segment
    pub fn with_instance_path<F, R>(&mut self, segment: PathSegment, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.instance_path.push(segment);
        let result = f(self);
        self.instance_path.pop();
        result
    }

    /// Execute a function with a new schema path segment
    pub fn with_schema_path<F, R>(&mut self, segment: impl Into<String>, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.schema_path.push(segment);
        let result = f(self);
        self.schema_path.pop();
        result
    }

    /// Get the collected errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Check if validation failed
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn closest_matches<'s>(&self, target: &str, candidates: impl Iterator<Item = &'s str>) -> Vec<String> {
        closest_matches(target, candidates, self.options.max_suggestions)
    }
}

/// Navigate an annotated tree along an instance path.
///
/// Mapping keys are searched from the last entry backwards, so a repeated
/// key resolves to the occurrence that wins in the parsed value. With
/// `return_key`, the final step returns the key node instead of the value.
pub fn navigate<'a>(
    path: &InstancePath,
    annotation: &'a AnnotatedParse,
    return_key: bool,
    path_index: usize,
) -> Option<&'a AnnotatedParse> {
    let Some(segment) = path.segments().get(path_index) else {
        return Some(annotation);
    };
    let is_last = path_index + 1 == path.len();

    match (annotation.kind, segment) {
        (NodeKind::Object, PathSegment::Key(search_key)) => {
            let entries: Vec<_> = annotation.entries().collect();
            let (key, value) = entries
                .into_iter()
                .rev()
                .find(|(key, _)| key.result.to_key_string() == *search_key)?;
            let target = if return_key && is_last { key } else { value };
            navigate(path, target, return_key, path_index + 1)
        }
        (NodeKind::Array, PathSegment::Index(index)) => {
            let item = annotation.items().get(*index)?;
            navigate(path, item, return_key, path_index + 1)
        }
        _ => None,
    }
}

/// Up to `max` candidates close to `target` by edit distance.
///
/// Only candidates within `max(2, len / 3)` edits qualify, where `len` is
/// the character length of `target`. Ties keep candidate order.
pub fn closest_matches<'s>(
    target: &str,
    candidates: impl Iterator<Item = &'s str>,
    max: usize,
) -> Vec<String> {
    let threshold = (target.chars().count() / 3).max(2);
    let mut scored: Vec<(usize, usize, &str)> = candidates
        .enumerate()
        .filter(|(_, candidate)| *candidate != target)
        .map(|(order, candidate)| (edit_distance(target, candidate), order, candidate))
        .filter(|(distance, _, _)| *distance <= threshold)
        .collect();
    scored.sort_by_key(|&(distance, order, _)| (distance, order));
    let mut seen = HashSet::new();
    scored
        .into_iter()
        .filter(|(_, _, candidate)| seen.insert(*candidate))
        .take(max)
        .map(|(_, _, candidate)| candidate.to_string())
        .collect()
}

/// Main validation dispatcher
fn validate_generic(value: &AnnotatedParse, schema: &Schema, context: &mut ValidationContext) {
    match schema {
        Schema::True | Schema::Any(_) => {}
        Schema::False => {
            context.add_error(
                ValidationErrorKind::Other {
                    message: "No value is allowed here".to_string(),
                },
                value,
                schema,
            );
        }
        Schema::AnyOf(s) => {
            context.with_schema_path("anyOf", |ctx| validate_any_of(value, schema, s, ctx))
        }
        Schema::AllOf(s) => context.with_schema_path("allOf", |ctx| {
            for (i, subschema) in s.schemas.iter().enumerate() {
                let mut branch = ctx.fork();
                branch.with_schema_path(i.to_string(), |b| validate_generic(value, subschema, b));
                if branch.has_errors() || branch.ref_cycle {
                    ctx.ref_cycle |= branch.ref_cycle;
                    ctx.errors.extend(branch.errors);
                    break;
                }
            }
        }),
        Schema::Ref(s) => validate_ref(value, s, context),
        Schema::Tagged(s) => {
            context.with_schema_path("tagged", |ctx| validate_tagged(value, schema, s, ctx))
        }
        _ if value.kind == NodeKind::Tagged => context.type_mismatch(value, schema),
        Schema::Boolean(_) => context.with_schema_path("boolean", |ctx| {
            if value.kind != NodeKind::Boolean {
                ctx.type_mismatch(value, schema);
            }
        }),
        Schema::Number(s) => {
            context.with_schema_path("number", |ctx| validate_number(value, schema, s, ctx))
        }
        Schema::String(s) => {
            context.with_schema_path("string", |ctx| validate_string(value, schema, s, ctx))
        }
        Schema::Null(_) => context.with_schema_path("null", |ctx| {
            if value.kind != NodeKind::Null {
                ctx.type_mismatch(value, schema);
            }
        }),
        Schema::Enum(s) => {
            context.with_schema_path("enum", |ctx| validate_enum(value, schema, s, ctx))
        }
        Schema::Array(s) => {
            context.with_schema_path("array", |ctx| validate_array(value, schema, s, ctx))
        }
        Schema::Object(s) => {
            context.with_schema_path("object", |ctx| validate_object(value, schema, s, ctx))
        }
    }
}

fn validate_ref(value: &AnnotatedParse, schema: &RefSchema, context: &mut ValidationContext) {
    let key = (schema.reference.clone(), value.start, value.end);
    if context.active_refs.contains(&key) {
        trace!(reference = %schema.reference, start = value.start, "ref cycle, not re-entering");
        context.ref_cycle = true;
        return;
    }
    let Some(target) = context.registry.resolve(&schema.reference) else {
        warn!(reference = %schema.reference, "unresolved schema reference; treating as valid");
        return;
    };
    context.active_refs.push(key);
    context.with_schema_path(format!("ref:{}", schema.reference), |ctx| {
        validate_generic(value, target, ctx)
    });
    context.active_refs.pop();
}

fn validate_number(
    value: &AnnotatedParse,
    schema: &Schema,
    number: &NumberSchema,
    context: &mut ValidationContext,
) {
    let Some(num) = value.result.as_f64() else {
        context.type_mismatch(value, schema);
        return;
    };

    let below = |bound: Option<f64>, inclusive: bool| {
        bound.filter(|b| if inclusive { num < *b } else { num <= *b })
    };
    let above = |bound: Option<f64>, inclusive: bool| {
        bound.filter(|b| if inclusive { num > *b } else { num >= *b })
    };
    let minimum = below(number.minimum, true);
    let maximum = above(number.maximum, true);
    let exclusive_minimum = below(number.exclusive_minimum, false);
    let exclusive_maximum = above(number.exclusive_maximum, false);
    if minimum.is_none()
        && maximum.is_none()
        && exclusive_minimum.is_none()
        && exclusive_maximum.is_none()
    {
        return;
    }
    context.add_error(
        ValidationErrorKind::NumberOutOfRange {
            value: num,
            minimum,
            maximum,
            exclusive_minimum,
            exclusive_maximum,
        },
        value,
        schema,
    );
}

fn validate_string(
    value: &AnnotatedParse,
    schema: &Schema,
    string: &StringSchema,
    context: &mut ValidationContext,
) {
    let Some(s) = value.result.as_str() else {
        context.type_mismatch(value, schema);
        return;
    };

    if let Some(pattern) = &string.pattern
        && !pattern.is_match(s)
    {
        context.add_error(
            ValidationErrorKind::StringPatternMismatch {
                value: s.to_string(),
                pattern: pattern.as_str().to_string(),
            },
            value,
            schema,
        );
    }
}

fn validate_enum(
    value: &AnnotatedParse,
    schema: &Schema,
    enum_schema: &EnumSchema,
    context: &mut ValidationContext,
) {
    let json_value = value.result.to_json();
    if enum_schema.values.contains(&json_value) {
        return;
    }

    let suggestions = match value.result.as_str() {
        Some(s) => context.closest_matches(s, enum_schema.values.iter().filter_map(|v| v.as_str())),
        None => Vec::new(),
    };
    let error = context.add_error(
        ValidationErrorKind::InvalidEnumValue {
            value: json_value.to_string(),
            allowed: enum_schema.values.iter().map(render_json).collect(),
        },
        value,
        schema,
    );
    error.suggestions = suggestions;
}

/// anyOf succeeds as soon as one branch does. Otherwise a single error is
/// reported for the value, explained by the branch that came closest.
fn validate_any_of(
    value: &AnnotatedParse,
    schema: &Schema,
    any_of: &AnyOfSchema,
    context: &mut ValidationContext,
) {
    let mut best: Option<(usize, Vec<ValidationError>)> = None;
    let mut cycled = false;

    for (i, subschema) in any_of.schemas.iter().enumerate() {
        let mut branch = context.fork();
        branch.with_schema_path(i.to_string(), |b| validate_generic(value, subschema, b));
        if !branch.has_errors() {
            if !branch.ref_cycle {
                return;
            }
            cycled = true;
            continue;
        }
        let score = match_score(value, &branch.errors, &context.instance_path);
        if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
            best = Some((score, branch.errors));
        }
    }

    let best_errors = match best {
        Some((_, errors)) => errors,
        None if cycled => {
            context.ref_cycle = true;
            return;
        }
        None => Vec::new(),
    };
    let alternatives = any_of
        .schemas
        .iter()
        .map(|s| describe_schema(s, context.registry))
        .collect();
    let base = context.instance_path.clone();
    let mut suggestions = Vec::new();
    for suggestion in best_errors.iter().flat_map(|e| e.suggestions.iter()) {
        if !suggestions.contains(suggestion) && suggestions.len() < context.options.max_suggestions {
            suggestions.push(suggestion.clone());
        }
    }
    let notes = best_errors
        .iter()
        .map(|e| {
            if e.instance_path.len() > base.len() {
                format!("{}: {}", e.instance_path, e.message())
            } else {
                e.message()
            }
        })
        .collect();

    let range = combined_range(value, &best_errors, &base);
    let error = context.add_error_at(
        ValidationErrorKind::NoMatchingAlternative { alternatives },
        range,
        value,
        schema,
    );
    error.notes = notes;
    error.suggestions = suggestions;
}

/// Where a failed anyOf is reported. A lone error below the value keeps
/// its own range; several errors sharing a deeper node point at that node.
fn combined_range(value: &AnnotatedParse, errors: &[ValidationError], base: &InstancePath) -> Range {
    if let [only] = errors
        && only.instance_path.len() > base.len()
    {
        return only.range();
    }
    let Some((first, rest)) = errors.split_first() else {
        return value.range();
    };
    let segments = first.instance_path.segments();
    let shared = rest.iter().fold(segments.len(), |shared, e| {
        let common = segments
            .iter()
            .zip(e.instance_path.segments())
            .take_while(|(a, b)| a == b)
            .count();
        shared.min(common)
    });
    if shared <= base.len() {
        return value.range();
    }
    let mut path = InstancePath::new();
    for segment in &segments[..shared] {
        path.push(segment.clone());
    }
    navigate(&path, value, false, base.len()).map_or_else(|| value.range(), AnnotatedParse::range)
}

/// How well a failed branch matched: 0 when the value has the wrong shape
/// outright, otherwise one more than the number of direct children
/// (properties or elements) that produced no error.
///
/// Scalar constraints (enum, pattern, range) failing on an object or an
/// array also count as a wrong shape.
fn match_score(value: &AnnotatedParse, errors: &[ValidationError], base: &InstancePath) -> usize {
    let composite = matches!(value.kind, NodeKind::Object | NodeKind::Array);
    let shape_mismatch = errors.iter().any(|e| {
        e.instance_path == *base
            && match e.kind {
                ValidationErrorKind::TypeMismatch { .. }
                | ValidationErrorKind::TaggedValueMismatch { .. }
                | ValidationErrorKind::Other { .. } => true,
                ValidationErrorKind::InvalidEnumValue { .. }
                | ValidationErrorKind::StringPatternMismatch { .. }
                | ValidationErrorKind::NumberOutOfRange { .. } => composite,
                _ => false,
            }
    });
    if shape_mismatch {
        return 0;
    }

    let failed: HashSet<&PathSegment> = errors
        .iter()
        .filter_map(|e| e.instance_path.segments().get(base.len()))
        .collect();
    let children: Vec<PathSegment> = match value.kind {
        NodeKind::Object => value
            .entries()
            .map(|(key, _)| PathSegment::Key(key.result.to_key_string()))
            .collect(),
        NodeKind::Array => (0..value.len()).map(PathSegment::Index).collect(),
        _ => Vec::new(),
    };
    1 + children.iter().filter(|c| !failed.contains(c)).count()
}

fn validate_tagged(
    value: &AnnotatedParse,
    schema: &Schema,
    tagged: &TaggedSchema,
    context: &mut ValidationContext,
) {
    match &value.result {
        Value::Tagged(t) if t.tag == tagged.tag => {
            if let Some(inner) = &tagged.schema {
                let untagged = AnnotatedParse {
                    result: t.value.clone(),
                    kind: NodeKind::of(&t.value),
                    ..value.clone()
                };
                validate_generic(&untagged, inner, context);
            }
        }
        Value::Tagged(t) => {
            context.add_error(
                ValidationErrorKind::TaggedValueMismatch {
                    expected: tagged.tag.clone(),
                    got: t.tag.clone(),
                },
                value,
                schema,
            );
        }
        _ => context.type_mismatch(value, schema),
    }
}

fn validate_array(
    value: &AnnotatedParse,
    schema: &Schema,
    array: &ArraySchema,
    context: &mut ValidationContext,
) {
    if value.kind != NodeKind::Array {
        context.type_mismatch(value, schema);
        return;
    }
    let items = value.items();

    let too_short = array.min_items.is_some_and(|min| items.len() < min);
    let too_long = array.max_items.is_some_and(|max| items.len() > max);
    if too_short || too_long {
        context.add_error(
            ValidationErrorKind::ArrayLengthInvalid {
                length: items.len(),
                min_items: array.min_items,
                max_items: array.max_items,
            },
            value,
            schema,
        );
    }

    for (i, item) in items.iter().enumerate() {
        let (segment, item_schema) = match array.prefix_items.get(i) {
            Some(prefix) => (format!("prefixItems:{}", i), prefix),
            None => match &array.items {
                Some(item_schema) => ("items".to_string(), item_schema.as_ref()),
                None => continue,
            },
        };
        context.with_instance_path(PathSegment::Index(i), |ctx| {
            ctx.with_schema_path(segment, |ctx| validate_generic(item, item_schema, ctx))
        });
    }
}

fn validate_object(
    value: &AnnotatedParse,
    schema: &Schema,
    object: &ObjectSchema,
    context: &mut ValidationContext,
) {
    if value.kind != NodeKind::Object {
        context.type_mismatch(value, schema);
        return;
    }

    let keys: HashSet<String> = value
        .entries()
        .map(|(key, _)| key.result.to_key_string())
        .collect();

    for required in &object.required {
        if !keys.contains(required) {
            context.add_error(
                ValidationErrorKind::MissingRequiredProperty {
                    property: required.clone(),
                },
                value,
                schema,
            );
        }
    }

    for (key_node, value_node) in value.entries() {
        let key = key_node.result.to_key_string();

        let mut matched = false;
        if let Some(property_schema) = object.properties.get(&key) {
            matched = true;
            context.with_instance_path(PathSegment::Key(key.clone()), |ctx| {
                ctx.with_schema_path(format!("properties:{}", key), |ctx| {
                    validate_generic(value_node, property_schema, ctx)
                })
            });
        }
        for (pattern, pattern_schema) in &object.pattern_properties {
            if pattern.is_match(&key) {
                matched = true;
                context.with_instance_path(PathSegment::Key(key.clone()), |ctx| {
                    ctx.with_schema_path(format!("patternProperties:{}", pattern.as_str()), |ctx| {
                        validate_generic(value_node, pattern_schema, ctx)
                    })
                });
            }
        }
        if matched {
            continue;
        }

        match object.additional_properties.as_deref() {
            Some(Schema::False) => unknown_property(&key, key_node, schema, object, context),
            Some(additional) => {
                context.with_instance_path(PathSegment::Key(key.clone()), |ctx| {
                    ctx.with_schema_path("additionalProperties", |ctx| {
                        validate_generic(value_node, additional, ctx)
                    })
                });
            }
            None if object.closed => unknown_property(&key, key_node, schema, object, context),
            None => {}
        }
    }
}

/// Report a key that the object does not allow, at the key's own range.
fn unknown_property(
    key: &str,
    key_node: &AnnotatedParse,
    schema: &Schema,
    object: &ObjectSchema,
    context: &mut ValidationContext,
) {
    let visible = object
        .properties
        .iter()
        .filter(|(_, s)| s.annotations().hidden != Some(true))
        .map(|(name, _)| name.as_str());
    let suggestions = context.closest_matches(key, visible);
    context.with_instance_path(PathSegment::Key(key.to_string()), |ctx| {
        let error = ctx.add_error(
            ValidationErrorKind::UnknownProperty {
                property: key.to_string(),
            },
            key_node,
            schema,
        );
        error.suggestions = suggestions;
    });
}

/// A phrase describing what `schema` accepts, to follow "must be".
pub fn describe_schema(schema: &Schema, registry: &SchemaRegistry) -> String {
    describe(schema, registry, 0)
}

fn describe(schema: &Schema, registry: &SchemaRegistry, depth: usize) -> String {
    match schema {
        Schema::False => "nothing".to_string(),
        Schema::True | Schema::Any(_) => "anything".to_string(),
        Schema::Boolean(_) => "a boolean".to_string(),
        Schema::Number(n) => {
            let mut bounds = Vec::new();
            if let Some(min) = n.minimum {
                bounds.push(format!("greater than or equal to {}", min));
            }
            if let Some(min) = n.exclusive_minimum {
                bounds.push(format!("greater than {}", min));
            }
            if let Some(max) = n.maximum {
                bounds.push(format!("less than or equal to {}", max));
            }
            if let Some(max) = n.exclusive_maximum {
                bounds.push(format!("less than {}", max));
            }
            if bounds.is_empty() {
                "a number".to_string()
            } else {
                format!("a number {}", bounds.join(" and "))
            }
        }
        Schema::String(s) => match &s.pattern {
            Some(pattern) => format!("a string matching the pattern {}", pattern.as_str()),
            None => "a string".to_string(),
        },
        Schema::Null(_) => "null".to_string(),
        Schema::Enum(e) => match e.values.as_slice() {
            [single] => render_json(single),
            values => format!(
                "one of: {}",
                values.iter().map(render_json).collect::<Vec<_>>().join(", ")
            ),
        },
        Schema::AnyOf(s) => {
            let mut phrases: Vec<String> = Vec::new();
            for branch in &s.schemas {
                let phrase = describe(branch, registry, depth + 1);
                if !phrases.contains(&phrase) {
                    phrases.push(phrase);
                }
            }
            join_alternatives(&phrases)
        }
        Schema::AllOf(s) => s
            .schemas
            .iter()
            .map(|branch| describe(branch, registry, depth + 1))
            .collect::<Vec<_>>()
            .join(" and "),
        Schema::Array(a) => match a.items.as_deref() {
            Some(items) => {
                let item = describe(items, registry, depth + 1);
                match pluralize(&item) {
                    Some(plural) => format!("an array of {}", plural),
                    None => format!("an array of values, each {}", item),
                }
            }
            None => "an array".to_string(),
        },
        Schema::Object(_) => "an object".to_string(),
        Schema::Ref(r) => match registry.resolve(&r.reference) {
            Some(target) if depth < MAX_DESCRIBE_DEPTH => describe(target, registry, depth + 1),
            _ => format!("a value matching schema '{}'", r.reference),
        },
        Schema::Tagged(t) => format!("a value tagged {}", t.tag),
    }
}

fn join_alternatives(phrases: &[String]) -> String {
    match phrases {
        [] => "nothing".to_string(),
        [one] => one.clone(),
        [first, second] => format!("{} or {}", first, second),
        [init @ .., last] => format!("{}, or {}", init.join(", "), last),
    }
}

/// "a string" -> "strings", "an object" -> "objects"
fn pluralize(phrase: &str) -> Option<String> {
    let rest = phrase
        .strip_prefix("a ")
        .or_else(|| phrase.strip_prefix("an "))?;
    let (noun, tail) = match rest.split_once(' ') {
        Some((noun, tail)) => (noun, format!(" {}", tail)),
        None => (rest, String::new()),
    };
    if noun == "value" {
        return None;
    }
    Some(format!("{}s{}", noun, tail))
}

/// Strings are shown bare, everything else as JSON.
fn render_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_type_name(value: &Value) -> String {
    match value {
        Value::Tagged(t) => format!("tagged {}", t.tag),
        other => other.type_name(),
    }
}

/// The node's source text, shortened to one line, for headings.
fn verbatim(node: &AnnotatedParse) -> String {
    const MAX_CHARS: usize = 40;
    let text = node.text().trim();
    if text.is_empty() {
        return "(empty)".to_string();
    }
    let first_line = text.lines().next().unwrap_or(text);
    let mut shown: String = first_line.chars().take(MAX_CHARS).collect();
    if shown.len() < text.len() {
        shown.push_str("...");
    }
    let quoted = shown.starts_with('"') || shown.starts_with('\'');
    if node.kind == NodeKind::String && !quoted {
        format!("\"{}\"", shown)
    } else {
        shown
    }
}
