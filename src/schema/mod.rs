//! Declarative validation rules for every payload exchanged with the users API.
//!
//! A [`Schema`] is plain data: validating a JSON value against it is pure,
//! synchronous and total. Success yields the normalized value (trimmed strings,
//! unknown object keys stripped); failure yields path-tagged [`Issues`] and
//! never a partially checked value. Named schemas live in [`registry`].

pub mod registry;

use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::{fmt, sync::OnceLock};

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// A single validation failure, tagged with the dotted path of the offending value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub path: String,
    pub message: String,
}

impl Issue {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(formatter, "{}", self.message)
        } else {
            write!(formatter, "{}: {}", self.path, self.message)
        }
    }
}

/// Non-empty list of issues returned by a failed validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Issues(Vec<Issue>);

impl Issues {
    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First issue reported at `path`, if any.
    #[must_use]
    pub fn at(&self, path: &str) -> Option<&Issue> {
        self.0.iter().find(|issue| issue.path == path)
    }
}

impl fmt::Display for Issues {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for issue in &self.0 {
            if !first {
                formatter.write_str("; ")?;
            }
            write!(formatter, "{issue}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for Issues {}

#[derive(Clone)]
enum Check {
    // A pattern that failed to compile rejects every value.
    Pattern {
        regex: Option<Regex>,
        message: String,
    },
    Refine {
        test: fn(&str) -> bool,
        message: String,
    },
    Email,
    Url,
}

impl fmt::Debug for Check {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Pattern { regex, .. } => formatter
                .debug_struct("Pattern")
                .field("regex", &regex.as_ref().map(Regex::as_str))
                .finish(),
            Check::Refine { message, .. } => formatter
                .debug_struct("Refine")
                .field("message", message)
                .finish(),
            Check::Email => formatter.write_str("Email"),
            Check::Url => formatter.write_str("Url"),
        }
    }
}

impl Check {
    fn passes(&self, value: &str) -> bool {
        match self {
            Check::Pattern { regex, .. } => regex.as_ref().is_some_and(|re| re.is_match(value)),
            Check::Refine { test, .. } => test(value),
            Check::Email => email_regex().is_some_and(|re| re.is_match(value)),
            Check::Url => url::Url::parse(value).is_ok(),
        }
    }

    fn message(&self) -> &str {
        match self {
            Check::Pattern { message, .. } | Check::Refine { message, .. } => message,
            Check::Email => "Invalid email address",
            Check::Url => "Invalid URL",
        }
    }
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

/// Constraints applied to a string value, after optional trimming.
///
/// Every failing check is reported, so a value can carry several issues.
#[derive(Clone, Debug, Default)]
pub struct StringRule {
    trim: bool,
    min: Option<usize>,
    max: Option<usize>,
    checks: Vec<Check>,
}

impl StringRule {
    #[must_use]
    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    #[must_use]
    pub fn min(mut self, chars: usize) -> Self {
        self.min = Some(chars);
        self
    }

    #[must_use]
    pub fn max(mut self, chars: usize) -> Self {
        self.max = Some(chars);
        self
    }

    #[must_use]
    pub fn exact(self, chars: usize) -> Self {
        self.min(chars).max(chars)
    }

    #[must_use]
    pub fn pattern(mut self, pattern: &str, message: impl Into<String>) -> Self {
        self.checks.push(Check::Pattern {
            regex: Regex::new(pattern).ok(),
            message: message.into(),
        });
        self
    }

    #[must_use]
    pub fn refine(mut self, test: fn(&str) -> bool, message: impl Into<String>) -> Self {
        self.checks.push(Check::Refine {
            test,
            message: message.into(),
        });
        self
    }

    #[must_use]
    pub fn email(mut self) -> Self {
        self.checks.push(Check::Email);
        self
    }

    #[must_use]
    pub fn url(mut self) -> Self {
        self.checks.push(Check::Url);
        self
    }

    fn check(&self, raw: &str, path: &str, issues: &mut Vec<Issue>) -> Option<Value> {
        let value = if self.trim { raw.trim() } else { raw };
        let length = value.chars().count();
        let before = issues.len();

        if let Some(min) = self.min {
            if length < min {
                issues.push(Issue::new(
                    path,
                    format!("Must contain at least {min} character(s)"),
                ));
            }
        }
        if let Some(max) = self.max {
            if length > max {
                issues.push(Issue::new(
                    path,
                    format!("Must contain at most {max} character(s)"),
                ));
            }
        }
        for check in &self.checks {
            if !check.passes(value) {
                issues.push(Issue::new(path, check.message()));
            }
        }

        (issues.len() == before).then(|| Value::String(value.to_string()))
    }
}

/// Shape and constraints of a JSON value.
#[derive(Clone, Debug)]
pub enum Schema {
    String(StringRule),
    Integer,
    Boolean,
    Literal(&'static str),
    /// Present, possibly `null`.
    Nullable(Box<Schema>),
    /// May be absent from its parent object, or `null`.
    Optional(Box<Schema>),
    Array(Box<Schema>),
    Object(ObjectSchema),
    /// First matching branch wins; when none match, the first branch's issues are reported.
    Union(Vec<Schema>),
}

impl From<StringRule> for Schema {
    fn from(rule: StringRule) -> Self {
        Schema::String(rule)
    }
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        Schema::Object(object)
    }
}

impl Schema {
    pub fn nullable(inner: impl Into<Schema>) -> Self {
        Schema::Nullable(Box::new(inner.into()))
    }

    pub fn optional(inner: impl Into<Schema>) -> Self {
        Schema::Optional(Box::new(inner.into()))
    }

    pub fn array(item: impl Into<Schema>) -> Self {
        Schema::Array(Box::new(item.into()))
    }

    #[must_use]
    pub fn union(branches: Vec<Schema>) -> Self {
        Schema::Union(branches)
    }

    /// Validates `value` and returns its normalized form.
    ///
    /// # Errors
    /// Returns the collected [`Issues`] when `value` does not conform.
    pub fn validate(&self, value: &Value) -> Result<Value, Issues> {
        let mut issues = Vec::new();
        match self.check(value, "", &mut issues) {
            Some(normalized) if issues.is_empty() => Ok(normalized),
            _ => {
                if issues.is_empty() {
                    issues.push(Issue::new("", "Invalid input"));
                }
                Err(Issues(issues))
            }
        }
    }

    /// Validates `value` and deserializes the normalized form into `T`.
    ///
    /// # Errors
    /// Returns [`Issues`] when validation fails or the normalized value does
    /// not fit `T`.
    pub fn parse<T: DeserializeOwned>(&self, value: &Value) -> Result<T, Issues> {
        let normalized = self.validate(value)?;
        serde_json::from_value(normalized)
            .map_err(|err| Issues(vec![Issue::new("", format!("Unexpected shape: {err}"))]))
    }

    fn accepts_missing(&self) -> bool {
        matches!(self, Schema::Optional(_))
    }

    fn check(&self, value: &Value, path: &str, issues: &mut Vec<Issue>) -> Option<Value> {
        match self {
            Schema::String(rule) => match value.as_str() {
                Some(raw) => rule.check(raw, path, issues),
                None => reject(path, "Expected string", issues),
            },
            Schema::Integer => {
                if value.is_i64() || value.is_u64() {
                    Some(value.clone())
                } else {
                    reject(path, "Expected integer", issues)
                }
            }
            Schema::Boolean => {
                if value.is_boolean() {
                    Some(value.clone())
                } else {
                    reject(path, "Expected boolean", issues)
                }
            }
            Schema::Literal(expected) => {
                if value.as_str() == Some(*expected) {
                    Some(value.clone())
                } else {
                    reject(path, format!("Expected \"{expected}\""), issues)
                }
            }
            Schema::Nullable(inner) | Schema::Optional(inner) => {
                if value.is_null() {
                    Some(Value::Null)
                } else {
                    inner.check(value, path, issues)
                }
            }
            Schema::Array(item) => {
                let Some(items) = value.as_array() else {
                    return reject(path, "Expected array", issues);
                };
                let mut normalized = Vec::with_capacity(items.len());
                let mut valid = true;
                for (index, entry) in items.iter().enumerate() {
                    match item.check(entry, &join(path, &index.to_string()), issues) {
                        Some(value) => normalized.push(value),
                        None => valid = false,
                    }
                }
                valid.then_some(Value::Array(normalized))
            }
            Schema::Object(object) => object.check(value, path, issues),
            Schema::Union(branches) => {
                let mut first_failure = None;
                for branch in branches {
                    let mut branch_issues = Vec::new();
                    if let Some(normalized) = branch.check(value, path, &mut branch_issues) {
                        if branch_issues.is_empty() {
                            return Some(normalized);
                        }
                    }
                    if first_failure.is_none() {
                        first_failure = Some(branch_issues);
                    }
                }
                match first_failure {
                    Some(branch_issues) if !branch_issues.is_empty() => {
                        issues.extend(branch_issues);
                        None
                    }
                    _ => reject(path, "Invalid input", issues),
                }
            }
        }
    }
}

fn reject(path: &str, message: impl Into<String>, issues: &mut Vec<Issue>) -> Option<Value> {
    issues.push(Issue::new(path, message));
    None
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}.{segment}")
    }
}

#[derive(Clone)]
struct Refinement {
    path: &'static str,
    message: &'static str,
    test: fn(&Map<String, Value>) -> bool,
}

impl fmt::Debug for Refinement {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Refinement")
            .field("path", &self.path)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Object shape: ordered named fields plus cross-field refinements.
///
/// Unknown keys are stripped from the normalized output. Refinements run on
/// the normalized fields, only once every field is valid.
#[derive(Clone, Debug, Default)]
pub struct ObjectSchema {
    fields: Vec<(&'static str, Schema)>,
    refinements: Vec<Refinement>,
}

impl ObjectSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: &'static str, schema: impl Into<Schema>) -> Self {
        self.insert(name, schema.into());
        self
    }

    /// Field-union of `self` and `other`. A field defined on both sides keeps
    /// its position and takes `other`'s definition.
    #[must_use]
    pub fn merge(mut self, other: ObjectSchema) -> Self {
        for (name, schema) in other.fields {
            self.insert(name, schema);
        }
        self.refinements.extend(other.refinements);
        self
    }

    /// Adds a cross-field check whose failure is reported at `path`.
    #[must_use]
    pub fn refine(
        mut self,
        path: &'static str,
        message: &'static str,
        test: fn(&Map<String, Value>) -> bool,
    ) -> Self {
        self.refinements.push(Refinement {
            path,
            message,
            test,
        });
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    fn insert(&mut self, name: &'static str, schema: Schema) {
        if let Some(slot) = self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = schema;
        } else {
            self.fields.push((name, schema));
        }
    }

    fn check(&self, value: &Value, path: &str, issues: &mut Vec<Issue>) -> Option<Value> {
        let Some(map) = value.as_object() else {
            return reject(path, "Expected object", issues);
        };

        let mut normalized = Map::new();
        let mut valid = true;
        for (name, schema) in &self.fields {
            let field_path = join(path, name);
            match map.get(*name) {
                None if schema.accepts_missing() => {}
                None => {
                    issues.push(Issue::new(&field_path, "Required"));
                    valid = false;
                }
                Some(field) => match schema.check(field, &field_path, issues) {
                    Some(value) => {
                        normalized.insert((*name).to_string(), value);
                    }
                    None => valid = false,
                },
            }
        }
        if !valid {
            return None;
        }

        let before = issues.len();
        for refinement in &self.refinements {
            if !(refinement.test)(&normalized) {
                issues.push(Issue::new(&join(path, refinement.path), refinement.message));
            }
        }
        (issues.len() == before).then_some(Value::Object(normalized))
    }
}
