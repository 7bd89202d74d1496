//! Node decoders: one decoder per Swagger object, converting raw
//! `serde_json::Value` nodes into typed entities while accumulating
//! errors.

pub(crate) mod info;
pub(crate) mod parameter;
pub(crate) mod path;
pub(crate) mod schema;

use std::str::FromStr;

use serde_json::{Map, Value};
use swagger_model::{Extensions, UnknownValue};

use crate::errors::{ErrorKind, ValidationError, Warning};
use crate::pointer::Pointer;

/// Shared decoding state: the accumulated errors and warnings.
///
/// Decoders record failures here and return `None`, so sibling nodes keep
/// decoding.
#[derive(Debug, Default)]
pub(crate) struct Context {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<Warning>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, path: &Pointer, kind: ErrorKind, message: impl Into<String>) {
        self.errors.push(ValidationError {
            path: path.clone(),
            kind,
            message: message.into(),
        });
    }

    pub fn warn(&mut self, path: &Pointer, message: impl Into<String>) {
        self.warnings.push(Warning {
            path: path.clone(),
            message: message.into(),
        });
    }

    /// The value as an object, or an `InvalidFieldType` error.
    pub fn object<'a>(
        &mut self,
        value: &'a Value,
        path: &Pointer,
    ) -> Option<&'a Map<String, Value>> {
        match value.as_object() {
            Some(map) => Some(map),
            None => {
                self.error(
                    path,
                    ErrorKind::InvalidFieldType,
                    format!("expected an object, found {}", type_name(value)),
                );
                None
            }
        }
    }

    pub fn require_str(
        &mut self,
        object: &Map<String, Value>,
        path: &Pointer,
        key: &str,
    ) -> Option<String> {
        match object.get(key) {
            Some(value) => self.str_value(value, &path.child(key)),
            None => {
                self.error(
                    path,
                    ErrorKind::MissingRequiredField,
                    format!("missing required field `{}`", key),
                );
                None
            }
        }
    }

    pub fn opt_str(
        &mut self,
        object: &Map<String, Value>,
        path: &Pointer,
        key: &str,
    ) -> Option<String> {
        object
            .get(key)
            .and_then(|value| self.str_value(value, &path.child(key)))
    }

    fn str_value(&mut self, value: &Value, path: &Pointer) -> Option<String> {
        match value.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                self.error(
                    path,
                    ErrorKind::InvalidFieldType,
                    format!("expected a string, found {}", type_name(value)),
                );
                None
            }
        }
    }

    pub fn opt_bool(
        &mut self,
        object: &Map<String, Value>,
        path: &Pointer,
        key: &str,
    ) -> Option<bool> {
        match object.get(key) {
            Some(value) => match value.as_bool() {
                Some(b) => Some(b),
                None => {
                    self.error(
                        &path.child(key),
                        ErrorKind::InvalidFieldType,
                        format!("expected a boolean, found {}", type_name(value)),
                    );
                    None
                }
            },
            None => None,
        }
    }

    pub fn opt_f64(
        &mut self,
        object: &Map<String, Value>,
        path: &Pointer,
        key: &str,
    ) -> Option<f64> {
        match object.get(key) {
            Some(value) => match value.as_f64() {
                Some(n) => Some(n),
                None => {
                    self.error(
                        &path.child(key),
                        ErrorKind::InvalidFieldType,
                        format!("expected a number, found {}", type_name(value)),
                    );
                    None
                }
            },
            None => None,
        }
    }

    pub fn opt_u64(
        &mut self,
        object: &Map<String, Value>,
        path: &Pointer,
        key: &str,
    ) -> Option<u64> {
        match object.get(key) {
            Some(value) => match value.as_u64() {
                Some(n) => Some(n),
                None => {
                    self.error(
                        &path.child(key),
                        ErrorKind::InvalidFieldType,
                        format!("expected a non-negative integer, found {}", type_name(value)),
                    );
                    None
                }
            },
            None => None,
        }
    }

    /// An optional list of strings (`consumes`, `produces`, `tags`, …).
    ///
    /// Absent yields `None`; present-but-malformed entries are skipped
    /// with an error.
    pub fn opt_str_list(
        &mut self,
        object: &Map<String, Value>,
        path: &Pointer,
        key: &str,
    ) -> Option<Vec<String>> {
        let value = object.get(key)?;
        let list_path = path.child(key);
        match value.as_array() {
            Some(items) => Some(
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| self.str_value(item, &list_path.index(i)))
                    .collect(),
            ),
            None => {
                self.error(
                    &list_path,
                    ErrorKind::InvalidFieldType,
                    format!("expected an array, found {}", type_name(value)),
                );
                None
            }
        }
    }

    /// Decodes an optional closed-set field through the model's `FromStr`.
    pub fn opt_enum<T>(
        &mut self,
        object: &Map<String, Value>,
        path: &Pointer,
        key: &str,
    ) -> Option<T>
    where
        T: FromStr<Err = UnknownValue>,
    {
        let value = object.get(key)?;
        let field_path = path.child(key);
        let s = self.str_value(value, &field_path)?;
        self.parse_enum(&s, &field_path)
    }

    pub fn require_enum<T>(
        &mut self,
        object: &Map<String, Value>,
        path: &Pointer,
        key: &str,
    ) -> Option<T>
    where
        T: FromStr<Err = UnknownValue>,
    {
        let s = self.require_str(object, path, key)?;
        self.parse_enum(&s, &path.child(key))
    }

    fn parse_enum<T>(&mut self, s: &str, path: &Pointer) -> Option<T>
    where
        T: FromStr<Err = UnknownValue>,
    {
        match s.parse() {
            Ok(value) => Some(value),
            Err(err) => {
                self.error(path, ErrorKind::InvalidEnumValue, err.to_string());
                None
            }
        }
    }

    /// Validates a field documented as "MUST be in the format of a URL".
    pub fn check_url(&mut self, path: &Pointer, key: &str, url: &str) {
        if url.parse::<http::Uri>().is_err() {
            self.error(
                &path.child(key),
                ErrorKind::ConstraintViolation,
                format!("`{}` is not a valid URL", url),
            );
        }
    }
}

/// Collects the `x-*` keys of an object, preserved verbatim.
pub(crate) fn extensions(object: &Map<String, Value>) -> Extensions {
    object
        .iter()
        .filter(|(key, _)| key.starts_with("x-"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
