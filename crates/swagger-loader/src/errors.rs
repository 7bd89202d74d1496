use serde::Serialize;
use thiserror::Error;

use crate::pointer::Pointer;

/// The classification of a single validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    MissingRequiredField,
    InvalidFieldType,
    InvalidEnumValue,
    ConflictingFields,
    InvalidConstraintCombination,
    ConstraintViolation,
    DuplicateParameter,
    UnsupportedReference,
    UnresolvedReference,
    CyclicReference,
    StructuralError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingRequiredField => "missing required field",
            Self::InvalidFieldType => "invalid field type",
            Self::InvalidEnumValue => "invalid enum value",
            Self::ConflictingFields => "conflicting fields",
            Self::InvalidConstraintCombination => "invalid constraint combination",
            Self::ConstraintViolation => "constraint violation",
            Self::DuplicateParameter => "duplicate parameter",
            Self::UnsupportedReference => "unsupported reference",
            Self::UnresolvedReference => "unresolved reference",
            Self::CyclicReference => "cyclic reference",
            Self::StructuralError => "structural error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured validation error, located by a source pointer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub path: Pointer,
    pub kind: ErrorKind,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "at {}: {}: {}", self.path, self.kind, self.message)
    }
}

/// A lint-level finding that does not reject the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub path: Pointer,
    pub message: String,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "at {}: {}", self.path, self.message)
    }
}

/// The ordered list of everything wrong with a rejected document.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ErrorReport {
    pub errors: Vec<ValidationError>,
}

impl ErrorReport {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// The errors of a given kind, in report order.
    pub fn of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }
}

impl From<Vec<ValidationError>> for ErrorReport {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorReport {}

#[derive(Error, Debug)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde_json: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("serde_yaml: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),
    #[error("document rejected with {} error(s)", .0.len())]
    Rejected(ErrorReport),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
