//! Typed object model for Swagger 2.0 (`OpenAPI` v2) documents.
//!
//! Plain declarative data: no parsing, no validation logic. The companion
//! `swagger-loader` crate decodes raw JSON/YAML trees into these types and
//! enforces the specification's invariants while doing so.
//!

// crate-specific lint exceptions:
//#![allow()]

mod document;
mod parameter;
mod reference;
mod schema;

pub use document::{
    Contact, Document, ExternalDocumentation, Info, License, Method, Operation, PathItem,
    Response, Scheme, Tag, SWAGGER_VERSION,
};
pub use parameter::{
    CollectionFormat, Constraints, DataType, Format, Header, Items, Parameter, ParameterLocation,
};
pub use reference::{RefOr, Reference};
pub use schema::{AdditionalProperties, Schema, SchemaType};

/// `x-*` extension fields of an object, preserved verbatim in document order.
pub type Extensions = indexmap::IndexMap<String, serde_json::Value>;

/// Error returned when a closed-set value fails to parse.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {what}: {value}")]
pub struct UnknownValue {
    pub what: &'static str,
    pub value: String,
}

impl UnknownValue {
    pub(crate) fn new(what: &'static str, value: impl Into<String>) -> Self {
        Self {
            what,
            value: value.into(),
        }
    }
}
