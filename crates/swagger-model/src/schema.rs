use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::{Constraints, Extensions, ExternalDocumentation, RefOr, UnknownValue};

/// The JSON-Schema (draft 4) subset Swagger 2.0 uses for body payloads and
/// named definitions.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<SchemaType>,
    /// Open format string, per JSON Schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_: Option<Value>,
    #[serde(flatten)]
    pub constraints: Constraints,
    /// Names of required properties.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, RefOr<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<RefOr<Schema>>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<RefOr<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocumentation>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// `additionalProperties`: either a blanket allow/deny or a schema for the
/// extra values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<RefOr<Schema>>),
}

/// The types a schema can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    File,
    Null,
}

impl SchemaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::File => "file",
            Self::Null => "null",
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SchemaType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "object" => Ok(Self::Object),
            "array" => Ok(Self::Array),
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "integer" => Ok(Self::Integer),
            "boolean" => Ok(Self::Boolean),
            "file" => Ok(Self::File),
            "null" => Ok(Self::Null),
            _ => Err(UnknownValue::new("schema type", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataType, Parameter, ParameterLocation, Reference};

    #[test]
    fn test_parameter_field_names() {
        let parameter = Parameter {
            name: "id".to_string(),
            location: ParameterLocation::Query,
            type_: Some(DataType::Integer),
            ..Parameter::default()
        };

        let value = serde_json::to_value(&parameter).unwrap();
        assert_eq!(value["name"], "id");
        assert_eq!(value["in"], "query");
        assert_eq!(value["type"], "integer");
        assert!(value.get("required").is_none());
        assert!(value.get("schema").is_none());
    }

    #[test]
    fn test_ref_or_serializes_untagged() {
        let schema: RefOr<Schema> = Reference::new("#/definitions/Pet").into();
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["$ref"], "#/definitions/Pet");

        let inline = RefOr::item(Schema {
            type_: Some(SchemaType::String),
            ..Schema::default()
        });
        let value = serde_json::to_value(&inline).unwrap();
        assert_eq!(value["type"], "string");
        assert!(value.get("$ref").is_none());
    }

    #[test]
    fn test_schema_type_round_trip() {
        for s in ["object", "array", "string", "number", "integer", "boolean"] {
            assert_eq!(s.parse::<SchemaType>().unwrap().as_str(), s);
        }
        assert!("cookie".parse::<SchemaType>().is_err());
    }

    #[test]
    fn test_extensions_flatten() {
        let mut tag = crate::Tag {
            name: "pets".to_string(),
            ..crate::Tag::default()
        };
        tag.extensions
            .insert("x-internal-id".to_string(), "abc".into());

        let value = serde_json::to_value(&tag).unwrap();
        assert_eq!(value["x-internal-id"], "abc");
    }
}
