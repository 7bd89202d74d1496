use regex::Regex;
use serde_json::{Map, Value};
use swagger_model::{AdditionalProperties, Constraints, Reference, RefOr, Schema, SchemaType};

use super::{extensions, info::decode_external_docs, type_name, Context};
use crate::constraints;
use crate::errors::ErrorKind;
use crate::pointer::Pointer;

/// Decodes a schema position: either an inline Schema Object or a
/// `$ref` leaf, left unresolved for the resolver's second pass.
pub(crate) fn decode_schema(
    cx: &mut Context,
    value: &Value,
    path: &Pointer,
) -> Option<RefOr<Schema>> {
    let object = cx.object(value, path)?;

    if object.contains_key("$ref") {
        let reference = cx.require_str(object, path, "$ref")?;
        if has_siblings(object) {
            cx.warn(path, "fields alongside `$ref` are ignored");
        }
        return Some(Reference::new(reference).into());
    }

    Some(RefOr::Item(decode_schema_object(cx, object, path)))
}

fn has_siblings(object: &Map<String, Value>) -> bool {
    object
        .keys()
        .any(|key| key != "$ref" && !key.starts_with("x-"))
}

fn decode_schema_object(cx: &mut Context, object: &Map<String, Value>, path: &Pointer) -> Schema {
    let type_: Option<SchemaType> = cx.opt_enum(object, path, "type");
    let constraints = decode_constraints(cx, object, path);

    let properties = match object.get("properties") {
        Some(value) => {
            let properties_path = path.child("properties");
            match cx.object(value, &properties_path) {
                Some(map) => map
                    .iter()
                    .filter_map(|(name, property)| {
                        decode_schema(cx, property, &properties_path.child(name))
                            .map(|schema| (name.clone(), schema))
                    })
                    .collect(),
                None => Default::default(),
            }
        }
        None => Default::default(),
    };

    let additional_properties = match object.get("additionalProperties") {
        Some(Value::Bool(allowed)) => Some(AdditionalProperties::Allowed(*allowed)),
        Some(value @ Value::Object(_)) => {
            decode_schema(cx, value, &path.child("additionalProperties"))
                .map(|schema| AdditionalProperties::Schema(Box::new(schema)))
        }
        Some(value) => {
            cx.error(
                &path.child("additionalProperties"),
                ErrorKind::InvalidFieldType,
                format!("expected a boolean or an object, found {}", type_name(value)),
            );
            None
        }
        None => None,
    };

    let items = match object.get("items") {
        Some(Value::Array(_)) => {
            // JSON Schema's tuple form; Swagger 2.0 only uses the single
            // schema form.
            cx.error(
                &path.child("items"),
                ErrorKind::InvalidFieldType,
                "tuple-form `items` is not supported",
            );
            None
        }
        Some(value) => decode_schema(cx, value, &path.child("items")).map(Box::new),
        None => None,
    };

    if type_ == Some(SchemaType::Array) && !object.contains_key("items") {
        cx.warn(path, "array schema without `items`");
    }

    let all_of = match object.get("allOf") {
        Some(value) => {
            let all_of_path = path.child("allOf");
            match value.as_array() {
                Some(entries) => entries
                    .iter()
                    .enumerate()
                    .filter_map(|(i, entry)| decode_schema(cx, entry, &all_of_path.index(i)))
                    .collect(),
                None => {
                    cx.error(
                        &all_of_path,
                        ErrorKind::InvalidFieldType,
                        format!("expected an array, found {}", type_name(value)),
                    );
                    Vec::new()
                }
            }
        }
        None => Vec::new(),
    };

    let external_docs = object
        .get("externalDocs")
        .and_then(|v| decode_external_docs(cx, v, &path.child("externalDocs")));

    let default_ = object.get("default").cloned();
    if let Some(default_) = &default_ {
        let default_path = path.child("default");
        if let Some(type_) = type_ {
            if !value_conforms(default_, type_) {
                cx.error(
                    &default_path,
                    ErrorKind::ConstraintViolation,
                    format!("default value does not conform to declared type `{}`", type_),
                );
            }
        }
        for violation in constraints::check(default_, &constraints) {
            cx.error(&default_path, ErrorKind::ConstraintViolation, violation);
        }
    }

    Schema {
        title: cx.opt_str(object, path, "title"),
        description: cx.opt_str(object, path, "description"),
        type_,
        format: cx.opt_str(object, path, "format"),
        default_,
        constraints,
        required: cx.opt_str_list(object, path, "required").unwrap_or_default(),
        properties,
        additional_properties,
        items,
        all_of,
        discriminator: cx.opt_str(object, path, "discriminator"),
        read_only: cx.opt_bool(object, path, "readOnly"),
        example: object.get("example").cloned(),
        external_docs,
        extensions: extensions(object),
    }
}

/// Decodes the shared JSON-Schema validation keywords of a parameter,
/// item, header or schema node.
pub(crate) fn decode_constraints(
    cx: &mut Context,
    object: &Map<String, Value>,
    path: &Pointer,
) -> Constraints {
    let enum_values = match object.get("enum") {
        Some(value) => match value.as_array() {
            Some(values) => values.clone(),
            None => {
                cx.error(
                    &path.child("enum"),
                    ErrorKind::InvalidFieldType,
                    format!("expected an array, found {}", type_name(value)),
                );
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let constraints = Constraints {
        maximum: cx.opt_f64(object, path, "maximum"),
        exclusive_maximum: cx.opt_bool(object, path, "exclusiveMaximum"),
        minimum: cx.opt_f64(object, path, "minimum"),
        exclusive_minimum: cx.opt_bool(object, path, "exclusiveMinimum"),
        max_length: cx.opt_u64(object, path, "maxLength"),
        min_length: cx.opt_u64(object, path, "minLength"),
        pattern: cx.opt_str(object, path, "pattern"),
        max_items: cx.opt_u64(object, path, "maxItems"),
        min_items: cx.opt_u64(object, path, "minItems"),
        unique_items: cx.opt_bool(object, path, "uniqueItems"),
        multiple_of: cx.opt_f64(object, path, "multipleOf"),
        enum_values,
    };

    if let Some(pattern) = &constraints.pattern {
        if Regex::new(pattern).is_err() {
            cx.error(
                &path.child("pattern"),
                ErrorKind::ConstraintViolation,
                format!("pattern `{}` is not a valid regex", pattern),
            );
        }
    }

    constraints
}

fn value_conforms(value: &Value, type_: SchemaType) -> bool {
    match type_ {
        SchemaType::Object => value.is_object(),
        SchemaType::Array => value.is_array(),
        SchemaType::String => value.is_string(),
        SchemaType::Number => value.is_number(),
        SchemaType::Integer => value.is_i64() || value.is_u64(),
        SchemaType::Boolean => value.is_boolean(),
        SchemaType::Null => value.is_null(),
        SchemaType::File => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(yaml: &str) -> (Option<RefOr<Schema>>, Context) {
        let raw: Value = serde_yaml::from_str(yaml).unwrap();
        let mut cx = Context::new();
        let schema = decode_schema(&mut cx, &raw, &Pointer::from("#/definitions/Pet"));
        (schema, cx)
    }

    #[test]
    fn test_ref_leaf_is_left_unresolved() {
        let (schema, cx) = decode("$ref: '#/definitions/Tag'");

        assert_eq!(
            schema.unwrap(),
            Reference::new("#/definitions/Tag").into()
        );
        assert!(cx.errors.is_empty());
    }

    #[test]
    fn test_ref_with_siblings_warns() {
        let (schema, cx) = decode(
            r#"
            $ref: '#/definitions/Tag'
            description: ignored
            "#,
        );

        assert!(matches!(schema.unwrap(), RefOr::Ref(_)));
        assert_eq!(cx.warnings.len(), 1);
    }

    #[test]
    fn test_object_schema_with_properties() {
        let (schema, cx) = decode(
            r#"
            type: object
            required: [name]
            properties:
              name:
                type: string
              tags:
                type: array
                items:
                  $ref: '#/definitions/Tag'
            "#,
        );

        let schema = match schema.unwrap() {
            RefOr::Item(schema) => schema,
            RefOr::Ref(_) => panic!("expected an inline schema"),
        };
        assert_eq!(schema.type_, Some(SchemaType::Object));
        assert_eq!(schema.required, ["name"]);
        assert_eq!(schema.properties.len(), 2);
        assert!(cx.errors.is_empty());
    }

    #[test]
    fn test_unknown_type_is_invalid_enum_value() {
        let (_, cx) = decode("type: tuple");

        assert_eq!(cx.errors.len(), 1);
        assert_eq!(cx.errors[0].kind, ErrorKind::InvalidEnumValue);
        assert_eq!(cx.errors[0].path.to_string(), "#/definitions/Pet/type");
    }

    #[test]
    fn test_default_must_conform_to_type() {
        let (_, cx) = decode(
            r#"
            type: integer
            default: twelve
            "#,
        );

        assert_eq!(cx.errors.len(), 1);
        assert_eq!(cx.errors[0].kind, ErrorKind::ConstraintViolation);
        assert_eq!(cx.errors[0].path.to_string(), "#/definitions/Pet/default");
    }

    #[test]
    fn test_default_checked_against_constraints() {
        let (_, cx) = decode(
            r#"
            type: integer
            minimum: 10
            default: 3
            "#,
        );

        assert_eq!(cx.errors.len(), 1);
        assert_eq!(cx.errors[0].kind, ErrorKind::ConstraintViolation);
    }

    #[test]
    fn test_tuple_items_rejected() {
        let (_, cx) = decode(
            r#"
            type: array
            items:
              - type: string
              - type: integer
            "#,
        );

        assert_eq!(cx.errors.len(), 1);
        assert_eq!(cx.errors[0].kind, ErrorKind::InvalidFieldType);
    }
}
