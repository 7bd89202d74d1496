use serde_json::Value;
use swagger_model::{
    CollectionFormat, Constraints, DataType, Header, Items, Parameter, ParameterLocation,
};

use super::schema::{decode_constraints, decode_schema};
use super::{extensions, Context};
use crate::constraints;
use crate::errors::ErrorKind;
use crate::pointer::Pointer;

/// Media types that can carry a `file` parameter.
const FORM_MEDIA_TYPES: [&str; 2] = ["multipart/form-data", "application/x-www-form-urlencoded"];

/// Decodes a Parameter Object, applying the location-specific invariants.
///
/// `consumes` is the effective media-type list of the enclosing operation
/// (operation-level, falling back to the document-level list).
pub(crate) fn decode_parameter(
    cx: &mut Context,
    value: &Value,
    path: &Pointer,
    consumes: &[String],
) -> Option<Parameter> {
    let object = cx.object(value, path)?;

    let name = cx.require_str(object, path, "name");
    let location: Option<ParameterLocation> = cx.require_enum(object, path, "in");
    let required = cx.opt_bool(object, path, "required").unwrap_or(false);
    let type_: Option<DataType> = cx.opt_enum(object, path, "type");
    let collection_format: Option<CollectionFormat> = cx.opt_enum(object, path, "collectionFormat");
    let allow_empty_value = cx.opt_bool(object, path, "allowEmptyValue");
    let schema = object
        .get("schema")
        .and_then(|v| decode_schema(cx, v, &path.child("schema")));
    let items = object
        .get("items")
        .and_then(|v| decode_items(cx, v, &path.child("items")));
    let constraints = decode_constraints(cx, object, path);
    let default_ = object.get("default").cloned();

    let location = location?;

    let has_schema = object.contains_key("schema");
    let has_type = object.contains_key("type");
    if location == ParameterLocation::Body {
        if has_type {
            cx.error(
                path,
                ErrorKind::ConflictingFields,
                "`schema` and `type` are mutually exclusive; a body parameter takes `schema`",
            );
        }
        if !has_schema {
            cx.error(
                path,
                ErrorKind::ConflictingFields,
                "a body parameter requires `schema`",
            );
        }
        if !constraints.is_empty() {
            cx.warn(path, "validation keywords have no effect on a body parameter");
        }
    } else {
        if has_schema {
            cx.error(
                path,
                ErrorKind::ConflictingFields,
                format!("`schema` is only valid when `in` is `body`, not `{}`", location),
            );
        }
        if !has_type {
            cx.error(
                path,
                ErrorKind::ConflictingFields,
                format!("a `{}` parameter requires `type`", location),
            );
        }
    }

    if location == ParameterLocation::Path && !required {
        cx.error(
            path,
            ErrorKind::InvalidConstraintCombination,
            "a path parameter must set `required: true`",
        );
    }

    if type_ == Some(DataType::Array) && !object.contains_key("items") {
        cx.error(
            path,
            ErrorKind::InvalidConstraintCombination,
            "`items` is required when `type` is `array`",
        );
    }

    if type_ == Some(DataType::File) {
        if location != ParameterLocation::FormData {
            cx.error(
                path,
                ErrorKind::InvalidConstraintCombination,
                "`type: file` is only valid for formData parameters",
            );
        } else if !consumes.iter().any(|m| is_form_media_type(m)) {
            cx.error(
                path,
                ErrorKind::InvalidConstraintCombination,
                "`type: file` requires `consumes` to include multipart/form-data \
                 or application/x-www-form-urlencoded",
            );
        }
    }

    let query_like = matches!(
        location,
        ParameterLocation::Query | ParameterLocation::FormData
    );
    if collection_format == Some(CollectionFormat::Multi) && !query_like {
        cx.warn(
            path,
            "`collectionFormat: multi` is only valid for query or formData parameters",
        );
    }
    if allow_empty_value == Some(true) && !query_like {
        cx.warn(
            path,
            "`allowEmptyValue` is only valid for query or formData parameters",
        );
    }

    check_default(cx, path, default_.as_ref(), type_, &constraints, required);
    check_enum_members(cx, path, type_, &constraints.enum_values);

    Some(Parameter {
        name: name?,
        location,
        description: cx.opt_str(object, path, "description"),
        required,
        schema,
        type_,
        format: cx.opt_enum(object, path, "format"),
        allow_empty_value,
        items,
        collection_format,
        default_,
        constraints,
        extensions: extensions(object),
    })
}

/// Decodes an Items Object. Unlike parameters, items take no `file` type
/// and no `multi` collection format.
pub(crate) fn decode_items(cx: &mut Context, value: &Value, path: &Pointer) -> Option<Items> {
    let object = cx.object(value, path)?;

    let type_: Option<DataType> = cx.require_enum(object, path, "type");
    if type_ == Some(DataType::File) {
        cx.error(
            &path.child("type"),
            ErrorKind::InvalidEnumValue,
            "`file` is not a valid item type",
        );
        return None;
    }

    let collection_format: Option<CollectionFormat> = cx.opt_enum(object, path, "collectionFormat");
    if collection_format == Some(CollectionFormat::Multi) {
        cx.error(
            &path.child("collectionFormat"),
            ErrorKind::InvalidEnumValue,
            "`multi` is not a valid collection format for items",
        );
    }

    let items = object
        .get("items")
        .and_then(|v| decode_items(cx, v, &path.child("items")))
        .map(Box::new);
    if type_ == Some(DataType::Array) && !object.contains_key("items") {
        cx.error(
            path,
            ErrorKind::InvalidConstraintCombination,
            "`items` is required when `type` is `array`",
        );
    }

    let constraints = decode_constraints(cx, object, path);
    let default_ = object.get("default").cloned();
    check_default(cx, path, default_.as_ref(), type_, &constraints, false);
    check_enum_members(cx, path, type_, &constraints.enum_values);

    Some(Items {
        type_: type_?,
        format: cx.opt_enum(object, path, "format"),
        items,
        collection_format,
        default_,
        constraints,
        extensions: extensions(object),
    })
}

/// Decodes a Header Object: the Items surface plus a description.
pub(crate) fn decode_header(cx: &mut Context, value: &Value, path: &Pointer) -> Option<Header> {
    let object = cx.object(value, path)?;
    let description = cx.opt_str(object, path, "description");
    let items = decode_items(cx, value, path)?;

    Some(Header {
        description,
        type_: items.type_,
        format: items.format,
        items: items.items.map(|boxed| *boxed),
        collection_format: items.collection_format,
        default_: items.default_,
        constraints: items.constraints,
        extensions: items.extensions,
    })
}

fn check_default(
    cx: &mut Context,
    path: &Pointer,
    default_: Option<&Value>,
    type_: Option<DataType>,
    constraints: &Constraints,
    required: bool,
) {
    let default_ = match default_ {
        Some(value) => value,
        None => return,
    };
    let default_path = path.child("default");

    if required {
        cx.warn(&default_path, "`default` has no meaning for a required parameter");
    }

    if let Some(type_) = type_ {
        if !constraints::conforms_to(default_, type_) {
            cx.error(
                &default_path,
                ErrorKind::ConstraintViolation,
                format!("default value does not conform to declared type `{}`", type_),
            );
            return;
        }
    }

    for violation in constraints::check(default_, constraints) {
        cx.error(&default_path, ErrorKind::ConstraintViolation, violation);
    }
}

fn check_enum_members(
    cx: &mut Context,
    path: &Pointer,
    type_: Option<DataType>,
    enum_values: &[Value],
) {
    let type_ = match type_ {
        Some(type_) => type_,
        None => return,
    };
    for (i, member) in enum_values.iter().enumerate() {
        if !constraints::conforms_to(member, type_) {
            cx.error(
                &path.child("enum").index(i),
                ErrorKind::ConstraintViolation,
                format!("enum value does not conform to declared type `{}`", type_),
            );
        }
    }
}

fn is_form_media_type(media_type: &str) -> bool {
    FORM_MEDIA_TYPES
        .iter()
        .any(|form| media_type == *form || media_type.starts_with(&format!("{};", form)))
}
