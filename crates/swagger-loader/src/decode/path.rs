use indexmap::IndexMap;
use serde_json::Value;
use swagger_model::{
    Method, Operation, Parameter, ParameterLocation, PathItem, RefOr, Reference, Response,
};

use super::info::decode_external_docs;
use super::parameter::{decode_header, decode_parameter};
use super::schema::decode_schema;
use super::{extensions, Context};
use crate::errors::ErrorKind;
use crate::pointer::Pointer;
use crate::resolver::RefTarget;

/// Document-level context the path decoders need: the global `consumes`
/// list and the already-decoded named parameters (so referenced
/// parameters participate in duplicate detection).
pub(crate) struct DocContext<'a> {
    pub consumes: &'a [String],
    pub parameters: &'a IndexMap<String, Parameter>,
}

pub(crate) fn decode_path_item(
    cx: &mut Context,
    value: &Value,
    path: &Pointer,
    doc: &DocContext<'_>,
) -> Option<PathItem> {
    let object = cx.object(value, path)?;

    let ref_ = cx.opt_str(object, path, "$ref");
    if ref_.is_some() {
        let has_siblings = object
            .keys()
            .any(|key| key != "$ref" && !key.starts_with("x-"));
        if has_siblings {
            cx.warn(
                path,
                "fields alongside `$ref` take precedence; the reference is ignored",
            );
        }
    }

    let parameters_path = path.child("parameters");
    let parameters = match object.get("parameters") {
        Some(value) => decode_parameter_list(cx, value, &parameters_path, doc.consumes),
        None => Vec::new(),
    };
    check_duplicates(cx, &parameters, &parameters_path, doc);

    let mut item = PathItem {
        ref_,
        parameters,
        extensions: extensions(object),
        ..PathItem::default()
    };

    for method in Method::ALL {
        if let Some(op_value) = object.get(method.as_str()) {
            let operation = decode_operation(
                cx,
                op_value,
                &path.child(method.as_str()),
                doc,
                &item.parameters,
                &parameters_path,
            );
            match method {
                Method::Get => item.get = operation,
                Method::Put => item.put = operation,
                Method::Post => item.post = operation,
                Method::Delete => item.delete = operation,
                Method::Options => item.options = operation,
                Method::Head => item.head = operation,
                Method::Patch => item.patch = operation,
            }
        }
    }

    Some(item)
}

fn decode_operation(
    cx: &mut Context,
    value: &Value,
    path: &Pointer,
    doc: &DocContext<'_>,
    path_params: &[RefOr<Parameter>],
    path_params_base: &Pointer,
) -> Option<Operation> {
    let object = cx.object(value, path)?;

    let consumes = cx.opt_str_list(object, path, "consumes");
    let effective_consumes = consumes.as_deref().unwrap_or(doc.consumes);

    let parameters_path = path.child("parameters");
    let parameters = match object.get("parameters") {
        Some(value) => decode_parameter_list(cx, value, &parameters_path, effective_consumes),
        None => Vec::new(),
    };
    check_duplicates(cx, &parameters, &parameters_path, doc);
    check_merged_body(
        cx,
        path,
        &parameters,
        &parameters_path,
        path_params,
        path_params_base,
        doc,
    );

    let responses = match object.get("responses") {
        Some(value) => decode_responses(cx, value, &path.child("responses")),
        None => {
            cx.error(
                path,
                ErrorKind::MissingRequiredField,
                "missing required field `responses`",
            );
            IndexMap::new()
        }
    };

    let external_docs = object
        .get("externalDocs")
        .and_then(|v| decode_external_docs(cx, v, &path.child("externalDocs")));

    let schemes = match object.get("schemes") {
        Some(value) => decode_schemes(cx, value, &path.child("schemes")),
        None => Vec::new(),
    };

    Some(Operation {
        tags: cx.opt_str_list(object, path, "tags").unwrap_or_default(),
        summary: cx.opt_str(object, path, "summary"),
        description: cx.opt_str(object, path, "description"),
        external_docs,
        operation_id: cx.opt_str(object, path, "operationId"),
        consumes,
        produces: cx.opt_str_list(object, path, "produces"),
        parameters,
        responses,
        schemes,
        deprecated: cx.opt_bool(object, path, "deprecated").unwrap_or(false),
        extensions: extensions(object),
    })
}

pub(crate) fn decode_schemes(
    cx: &mut Context,
    value: &Value,
    path: &Pointer,
) -> Vec<swagger_model::Scheme> {
    match value.as_array() {
        Some(items) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let item_path = path.index(i);
                let s = match item.as_str() {
                    Some(s) => s,
                    None => {
                        cx.error(
                            &item_path,
                            ErrorKind::InvalidFieldType,
                            format!("expected a string, found {}", super::type_name(item)),
                        );
                        return None;
                    }
                };
                match s.parse::<swagger_model::Scheme>() {
                    Ok(scheme) => Some(scheme),
                    Err(err) => {
                        cx.error(&item_path, ErrorKind::InvalidEnumValue, err.to_string());
                        None
                    }
                }
            })
            .collect(),
        None => {
            cx.error(
                path,
                ErrorKind::InvalidFieldType,
                format!("expected an array, found {}", super::type_name(value)),
            );
            Vec::new()
        }
    }
}

fn decode_parameter_list(
    cx: &mut Context,
    value: &Value,
    path: &Pointer,
    consumes: &[String],
) -> Vec<RefOr<Parameter>> {
    let items = match value.as_array() {
        Some(items) => items,
        None => {
            cx.error(
                path,
                ErrorKind::InvalidFieldType,
                format!("expected an array, found {}", super::type_name(value)),
            );
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| decode_ref_or_parameter(cx, item, &path.index(i), consumes))
        .collect()
}

fn decode_ref_or_parameter(
    cx: &mut Context,
    value: &Value,
    path: &Pointer,
    consumes: &[String],
) -> Option<RefOr<Parameter>> {
    let object = cx.object(value, path)?;

    if object.contains_key("$ref") {
        let reference = cx.require_str(object, path, "$ref")?;
        let has_siblings = object
            .keys()
            .any(|key| key != "$ref" && !key.starts_with("x-"));
        if has_siblings {
            cx.warn(path, "fields alongside `$ref` are ignored");
        }
        return Some(Reference::new(reference).into());
    }

    decode_parameter(cx, value, path, consumes).map(RefOr::Item)
}

/// The (name, location) identity of a list entry, resolving references
/// through the named parameters section when possible.
fn parameter_key(
    entry: &RefOr<Parameter>,
    doc: &DocContext<'_>,
) -> Option<(String, ParameterLocation)> {
    match entry {
        RefOr::Item(parameter) => Some((parameter.name.clone(), parameter.location)),
        RefOr::Ref(reference) => match RefTarget::parse(&reference.reference)? {
            RefTarget::Parameter(name) => doc
                .parameters
                .get(&name)
                .map(|p| (p.name.clone(), p.location)),
            _ => None,
        },
    }
}

/// Duplicate-(name, in) and body-count checks within a single list.
fn check_duplicates(
    cx: &mut Context,
    list: &[RefOr<Parameter>],
    base: &Pointer,
    doc: &DocContext<'_>,
) {
    let keys: Vec<Option<(String, ParameterLocation)>> =
        list.iter().map(|entry| parameter_key(entry, doc)).collect();

    for (i, key) in keys.iter().enumerate() {
        let key = match key {
            Some(key) => key,
            None => continue,
        };
        if let Some(j) = keys[..i].iter().position(|k| k.as_ref() == Some(key)) {
            cx.error(
                &base.index(i),
                ErrorKind::DuplicateParameter,
                format!(
                    "parameter `{}` in `{}` duplicates {}",
                    key.0,
                    key.1,
                    base.index(j)
                ),
            );
        }
    }

    let body_sites: Vec<(usize, &str)> = keys
        .iter()
        .enumerate()
        .filter_map(|(i, key)| match key {
            Some((name, ParameterLocation::Body)) => Some((i, name.as_str())),
            _ => None,
        })
        .collect();
    let distinct_names: std::collections::HashSet<&str> =
        body_sites.iter().map(|(_, name)| *name).collect();
    if distinct_names.len() > 1 {
        let pointers: Vec<String> = body_sites
            .iter()
            .map(|(i, _)| base.index(*i).to_string())
            .collect();
        cx.error(
            &base.index(body_sites[1].0),
            ErrorKind::DuplicateParameter,
            format!(
                "at most one body parameter is allowed; found {}",
                pointers.join(", ")
            ),
        );
    }
}

/// The body-count invariant over the merged (path-level + operation-level)
/// list. Same-(name, in) entries at both levels are an override, not a
/// duplicate; multiplicities inside a single list are flagged by
/// `check_duplicates`.
fn check_merged_body(
    cx: &mut Context,
    op_path: &Pointer,
    op_params: &[RefOr<Parameter>],
    op_base: &Pointer,
    path_params: &[RefOr<Parameter>],
    path_base: &Pointer,
    doc: &DocContext<'_>,
) {
    let op_keys: Vec<Option<(String, ParameterLocation)>> =
        op_params.iter().map(|e| parameter_key(e, doc)).collect();

    let op_bodies: Vec<Pointer> = op_keys
        .iter()
        .enumerate()
        .filter_map(|(i, key)| match key {
            Some((_, ParameterLocation::Body)) => Some(op_base.index(i)),
            _ => None,
        })
        .collect();
    if op_bodies.is_empty() {
        return;
    }

    let inherited_bodies: Vec<Pointer> = path_params
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let key = parameter_key(entry, doc)?;
            if key.1 != ParameterLocation::Body {
                return None;
            }
            // Overridden by an operation-level entry with the same identity?
            if op_keys.iter().flatten().any(|k| *k == key) {
                return None;
            }
            Some(path_base.index(i))
        })
        .collect();

    if !inherited_bodies.is_empty() {
        let pointers: Vec<String> = inherited_bodies
            .iter()
            .chain(op_bodies.iter())
            .map(Pointer::to_string)
            .collect();
        cx.error(
            op_path,
            ErrorKind::DuplicateParameter,
            format!(
                "at most one body parameter is allowed across the merged \
                 parameter list; found {}",
                pointers.join(", ")
            ),
        );
    }
}

fn decode_responses(
    cx: &mut Context,
    value: &Value,
    path: &Pointer,
) -> IndexMap<String, RefOr<Response>> {
    let object = match cx.object(value, path) {
        Some(object) => object,
        None => return IndexMap::new(),
    };

    let mut responses = IndexMap::new();
    let mut candidates = 0;
    for (key, entry) in object {
        if key.starts_with("x-") {
            continue;
        }
        candidates += 1;
        let response_path = path.child(key);
        if !is_status_key(key) {
            cx.error(
                &response_path,
                ErrorKind::InvalidEnumValue,
                format!("`{}` is not `default` or an HTTP status code", key),
            );
            continue;
        }
        if let Some(response) = decode_ref_or_response(cx, entry, &response_path) {
            responses.insert(key.clone(), response);
        }
    }

    if candidates == 0 {
        cx.error(
            path,
            ErrorKind::MissingRequiredField,
            "at least one response is required",
        );
    }

    responses
}

fn is_status_key(key: &str) -> bool {
    key == "default"
        || key
            .parse::<u16>()
            .map_or(false, |code| (100..=599).contains(&code))
}

fn decode_ref_or_response(
    cx: &mut Context,
    value: &Value,
    path: &Pointer,
) -> Option<RefOr<Response>> {
    let object = cx.object(value, path)?;

    if object.contains_key("$ref") {
        let reference = cx.require_str(object, path, "$ref")?;
        return Some(Reference::new(reference).into());
    }

    decode_response(cx, value, path).map(RefOr::Item)
}

pub(crate) fn decode_response(
    cx: &mut Context,
    value: &Value,
    path: &Pointer,
) -> Option<Response> {
    let object = cx.object(value, path)?;

    let schema = object
        .get("schema")
        .and_then(|v| decode_schema(cx, v, &path.child("schema")));

    let headers = match object.get("headers") {
        Some(value) => {
            let headers_path = path.child("headers");
            match cx.object(value, &headers_path) {
                Some(map) => map
                    .iter()
                    .filter_map(|(name, header)| {
                        decode_header(cx, header, &headers_path.child(name))
                            .map(|h| (name.clone(), h))
                    })
                    .collect(),
                None => IndexMap::new(),
            }
        }
        None => IndexMap::new(),
    };

    let examples = match object.get("examples") {
        Some(value) => {
            let examples_path = path.child("examples");
            match cx.object(value, &examples_path) {
                Some(map) => map
                    .iter()
                    .map(|(media_type, example)| (media_type.clone(), example.clone()))
                    .collect(),
                None => IndexMap::new(),
            }
        }
        None => IndexMap::new(),
    };

    Some(Response {
        description: cx.require_str(object, path, "description")?,
        schema,
        headers,
        examples,
        extensions: extensions(object),
    })
}
