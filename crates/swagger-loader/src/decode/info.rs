use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use swagger_model::{Contact, ExternalDocumentation, Info, License, Tag};

use super::{extensions, Context};
use crate::errors::ErrorKind;
use crate::pointer::Pointer;

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub(crate) fn decode_info(cx: &mut Context, value: &Value, path: &Pointer) -> Option<Info> {
    let object = cx.object(value, path)?;

    let title = cx.require_str(object, path, "title");
    let version = cx.require_str(object, path, "version");
    let terms_of_service = cx.opt_str(object, path, "termsOfService");
    if let Some(url) = &terms_of_service {
        cx.check_url(path, "termsOfService", url);
    }

    let contact = object
        .get("contact")
        .and_then(|v| decode_contact(cx, v, &path.child("contact")));
    let license = object
        .get("license")
        .and_then(|v| decode_license(cx, v, &path.child("license")));

    Some(Info {
        title: title?,
        description: cx.opt_str(object, path, "description"),
        terms_of_service,
        contact,
        license,
        version: version?,
        extensions: extensions(object),
    })
}

fn decode_contact(cx: &mut Context, value: &Value, path: &Pointer) -> Option<Contact> {
    let object = cx.object(value, path)?;

    let url = cx.opt_str(object, path, "url");
    if let Some(url) = &url {
        cx.check_url(path, "url", url);
    }

    let email = cx.opt_str(object, path, "email");
    if let Some(email) = &email {
        if !EMAIL.is_match(email) {
            cx.error(
                &path.child("email"),
                ErrorKind::ConstraintViolation,
                format!("`{}` is not a valid email address", email),
            );
        }
    }

    Some(Contact {
        name: cx.opt_str(object, path, "name"),
        url,
        email,
        extensions: extensions(object),
    })
}

fn decode_license(cx: &mut Context, value: &Value, path: &Pointer) -> Option<License> {
    let object = cx.object(value, path)?;

    let url = cx.opt_str(object, path, "url");
    if let Some(url) = &url {
        cx.check_url(path, "url", url);
    }

    Some(License {
        name: cx.require_str(object, path, "name")?,
        url,
        extensions: extensions(object),
    })
}

pub(crate) fn decode_external_docs(
    cx: &mut Context,
    value: &Value,
    path: &Pointer,
) -> Option<ExternalDocumentation> {
    let object = cx.object(value, path)?;

    let url = cx.require_str(object, path, "url")?;
    cx.check_url(path, "url", &url);

    Some(ExternalDocumentation {
        description: cx.opt_str(object, path, "description"),
        url,
        extensions: extensions(object),
    })
}

/// Decodes the document's tag list; duplicate names are a lint-level
/// warning, not an error.
pub(crate) fn decode_tags(cx: &mut Context, value: &Value, path: &Pointer) -> Vec<Tag> {
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

    let mut tags: Vec<Tag> = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let tag_path = path.index(i);
        if let Some(tag) = decode_tag(cx, item, &tag_path) {
            if tags.iter().any(|t| t.name == tag.name) {
                cx.warn(&tag_path, format!("duplicate tag name `{}`", tag.name));
            }
            tags.push(tag);
        }
    }
    tags
}

fn decode_tag(cx: &mut Context, value: &Value, path: &Pointer) -> Option<Tag> {
    let object = cx.object(value, path)?;

    let external_docs = object
        .get("externalDocs")
        .and_then(|v| decode_external_docs(cx, v, &path.child("externalDocs")));

    Some(Tag {
        name: cx.require_str(object, path, "name")?,
        description: cx.opt_str(object, path, "description"),
        external_docs,
        extensions: extensions(object),
    })
}
