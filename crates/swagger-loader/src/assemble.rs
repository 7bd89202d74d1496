//! The document assembler: walks a raw parsed tree, applies the node
//! decoders in dependency order and validates references, producing a
//! typed [`Document`] or a complete error report.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use swagger_model::{Document, SWAGGER_VERSION};

use crate::decode::info::{decode_external_docs, decode_info, decode_tags};
use crate::decode::parameter::decode_parameter;
use crate::decode::path::{decode_path_item, decode_response, decode_schemes, DocContext};
use crate::decode::schema::decode_schema;
use crate::decode::{self, Context};
use crate::errors::{ErrorKind, ErrorReport, ValidationError, Warning};
use crate::pointer::Pointer;
use crate::resolver;

/// A successfully assembled document plus its lint-level warnings.
#[derive(Debug)]
pub struct Assembly {
    pub document: Document,
    pub warnings: Vec<Warning>,
}

/// Assembles a raw, already-parsed tree into a validated document.
///
/// Decoding accumulates: every independent problem ends up in the report.
/// Only a malformed root or a missing `paths` container aborts
/// immediately, with a single structural error.
///
/// # Errors
///
/// Returns the report of everything wrong with the document. A non-empty
/// report means the document is rejected as a whole; there is no notion
/// of a partially valid result.
pub fn assemble(raw: &Value) -> Result<Assembly, ErrorReport> {
    let root_path = Pointer::root();

    let root = match raw.as_object() {
        Some(root) => root,
        None => return Err(structural(root_path, "document root must be an object")),
    };
    let paths_value = match root.get("paths") {
        Some(value) => value,
        None => {
            return Err(structural(
                root_path,
                "missing required container `paths`",
            ))
        }
    };
    let paths_object = match paths_value.as_object() {
        Some(object) => object,
        None => {
            return Err(structural(
                root_path.child("paths"),
                "`paths` must be an object",
            ))
        }
    };

    let mut cx = Context::new();

    let swagger = match cx.require_str(root, &root_path, "swagger") {
        Some(version) => {
            if version != SWAGGER_VERSION {
                cx.error(
                    &root_path.child("swagger"),
                    ErrorKind::InvalidEnumValue,
                    format!(
                        "unsupported version `{}`; this loader reads Swagger {}",
                        version, SWAGGER_VERSION
                    ),
                );
            }
            version
        }
        None => String::new(),
    };

    let info = match root.get("info") {
        Some(value) => decode_info(&mut cx, value, &root_path.child("info")),
        None => {
            cx.error(
                &root_path,
                ErrorKind::MissingRequiredField,
                "missing required field `info`",
            );
            None
        }
    }
    .unwrap_or_default();

    let host = cx.opt_str(root, &root_path, "host");
    let base_path = cx.opt_str(root, &root_path, "basePath");
    if let Some(base_path) = &base_path {
        if !base_path.starts_with('/') {
            cx.warn(&root_path.child("basePath"), "`basePath` must start with `/`");
        }
    }

    let schemes = match root.get("schemes") {
        Some(value) => decode_schemes(&mut cx, value, &root_path.child("schemes")),
        None => Vec::new(),
    };
    let consumes = cx
        .opt_str_list(root, &root_path, "consumes")
        .unwrap_or_default();
    let produces = cx
        .opt_str_list(root, &root_path, "produces")
        .unwrap_or_default();

    let tags = match root.get("tags") {
        Some(value) => decode_tags(&mut cx, value, &root_path.child("tags")),
        None => Vec::new(),
    };

    // Named sections, decoded with their references left untouched for
    // the resolver's second pass.
    let definitions = decode_named(&mut cx, root, &root_path, "definitions", decode_schema);
    let parameters = decode_named(&mut cx, root, &root_path, "parameters", |cx, value, path| {
        decode_parameter(cx, value, path, &consumes)
    });
    let responses = decode_named(&mut cx, root, &root_path, "responses", decode_response);

    let doc_cx = DocContext {
        consumes: &consumes,
        parameters: &parameters,
    };
    let paths_path = root_path.child("paths");
    let mut paths = IndexMap::new();
    for (template, value) in paths_object {
        if template.starts_with("x-") {
            continue;
        }
        let item_path = paths_path.child(template);
        if !template.starts_with('/') {
            cx.warn(&item_path, "path templates must start with `/`");
        }
        if let Some(item) = decode_path_item(&mut cx, value, &item_path, &doc_cx) {
            paths.insert(template.clone(), item);
        }
    }

    let external_docs = root
        .get("externalDocs")
        .and_then(|v| decode_external_docs(&mut cx, v, &root_path.child("externalDocs")));

    let document = Document {
        swagger,
        info,
        host,
        base_path,
        schemes,
        consumes,
        produces,
        paths,
        definitions,
        parameters,
        responses,
        tags,
        external_docs,
        extensions: decode::extensions(root),
    };

    resolver::validate_references(&document, &mut cx);

    tracing::debug!(
        "assembled document with {} path(s), {} definition(s), {} error(s), {} warning(s)",
        document.paths.len(),
        document.definitions.len(),
        cx.errors.len(),
        cx.warnings.len()
    );

    if cx.errors.is_empty() {
        Ok(Assembly {
            document,
            warnings: cx.warnings,
        })
    } else {
        Err(ErrorReport { errors: cx.errors })
    }
}

fn decode_named<T>(
    cx: &mut Context,
    root: &Map<String, Value>,
    root_path: &Pointer,
    section: &str,
    mut decode_entry: impl FnMut(&mut Context, &Value, &Pointer) -> Option<T>,
) -> IndexMap<String, T> {
    let value = match root.get(section) {
        Some(value) => value,
        None => return IndexMap::new(),
    };
    let section_path = root_path.child(section);
    let object = match cx.object(value, &section_path) {
        Some(object) => object,
        None => return IndexMap::new(),
    };

    let mut entries = IndexMap::new();
    for (name, entry) in object {
        if name.starts_with("x-") {
            continue;
        }
        if let Some(decoded) = decode_entry(cx, entry, &section_path.child(name)) {
            entries.insert(name.clone(), decoded);
        }
    }
    entries
}

fn structural(path: Pointer, message: &str) -> ErrorReport {
    ErrorReport {
        errors: vec![ValidationError {
            path,
            kind: ErrorKind::StructuralError,
            message: message.to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn assemble_yaml(yaml: &str) -> Result<Assembly, ErrorReport> {
        let raw: Value = serde_yaml::from_str(yaml).unwrap();
        assemble(&raw)
    }

    const MINIMAL: &str = r#"
        swagger: "2.0"
        info:
          title: Petstore
          version: "1.0.0"
        paths:
          /pets:
            get:
              responses:
                "200":
                  description: OK
    "#;

    #[test]
    fn test_minimal_document_round_trips() {
        let assembly = assemble_yaml(MINIMAL).unwrap();

        assert_eq!(assembly.document.swagger, "2.0");
        assert_eq!(assembly.document.info.title, "Petstore");
        assert_eq!(assembly.document.info.version, "1.0.0");
        assert_eq!(assembly.document.paths.len(), 1);
        assert!(assembly.document.paths["/pets"].get.is_some());
        assert!(assembly.warnings.is_empty());
    }

    #[test]
    fn test_non_object_root_is_structural() {
        let report = assemble(&json!(["not", "a", "document"])).unwrap_err();

        assert_eq!(report.len(), 1);
        assert_eq!(report.errors[0].kind, ErrorKind::StructuralError);
        assert_eq!(report.errors[0].path.to_string(), "#");
    }

    #[test]
    fn test_missing_paths_aborts_with_a_single_error() {
        // `info` is broken too, but the structural failure wins alone.
        let report = assemble_yaml(
            r#"
            swagger: "2.0"
            info:
              title: Petstore
            "#,
        )
        .unwrap_err();

        assert_eq!(report.len(), 1);
        assert_eq!(report.errors[0].kind, ErrorKind::StructuralError);
    }

    #[test]
    fn test_non_object_paths_is_structural() {
        let report = assemble_yaml(
            r#"
            swagger: "2.0"
            info:
              title: Petstore
              version: "1.0.0"
            paths: []
            "#,
        )
        .unwrap_err();

        assert_eq!(report.len(), 1);
        assert_eq!(report.errors[0].kind, ErrorKind::StructuralError);
        assert_eq!(report.errors[0].path.to_string(), "#/paths");
    }

    #[test]
    fn test_independent_errors_accumulate() {
        let report = assemble_yaml(
            r#"
            swagger: "1.2"
            info:
              title: Petstore
            paths:
              /pets:
                get:
                  parameters:
                    - name: limit
                      in: cookie
                      type: integer
                  responses:
                    "200":
                      description: OK
            "#,
        )
        .unwrap_err();

        let kinds: Vec<_> = report.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [
                ErrorKind::InvalidEnumValue,    // swagger: "1.2"
                ErrorKind::MissingRequiredField, // info.version
                ErrorKind::InvalidEnumValue,    // in: cookie
            ]
        );
    }

    #[test]
    fn test_missing_swagger_version() {
        let report = assemble_yaml(
            r#"
            info:
              title: Petstore
              version: "1.0.0"
            paths: {}
            "#,
        )
        .unwrap_err();

        assert_eq!(report.len(), 1);
        assert_eq!(report.errors[0].kind, ErrorKind::MissingRequiredField);
    }

    #[test]
    fn test_cyclic_definitions_complete_with_error() {
        let report = assemble_yaml(
            r#"
            swagger: "2.0"
            info:
              title: Petstore
              version: "1.0.0"
            paths: {}
            definitions:
              A:
                type: object
                properties:
                  b:
                    $ref: '#/definitions/B'
              B:
                type: object
                properties:
                  a:
                    $ref: '#/definitions/A'
            "#,
        )
        .unwrap_err();

        let cycles: Vec<_> = report.of_kind(ErrorKind::CyclicReference).collect();
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].message.contains("#/definitions/A"));
        assert!(cycles[0].message.contains("#/definitions/B"));
    }

    #[test]
    fn test_unresolved_and_unsupported_references() {
        let report = assemble_yaml(
            r#"
            swagger: "2.0"
            info:
              title: Petstore
              version: "1.0.0"
            paths:
              /pets:
                get:
                  parameters:
                    - $ref: '#/parameters/missing'
                    - $ref: 'common.yaml#/parameters/limit'
                  responses:
                    "200":
                      description: OK
            "#,
        )
        .unwrap_err();

        let kinds: Vec<_> = report.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [
                ErrorKind::UnresolvedReference,
                ErrorKind::UnsupportedReference,
            ]
        );
        assert_eq!(
            report.errors[0].path.to_string(),
            "#/paths/~1pets/get/parameters/0"
        );
    }

    #[test]
    fn test_named_parameter_reference_resolves() {
        let assembly = assemble_yaml(
            r#"
            swagger: "2.0"
            info:
              title: Petstore
              version: "1.0.0"
            parameters:
              limitParam:
                name: limit
                in: query
                type: integer
            paths:
              /pets:
                get:
                  parameters:
                    - $ref: '#/parameters/limitParam'
                  responses:
                    "200":
                      description: OK
            "#,
        )
        .unwrap();

        use crate::resolver::DocumentExt;
        let parameter = assembly
            .document
            .find_parameter("#/parameters/limitParam")
            .unwrap();
        assert_eq!(parameter.name, "limit");
    }

    #[test]
    fn test_duplicate_tags_warn_but_do_not_reject() {
        let assembly = assemble_yaml(
            r#"
            swagger: "2.0"
            info:
              title: Petstore
              version: "1.0.0"
            tags:
              - name: pets
              - name: pets
            paths: {}
            "#,
        )
        .unwrap();

        assert_eq!(assembly.warnings.len(), 1);
        assert_eq!(assembly.warnings[0].path.to_string(), "#/tags/1");
    }

    #[test]
    fn test_extensions_preserved_at_every_level() {
        let assembly = assemble_yaml(
            r#"
            swagger: "2.0"
            x-origin: generator
            info:
              title: Petstore
              version: "1.0.0"
              x-audience: internal
            paths:
              /pets:
                x-cache: "60"
                get:
                  x-rate-limit: 100
                  responses:
                    "200":
                      description: OK
            "#,
        )
        .unwrap();

        let document = assembly.document;
        assert_eq!(document.extensions["x-origin"], "generator");
        assert_eq!(document.info.extensions["x-audience"], "internal");
        assert_eq!(document.paths["/pets"].extensions["x-cache"], "60");
        assert_eq!(
            document.paths["/pets"].get.as_ref().unwrap().extensions["x-rate-limit"],
            100
        );
    }

    #[test]
    fn test_lone_path_item_ref_is_unsupported() {
        let report = assemble_yaml(
            r#"
            swagger: "2.0"
            info:
              title: Petstore
              version: "1.0.0"
            paths:
              /pets:
                $ref: 'shared.yaml#/paths/pets'
            "#,
        )
        .unwrap_err();

        assert_eq!(report.len(), 1);
        assert_eq!(report.errors[0].kind, ErrorKind::UnsupportedReference);
        assert_eq!(
            report.errors[0].path.to_string(),
            "#/paths/~1pets/$ref"
        );
    }

    #[test]
    fn test_document_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Document>();
    }
}
