//! Reference resolution against a document's named sections.
//!
//! Only local pointers of the form `#/definitions|parameters|responses/<name>`
//! are supported; everything else is an unsupported reference. Resolution is
//! a second pass over an already-decoded document, so forward and mutual
//! references between named definitions work.

use std::collections::HashMap;

use indexmap::IndexMap;
use swagger_model::{
    AdditionalProperties, Document, Parameter, PathItem, RefOr, Reference, Response, Schema,
};

use crate::decode::Context;
use crate::errors::{ErrorKind, ValidationError};
use crate::pointer::{escape, unescape, Pointer};

/// The target of a supported local reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RefTarget {
    Definition(String),
    Parameter(String),
    Response(String),
}

impl RefTarget {
    /// Parses a reference of the supported forms; `None` for anything
    /// else: external locations, deep pointers, other sections.
    pub fn parse(reference: &str) -> Option<Self> {
        let pointer = reference.strip_prefix("#/")?;
        let (section, name) = pointer.split_once('/')?;
        if name.is_empty() || name.contains('/') {
            return None;
        }
        let name = unescape(name);
        match section {
            "definitions" => Some(Self::Definition(name)),
            "parameters" => Some(Self::Parameter(name)),
            "responses" => Some(Self::Response(name)),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Definition(name) | Self::Parameter(name) | Self::Response(name) => name,
        }
    }

    pub fn section(&self) -> &'static str {
        match self {
            Self::Definition(_) => "definitions",
            Self::Parameter(_) => "parameters",
            Self::Response(_) => "responses",
        }
    }
}

/// An entity a reference resolved to.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Schema(&'a Schema),
    Parameter(&'a Parameter),
    Response(&'a Response),
}

/// Resolves a reference against the document's named sections.
///
/// # Errors
///
/// Returns the structured error a validating pass would record at `at`.
pub fn resolve<'a>(
    document: &'a Document,
    reference: &Reference,
    at: &Pointer,
) -> Result<Resolved<'a>, ValidationError> {
    let target = RefTarget::parse(&reference.reference)
        .ok_or_else(|| unsupported(at, &reference.reference))?;

    match &target {
        RefTarget::Definition(name) => {
            follow_definition(document, name, at).map(Resolved::Schema)
        }
        RefTarget::Parameter(name) => document
            .parameters
            .get(name)
            .map(Resolved::Parameter)
            .ok_or_else(|| unresolved(at, &reference.reference)),
        RefTarget::Response(name) => document
            .responses
            .get(name)
            .map(Resolved::Response)
            .ok_or_else(|| unresolved(at, &reference.reference)),
    }
}

/// Typed lookup of named entities by reference string, following
/// definition alias chains.
pub trait DocumentExt {
    fn find_definition(&self, reference: &str) -> Option<&Schema>;
    fn find_parameter(&self, reference: &str) -> Option<&Parameter>;
    fn find_response(&self, reference: &str) -> Option<&Response>;
}

impl DocumentExt for Document {
    fn find_definition(&self, reference: &str) -> Option<&Schema> {
        match RefTarget::parse(reference)? {
            RefTarget::Definition(name) => {
                follow_definition(self, &name, &Pointer::root()).ok()
            }
            _ => None,
        }
    }

    fn find_parameter(&self, reference: &str) -> Option<&Parameter> {
        match RefTarget::parse(reference)? {
            RefTarget::Parameter(name) => self.parameters.get(&name),
            _ => None,
        }
    }

    fn find_response(&self, reference: &str) -> Option<&Response> {
        match RefTarget::parse(reference)? {
            RefTarget::Response(name) => self.responses.get(&name),
            _ => None,
        }
    }
}

/// Follows a named definition through alias entries (`A: {$ref: B}`)
/// until an inline schema is found.
fn follow_definition<'a>(
    document: &'a Document,
    name: &str,
    at: &Pointer,
) -> Result<&'a Schema, ValidationError> {
    let mut seen = vec![name.to_string()];
    let mut current = name.to_string();

    loop {
        match document.definitions.get(&current) {
            None => {
                return Err(unresolved(at, &format!("#/definitions/{}", escape(&current))))
            }
            Some(RefOr::Item(schema)) => return Ok(schema),
            Some(RefOr::Ref(reference)) => match RefTarget::parse(&reference.reference) {
                Some(RefTarget::Definition(next)) => {
                    if seen.contains(&next) {
                        seen.push(next);
                        return Err(ValidationError {
                            path: at.clone(),
                            kind: ErrorKind::CyclicReference,
                            message: format!("cycle: {}", format_chain(&seen)),
                        });
                    }
                    seen.push(next.clone());
                    current = next;
                }
                _ => return Err(unsupported(at, &reference.reference)),
            },
        }
    }
}

fn unsupported(at: &Pointer, reference: &str) -> ValidationError {
    ValidationError {
        path: at.clone(),
        kind: ErrorKind::UnsupportedReference,
        message: format!(
            "`{}` is not a supported local reference; expected \
             `#/definitions|parameters|responses/<name>`",
            reference
        ),
    }
}

fn unresolved(at: &Pointer, reference: &str) -> ValidationError {
    ValidationError {
        path: at.clone(),
        kind: ErrorKind::UnresolvedReference,
        message: format!("`{}` does not name an existing entity", reference),
    }
}

fn format_chain(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("#/definitions/{}", escape(name)))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// The whole-tree validation pass: every reference must parse, target the
/// section its position expects, and name an existing entity; the
/// definitions graph must be acyclic.
pub(crate) fn validate_references(document: &Document, cx: &mut Context) {
    for (name, entry) in &document.definitions {
        let at = Pointer::root().child("definitions").child(name);
        match entry {
            RefOr::Ref(reference) => check_schema_ref(document, cx, reference, &at),
            RefOr::Item(schema) => walk_schema(document, cx, schema, &at),
        }
    }

    for (name, parameter) in &document.parameters {
        let at = Pointer::root().child("parameters").child(name);
        walk_parameter(document, cx, parameter, &at);
    }

    for (name, response) in &document.responses {
        let at = Pointer::root().child("responses").child(name);
        walk_response(document, cx, response, &at);
    }

    for (template, item) in &document.paths {
        let at = Pointer::root().child("paths").child(template);
        walk_path_item(document, cx, item, &at);
    }

    detect_cycles(document, cx);

    tracing::trace!(
        "validated references over {} definition(s), {} named parameter(s), {} named response(s)",
        document.definitions.len(),
        document.parameters.len(),
        document.responses.len()
    );
}

fn check_schema_ref(document: &Document, cx: &mut Context, reference: &Reference, at: &Pointer) {
    match RefTarget::parse(&reference.reference) {
        Some(RefTarget::Definition(name)) => {
            if !document.definitions.contains_key(&name) {
                let err = unresolved(at, &reference.reference);
                cx.error(at, err.kind, err.message);
            }
        }
        Some(target) => cx.error(
            at,
            ErrorKind::UnsupportedReference,
            format!(
                "`{}` targets `{}` where a `#/definitions/<name>` reference is expected",
                reference, target.section()
            ),
        ),
        None => {
            let err = unsupported(at, &reference.reference);
            cx.error(at, err.kind, err.message);
        }
    }
}

fn check_named_ref(
    document: &Document,
    cx: &mut Context,
    reference: &Reference,
    at: &Pointer,
    expected: &'static str,
) {
    let exists = |target: &RefTarget| match target {
        RefTarget::Definition(name) => document.definitions.contains_key(name),
        RefTarget::Parameter(name) => document.parameters.contains_key(name),
        RefTarget::Response(name) => document.responses.contains_key(name),
    };

    match RefTarget::parse(&reference.reference) {
        Some(target) if target.section() == expected => {
            if !exists(&target) {
                let err = unresolved(at, &reference.reference);
                cx.error(at, err.kind, err.message);
            }
        }
        Some(target) => cx.error(
            at,
            ErrorKind::UnsupportedReference,
            format!(
                "`{}` targets `{}` where a `#/{}/<name>` reference is expected",
                reference,
                target.section(),
                expected
            ),
        ),
        None => {
            let err = unsupported(at, &reference.reference);
            cx.error(at, err.kind, err.message);
        }
    }
}

fn walk_schema_entry(
    document: &Document,
    cx: &mut Context,
    entry: &RefOr<Schema>,
    at: &Pointer,
) {
    match entry {
        RefOr::Ref(reference) => check_schema_ref(document, cx, reference, at),
        RefOr::Item(schema) => walk_schema(document, cx, schema, at),
    }
}

fn walk_schema(document: &Document, cx: &mut Context, schema: &Schema, at: &Pointer) {
    for (name, property) in &schema.properties {
        walk_schema_entry(document, cx, property, &at.child("properties").child(name));
    }
    if let Some(items) = &schema.items {
        walk_schema_entry(document, cx, items, &at.child("items"));
    }
    for (i, entry) in schema.all_of.iter().enumerate() {
        walk_schema_entry(document, cx, entry, &at.child("allOf").index(i));
    }
    if let Some(AdditionalProperties::Schema(extra)) = &schema.additional_properties {
        walk_schema_entry(document, cx, extra, &at.child("additionalProperties"));
    }
}

fn walk_parameter(document: &Document, cx: &mut Context, parameter: &Parameter, at: &Pointer) {
    if let Some(schema) = &parameter.schema {
        walk_schema_entry(document, cx, schema, &at.child("schema"));
    }
}

fn walk_response(document: &Document, cx: &mut Context, response: &Response, at: &Pointer) {
    if let Some(schema) = &response.schema {
        walk_schema_entry(document, cx, schema, &at.child("schema"));
    }
}

fn walk_path_item(document: &Document, cx: &mut Context, item: &PathItem, at: &Pointer) {
    if let Some(reference) = &item.ref_ {
        // When sibling fields are present they win (the decoder has
        // already warned); a lone reference cannot be honored at all.
        let empty = item.operations().next().is_none() && item.parameters.is_empty();
        if empty {
            cx.error(
                &at.child("$ref"),
                ErrorKind::UnsupportedReference,
                format!("path item references are not supported: `{}`", reference),
            );
        }
    }

    for (i, entry) in item.parameters.iter().enumerate() {
        walk_parameter_entry(document, cx, entry, &at.child("parameters").index(i));
    }

    for (method, operation) in item.operations() {
        let op_at = at.child(method.as_str());
        for (i, entry) in operation.parameters.iter().enumerate() {
            walk_parameter_entry(document, cx, entry, &op_at.child("parameters").index(i));
        }
        for (status, entry) in &operation.responses {
            let response_at = op_at.child("responses").child(status);
            match entry {
                RefOr::Ref(reference) => {
                    check_named_ref(document, cx, reference, &response_at, "responses");
                }
                RefOr::Item(response) => walk_response(document, cx, response, &response_at),
            }
        }
    }
}

fn walk_parameter_entry(
    document: &Document,
    cx: &mut Context,
    entry: &RefOr<Parameter>,
    at: &Pointer,
) {
    match entry {
        RefOr::Ref(reference) => check_named_ref(document, cx, reference, at, "parameters"),
        RefOr::Item(parameter) => walk_parameter(document, cx, parameter, at),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Depth-first search over the definitions graph; a back edge is a cycle.
/// Each cycle is reported once, from the first definition that reaches it.
fn detect_cycles(document: &Document, cx: &mut Context) {
    let graph: IndexMap<String, Vec<String>> = document
        .definitions
        .iter()
        .map(|(name, entry)| (name.clone(), definition_edges(entry)))
        .collect();

    let mut colors: HashMap<String, Color> =
        graph.keys().map(|name| (name.clone(), Color::White)).collect();
    let mut stack: Vec<String> = Vec::new();

    for name in graph.keys() {
        if colors[name] == Color::White {
            visit(name, &graph, &mut colors, &mut stack, cx);
        }
    }
}

fn visit(
    name: &str,
    graph: &IndexMap<String, Vec<String>>,
    colors: &mut HashMap<String, Color>,
    stack: &mut Vec<String>,
    cx: &mut Context,
) {
    colors.insert(name.to_string(), Color::Gray);
    stack.push(name.to_string());

    if let Some(edges) = graph.get(name) {
        for dep in edges {
            // Unknown names were already reported as unresolved.
            let color = match colors.get(dep) {
                Some(color) => *color,
                None => continue,
            };
            match color {
                Color::White => visit(dep, graph, colors, stack, cx),
                Color::Gray => {
                    let start = stack.iter().position(|n| n == dep).expect("on stack");
                    let mut chain = stack[start..].to_vec();
                    chain.push(dep.clone());
                    cx.error(
                        &Pointer::root().child("definitions").child(dep),
                        ErrorKind::CyclicReference,
                        format!("cycle: {}", format_chain(&chain)),
                    );
                }
                Color::Black => {}
            }
        }
    }

    stack.pop();
    colors.insert(name.to_string(), Color::Black);
}

fn definition_edges(entry: &RefOr<Schema>) -> Vec<String> {
    let mut edges = Vec::new();
    collect_schema_refs(entry, &mut edges);
    edges
}

fn collect_schema_refs(entry: &RefOr<Schema>, edges: &mut Vec<String>) {
    match entry {
        RefOr::Ref(reference) => {
            if let Some(RefTarget::Definition(name)) = RefTarget::parse(&reference.reference) {
                edges.push(name);
            }
        }
        RefOr::Item(schema) => {
            for property in schema.properties.values() {
                collect_schema_refs(property, edges);
            }
            if let Some(items) = &schema.items {
                collect_schema_refs(items, edges);
            }
            for entry in &schema.all_of {
                collect_schema_refs(entry, edges);
            }
            if let Some(AdditionalProperties::Schema(extra)) = &schema.additional_properties {
                collect_schema_refs(extra, edges);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_target_parse() {
        assert_eq!(
            RefTarget::parse("#/definitions/Pet"),
            Some(RefTarget::Definition("Pet".to_string()))
        );
        assert_eq!(
            RefTarget::parse("#/parameters/limitParam"),
            Some(RefTarget::Parameter("limitParam".to_string()))
        );
        assert_eq!(
            RefTarget::parse("#/responses/NotFound"),
            Some(RefTarget::Response("NotFound".to_string()))
        );
        assert_eq!(
            RefTarget::parse("#/definitions/a~1b"),
            Some(RefTarget::Definition("a/b".to_string()))
        );

        // External, deep and foreign-section pointers are unsupported.
        assert_eq!(RefTarget::parse("other.yaml#/definitions/Pet"), None);
        assert_eq!(RefTarget::parse("http://example.com/api.yaml#/definitions/Pet"), None);
        assert_eq!(RefTarget::parse("#/definitions/Pet/properties/name"), None);
        assert_eq!(RefTarget::parse("#/paths/~1pets"), None);
        assert_eq!(RefTarget::parse("#/definitions"), None);
        assert_eq!(RefTarget::parse("#/definitions/"), None);
    }

    fn document_with_definitions(entries: &[(&str, RefOr<Schema>)]) -> Document {
        let mut document = Document::default();
        for (name, entry) in entries {
            document
                .definitions
                .insert(name.to_string(), entry.clone());
        }
        document
    }

    fn ref_to(name: &str) -> RefOr<Schema> {
        Reference::new(format!("#/definitions/{}", name)).into()
    }

    fn schema_with_property(property: &str, target: &str) -> RefOr<Schema> {
        let mut schema = Schema::default();
        schema
            .properties
            .insert(property.to_string(), ref_to(target));
        RefOr::Item(schema)
    }

    #[test]
    fn test_resolve() {
        let document =
            document_with_definitions(&[("Pet", RefOr::Item(Schema::default()))]);

        let resolved = resolve(
            &document,
            &Reference::new("#/definitions/Pet"),
            &Pointer::root(),
        );
        assert!(matches!(resolved, Ok(Resolved::Schema(_))));

        let err = resolve(
            &document,
            &Reference::new("#/definitions/Missing"),
            &Pointer::root(),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnresolvedReference);

        let err = resolve(
            &document,
            &Reference::new("other.yaml#/definitions/Pet"),
            &Pointer::root(),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedReference);
    }

    #[test]
    fn test_alias_chain_resolves() {
        let document = document_with_definitions(&[
            ("Alias", ref_to("Pet")),
            ("Pet", RefOr::Item(Schema::default())),
        ]);

        assert!(document.find_definition("#/definitions/Alias").is_some());
    }

    #[test]
    fn test_alias_cycle_errors() {
        let document =
            document_with_definitions(&[("A", ref_to("B")), ("B", ref_to("A"))]);

        let err = resolve(
            &document,
            &Reference::new("#/definitions/A"),
            &Pointer::root(),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::CyclicReference);
    }

    #[test]
    fn test_mutual_cycle_reported_once() {
        let document = document_with_definitions(&[
            ("A", schema_with_property("b", "B")),
            ("B", schema_with_property("a", "A")),
        ]);

        let mut cx = Context::new();
        validate_references(&document, &mut cx);

        let cycles: Vec<_> = cx
            .errors
            .iter()
            .filter(|e| e.kind == ErrorKind::CyclicReference)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].message.contains("#/definitions/A"));
        assert!(cycles[0].message.contains("#/definitions/B"));
    }

    #[test]
    fn test_self_cycle_reported() {
        let document =
            document_with_definitions(&[("Node", schema_with_property("next", "Node"))]);

        let mut cx = Context::new();
        validate_references(&document, &mut cx);

        assert_eq!(cx.errors.len(), 1);
        assert_eq!(cx.errors[0].kind, ErrorKind::CyclicReference);
        assert_eq!(
            cx.errors[0].message,
            "cycle: #/definitions/Node -> #/definitions/Node"
        );
    }

    #[test]
    fn test_acyclic_forward_references_pass() {
        let document = document_with_definitions(&[
            ("Owner", schema_with_property("pet", "Pet")),
            ("Pet", RefOr::Item(Schema::default())),
        ]);

        let mut cx = Context::new();
        validate_references(&document, &mut cx);
        assert!(cx.errors.is_empty());
    }
}
