use pretty_assertions::assert_eq;
use swagger_loader::model::{DataType, ParameterLocation, RefOr};
use swagger_loader::{assemble, DocumentExt, ErrorKind};

fn load(name: &str) -> serde_json::Value {
    // Tests are always run from the crate's root.
    let path = format!("../../tests/swagger/{}", name);
    let contents = std::fs::read_to_string(path).unwrap();
    serde_yaml::from_str(&contents).unwrap()
}

#[test]
fn test_petstore_assembles_cleanly() {
    let assembly = assemble(&load("petstore.yaml")).unwrap();
    let document = &assembly.document;

    assert!(assembly.warnings.is_empty());
    assert_eq!(document.swagger, "2.0");
    assert_eq!(document.info.title, "Swagger Petstore");
    assert_eq!(document.info.version, "1.0.0");
    assert_eq!(document.host.as_deref(), Some("petstore.swagger.io"));
    assert_eq!(document.base_path.as_deref(), Some("/v2"));
    assert_eq!(document.paths.len(), 3);
    assert_eq!(document.definitions.len(), 3);
    assert_eq!(document.tags.len(), 1);

    // The referenced parameter is reachable through the named section.
    let limit = document.find_parameter("#/parameters/limitParam").unwrap();
    assert_eq!(limit.name, "limit");
    assert_eq!(limit.location, ParameterLocation::Query);
    assert_eq!(limit.type_, Some(DataType::Integer));
    assert_eq!(limit.constraints.maximum, Some(100.0));

    // The pet definition is reachable through a schema reference.
    let pet = document.find_definition("#/definitions/Pet").unwrap();
    assert_eq!(pet.required, ["id", "name"]);
    assert_eq!(pet.properties.len(), 3);

    // The upload operation keeps its file parameter.
    let photo = &document.paths["/pets/{petId}/photo"];
    let upload = photo.post.as_ref().unwrap();
    let file_param = upload
        .parameters
        .iter()
        .filter_map(RefOr::as_item)
        .find(|p| p.name == "photo")
        .unwrap();
    assert_eq!(file_param.type_, Some(DataType::File));
    assert_eq!(file_param.location, ParameterLocation::FormData);

    // Root-level extensions survive verbatim.
    assert_eq!(document.extensions["x-generated-by"], "swagger-loader tests");
}

#[test]
fn test_petstore_serializes_with_swagger_field_names() {
    let assembly = assemble(&load("petstore.yaml")).unwrap();
    let value = serde_json::to_value(&assembly.document).unwrap();

    assert_eq!(value["swagger"], "2.0");
    assert_eq!(value["info"]["title"], "Swagger Petstore");
    assert_eq!(value["basePath"], "/v2");
    assert_eq!(
        value["paths"]["/pets"]["get"]["parameters"][0]["$ref"],
        "#/parameters/limitParam"
    );
    assert_eq!(
        value["paths"]["/pets"]["get"]["parameters"][1]["collectionFormat"],
        "multi"
    );
    assert_eq!(
        value["parameters"]["limitParam"]["in"],
        "query"
    );
}

#[test]
fn test_broken_document_reports_every_defect() {
    let report = assemble(&load("broken.yaml")).unwrap_err();

    let kinds: Vec<_> = report.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        [
            ErrorKind::MissingRequiredField,  // info.version
            ErrorKind::ConflictingFields,     // `q` has neither schema nor type
            ErrorKind::DuplicateParameter,    // `id` in query, twice
            ErrorKind::InvalidEnumValue,      // status key "600"
            ErrorKind::UnresolvedReference,   // #/definitions/Missing
            ErrorKind::CyclicReference,       // Loop -> Loop
        ]
    );

    let duplicate = report
        .of_kind(ErrorKind::DuplicateParameter)
        .next()
        .unwrap();
    assert_eq!(
        duplicate.path.to_string(),
        "#/paths/~1things/get/parameters/2"
    );
    assert!(duplicate
        .message
        .contains("#/paths/~1things/get/parameters/1"));

    let cycle = report.of_kind(ErrorKind::CyclicReference).next().unwrap();
    assert_eq!(
        cycle.message,
        "cycle: #/definitions/Loop -> #/definitions/Loop"
    );
}
