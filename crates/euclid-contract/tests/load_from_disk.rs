//! Loading specifications whose schemas live in sibling files.

use std::fs;

use euclid_contract::Specification;
use euclid_core::{SchemaResolutionError, SpecLoadError};
use euclid_schema::{ResolverOptions, SchemaResolver};
use serde_json::json;

const API: &str = r"
openapi: 3.0.3
info:
  title: Shelter
  version: '1.0'
paths:
  /pets:
    post:
      operationId: createPet
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: 'schemas/pet.yaml#/Pet'
";

const PET: &str = r"
Pet:
  type: object
  required: [name]
  properties:
    name:
      type: string
    owner:
      $ref: '#/Owner'
Owner:
  type: object
  properties:
    email:
      type: string
      format: email
";

#[tokio::test]
async fn test_relative_schema_files_resolve() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("schemas")).unwrap();
    fs::write(dir.path().join("schemas/pet.yaml"), PET).unwrap();
    let api = dir.path().join("api.yaml");
    fs::write(&api, API).unwrap();

    let spec = Specification::from_file(&api).await.unwrap();
    assert_eq!(spec.title(), Some("Shelter"));

    let resolved = spec
        .resolve_schemas(&SchemaResolver::new(ResolverOptions::default()))
        .await
        .unwrap();
    let body = resolved.operations[0].body.unwrap();

    assert!(resolved
        .schemas
        .validate(body, &json!({"name": "Rex", "owner": {"email": "a@b.org"}}))
        .is_ok());
    let err = resolved
        .schemas
        .validate(body, &json!({"name": "Rex", "owner": {"email": "nope"}}))
        .unwrap_err();
    assert_eq!(err.path(), "$.owner.email");
}

#[tokio::test]
async fn test_missing_schema_file_fails_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let api = dir.path().join("api.yaml");
    fs::write(&api, API).unwrap();

    let spec = Specification::from_file(&api).await.unwrap();
    let err = spec
        .resolve_schemas(&SchemaResolver::new(ResolverOptions::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaResolutionError::Unreachable { .. }), "{err:?}");
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Specification::from_file(dir.path().join("absent.yaml"))
        .await
        .unwrap_err();
    assert!(matches!(err, SpecLoadError::Io { .. }));
}

#[tokio::test]
async fn test_garbage_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let api = dir.path().join("api.yaml");
    fs::write(&api, "openapi: [3.0\n  broken").unwrap();
    let err = Specification::from_file(&api).await.unwrap_err();
    assert!(matches!(err, SpecLoadError::Parse { .. }), "{err:?}");
}
