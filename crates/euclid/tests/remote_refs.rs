//! Remote references served over HTTP by the schema server.

use std::path::PathBuf;

use euclid::core::SchemaResolutionError;
use euclid::prelude::*;
use euclid_test::{SchemaServer, TestClient};
use http::StatusCode;
use serde_json::json;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn options(remote_base: Url) -> FactoryOptions {
    FactoryOptions::default().with_resolver(ResolverOptions {
        remote_base: Some(remote_base),
        ..ResolverOptions::default()
    })
}

async fn echo(ctx: RequestContext) -> Result<Response, HandlerError> {
    Ok(response::json(StatusCode::OK, &json!({"body": ctx.body()})))
}

async fn client(server: &SchemaServer) -> TestClient {
    let base = server.base_url().unwrap();
    let mut factory = RouterFactory::from_file(fixtures().join("api.yaml"), options(base))
        .await
        .unwrap();
    factory
        .add_handler_by_operation_id("createAddress", echo)
        .unwrap()
        .add_handler_by_operation_id("addContact", echo)
        .unwrap();
    TestClient::new(factory.get_router().unwrap())
}

#[tokio::test]
async fn remote_documents_are_fetched_once() {
    let mut server = SchemaServer::new(fixtures());
    server.start().await.unwrap();
    let client = client(&server).await;

    // address.json serves both Address and Phone; countries.yaml is
    // referenced from inside address.json.
    assert_eq!(server.files_served(), 2);

    client
        .post("/addresses")
        .json(&json!({"street": "Rue de Rivoli", "country": "FR"}))
        .send()
        .await
        .assert_status(StatusCode::OK);

    server.stop().await;
}

#[tokio::test]
async fn local_refs_inside_remote_documents_use_that_document() {
    let mut server = SchemaServer::new(fixtures());
    server.start().await.unwrap();
    let client = client(&server).await;

    let (kind, path, _) = client
        .post("/addresses")
        .json(&json!({"street": "R"}))
        .send()
        .await
        .validation_error()
        .unwrap();
    assert_eq!((kind.as_str(), path.as_str()), ("length", "$.street"));

    let (kind, path, _) = client
        .post("/addresses")
        .json(&json!({"street": "Rue de Rivoli", "zip": "7500"}))
        .send()
        .await
        .validation_error()
        .unwrap();
    assert_eq!((kind.as_str(), path.as_str()), ("pattern", "$.zip"));

    let (kind, path, _) = client
        .post("/addresses")
        .json(&json!({"street": "Rue de Rivoli", "country": "ES"}))
        .send()
        .await
        .validation_error()
        .unwrap();
    assert_eq!((kind.as_str(), path.as_str()), ("enum", "$.country"));

    server.stop().await;
}

#[tokio::test]
async fn any_of_mixes_local_and_remote_alternatives() {
    let mut server = SchemaServer::new(fixtures());
    server.start().await.unwrap();
    let client = client(&server).await;

    for contact in ["ada@example.org", "+4930123456"] {
        client
            .post("/contacts")
            .json(&json!(contact))
            .send()
            .await
            .assert_status(StatusCode::OK);
    }

    let response = client.post("/contacts").json(&json!("call me")).send().await;
    let (kind, path, _) = response.validation_error().unwrap();
    assert_eq!((kind.as_str(), path.as_str()), ("no_match", "$"));

    server.stop().await;
}

#[tokio::test]
async fn stopped_server_fails_the_build() {
    let mut server = SchemaServer::new(fixtures());
    let base = server.start().await.unwrap();
    server.stop().await;

    let err = RouterFactory::from_file(fixtures().join("api.yaml"), options(base))
        .await
        .unwrap_err();
    assert!(
        matches!(
            &err,
            BuildError::SchemaResolution(SchemaResolutionError::Unreachable { reference, .. })
                if reference.starts_with("remote/address.json")
        ),
        "{err:?}"
    );
}

#[tokio::test]
async fn missing_remote_fragment_is_unresolvable() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("shapes.json"), r#"{"Circle": {"type": "object"}}"#).unwrap();
    let mut server = SchemaServer::new(dir.path());
    let base = server.start().await.unwrap();

    let spec = r"
openapi: 3.0.3
paths:
  /squares:
    post:
      operationId: createSquare
      requestBody:
        content:
          application/json:
            schema:
              $ref: 'shapes.json#/Square'
";
    let err = RouterFactory::from_str(spec, options(base)).await.unwrap_err();
    assert!(
        matches!(&err, BuildError::SchemaResolution(SchemaResolutionError::Unresolvable { .. })),
        "{err:?}"
    );
    assert_eq!(server.files_served(), 1);
    server.stop().await;
}
