//! Request pipeline tests: routing, validation, handler and failure paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use euclid_core::{
    response, Failure, HandlerError, Request, RequestContext, RequestState, Response,
};
use euclid_factory::{FactoryOptions, RouterFactory};
use http::{Method, StatusCode};
use http_body_util::Full;
use serde_json::{json, Value};

const SPEC: &str = r#"
openapi: 3.0.3
info:
  title: Petstore
  version: "1.0"
paths:
  /pets:
    get:
      operationId: listPets
      parameters:
        - name: limit
          in: query
          schema: { type: integer, minimum: 1, maximum: 100 }
        - name: tags
          in: query
          schema:
            type: array
            items: { type: string }
    post:
      operationId: createPet
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/NewPet'
  /pets/{petId}:
    parameters:
      - name: petId
        in: path
        required: true
        schema: { type: string }
    get:
      operationId: showPetById
      parameters:
        - name: X-Trace
          in: header
          required: true
          schema: { type: string }
    delete:
      operationId: deletePet
components:
  schemas:
    NewPet:
      type: object
      required: [name, age]
      properties:
        name: { type: string }
        age: { type: integer, minimum: 0 }
"#;

fn request(method: Method, uri: &str, body: Option<Value>) -> Request {
    let mut builder = http::Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Bytes::from(value.to_string())
        }
        None => Bytes::new(),
    };
    builder.body(Full::new(body)).unwrap()
}

async fn json_body(response: Response) -> Value {
    serde_json::from_str(&response::body_string(response).await).unwrap()
}

async fn echo(ctx: RequestContext) -> Result<Response, HandlerError> {
    Ok(response::json(
        StatusCode::OK,
        &json!({
            "operation": ctx.operation_id(),
            "pet": ctx.param("petId"),
            "limit": ctx.query("limit"),
            "body": ctx.body(),
        }),
    ))
}

async fn factory() -> RouterFactory {
    let mut factory = RouterFactory::from_str(SPEC, FactoryOptions::default())
        .await
        .unwrap();
    factory
        .add_handler_by_operation_id("listPets", echo)
        .unwrap()
        .add_handler_by_operation_id("createPet", echo)
        .unwrap()
        .add_handler_by_operation_id("showPetById", echo)
        .unwrap();
    factory
}

#[tokio::test]
async fn valid_request_reaches_handler() {
    let router = factory().await.get_router().unwrap();
    let dispatch = router
        .handle_with_outcome(request(
            Method::POST,
            "/pets",
            Some(json!({"name": "Alice", "age": 30})),
        ))
        .await;

    assert_eq!(dispatch.response.status(), StatusCode::OK);
    assert_eq!(dispatch.operation_id.as_deref(), Some("createPet"));
    assert_eq!(
        dispatch.lifecycle.trail(),
        &[
            RequestState::Received,
            RequestState::Matched,
            RequestState::Validating,
            RequestState::Valid,
            RequestState::Dispatched,
        ]
    );
    let body = json_body(dispatch.response).await;
    assert_eq!(body["body"]["name"], "Alice");
}

#[tokio::test]
async fn invalid_body_gets_default_400() {
    let router = factory().await.get_router().unwrap();

    let dispatch = router
        .handle_with_outcome(request(Method::POST, "/pets", Some(json!({"name": "Alice"}))))
        .await;
    assert_eq!(dispatch.response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(dispatch.lifecycle.state(), RequestState::FailureHandled);
    let body = json_body(dispatch.response).await;
    assert_eq!(body["kind"], "ValidationException");
    assert_eq!(body["errorType"], "missing_required");
    assert_eq!(body["path"], "$.age");

    let response = router
        .handle(request(
            Method::POST,
            "/pets",
            Some(json!({"name": "Alice", "age": -1})),
        ))
        .await;
    let body = json_body(response).await;
    assert_eq!(body["errorType"], "bound");
    assert_eq!(body["path"], "$.age");
}

#[tokio::test]
async fn missing_body_and_bad_json() {
    let router = factory().await.get_router().unwrap();

    let body = json_body(router.handle(request(Method::POST, "/pets", None)).await).await;
    assert_eq!(body["errorType"], "missing_body");

    let bad = http::Request::builder()
        .method(Method::POST)
        .uri("/pets")
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from_static(b"{\"name\":")))
        .unwrap();
    let body = json_body(router.handle(bad).await).await;
    assert_eq!(body["errorType"], "body_parse");
}

#[tokio::test]
async fn parameters_are_coerced_and_checked() {
    let router = factory().await.get_router().unwrap();

    let response = router
        .handle(request(Method::GET, "/pets?limit=10&tags=a&tags=b", None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["limit"], "10");

    let response = router
        .handle(request(Method::GET, "/pets?limit=500", None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["path"], "query.limit");

    let response = router
        .handle(request(Method::GET, "/pets?limit=seven", None))
        .await;
    let body = json_body(response).await;
    assert_eq!(body["errorType"], "parameter");
    assert_eq!(body["message"], "expected integer, got 'seven'");
}

#[tokio::test]
async fn path_and_header_parameters() {
    let router = factory().await.get_router().unwrap();

    let response = router
        .handle(request(Method::GET, "/pets/fluffy%20one", None))
        .await;
    let body = json_body(response).await;
    assert_eq!(body["path"], "header.X-Trace");

    let with_header = http::Request::builder()
        .uri("/pets/fluffy%20one")
        .header("X-Trace", "abc")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = router.handle(with_header).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["pet"], "fluffy one");
}

#[tokio::test]
async fn unmatched_requests() {
    let router = factory().await.get_router().unwrap();

    let dispatch = router
        .handle_with_outcome(request(Method::GET, "/owners", None))
        .await;
    assert_eq!(dispatch.response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        dispatch.lifecycle.trail(),
        &[RequestState::Received, RequestState::Unmatched]
    );
    assert!(dispatch.operation_id.is_none());

    let dispatch = router
        .handle_with_outcome(request(Method::PATCH, "/pets", None))
        .await;
    assert_eq!(dispatch.response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(dispatch.lifecycle.state(), RequestState::Unmatched);
    assert_eq!(dispatch.response.headers()["allow"], "GET, POST");
}

#[tokio::test]
async fn handler_less_operation_depends_on_mount_policy() {
    let mut factory = factory().await;
    let router = factory.get_router().unwrap();
    let response = router.handle(request(Method::DELETE, "/pets/1", None)).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    factory.mount_operations_without_handlers(true);
    let router = factory.get_router().unwrap();
    let dispatch = router
        .handle_with_outcome(request(Method::DELETE, "/pets/1", None))
        .await;
    assert_eq!(dispatch.response.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(dispatch.lifecycle.state(), RequestState::Dispatched);
    let body = json_body(dispatch.response).await;
    assert_eq!(body["error"]["code"], "NOT_IMPLEMENTED");
}

#[tokio::test]
async fn failure_handler_sees_both_kinds_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut factory = factory().await;
    factory
        .add_handler_by_operation_id("deletePet", |_ctx: RequestContext| async {
            Err::<Response, _>(HandlerError::internal("store unavailable"))
        })
        .unwrap();

    let seen = Arc::clone(&calls);
    factory
        .enable_validation_failure_handler(true)
        .set_validation_failure_handler(move |ctx| {
            seen.fetch_add(1, Ordering::SeqCst);
            match ctx.failure {
                Failure::Validation(err) => {
                    response::text(StatusCode::BAD_REQUEST, format!("invalid at {}", err.path()))
                }
                Failure::Handler(err) => response::text(err.status_code(), "handler failed"),
            }
        });
    let router = factory.get_router().unwrap();

    let response = router
        .handle(request(Method::POST, "/pets", Some(json!({"age": 1}))))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response::body_string(response).await, "invalid at $.name");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let dispatch = router
        .handle_with_outcome(request(Method::DELETE, "/pets/9", None))
        .await;
    assert_eq!(dispatch.response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(dispatch.lifecycle.state(), RequestState::Dispatched);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failure_handler_ignored_when_disabled() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut factory = factory().await;
    let seen = Arc::clone(&calls);
    factory.set_validation_failure_handler(move |_ctx| {
        seen.fetch_add(1, Ordering::SeqCst);
        response::empty(StatusCode::IM_A_TEAPOT)
    });
    let router = factory.get_router().unwrap();

    let response = router.handle(request(Method::POST, "/pets", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn handler_error_default_response() {
    let mut factory = factory().await;
    factory
        .add_handler_by_operation_id("deletePet", |_ctx: RequestContext| async {
            Err::<Response, _>(HandlerError::failed(StatusCode::CONFLICT, "pet is adopted"))
        })
        .unwrap();
    let router = factory.get_router().unwrap();

    let response = router.handle(request(Method::DELETE, "/pets/3", None)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"]["message"], "pet is adopted");
}

#[tokio::test]
async fn concurrent_requests_share_one_router() {
    let router = factory().await.get_router().unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let router = router.clone();
            tokio::spawn(async move {
                let age = if i % 4 == 0 { -1 } else { i };
                router
                    .handle(request(
                        Method::POST,
                        "/pets",
                        Some(json!({"name": format!("pet-{i}"), "age": age})),
                    ))
                    .await
                    .status()
            })
        })
        .collect();

    let mut ok = 0;
    let mut rejected = 0;
    for task in tasks {
        match task.await.unwrap() {
            StatusCode::OK => ok += 1,
            StatusCode::BAD_REQUEST => rejected += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!((ok, rejected), (12, 4));
}
