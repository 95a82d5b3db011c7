//! End to end: environment map in, wire bytes out.

use ricochet::dispatch::{DispatcherRegistry, RequestDispatcher, Weight, dispatch_fn};
use ricochet::http::headers::FieldName;
use ricochet::http::request::Env;
use ricochet::{Request, Response, Status};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("trace")
        .try_init();
}

fn pipeline() -> RequestDispatcher {
    let mut registry = DispatcherRegistry::new();
    registry.add(
        "articles",
        dispatch_fn(|request| {
            if request.path() != "/articles" {
                return Ok(None);
            }
            let page = request.param("page").unwrap_or("1").to_owned();
            Ok(Some(Response::new(
                format!("articles, page {page}"),
                Status::OK,
            )))
        }),
        Weight::default(),
    );
    registry.add(
        "health",
        dispatch_fn(|request| {
            Ok((request.path() == "/health").then(|| Response::new("ok", Status::OK)))
        }),
        Weight::Top,
    );
    RequestDispatcher::new(registry)
}

#[test]
fn transport_env_to_wire_bytes() {
    init_tracing();
    let env: Env = [
        ("REQUEST_METHOD", "GET"),
        ("REQUEST_URI", "/articles?page=3"),
        ("QUERY_STRING", "page=3"),
        ("REMOTE_ADDR", "127.0.0.1"),
        ("HTTP_USER_AGENT", "integration/1.0"),
    ]
    .into_iter()
    .collect();
    let request = Request::from_env(env);
    assert!(request.is_local());

    let response = pipeline().respond(&request).unwrap();
    assert_eq!(response.status, Status::OK);

    let mut wire = Vec::new();
    response.send(&mut wire).unwrap();
    let wire = String::from_utf8(wire).unwrap();
    assert!(wire.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(wire.contains("Content-Length: 16\r\n"));
    assert!(wire.ends_with("\r\n\r\narticles, page 3"));
}

#[test]
fn unroutable_request_surfaces_not_found() {
    init_tracing();
    let request = Request::from_uri("/missing");
    let error = pipeline().respond(&request).unwrap_err();
    assert!(error.is::<ricochet::http::error::NotFound>());
}

#[test]
fn rescue_hook_turns_failures_into_responses() {
    init_tracing();
    let mut pipeline = pipeline();
    pipeline.on_rescue(|_, _, slot| {
        let mut response = Response::new("it broke, gracefully", Status::INTERNAL_SERVER_ERROR);
        response.headers.set(FieldName::ContentType, "text/plain");
        slot.set(response);
    });

    let response = pipeline.respond(&Request::from_uri("/missing")).unwrap();
    assert_eq!(response.status, Status::INTERNAL_SERVER_ERROR);
}
