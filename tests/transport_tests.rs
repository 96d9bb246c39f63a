//! Tests for rendering dispatch outcomes at the HTTP and RPC boundaries

mod common;

use common::{dispatcher, sum_registry, Missing, Sum};
use cqs_dispatch::context::Context;
use cqs_dispatch::ids::{RequestId, CORRELATION_ID_HEADER, REQUEST_ID_HEADER};
use cqs_dispatch::result::{Error, ErrorCode, Outcome};
use cqs_dispatch::transport::http::{status_for_code, status_for_code_name, HttpReply};
use cqs_dispatch::transport::rpc::{code_from_rpc, rpc_code, rpc_code_for_name, to_status};
use serde::Serialize;
use serde_json::json;
use tonic::Code;

#[test]
fn test_http_mapping_is_total() {
    for code in ErrorCode::ALL {
        let expected = match code {
            ErrorCode::InvalidArgument => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::Aborted => 412,
            ErrorCode::Unauthenticated => 401,
            ErrorCode::PermissionDenied => 403,
            _ => 500,
        };
        assert_eq!(status_for_code(code).as_u16(), expected, "{code}");
        assert_eq!(status_for_code_name(code.as_str()).as_u16(), expected);
    }
    assert_eq!(status_for_code_name("Teapot").as_u16(), 500);
}

#[test]
fn test_rpc_mapping_round_trips_names() {
    for code in ErrorCode::ALL {
        assert_eq!(rpc_code_for_name(code.as_str()), rpc_code(code));
        assert_eq!(code_from_rpc(rpc_code(code)), code);
    }
    assert_eq!(rpc_code_for_name("Teapot"), Code::Unknown);
    assert_eq!(code_from_rpc(Code::Unknown), ErrorCode::Internal);
    assert_eq!(code_from_rpc(Code::Ok), ErrorCode::Internal);
}

#[test]
fn test_reply_carries_request_identifiers() {
    let request_id = RequestId::from_header_or_new(None);
    let ctx = Context::background()
        .with_request_id(request_id.clone())
        .with_correlation_id("corr-1");
    let d = dispatcher(sum_registry());

    let outcome = d.dispatch_request(&ctx, Missing);
    let mut reply = HttpReply::from_outcome(&outcome);
    reply.set_header(REQUEST_ID_HEADER, request_id.clone());
    reply.set_header(CORRELATION_ID_HEADER, "corr-1".to_string());

    assert_eq!(reply.status.as_u16(), 500);
    assert_eq!(reply.get_header("request-id"), Some(request_id.as_str()));
    assert_eq!(reply.get_header("CORRELATION-ID"), Some("corr-1"));
    assert_eq!(reply.get_header("content-type"), Some("application/json"));
}

#[test]
fn test_success_body_is_serialized_value() {
    #[derive(Serialize)]
    struct Total {
        total: i64,
    }

    let d = dispatcher(sum_registry());
    let outcome = d
        .dispatch_request(&Context::background(), Sum { a: 40, b: 2 })
        .map(|total| Total { total });
    let reply = HttpReply::from_outcome(&outcome);
    assert_eq!(reply.status.as_u16(), 200);
    assert_eq!(reply.body, json!({ "total": 42 }));
    assert_eq!(
        serde_json::to_value(&reply).unwrap(),
        json!({ "status": 200, "body": { "total": 42 } })
    );
}

#[test]
fn test_failure_renders_error_body_and_status() {
    let outcome: Outcome<()> = Outcome::fail(ErrorCode::NotFound, "pet 7 does not exist");
    let reply = HttpReply::from_outcome(&outcome);
    assert_eq!(reply.status.as_u16(), 404);
    assert_eq!(
        reply.body,
        json!({ "code": "NotFound", "message": "pet 7 does not exist" })
    );

    let status = to_status(outcome.error().unwrap());
    assert_eq!(status.code(), Code::NotFound);
    assert_eq!(status.message(), "pet 7 does not exist");
    assert_eq!(
        Error::from(status),
        Error::new(ErrorCode::NotFound, "pet 7 does not exist")
    );
}
