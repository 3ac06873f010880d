//! Problem Details assertions for HTTP tests.
//!
//! Deliberately independent of backend types so the error contract is checked
//! from the outside.

use actix_web::http::header::HeaderMap;
use actix_web::http::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ProblemDetailsLike {
    #[serde(rename = "type")]
    type_: String,
    title: String,
    status: u16,
    detail: String,
    code: String,
    trace_id: String,
}

/// Assert that response parts conform to the error contract:
/// status, `application/problem+json` body, stable code, and a trace id
/// that matches the `x-trace-id` header.
pub fn assert_problem_details_from_parts(
    status: StatusCode,
    headers: &HeaderMap,
    body_bytes: &[u8],
    expected_code: &str,
    expected_status: StatusCode,
    expected_detail_contains: Option<&str>,
) {
    assert_eq!(status, expected_status);

    let body_str = std::str::from_utf8(body_bytes).expect("body should be valid UTF-8");
    let problem: ProblemDetailsLike = serde_json::from_str(body_str)
        .unwrap_or_else(|_| panic!("body should be ProblemDetails JSON, got: {body_str}"));

    let trace_id_header = headers
        .get("x-trace-id")
        .expect("x-trace-id header should be present")
        .to_str()
        .expect("x-trace-id header should be valid UTF-8");

    assert_eq!(problem.trace_id, trace_id_header);
    assert_eq!(problem.code, expected_code);
    assert_eq!(problem.status, expected_status.as_u16());
    assert!(!problem.title.is_empty());
    assert!(
        problem.type_.ends_with(expected_code),
        "type `{}` should end with the code",
        problem.type_
    );

    if let Some(fragment) = expected_detail_contains {
        assert!(
            problem.detail.contains(fragment),
            "detail `{}` should contain `{fragment}`",
            problem.detail
        );
    }
}
