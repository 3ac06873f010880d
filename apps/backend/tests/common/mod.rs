#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::test;

#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

/// Consume `resp` and check it against the problem-details contract.
pub async fn assert_problem<B: MessageBody>(
    resp: ServiceResponse<B>,
    expected_status: StatusCode,
    expected_code: &str,
    detail_contains: Option<&str>,
) {
    let status = resp.status();
    let headers = resp.headers().clone();
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = test::read_body(resp).await;

    assert_eq!(content_type, "application/problem+json");
    backend_test_support::problem_details::assert_problem_details_from_parts(
        status,
        &headers,
        &body,
        expected_code,
        expected_status,
        detail_contains,
    );
}
