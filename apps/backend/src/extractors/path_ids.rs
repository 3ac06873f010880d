//! Typed path parameters, rejected with 400 before any handler runs.

use std::future::{ready, Ready};
use std::str::FromStr;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::error::AppError;
use crate::errors::ErrorCode;

fn path_param<T: FromStr>(req: &HttpRequest, name: &str, code: ErrorCode) -> Result<T, AppError> {
    let raw = req
        .match_info()
        .get(name)
        .ok_or_else(|| AppError::bad_request(code, format!("Missing {name} parameter")))?;
    raw.parse::<T>()
        .map_err(|_| AppError::bad_request(code, format!("Invalid {name}: {raw}")))
}

fn positive_id(req: &HttpRequest, name: &str, code: ErrorCode) -> Result<i64, AppError> {
    let id: i64 = path_param(req, name, code)?;
    if id <= 0 {
        return Err(AppError::bad_request(
            code,
            format!("{name} must be positive, got: {id}"),
        ));
    }
    Ok(id)
}

/// `{duel_id}` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuelId(pub i64);

impl FromRequest for DuelId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(positive_id(req, "duel_id", ErrorCode::InvalidDuelId).map(DuelId))
    }
}

/// `{round_id}` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundId(pub i64);

impl FromRequest for RoundId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(positive_id(req, "round_id", ErrorCode::InvalidRoundId).map(RoundId))
    }
}

/// `{round_number}` path segment; zero is the introduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundNumber(pub u32);

impl FromRequest for RoundNumber {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(path_param(req, "round_number", ErrorCode::InvalidRoundId).map(RoundNumber))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn parses_positive_ids() {
        let req = TestRequest::default()
            .param("duel_id", "42")
            .to_http_request();
        assert_eq!(positive_id(&req, "duel_id", ErrorCode::InvalidDuelId).unwrap(), 42);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        for raw in ["0", "-3", "abc"] {
            let req = TestRequest::default()
                .param("duel_id", raw)
                .to_http_request();
            let err = positive_id(&req, "duel_id", ErrorCode::InvalidDuelId).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidDuelId);
        }
    }

    #[test]
    fn round_number_allows_introduction() {
        let req = TestRequest::default()
            .param("round_number", "0")
            .to_http_request();
        let n: u32 = path_param(&req, "round_number", ErrorCode::InvalidRoundId).unwrap();
        assert_eq!(n, 0);
    }
}
