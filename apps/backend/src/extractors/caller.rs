use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::domain::UserId;
use crate::error::AppError;
use crate::errors::ErrorCode;

pub const USER_HEADER: &str = "x-user-id";

/// Caller identity as asserted by the identity provider in front of us.
/// Anonymous callers are allowed; their duels are never billed for images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller(pub Option<UserId>);

impl Caller {
    fn from_header(req: &HttpRequest) -> Result<Self, AppError> {
        let Some(raw) = req.headers().get(USER_HEADER) else {
            return Ok(Caller(None));
        };
        let value = raw.to_str().map_err(|_| {
            AppError::bad_request(ErrorCode::InvalidHeader, format!("{USER_HEADER} is not valid text"))
        })?;
        let value = value.trim();
        if value.is_empty() {
            return Err(AppError::bad_request(
                ErrorCode::InvalidHeader,
                format!("{USER_HEADER} must not be empty"),
            ));
        }
        Ok(Caller(Some(UserId::new(value))))
    }
}

impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::from_header(req))
    }
}
