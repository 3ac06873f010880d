//! JSON column encoding for typed domain values.

use sea_orm::prelude::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::domain::{DomainError, InfraErrorKind};

pub fn encode<T: Serialize>(value: &T) -> Result<Json, DomainError> {
    serde_json::to_value(value).map_err(|e| {
        DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!("failed to encode column: {e}"),
        )
    })
}

pub fn decode<T: DeserializeOwned>(column: &'static str, value: Json) -> Result<T, DomainError> {
    serde_json::from_value(value).map_err(|e| {
        DomainError::infra(
            InfraErrorKind::DataCorruption,
            format!("column {column} holds malformed JSON: {e}"),
        )
    })
}

pub fn decode_opt<T: DeserializeOwned>(
    column: &'static str,
    value: Option<Json>,
) -> Result<Option<T>, DomainError> {
    value.map(|v| decode(column, v)).transpose()
}
