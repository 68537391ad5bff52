//! Data-access layer for the job board tables.
//!
//! Each model owns its table's column list, its [`NameMap`](crate::NameMap) and
//! its [`FilterColumns`](crate::FilterColumns), and exposes async CRUD functions
//! over any [`GenericClient`](crate::GenericClient). Request bodies and query
//! strings are validated here, before any SQL is built.

pub mod company;
pub mod job;

pub use company::{Company, CompanyFilter, CompanyPatch, NewCompany};
pub use job::{Job, JobFilter, JobPatch, NewJob};

use crate::error::{JoblyError, JoblyResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Deserialize a request body, turning shape/type mismatches into `InvalidInput`.
pub(crate) fn from_json<T: DeserializeOwned>(body: serde_json::Value) -> JoblyResult<T> {
    serde_json::from_value(body).map_err(|e| JoblyError::invalid_input(e.to_string()))
}

/// Distinguish "field absent" (`None`) from "field set to null" (`Some(None)`).
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

pub(crate) fn parse_query_int(key: &str, raw: &str) -> JoblyResult<i32> {
    raw.trim()
        .parse()
        .map_err(|_| JoblyError::invalid_input(format!("{key} must be an integer, got {raw:?}")))
}

pub(crate) fn parse_query_bool(key: &str, raw: &str) -> JoblyResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(JoblyError::invalid_input(format!(
            "{key} must be a boolean, got {raw:?}"
        ))),
    }
}

pub(crate) fn unknown_filter(key: &str) -> JoblyError {
    JoblyError::invalid_input(format!("unknown filter: {key}"))
}
