// NOTE:
// All timestamps with the `_at` postfix are stored
// as unix timestamp in **milli**seconds.
//
// Every repository is implemented once for `DbConnection<C>`
// and thereby available for pooled connections as well as
// for running transactions.

use std::{fmt, ops::DerefMut, str::FromStr};

use anyhow::anyhow;
use diesel::{
    self,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};

use adorable_core::{
    entities::*,
    repositories::{self as repo, *},
};

use super::*;

mod activity;
mod chat;
mod file;
mod job;
mod location;
mod notification;
mod place;
mod review;
mod social;
mod user;

type Result<T> = std::result::Result<T, repo::Error>;

pub fn from_diesel_err(err: DieselError) -> repo::Error {
    match err {
        DieselError::NotFound => repo::Error::NotFound,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            repo::Error::AlreadyExists
        }
        _ => repo::Error::Other(err.into()),
    }
}

/// Updates and deletes that did not hit any row
/// refer to a missing object.
fn expect_affected(count: usize) -> Result<()> {
    if count == 0 {
        return Err(repo::Error::NotFound);
    }
    Ok(())
}

fn parse_enum<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|err| anyhow!("Invalid value '{value}': {err}").into())
}

fn load_pos(lat: Option<f64>, lng: Option<f64>) -> Result<Option<MapPoint>> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok(Some(
            MapPoint::try_from_lat_lng(lat, lng).map_err(anyhow::Error::from)?,
        )),
        _ => Ok(None),
    }
}

fn ids_to_strings(ids: &[Id]) -> Vec<&str> {
    ids.iter().map(Id::as_str).collect()
}

/// SQLite `LIKE` pattern for a case-insensitive substring match
/// (ASCII only).
fn like_pattern(text: &str) -> String {
    format!("%{}%", text.trim())
}

fn to_limit(limit: u32) -> i64 {
    i64::from(limit)
}

// Key/value payloads of notifications and activities
// are stored in separate tables.
fn payload_from_rows(rows: impl IntoIterator<Item = (String, String)>) -> Payload {
    rows.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_like_patterns() {
        assert_eq!("%abc%", like_pattern(" abc "));
    }
}
