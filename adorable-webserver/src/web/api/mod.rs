use std::result;

use adorable_boundary::{Error as JsonErrorResponse, ErrorCode};
use rocket::serde::json::{Error as JsonError, Json};
use rocket::{
    self, catch, catchers, delete, get,
    http::{Header, Status},
    post, put,
    response::{self, Responder},
    routes, Catcher, Request, Route, State,
};

use super::guards::*;
use crate::{
    adapters::json::{self, from_json, to_json},
    core::{prelude::*, usecases},
    web::{jwt, sqlite, Cfg},
};
use adorable_application::prelude::{self as flows, EventDispatcher};

mod activities;
mod chats;
mod error;
mod locations;
mod monitoring;
mod notifications;
mod places;
mod reviews;
mod signed;
mod social;
mod storage;
mod users;

pub use self::error::Error as ApiError;


type Result<T> = result::Result<Json<T>, ApiError>;
type JsonResult<'a, T> = result::Result<Json<T>, JsonError<'a>>;
type StatusResult = result::Result<Status, ApiError>;

pub fn routes() -> Vec<Route> {
    routes![
        // ---   users   --- //
        users::post_register,
        users::post_login,
        users::post_logout,
        users::post_confirm_email,
        users::post_request_password_reset,
        users::post_reset_password,
        users::get_current_user,
        users::put_current_user,
        users::delete_current_user,
        users::put_avatar,
        users::post_device_token,
        users::delete_device_token,
        users::post_temporary_token,
        users::get_user,
        users::search_users,
        // ---   locations   --- //
        locations::get_locations,
        locations::post_location,
        locations::get_primary_location,
        locations::get_location,
        locations::put_location,
        locations::delete_location,
        locations::post_primary_location,
        // ---   places   --- //
        places::search_places,
        places::post_place,
        places::get_popular_places,
        places::get_place,
        places::put_place,
        places::delete_place,
        places::get_reviews_of_place,
        places::post_save_place,
        places::delete_saved_place,
        places::get_saved_places,
        // ---   reviews   --- //
        reviews::post_review,
        reviews::get_review,
        reviews::put_review,
        reviews::delete_review,
        // ---   social   --- //
        social::get_follows,
        social::post_follow,
        social::delete_follow,
        social::get_followers,
        social::get_following,
        social::get_blocks,
        social::post_block,
        social::delete_block,
        social::get_reports,
        social::post_report,
        social::post_report_status,
        // ---   chats   --- //
        chats::get_chats,
        chats::post_chat,
        chats::get_chat,
        chats::post_participants,
        chats::get_messages,
        chats::post_message,
        chats::post_read,
        // ---   notifications   --- //
        notifications::get_notifications,
        notifications::post_read,
        notifications::post_read_all,
        notifications::delete_notification,
        // ---   activities   --- //
        activities::get_own_activities,
        activities::get_feed,
        // ---   storage   --- //
        storage::get_files,
        storage::post_file,
        storage::get_file,
        storage::put_file,
        storage::delete_file,
        storage::post_download,
        storage::get_shares,
        storage::post_share,
        storage::delete_share,
        // ---   monitoring   --- //
        monitoring::get_health,
        monitoring::get_health_detailed,
        monitoring::get_service_health,
        monitoring::get_request_metrics,
        monitoring::get_circuit_breakers,
        // ---   signed   --- //
        signed::post_api_key,
        signed::post_rotate_api_key,
        signed::get_places,
        signed::get_health,
    ]
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

/// A JSON error body with an optional `Retry-After` header.
pub struct ErrorResponse {
    body: JsonErrorResponse,
    retry_after: Option<u64>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            body: JsonErrorResponse::new(code, message),
            retry_after: None,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ErrorResponse {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let Self { body, retry_after } = self;
        let status = Status::new(body.error.status_code);
        Json(body).respond_to(req).map(|mut res| {
            res.set_status(status);
            if let Some(secs) = retry_after {
                res.set_header(Header::new("Retry-After", secs.to_string()));
            }
            res
        })
    }
}

fn error_code_of_status(status: Status) -> ErrorCode {
    match status.code {
        401 => ErrorCode::AuthenticationError,
        403 => ErrorCode::PermissionError,
        404 => ErrorCode::NotFound,
        429 => ErrorCode::RateLimitExceeded,
        502 => ErrorCode::ExternalServiceError,
        503 => ErrorCode::ServiceUnavailable,
        code if (400..500).contains(&code) => ErrorCode::ValidationError,
        _ => ErrorCode::InternalServerError,
    }
}

/// Renders the failures of guards, unknown routes and
/// malformed requests in the same shape as all other errors.
#[catch(default)]
fn default_catcher(status: Status, req: &Request<'_>) -> ErrorResponse {
    let code = error_code_of_status(status);
    let failure = req.local_cache(GuardFailure::default);
    let message = failure
        .message
        .clone()
        .unwrap_or_else(|| status.reason_lossy().to_owned());
    let mut response = ErrorResponse::new(code, message);
    if code == ErrorCode::RateLimitExceeded {
        response.retry_after = Some(failure.retry_after.map_or(60, |d| d.as_secs().max(1)));
    }
    if code.http_status() >= 500 {
        error!("{} {}: {}", req.uri(), code.as_str(), status);
    } else {
        debug!("{} {}: {}", req.uri(), code.as_str(), status);
    }
    response
}
