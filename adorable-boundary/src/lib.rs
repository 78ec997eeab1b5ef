//! # adorable-boundary
//!
//! Request and response bodies of the JSON API.
//!
//! Input structs never carry read-only fields like ids, timestamps,
//! ratings or counters. Timestamps are unix seconds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(feature = "entity-conversions")]
mod conv;

pub type Payload = BTreeMap<String, String>;

// ---   errors   --- //

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ValidationError,
    AuthenticationError,
    PermissionError,
    NotFound,
    RateLimitExceeded,
    ServiceUnavailable,
    DatabaseError,
    ExternalServiceError,
    InternalServerError,
}

impl ErrorCode {
    pub const fn http_status(self) -> u16 {
        match self {
            Self::ValidationError => 400,
            Self::AuthenticationError => 401,
            Self::PermissionError => 403,
            Self::NotFound => 404,
            Self::RateLimitExceeded => 429,
            Self::ServiceUnavailable => 503,
            Self::DatabaseError | Self::InternalServerError => 500,
            Self::ExternalServiceError => 502,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::AuthenticationError => "authentication_error",
            Self::PermissionError => "permission_error",
            Self::NotFound => "not_found",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::ServiceUnavailable => "service_unavailable",
            Self::DatabaseError => "database_error",
            Self::ExternalServiceError => "external_service_error",
            Self::InternalServerError => "internal_server_error",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    pub status_code: u16,
}

/// The body of every error response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub error: ErrorDetails,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code,
                message: message.into(),
                status_code: code.http_status(),
            },
        }
    }
}

// ---   users   --- //

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct JwtToken {
    pub token: String,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct ConfirmEmailAddress {
    pub token: String,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct RequestPasswordReset {
    pub email: String,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct ResetPassword {
    pub token: String,
    pub new_password: String,
}

#[derive(Serialize, Deserialize, Default)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
#[serde(default)]
pub struct UpdateProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub push_enabled: Option<bool>,
    pub digest_enabled: Option<bool>,
    pub profile_public: Option<bool>,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct NewDeviceToken {
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Guest,
    User,
    Staff,
    Admin,
}

/// The public view of a user.
#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct User {
    pub id: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub followers_count: usize,
    pub following_count: usize,
    pub created_at: i64,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct NotificationPreferences {
    pub push_enabled: bool,
    pub digest_enabled: bool,
}

/// The view of the authenticated user on its own account.
#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub email_confirmed: bool,
    pub role: UserRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub date_of_birth: Option<String>,
    pub language: String,
    pub timezone: String,
    pub notifications: NotificationPreferences,
    pub profile_public: bool,
    pub followers_count: usize,
    pub following_count: usize,
    pub created_at: i64,
    pub updated_at: i64,
}

// ---   locations   --- //

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Home,
    Work,
    #[default]
    Other,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct NewLocation {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(rename = "type", default)]
    pub kind: LocationType,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub notes: String,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct Location {
    pub id: String,
    pub name: String,
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(rename = "type")]
    pub kind: LocationType,
    pub is_primary: bool,
    pub notes: String,
    pub created_at: i64,
    pub updated_at: i64,
}

// ---   places   --- //

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct NewPlace {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct Place {
    pub id: String,
    pub name: String,
    pub description: String,
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub category: String,
    pub tags: Vec<String>,
    pub rating: f64,
    pub total_ratings: u32,
    pub ranking_score: f64,
    pub created_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct SavePlace {
    #[serde(default)]
    pub notes: String,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct SavedPlace {
    pub place: Place,
    pub notes: String,
    pub saved_at: i64,
}

// ---   reviews   --- //

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct NewReview {
    pub place_id: String,
    pub rating: i64,
    #[serde(default)]
    pub review: String,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct UpdateReview {
    pub rating: i64,
    #[serde(default)]
    pub review: String,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct Review {
    pub id: String,
    pub place_id: String,
    pub user_id: String,
    pub rating: u8,
    pub review: String,
    pub created_at: i64,
    pub updated_at: i64,
}

// ---   social   --- //

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct NewFollow {
    pub user_id: String,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct Follow {
    pub id: String,
    pub follower_id: String,
    pub following_id: String,
    pub is_mutual: bool,
    pub created_at: i64,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct NewBlock {
    pub user_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct Block {
    pub id: String,
    pub blocked_id: String,
    pub reason: Option<String>,
    pub created_at: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Spam,
    Harassment,
    Inappropriate,
    Other,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Reviewing,
    Resolved,
    Dismissed,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct NewReport {
    pub reported_user_id: String,
    pub reason: ReportReason,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct ChangeReportStatus {
    pub status: ReportStatus,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct Report {
    pub id: String,
    pub reporter_id: String,
    pub reported_user_id: String,
    pub reason: ReportReason,
    pub description: String,
    pub status: ReportStatus,
    pub admin_notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

// ---   chats   --- //

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct NewChat {
    pub participants: Vec<String>,
    #[serde(default)]
    pub is_group_chat: bool,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct NewParticipants {
    pub user_ids: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct Chat {
    pub id: String,
    pub participants: Vec<String>,
    pub is_group_chat: bool,
    pub title: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct Attachment {
    pub url: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct NewMessage {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachment: Option<Attachment>,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
    pub attachment: Option<Attachment>,
    pub read_by: Vec<String>,
    pub is_read: bool,
    pub created_at: i64,
}

// ---   notifications & activities   --- //

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewFollower,
    NewMessage,
    PlaceReview,
    NearbyEvent,
    Mention,
    System,
    ChatInvite,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub data: Payload,
    pub is_read: bool,
    pub action_url: Option<String>,
    pub created_at: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Follow,
    Review,
    Visit,
    SavePlace,
    Share,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct Activity {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub target_user_id: Option<String>,
    pub target_place_id: Option<String>,
    pub data: Payload,
    pub created_at: i64,
}

// ---   storage   --- //

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Image,
    Video,
    Document,
    Audio,
    Other,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct File {
    pub id: String,
    pub owner_id: String,
    pub url: String,
    pub file_type: FileType,
    pub original_name: String,
    pub size: u64,
    pub mime_type: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub password_protected: bool,
    pub download_count: u64,
    pub last_accessed: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Serialize, Deserialize, Default)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
#[serde(default)]
pub struct UpdateFile {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
    /// An empty string removes the password.
    pub password: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    #[default]
    View,
    Edit,
    Full,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct NewShare {
    pub file_id: String,
    pub shared_with: String,
    #[serde(default)]
    pub permission: Permission,
    #[serde(default)]
    pub can_reshare: bool,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct SharedFile {
    pub id: String,
    pub file_id: String,
    pub shared_by: String,
    pub shared_with: String,
    pub permission: Permission,
    pub can_reshare: bool,
    pub expires_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

// ---   monitoring   --- //

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct ServiceHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub details: Payload,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct HealthReport {
    pub status: String,
    pub timestamp: i64,
    pub services: BTreeMap<String, ServiceHealth>,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct RequestMetrics {
    pub period_hours: u32,
    pub total_requests: u64,
    pub average_duration_ms: f64,
    pub status_classes: BTreeMap<String, u64>,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct CircuitBreakerStatus {
    pub name: String,
    pub state: String,
    pub failures: u32,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct DetailedHealth {
    pub health: HealthReport,
    pub requests: RequestMetrics,
    pub circuit_breakers: Vec<CircuitBreakerStatus>,
}

// ---   signed API   --- //

#[derive(Serialize, Deserialize, Default)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
#[serde(default)]
pub struct NewApiKey {
    /// Restricts the key to these client addresses.
    pub allowed_ips: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "extra-derive", derive(Debug, Clone))]
pub struct ApiKeyPair {
    pub api_key: String,
    pub api_secret: String,
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_error_body() {
        let err = Error::new(ErrorCode::RateLimitExceeded, "Too many requests");
        assert_eq!(
            r#"{"error":{"code":"rate_limit_exceeded","message":"Too many requests","status_code":429}}"#,
            serde_json::to_string(&err).unwrap()
        );
    }

    #[test]
    fn error_code_names_match_serialization() {
        for code in [
            ErrorCode::ValidationError,
            ErrorCode::AuthenticationError,
            ErrorCode::PermissionError,
            ErrorCode::NotFound,
            ErrorCode::RateLimitExceeded,
            ErrorCode::ServiceUnavailable,
            ErrorCode::DatabaseError,
            ErrorCode::ExternalServiceError,
            ErrorCode::InternalServerError,
        ] {
            assert_eq!(
                format!("\"{}\"", code.as_str()),
                serde_json::to_string(&code).unwrap()
            );
        }
        assert_eq!(502, ErrorCode::ExternalServiceError.http_status());
    }

    #[test]
    fn ignore_read_only_fields_in_input() {
        let place: NewPlace = serde_json::from_str(
            r#"{"name":"Cafe","rating":5.0,"total_ratings":100,"id":"x"}"#,
        )
        .unwrap();
        assert_eq!("Cafe", place.name);
        assert!(place.tags.is_empty());

        let location: NewLocation =
            serde_json::from_str(r#"{"name":"Home","address":"Main St","type":"home"}"#).unwrap();
        assert_eq!(LocationType::Home, location.kind);
        assert!(!location.is_primary);
    }
}
