#![allow(clippy::extra_unused_lifetimes)]

// NOTE:
// All timestamps with the `_at` postfix are stored
// as unix timestamp in **milli**seconds.
//
// The field order of every `Queryable` struct must match
// the column order of the corresponding table.

use super::schema::*;

#[derive(Queryable, Insertable, AsChangeset)]
#[diesel(table_name = users, treat_none_as_null = true)]
pub struct UserEntity {
    pub id: String,
    pub username: String,
    pub email: String,
    pub email_confirmed: bool,
    pub password: String,
    pub role: i16,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub date_of_birth: Option<String>,
    pub language: String,
    pub timezone: String,
    pub push_enabled: bool,
    pub digest_enabled: bool,
    pub profile_public: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = device_tokens)]
pub struct DeviceTokenEntity {
    pub user_id: String,
    pub token: String,
    pub created_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = user_tokens)]
pub struct UserTokenEntity {
    pub user_id: String,
    pub purpose: String,
    pub nonce: String,
    pub expires_at: i64,
}

#[derive(Queryable, Insertable, AsChangeset)]
#[diesel(table_name = places, treat_none_as_null = true)]
pub struct PlaceEntity {
    pub id: String,
    pub name: String,
    pub description: String,
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub category: String,
    pub rating: f64,
    pub total_ratings: i32,
    pub ranking_score: f64,
    pub created_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = place_tags)]
pub struct PlaceTag {
    pub place_id: String,
    pub tag: String,
}

#[derive(Queryable, Insertable, AsChangeset)]
#[diesel(table_name = place_reviews)]
pub struct ReviewEntity {
    pub id: String,
    pub place_id: String,
    pub user_id: String,
    pub rating: i16,
    pub review: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = saved_places)]
pub struct SavedPlaceEntity {
    pub user_id: String,
    pub place_id: String,
    pub notes: String,
    pub saved_at: i64,
}

#[derive(Queryable, Insertable, AsChangeset)]
#[diesel(table_name = locations, treat_none_as_null = true)]
pub struct LocationEntity {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub kind: String,
    pub is_primary: bool,
    pub notes: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = connections)]
pub struct ConnectionEntity {
    pub id: String,
    pub follower_id: String,
    pub following_id: String,
    pub is_mutual: bool,
    pub created_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = blocks)]
pub struct BlockEntity {
    pub id: String,
    pub blocker_id: String,
    pub blocked_id: String,
    pub reason: Option<String>,
    pub created_at: i64,
}

#[derive(Queryable, Insertable, AsChangeset)]
#[diesel(table_name = reports, treat_none_as_null = true)]
pub struct ReportEntity {
    pub id: String,
    pub reporter_id: String,
    pub reported_user_id: String,
    pub reason: String,
    pub description: String,
    pub status: String,
    pub admin_notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Queryable, Insertable, AsChangeset)]
#[diesel(table_name = chats, treat_none_as_null = true)]
pub struct ChatEntity {
    pub id: String,
    pub is_group_chat: bool,
    pub title: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = chat_participants)]
pub struct ChatParticipant {
    pub chat_id: String,
    pub user_id: String,
    pub position: i32,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = messages)]
pub struct MessageEntity {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
    pub attachment_url: Option<String>,
    pub attachment_mime_type: Option<String>,
    pub created_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = message_reads)]
pub struct MessageRead {
    pub message_id: String,
    pub user_id: String,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = notifications)]
pub struct NotificationEntity {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub action_url: Option<String>,
    pub created_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = notification_data)]
pub struct NotificationData {
    pub notification_id: String,
    pub key: String,
    pub value: String,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = activities)]
pub struct ActivityEntity {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub target_user_id: Option<String>,
    pub target_place_id: Option<String>,
    pub created_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = activity_data)]
pub struct ActivityData {
    pub activity_id: String,
    pub key: String,
    pub value: String,
}

#[derive(Queryable, Insertable, AsChangeset)]
#[diesel(table_name = files, treat_none_as_null = true)]
pub struct FileEntity {
    pub id: String,
    pub owner_id: String,
    pub storage_path: String,
    pub file_type: String,
    pub original_name: String,
    pub size: i64,
    pub mime_type: String,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    pub password: Option<String>,
    pub download_count: i64,
    pub last_accessed: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = file_tags)]
pub struct FileTag {
    pub file_id: String,
    pub tag: String,
}

#[derive(Queryable, Insertable, AsChangeset)]
#[diesel(table_name = shared_files, treat_none_as_null = true)]
pub struct SharedFileEntity {
    pub id: String,
    pub file_id: String,
    pub shared_by: String,
    pub shared_with: String,
    pub permission: String,
    pub can_reshare: bool,
    pub expires_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = job_results)]
pub struct JobResultEntity {
    pub id: String,
    pub job_name: String,
    pub payload: String,
    pub attempts: i32,
    pub status: String,
    pub last_error: Option<String>,
    pub finished_at: i64,
}
