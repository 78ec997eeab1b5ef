// Low-level database access traits.
// Each repository is responsible for a single entity and
// its relationships. Related entities are only referenced
// by their id and never modified or loaded by another
// repository.

use crate::entities::*;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The requested object could not be found")]
    NotFound,
    #[error("The object already exists")]
    AlreadyExists,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

type Result<T> = std::result::Result<T, Error>;

pub trait UserRepo {
    fn create_user(&self, user: &User) -> Result<()>;
    fn update_user(&self, user: &User) -> Result<()>;
    fn delete_user(&self, id: &Id) -> Result<()>;

    fn get_user(&self, id: &Id) -> Result<User>;
    fn get_users(&self, ids: &[Id]) -> Result<Vec<User>>;
    fn try_get_user_by_email(&self, email: &EmailAddress) -> Result<Option<User>>;
    fn try_get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    fn get_user_by_email(&self, email: &EmailAddress) -> Result<User> {
        self.try_get_user_by_email(email)?.ok_or(Error::NotFound)
    }

    /// Case-insensitive substring match on username, first and last name.
    fn search_users(&self, text: &str, limit: u32) -> Result<Vec<User>>;
    fn count_users(&self) -> Result<usize>;
}

pub trait DeviceTokenRepo {
    /// Registering the same token twice is a no-op.
    fn add_device_token(&self, token: &DeviceToken) -> Result<()>;
    fn remove_device_token(&self, user_id: &Id, token: &str) -> Result<()>;
    fn load_device_tokens(&self, user_ids: &[Id]) -> Result<Vec<DeviceToken>>;
}

pub trait UserTokenRepo {
    /// Replaces any previous token of the same user and purpose.
    fn replace_user_token(&self, token: UserToken) -> Result<EmailNonce>;
    fn consume_user_token(&self, purpose: TokenPurpose, email_nonce: &EmailNonce)
        -> Result<UserToken>;
    fn delete_expired_user_tokens(&self, expired_before: Timestamp) -> Result<usize>;
}

#[derive(Debug, Default, Clone)]
pub struct PlaceQuery {
    pub text: Option<String>,
    pub category: Option<String>,
    pub bbox: Option<MapBbox>,
    pub limit: Option<u32>,
}

pub trait PlaceRepo {
    fn create_place(&self, place: &Place) -> Result<()>;
    fn update_place(&self, place: &Place) -> Result<()>;
    fn delete_place(&self, id: &Id) -> Result<()>;

    fn get_place(&self, id: &Id) -> Result<Place>;
    fn get_places(&self, ids: &[Id]) -> Result<Vec<Place>>;
    fn all_places(&self) -> Result<Vec<Place>>;
    fn query_places(&self, query: &PlaceQuery) -> Result<Vec<Place>>;
    /// Ordered by ranking score, best first.
    fn most_popular_places(&self, limit: u32) -> Result<Vec<Place>>;
    fn count_places(&self) -> Result<usize>;
}

pub trait ReviewRepo {
    fn create_review(&self, review: &PlaceReview) -> Result<()>;
    fn update_review(&self, review: &PlaceReview) -> Result<()>;
    fn delete_review(&self, id: &Id) -> Result<()>;

    fn get_review(&self, id: &Id) -> Result<PlaceReview>;
    fn try_get_review_by_user(&self, place_id: &Id, user_id: &Id) -> Result<Option<PlaceReview>>;
    fn load_reviews_of_place(&self, place_id: &Id) -> Result<Vec<PlaceReview>>;
    fn count_reviews_of_place_since(&self, place_id: &Id, since: Timestamp) -> Result<usize>;
}

pub trait SavedPlaceRepo {
    /// Inserts or updates the notes of an existing bookmark.
    fn save_place(&self, saved: &SavedPlace) -> Result<()>;
    fn unsave_place(&self, user_id: &Id, place_id: &Id) -> Result<()>;
    fn load_saved_places(&self, user_id: &Id) -> Result<Vec<SavedPlace>>;
}

#[derive(Debug, Default, Clone)]
pub struct LocationQuery {
    pub kind: Option<LocationType>,
    pub is_primary: Option<bool>,
    pub text: Option<String>,
}

pub trait LocationRepo {
    fn create_location(&self, location: &Location) -> Result<()>;
    fn update_location(&self, location: &Location) -> Result<()>;
    fn delete_location(&self, id: &Id) -> Result<()>;

    fn get_location(&self, id: &Id) -> Result<Location>;
    /// Primary location first, then the most recently created.
    fn load_locations_of_user(&self, user_id: &Id, query: &LocationQuery) -> Result<Vec<Location>>;
    /// Clears the primary flag of all locations of the user except `keep`.
    fn clear_primary_locations(&self, user_id: &Id, keep: Option<&Id>) -> Result<usize>;
}

pub trait ConnectionRepo {
    fn create_connection(&self, connection: &Connection) -> Result<()>;
    fn delete_connection(&self, follower_id: &Id, following_id: &Id) -> Result<()>;
    fn try_get_connection(&self, follower_id: &Id, following_id: &Id)
        -> Result<Option<Connection>>;
    fn set_mutual(&self, follower_id: &Id, following_id: &Id, is_mutual: bool) -> Result<()>;

    /// Edges pointing to the user.
    fn load_followers(&self, user_id: &Id) -> Result<Vec<Connection>>;
    /// Edges starting at the user.
    fn load_following(&self, user_id: &Id) -> Result<Vec<Connection>>;
    fn count_followers(&self, user_id: &Id) -> Result<usize>;
    fn count_following(&self, user_id: &Id) -> Result<usize>;
}

pub trait BlockRepo {
    fn create_block(&self, block: &Block) -> Result<()>;
    fn delete_block(&self, blocker_id: &Id, blocked_id: &Id) -> Result<()>;
    fn try_get_block(&self, blocker_id: &Id, blocked_id: &Id) -> Result<Option<Block>>;
    fn load_blocks(&self, blocker_id: &Id) -> Result<Vec<Block>>;

    /// True if any of both users blocked the other one.
    fn is_blocked_either_way(&self, a: &Id, b: &Id) -> Result<bool> {
        Ok(self.try_get_block(a, b)?.is_some() || self.try_get_block(b, a)?.is_some())
    }
}

pub trait ReportRepo {
    fn create_report(&self, report: &Report) -> Result<()>;
    fn update_report(&self, report: &Report) -> Result<()>;
    fn get_report(&self, id: &Id) -> Result<Report>;
    fn load_reports_by_reporter(&self, reporter_id: &Id) -> Result<Vec<Report>>;
    fn all_reports(&self) -> Result<Vec<Report>>;
}

pub trait ChatRepo {
    fn create_chat(&self, chat: &Chat) -> Result<()>;
    /// Updates everything except the participants.
    fn update_chat(&self, chat: &Chat) -> Result<()>;
    fn add_participants(&self, chat_id: &Id, user_ids: &[Id]) -> Result<()>;

    fn get_chat(&self, id: &Id) -> Result<Chat>;
    /// Most recently active first.
    fn load_chats_of_user(&self, user_id: &Id) -> Result<Vec<Chat>>;
    fn try_get_direct_chat(&self, a: &Id, b: &Id) -> Result<Option<Chat>>;
}

pub trait MessageRepo {
    fn create_message(&self, message: &Message) -> Result<()>;
    /// Oldest first.
    fn load_messages(&self, chat_id: &Id, limit: Option<u32>) -> Result<Vec<Message>>;
    /// Returns the number of messages that were newly marked.
    fn mark_messages_read(&self, chat_id: &Id, user_id: &Id) -> Result<usize>;
}

pub trait NotificationRepo {
    fn create_notification(&self, notification: &Notification) -> Result<()>;
    fn get_notification(&self, id: &Id) -> Result<Notification>;
    fn delete_notification(&self, id: &Id) -> Result<()>;
    fn mark_notifications_read(&self, ids: &[Id]) -> Result<usize>;
    fn mark_all_notifications_read(&self, user_id: &Id) -> Result<usize>;
    /// Newest first.
    fn load_notifications(
        &self,
        user_id: &Id,
        unread_only: bool,
        limit: Option<u32>,
    ) -> Result<Vec<Notification>>;
    fn load_unread_notifications_since(&self, since: Timestamp) -> Result<Vec<Notification>>;
}

pub trait ActivityRepo {
    fn create_activity(&self, activity: &Activity) -> Result<()>;
    /// Newest first.
    fn load_activities_of_users(&self, user_ids: &[Id], limit: u32) -> Result<Vec<Activity>>;
}

pub trait FileRepo {
    fn create_file(&self, file: &File) -> Result<()>;
    fn update_file(&self, file: &File) -> Result<()>;
    fn delete_file(&self, id: &Id) -> Result<()>;
    fn get_file(&self, id: &Id) -> Result<File>;
    fn load_files_of_owner(&self, owner_id: &Id) -> Result<Vec<File>>;
    /// Files with an unexpired share for the user.
    fn load_files_shared_with(&self, user_id: &Id, now: Timestamp) -> Result<Vec<File>>;
    fn record_download(&self, id: &Id, at: Timestamp) -> Result<()>;
}

pub trait SharedFileRepo {
    fn create_shared_file(&self, share: &SharedFile) -> Result<()>;
    fn update_shared_file(&self, share: &SharedFile) -> Result<()>;
    fn delete_shared_file(&self, id: &Id) -> Result<()>;
    fn get_shared_file(&self, id: &Id) -> Result<SharedFile>;
    fn try_get_shared_file(&self, file_id: &Id, shared_with: &Id) -> Result<Option<SharedFile>>;
    fn load_shares_of_user(&self, user_id: &Id) -> Result<Vec<SharedFile>>;
}

pub trait JobResultRepo {
    fn record_job_result(&self, result: &JobResult) -> Result<()>;
    /// Newest first.
    fn load_job_results(&self, limit: u32) -> Result<Vec<JobResult>>;
}
