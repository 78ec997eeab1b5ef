use std::collections::BTreeMap;
use strum::{AsRefStr, EnumString};

use crate::{id::Id, time::Timestamp};

/// Arbitrary string payload attached to notifications and activities.
pub type Payload = BTreeMap<String, String>;

#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id         : Id,
    pub user_id    : Id,
    pub kind       : NotificationType,
    pub title      : String,
    pub message    : String,
    pub data       : Payload,
    pub is_read    : bool,
    pub action_url : Option<String>,
    pub created_at : Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum NotificationType {
    NewFollower,
    NewMessage,
    PlaceReview,
    NearbyEvent,
    Mention,
    System,
    ChatInvite,
}
