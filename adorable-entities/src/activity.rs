use strum::{AsRefStr, EnumString};

use crate::{id::Id, notification::Payload, time::Timestamp};

/// An entry of a user's activity feed.
#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id             : Id,
    pub user_id        : Id,
    pub kind           : ActivityType,
    pub target_user_id : Option<Id>,
    pub target_place_id: Option<Id>,
    pub data           : Payload,
    pub created_at     : Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ActivityType {
    Follow,
    Review,
    Visit,
    SavePlace,
    Share,
}
