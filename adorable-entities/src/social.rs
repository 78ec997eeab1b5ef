use strum::{AsRefStr, EnumString};

use crate::{id::Id, time::Timestamp};

/// A directed follow edge.
///
/// `is_mutual` mirrors whether the reciprocal edge exists.
#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id           : Id,
    pub follower_id  : Id,
    pub following_id : Id,
    pub is_mutual    : bool,
    pub created_at   : Timestamp,
}

#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id         : Id,
    pub blocker_id : Id,
    pub blocked_id : Id,
    pub reason     : Option<String>,
    pub created_at : Timestamp,
}

#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub id               : Id,
    pub reporter_id      : Id,
    pub reported_user_id : Id,
    pub reason           : ReportReason,
    pub description      : String,
    pub status           : ReportStatus,
    pub admin_notes      : Option<String>,
    pub created_at       : Timestamp,
    pub updated_at       : Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ReportReason {
    Spam,
    Harassment,
    Inappropriate,
    Other,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewing,
    Resolved,
    Dismissed,
}
