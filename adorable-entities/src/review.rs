use crate::{id::Id, rating::RatingValue, time::Timestamp};

/// A user's review of a place. There is at most one per (user, place).
#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceReview {
    pub id         : Id,
    pub place_id   : Id,
    pub user_id    : Id,
    pub rating     : RatingValue,
    pub review     : String,
    pub created_at : Timestamp,
    pub updated_at : Timestamp,
}
