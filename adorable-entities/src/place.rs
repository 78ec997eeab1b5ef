use crate::{geo::MapPoint, id::Id, rating::AvgRatingValue, time::Timestamp};

#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub id            : Id,
    pub name          : String,
    pub description   : String,
    pub address       : String,
    pub pos           : Option<MapPoint>,
    pub category      : String,
    pub tags          : Vec<String>,
    pub rating        : AvgRatingValue,
    pub total_ratings : u32,
    pub ranking_score : f64,
    pub created_by    : Option<Id>,
    pub created_at    : Timestamp,
    pub updated_at    : Timestamp,
}

impl Place {
    pub const MAX_NAME_LEN: usize = 255;

    /// Whether the coordinates still have to be resolved from the address.
    pub fn needs_geocoding(&self) -> bool {
        self.pos.is_none() && !self.address.trim().is_empty()
    }
}

/// A bookmark of a place by a user. Unique per (user, place).
#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPlace {
    pub user_id  : Id,
    pub place_id : Id,
    pub notes    : String,
    pub saved_at : Timestamp,
}
