use strum::{AsRefStr, EnumString};

use crate::{geo::MapPoint, id::Id, time::Timestamp};

/// A named address of a user, e.g. "Home".
///
/// At most one location of a user is flagged as primary.
#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id         : Id,
    pub user_id    : Id,
    pub name       : String,
    pub address    : String,
    pub pos        : Option<MapPoint>,
    pub kind       : LocationType,
    pub is_primary : bool,
    pub notes      : String,
    pub created_at : Timestamp,
    pub updated_at : Timestamp,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum LocationType {
    Home,
    Work,
    #[default]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_type_names() {
        assert_eq!("home", LocationType::Home.as_ref());
        assert_eq!(LocationType::Work, "work".parse().unwrap());
        assert!("office".parse::<LocationType>().is_err());
    }
}
