use crate::{entities::*, repositories::*};
use anyhow::Result as Fallible;

/// All repositories that are available through a single database connection.
pub trait Db:
    UserRepo
    + DeviceTokenRepo
    + UserTokenRepo
    + PlaceRepo
    + ReviewRepo
    + SavedPlaceRepo
    + LocationRepo
    + ConnectionRepo
    + BlockRepo
    + ReportRepo
    + ChatRepo
    + MessageRepo
    + NotificationRepo
    + ActivityRepo
    + FileRepo
    + SharedFileRepo
    + JobResultRepo
{
}

impl<T> Db for T where
    T: UserRepo
        + DeviceTokenRepo
        + UserTokenRepo
        + PlaceRepo
        + ReviewRepo
        + SavedPlaceRepo
        + LocationRepo
        + ConnectionRepo
        + BlockRepo
        + ReportRepo
        + ChatRepo
        + MessageRepo
        + NotificationRepo
        + ActivityRepo
        + FileRepo
        + SharedFileRepo
        + JobResultRepo
{
}

/// The searchable projection of a place.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPlace {
    pub id: Id,
    pub pos: Option<MapPoint>,
    pub name: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub rating: f64,
    pub ranking_score: f64,
}

impl From<&Place> for IndexedPlace {
    fn from(place: &Place) -> Self {
        Self {
            id: place.id.clone(),
            pos: place.pos,
            name: place.name.clone(),
            description: place.description.clone(),
            category: place.category.clone(),
            tags: place.tags.clone(),
            rating: place.rating.into(),
            ranking_score: place.ranking_score,
        }
    }
}

pub trait PlaceIndex {
    /// Best ranked first.
    fn query_places(&self, query: &PlaceQuery) -> Fallible<Vec<IndexedPlace>>;
}

pub trait PlaceIndexer: PlaceIndex {
    fn add_or_update_place(&self, place: &Place) -> Fallible<()>;
    fn remove_place_by_id(&self, id: &Id) -> Fallible<()>;
    fn flush_index(&self) -> Fallible<()>;
}
