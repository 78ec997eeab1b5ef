//! Search index that lives in the process memory.

use crate::{
    db::{IndexedPlace, PlaceIndex, PlaceIndexer},
    entities::*,
    repositories::PlaceQuery,
};
use anyhow::Result as Fallible;
use parking_lot::RwLock;
use std::{cmp::Ordering, collections::HashMap};

#[derive(Debug, Default)]
pub struct InMemoryPlaceIndex {
    places: RwLock<HashMap<Id, IndexedPlace>>,
}

impl InMemoryPlaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.places.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn matches_text(place: &IndexedPlace, terms: &[String]) -> bool {
    terms.iter().all(|term| {
        place.name.to_lowercase().contains(term)
            || place.description.to_lowercase().contains(term)
            || place.tags.iter().any(|t| t == term)
    })
}

impl PlaceIndex for InMemoryPlaceIndex {
    fn query_places(&self, query: &PlaceQuery) -> Fallible<Vec<IndexedPlace>> {
        let terms: Vec<String> = query
            .text
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(|t| t.trim_start_matches('#').to_lowercase())
            .collect();
        let mut results: Vec<_> = self
            .places
            .read()
            .values()
            .filter(|p| {
                query
                    .category
                    .as_ref()
                    .map(|c| c.eq_ignore_ascii_case(&p.category))
                    .unwrap_or(true)
            })
            .filter(|p| match (&query.bbox, p.pos) {
                (Some(bbox), Some(pos)) => bbox.contains_point(pos),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .filter(|p| matches_text(p, &terms))
            .cloned()
            .collect();
        results.sort_by(|a, b| {
            b.ranking_score
                .partial_cmp(&a.ranking_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal))
                .then_with(|| a.name.cmp(&b.name))
        });
        if let Some(limit) = query.limit {
            results.truncate(limit as usize);
        }
        Ok(results)
    }
}

impl PlaceIndexer for InMemoryPlaceIndex {
    fn add_or_update_place(&self, place: &Place) -> Fallible<()> {
        self.places
            .write()
            .insert(place.id.clone(), IndexedPlace::from(place));
        Ok(())
    }

    fn remove_place_by_id(&self, id: &Id) -> Fallible<()> {
        self.places.write().remove(id);
        Ok(())
    }

    fn flush_index(&self) -> Fallible<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adorable_entities::builders::*;

    fn index_with_places() -> InMemoryPlaceIndex {
        let index = InMemoryPlaceIndex::new();
        let berlin = MapPoint::try_from_lat_lng(52.52, 13.40).unwrap();
        let paris = MapPoint::try_from_lat_lng(48.85, 2.35).unwrap();
        let mut cafe = Place::build()
            .id("cafe")
            .name("Cafe Luna")
            .category("cafe")
            .tags(vec!["coffee"])
            .pos(berlin)
            .finish();
        cafe.ranking_score = 0.9;
        let bar = Place::build()
            .id("bar")
            .name("Moon Bar")
            .description("Cocktails and coffee")
            .category("bar")
            .pos(paris)
            .finish();
        index.add_or_update_place(&cafe).unwrap();
        index.add_or_update_place(&bar).unwrap();
        index
    }

    #[test]
    fn search_by_text() {
        let index = index_with_places();
        let res = index
            .query_places(&PlaceQuery {
                text: Some("coffee".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(2, res.len());
        assert_eq!("cafe", res[0].id.as_str());
        let res = index
            .query_places(&PlaceQuery {
                text: Some("luna".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(1, res.len());
    }

    #[test]
    fn filter_by_category_and_bbox() {
        let index = index_with_places();
        let res = index
            .query_places(&PlaceQuery {
                category: Some("Bar".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(vec!["bar"], res.iter().map(|p| p.id.as_str()).collect::<Vec<_>>());
        let res = index
            .query_places(&PlaceQuery {
                bbox: Some("50,10,55,15".parse().unwrap()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(vec!["cafe"], res.iter().map(|p| p.id.as_str()).collect::<Vec<_>>());
    }

    #[test]
    fn remove_from_index() {
        let index = index_with_places();
        index.remove_place_by_id(&"cafe".into()).unwrap();
        assert_eq!(1, index.len());
    }
}
