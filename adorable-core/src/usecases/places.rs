use super::prelude::*;

#[derive(Debug, Clone, Default)]
pub struct NewPlace {
    pub name: String,
    pub description: String,
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub category: String,
    pub tags: Vec<String>,
}

const DEFAULT_CATEGORY: &str = "other";

struct ValidPlace {
    name: String,
    description: String,
    address: String,
    pos: Option<MapPoint>,
    category: String,
    tags: Vec<String>,
}

fn validate_place(new_place: NewPlace) -> Result<ValidPlace> {
    let NewPlace {
        name,
        description,
        address,
        lat,
        lng,
        category,
        tags,
    } = new_place;
    let name = name.trim().to_owned();
    if name.is_empty() {
        return Err(Error::EmptyName);
    }
    if name.chars().count() > Place::MAX_NAME_LEN {
        return Err(Error::TextTooLong);
    }
    let pos = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(MapPoint::try_from_lat_lng(lat, lng)?),
        (None, None) => None,
        _ => return Err(Error::InvalidPosition),
    };
    let category = category.trim().to_lowercase();
    Ok(ValidPlace {
        name,
        description: description.trim().to_owned(),
        address: address.trim().to_owned(),
        pos,
        category: if category.is_empty() {
            DEFAULT_CATEGORY.to_owned()
        } else {
            category
        },
        tags: validate::normalize_tags(tags),
    })
}

pub fn create_place<R: PlaceRepo>(
    repo: &R,
    creator: &User,
    new_place: NewPlace,
    now: Timestamp,
) -> Result<Place> {
    let ValidPlace {
        name,
        description,
        address,
        pos,
        category,
        tags,
    } = validate_place(new_place)?;
    let place = Place {
        id: Id::new(),
        name,
        description,
        address,
        pos,
        category,
        tags,
        rating: Default::default(),
        total_ratings: 0,
        ranking_score: 0.0,
        created_by: Some(creator.id.clone()),
        created_at: now,
        updated_at: now,
    };
    log::debug!("Creating place {} ({})", place.id, place.name);
    repo.create_place(&place)?;
    Ok(place)
}

fn authorize_place_change(user: &User, place: &Place) -> Result<()> {
    if user.is_staff() || place.created_by.as_ref() == Some(&user.id) {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

pub fn update_place<R: PlaceRepo>(
    repo: &R,
    user: &User,
    id: &Id,
    update: NewPlace,
    now: Timestamp,
) -> Result<Place> {
    let mut place = repo.get_place(id)?;
    authorize_place_change(user, &place)?;
    let ValidPlace {
        name,
        description,
        address,
        pos,
        category,
        tags,
    } = validate_place(update)?;
    // Keep the resolved coordinates of an unchanged address.
    if pos.is_some() || address != place.address {
        place.pos = pos;
    }
    place.name = name;
    place.description = description;
    place.address = address;
    place.category = category;
    place.tags = tags;
    place.updated_at = now;
    repo.update_place(&place)?;
    Ok(place)
}

pub fn delete_place<R: PlaceRepo>(repo: &R, user: &User, id: &Id) -> Result<()> {
    let place = repo.get_place(id)?;
    authorize_place_change(user, &place)?;
    log::info!("Deleting place {id}");
    Ok(repo.delete_place(id)?)
}

pub fn get_place<R: PlaceRepo>(repo: &R, id: &Id) -> Result<Place> {
    Ok(repo.get_place(id)?)
}

/// Query the search index and fall back to the database if it fails.
pub fn search_places<R, I>(repo: &R, index: &I, mut query: PlaceQuery) -> Result<Vec<Place>>
where
    R: PlaceRepo,
    I: PlaceIndex + ?Sized,
{
    query.limit = Some(super::effective_limit(query.limit)?);
    match index.query_places(&query) {
        Ok(indexed) => {
            let ids: Vec<_> = indexed.into_iter().map(|p| p.id).collect();
            let mut places = repo.get_places(&ids)?;
            // Restore the ranking of the index
            places.sort_by_key(|p| ids.iter().position(|id| id == &p.id));
            Ok(places)
        }
        Err(err) => {
            log::warn!("Search index unavailable, falling back to the database: {err}");
            Ok(repo.query_places(&query)?)
        }
    }
}

pub fn popular_places<R: PlaceRepo>(repo: &R, limit: Option<u32>) -> Result<Vec<Place>> {
    let limit = super::effective_limit(limit.or(Some(10)))?;
    Ok(repo.most_popular_places(limit)?)
}
