use super::prelude::*;

#[derive(Debug, Clone, Default)]
pub struct NewLocation {
    pub name: String,
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub kind: LocationType,
    pub is_primary: bool,
    pub notes: String,
}

fn position(lat: Option<f64>, lng: Option<f64>) -> Result<Option<MapPoint>> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok(Some(MapPoint::try_from_lat_lng(lat, lng)?)),
        (None, None) => Ok(None),
        _ => Err(Error::InvalidPosition),
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyName);
    }
    if name.chars().count() > Place::MAX_NAME_LEN {
        return Err(Error::TextTooLong);
    }
    Ok(name.to_owned())
}

/// Locations are private, only the owner can access them.
pub fn get_location<R: LocationRepo>(repo: &R, user_id: &Id, id: &Id) -> Result<Location> {
    let location = repo.get_location(id)?;
    if &location.user_id != user_id {
        // Don't reveal the existence of foreign locations.
        return Err(Error::Repo(RepoError::NotFound));
    }
    Ok(location)
}

pub fn create_location<R: LocationRepo>(
    repo: &R,
    user_id: &Id,
    new_location: NewLocation,
    now: Timestamp,
) -> Result<Location> {
    let NewLocation {
        name,
        address,
        lat,
        lng,
        kind,
        is_primary,
        notes,
    } = new_location;
    let location = Location {
        id: Id::new(),
        user_id: user_id.clone(),
        name: validate_name(&name)?,
        address: address.trim().to_owned(),
        pos: position(lat, lng)?,
        kind,
        is_primary,
        notes,
        created_at: now,
        updated_at: now,
    };
    if location.is_primary {
        repo.clear_primary_locations(user_id, None)?;
    }
    repo.create_location(&location)?;
    Ok(location)
}

pub fn update_location<R: LocationRepo>(
    repo: &R,
    user_id: &Id,
    id: &Id,
    update: NewLocation,
    now: Timestamp,
) -> Result<Location> {
    let mut location = get_location(repo, user_id, id)?;
    let NewLocation {
        name,
        address,
        lat,
        lng,
        kind,
        is_primary,
        notes,
    } = update;
    location.name = validate_name(&name)?;
    location.address = address.trim().to_owned();
    location.pos = position(lat, lng)?;
    location.kind = kind;
    location.is_primary = is_primary;
    location.notes = notes;
    location.updated_at = now;
    if location.is_primary {
        repo.clear_primary_locations(user_id, Some(&location.id))?;
    }
    repo.update_location(&location)?;
    Ok(location)
}

pub fn delete_location<R: LocationRepo>(repo: &R, user_id: &Id, id: &Id) -> Result<()> {
    let location = get_location(repo, user_id, id)?;
    Ok(repo.delete_location(&location.id)?)
}

pub fn list_locations<R: LocationRepo>(
    repo: &R,
    user_id: &Id,
    query: &LocationQuery,
) -> Result<Vec<Location>> {
    Ok(repo.load_locations_of_user(user_id, query)?)
}

pub fn get_primary_location<R: LocationRepo>(repo: &R, user_id: &Id) -> Result<Location> {
    let query = LocationQuery {
        is_primary: Some(true),
        ..Default::default()
    };
    repo.load_locations_of_user(user_id, &query)?
        .into_iter()
        .next()
        .ok_or(Error::Repo(RepoError::NotFound))
}

pub fn set_primary_location<R: LocationRepo>(
    repo: &R,
    user_id: &Id,
    id: &Id,
    now: Timestamp,
) -> Result<Location> {
    let mut location = get_location(repo, user_id, id)?;
    let cleared = repo.clear_primary_locations(user_id, Some(&location.id))?;
    log::debug!("Cleared primary flag of {cleared} location(s) of user {user_id}");
    if !location.is_primary {
        location.is_primary = true;
        location.updated_at = now;
        repo.update_location(&location)?;
    }
    Ok(location)
}
