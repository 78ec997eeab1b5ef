use super::prelude::*;

pub fn save_place<R>(
    repo: &R,
    user_id: &Id,
    place_id: &Id,
    notes: Option<String>,
    now: Timestamp,
) -> Result<SavedPlace>
where
    R: PlaceRepo + SavedPlaceRepo,
{
    let place = repo.get_place(place_id)?;
    let saved = SavedPlace {
        user_id: user_id.clone(),
        place_id: place.id,
        notes: notes.map(|n| n.trim().to_owned()).unwrap_or_default(),
        saved_at: now,
    };
    repo.save_place(&saved)?;
    Ok(saved)
}

pub fn unsave_place<R: SavedPlaceRepo>(repo: &R, user_id: &Id, place_id: &Id) -> Result<()> {
    Ok(repo.unsave_place(user_id, place_id)?)
}

pub fn load_saved_places<R>(repo: &R, user_id: &Id) -> Result<Vec<(SavedPlace, Place)>>
where
    R: PlaceRepo + SavedPlaceRepo,
{
    let mut saved = repo.load_saved_places(user_id)?;
    saved.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
    let ids: Vec<_> = saved.iter().map(|s| s.place_id.clone()).collect();
    let places = repo.get_places(&ids)?;
    Ok(saved
        .into_iter()
        .filter_map(|s| {
            places
                .iter()
                .find(|p| p.id == s.place_id)
                .cloned()
                .map(|p| (s, p))
        })
        .collect())
}
