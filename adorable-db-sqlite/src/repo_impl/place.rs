use super::*;

impl<C> PlaceRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn create_place(&self, place: &Place) -> Result<()> {
        create_place(&mut self.sqlite_conn(), place)
    }
    fn update_place(&self, place: &Place) -> Result<()> {
        update_place(&mut self.sqlite_conn(), place)
    }
    fn delete_place(&self, id: &Id) -> Result<()> {
        delete_place(&mut self.sqlite_conn(), id)
    }

    fn get_place(&self, id: &Id) -> Result<Place> {
        get_place(&mut self.sqlite_conn(), id)
    }
    fn get_places(&self, ids: &[Id]) -> Result<Vec<Place>> {
        get_places(&mut self.sqlite_conn(), ids)
    }
    fn all_places(&self) -> Result<Vec<Place>> {
        all_places(&mut self.sqlite_conn())
    }
    fn query_places(&self, query: &PlaceQuery) -> Result<Vec<Place>> {
        query_places(&mut self.sqlite_conn(), query)
    }
    fn most_popular_places(&self, limit: u32) -> Result<Vec<Place>> {
        most_popular_places(&mut self.sqlite_conn(), limit)
    }
    fn count_places(&self) -> Result<usize> {
        count_places(&mut self.sqlite_conn())
    }
}

impl<C> SavedPlaceRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn save_place(&self, saved: &SavedPlace) -> Result<()> {
        save_place(&mut self.sqlite_conn(), saved)
    }
    fn unsave_place(&self, user_id: &Id, place_id: &Id) -> Result<()> {
        unsave_place(&mut self.sqlite_conn(), user_id, place_id)
    }
    fn load_saved_places(&self, user_id: &Id) -> Result<Vec<SavedPlace>> {
        load_saved_places(&mut self.sqlite_conn(), user_id)
    }
}

impl From<&Place> for models::PlaceEntity {
    fn from(p: &Place) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.clone(),
            description: p.description.clone(),
            address: p.address.clone(),
            lat: p.pos.map(MapPoint::lat),
            lng: p.pos.map(MapPoint::lng),
            category: p.category.clone(),
            rating: p.rating.into(),
            total_ratings: p.total_ratings as i32,
            ranking_score: p.ranking_score,
            created_by: p.created_by.as_ref().map(ToString::to_string),
            created_at: p.created_at.as_millis(),
            updated_at: p.updated_at.as_millis(),
        }
    }
}

fn load_place(conn: &mut SqliteConnection, place: models::PlaceEntity) -> Result<Place> {
    let models::PlaceEntity {
        id,
        name,
        description,
        address,
        lat,
        lng,
        category,
        rating,
        total_ratings,
        ranking_score,
        created_by,
        created_at,
        updated_at,
    } = place;
    let tags = load_place_tags(conn, &id)?;
    Ok(Place {
        id: id.into(),
        name,
        description,
        address,
        pos: load_pos(lat, lng)?,
        category,
        tags,
        rating: rating.into(),
        total_ratings: total_ratings.max(0) as u32,
        ranking_score,
        created_by: created_by.map(Into::into),
        created_at: Timestamp::from_millis(created_at),
        updated_at: Timestamp::from_millis(updated_at),
    })
}

fn load_places(
    conn: &mut SqliteConnection,
    places: Vec<models::PlaceEntity>,
) -> Result<Vec<Place>> {
    places
        .into_iter()
        .map(|place| load_place(conn, place))
        .collect()
}

fn load_place_tags(conn: &mut SqliteConnection, place_id: &str) -> Result<Vec<String>> {
    use schema::place_tags::dsl;
    dsl::place_tags
        .select(dsl::tag)
        .filter(dsl::place_id.eq(place_id))
        .order_by(dsl::tag)
        .load(conn)
        .map_err(from_diesel_err)
}

fn store_place_tags(conn: &mut SqliteConnection, place_id: &str, tags: &[String]) -> Result<()> {
    use schema::place_tags::dsl;
    diesel::delete(dsl::place_tags.filter(dsl::place_id.eq(place_id)))
        .execute(conn)
        .map_err(from_diesel_err)?;
    let rows: Vec<_> = tags
        .iter()
        .map(|tag| models::PlaceTag {
            place_id: place_id.to_owned(),
            tag: tag.clone(),
        })
        .collect();
    if rows.is_empty() {
        return Ok(());
    }
    diesel::insert_or_ignore_into(schema::place_tags::table)
        .values(&rows)
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn create_place(conn: &mut SqliteConnection, place: &Place) -> Result<()> {
    let new_place = models::PlaceEntity::from(place);
    diesel::insert_into(schema::places::table)
        .values(&new_place)
        .execute(conn)
        .map_err(from_diesel_err)?;
    store_place_tags(conn, &new_place.id, &place.tags)
}

fn update_place(conn: &mut SqliteConnection, place: &Place) -> Result<()> {
    use schema::places::dsl;
    let entity = models::PlaceEntity::from(place);
    let count = diesel::update(dsl::places.filter(dsl::id.eq(&entity.id)))
        .set(&entity)
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)?;
    store_place_tags(conn, &entity.id, &place.tags)
}

fn delete_place(conn: &mut SqliteConnection, id: &Id) -> Result<()> {
    use schema::places::dsl;
    let count = diesel::delete(dsl::places.filter(dsl::id.eq(id.as_str())))
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn get_place(conn: &mut SqliteConnection, id: &Id) -> Result<Place> {
    use schema::places::dsl;
    let place = dsl::places
        .filter(dsl::id.eq(id.as_str()))
        .first::<models::PlaceEntity>(conn)
        .map_err(from_diesel_err)?;
    load_place(conn, place)
}

fn get_places(conn: &mut SqliteConnection, ids: &[Id]) -> Result<Vec<Place>> {
    use schema::places::dsl;
    let places = dsl::places
        .filter(dsl::id.eq_any(ids_to_strings(ids)))
        .load::<models::PlaceEntity>(conn)
        .map_err(from_diesel_err)?;
    load_places(conn, places)
}

fn all_places(conn: &mut SqliteConnection) -> Result<Vec<Place>> {
    use schema::places::dsl;
    let places = dsl::places
        .order_by(dsl::created_at)
        .load::<models::PlaceEntity>(conn)
        .map_err(from_diesel_err)?;
    load_places(conn, places)
}

fn query_places(conn: &mut SqliteConnection, query: &PlaceQuery) -> Result<Vec<Place>> {
    use schema::places::dsl;
    let mut sql = dsl::places.into_boxed();
    if let Some(text) = query.text.as_deref().filter(|t| !t.trim().is_empty()) {
        let pattern = like_pattern(text);
        sql = sql.filter(
            dsl::name
                .like(pattern.clone())
                .or(dsl::description.like(pattern)),
        );
    }
    if let Some(bbox) = &query.bbox {
        // Only the latitude can be restricted in SQL, because
        // the longitude range might cross the antimeridian.
        sql = sql
            .filter(dsl::lat.ge(bbox.south_west().lat()))
            .filter(dsl::lat.le(bbox.north_east().lat()));
    }
    let places = sql
        .order_by(dsl::ranking_score.desc())
        .load::<models::PlaceEntity>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .filter(|p| {
            query
                .category
                .as_ref()
                .map(|c| c.eq_ignore_ascii_case(&p.category))
                .unwrap_or(true)
        })
        .filter(|p| match (&query.bbox, p.lat, p.lng) {
            (Some(bbox), Some(lat), Some(lng)) => MapPoint::try_from_lat_lng(lat, lng)
                .map(|pos| bbox.contains_point(pos))
                .unwrap_or(false),
            (Some(_), _, _) => false,
            (None, _, _) => true,
        })
        .take(query.limit.map(|l| l as usize).unwrap_or(usize::MAX))
        .collect();
    load_places(conn, places)
}

fn most_popular_places(conn: &mut SqliteConnection, limit: u32) -> Result<Vec<Place>> {
    use schema::places::dsl;
    let places = dsl::places
        .order_by(dsl::ranking_score.desc())
        .limit(to_limit(limit))
        .load::<models::PlaceEntity>(conn)
        .map_err(from_diesel_err)?;
    load_places(conn, places)
}

fn count_places(conn: &mut SqliteConnection) -> Result<usize> {
    use schema::places::dsl;
    Ok(dsl::places
        .select(diesel::dsl::count(dsl::id))
        .first::<i64>(conn)
        .map_err(from_diesel_err)? as usize)
}

fn save_place(conn: &mut SqliteConnection, saved: &SavedPlace) -> Result<()> {
    use schema::saved_places::dsl;
    let SavedPlace {
        user_id,
        place_id,
        notes,
        saved_at,
    } = saved;
    let count = diesel::update(
        dsl::saved_places
            .filter(dsl::user_id.eq(user_id.as_str()))
            .filter(dsl::place_id.eq(place_id.as_str())),
    )
    .set(dsl::notes.eq(notes))
    .execute(conn)
    .map_err(from_diesel_err)?;
    if count > 0 {
        return Ok(());
    }
    diesel::insert_into(schema::saved_places::table)
        .values(&models::SavedPlaceEntity {
            user_id: user_id.to_string(),
            place_id: place_id.to_string(),
            notes: notes.clone(),
            saved_at: saved_at.as_millis(),
        })
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn unsave_place(conn: &mut SqliteConnection, user_id: &Id, place_id: &Id) -> Result<()> {
    use schema::saved_places::dsl;
    let count = diesel::delete(
        dsl::saved_places
            .filter(dsl::user_id.eq(user_id.as_str()))
            .filter(dsl::place_id.eq(place_id.as_str())),
    )
    .execute(conn)
    .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn load_saved_places(conn: &mut SqliteConnection, user_id: &Id) -> Result<Vec<SavedPlace>> {
    use schema::saved_places::dsl;
    Ok(dsl::saved_places
        .filter(dsl::user_id.eq(user_id.as_str()))
        .order_by(dsl::saved_at.desc())
        .load::<models::SavedPlaceEntity>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(
            |models::SavedPlaceEntity {
                 user_id,
                 place_id,
                 notes,
                 saved_at,
             }| SavedPlace {
                user_id: user_id.into(),
                place_id: place_id.into(),
                notes,
                saved_at: Timestamp::from_millis(saved_at),
            },
        )
        .collect())
}
