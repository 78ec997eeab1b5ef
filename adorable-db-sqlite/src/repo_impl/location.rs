use super::*;

impl<C> LocationRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn create_location(&self, location: &Location) -> Result<()> {
        create_location(&mut self.sqlite_conn(), location)
    }
    fn update_location(&self, location: &Location) -> Result<()> {
        update_location(&mut self.sqlite_conn(), location)
    }
    fn delete_location(&self, id: &Id) -> Result<()> {
        delete_location(&mut self.sqlite_conn(), id)
    }

    fn get_location(&self, id: &Id) -> Result<Location> {
        get_location(&mut self.sqlite_conn(), id)
    }
    fn load_locations_of_user(&self, user_id: &Id, query: &LocationQuery) -> Result<Vec<Location>> {
        load_locations_of_user(&mut self.sqlite_conn(), user_id, query)
    }
    fn clear_primary_locations(&self, user_id: &Id, keep: Option<&Id>) -> Result<usize> {
        clear_primary_locations(&mut self.sqlite_conn(), user_id, keep)
    }
}

impl From<&Location> for models::LocationEntity {
    fn from(l: &Location) -> Self {
        Self {
            id: l.id.to_string(),
            user_id: l.user_id.to_string(),
            name: l.name.clone(),
            address: l.address.clone(),
            lat: l.pos.map(MapPoint::lat),
            lng: l.pos.map(MapPoint::lng),
            kind: l.kind.as_ref().to_owned(),
            is_primary: l.is_primary,
            notes: l.notes.clone(),
            created_at: l.created_at.as_millis(),
            updated_at: l.updated_at.as_millis(),
        }
    }
}

impl TryFrom<models::LocationEntity> for Location {
    type Error = repo::Error;

    fn try_from(from: models::LocationEntity) -> Result<Self> {
        let models::LocationEntity {
            id,
            user_id,
            name,
            address,
            lat,
            lng,
            kind,
            is_primary,
            notes,
            created_at,
            updated_at,
        } = from;
        Ok(Self {
            id: id.into(),
            user_id: user_id.into(),
            name,
            address,
            pos: load_pos(lat, lng)?,
            kind: parse_enum(&kind)?,
            is_primary,
            notes,
            created_at: Timestamp::from_millis(created_at),
            updated_at: Timestamp::from_millis(updated_at),
        })
    }
}

fn create_location(conn: &mut SqliteConnection, location: &Location) -> Result<()> {
    diesel::insert_into(schema::locations::table)
        .values(&models::LocationEntity::from(location))
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn update_location(conn: &mut SqliteConnection, location: &Location) -> Result<()> {
    use schema::locations::dsl;
    let entity = models::LocationEntity::from(location);
    let count = diesel::update(dsl::locations.filter(dsl::id.eq(&entity.id)))
        .set(&entity)
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn delete_location(conn: &mut SqliteConnection, id: &Id) -> Result<()> {
    use schema::locations::dsl;
    let count = diesel::delete(dsl::locations.filter(dsl::id.eq(id.as_str())))
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn get_location(conn: &mut SqliteConnection, id: &Id) -> Result<Location> {
    use schema::locations::dsl;
    dsl::locations
        .filter(dsl::id.eq(id.as_str()))
        .first::<models::LocationEntity>(conn)
        .map_err(from_diesel_err)?
        .try_into()
}

fn load_locations_of_user(
    conn: &mut SqliteConnection,
    user_id: &Id,
    query: &LocationQuery,
) -> Result<Vec<Location>> {
    use schema::locations::dsl;
    let LocationQuery {
        kind,
        is_primary,
        text,
    } = query;
    let mut sql = dsl::locations
        .filter(dsl::user_id.eq(user_id.as_str()))
        .into_boxed();
    if let Some(kind) = kind {
        sql = sql.filter(dsl::kind.eq(kind.as_ref().to_owned()));
    }
    if let Some(is_primary) = is_primary {
        sql = sql.filter(dsl::is_primary.eq(*is_primary));
    }
    if let Some(text) = text.as_deref().filter(|t| !t.trim().is_empty()) {
        let pattern = like_pattern(text);
        sql = sql.filter(
            dsl::name
                .like(pattern.clone())
                .or(dsl::address.like(pattern)),
        );
    }
    sql.order_by((dsl::is_primary.desc(), dsl::created_at.desc()))
        .load::<models::LocationEntity>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}

fn clear_primary_locations(
    conn: &mut SqliteConnection,
    user_id: &Id,
    keep: Option<&Id>,
) -> Result<usize> {
    use schema::locations::dsl;
    let keep = keep.map(Id::as_str).unwrap_or_default();
    diesel::update(
        dsl::locations
            .filter(dsl::user_id.eq(user_id.as_str()))
            .filter(dsl::is_primary.eq(true))
            .filter(dsl::id.ne(keep)),
    )
    .set(dsl::is_primary.eq(false))
    .execute(conn)
    .map_err(from_diesel_err)
}
