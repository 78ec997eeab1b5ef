use super::*;

impl<C> ReviewRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn create_review(&self, review: &PlaceReview) -> Result<()> {
        create_review(&mut self.sqlite_conn(), review)
    }
    fn update_review(&self, review: &PlaceReview) -> Result<()> {
        update_review(&mut self.sqlite_conn(), review)
    }
    fn delete_review(&self, id: &Id) -> Result<()> {
        delete_review(&mut self.sqlite_conn(), id)
    }

    fn get_review(&self, id: &Id) -> Result<PlaceReview> {
        get_review(&mut self.sqlite_conn(), id)
    }
    fn try_get_review_by_user(&self, place_id: &Id, user_id: &Id) -> Result<Option<PlaceReview>> {
        try_get_review_by_user(&mut self.sqlite_conn(), place_id, user_id)
    }
    fn load_reviews_of_place(&self, place_id: &Id) -> Result<Vec<PlaceReview>> {
        load_reviews_of_place(&mut self.sqlite_conn(), place_id)
    }
    fn count_reviews_of_place_since(&self, place_id: &Id, since: Timestamp) -> Result<usize> {
        count_reviews_of_place_since(&mut self.sqlite_conn(), place_id, since)
    }
}

impl From<&PlaceReview> for models::ReviewEntity {
    fn from(r: &PlaceReview) -> Self {
        Self {
            id: r.id.to_string(),
            place_id: r.place_id.to_string(),
            user_id: r.user_id.to_string(),
            rating: i16::from(u8::from(r.rating)),
            review: r.review.clone(),
            created_at: r.created_at.as_millis(),
            updated_at: r.updated_at.as_millis(),
        }
    }
}

impl TryFrom<models::ReviewEntity> for PlaceReview {
    type Error = repo::Error;

    fn try_from(from: models::ReviewEntity) -> Result<Self> {
        let models::ReviewEntity {
            id,
            place_id,
            user_id,
            rating,
            review,
            created_at,
            updated_at,
        } = from;
        let rating = RatingValue::try_from(i64::from(rating)).map_err(anyhow::Error::from)?;
        Ok(Self {
            id: id.into(),
            place_id: place_id.into(),
            user_id: user_id.into(),
            rating,
            review,
            created_at: Timestamp::from_millis(created_at),
            updated_at: Timestamp::from_millis(updated_at),
        })
    }
}

fn create_review(conn: &mut SqliteConnection, review: &PlaceReview) -> Result<()> {
    diesel::insert_into(schema::place_reviews::table)
        .values(&models::ReviewEntity::from(review))
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn update_review(conn: &mut SqliteConnection, review: &PlaceReview) -> Result<()> {
    use schema::place_reviews::dsl;
    let entity = models::ReviewEntity::from(review);
    let count = diesel::update(dsl::place_reviews.filter(dsl::id.eq(&entity.id)))
        .set(&entity)
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn delete_review(conn: &mut SqliteConnection, id: &Id) -> Result<()> {
    use schema::place_reviews::dsl;
    let count = diesel::delete(dsl::place_reviews.filter(dsl::id.eq(id.as_str())))
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn get_review(conn: &mut SqliteConnection, id: &Id) -> Result<PlaceReview> {
    use schema::place_reviews::dsl;
    dsl::place_reviews
        .filter(dsl::id.eq(id.as_str()))
        .first::<models::ReviewEntity>(conn)
        .map_err(from_diesel_err)?
        .try_into()
}

fn try_get_review_by_user(
    conn: &mut SqliteConnection,
    place_id: &Id,
    user_id: &Id,
) -> Result<Option<PlaceReview>> {
    use schema::place_reviews::dsl;
    dsl::place_reviews
        .filter(dsl::place_id.eq(place_id.as_str()))
        .filter(dsl::user_id.eq(user_id.as_str()))
        .first::<models::ReviewEntity>(conn)
        .optional()
        .map_err(from_diesel_err)?
        .map(TryInto::try_into)
        .transpose()
}

fn load_reviews_of_place(conn: &mut SqliteConnection, place_id: &Id) -> Result<Vec<PlaceReview>> {
    use schema::place_reviews::dsl;
    dsl::place_reviews
        .filter(dsl::place_id.eq(place_id.as_str()))
        .order_by(dsl::created_at.desc())
        .load::<models::ReviewEntity>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}

fn count_reviews_of_place_since(
    conn: &mut SqliteConnection,
    place_id: &Id,
    since: Timestamp,
) -> Result<usize> {
    use schema::place_reviews::dsl;
    Ok(dsl::place_reviews
        .select(diesel::dsl::count(dsl::id))
        .filter(dsl::place_id.eq(place_id.as_str()))
        .filter(dsl::created_at.ge(since.as_millis()))
        .first::<i64>(conn)
        .map_err(from_diesel_err)? as usize)
}
