use super::prelude::*;

#[derive(Debug, Clone)]
pub struct NewReview {
    pub place_id: Id,
    pub rating: i64,
    pub review: String,
}

const MAX_REVIEW_LEN: usize = 5000;

fn validate_text(review: &str) -> Result<String> {
    let review = review.trim();
    if review.chars().count() > MAX_REVIEW_LEN {
        return Err(Error::TextTooLong);
    }
    Ok(review.to_owned())
}

/// The rating of the place has to be recalculated afterwards.
pub fn create_review<R>(
    repo: &R,
    user_id: &Id,
    new_review: NewReview,
    now: Timestamp,
) -> Result<PlaceReview>
where
    R: PlaceRepo + ReviewRepo,
{
    let NewReview {
        place_id,
        rating,
        review,
    } = new_review;
    let rating = RatingValue::try_from(rating)?;
    let review = validate_text(&review)?;
    // The place must exist
    let place = repo.get_place(&place_id)?;
    if repo.try_get_review_by_user(&place.id, user_id)?.is_some() {
        return Err(Error::AlreadyReviewed);
    }
    let review = PlaceReview {
        id: Id::new(),
        place_id: place.id,
        user_id: user_id.clone(),
        rating,
        review,
        created_at: now,
        updated_at: now,
    };
    repo.create_review(&review).map_err(|err| match err {
        RepoError::AlreadyExists => Error::AlreadyReviewed,
        err => Error::Repo(err),
    })?;
    Ok(review)
}

pub fn get_review<R: ReviewRepo>(repo: &R, id: &Id) -> Result<PlaceReview> {
    Ok(repo.get_review(id)?)
}

pub fn update_review<R: ReviewRepo>(
    repo: &R,
    user: &User,
    id: &Id,
    rating: i64,
    review: &str,
    now: Timestamp,
) -> Result<PlaceReview> {
    let mut existing = repo.get_review(id)?;
    if existing.user_id != user.id {
        return Err(Error::Forbidden);
    }
    existing.rating = RatingValue::try_from(rating)?;
    existing.review = validate_text(review)?;
    existing.updated_at = now;
    repo.update_review(&existing)?;
    Ok(existing)
}

/// Authors may delete their own reviews, staff any review.
pub fn delete_review<R: ReviewRepo>(repo: &R, user: &User, id: &Id) -> Result<PlaceReview> {
    let review = repo.get_review(id)?;
    if review.user_id != user.id && !user.is_staff() {
        return Err(Error::Forbidden);
    }
    repo.delete_review(id)?;
    Ok(review)
}

/// Newest first.
pub fn load_reviews_of_place<R>(repo: &R, place_id: &Id) -> Result<Vec<PlaceReview>>
where
    R: PlaceRepo + ReviewRepo,
{
    let place = repo.get_place(place_id)?;
    let mut reviews = repo.load_reviews_of_place(&place.id)?;
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(reviews)
}
