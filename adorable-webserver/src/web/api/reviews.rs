use super::*;

#[post("/reviews", format = "application/json", data = "<review>")]
pub fn post_review(
    connections: sqlite::Connections,
    account: Account,
    dispatcher: &State<EventDispatcher>,
    review: JsonResult<json::NewReview>,
) -> Result<json::Review> {
    let new_review = from_json::new_review(review?.into_inner());
    let review = flows::create_review(&connections, dispatcher, account.id(), new_review)?;
    Ok(Json(review.into()))
}

#[get("/reviews/<id>")]
pub fn get_review(
    _throttle: Throttle,
    connections: sqlite::Connections,
    id: &str,
) -> Result<json::Review> {
    let review = usecases::get_review(&connections.shared()?, &id.into())?;
    Ok(Json(review.into()))
}

#[put("/reviews/<id>", format = "application/json", data = "<review>")]
pub fn put_review(
    connections: sqlite::Connections,
    account: Account,
    dispatcher: &State<EventDispatcher>,
    id: &str,
    review: JsonResult<json::UpdateReview>,
) -> Result<json::Review> {
    let json::UpdateReview { rating, review } = review?.into_inner();
    let review = flows::update_review(
        &connections,
        dispatcher,
        account.user(),
        &id.into(),
        rating,
        &review,
    )?;
    Ok(Json(review.into()))
}

#[delete("/reviews/<id>")]
pub fn delete_review(
    connections: sqlite::Connections,
    account: Account,
    dispatcher: &State<EventDispatcher>,
    id: &str,
) -> StatusResult {
    flows::delete_review(&connections, dispatcher, account.user(), &id.into())?;
    Ok(Status::NoContent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::{
        api::tests::prelude::*,
        tests::{login, register_user},
    };

    fn create_place(client: &Client, token: &str) -> json::Place {
        client
            .post("/places")
            .header(ContentType::JSON)
            .header(bearer(token))
            .body(r#"{"name":"Bakery"}"#)
            .dispatch()
            .into_json()
            .unwrap()
    }

    fn post_review(client: &Client, token: &str, place_id: &str, rating: i64) -> LocalResponse<'_> {
        client
            .post("/reviews")
            .header(ContentType::JSON)
            .header(bearer(token))
            .body(format!(
                r#"{{"place_id":"{place_id}","rating":{rating},"review":"Tasty"}}"#
            ))
            .dispatch()
    }

    #[test]
    fn reviews_update_the_place_rating() {
        let (client, db) = setup();
        register_user(&db, "alice", "alice@example.com", "secret123");
        register_user(&db, "bob", "bob@example.com", "secret123");
        let alice = login(&client, "alice@example.com", "secret123");
        let bob = login(&client, "bob@example.com", "secret123");
        let place = create_place(&client, &alice);

        let res = post_review(&client, &alice, &place.id, 4);
        assert_eq!(res.status(), Status::Ok);
        let review: json::Review = res.into_json().unwrap();
        assert_eq!(4, review.rating);
        assert_eq!(Status::Ok, post_review(&client, &bob, &place.id, 2).status());

        let place: json::Place = client
            .get(format!("/places/{}", place.id))
            .dispatch()
            .into_json()
            .unwrap();
        assert_eq!(3.0, place.rating);
        assert_eq!(2, place.total_ratings);

        let reviews: Vec<json::Review> = client
            .get(format!("/places/{}/reviews", place.id))
            .dispatch()
            .into_json()
            .unwrap();
        assert_eq!(2, reviews.len());

        let res = client
            .put(format!("/reviews/{}", review.id))
            .header(ContentType::JSON)
            .header(bearer(&bob))
            .body(r#"{"rating":1}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Forbidden);

        let res = client
            .put(format!("/reviews/{}", review.id))
            .header(ContentType::JSON)
            .header(bearer(&alice))
            .body(r#"{"rating":5,"review":"Even better"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        let updated: json::Review = res.into_json().unwrap();
        assert_eq!("Even better", updated.review);

        let res = client
            .delete(format!("/reviews/{}", review.id))
            .header(bearer(&alice))
            .dispatch();
        assert_eq!(res.status(), Status::NoContent);
        let place: json::Place = client
            .get(format!("/places/{}", place.id))
            .dispatch()
            .into_json()
            .unwrap();
        assert_eq!(2.0, place.rating);
        assert_eq!(1, place.total_ratings);
    }

    #[test]
    fn reject_invalid_and_duplicate_reviews() {
        let (client, db) = setup();
        register_user(&db, "alice", "alice@example.com", "secret123");
        let token = login(&client, "alice@example.com", "secret123");
        let place = create_place(&client, &token);

        let res = post_review(&client, &token, &place.id, 6);
        assert_eq!(res.status(), Status::BadRequest);
        let err: json::Error = res.into_json().unwrap();
        assert_eq!(json::ErrorCode::ValidationError, err.error.code);

        assert_eq!(Status::Ok, post_review(&client, &token, &place.id, 3).status());
        assert_eq!(
            Status::BadRequest,
            post_review(&client, &token, &place.id, 3).status()
        );
        assert_eq!(
            Status::NotFound,
            post_review(&client, &token, "unknown", 3).status()
        );
    }
}
