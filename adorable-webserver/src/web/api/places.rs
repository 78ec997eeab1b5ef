use super::*;

#[get("/places?<q>&<category>&<bbox>&<limit>")]
pub fn search_places(
    _throttle: Throttle,
    connections: sqlite::Connections,
    index: &State<SearchIndex>,
    q: Option<String>,
    category: Option<String>,
    bbox: Option<&str>,
    limit: Option<u32>,
) -> Result<Vec<json::Place>> {
    let bbox = bbox
        .map(str::parse::<MapBbox>)
        .transpose()
        .map_err(|_| ApiError::invalid("Invalid bounding box"))?;
    let query = PlaceQuery {
        text: q.filter(|q| !q.trim().is_empty()),
        category: category.filter(|c| !c.trim().is_empty()),
        bbox,
        limit,
    };
    let places = usecases::search_places(&connections.shared()?, &*index.0, query)?;
    Ok(Json(places.into_iter().map(Into::into).collect()))
}

#[post("/places", format = "application/json", data = "<place>")]
pub fn post_place(
    connections: sqlite::Connections,
    account: Account,
    dispatcher: &State<EventDispatcher>,
    place: JsonResult<json::NewPlace>,
) -> Result<json::Place> {
    let new_place = from_json::new_place(place?.into_inner());
    let place = flows::create_place(&connections, dispatcher, account.user(), new_place)?;
    Ok(Json(place.into()))
}

#[get("/places/popular?<limit>")]
pub fn get_popular_places(
    _throttle: Throttle,
    connections: sqlite::Connections,
    limit: Option<u32>,
) -> Result<Vec<json::Place>> {
    let places = usecases::popular_places(&connections.shared()?, limit)?;
    Ok(Json(places.into_iter().map(Into::into).collect()))
}

#[get("/places/<id>")]
pub fn get_place(
    _throttle: Throttle,
    connections: sqlite::Connections,
    id: &str,
) -> Result<json::Place> {
    let place = usecases::get_place(&connections.shared()?, &id.into())?;
    Ok(Json(place.into()))
}

#[put("/places/<id>", format = "application/json", data = "<place>")]
pub fn put_place(
    connections: sqlite::Connections,
    account: Account,
    dispatcher: &State<EventDispatcher>,
    id: &str,
    place: JsonResult<json::NewPlace>,
) -> Result<json::Place> {
    let update = from_json::new_place(place?.into_inner());
    let place = flows::update_place(&connections, dispatcher, account.user(), &id.into(), update)?;
    Ok(Json(place.into()))
}

#[delete("/places/<id>")]
pub fn delete_place(
    connections: sqlite::Connections,
    account: Account,
    dispatcher: &State<EventDispatcher>,
    id: &str,
) -> StatusResult {
    flows::delete_place(&connections, dispatcher, account.user(), &id.into())?;
    Ok(Status::NoContent)
}

#[get("/places/<id>/reviews")]
pub fn get_reviews_of_place(
    _throttle: Throttle,
    connections: sqlite::Connections,
    id: &str,
) -> Result<Vec<json::Review>> {
    let reviews = usecases::load_reviews_of_place(&connections.shared()?, &id.into())?;
    Ok(Json(reviews.into_iter().map(Into::into).collect()))
}

#[post("/places/<id>/save", data = "<data>")]
pub fn post_save_place(
    connections: sqlite::Connections,
    account: Account,
    dispatcher: &State<EventDispatcher>,
    id: &str,
    data: Option<Json<json::SavePlace>>,
) -> Result<json::SavedPlace> {
    let notes = data
        .map(|data| data.into_inner().notes)
        .filter(|notes| !notes.is_empty());
    let place_id = Id::from(id);
    let saved = flows::save_place(&connections, dispatcher, account.id(), &place_id, notes)?;
    let place = usecases::get_place(&connections.shared()?, &place_id)?;
    Ok(Json((saved, place).into()))
}

#[delete("/places/<id>/save")]
pub fn delete_saved_place(
    connections: sqlite::Connections,
    account: Account,
    id: &str,
) -> StatusResult {
    connections.transaction(|db| usecases::unsave_place(db, account.id(), &id.into()))?;
    Ok(Status::NoContent)
}

#[get("/saved-places")]
pub fn get_saved_places(
    connections: sqlite::Connections,
    account: Account,
) -> Result<Vec<json::SavedPlace>> {
    let saved = usecases::load_saved_places(&connections.shared()?, account.id())?;
    Ok(Json(saved.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::{
        api::tests::prelude::*,
        tests::{login, register_staff, register_user},
    };

    #[test]
    fn create_and_search_places() {
        let (client, db) = setup();
        register_user(&db, "alice", "alice@example.com", "secret123");
        let token = login(&client, "alice@example.com", "secret123");

        let res = client
            .post("/places")
            .header(ContentType::JSON)
            .header(bearer(&token))
            .body(r#"{"name":"Blue Bottle","description":"Coffee","lat":48.1,"lng":11.5,"category":"cafe","tags":["Coffee"],"rating":5.0}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        test_json(&res);
        let cafe: json::Place = res.into_json().unwrap();
        assert_eq!(0.0, cafe.rating);
        assert_eq!(0, cafe.total_ratings);
        assert!(cafe.created_by.is_some());

        client
            .post("/places")
            .header(ContentType::JSON)
            .header(bearer(&token))
            .body(r#"{"name":"City Park","lat":48.2,"lng":11.6,"category":"park"}"#)
            .dispatch();

        let res = client.get("/places?q=coffee").dispatch();
        assert_eq!(res.status(), Status::Ok);
        let places: Vec<json::Place> = res.into_json().unwrap();
        assert_eq!(vec![cafe.id.clone()], places.into_iter().map(|p| p.id).collect::<Vec<_>>());

        let res = client.get("/places?category=park").dispatch();
        let places: Vec<json::Place> = res.into_json().unwrap();
        assert_eq!(1, places.len());
        assert_eq!("City Park", places[0].name);

        let res = client.get("/places?bbox=48.0,11.4,48.15,11.55").dispatch();
        let places: Vec<json::Place> = res.into_json().unwrap();
        assert_eq!(1, places.len());
        assert_eq!(cafe.id, places[0].id);

        let res = client.get("/places?bbox=nonsense").dispatch();
        assert_eq!(res.status(), Status::BadRequest);
    }

    #[test]
    fn only_creator_or_staff_may_change_places() {
        let (client, db) = setup();
        register_user(&db, "alice", "alice@example.com", "secret123");
        register_user(&db, "bob", "bob@example.com", "secret123");
        register_staff(&db, "carol", "carol@example.com", "secret123");
        let alice = login(&client, "alice@example.com", "secret123");
        let bob = login(&client, "bob@example.com", "secret123");
        let carol = login(&client, "carol@example.com", "secret123");

        let place: json::Place = client
            .post("/places")
            .header(ContentType::JSON)
            .header(bearer(&alice))
            .body(r#"{"name":"Old name"}"#)
            .dispatch()
            .into_json()
            .unwrap();

        let res = client
            .put(format!("/places/{}", place.id))
            .header(ContentType::JSON)
            .header(bearer(&bob))
            .body(r#"{"name":"Hijacked"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Forbidden);
        let err: json::Error = res.into_json().unwrap();
        assert_eq!(json::ErrorCode::PermissionError, err.error.code);

        let res = client
            .put(format!("/places/{}", place.id))
            .header(ContentType::JSON)
            .header(bearer(&alice))
            .body(r#"{"name":"New name"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        let updated: json::Place = res.into_json().unwrap();
        assert_eq!("New name", updated.name);

        let res = client
            .delete(format!("/places/{}", place.id))
            .header(bearer(&carol))
            .dispatch();
        assert_eq!(res.status(), Status::NoContent);
        let res = client.get(format!("/places/{}", place.id)).dispatch();
        assert_eq!(res.status(), Status::NotFound);
        let err: json::Error = res.into_json().unwrap();
        assert_eq!(json::ErrorCode::NotFound, err.error.code);
    }

    #[test]
    fn save_and_unsave_places() {
        let (client, db) = setup();
        register_user(&db, "alice", "alice@example.com", "secret123");
        let token = login(&client, "alice@example.com", "secret123");
        let place: json::Place = client
            .post("/places")
            .header(ContentType::JSON)
            .header(bearer(&token))
            .body(r#"{"name":"Museum"}"#)
            .dispatch()
            .into_json()
            .unwrap();

        let res = client
            .post(format!("/places/{}/save", place.id))
            .header(ContentType::JSON)
            .header(bearer(&token))
            .body(r#"{"notes":"Go on sunday"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        let saved: json::SavedPlace = res.into_json().unwrap();
        assert_eq!("Go on sunday", saved.notes);
        assert_eq!(place.id, saved.place.id);

        let res = client
            .get("/saved-places")
            .header(bearer(&token))
            .dispatch();
        let saved: Vec<json::SavedPlace> = res.into_json().unwrap();
        assert_eq!(1, saved.len());

        let res = client
            .delete(format!("/places/{}/save", place.id))
            .header(bearer(&token))
            .dispatch();
        assert_eq!(res.status(), Status::NoContent);
        let saved: Vec<json::SavedPlace> = client
            .get("/saved-places")
            .header(bearer(&token))
            .dispatch()
            .into_json()
            .unwrap();
        assert!(saved.is_empty());
    }

    #[test]
    fn popular_places_without_login() {
        let (client, _) = setup();
        let res = client.get("/places/popular").dispatch();
        assert_eq!(res.status(), Status::Ok);
        let places: Vec<json::Place> = res.into_json().unwrap();
        assert!(places.is_empty());
        let res = client.get("/places/popular?limit=0").dispatch();
        assert_eq!(res.status(), Status::BadRequest);
    }
}
