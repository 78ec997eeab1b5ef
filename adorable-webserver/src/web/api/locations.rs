use rocket::FromForm;

use super::*;

#[derive(Debug, FromForm)]
pub struct LocationFilter<'r> {
    #[field(name = "type")]
    kind: Option<&'r str>,
    is_primary: Option<bool>,
    q: Option<&'r str>,
}

impl LocationFilter<'_> {
    fn try_into_query(self) -> result::Result<LocationQuery, ApiError> {
        let Self { kind, is_primary, q } = self;
        let kind = kind
            .map(str::parse::<LocationType>)
            .transpose()
            .map_err(|_| ApiError::invalid("Invalid location type"))?;
        Ok(LocationQuery {
            kind,
            is_primary,
            text: q.map(ToOwned::to_owned),
        })
    }
}

#[get("/locations?<filter..>")]
pub fn get_locations(
    connections: sqlite::Connections,
    account: Account,
    filter: LocationFilter<'_>,
) -> Result<Vec<json::Location>> {
    let query = filter.try_into_query()?;
    let locations = usecases::list_locations(&connections.shared()?, account.id(), &query)?;
    Ok(Json(locations.into_iter().map(Into::into).collect()))
}

#[post("/locations", format = "application/json", data = "<location>")]
pub fn post_location(
    connections: sqlite::Connections,
    account: Account,
    location: JsonResult<json::NewLocation>,
) -> Result<json::Location> {
    let new_location = from_json::new_location(location?.into_inner());
    let location = connections.transaction(|db| {
        usecases::create_location(db, account.id(), new_location, Timestamp::now())
    })?;
    Ok(Json(location.into()))
}

#[get("/locations/primary")]
pub fn get_primary_location(
    connections: sqlite::Connections,
    account: Account,
) -> Result<json::Location> {
    let location = usecases::get_primary_location(&connections.shared()?, account.id())?;
    Ok(Json(location.into()))
}

#[get("/locations/<id>")]
pub fn get_location(
    connections: sqlite::Connections,
    account: Account,
    id: &str,
) -> Result<json::Location> {
    let location = usecases::get_location(&connections.shared()?, account.id(), &id.into())?;
    Ok(Json(location.into()))
}

#[put("/locations/<id>", format = "application/json", data = "<location>")]
pub fn put_location(
    connections: sqlite::Connections,
    account: Account,
    id: &str,
    location: JsonResult<json::NewLocation>,
) -> Result<json::Location> {
    let update = from_json::new_location(location?.into_inner());
    let location = connections.transaction(|db| {
        usecases::update_location(db, account.id(), &id.into(), update, Timestamp::now())
    })?;
    Ok(Json(location.into()))
}

#[delete("/locations/<id>")]
pub fn delete_location(
    connections: sqlite::Connections,
    account: Account,
    id: &str,
) -> StatusResult {
    connections.transaction(|db| usecases::delete_location(db, account.id(), &id.into()))?;
    Ok(Status::NoContent)
}

#[post("/locations/<id>/primary")]
pub fn post_primary_location(
    connections: sqlite::Connections,
    account: Account,
    id: &str,
) -> Result<json::Location> {
    let location = connections.transaction(|db| {
        usecases::set_primary_location(db, account.id(), &id.into(), Timestamp::now())
    })?;
    Ok(Json(location.into()))
}
