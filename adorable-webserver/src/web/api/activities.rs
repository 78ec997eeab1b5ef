use super::*;

#[get("/activities?<limit>")]
pub fn get_own_activities(
    connections: sqlite::Connections,
    account: Account,
    limit: Option<u32>,
) -> Result<Vec<json::Activity>> {
    let activities = usecases::load_own_activities(&connections.shared()?, account.id(), limit)?;
    Ok(Json(activities.into_iter().map(Into::into).collect()))
}

/// Activities of everyone the caller follows, newest first.
#[get("/activities/feed?<limit>")]
pub fn get_feed(
    connections: sqlite::Connections,
    account: Account,
    limit: Option<u32>,
) -> Result<Vec<json::Activity>> {
    let activities = usecases::load_activity_feed(&connections.shared()?, account.id(), limit)?;
    Ok(Json(activities.into_iter().map(Into::into).collect()))
}
