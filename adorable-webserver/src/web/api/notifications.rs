use super::*;

#[get("/notifications?<unread>&<limit>")]
pub fn get_notifications(
    connections: sqlite::Connections,
    account: Account,
    unread: Option<bool>,
    limit: Option<u32>,
) -> Result<Vec<json::Notification>> {
    let notifications = usecases::load_notifications(
        &connections.shared()?,
        account.id(),
        unread.unwrap_or(false),
        limit,
    )?;
    Ok(Json(notifications.into_iter().map(Into::into).collect()))
}

#[post("/notifications/<id>/read")]
pub fn post_read(
    connections: sqlite::Connections,
    account: Account,
    id: &str,
) -> Result<json::Notification> {
    let notification = connections
        .transaction(|db| usecases::mark_notification_read(db, account.id(), &id.into()))?;
    Ok(Json(notification.into()))
}

#[post("/notifications/read-all")]
pub fn post_read_all(connections: sqlite::Connections, account: Account) -> StatusResult {
    let count =
        connections.transaction(|db| usecases::mark_all_notifications_read(db, account.id()))?;
    debug!("Marked {count} notification(s) of user {} as read", account.id());
    Ok(Status::NoContent)
}

#[delete("/notifications/<id>")]
pub fn delete_notification(
    connections: sqlite::Connections,
    account: Account,
    id: &str,
) -> StatusResult {
    connections.transaction(|db| usecases::delete_notification(db, account.id(), &id.into()))?;
    Ok(Status::NoContent)
}
