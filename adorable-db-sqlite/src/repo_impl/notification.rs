use super::*;

impl<C> NotificationRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn create_notification(&self, notification: &Notification) -> Result<()> {
        create_notification(&mut self.sqlite_conn(), notification)
    }
    fn get_notification(&self, id: &Id) -> Result<Notification> {
        get_notification(&mut self.sqlite_conn(), id)
    }
    fn delete_notification(&self, id: &Id) -> Result<()> {
        delete_notification(&mut self.sqlite_conn(), id)
    }
    fn mark_notifications_read(&self, ids: &[Id]) -> Result<usize> {
        mark_notifications_read(&mut self.sqlite_conn(), ids)
    }
    fn mark_all_notifications_read(&self, user_id: &Id) -> Result<usize> {
        mark_all_notifications_read(&mut self.sqlite_conn(), user_id)
    }
    fn load_notifications(
        &self,
        user_id: &Id,
        unread_only: bool,
        limit: Option<u32>,
    ) -> Result<Vec<Notification>> {
        load_notifications(&mut self.sqlite_conn(), user_id, unread_only, limit)
    }
    fn load_unread_notifications_since(&self, since: Timestamp) -> Result<Vec<Notification>> {
        load_unread_notifications_since(&mut self.sqlite_conn(), since)
    }
}

fn create_notification(conn: &mut SqliteConnection, n: &Notification) -> Result<()> {
    let Notification {
        id,
        user_id,
        kind,
        title,
        message,
        data,
        is_read,
        action_url,
        created_at,
    } = n;
    diesel::insert_into(schema::notifications::table)
        .values(&models::NotificationEntity {
            id: id.to_string(),
            user_id: user_id.to_string(),
            kind: kind.as_ref().to_owned(),
            title: title.clone(),
            message: message.clone(),
            is_read: *is_read,
            action_url: action_url.clone(),
            created_at: created_at.as_millis(),
        })
        .execute(conn)
        .map_err(from_diesel_err)?;
    if data.is_empty() {
        return Ok(());
    }
    let rows: Vec<_> = data
        .iter()
        .map(|(key, value)| models::NotificationData {
            notification_id: id.to_string(),
            key: key.clone(),
            value: value.clone(),
        })
        .collect();
    diesel::insert_into(schema::notification_data::table)
        .values(&rows)
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn load_notification(
    conn: &mut SqliteConnection,
    notification: models::NotificationEntity,
) -> Result<Notification> {
    use schema::notification_data::dsl;
    let models::NotificationEntity {
        id,
        user_id,
        kind,
        title,
        message,
        is_read,
        action_url,
        created_at,
    } = notification;
    let data = dsl::notification_data
        .select((dsl::key, dsl::value))
        .filter(dsl::notification_id.eq(&id))
        .load::<(String, String)>(conn)
        .map_err(from_diesel_err)?;
    Ok(Notification {
        id: id.into(),
        user_id: user_id.into(),
        kind: parse_enum(&kind)?,
        title,
        message,
        data: payload_from_rows(data),
        is_read,
        action_url,
        created_at: Timestamp::from_millis(created_at),
    })
}

fn load_notification_list(
    conn: &mut SqliteConnection,
    notifications: Vec<models::NotificationEntity>,
) -> Result<Vec<Notification>> {
    notifications
        .into_iter()
        .map(|n| load_notification(conn, n))
        .collect()
}

fn get_notification(conn: &mut SqliteConnection, id: &Id) -> Result<Notification> {
    use schema::notifications::dsl;
    let notification = dsl::notifications
        .filter(dsl::id.eq(id.as_str()))
        .first::<models::NotificationEntity>(conn)
        .map_err(from_diesel_err)?;
    load_notification(conn, notification)
}

fn delete_notification(conn: &mut SqliteConnection, id: &Id) -> Result<()> {
    use schema::notifications::dsl;
    let count = diesel::delete(dsl::notifications.filter(dsl::id.eq(id.as_str())))
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn mark_notifications_read(conn: &mut SqliteConnection, ids: &[Id]) -> Result<usize> {
    use schema::notifications::dsl;
    diesel::update(
        dsl::notifications
            .filter(dsl::id.eq_any(ids_to_strings(ids)))
            .filter(dsl::is_read.eq(false)),
    )
    .set(dsl::is_read.eq(true))
    .execute(conn)
    .map_err(from_diesel_err)
}

fn mark_all_notifications_read(conn: &mut SqliteConnection, user_id: &Id) -> Result<usize> {
    use schema::notifications::dsl;
    diesel::update(
        dsl::notifications
            .filter(dsl::user_id.eq(user_id.as_str()))
            .filter(dsl::is_read.eq(false)),
    )
    .set(dsl::is_read.eq(true))
    .execute(conn)
    .map_err(from_diesel_err)
}

fn load_notifications(
    conn: &mut SqliteConnection,
    user_id: &Id,
    unread_only: bool,
    limit: Option<u32>,
) -> Result<Vec<Notification>> {
    use schema::notifications::dsl;
    let mut sql = dsl::notifications
        .filter(dsl::user_id.eq(user_id.as_str()))
        .order_by(dsl::created_at.desc())
        .into_boxed();
    if unread_only {
        sql = sql.filter(dsl::is_read.eq(false));
    }
    if let Some(limit) = limit {
        sql = sql.limit(to_limit(limit));
    }
    let notifications = sql
        .load::<models::NotificationEntity>(conn)
        .map_err(from_diesel_err)?;
    load_notification_list(conn, notifications)
}

fn load_unread_notifications_since(
    conn: &mut SqliteConnection,
    since: Timestamp,
) -> Result<Vec<Notification>> {
    use schema::notifications::dsl;
    let notifications = dsl::notifications
        .filter(dsl::is_read.eq(false))
        .filter(dsl::created_at.ge(since.as_millis()))
        .order_by(dsl::created_at)
        .load::<models::NotificationEntity>(conn)
        .map_err(from_diesel_err)?;
    load_notification_list(conn, notifications)
}
