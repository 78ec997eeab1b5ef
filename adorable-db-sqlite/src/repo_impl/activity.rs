use super::*;

impl<C> ActivityRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn create_activity(&self, activity: &Activity) -> Result<()> {
        create_activity(&mut self.sqlite_conn(), activity)
    }
    fn load_activities_of_users(&self, user_ids: &[Id], limit: u32) -> Result<Vec<Activity>> {
        load_activities_of_users(&mut self.sqlite_conn(), user_ids, limit)
    }
}

fn create_activity(conn: &mut SqliteConnection, activity: &Activity) -> Result<()> {
    let Activity {
        id,
        user_id,
        kind,
        target_user_id,
        target_place_id,
        data,
        created_at,
    } = activity;
    diesel::insert_into(schema::activities::table)
        .values(&models::ActivityEntity {
            id: id.to_string(),
            user_id: user_id.to_string(),
            kind: kind.as_ref().to_owned(),
            target_user_id: target_user_id.as_ref().map(ToString::to_string),
            target_place_id: target_place_id.as_ref().map(ToString::to_string),
            created_at: created_at.as_millis(),
        })
        .execute(conn)
        .map_err(from_diesel_err)?;
    if data.is_empty() {
        return Ok(());
    }
    let rows: Vec<_> = data
        .iter()
        .map(|(key, value)| models::ActivityData {
            activity_id: id.to_string(),
            key: key.clone(),
            value: value.clone(),
        })
        .collect();
    diesel::insert_into(schema::activity_data::table)
        .values(&rows)
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn load_activity(conn: &mut SqliteConnection, activity: models::ActivityEntity) -> Result<Activity> {
    use schema::activity_data::dsl;
    let models::ActivityEntity {
        id,
        user_id,
        kind,
        target_user_id,
        target_place_id,
        created_at,
    } = activity;
    let data = dsl::activity_data
        .select((dsl::key, dsl::value))
        .filter(dsl::activity_id.eq(&id))
        .load::<(String, String)>(conn)
        .map_err(from_diesel_err)?;
    Ok(Activity {
        id: id.into(),
        user_id: user_id.into(),
        kind: parse_enum(&kind)?,
        target_user_id: target_user_id.map(Into::into),
        target_place_id: target_place_id.map(Into::into),
        data: payload_from_rows(data),
        created_at: Timestamp::from_millis(created_at),
    })
}

fn load_activities_of_users(
    conn: &mut SqliteConnection,
    user_ids: &[Id],
    limit: u32,
) -> Result<Vec<Activity>> {
    use schema::activities::dsl;
    let activities = dsl::activities
        .filter(dsl::user_id.eq_any(ids_to_strings(user_ids)))
        .order_by(dsl::created_at.desc())
        .limit(to_limit(limit))
        .load::<models::ActivityEntity>(conn)
        .map_err(from_diesel_err)?;
    activities
        .into_iter()
        .map(|a| load_activity(conn, a))
        .collect()
}
