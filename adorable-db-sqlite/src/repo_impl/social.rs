use super::*;
// Shadows the diesel trait of the same name.
use adorable_core::entities::Connection;

impl<C> ConnectionRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn create_connection(&self, connection: &Connection) -> Result<()> {
        create_connection(&mut self.sqlite_conn(), connection)
    }
    fn delete_connection(&self, follower_id: &Id, following_id: &Id) -> Result<()> {
        delete_connection(&mut self.sqlite_conn(), follower_id, following_id)
    }
    fn try_get_connection(
        &self,
        follower_id: &Id,
        following_id: &Id,
    ) -> Result<Option<Connection>> {
        try_get_connection(&mut self.sqlite_conn(), follower_id, following_id)
    }
    fn set_mutual(&self, follower_id: &Id, following_id: &Id, is_mutual: bool) -> Result<()> {
        set_mutual(&mut self.sqlite_conn(), follower_id, following_id, is_mutual)
    }

    fn load_followers(&self, user_id: &Id) -> Result<Vec<Connection>> {
        load_connections(&mut self.sqlite_conn(), Edge::Incoming, user_id)
    }
    fn load_following(&self, user_id: &Id) -> Result<Vec<Connection>> {
        load_connections(&mut self.sqlite_conn(), Edge::Outgoing, user_id)
    }
    fn count_followers(&self, user_id: &Id) -> Result<usize> {
        count_connections(&mut self.sqlite_conn(), Edge::Incoming, user_id)
    }
    fn count_following(&self, user_id: &Id) -> Result<usize> {
        count_connections(&mut self.sqlite_conn(), Edge::Outgoing, user_id)
    }
}

impl<C> BlockRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn create_block(&self, block: &Block) -> Result<()> {
        create_block(&mut self.sqlite_conn(), block)
    }
    fn delete_block(&self, blocker_id: &Id, blocked_id: &Id) -> Result<()> {
        delete_block(&mut self.sqlite_conn(), blocker_id, blocked_id)
    }
    fn try_get_block(&self, blocker_id: &Id, blocked_id: &Id) -> Result<Option<Block>> {
        try_get_block(&mut self.sqlite_conn(), blocker_id, blocked_id)
    }
    fn load_blocks(&self, blocker_id: &Id) -> Result<Vec<Block>> {
        load_blocks(&mut self.sqlite_conn(), blocker_id)
    }
}

impl<C> ReportRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn create_report(&self, report: &Report) -> Result<()> {
        create_report(&mut self.sqlite_conn(), report)
    }
    fn update_report(&self, report: &Report) -> Result<()> {
        update_report(&mut self.sqlite_conn(), report)
    }
    fn get_report(&self, id: &Id) -> Result<Report> {
        get_report(&mut self.sqlite_conn(), id)
    }
    fn load_reports_by_reporter(&self, reporter_id: &Id) -> Result<Vec<Report>> {
        load_reports(&mut self.sqlite_conn(), Some(reporter_id))
    }
    fn all_reports(&self) -> Result<Vec<Report>> {
        load_reports(&mut self.sqlite_conn(), None)
    }
}

#[derive(Clone, Copy)]
enum Edge {
    Incoming,
    Outgoing,
}

fn load_connection(from: models::ConnectionEntity) -> Connection {
    let models::ConnectionEntity {
        id,
        follower_id,
        following_id,
        is_mutual,
        created_at,
    } = from;
    Connection {
        id: id.into(),
        follower_id: follower_id.into(),
        following_id: following_id.into(),
        is_mutual,
        created_at: Timestamp::from_millis(created_at),
    }
}

fn create_connection(conn: &mut SqliteConnection, c: &Connection) -> Result<()> {
    diesel::insert_into(schema::connections::table)
        .values(&models::ConnectionEntity {
            id: c.id.to_string(),
            follower_id: c.follower_id.to_string(),
            following_id: c.following_id.to_string(),
            is_mutual: c.is_mutual,
            created_at: c.created_at.as_millis(),
        })
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn delete_connection(conn: &mut SqliteConnection, follower_id: &Id, following_id: &Id) -> Result<()> {
    use schema::connections::dsl;
    let count = diesel::delete(
        dsl::connections
            .filter(dsl::follower_id.eq(follower_id.as_str()))
            .filter(dsl::following_id.eq(following_id.as_str())),
    )
    .execute(conn)
    .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn try_get_connection(
    conn: &mut SqliteConnection,
    follower_id: &Id,
    following_id: &Id,
) -> Result<Option<Connection>> {
    use schema::connections::dsl;
    Ok(dsl::connections
        .filter(dsl::follower_id.eq(follower_id.as_str()))
        .filter(dsl::following_id.eq(following_id.as_str()))
        .first::<models::ConnectionEntity>(conn)
        .optional()
        .map_err(from_diesel_err)?
        .map(load_connection))
}

fn set_mutual(
    conn: &mut SqliteConnection,
    follower_id: &Id,
    following_id: &Id,
    is_mutual: bool,
) -> Result<()> {
    use schema::connections::dsl;
    let count = diesel::update(
        dsl::connections
            .filter(dsl::follower_id.eq(follower_id.as_str()))
            .filter(dsl::following_id.eq(following_id.as_str())),
    )
    .set(dsl::is_mutual.eq(is_mutual))
    .execute(conn)
    .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn load_connections(conn: &mut SqliteConnection, edge: Edge, user_id: &Id) -> Result<Vec<Connection>> {
    use schema::connections::dsl;
    let sql = match edge {
        Edge::Incoming => dsl::connections
            .filter(dsl::following_id.eq(user_id.as_str()))
            .into_boxed(),
        Edge::Outgoing => dsl::connections
            .filter(dsl::follower_id.eq(user_id.as_str()))
            .into_boxed(),
    };
    Ok(sql
        .order_by(dsl::created_at.desc())
        .load::<models::ConnectionEntity>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(load_connection)
        .collect())
}

fn count_connections(conn: &mut SqliteConnection, edge: Edge, user_id: &Id) -> Result<usize> {
    use schema::connections::dsl;
    let count = dsl::connections.select(diesel::dsl::count(dsl::id));
    let count = match edge {
        Edge::Incoming => count
            .filter(dsl::following_id.eq(user_id.as_str()))
            .first::<i64>(conn),
        Edge::Outgoing => count
            .filter(dsl::follower_id.eq(user_id.as_str()))
            .first::<i64>(conn),
    }
    .map_err(from_diesel_err)?;
    Ok(count as usize)
}

fn load_block(from: models::BlockEntity) -> Block {
    let models::BlockEntity {
        id,
        blocker_id,
        blocked_id,
        reason,
        created_at,
    } = from;
    Block {
        id: id.into(),
        blocker_id: blocker_id.into(),
        blocked_id: blocked_id.into(),
        reason,
        created_at: Timestamp::from_millis(created_at),
    }
}

fn create_block(conn: &mut SqliteConnection, b: &Block) -> Result<()> {
    diesel::insert_into(schema::blocks::table)
        .values(&models::BlockEntity {
            id: b.id.to_string(),
            blocker_id: b.blocker_id.to_string(),
            blocked_id: b.blocked_id.to_string(),
            reason: b.reason.clone(),
            created_at: b.created_at.as_millis(),
        })
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn delete_block(conn: &mut SqliteConnection, blocker_id: &Id, blocked_id: &Id) -> Result<()> {
    use schema::blocks::dsl;
    let count = diesel::delete(
        dsl::blocks
            .filter(dsl::blocker_id.eq(blocker_id.as_str()))
            .filter(dsl::blocked_id.eq(blocked_id.as_str())),
    )
    .execute(conn)
    .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn try_get_block(
    conn: &mut SqliteConnection,
    blocker_id: &Id,
    blocked_id: &Id,
) -> Result<Option<Block>> {
    use schema::blocks::dsl;
    Ok(dsl::blocks
        .filter(dsl::blocker_id.eq(blocker_id.as_str()))
        .filter(dsl::blocked_id.eq(blocked_id.as_str()))
        .first::<models::BlockEntity>(conn)
        .optional()
        .map_err(from_diesel_err)?
        .map(load_block))
}

fn load_blocks(conn: &mut SqliteConnection, blocker_id: &Id) -> Result<Vec<Block>> {
    use schema::blocks::dsl;
    Ok(dsl::blocks
        .filter(dsl::blocker_id.eq(blocker_id.as_str()))
        .order_by(dsl::created_at.desc())
        .load::<models::BlockEntity>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(load_block)
        .collect())
}

impl From<&Report> for models::ReportEntity {
    fn from(r: &Report) -> Self {
        Self {
            id: r.id.to_string(),
            reporter_id: r.reporter_id.to_string(),
            reported_user_id: r.reported_user_id.to_string(),
            reason: r.reason.as_ref().to_owned(),
            description: r.description.clone(),
            status: r.status.as_ref().to_owned(),
            admin_notes: r.admin_notes.clone(),
            created_at: r.created_at.as_millis(),
            updated_at: r.updated_at.as_millis(),
        }
    }
}

impl TryFrom<models::ReportEntity> for Report {
    type Error = repo::Error;

    fn try_from(from: models::ReportEntity) -> Result<Self> {
        let models::ReportEntity {
            id,
            reporter_id,
            reported_user_id,
            reason,
            description,
            status,
            admin_notes,
            created_at,
            updated_at,
        } = from;
        Ok(Self {
            id: id.into(),
            reporter_id: reporter_id.into(),
            reported_user_id: reported_user_id.into(),
            reason: parse_enum(&reason)?,
            description,
            status: parse_enum(&status)?,
            admin_notes,
            created_at: Timestamp::from_millis(created_at),
            updated_at: Timestamp::from_millis(updated_at),
        })
    }
}

fn create_report(conn: &mut SqliteConnection, report: &Report) -> Result<()> {
    diesel::insert_into(schema::reports::table)
        .values(&models::ReportEntity::from(report))
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn update_report(conn: &mut SqliteConnection, report: &Report) -> Result<()> {
    use schema::reports::dsl;
    let entity = models::ReportEntity::from(report);
    let count = diesel::update(dsl::reports.filter(dsl::id.eq(&entity.id)))
        .set(&entity)
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn get_report(conn: &mut SqliteConnection, id: &Id) -> Result<Report> {
    use schema::reports::dsl;
    dsl::reports
        .filter(dsl::id.eq(id.as_str()))
        .first::<models::ReportEntity>(conn)
        .map_err(from_diesel_err)?
        .try_into()
}

fn load_reports(conn: &mut SqliteConnection, reporter_id: Option<&Id>) -> Result<Vec<Report>> {
    use schema::reports::dsl;
    let mut sql = dsl::reports.into_boxed();
    if let Some(reporter_id) = reporter_id {
        sql = sql.filter(dsl::reporter_id.eq(reporter_id.as_str()));
    }
    sql.order_by(dsl::created_at.desc())
        .load::<models::ReportEntity>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}
