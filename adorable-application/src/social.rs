use super::{dispatch::EventDispatcher, *};

pub fn follow_user(
    connections: &sqlite::Connections,
    dispatcher: &EventDispatcher,
    follower_id: &Id,
    following_id: &Id,
) -> Result<Connection> {
    let now = Timestamp::now();
    let (connection, events) = connections.exclusive()?.transaction(|conn| {
        let connection = usecases::follow_user(conn, follower_id, following_id, now)?;
        let events = fanout::on_connection_created(conn, &connection)?;
        // Reload the edge, the mutual flag might have changed
        let connection = conn
            .try_get_connection(follower_id, following_id)?
            .unwrap_or(connection);
        Ok::<_, usecases::Error>((connection, events))
    })?;
    dispatcher.dispatch(events);
    Ok(connection)
}

pub fn unfollow_user(
    connections: &sqlite::Connections,
    dispatcher: &EventDispatcher,
    follower_id: &Id,
    following_id: &Id,
) -> Result<()> {
    let events = connections.exclusive()?.transaction(|conn| {
        usecases::unfollow_user(conn, follower_id, following_id)?;
        Ok::<_, usecases::Error>(fanout::on_connection_removed(
            conn,
            follower_id,
            following_id,
        )?)
    })?;
    dispatcher.dispatch(events);
    Ok(())
}

/// Blocking removes the follow edges in both directions.
pub fn block_user(
    connections: &sqlite::Connections,
    dispatcher: &EventDispatcher,
    blocker_id: &Id,
    blocked_id: &Id,
    reason: Option<String>,
) -> Result<Block> {
    let now = Timestamp::now();
    let (block, events) = connections.exclusive()?.transaction(|conn| {
        let (block, removed) = usecases::block_user(conn, blocker_id, blocked_id, reason, now)?;
        let mut events = vec![];
        for (follower_id, following_id) in removed {
            events.extend(fanout::on_connection_removed(
                conn,
                &follower_id,
                &following_id,
            )?);
        }
        Ok::<_, usecases::Error>((block, events))
    })?;
    dispatcher.dispatch(events);
    Ok(block)
}
