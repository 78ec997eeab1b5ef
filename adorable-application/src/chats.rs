use super::{dispatch::EventDispatcher, *};

/// Returns the chat and whether it has been created.
///
/// Opening a direct chat twice yields the existing one.
pub fn create_chat(
    connections: &sqlite::Connections,
    dispatcher: &EventDispatcher,
    creator_id: &Id,
    new_chat: usecases::NewChat,
) -> Result<(Chat, bool)> {
    let now = Timestamp::now();
    let (chat, created, events) = connections.exclusive()?.transaction(|conn| {
        let (chat, created) = usecases::create_chat(conn, creator_id, new_chat, now)?;
        let events = if created && chat.is_group_chat {
            let invited: Vec<_> = chat
                .participants
                .iter()
                .filter(|id| *id != creator_id)
                .cloned()
                .collect();
            fanout::on_participants_added(conn, &chat, &invited, now)?
        } else {
            vec![]
        };
        Ok::<_, usecases::Error>((chat, created, events))
    })?;
    dispatcher.dispatch(events);
    Ok((chat, created))
}

pub fn add_chat_participants(
    connections: &sqlite::Connections,
    dispatcher: &EventDispatcher,
    user_id: &Id,
    chat_id: &Id,
    user_ids: &[Id],
) -> Result<Chat> {
    let now = Timestamp::now();
    let (chat, events) = connections.exclusive()?.transaction(|conn| {
        let (chat, added) = usecases::add_chat_participants(conn, user_id, chat_id, user_ids, now)?;
        let events = fanout::on_participants_added(conn, &chat, &added, now)?;
        Ok::<_, usecases::Error>((chat, events))
    })?;
    dispatcher.dispatch(events);
    Ok(chat)
}

pub fn post_message(
    connections: &sqlite::Connections,
    dispatcher: &EventDispatcher,
    sender_id: &Id,
    chat_id: &Id,
    new_message: usecases::NewMessage,
) -> Result<Message> {
    let now = Timestamp::now();
    let (message, events) = connections.exclusive()?.transaction(|conn| {
        let message = usecases::post_message(conn, sender_id, chat_id, new_message, now)?;
        let events = fanout::on_message_created(conn, &message)?;
        Ok::<_, usecases::Error>((message, events))
    })?;
    dispatcher.dispatch(events);
    Ok(message)
}
