use super::*;
use std::collections::HashSet;

impl<C> ChatRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn create_chat(&self, chat: &Chat) -> Result<()> {
        create_chat(&mut self.sqlite_conn(), chat)
    }
    fn update_chat(&self, chat: &Chat) -> Result<()> {
        update_chat(&mut self.sqlite_conn(), chat)
    }
    fn add_participants(&self, chat_id: &Id, user_ids: &[Id]) -> Result<()> {
        add_participants(&mut self.sqlite_conn(), chat_id, user_ids)
    }

    fn get_chat(&self, id: &Id) -> Result<Chat> {
        get_chat(&mut self.sqlite_conn(), id)
    }
    fn load_chats_of_user(&self, user_id: &Id) -> Result<Vec<Chat>> {
        load_chats_of_user(&mut self.sqlite_conn(), user_id)
    }
    fn try_get_direct_chat(&self, a: &Id, b: &Id) -> Result<Option<Chat>> {
        try_get_direct_chat(&mut self.sqlite_conn(), a, b)
    }
}

impl<C> MessageRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn create_message(&self, message: &Message) -> Result<()> {
        create_message(&mut self.sqlite_conn(), message)
    }
    fn load_messages(&self, chat_id: &Id, limit: Option<u32>) -> Result<Vec<Message>> {
        load_messages(&mut self.sqlite_conn(), chat_id, limit)
    }
    fn mark_messages_read(&self, chat_id: &Id, user_id: &Id) -> Result<usize> {
        mark_messages_read(&mut self.sqlite_conn(), chat_id, user_id)
    }
}

impl From<&Chat> for models::ChatEntity {
    fn from(c: &Chat) -> Self {
        Self {
            id: c.id.to_string(),
            is_group_chat: c.is_group_chat,
            title: c.title.clone(),
            last_message: c.last_message.clone(),
            last_message_at: c.last_message_at.map(Timestamp::as_millis),
            created_at: c.created_at.as_millis(),
            updated_at: c.updated_at.as_millis(),
        }
    }
}

fn load_chat(conn: &mut SqliteConnection, chat: models::ChatEntity) -> Result<Chat> {
    let models::ChatEntity {
        id,
        is_group_chat,
        title,
        last_message,
        last_message_at,
        created_at,
        updated_at,
    } = chat;
    let participants = load_participants(conn, &id)?;
    Ok(Chat {
        id: id.into(),
        participants,
        is_group_chat,
        title,
        last_message,
        last_message_at: last_message_at.map(Timestamp::from_millis),
        created_at: Timestamp::from_millis(created_at),
        updated_at: Timestamp::from_millis(updated_at),
    })
}

fn load_participants(conn: &mut SqliteConnection, chat_id: &str) -> Result<Vec<Id>> {
    use schema::chat_participants::dsl;
    Ok(dsl::chat_participants
        .select(dsl::user_id)
        .filter(dsl::chat_id.eq(chat_id))
        .order_by(dsl::position)
        .load::<String>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(Id::from)
        .collect())
}

fn create_chat(conn: &mut SqliteConnection, chat: &Chat) -> Result<()> {
    let entity = models::ChatEntity::from(chat);
    diesel::insert_into(schema::chats::table)
        .values(&entity)
        .execute(conn)
        .map_err(from_diesel_err)?;
    let participants: Vec<_> = chat
        .participants
        .iter()
        .enumerate()
        .map(|(position, user_id)| models::ChatParticipant {
            chat_id: entity.id.clone(),
            user_id: user_id.to_string(),
            position: position as i32,
        })
        .collect();
    diesel::insert_into(schema::chat_participants::table)
        .values(&participants)
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn update_chat(conn: &mut SqliteConnection, chat: &Chat) -> Result<()> {
    use schema::chats::dsl;
    let entity = models::ChatEntity::from(chat);
    let count = diesel::update(dsl::chats.filter(dsl::id.eq(&entity.id)))
        .set(&entity)
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn add_participants(conn: &mut SqliteConnection, chat_id: &Id, user_ids: &[Id]) -> Result<()> {
    use schema::{chat_participants::dsl as p_dsl, chats::dsl as c_dsl};
    c_dsl::chats
        .select(c_dsl::id)
        .filter(c_dsl::id.eq(chat_id.as_str()))
        .first::<String>(conn)
        .map_err(from_diesel_err)?;
    let existing = load_participants(conn, chat_id.as_str())?;
    let next_position = p_dsl::chat_participants
        .select(diesel::dsl::max(p_dsl::position))
        .filter(p_dsl::chat_id.eq(chat_id.as_str()))
        .first::<Option<i32>>(conn)
        .map_err(from_diesel_err)?
        .map(|max| max + 1)
        .unwrap_or_default();
    let mut new_ids: Vec<&Id> = vec![];
    for id in user_ids {
        if !existing.contains(id) && !new_ids.contains(&id) {
            new_ids.push(id);
        }
    }
    if new_ids.is_empty() {
        return Ok(());
    }
    let rows: Vec<_> = new_ids
        .into_iter()
        .enumerate()
        .map(|(i, user_id)| models::ChatParticipant {
            chat_id: chat_id.to_string(),
            user_id: user_id.to_string(),
            position: next_position + i as i32,
        })
        .collect();
    diesel::insert_into(schema::chat_participants::table)
        .values(&rows)
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn get_chat(conn: &mut SqliteConnection, id: &Id) -> Result<Chat> {
    use schema::chats::dsl;
    let chat = dsl::chats
        .filter(dsl::id.eq(id.as_str()))
        .first::<models::ChatEntity>(conn)
        .map_err(from_diesel_err)?;
    load_chat(conn, chat)
}

fn load_chat_entities_of_user(
    conn: &mut SqliteConnection,
    user_id: &Id,
) -> Result<Vec<models::ChatEntity>> {
    use schema::{chat_participants::dsl as p_dsl, chats::dsl as c_dsl};
    c_dsl::chats
        .inner_join(p_dsl::chat_participants)
        .select(schema::chats::all_columns)
        .filter(p_dsl::user_id.eq(user_id.as_str()))
        .load::<models::ChatEntity>(conn)
        .map_err(from_diesel_err)
}

fn load_chats_of_user(conn: &mut SqliteConnection, user_id: &Id) -> Result<Vec<Chat>> {
    let mut chats = load_chat_entities_of_user(conn, user_id)?;
    chats.sort_by(|a, b| {
        b.last_message_at
            .unwrap_or(b.created_at)
            .cmp(&a.last_message_at.unwrap_or(a.created_at))
    });
    chats
        .into_iter()
        .map(|chat| load_chat(conn, chat))
        .collect()
}

fn try_get_direct_chat(conn: &mut SqliteConnection, a: &Id, b: &Id) -> Result<Option<Chat>> {
    for chat in load_chat_entities_of_user(conn, a)? {
        if chat.is_group_chat {
            continue;
        }
        let participants = load_participants(conn, &chat.id)?;
        if participants.len() == 2 && participants.contains(a) && participants.contains(b) {
            return load_chat(conn, chat).map(Some);
        }
    }
    Ok(None)
}

fn create_message(conn: &mut SqliteConnection, message: &Message) -> Result<()> {
    let Message {
        id,
        chat_id,
        sender_id,
        content,
        attachment,
        read_by,
        created_at,
    } = message;
    diesel::insert_into(schema::messages::table)
        .values(&models::MessageEntity {
            id: id.to_string(),
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            content: content.clone(),
            attachment_url: attachment.as_ref().map(|a| a.url.clone()),
            attachment_mime_type: attachment.as_ref().map(|a| a.mime_type.clone()),
            created_at: created_at.as_millis(),
        })
        .execute(conn)
        .map_err(from_diesel_err)?;
    let reads: Vec<_> = read_by
        .iter()
        .map(|user_id| models::MessageRead {
            message_id: id.to_string(),
            user_id: user_id.to_string(),
        })
        .collect();
    if reads.is_empty() {
        return Ok(());
    }
    diesel::insert_or_ignore_into(schema::message_reads::table)
        .values(&reads)
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn load_message(conn: &mut SqliteConnection, message: models::MessageEntity) -> Result<Message> {
    use schema::message_reads::dsl;
    let models::MessageEntity {
        id,
        chat_id,
        sender_id,
        content,
        attachment_url,
        attachment_mime_type,
        created_at,
    } = message;
    let read_by = dsl::message_reads
        .select(dsl::user_id)
        .filter(dsl::message_id.eq(&id))
        .load::<String>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(Id::from)
        .collect();
    let attachment = match (attachment_url, attachment_mime_type) {
        (Some(url), mime_type) => Some(Attachment {
            url,
            mime_type: mime_type.unwrap_or_default(),
        }),
        (None, _) => None,
    };
    Ok(Message {
        id: id.into(),
        chat_id: chat_id.into(),
        sender_id: sender_id.into(),
        content,
        attachment,
        read_by,
        created_at: Timestamp::from_millis(created_at),
    })
}

fn load_messages(
    conn: &mut SqliteConnection,
    chat_id: &Id,
    limit: Option<u32>,
) -> Result<Vec<Message>> {
    use schema::messages::dsl;
    let mut sql = dsl::messages
        .filter(dsl::chat_id.eq(chat_id.as_str()))
        .order_by(dsl::created_at.desc())
        .into_boxed();
    if let Some(limit) = limit {
        sql = sql.limit(to_limit(limit));
    }
    let mut messages = sql
        .load::<models::MessageEntity>(conn)
        .map_err(from_diesel_err)?;
    // Newest were selected, oldest are returned first.
    messages.reverse();
    messages
        .into_iter()
        .map(|m| load_message(conn, m))
        .collect()
}

fn mark_messages_read(conn: &mut SqliteConnection, chat_id: &Id, user_id: &Id) -> Result<usize> {
    use schema::{message_reads::dsl as r_dsl, messages::dsl as m_dsl};
    let received = m_dsl::messages
        .select(m_dsl::id)
        .filter(m_dsl::chat_id.eq(chat_id.as_str()))
        .filter(m_dsl::sender_id.ne(user_id.as_str()))
        .load::<String>(conn)
        .map_err(from_diesel_err)?;
    let already_read: HashSet<_> = r_dsl::message_reads
        .select(r_dsl::message_id)
        .filter(r_dsl::user_id.eq(user_id.as_str()))
        .filter(r_dsl::message_id.eq_any(&received))
        .load::<String>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .collect();
    let reads: Vec<_> = received
        .into_iter()
        .filter(|id| !already_read.contains(id))
        .map(|message_id| models::MessageRead {
            message_id,
            user_id: user_id.to_string(),
        })
        .collect();
    if reads.is_empty() {
        return Ok(0);
    }
    diesel::insert_into(schema::message_reads::table)
        .values(&reads)
        .execute(conn)
        .map_err(from_diesel_err)
}
