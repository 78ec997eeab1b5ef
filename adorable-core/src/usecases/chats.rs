use super::prelude::*;

const MAX_MESSAGE_LEN: usize = 10_000;

#[derive(Debug, Clone, Default)]
pub struct NewChat {
    /// The other participants, the creator is added implicitly.
    pub participants: Vec<Id>,
    pub is_group_chat: bool,
    pub title: Option<String>,
}

fn check_participants<R>(repo: &R, user_id: &Id, others: &[Id]) -> Result<()>
where
    R: UserRepo + BlockRepo,
{
    for other in others {
        // The user must exist
        repo.get_user(other)?;
        if repo.is_blocked_either_way(user_id, other)? {
            return Err(Error::Blocked);
        }
    }
    Ok(())
}

/// Creates a new chat.
///
/// A direct chat between two users exists only once, in this case
/// the existing chat is returned together with `false`.
pub fn create_chat<R>(
    repo: &R,
    creator_id: &Id,
    new_chat: NewChat,
    now: Timestamp,
) -> Result<(Chat, bool)>
where
    R: UserRepo + BlockRepo + ChatRepo,
{
    let NewChat {
        participants,
        is_group_chat,
        title,
    } = new_chat;
    let mut others: Vec<Id> = vec![];
    for id in participants {
        if &id != creator_id && !others.contains(&id) {
            others.push(id);
        }
    }
    if others.is_empty() || (!is_group_chat && others.len() > 1) {
        return Err(Error::ChatParticipants);
    }
    check_participants(repo, creator_id, &others)?;
    if !is_group_chat {
        if let Some(chat) = repo.try_get_direct_chat(creator_id, &others[0])? {
            return Ok((chat, false));
        }
    }
    let mut all = Vec::with_capacity(others.len() + 1);
    all.push(creator_id.clone());
    all.extend(others);
    let chat = Chat {
        id: Id::new(),
        participants: all,
        is_group_chat,
        title: validate::non_empty(title),
        last_message: None,
        last_message_at: None,
        created_at: now,
        updated_at: now,
    };
    repo.create_chat(&chat)?;
    Ok((chat, true))
}

/// Only participants can see a chat.
pub fn get_chat<R: ChatRepo>(repo: &R, user_id: &Id, id: &Id) -> Result<Chat> {
    let chat = repo.get_chat(id)?;
    if !chat.has_participant(user_id) {
        return Err(Error::Repo(RepoError::NotFound));
    }
    Ok(chat)
}

pub fn load_chats<R: ChatRepo>(repo: &R, user_id: &Id) -> Result<Vec<Chat>> {
    Ok(repo.load_chats_of_user(user_id)?)
}

/// Returns the updated chat and the ids of the users that were not yet participants.
pub fn add_chat_participants<R>(
    repo: &R,
    user_id: &Id,
    chat_id: &Id,
    user_ids: &[Id],
    now: Timestamp,
) -> Result<(Chat, Vec<Id>)>
where
    R: UserRepo + BlockRepo + ChatRepo,
{
    let mut chat = get_chat(repo, user_id, chat_id)?;
    if !chat.is_group_chat {
        return Err(Error::ChatParticipants);
    }
    let mut added: Vec<Id> = vec![];
    for id in user_ids {
        if !chat.has_participant(id) && !added.contains(id) {
            added.push(id.clone());
        }
    }
    if added.is_empty() {
        return Ok((chat, added));
    }
    check_participants(repo, user_id, &added)?;
    repo.add_participants(&chat.id, &added)?;
    chat.updated_at = now;
    repo.update_chat(&chat)?;
    chat.participants.extend(added.iter().cloned());
    log::debug!("Added {} participant(s) to chat {}", added.len(), chat.id);
    Ok((chat, added))
}

#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub content: String,
    pub attachment: Option<Attachment>,
}

pub fn post_message<R>(
    repo: &R,
    sender_id: &Id,
    chat_id: &Id,
    new_message: NewMessage,
    now: Timestamp,
) -> Result<Message>
where
    R: ChatRepo + MessageRepo,
{
    let chat = get_chat(repo, sender_id, chat_id)?;
    let NewMessage {
        content,
        attachment,
    } = new_message;
    let content = content.trim().to_owned();
    if content.is_empty() && attachment.is_none() {
        return Err(Error::EmptyMessage);
    }
    if content.chars().count() > MAX_MESSAGE_LEN {
        return Err(Error::TextTooLong);
    }
    let message = Message {
        id: Id::new(),
        chat_id: chat.id,
        sender_id: sender_id.clone(),
        content,
        attachment,
        read_by: vec![],
        created_at: now,
    };
    repo.create_message(&message)?;
    Ok(message)
}

/// Oldest first.
pub fn load_messages<R>(repo: &R, user_id: &Id, chat_id: &Id, limit: Option<u32>) -> Result<Vec<Message>>
where
    R: ChatRepo + MessageRepo,
{
    let chat = get_chat(repo, user_id, chat_id)?;
    let limit = super::effective_limit(limit)?;
    Ok(repo.load_messages(&chat.id, Some(limit))?)
}

/// Returns the number of messages that were newly marked as read.
pub fn mark_chat_read<R>(repo: &R, user_id: &Id, chat_id: &Id) -> Result<usize>
where
    R: ChatRepo + MessageRepo,
{
    let chat = get_chat(repo, user_id, chat_id)?;
    Ok(repo.mark_messages_read(&chat.id, user_id)?)
}

#[cfg(test)]
mod tests {
    use super::{super::tests::*, *};

    fn direct(other: &Id) -> NewChat {
        NewChat {
            participants: vec![other.clone()],
            ..Default::default()
        }
    }

    fn text(content: &str) -> NewMessage {
        NewMessage {
            content: content.into(),
            attachment: None,
        }
    }

    #[test]
    fn direct_chats_are_unique() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let now = Timestamp::now();
        let (chat, created) = create_chat(&db, &alice.id, direct(&bob.id), now).unwrap();
        assert!(created);
        assert_eq!(vec![alice.id.clone(), bob.id.clone()], chat.participants);
        let (again, created) = create_chat(&db, &bob.id, direct(&alice.id), now).unwrap();
        assert!(!created);
        assert_eq!(chat.id, again.id);
        assert_eq!(1, db.chats.borrow().len());
    }

    #[test]
    fn reject_invalid_participants() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let carol = add_user(&db, "carol");
        let now = Timestamp::now();
        assert!(matches!(
            create_chat(&db, &alice.id, direct(&alice.id), now),
            Err(Error::ChatParticipants)
        ));
        let two = NewChat {
            participants: vec![bob.id.clone(), carol.id.clone()],
            ..Default::default()
        };
        assert!(matches!(
            create_chat(&db, &alice.id, two, now),
            Err(Error::ChatParticipants)
        ));
        assert!(matches!(
            create_chat(&db, &alice.id, direct(&"nobody".into()), now),
            Err(Error::Repo(RepoError::NotFound))
        ));
    }

    #[test]
    fn blocked_users_cannot_chat() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let now = Timestamp::now();
        super::super::block_user(&db, &bob.id, &alice.id, None, now).unwrap();
        assert!(matches!(
            create_chat(&db, &alice.id, direct(&bob.id), now),
            Err(Error::Blocked)
        ));
        assert!(matches!(
            create_chat(&db, &bob.id, direct(&alice.id), now),
            Err(Error::Blocked)
        ));
    }

    #[test]
    fn add_participants_to_group_chat() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let carol = add_user(&db, "carol");
        let now = Timestamp::now();
        let group = NewChat {
            participants: vec![bob.id.clone()],
            is_group_chat: true,
            title: Some("Friends".into()),
        };
        let (chat, _) = create_chat(&db, &alice.id, group, now).unwrap();
        let (chat, added) = add_chat_participants(
            &db,
            &bob.id,
            &chat.id,
            &[alice.id.clone(), carol.id.clone(), carol.id.clone()],
            now,
        )
        .unwrap();
        assert_eq!(vec![carol.id.clone()], added);
        assert_eq!(3, chat.participants.len());
        assert_eq!(3, db.get_chat(&chat.id).unwrap().participants.len());

        let (direct_chat, _) = create_chat(&db, &alice.id, direct(&bob.id), now).unwrap();
        assert!(matches!(
            add_chat_participants(&db, &alice.id, &direct_chat.id, &[carol.id.clone()], now),
            Err(Error::ChatParticipants)
        ));
    }

    #[test]
    fn only_participants_may_post_and_read() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let eve = add_user(&db, "eve");
        let now = Timestamp::now();
        let (chat, _) = create_chat(&db, &alice.id, direct(&bob.id), now).unwrap();
        assert!(matches!(
            post_message(&db, &eve.id, &chat.id, text("hi"), now),
            Err(Error::Repo(RepoError::NotFound))
        ));
        assert!(matches!(
            post_message(&db, &alice.id, &chat.id, text("  "), now),
            Err(Error::EmptyMessage)
        ));
        post_message(&db, &alice.id, &chat.id, text("hi"), now).unwrap();
        post_message(&db, &alice.id, &chat.id, text("there"), now).unwrap();
        assert!(load_messages(&db, &eve.id, &chat.id, None).is_err());
        assert_eq!(2, load_messages(&db, &bob.id, &chat.id, None).unwrap().len());

        assert_eq!(2, mark_chat_read(&db, &bob.id, &chat.id).unwrap());
        assert_eq!(0, mark_chat_read(&db, &bob.id, &chat.id).unwrap());
        assert!(load_messages(&db, &alice.id, &chat.id, None)
            .unwrap()
            .iter()
            .all(Message::is_read));
    }
}
