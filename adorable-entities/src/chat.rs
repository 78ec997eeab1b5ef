use crate::{id::Id, time::Timestamp};

#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id              : Id,
    pub participants    : Vec<Id>,
    pub is_group_chat   : bool,
    pub title           : Option<String>,
    pub last_message    : Option<String>,
    pub last_message_at : Option<Timestamp>,
    pub created_at      : Timestamp,
    pub updated_at      : Timestamp,
}

impl Chat {
    pub fn has_participant(&self, user_id: &Id) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }
}

#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id         : Id,
    pub chat_id    : Id,
    pub sender_id  : Id,
    pub content    : String,
    pub attachment : Option<Attachment>,
    pub read_by    : Vec<Id>,
    pub created_at : Timestamp,
}

impl Message {
    /// A message counts as read as soon as any recipient has read it.
    pub fn is_read(&self) -> bool {
        self.read_by.iter().any(|id| id != &self.sender_id)
    }

    pub fn is_read_by(&self, user_id: &Id) -> bool {
        &self.sender_id == user_id || self.read_by.contains(user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    pub mime_type: String,
}
