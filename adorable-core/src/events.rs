//! Side effects that have to happen after a write has been committed.

use crate::{entities::*, gateways::push::PushMessage, jobs::Job};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    NotificationCreated(Notification),
    /// `audience` contains the followers of the actor at the
    /// time the activity has been created.
    ActivityCreated {
        activity: Activity,
        audience: Vec<Id>,
    },
    MessageCreated(Message),
    /// The place has been created, modified or deleted.
    PlaceChanged(Id),
    PlaceNeedsGeocoding(Id),
    ImageUploaded {
        file_id: Id,
        avatar_of: Option<Id>,
    },
}

/// A record that should be written into the realtime store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeMirror {
    pub path: String,
    pub value: Payload,
}

fn flatten_data(value: &mut Payload, data: &Payload) {
    for (k, v) in data {
        value.insert(format!("data.{k}"), v.clone());
    }
}

fn notification_record(n: &Notification) -> Payload {
    let mut value = Payload::new();
    value.insert("id".into(), n.id.to_string());
    value.insert("type".into(), n.kind.as_ref().to_owned());
    value.insert("title".into(), n.title.clone());
    value.insert("message".into(), n.message.clone());
    value.insert("is_read".into(), n.is_read.to_string());
    value.insert("created_at".into(), n.created_at.to_string());
    if let Some(url) = &n.action_url {
        value.insert("action_url".into(), url.clone());
    }
    flatten_data(&mut value, &n.data);
    value
}

fn activity_record(a: &Activity) -> Payload {
    let mut value = Payload::new();
    value.insert("id".into(), a.id.to_string());
    value.insert("type".into(), a.kind.as_ref().to_owned());
    value.insert("user_id".into(), a.user_id.to_string());
    if let Some(id) = &a.target_user_id {
        value.insert("target_user_id".into(), id.to_string());
    }
    if let Some(id) = &a.target_place_id {
        value.insert("target_place_id".into(), id.to_string());
    }
    value.insert("created_at".into(), a.created_at.to_string());
    flatten_data(&mut value, &a.data);
    value
}

fn message_record(m: &Message) -> Payload {
    let mut value = Payload::new();
    value.insert("id".into(), m.id.to_string());
    value.insert("sender_id".into(), m.sender_id.to_string());
    value.insert("content".into(), m.content.clone());
    value.insert("created_at".into(), m.created_at.to_string());
    value.insert("is_read".into(), m.is_read().to_string());
    if let Some(att) = &m.attachment {
        value.insert("attachment_url".into(), att.url.clone());
        value.insert("attachment_type".into(), att.mime_type.clone());
    }
    value
}

impl Event {
    pub fn realtime_mirrors(&self) -> Vec<RealtimeMirror> {
        match self {
            Self::NotificationCreated(n) => vec![RealtimeMirror {
                path: format!("notifications/{}/{}", n.user_id, n.id),
                value: notification_record(n),
            }],
            Self::ActivityCreated { activity, audience } => {
                let value = activity_record(activity);
                audience
                    .iter()
                    .map(|follower| RealtimeMirror {
                        path: format!("feeds/{follower}/activities/{}", activity.id),
                        value: value.clone(),
                    })
                    .collect()
            }
            Self::MessageCreated(m) => vec![RealtimeMirror {
                path: format!("chats/{}/messages/{}", m.chat_id, m.id),
                value: message_record(m),
            }],
            Self::PlaceChanged(_) | Self::PlaceNeedsGeocoding(_) | Self::ImageUploaded { .. } => {
                vec![]
            }
        }
    }

    pub fn job(&self) -> Option<Job> {
        match self {
            Self::NotificationCreated(n) => {
                let mut data = n.data.clone();
                data.insert("type".into(), n.kind.as_ref().to_owned());
                Some(Job::SendPush {
                    user_ids: vec![n.user_id.clone()],
                    message: PushMessage {
                        title: n.title.clone(),
                        body: n.message.clone(),
                        data,
                    },
                })
            }
            Self::PlaceChanged(place_id) => Some(Job::UpdateSearchIndex {
                place_id: place_id.clone(),
            }),
            Self::PlaceNeedsGeocoding(place_id) => Some(Job::GeocodePlace {
                place_id: place_id.clone(),
            }),
            Self::ImageUploaded { file_id, avatar_of } => Some(Job::ProcessImage {
                file_id: file_id.clone(),
                avatar_of: avatar_of.clone(),
            }),
            Self::ActivityCreated { .. } | Self::MessageCreated(_) => None,
        }
    }
}
