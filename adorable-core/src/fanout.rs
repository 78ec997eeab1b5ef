//! Derived writes that follow a primary write.
//!
//! All functions are expected to run inside the same transaction as
//! the write that triggered them. The returned events must only be
//! dispatched after the transaction has been committed.

use crate::{
    entities::*,
    events::Event,
    repositories::{Error as RepoError, *},
    util::validate::truncate_chars,
};

type Result<T> = std::result::Result<T, RepoError>;

const PREVIEW_LEN: usize = 100;

fn payload<const N: usize>(entries: [(&str, String); N]) -> Payload {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
}

fn notify<R: NotificationRepo>(repo: &R, notification: Notification) -> Result<Event> {
    repo.create_notification(&notification)?;
    Ok(Event::NotificationCreated(notification))
}

fn new_notification(
    user_id: &Id,
    kind: NotificationType,
    title: &str,
    message: String,
    data: Payload,
    action_url: Option<String>,
    now: Timestamp,
) -> Notification {
    Notification {
        id: Id::new(),
        user_id: user_id.clone(),
        kind,
        title: title.to_owned(),
        message,
        data,
        is_read: false,
        action_url,
        created_at: now,
    }
}

fn record_activity<R>(repo: &R, activity: Activity) -> Result<Event>
where
    R: ActivityRepo + ConnectionRepo,
{
    repo.create_activity(&activity)?;
    let audience = repo
        .load_followers(&activity.user_id)?
        .into_iter()
        .map(|c| c.follower_id)
        .collect();
    Ok(Event::ActivityCreated { activity, audience })
}

/// Recalculate the average rating and the number of reviews of a place.
pub fn on_review_changed<R>(repo: &R, place_id: &Id) -> Result<Vec<Event>>
where
    R: PlaceRepo + ReviewRepo,
{
    let mut place = repo.get_place(place_id)?;
    let ratings: AvgRatingValueBuilder = repo
        .load_reviews_of_place(place_id)?
        .into_iter()
        .map(|r| r.rating)
        .collect();
    place.total_ratings = ratings.count();
    place.rating = ratings.build();
    log::debug!(
        "Place {place_id} has {} review(s) with an average of {:.2}",
        place.total_ratings,
        f64::from(place.rating)
    );
    repo.update_place(&place)?;
    Ok(vec![Event::PlaceChanged(place.id)])
}

pub fn on_review_created<R>(repo: &R, review: &PlaceReview) -> Result<Vec<Event>>
where
    R: PlaceRepo + UserRepo + NotificationRepo + ActivityRepo + ConnectionRepo,
{
    let place = repo.get_place(&review.place_id)?;
    let mut events = vec![];
    let activity = Activity {
        id: Id::new(),
        user_id: review.user_id.clone(),
        kind: ActivityType::Review,
        target_user_id: None,
        target_place_id: Some(place.id.clone()),
        data: payload([
            ("review_id", review.id.to_string()),
            ("rating", u8::from(review.rating).to_string()),
        ]),
        created_at: review.created_at,
    };
    events.push(record_activity(repo, activity)?);
    if let Some(creator) = place.created_by.as_ref().filter(|c| *c != &review.user_id) {
        let reviewer = repo.get_user(&review.user_id)?;
        let notification = new_notification(
            creator,
            NotificationType::PlaceReview,
            "New Review",
            format!("{} reviewed {}", reviewer.username, place.name),
            payload([
                ("place_id", place.id.to_string()),
                ("review_id", review.id.to_string()),
            ]),
            Some(format!("/places/{}", place.id)),
            review.created_at,
        );
        events.push(notify(repo, notification)?);
    }
    Ok(events)
}

pub fn on_connection_created<R>(repo: &R, connection: &Connection) -> Result<Vec<Event>>
where
    R: ConnectionRepo + UserRepo + NotificationRepo + ActivityRepo,
{
    let Connection {
        follower_id,
        following_id,
        created_at,
        ..
    } = connection;
    if repo
        .try_get_connection(following_id, follower_id)?
        .is_some()
    {
        repo.set_mutual(follower_id, following_id, true)?;
        repo.set_mutual(following_id, follower_id, true)?;
    }
    let follower = repo.get_user(follower_id)?;
    let notification = new_notification(
        following_id,
        NotificationType::NewFollower,
        "New Follower",
        format!("{} started following you", follower.username),
        payload([
            ("follower_id", follower.id.to_string()),
            ("follower_username", follower.username.clone()),
        ]),
        Some(format!("/users/{}", follower.id)),
        *created_at,
    );
    let activity = Activity {
        id: Id::new(),
        user_id: follower_id.clone(),
        kind: ActivityType::Follow,
        target_user_id: Some(following_id.clone()),
        target_place_id: None,
        data: payload([
            ("follower_id", follower_id.to_string()),
            ("following_id", following_id.to_string()),
        ]),
        created_at: *created_at,
    };
    Ok(vec![
        notify(repo, notification)?,
        record_activity(repo, activity)?,
    ])
}

/// Must be called after the edge `follower -> following` has been deleted.
pub fn on_connection_removed<R>(repo: &R, follower_id: &Id, following_id: &Id) -> Result<Vec<Event>>
where
    R: ConnectionRepo,
{
    if let Some(reverse) = repo.try_get_connection(following_id, follower_id)? {
        if reverse.is_mutual {
            repo.set_mutual(following_id, follower_id, false)?;
        }
    }
    Ok(vec![])
}

pub fn on_message_created<R>(repo: &R, message: &Message) -> Result<Vec<Event>>
where
    R: ChatRepo + UserRepo + NotificationRepo,
{
    let mut chat = repo.get_chat(&message.chat_id)?;
    chat.last_message = Some(message.content.clone());
    chat.last_message_at = Some(message.created_at);
    chat.updated_at = message.created_at;
    repo.update_chat(&chat)?;

    let sender = repo.get_user(&message.sender_id)?;
    let preview = truncate_chars(&message.content, PREVIEW_LEN);
    let mut events = vec![Event::MessageCreated(message.clone())];
    for participant in chat.participants.iter().filter(|p| *p != &sender.id) {
        let notification = new_notification(
            participant,
            NotificationType::NewMessage,
            &format!("New message from {}", sender.username),
            preview.clone(),
            payload([
                ("chat_id", chat.id.to_string()),
                ("message_id", message.id.to_string()),
                ("sender_id", sender.id.to_string()),
            ]),
            Some(format!("/chats/{}", chat.id)),
            message.created_at,
        );
        events.push(notify(repo, notification)?);
    }
    Ok(events)
}

pub fn on_participants_added<R>(
    repo: &R,
    chat: &Chat,
    user_ids: &[Id],
    now: Timestamp,
) -> Result<Vec<Event>>
where
    R: NotificationRepo,
{
    let chat_title = chat.title.clone().unwrap_or_default();
    let message = match &chat.title {
        Some(title) => format!("You were added to {title}"),
        None => "You were added to a chat".to_owned(),
    };
    user_ids
        .iter()
        .map(|user_id| {
            let notification = new_notification(
                user_id,
                NotificationType::ChatInvite,
                "New Chat",
                message.clone(),
                payload([
                    ("chat_id", chat.id.to_string()),
                    ("chat_title", chat_title.clone()),
                ]),
                Some(format!("/chats/{}", chat.id)),
                now,
            );
            notify(repo, notification)
        })
        .collect()
}

/// A created or updated place has to be reindexed and maybe geocoded.
pub fn on_place_stored(place: &Place) -> Vec<Event> {
    let mut events = vec![Event::PlaceChanged(place.id.clone())];
    if place.needs_geocoding() {
        events.push(Event::PlaceNeedsGeocoding(place.id.clone()));
    }
    events
}

pub fn on_place_saved<R>(repo: &R, saved: &SavedPlace) -> Result<Vec<Event>>
where
    R: ActivityRepo + ConnectionRepo,
{
    let activity = Activity {
        id: Id::new(),
        user_id: saved.user_id.clone(),
        kind: ActivityType::SavePlace,
        target_user_id: None,
        target_place_id: Some(saved.place_id.clone()),
        data: Payload::new(),
        created_at: saved.saved_at,
    };
    Ok(vec![record_activity(repo, activity)?])
}

pub fn on_file_shared<R>(repo: &R, share: &SharedFile) -> Result<Vec<Event>>
where
    R: ActivityRepo + ConnectionRepo,
{
    let activity = Activity {
        id: Id::new(),
        user_id: share.shared_by.clone(),
        kind: ActivityType::Share,
        target_user_id: Some(share.shared_with.clone()),
        target_place_id: None,
        data: payload([
            ("file_id", share.file_id.to_string()),
            ("permission", share.permission.as_ref().to_owned()),
        ]),
        created_at: share.updated_at,
    };
    Ok(vec![record_activity(repo, activity)?])
}
