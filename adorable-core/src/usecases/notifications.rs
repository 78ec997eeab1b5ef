use super::prelude::*;

pub fn load_notifications<R: NotificationRepo>(
    repo: &R,
    user_id: &Id,
    unread_only: bool,
    limit: Option<u32>,
) -> Result<Vec<Notification>> {
    let limit = super::effective_limit(limit)?;
    Ok(repo.load_notifications(user_id, unread_only, Some(limit))?)
}

fn get_own_notification<R: NotificationRepo>(repo: &R, user_id: &Id, id: &Id) -> Result<Notification> {
    let notification = repo.get_notification(id)?;
    if &notification.user_id != user_id {
        return Err(Error::Repo(RepoError::NotFound));
    }
    Ok(notification)
}

pub fn mark_notification_read<R: NotificationRepo>(repo: &R, user_id: &Id, id: &Id) -> Result<Notification> {
    let mut notification = get_own_notification(repo, user_id, id)?;
    if !notification.is_read {
        repo.mark_notifications_read(&[notification.id.clone()])?;
        notification.is_read = true;
    }
    Ok(notification)
}

/// Returns the number of notifications that have been marked.
pub fn mark_all_notifications_read<R: NotificationRepo>(repo: &R, user_id: &Id) -> Result<usize> {
    Ok(repo.mark_all_notifications_read(user_id)?)
}

pub fn delete_notification<R: NotificationRepo>(repo: &R, user_id: &Id, id: &Id) -> Result<()> {
    let notification = get_own_notification(repo, user_id, id)?;
    Ok(repo.delete_notification(&notification.id)?)
}
