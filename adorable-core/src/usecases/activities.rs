use super::prelude::*;

pub fn load_own_activities<R: ActivityRepo>(
    repo: &R,
    user_id: &Id,
    limit: Option<u32>,
) -> Result<Vec<Activity>> {
    let limit = super::effective_limit(limit)?;
    Ok(repo.load_activities_of_users(&[user_id.clone()], limit)?)
}

/// The activities of all users the given user follows, newest first.
pub fn load_activity_feed<R>(repo: &R, user_id: &Id, limit: Option<u32>) -> Result<Vec<Activity>>
where
    R: ActivityRepo + ConnectionRepo,
{
    let limit = super::effective_limit(limit)?;
    let actors: Vec<_> = repo
        .load_following(user_id)?
        .into_iter()
        .map(|c| c.following_id)
        .collect();
    if actors.is_empty() {
        return Ok(vec![]);
    }
    Ok(repo.load_activities_of_users(&actors, limit)?)
}
