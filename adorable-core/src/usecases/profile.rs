use super::prelude::*;

/// Changes of the own account. Fields that are `None` stay untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub push_enabled: Option<bool>,
    pub digest_enabled: Option<bool>,
    pub profile_public: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ProfileView {
    pub user: User,
    pub followers_count: usize,
    pub following_count: usize,
}

pub fn update_profile<R: UserRepo>(
    repo: &R,
    user_id: &Id,
    update: UpdateProfile,
    now: Timestamp,
) -> Result<User> {
    let mut user = repo.get_user(user_id)?;
    let UpdateProfile {
        username,
        first_name,
        last_name,
        phone_number,
        bio,
        date_of_birth,
        language,
        timezone,
        push_enabled,
        digest_enabled,
        profile_public,
    } = update;
    if let Some(username) = username.map(|u| u.trim().to_owned()) {
        if username != user.username {
            if !validate::is_valid_username(&username) {
                return Err(Error::Username);
            }
            if repo.try_get_user_by_username(&username)?.is_some() {
                return Err(Error::UsernameTaken);
            }
            user.username = username;
        }
    }
    let profile = &mut user.profile;
    if first_name.is_some() {
        profile.first_name = validate::non_empty(first_name);
    }
    if last_name.is_some() {
        profile.last_name = validate::non_empty(last_name);
    }
    if phone_number.is_some() {
        let phone_number = validate::non_empty(phone_number);
        if let Some(nr) = &phone_number {
            if !validate::is_valid_phone_number(nr) {
                return Err(Error::Phone);
            }
        }
        profile.phone_number = phone_number;
    }
    if bio.is_some() {
        let bio = validate::non_empty(bio);
        if bio
            .as_ref()
            .map(|b| b.chars().count() > Profile::MAX_BIO_LEN)
            .unwrap_or(false)
        {
            return Err(Error::TextTooLong);
        }
        profile.bio = bio;
    }
    if date_of_birth.is_some() {
        profile.date_of_birth = validate::non_empty(date_of_birth);
    }
    if let Some(language) = validate::non_empty(language) {
        profile.language = language;
    }
    if let Some(timezone) = validate::non_empty(timezone) {
        profile.timezone = timezone;
    }
    if let Some(enabled) = push_enabled {
        user.notifications.push_enabled = enabled;
    }
    if let Some(enabled) = digest_enabled {
        user.notifications.digest_enabled = enabled;
    }
    if let Some(public) = profile_public {
        user.privacy.profile_public = public;
    }
    user.updated_at = now;
    repo.update_user(&user)?;
    Ok(user)
}

pub fn set_avatar_url<R: UserRepo>(
    repo: &R,
    user_id: &Id,
    avatar_url: String,
    now: Timestamp,
) -> Result<User> {
    let mut user = repo.get_user(user_id)?;
    user.profile.avatar_url = Some(avatar_url);
    user.updated_at = now;
    repo.update_user(&user)?;
    Ok(user)
}

pub fn profile_view<R: ConnectionRepo>(repo: &R, user: User) -> Result<ProfileView> {
    Ok(ProfileView {
        followers_count: repo.count_followers(&user.id)?,
        following_count: repo.count_following(&user.id)?,
        user,
    })
}

pub fn get_own_profile<R>(repo: &R, user_id: &Id) -> Result<ProfileView>
where
    R: UserRepo + ConnectionRepo,
{
    let user = repo.get_user(user_id)?;
    profile_view(repo, user)
}

/// Private profiles are only visible to their owner and staff.
pub fn get_profile<R>(repo: &R, viewer: &User, user_id: &Id) -> Result<ProfileView>
where
    R: UserRepo + ConnectionRepo,
{
    let user = repo.get_user(user_id)?;
    if !user.privacy.profile_public && &viewer.id != user_id && !viewer.is_staff() {
        return Err(Error::Forbidden);
    }
    profile_view(repo, user)
}

pub fn search_users<R: UserRepo>(
    repo: &R,
    viewer: &User,
    text: &str,
    limit: Option<u32>,
) -> Result<Vec<User>> {
    let limit = super::effective_limit(limit)?;
    let text = text.trim();
    let users = repo.search_users(text, limit)?;
    if viewer.is_staff() {
        return Ok(users);
    }
    Ok(users
        .into_iter()
        .filter(|u| u.privacy.profile_public || u.id == viewer.id)
        .collect())
}

pub fn delete_own_account<R: UserRepo>(repo: &R, user_id: &Id) -> Result<()> {
    log::info!("Deleting user {user_id}");
    Ok(repo.delete_user(user_id)?)
}

pub fn register_device_token<R: DeviceTokenRepo>(
    repo: &R,
    user_id: &Id,
    token: &str,
    now: Timestamp,
) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::TokenInvalid);
    }
    Ok(repo.add_device_token(&DeviceToken {
        user_id: user_id.clone(),
        token: token.to_owned(),
        created_at: now,
    })?)
}

pub fn remove_device_token<R: DeviceTokenRepo>(repo: &R, user_id: &Id, token: &str) -> Result<()> {
    Ok(repo.remove_device_token(user_id, token)?)
}
