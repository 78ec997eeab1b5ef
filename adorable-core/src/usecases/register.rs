use super::prelude::*;
use crate::gateways::identity::VerifiedIdentity;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub fn register_user<R: UserRepo>(repo: &R, new_user: NewUser, now: Timestamp) -> Result<User> {
    let NewUser {
        username,
        email,
        password,
        first_name,
        last_name,
    } = new_user;
    let username = username.trim().to_owned();
    if !validate::is_valid_username(&username) {
        return Err(Error::Username);
    }
    let email: EmailAddress = email.parse()?;
    let password: Password = password.parse()?;
    if repo.try_get_user_by_email(&email)?.is_some() {
        return Err(Error::UserExists);
    }
    if repo.try_get_user_by_username(&username)?.is_some() {
        return Err(Error::UsernameTaken);
    }
    let user = User {
        id: Id::new(),
        username,
        email,
        email_confirmed: false,
        password,
        role: Role::User,
        profile: Profile {
            first_name: validate::non_empty(first_name),
            last_name: validate::non_empty(last_name),
            ..Default::default()
        },
        notifications: Default::default(),
        privacy: Default::default(),
        created_at: now,
        updated_at: now,
    };
    log::debug!("Creating new user: username = {}", user.username);
    repo.create_user(&user)?;
    Ok(user)
}

/// Find the local account of an identity that has been
/// verified by an external provider or create a new one.
pub fn get_or_create_user_by_identity<R: UserRepo>(
    repo: &R,
    identity: &VerifiedIdentity,
    now: Timestamp,
) -> Result<User> {
    let email = identity.email.clone();
    if let Some(mut user) = repo.try_get_user_by_email(&email)? {
        if identity.email_verified && !user.email_confirmed {
            user.email_confirmed = true;
            user.updated_at = now;
            repo.update_user(&user)?;
        }
        return Ok(user);
    }
    let username = unique_username(repo, email.as_str())?;
    let user = User {
        id: Id::new(),
        username,
        email,
        email_confirmed: identity.email_verified,
        // Such accounts can only log in through the identity provider.
        password: Password::from_hash(String::new()),
        role: Role::User,
        profile: Default::default(),
        notifications: Default::default(),
        privacy: Default::default(),
        created_at: now,
        updated_at: now,
    };
    log::info!(
        "Creating user {} for external identity {}",
        user.username,
        identity.uid
    );
    repo.create_user(&user)?;
    Ok(user)
}

/// Derive a free username from the local part of an email address.
fn unique_username<R: UserRepo>(repo: &R, email: &str) -> Result<String> {
    let local_part = email.split('@').next().unwrap_or_default();
    let mut base: String = local_part
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .take(24)
        .collect();
    while base.len() < 3 {
        base.push('_');
    }
    let mut candidate = base.clone();
    let mut suffix = 0;
    loop {
        if repo.try_get_user_by_username(&candidate)?.is_none() {
            return Ok(candidate);
        }
        suffix += 1;
        candidate = format!("{base}{suffix}");
    }
}
