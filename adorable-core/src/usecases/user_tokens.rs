use super::prelude::*;
use time::Duration;

/// How long confirmation and reset tokens stay valid.
pub const USER_TOKEN_LIFETIME: Duration = Duration::days(1);

pub fn refresh_user_token<R: UserTokenRepo>(
    repo: &R,
    email: EmailAddress,
    purpose: TokenPurpose,
    now: Timestamp,
) -> Result<EmailNonce> {
    let token = UserToken {
        email_nonce: EmailNonce::new(email),
        purpose,
        expires_at: now + USER_TOKEN_LIFETIME,
    };
    Ok(repo.replace_user_token(token)?)
}

fn consume_user_token<R: UserTokenRepo>(
    repo: &R,
    purpose: TokenPurpose,
    token: &str,
    now: Timestamp,
) -> Result<UserToken> {
    let email_nonce = EmailNonce::decode_from_str(token).map_err(|_| Error::TokenInvalid)?;
    let token = repo
        .consume_user_token(purpose, &email_nonce)
        .map_err(|err| match err {
            RepoError::NotFound => Error::TokenInvalid,
            err => Error::Repo(err),
        })?;
    debug_assert_eq!(email_nonce, token.email_nonce);
    if token.expires_at < now {
        return Err(Error::TokenExpired);
    }
    Ok(token)
}

pub fn confirm_email_address<R>(repo: &R, token: &str, now: Timestamp) -> Result<User>
where
    R: UserRepo + UserTokenRepo,
{
    let token = consume_user_token(repo, TokenPurpose::ConfirmEmail, token, now)?;
    let mut user = repo.get_user_by_email(&token.email_nonce.email)?;
    if !user.email_confirmed {
        user.email_confirmed = true;
        user.updated_at = now;
        repo.update_user(&user)?;
    }
    Ok(user)
}

/// Returns `None` for unknown addresses without revealing it to the caller.
pub fn request_password_reset<R>(
    repo: &R,
    email: &EmailAddress,
    now: Timestamp,
) -> Result<Option<EmailNonce>>
where
    R: UserRepo + UserTokenRepo,
{
    if repo.try_get_user_by_email(email)?.is_none() {
        log::info!("Password reset requested for unknown address");
        return Ok(None);
    }
    refresh_user_token(repo, email.clone(), TokenPurpose::ResetPassword, now).map(Some)
}

pub fn reset_password_with_token<R>(
    repo: &R,
    token: &str,
    new_password: &str,
    now: Timestamp,
) -> Result<User>
where
    R: UserRepo + UserTokenRepo,
{
    let new_password: Password = new_password.parse()?;
    let token = consume_user_token(repo, TokenPurpose::ResetPassword, token, now)?;
    let mut user = repo.get_user_by_email(&token.email_nonce.email)?;
    log::info!("Resetting password for user {}", user.id);
    // Receiving the token proves the ownership of the address.
    user.email_confirmed = true;
    user.password = new_password;
    user.updated_at = now;
    repo.update_user(&user)?;
    Ok(user)
}

pub fn delete_expired_user_tokens<R: UserTokenRepo>(repo: &R, now: Timestamp) -> Result<usize> {
    Ok(repo.delete_expired_user_tokens(now)?)
}

#[cfg(test)]
mod tests {
    use super::{super::tests::*, *};

    fn unconfirmed_user(db: &MockDb) -> User {
        let user = User::build()
            .email("a@foo.bar")
            .email_confirmed(false)
            .finish();
        db.users.borrow_mut().push(user.clone());
        user
    }

    #[test]
    fn confirm_email_of_existing_user() {
        let db = MockDb::default();
        let user = unconfirmed_user(&db);
        let now = Timestamp::now();
        let nonce =
            refresh_user_token(&db, user.email.clone(), TokenPurpose::ConfirmEmail, now).unwrap();
        let token = nonce.encode_to_string();
        assert!(confirm_email_address(&db, &token, now).unwrap().email_confirmed);
        assert!(db.users.borrow()[0].email_confirmed);
        // tokens can only be used once
        assert!(matches!(
            confirm_email_address(&db, &token, now),
            Err(Error::TokenInvalid)
        ));
    }

    #[test]
    fn reject_expired_and_foreign_tokens() {
        let db = MockDb::default();
        let user = unconfirmed_user(&db);
        let now = Timestamp::now();
        let nonce =
            refresh_user_token(&db, user.email.clone(), TokenPurpose::ResetPassword, now).unwrap();
        // a reset token cannot confirm an address
        assert!(matches!(
            confirm_email_address(&db, &nonce.encode_to_string(), now),
            Err(Error::TokenInvalid)
        ));
        assert!(matches!(
            reset_password_with_token(
                &db,
                &nonce.encode_to_string(),
                "new secret",
                now + Duration::days(2)
            ),
            Err(Error::TokenExpired)
        ));
        assert!(matches!(
            confirm_email_address(&db, "garbage", now),
            Err(Error::TokenInvalid)
        ));
    }

    #[test]
    fn reset_password() {
        let db = MockDb::default();
        let user = unconfirmed_user(&db);
        let now = Timestamp::now();
        let nonce = request_password_reset(&db, &user.email, now)
            .unwrap()
            .unwrap();
        let updated =
            reset_password_with_token(&db, &nonce.encode_to_string(), "new secret", now).unwrap();
        assert!(updated.password.verify("new secret"));
        assert!(updated.email_confirmed);

        let unknown = "nobody@foo.bar".parse().unwrap();
        assert!(request_password_reset(&db, &unknown, now).unwrap().is_none());
    }

    #[test]
    fn delete_expired_tokens() {
        let db = MockDb::default();
        let now = Timestamp::now();
        for i in 0..3 {
            let email = EmailAddress::new_unchecked(format!("{i}@foo.bar"));
            refresh_user_token(&db, email, TokenPurpose::ConfirmEmail, now - Duration::days(i))
                .unwrap();
        }
        assert_eq!(1, delete_expired_user_tokens(&db, now).unwrap());
        assert_eq!(2, db.user_tokens.borrow().len());
    }
}
