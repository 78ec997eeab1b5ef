use super::*;
use num_traits::{FromPrimitive as _, ToPrimitive as _};

impl<C> UserRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn create_user(&self, user: &User) -> Result<()> {
        create_user(&mut self.sqlite_conn(), user)
    }
    fn update_user(&self, user: &User) -> Result<()> {
        update_user(&mut self.sqlite_conn(), user)
    }
    fn delete_user(&self, id: &Id) -> Result<()> {
        delete_user(&mut self.sqlite_conn(), id)
    }

    fn get_user(&self, id: &Id) -> Result<User> {
        get_user(&mut self.sqlite_conn(), id)
    }
    fn get_users(&self, ids: &[Id]) -> Result<Vec<User>> {
        get_users(&mut self.sqlite_conn(), ids)
    }
    fn try_get_user_by_email(&self, email: &EmailAddress) -> Result<Option<User>> {
        try_get_user_by_email(&mut self.sqlite_conn(), email)
    }
    fn try_get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        try_get_user_by_username(&mut self.sqlite_conn(), username)
    }

    fn search_users(&self, text: &str, limit: u32) -> Result<Vec<User>> {
        search_users(&mut self.sqlite_conn(), text, limit)
    }
    fn count_users(&self) -> Result<usize> {
        count_users(&mut self.sqlite_conn())
    }
}

impl<C> DeviceTokenRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn add_device_token(&self, token: &DeviceToken) -> Result<()> {
        add_device_token(&mut self.sqlite_conn(), token)
    }
    fn remove_device_token(&self, user_id: &Id, token: &str) -> Result<()> {
        remove_device_token(&mut self.sqlite_conn(), user_id, token)
    }
    fn load_device_tokens(&self, user_ids: &[Id]) -> Result<Vec<DeviceToken>> {
        load_device_tokens(&mut self.sqlite_conn(), user_ids)
    }
}

impl<C> UserTokenRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn replace_user_token(&self, token: UserToken) -> Result<EmailNonce> {
        replace_user_token(&mut self.sqlite_conn(), token)
    }
    fn consume_user_token(
        &self,
        purpose: TokenPurpose,
        email_nonce: &EmailNonce,
    ) -> Result<UserToken> {
        consume_user_token(&mut self.sqlite_conn(), purpose, email_nonce)
    }
    fn delete_expired_user_tokens(&self, expired_before: Timestamp) -> Result<usize> {
        delete_expired_user_tokens(&mut self.sqlite_conn(), expired_before)
    }
}

impl From<&User> for models::UserEntity {
    fn from(u: &User) -> Self {
        let User {
            id,
            username,
            email,
            email_confirmed,
            password,
            role,
            profile,
            notifications,
            privacy,
            created_at,
            updated_at,
        } = u;
        Self {
            id: id.to_string(),
            username: username.clone(),
            email: email.as_str().to_owned(),
            email_confirmed: *email_confirmed,
            password: password.as_hash().to_owned(),
            role: role.to_i16().unwrap_or_default(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone_number: profile.phone_number.clone(),
            bio: profile.bio.clone(),
            avatar_url: profile.avatar_url.clone(),
            date_of_birth: profile.date_of_birth.clone(),
            language: profile.language.clone(),
            timezone: profile.timezone.clone(),
            push_enabled: notifications.push_enabled,
            digest_enabled: notifications.digest_enabled,
            profile_public: privacy.profile_public,
            created_at: created_at.as_millis(),
            updated_at: updated_at.as_millis(),
        }
    }
}

impl TryFrom<models::UserEntity> for User {
    type Error = repo::Error;

    fn try_from(from: models::UserEntity) -> Result<Self> {
        let models::UserEntity {
            id,
            username,
            email,
            email_confirmed,
            password,
            role,
            first_name,
            last_name,
            phone_number,
            bio,
            avatar_url,
            date_of_birth,
            language,
            timezone,
            push_enabled,
            digest_enabled,
            profile_public,
            created_at,
            updated_at,
        } = from;
        let role = Role::from_i16(role).ok_or_else(|| anyhow!("Invalid role: {role}"))?;
        Ok(User {
            id: id.into(),
            username,
            email: EmailAddress::new_unchecked(email),
            email_confirmed,
            password: Password::from_hash(password),
            role,
            profile: Profile {
                first_name,
                last_name,
                phone_number,
                bio,
                avatar_url,
                date_of_birth,
                language,
                timezone,
            },
            notifications: NotificationPreferences {
                push_enabled,
                digest_enabled,
            },
            privacy: PrivacySettings { profile_public },
            created_at: Timestamp::from_millis(created_at),
            updated_at: Timestamp::from_millis(updated_at),
        })
    }
}

fn create_user(conn: &mut SqliteConnection, u: &User) -> Result<()> {
    let new_user = models::UserEntity::from(u);
    diesel::insert_into(schema::users::table)
        .values(&new_user)
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn update_user(conn: &mut SqliteConnection, u: &User) -> Result<()> {
    use schema::users::dsl;
    let user = models::UserEntity::from(u);
    let count = diesel::update(dsl::users.filter(dsl::id.eq(&user.id)))
        .set(&user)
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn delete_user(conn: &mut SqliteConnection, id: &Id) -> Result<()> {
    use schema::users::dsl;
    let count = diesel::delete(dsl::users.filter(dsl::id.eq(id.as_str())))
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn get_user(conn: &mut SqliteConnection, id: &Id) -> Result<User> {
    use schema::users::dsl;
    dsl::users
        .filter(dsl::id.eq(id.as_str()))
        .first::<models::UserEntity>(conn)
        .map_err(from_diesel_err)?
        .try_into()
}

fn get_users(conn: &mut SqliteConnection, ids: &[Id]) -> Result<Vec<User>> {
    use schema::users::dsl;
    dsl::users
        .filter(dsl::id.eq_any(ids_to_strings(ids)))
        .load::<models::UserEntity>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}

fn try_get_user_by_email(conn: &mut SqliteConnection, email: &EmailAddress) -> Result<Option<User>> {
    use schema::users::dsl;
    dsl::users
        .filter(dsl::email.eq(email.as_str()))
        .first::<models::UserEntity>(conn)
        .optional()
        .map_err(from_diesel_err)?
        .map(TryInto::try_into)
        .transpose()
}

fn try_get_user_by_username(conn: &mut SqliteConnection, username: &str) -> Result<Option<User>> {
    use schema::users::dsl;
    dsl::users
        .filter(dsl::username.eq(username))
        .first::<models::UserEntity>(conn)
        .optional()
        .map_err(from_diesel_err)?
        .map(TryInto::try_into)
        .transpose()
}

fn search_users(conn: &mut SqliteConnection, text: &str, limit: u32) -> Result<Vec<User>> {
    use schema::users::dsl;
    let pattern = like_pattern(text);
    dsl::users
        .filter(
            dsl::username
                .like(&pattern)
                .nullable()
                .or(dsl::first_name.like(&pattern))
                .or(dsl::last_name.like(&pattern)),
        )
        .order_by(dsl::username)
        .limit(to_limit(limit))
        .load::<models::UserEntity>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}

fn count_users(conn: &mut SqliteConnection) -> Result<usize> {
    use schema::users::dsl;
    Ok(dsl::users
        .select(diesel::dsl::count(dsl::id))
        .first::<i64>(conn)
        .map_err(from_diesel_err)? as usize)
}

fn add_device_token(conn: &mut SqliteConnection, token: &DeviceToken) -> Result<()> {
    let DeviceToken {
        user_id,
        token,
        created_at,
    } = token;
    diesel::insert_or_ignore_into(schema::device_tokens::table)
        .values(&models::DeviceTokenEntity {
            user_id: user_id.to_string(),
            token: token.clone(),
            created_at: created_at.as_millis(),
        })
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn remove_device_token(conn: &mut SqliteConnection, user_id: &Id, token: &str) -> Result<()> {
    use schema::device_tokens::dsl;
    diesel::delete(
        dsl::device_tokens
            .filter(dsl::user_id.eq(user_id.as_str()))
            .filter(dsl::token.eq(token)),
    )
    .execute(conn)
    .map_err(from_diesel_err)?;
    Ok(())
}

fn load_device_tokens(conn: &mut SqliteConnection, user_ids: &[Id]) -> Result<Vec<DeviceToken>> {
    use schema::device_tokens::dsl;
    Ok(dsl::device_tokens
        .filter(dsl::user_id.eq_any(ids_to_strings(user_ids)))
        .load::<models::DeviceTokenEntity>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(
            |models::DeviceTokenEntity {
                 user_id,
                 token,
                 created_at,
             }| DeviceToken {
                user_id: user_id.into(),
                token,
                created_at: Timestamp::from_millis(created_at),
            },
        )
        .collect())
}

fn replace_user_token(conn: &mut SqliteConnection, token: UserToken) -> Result<EmailNonce> {
    use schema::users::dsl as u_dsl;
    let UserToken {
        email_nonce,
        purpose,
        expires_at,
    } = token;
    let user_id = u_dsl::users
        .select(u_dsl::id)
        .filter(u_dsl::email.eq(email_nonce.email.as_str()))
        .first::<String>(conn)
        .map_err(from_diesel_err)?;
    let model = models::UserTokenEntity {
        user_id,
        purpose: purpose.as_ref().to_owned(),
        nonce: email_nonce.nonce.to_string(),
        expires_at: expires_at.as_millis(),
    };
    diesel::replace_into(schema::user_tokens::table)
        .values(&model)
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(email_nonce)
}

fn consume_user_token(
    conn: &mut SqliteConnection,
    purpose: TokenPurpose,
    email_nonce: &EmailNonce,
) -> Result<UserToken> {
    use schema::{user_tokens::dsl as t_dsl, users::dsl as u_dsl};
    let token = t_dsl::user_tokens
        .inner_join(u_dsl::users)
        .select((t_dsl::user_id, t_dsl::expires_at))
        .filter(t_dsl::purpose.eq(purpose.as_ref()))
        .filter(t_dsl::nonce.eq(email_nonce.nonce.to_string()))
        .filter(u_dsl::email.eq(email_nonce.email.as_str()))
        .first::<(String, i64)>(conn)
        .map_err(from_diesel_err)?;
    let (user_id, expires_at) = token;
    diesel::delete(
        t_dsl::user_tokens
            .filter(t_dsl::user_id.eq(&user_id))
            .filter(t_dsl::purpose.eq(purpose.as_ref())),
    )
    .execute(conn)
    .map_err(from_diesel_err)?;
    Ok(UserToken {
        email_nonce: email_nonce.clone(),
        purpose,
        expires_at: Timestamp::from_millis(expires_at),
    })
}

fn delete_expired_user_tokens(
    conn: &mut SqliteConnection,
    expired_before: Timestamp,
) -> Result<usize> {
    use schema::user_tokens::dsl;
    diesel::delete(dsl::user_tokens.filter(dsl::expires_at.lt(expired_before.as_millis())))
        .execute(conn)
        .map_err(from_diesel_err)
}
