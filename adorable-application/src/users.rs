use adorable_core::gateways::{
    identity::IdentityProvider, notify::NotificationGateway, storage::FileStorage,
};

use super::{dispatch::EventDispatcher, *};

pub fn register_user(
    connections: &sqlite::Connections,
    notify: &dyn NotificationGateway,
    new_user: usecases::NewUser,
    confirm_email_url: &str,
) -> Result<User> {
    let now = Timestamp::now();
    let (user, email_nonce) = connections.exclusive()?.transaction(|conn| {
        let user = usecases::register_user(conn, new_user, now)?;
        let email_nonce = usecases::refresh_user_token(
            conn,
            user.email.clone(),
            TokenPurpose::ConfirmEmail,
            now,
        )?;
        Ok::<_, usecases::Error>((user, email_nonce))
    })?;
    let url = format!(
        "{confirm_email_url}?token={}",
        email_nonce.encode_to_string()
    );
    notify.user_registered(&user, &url);
    Ok(user)
}

pub fn confirm_email_address(connections: &sqlite::Connections, token: &str) -> Result<User> {
    let now = Timestamp::now();
    Ok(connections
        .exclusive()?
        .transaction(|conn| usecases::confirm_email_address(conn, token, now))?)
}

/// Unknown addresses are silently ignored.
pub fn reset_password_request(
    connections: &sqlite::Connections,
    notify: &dyn NotificationGateway,
    email: &str,
) -> Result<()> {
    let email: EmailAddress = email.parse()?;
    let now = Timestamp::now();
    let email_nonce = connections
        .exclusive()?
        .transaction(|conn| usecases::request_password_reset(conn, &email, now))?;
    match email_nonce {
        Some(email_nonce) => notify.user_reset_password_requested(&email_nonce),
        None => info!("Password reset requested for an unknown e-mail address"),
    }
    Ok(())
}

pub fn reset_password_with_token(
    connections: &sqlite::Connections,
    token: &str,
    new_password: &str,
) -> Result<User> {
    let now = Timestamp::now();
    Ok(connections.exclusive()?.transaction(|conn| {
        usecases::reset_password_with_token(conn, token, new_password, now).inspect_err(|err| {
            warn!("Failed to reset password: {err}");
        })
    })?)
}

/// Map an ID token of the identity provider to a local account.
///
/// `None` if the token has been rejected.
pub fn sign_in_with_identity(
    connections: &sqlite::Connections,
    identity_provider: &dyn IdentityProvider,
    id_token: &str,
) -> Result<Option<User>> {
    let Some(identity) = identity_provider.verify_id_token(id_token) else {
        return Ok(None);
    };
    let now = Timestamp::now();
    let user = connections
        .exclusive()?
        .transaction(|conn| usecases::get_or_create_user_by_identity(conn, &identity, now))?;
    Ok(Some(user))
}

/// An uploaded image that replaces the avatar of the user.
pub struct NewAvatar<'a> {
    pub original_name: String,
    pub mime_type: String,
    pub content: &'a [u8],
}

/// Stores the image and schedules the creation
/// of the thumbnail that becomes the avatar.
pub fn upload_avatar(
    connections: &sqlite::Connections,
    storage: &dyn FileStorage,
    dispatcher: &EventDispatcher,
    user_id: &Id,
    avatar: NewAvatar,
) -> Result<File> {
    let NewAvatar {
        original_name,
        mime_type,
        content,
    } = avatar;
    if FileType::from_mime_type(&mime_type) != FileType::Image {
        return Err(usecases::Error::NotAnImage.into());
    }
    let now = Timestamp::now();
    let new_file = usecases::NewFile {
        original_name,
        size: content.len() as u64,
        mime_type,
        title: None,
        description: String::new(),
        tags: vec![],
        is_public: true,
        password: None,
    };
    let file = connections.exclusive()?.transaction(|conn| {
        let file = usecases::create_file(conn, user_id, new_file, now)?;
        storage
            .store(&file.storage_path, content)
            .map_err(RepoError::Other)?;
        Ok::<_, usecases::Error>(file)
    })?;
    dispatcher.dispatch(vec![Event::ImageUploaded {
        file_id: file.id.clone(),
        avatar_of: Some(user_id.clone()),
    }]);
    Ok(file)
}
