use num_derive::{FromPrimitive, ToPrimitive};

use crate::{email::EmailAddress, id::Id, password::Password, time::Timestamp};

#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id              : Id,
    pub username        : String,
    pub email           : EmailAddress,
    pub email_confirmed : bool,
    pub password        : Password,
    pub role            : Role,
    pub profile         : Profile,
    pub notifications   : NotificationPreferences,
    pub privacy         : PrivacySettings,
    pub created_at      : Timestamp,
    pub updated_at      : Timestamp,
}

impl User {
    pub fn is_staff(&self) -> bool {
        self.role >= Role::Staff
    }
}

#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub first_name    : Option<String>,
    pub last_name     : Option<String>,
    pub phone_number  : Option<String>,
    pub bio           : Option<String>,
    pub avatar_url    : Option<String>,
    pub date_of_birth : Option<String>,
    pub language      : String,
    pub timezone      : String,
}

impl Profile {
    pub const MAX_BIO_LEN: usize = 500;
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            first_name: None,
            last_name: None,
            phone_number: None,
            bio: None,
            avatar_url: None,
            date_of_birth: None,
            language: "en".into(),
            timezone: "UTC".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPreferences {
    pub push_enabled: bool,
    pub digest_enabled: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            push_enabled: true,
            digest_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivacySettings {
    pub profile_public: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            profile_public: true,
        }
    }
}

#[rustfmt::skip]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, FromPrimitive, ToPrimitive)]
pub enum Role {
    #[default]
    Guest = 0,
    User  = 1,
    Staff = 2,
    Admin = 3,
}

/// A push registration token of one of the user's devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceToken {
    pub user_id: Id,
    pub token: String,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::{FromPrimitive, ToPrimitive};

    #[test]
    fn role_ordering() {
        assert!(Role::Admin > Role::Staff);
        assert!(Role::Staff > Role::User);
        assert_eq!(Role::Guest, Role::default());
    }

    #[test]
    fn role_numeric_representation() {
        assert_eq!(Some(2), Role::Staff.to_i16());
        assert_eq!(Some(Role::Admin), Role::from_i16(3));
        assert_eq!(None, Role::from_i16(4));
    }
}
