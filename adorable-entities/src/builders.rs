pub trait Builder {
    type Build;
    fn build() -> Self::Build;
}

pub use self::{place_builder::*, user_builder::*};

pub mod user_builder {

    use super::*;
    use crate::{email::*, id::*, password::*, time::*, user::*};

    #[derive(Debug)]
    pub struct UserBuild {
        user: User,
    }

    impl UserBuild {
        pub fn id(mut self, id: &str) -> Self {
            self.user.id = id.into();
            self
        }
        pub fn username(mut self, username: &str) -> Self {
            self.user.username = username.into();
            self
        }
        pub fn email(mut self, email: &str) -> Self {
            self.user.email = EmailAddress::new_unchecked(email.into());
            self
        }
        pub fn email_confirmed(mut self, confirmed: bool) -> Self {
            self.user.email_confirmed = confirmed;
            self
        }
        /// Hashing is slow, so only do it when a test really logs in.
        pub fn password(mut self, pw: &str) -> Self {
            self.user.password = pw.parse().unwrap();
            self
        }
        pub fn role(mut self, role: Role) -> Self {
            self.user.role = role;
            self
        }
        pub fn profile_public(mut self, public: bool) -> Self {
            self.user.privacy.profile_public = public;
            self
        }
        pub fn push_enabled(mut self, enabled: bool) -> Self {
            self.user.notifications.push_enabled = enabled;
            self
        }
        pub fn finish(self) -> User {
            self.user
        }
    }

    impl Builder for User {
        type Build = UserBuild;
        fn build() -> UserBuild {
            let id = Id::new();
            let now = Timestamp::now();
            UserBuild {
                user: User {
                    username: format!("user-{}", &id.as_str()[..8]),
                    email: EmailAddress::new_unchecked(format!("{id}@example.com")),
                    id,
                    email_confirmed: true,
                    password: Password::from_hash(String::new()),
                    role: Role::User,
                    profile: Profile::default(),
                    notifications: NotificationPreferences::default(),
                    privacy: PrivacySettings::default(),
                    created_at: now,
                    updated_at: now,
                },
            }
        }
    }
}

pub mod place_builder {

    use super::*;
    use crate::{geo::*, id::*, place::*, time::*};

    #[derive(Debug)]
    pub struct PlaceBuild {
        place: Place,
    }

    impl PlaceBuild {
        pub fn id(mut self, id: &str) -> Self {
            self.place.id = id.into();
            self
        }
        pub fn name(mut self, name: &str) -> Self {
            self.place.name = name.into();
            self
        }
        pub fn description(mut self, desc: &str) -> Self {
            self.place.description = desc.into();
            self
        }
        pub fn address(mut self, address: &str) -> Self {
            self.place.address = address.into();
            self
        }
        pub fn pos(mut self, pos: MapPoint) -> Self {
            self.place.pos = Some(pos);
            self
        }
        pub fn category(mut self, category: &str) -> Self {
            self.place.category = category.into();
            self
        }
        pub fn tags(mut self, tags: Vec<impl Into<String>>) -> Self {
            self.place.tags = tags.into_iter().map(|x| x.into()).collect();
            self
        }
        pub fn created_by(mut self, user_id: &Id) -> Self {
            self.place.created_by = Some(user_id.clone());
            self
        }
        pub fn finish(self) -> Place {
            self.place
        }
    }

    impl Builder for Place {
        type Build = PlaceBuild;
        fn build() -> PlaceBuild {
            let now = Timestamp::now();
            PlaceBuild {
                place: Place {
                    id: Id::new(),
                    name: "".into(),
                    description: "".into(),
                    address: "".into(),
                    pos: None,
                    category: "other".into(),
                    tags: vec![],
                    rating: Default::default(),
                    total_ratings: 0,
                    ranking_score: 0.0,
                    created_by: None,
                    created_at: now,
                    updated_at: now,
                },
            }
        }
    }
}
