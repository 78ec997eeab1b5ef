pub use adorable_boundary::*;

use crate::core::{entities as e, usecases};

pub mod from_json {
    //! JSON -> Entity

    use super::*;

    // NOTE:
    // We cannot impl From<T> here, because the JSON structs
    // and the entities both are outside this crate.

    pub fn new_user(from: RegisterUser) -> usecases::NewUser {
        let RegisterUser {
            username,
            email,
            password,
            first_name,
            last_name,
        } = from;
        usecases::NewUser {
            username,
            email,
            password,
            first_name,
            last_name,
        }
    }

    pub fn update_profile(from: UpdateProfile) -> usecases::UpdateProfile {
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
        } = from;
        usecases::UpdateProfile {
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
        }
    }

    pub fn new_location(from: NewLocation) -> usecases::NewLocation {
        let NewLocation {
            name,
            address,
            lat,
            lng,
            kind,
            is_primary,
            notes,
        } = from;
        usecases::NewLocation {
            name,
            address,
            lat,
            lng,
            kind: kind.into(),
            is_primary,
            notes,
        }
    }

    pub fn new_place(from: NewPlace) -> usecases::NewPlace {
        let NewPlace {
            name,
            description,
            address,
            lat,
            lng,
            category,
            tags,
        } = from;
        usecases::NewPlace {
            name,
            description,
            address,
            lat,
            lng,
            category,
            tags,
        }
    }

    pub fn new_review(from: NewReview) -> usecases::NewReview {
        let NewReview {
            place_id,
            rating,
            review,
        } = from;
        usecases::NewReview {
            place_id: place_id.into(),
            rating,
            review,
        }
    }

    pub fn new_report(from: NewReport) -> usecases::NewReport {
        let NewReport {
            reported_user_id,
            reason,
            description,
        } = from;
        usecases::NewReport {
            reported_user_id: reported_user_id.into(),
            reason: reason.into(),
            description,
        }
    }

    pub fn new_chat(from: NewChat) -> usecases::NewChat {
        let NewChat {
            participants,
            is_group_chat,
            title,
        } = from;
        usecases::NewChat {
            participants: participants.into_iter().map(e::Id::from).collect(),
            is_group_chat,
            title,
        }
    }

    pub fn new_message(from: NewMessage) -> usecases::NewMessage {
        let NewMessage {
            content,
            attachment,
        } = from;
        usecases::NewMessage {
            content,
            attachment: attachment.map(Into::into),
        }
    }

    pub fn update_file(from: UpdateFile) -> usecases::UpdateFile {
        let UpdateFile {
            title,
            description,
            tags,
            is_public,
            password,
        } = from;
        usecases::UpdateFile {
            title,
            description,
            tags,
            is_public,
            password,
        }
    }

    pub fn new_share(from: NewShare) -> usecases::ShareFile {
        let NewShare {
            file_id,
            shared_with,
            permission,
            can_reshare,
            expires_at,
        } = from;
        usecases::ShareFile {
            file_id: file_id.into(),
            shared_with: shared_with.into(),
            permission: permission.into(),
            can_reshare,
            expires_at: expires_at.map(e::Timestamp::from_secs),
        }
    }
}

pub mod to_json {
    //! Entity -> JSON for everything that needs more than the entity itself

    use super::*;
    use adorable_application::health;
    use adorable_core::{
        circuit_breaker::CircuitStatus, gateways::storage::FileStorage,
        monitoring::RequestSummary, security::ApiCredentials,
    };

    pub fn user(from: usecases::ProfileView) -> User {
        let usecases::ProfileView {
            user,
            followers_count,
            following_count,
        } = from;
        let e::User {
            id,
            username,
            profile,
            created_at,
            ..
        } = user;
        User {
            id: id.into(),
            username,
            first_name: profile.first_name,
            last_name: profile.last_name,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
            followers_count,
            following_count,
            created_at: created_at.as_secs(),
        }
    }

    pub fn current_user(from: usecases::ProfileView) -> CurrentUser {
        let usecases::ProfileView {
            user,
            followers_count,
            following_count,
        } = from;
        let e::User {
            id,
            username,
            email,
            email_confirmed,
            password: _,
            role,
            profile,
            notifications,
            privacy,
            created_at,
            updated_at,
        } = user;
        let e::Profile {
            first_name,
            last_name,
            phone_number,
            bio,
            avatar_url,
            date_of_birth,
            language,
            timezone,
        } = profile;
        CurrentUser {
            id: id.into(),
            username,
            email: email.into_string(),
            email_confirmed,
            role: role.into(),
            first_name,
            last_name,
            phone_number,
            bio,
            avatar_url,
            date_of_birth,
            language,
            timezone,
            notifications: NotificationPreferences {
                push_enabled: notifications.push_enabled,
                digest_enabled: notifications.digest_enabled,
            },
            profile_public: privacy.profile_public,
            followers_count,
            following_count,
            created_at: created_at.as_secs(),
            updated_at: updated_at.as_secs(),
        }
    }

    pub fn file(from: e::File, storage: &dyn FileStorage) -> File {
        let url = storage.url(&from.storage_path);
        (from, url).into()
    }

    fn service_health(from: health::ServiceHealth) -> (String, ServiceHealth) {
        let health::ServiceHealth {
            name,
            status,
            error,
            response_time_ms,
            details,
            checked_at,
        } = from;
        (
            name,
            ServiceHealth {
                status: status.as_str().to_owned(),
                error,
                response_time_ms,
                details,
                timestamp: checked_at.as_secs(),
            },
        )
    }

    pub fn health_report(from: health::HealthReport) -> HealthReport {
        let health::HealthReport {
            status,
            services,
            checked_at,
        } = from;
        HealthReport {
            status: status.as_str().to_owned(),
            timestamp: checked_at.as_secs(),
            services: services.into_iter().map(service_health).collect(),
        }
    }

    pub fn single_service_health(from: health::ServiceHealth) -> ServiceHealth {
        service_health(from).1
    }

    pub fn request_metrics(from: RequestSummary) -> RequestMetrics {
        let RequestSummary {
            period_hours,
            total_requests,
            average_duration_ms,
            status_classes,
        } = from;
        RequestMetrics {
            period_hours,
            total_requests,
            average_duration_ms,
            status_classes,
        }
    }

    pub fn circuit_breaker_status(from: CircuitStatus) -> CircuitBreakerStatus {
        let CircuitStatus {
            name,
            state,
            failures,
        } = from;
        CircuitBreakerStatus {
            name,
            state: state.as_str().to_owned(),
            failures,
        }
    }

    pub fn api_key_pair(from: ApiCredentials, expires_in: u64) -> ApiKeyPair {
        let ApiCredentials {
            api_key,
            api_secret,
            allowed_ips: _,
        } = from;
        ApiKeyPair {
            api_key,
            api_secret,
            expires_in,
        }
    }
}
