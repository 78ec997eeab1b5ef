use super::*;
use adorable_entities as e;

fn secs(t: e::time::Timestamp) -> i64 {
    t.as_secs()
}

fn ids(ids: Vec<e::id::Id>) -> Vec<String> {
    ids.into_iter().map(String::from).collect()
}

fn lat_lng(pos: Option<e::geo::MapPoint>) -> (Option<f64>, Option<f64>) {
    pos.map(|p| (Some(p.lat()), Some(p.lng())))
        .unwrap_or_default()
}

impl From<e::user::Role> for UserRole {
    fn from(from: e::user::Role) -> Self {
        use e::user::Role::*;
        match from {
            Guest => UserRole::Guest,
            User => UserRole::User,
            Staff => UserRole::Staff,
            Admin => UserRole::Admin,
        }
    }
}

impl From<UserRole> for e::user::Role {
    fn from(from: UserRole) -> Self {
        use e::user::Role::*;
        match from {
            UserRole::Guest => Guest,
            UserRole::User => User,
            UserRole::Staff => Staff,
            UserRole::Admin => Admin,
        }
    }
}

impl From<e::location::LocationType> for LocationType {
    fn from(from: e::location::LocationType) -> Self {
        use e::location::LocationType as E;
        match from {
            E::Home => Self::Home,
            E::Work => Self::Work,
            E::Other => Self::Other,
        }
    }
}

impl From<LocationType> for e::location::LocationType {
    fn from(from: LocationType) -> Self {
        match from {
            LocationType::Home => Self::Home,
            LocationType::Work => Self::Work,
            LocationType::Other => Self::Other,
        }
    }
}

impl From<e::location::Location> for Location {
    fn from(from: e::location::Location) -> Self {
        let e::location::Location {
            id,
            user_id: _,
            name,
            address,
            pos,
            kind,
            is_primary,
            notes,
            created_at,
            updated_at,
        } = from;
        let (lat, lng) = lat_lng(pos);
        Self {
            id: id.into(),
            name,
            address,
            lat,
            lng,
            kind: kind.into(),
            is_primary,
            notes,
            created_at: secs(created_at),
            updated_at: secs(updated_at),
        }
    }
}

impl From<e::place::Place> for Place {
    fn from(from: e::place::Place) -> Self {
        let e::place::Place {
            id,
            name,
            description,
            address,
            pos,
            category,
            tags,
            rating,
            total_ratings,
            ranking_score,
            created_by,
            created_at,
            updated_at,
        } = from;
        let (lat, lng) = lat_lng(pos);
        Self {
            id: id.into(),
            name,
            description,
            address,
            lat,
            lng,
            category,
            tags,
            rating: rating.into(),
            total_ratings,
            ranking_score,
            created_by: created_by.map(Into::into),
            created_at: secs(created_at),
            updated_at: secs(updated_at),
        }
    }
}

impl From<(e::place::SavedPlace, e::place::Place)> for SavedPlace {
    fn from((saved, place): (e::place::SavedPlace, e::place::Place)) -> Self {
        Self {
            place: place.into(),
            notes: saved.notes,
            saved_at: secs(saved.saved_at),
        }
    }
}

impl From<e::review::PlaceReview> for Review {
    fn from(from: e::review::PlaceReview) -> Self {
        let e::review::PlaceReview {
            id,
            place_id,
            user_id,
            rating,
            review,
            created_at,
            updated_at,
        } = from;
        Self {
            id: id.into(),
            place_id: place_id.into(),
            user_id: user_id.into(),
            rating: rating.into(),
            review,
            created_at: secs(created_at),
            updated_at: secs(updated_at),
        }
    }
}

impl From<e::social::Connection> for Follow {
    fn from(from: e::social::Connection) -> Self {
        Self {
            id: from.id.into(),
            follower_id: from.follower_id.into(),
            following_id: from.following_id.into(),
            is_mutual: from.is_mutual,
            created_at: secs(from.created_at),
        }
    }
}

impl From<e::social::Block> for Block {
    fn from(from: e::social::Block) -> Self {
        Self {
            id: from.id.into(),
            blocked_id: from.blocked_id.into(),
            reason: from.reason,
            created_at: secs(from.created_at),
        }
    }
}

impl From<e::social::ReportReason> for ReportReason {
    fn from(from: e::social::ReportReason) -> Self {
        use e::social::ReportReason as E;
        match from {
            E::Spam => Self::Spam,
            E::Harassment => Self::Harassment,
            E::Inappropriate => Self::Inappropriate,
            E::Other => Self::Other,
        }
    }
}

impl From<ReportReason> for e::social::ReportReason {
    fn from(from: ReportReason) -> Self {
        match from {
            ReportReason::Spam => Self::Spam,
            ReportReason::Harassment => Self::Harassment,
            ReportReason::Inappropriate => Self::Inappropriate,
            ReportReason::Other => Self::Other,
        }
    }
}

impl From<e::social::ReportStatus> for ReportStatus {
    fn from(from: e::social::ReportStatus) -> Self {
        use e::social::ReportStatus as E;
        match from {
            E::Pending => Self::Pending,
            E::Reviewing => Self::Reviewing,
            E::Resolved => Self::Resolved,
            E::Dismissed => Self::Dismissed,
        }
    }
}

impl From<ReportStatus> for e::social::ReportStatus {
    fn from(from: ReportStatus) -> Self {
        match from {
            ReportStatus::Pending => Self::Pending,
            ReportStatus::Reviewing => Self::Reviewing,
            ReportStatus::Resolved => Self::Resolved,
            ReportStatus::Dismissed => Self::Dismissed,
        }
    }
}

impl From<e::social::Report> for Report {
    fn from(from: e::social::Report) -> Self {
        let e::social::Report {
            id,
            reporter_id,
            reported_user_id,
            reason,
            description,
            status,
            admin_notes,
            created_at,
            updated_at,
        } = from;
        Self {
            id: id.into(),
            reporter_id: reporter_id.into(),
            reported_user_id: reported_user_id.into(),
            reason: reason.into(),
            description,
            status: status.into(),
            admin_notes,
            created_at: secs(created_at),
            updated_at: secs(updated_at),
        }
    }
}

impl From<e::chat::Chat> for Chat {
    fn from(from: e::chat::Chat) -> Self {
        let e::chat::Chat {
            id,
            participants,
            is_group_chat,
            title,
            last_message,
            last_message_at,
            created_at,
            updated_at,
        } = from;
        Self {
            id: id.into(),
            participants: ids(participants),
            is_group_chat,
            title,
            last_message,
            last_message_at: last_message_at.map(secs),
            created_at: secs(created_at),
            updated_at: secs(updated_at),
        }
    }
}

impl From<e::chat::Attachment> for Attachment {
    fn from(from: e::chat::Attachment) -> Self {
        Self {
            url: from.url,
            mime_type: from.mime_type,
        }
    }
}

impl From<Attachment> for e::chat::Attachment {
    fn from(from: Attachment) -> Self {
        Self {
            url: from.url,
            mime_type: from.mime_type,
        }
    }
}

impl From<e::chat::Message> for Message {
    fn from(from: e::chat::Message) -> Self {
        let is_read = from.is_read();
        let e::chat::Message {
            id,
            chat_id,
            sender_id,
            content,
            attachment,
            read_by,
            created_at,
        } = from;
        Self {
            id: id.into(),
            chat_id: chat_id.into(),
            sender_id: sender_id.into(),
            content,
            attachment: attachment.map(Into::into),
            read_by: ids(read_by),
            is_read,
            created_at: secs(created_at),
        }
    }
}

impl From<e::notification::NotificationType> for NotificationType {
    fn from(from: e::notification::NotificationType) -> Self {
        use e::notification::NotificationType as E;
        match from {
            E::NewFollower => Self::NewFollower,
            E::NewMessage => Self::NewMessage,
            E::PlaceReview => Self::PlaceReview,
            E::NearbyEvent => Self::NearbyEvent,
            E::Mention => Self::Mention,
            E::System => Self::System,
            E::ChatInvite => Self::ChatInvite,
        }
    }
}

impl From<e::notification::Notification> for Notification {
    fn from(from: e::notification::Notification) -> Self {
        let e::notification::Notification {
            id,
            user_id: _,
            kind,
            title,
            message,
            data,
            is_read,
            action_url,
            created_at,
        } = from;
        Self {
            id: id.into(),
            kind: kind.into(),
            title,
            message,
            data,
            is_read,
            action_url,
            created_at: secs(created_at),
        }
    }
}

impl From<e::activity::ActivityType> for ActivityType {
    fn from(from: e::activity::ActivityType) -> Self {
        use e::activity::ActivityType as E;
        match from {
            E::Follow => Self::Follow,
            E::Review => Self::Review,
            E::Visit => Self::Visit,
            E::SavePlace => Self::SavePlace,
            E::Share => Self::Share,
        }
    }
}

impl From<e::activity::Activity> for Activity {
    fn from(from: e::activity::Activity) -> Self {
        let e::activity::Activity {
            id,
            user_id,
            kind,
            target_user_id,
            target_place_id,
            data,
            created_at,
        } = from;
        Self {
            id: id.into(),
            user_id: user_id.into(),
            kind: kind.into(),
            target_user_id: target_user_id.map(Into::into),
            target_place_id: target_place_id.map(Into::into),
            data,
            created_at: secs(created_at),
        }
    }
}

impl From<e::file::FileType> for FileType {
    fn from(from: e::file::FileType) -> Self {
        use e::file::FileType as E;
        match from {
            E::Image => Self::Image,
            E::Video => Self::Video,
            E::Document => Self::Document,
            E::Audio => Self::Audio,
            E::Other => Self::Other,
        }
    }
}

impl From<e::file::Permission> for Permission {
    fn from(from: e::file::Permission) -> Self {
        use e::file::Permission as E;
        match from {
            E::View => Self::View,
            E::Edit => Self::Edit,
            E::Full => Self::Full,
        }
    }
}

impl From<Permission> for e::file::Permission {
    fn from(from: Permission) -> Self {
        match from {
            Permission::View => Self::View,
            Permission::Edit => Self::Edit,
            Permission::Full => Self::Full,
        }
    }
}

/// The public URL depends on the storage and has to be provided.
impl From<(e::file::File, String)> for File {
    fn from((from, url): (e::file::File, String)) -> Self {
        let e::file::File {
            id,
            owner_id,
            storage_path: _,
            file_type,
            original_name,
            size,
            mime_type,
            title,
            description,
            tags,
            is_public,
            password,
            download_count,
            last_accessed,
            created_at,
            updated_at,
        } = from;
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            url,
            file_type: file_type.into(),
            original_name,
            size,
            mime_type,
            title,
            description,
            tags,
            is_public,
            password_protected: password.is_some(),
            download_count,
            last_accessed: last_accessed.map(secs),
            created_at: secs(created_at),
            updated_at: secs(updated_at),
        }
    }
}

impl From<e::file::SharedFile> for SharedFile {
    fn from(from: e::file::SharedFile) -> Self {
        let e::file::SharedFile {
            id,
            file_id,
            shared_by,
            shared_with,
            permission,
            can_reshare,
            expires_at,
            created_at,
            updated_at,
        } = from;
        Self {
            id: id.into(),
            file_id: file_id.into(),
            shared_by: shared_by.into(),
            shared_with: shared_with.into(),
            permission: permission.into(),
            can_reshare,
            expires_at: expires_at.map(secs),
            created_at: secs(created_at),
            updated_at: secs(updated_at),
        }
    }
}
