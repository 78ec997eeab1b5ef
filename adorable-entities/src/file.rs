use strum::{AsRefStr, EnumString};

use crate::{id::Id, password::Password, time::Timestamp};

/// A stored file.
#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub id             : Id,
    pub owner_id       : Id,
    pub storage_path   : String,
    pub file_type      : FileType,
    pub original_name  : String,
    pub size           : u64,
    pub mime_type      : String,
    pub title          : String,
    pub description    : String,
    pub tags           : Vec<String>,
    pub is_public      : bool,
    pub password       : Option<Password>,
    pub download_count : u64,
    pub last_accessed  : Option<Timestamp>,
    pub created_at     : Timestamp,
    pub updated_at     : Timestamp,
}

impl File {
    pub const MAX_SIZE: u64 = 10 * 1024 * 1024;

    pub fn is_password_protected(&self) -> bool {
        self.password.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FileType {
    Image,
    Video,
    Document,
    Audio,
    Other,
}

impl FileType {
    pub fn from_mime_type(mime: &str) -> Self {
        let mime = mime.to_ascii_lowercase();
        match mime.split('/').next().unwrap_or_default() {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "text" => Self::Document,
            "application" if mime == "application/pdf" || mime.contains("document") => {
                Self::Document
            }
            _ => Self::Other,
        }
    }
}

/// A file shared with another user. Unique per (file, shared_with).
#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFile {
    pub id          : Id,
    pub file_id     : Id,
    pub shared_by   : Id,
    pub shared_with : Id,
    pub permission  : Permission,
    pub can_reshare : bool,
    pub expires_at  : Option<Timestamp>,
    pub created_at  : Timestamp,
    pub updated_at  : Timestamp,
}

impl SharedFile {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    View = 0,
    Edit = 1,
    Full = 2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_from_mime_type() {
        assert_eq!(FileType::Image, FileType::from_mime_type("image/png"));
        assert_eq!(FileType::Video, FileType::from_mime_type("VIDEO/mp4"));
        assert_eq!(FileType::Document, FileType::from_mime_type("application/pdf"));
        assert_eq!(FileType::Document, FileType::from_mime_type("text/plain"));
        assert_eq!(FileType::Other, FileType::from_mime_type("application/zip"));
    }

    #[test]
    fn permission_levels() {
        assert!(Permission::Full > Permission::Edit);
        assert!(Permission::Edit > Permission::View);
    }

    #[test]
    fn share_expiry() {
        let now = Timestamp::from_secs(100);
        let mut share = SharedFile {
            id: Id::new(),
            file_id: Id::new(),
            shared_by: Id::new(),
            shared_with: Id::new(),
            permission: Permission::View,
            can_reshare: false,
            expires_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(!share.is_expired(now));
        share.expires_at = Some(Timestamp::from_secs(100));
        assert!(share.is_expired(now));
        share.expires_at = Some(Timestamp::from_secs(101));
        assert!(!share.is_expired(now));
    }
}
