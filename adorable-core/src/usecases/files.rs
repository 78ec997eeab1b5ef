use super::prelude::*;

#[derive(Debug, Clone, Default)]
pub struct NewFile {
    pub original_name: String,
    pub size: u64,
    pub mime_type: String,
    pub title: Option<String>,
    pub description: String,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub password: Option<String>,
}

/// Unset fields remain unchanged, an empty password removes the protection.
#[derive(Debug, Clone, Default)]
pub struct UpdateFile {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
    pub password: Option<String>,
}

fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn storage_path(owner_id: &Id, file_id: &Id, original_name: &str) -> String {
    match extension(original_name) {
        Some(ext) => format!("files/{owner_id}/{file_id}.{ext}"),
        None => format!("files/{owner_id}/{file_id}"),
    }
}

/// Creates the metadata of a new file.
///
/// The content has to be written to [`File::storage_path`] by the caller.
pub fn create_file<R: FileRepo>(
    repo: &R,
    owner_id: &Id,
    new_file: NewFile,
    now: Timestamp,
) -> Result<File> {
    let NewFile {
        original_name,
        size,
        mime_type,
        title,
        description,
        tags,
        is_public,
        password,
    } = new_file;
    if size == 0 || size > File::MAX_SIZE {
        return Err(Error::FileSize);
    }
    let original_name = original_name.trim().to_owned();
    let title = validate::non_empty(title).unwrap_or_else(|| original_name.clone());
    if title.chars().count() > Place::MAX_NAME_LEN {
        return Err(Error::TextTooLong);
    }
    let password = match validate::non_empty(password) {
        Some(pw) => Some(pw.parse::<Password>()?),
        None => None,
    };
    let id = Id::new();
    let file = File {
        storage_path: storage_path(owner_id, &id, &original_name),
        id,
        owner_id: owner_id.clone(),
        file_type: FileType::from_mime_type(&mime_type),
        original_name,
        size,
        mime_type,
        title,
        description: description.trim().to_owned(),
        tags: validate::normalize_tags(tags),
        is_public,
        password,
        download_count: 0,
        last_accessed: None,
        created_at: now,
        updated_at: now,
    };
    repo.create_file(&file)?;
    Ok(file)
}

/// The permission of the user on the file or `None` if the file is not accessible.
fn file_permission<R: SharedFileRepo>(
    repo: &R,
    user_id: &Id,
    file: &File,
    now: Timestamp,
) -> Result<Option<Permission>> {
    if &file.owner_id == user_id {
        return Ok(Some(Permission::Full));
    }
    let share = repo
        .try_get_shared_file(&file.id, user_id)?
        .filter(|s| !s.is_expired(now));
    Ok(match share {
        Some(share) => Some(share.permission),
        None if file.is_public => Some(Permission::View),
        None => None,
    })
}

fn get_accessible_file<R>(
    repo: &R,
    user_id: &Id,
    id: &Id,
    required: Permission,
    now: Timestamp,
) -> Result<File>
where
    R: FileRepo + SharedFileRepo,
{
    let file = repo.get_file(id)?;
    match file_permission(repo, user_id, &file, now)? {
        None => Err(Error::Repo(RepoError::NotFound)),
        Some(p) if p < required => Err(Error::Forbidden),
        Some(_) => Ok(file),
    }
}

/// Own files, public files and files shared with the user.
pub fn get_file<R>(repo: &R, user_id: &Id, id: &Id, now: Timestamp) -> Result<File>
where
    R: FileRepo + SharedFileRepo,
{
    get_accessible_file(repo, user_id, id, Permission::View, now)
}

/// Own files and files shared with the user, newest first.
pub fn load_files<R: FileRepo>(repo: &R, user_id: &Id, now: Timestamp) -> Result<Vec<File>> {
    let mut files = repo.load_files_of_owner(user_id)?;
    for file in repo.load_files_shared_with(user_id, now)? {
        if !files.iter().any(|f| f.id == file.id) {
            files.push(file);
        }
    }
    files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(files)
}

/// Requires at least the permission to edit.
pub fn update_file<R>(
    repo: &R,
    user_id: &Id,
    id: &Id,
    update: UpdateFile,
    now: Timestamp,
) -> Result<File>
where
    R: FileRepo + SharedFileRepo,
{
    let mut file = get_accessible_file(repo, user_id, id, Permission::Edit, now)?;
    let UpdateFile {
        title,
        description,
        tags,
        is_public,
        password,
    } = update;
    if let Some(title) = validate::non_empty(title) {
        if title.chars().count() > Place::MAX_NAME_LEN {
            return Err(Error::TextTooLong);
        }
        file.title = title;
    }
    if let Some(description) = description {
        file.description = description.trim().to_owned();
    }
    if let Some(tags) = tags {
        file.tags = validate::normalize_tags(tags);
    }
    // Visibility and protection are reserved for the owner.
    if (is_public.is_some() || password.is_some()) && &file.owner_id != user_id {
        return Err(Error::Forbidden);
    }
    if let Some(is_public) = is_public {
        file.is_public = is_public;
    }
    if let Some(password) = password {
        file.password = match validate::non_empty(Some(password)) {
            Some(pw) => Some(pw.parse::<Password>()?),
            None => None,
        };
    }
    file.updated_at = now;
    repo.update_file(&file)?;
    Ok(file)
}

/// Returns the deleted file, its content has to be removed by the caller.
pub fn delete_file<R>(repo: &R, user_id: &Id, id: &Id, now: Timestamp) -> Result<File>
where
    R: FileRepo + SharedFileRepo,
{
    let file = get_accessible_file(repo, user_id, id, Permission::Full, now)?;
    log::info!("Deleting file {} ({})", file.id, file.storage_path);
    repo.delete_file(&file.id)?;
    Ok(file)
}

/// Counts the download and returns the updated file.
///
/// Everyone except the owner needs the password of a protected file.
pub fn download_file<R>(
    repo: &R,
    user_id: &Id,
    id: &Id,
    password: Option<&str>,
    now: Timestamp,
) -> Result<File>
where
    R: FileRepo + SharedFileRepo,
{
    let mut file = get_file(repo, user_id, id, now)?;
    if let Some(hash) = &file.password {
        if &file.owner_id != user_id && !password.map(|pw| hash.verify(pw)).unwrap_or(false) {
            return Err(Error::FilePassword);
        }
    }
    repo.record_download(&file.id, now)?;
    file.download_count += 1;
    file.last_accessed = Some(now);
    Ok(file)
}

#[derive(Debug, Clone)]
pub struct ShareFile {
    pub file_id: Id,
    pub shared_with: Id,
    pub permission: Permission,
    pub can_reshare: bool,
    pub expires_at: Option<Timestamp>,
}

/// Shares a file or updates an existing share with the same user.
///
/// Besides the owner only users with a reshareable share may share
/// a file and never with a higher permission than their own.
pub fn share_file<R>(repo: &R, user_id: &Id, share: ShareFile, now: Timestamp) -> Result<SharedFile>
where
    R: UserRepo + FileRepo + SharedFileRepo,
{
    let ShareFile {
        file_id,
        shared_with,
        permission,
        can_reshare,
        expires_at,
    } = share;
    if &shared_with == user_id {
        return Err(Error::ShareSelf);
    }
    let file = repo.get_file(&file_id)?;
    if file.owner_id != *user_id {
        let own = repo
            .try_get_shared_file(&file.id, user_id)?
            .filter(|s| !s.is_expired(now))
            .ok_or(Error::Repo(RepoError::NotFound))?;
        if !own.can_reshare || own.permission < permission {
            return Err(Error::Forbidden);
        }
    }
    if shared_with == file.owner_id {
        return Err(Error::ShareSelf);
    }
    // The recipient must exist
    repo.get_user(&shared_with)?;
    let shared = match repo.try_get_shared_file(&file.id, &shared_with)? {
        Some(mut existing) => {
            existing.shared_by = user_id.clone();
            existing.permission = permission;
            existing.can_reshare = can_reshare;
            existing.expires_at = expires_at;
            existing.updated_at = now;
            repo.update_shared_file(&existing)?;
            existing
        }
        None => {
            let shared = SharedFile {
                id: Id::new(),
                file_id: file.id,
                shared_by: user_id.clone(),
                shared_with,
                permission,
                can_reshare,
                expires_at,
                created_at: now,
                updated_at: now,
            };
            repo.create_shared_file(&shared)?;
            shared
        }
    };
    Ok(shared)
}

/// The owner of the file and both parties of the share may remove it.
pub fn unshare_file<R>(repo: &R, user_id: &Id, share_id: &Id) -> Result<()>
where
    R: FileRepo + SharedFileRepo,
{
    let share = repo.get_shared_file(share_id)?;
    if &share.shared_by != user_id && &share.shared_with != user_id {
        let file = repo.get_file(&share.file_id)?;
        if &file.owner_id != user_id {
            return Err(Error::Repo(RepoError::NotFound));
        }
    }
    Ok(repo.delete_shared_file(&share.id)?)
}

/// Shares created by or for the user, newest first.
pub fn load_shares<R: SharedFileRepo>(repo: &R, user_id: &Id) -> Result<Vec<SharedFile>> {
    let mut shares = repo.load_shares_of_user(user_id)?;
    shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(shares)
}

#[cfg(test)]
mod tests {
    use super::{super::tests::*, *};

    fn new_file(name: &str) -> NewFile {
        NewFile {
            original_name: name.into(),
            size: 1024,
            mime_type: "image/png".into(),
            ..Default::default()
        }
    }

    fn share(file: &File, with: &User, permission: Permission) -> ShareFile {
        ShareFile {
            file_id: file.id.clone(),
            shared_with: with.id.clone(),
            permission,
            can_reshare: false,
            expires_at: None,
        }
    }

    #[test]
    fn create_file_metadata() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let file = create_file(&db, &alice.id, new_file("Holiday.JPG"), Timestamp::now()).unwrap();
        assert_eq!(FileType::Image, file.file_type);
        assert_eq!("Holiday.JPG", file.title);
        assert_eq!(format!("files/alice/{}.jpg", file.id), file.storage_path);
        assert!(!file.is_password_protected());
    }

    #[test]
    fn reject_invalid_sizes() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let now = Timestamp::now();
        for size in [0, File::MAX_SIZE + 1] {
            let mut f = new_file("a.png");
            f.size = size;
            assert!(matches!(
                create_file(&db, &alice.id, f, now),
                Err(Error::FileSize)
            ));
        }
        let mut f = new_file("a.png");
        f.size = File::MAX_SIZE;
        assert!(create_file(&db, &alice.id, f, now).is_ok());
    }

    #[test]
    fn storage_path_without_extension() {
        assert_eq!("files/u/f", storage_path(&"u".into(), &"f".into(), "README"));
        assert_eq!("files/u/f", storage_path(&"u".into(), &"f".into(), ".bashrc"));
        assert_eq!("files/u/f.gz", storage_path(&"u".into(), &"f".into(), "a.tar.gz"));
    }

    #[test]
    fn access_by_share_and_visibility() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let now = Timestamp::now();
        let file = create_file(&db, &alice.id, new_file("a.png"), now).unwrap();
        assert!(get_file(&db, &bob.id, &file.id, now).is_err());
        assert!(load_files(&db, &bob.id, now).unwrap().is_empty());

        share_file(&db, &alice.id, share(&file, &bob, Permission::View), now).unwrap();
        assert!(get_file(&db, &bob.id, &file.id, now).is_ok());
        assert_eq!(1, load_files(&db, &bob.id, now).unwrap().len());
        assert!(matches!(
            update_file(&db, &bob.id, &file.id, UpdateFile::default(), now),
            Err(Error::Forbidden)
        ));

        // Sharing again updates the existing share
        share_file(&db, &alice.id, share(&file, &bob, Permission::Edit), now).unwrap();
        assert_eq!(1, db.shared_files.borrow().len());
        let update = UpdateFile {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        assert_eq!("Renamed", update_file(&db, &bob.id, &file.id, update, now).unwrap().title);
        let update = UpdateFile {
            is_public: Some(true),
            ..Default::default()
        };
        assert!(matches!(
            update_file(&db, &bob.id, &file.id, update, now),
            Err(Error::Forbidden)
        ));
        assert!(matches!(
            delete_file(&db, &bob.id, &file.id, now),
            Err(Error::Forbidden)
        ));
    }

    #[test]
    fn expired_shares_grant_no_access() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let now = Timestamp::from_secs(1000);
        let file = create_file(&db, &alice.id, new_file("a.png"), now).unwrap();
        let mut s = share(&file, &bob, Permission::Full);
        s.expires_at = Some(Timestamp::from_secs(2000));
        share_file(&db, &alice.id, s, now).unwrap();
        assert!(get_file(&db, &bob.id, &file.id, now).is_ok());
        let later = Timestamp::from_secs(2000);
        assert!(get_file(&db, &bob.id, &file.id, later).is_err());
        assert!(load_files(&db, &bob.id, later).unwrap().is_empty());
    }

    #[test]
    fn public_files_are_readable() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let now = Timestamp::now();
        let mut f = new_file("a.png");
        f.is_public = true;
        let file = create_file(&db, &alice.id, f, now).unwrap();
        assert!(get_file(&db, &bob.id, &file.id, now).is_ok());
        let downloaded = download_file(&db, &bob.id, &file.id, None, now).unwrap();
        assert_eq!(1, downloaded.download_count);
        assert_eq!(Some(now), db.get_file(&file.id).unwrap().last_accessed);
    }

    #[test]
    fn password_protected_download() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let now = Timestamp::now();
        let mut f = new_file("a.png");
        f.is_public = true;
        f.password = Some("secret123".into());
        let file = create_file(&db, &alice.id, f, now).unwrap();
        assert!(matches!(
            download_file(&db, &bob.id, &file.id, None, now),
            Err(Error::FilePassword)
        ));
        assert!(matches!(
            download_file(&db, &bob.id, &file.id, Some("wrong"), now),
            Err(Error::FilePassword)
        ));
        download_file(&db, &bob.id, &file.id, Some("secret123"), now).unwrap();
        download_file(&db, &alice.id, &file.id, None, now).unwrap();
        assert_eq!(2, db.get_file(&file.id).unwrap().download_count);
    }

    #[test]
    fn resharing() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let carol = add_user(&db, "carol");
        let now = Timestamp::now();
        let file = create_file(&db, &alice.id, new_file("a.png"), now).unwrap();
        assert!(matches!(
            share_file(&db, &alice.id, share(&file, &alice, Permission::View), now),
            Err(Error::ShareSelf)
        ));
        share_file(&db, &alice.id, share(&file, &bob, Permission::Edit), now).unwrap();
        assert!(matches!(
            share_file(&db, &bob.id, share(&file, &carol, Permission::View), now),
            Err(Error::Forbidden)
        ));
        let mut s = share(&file, &bob, Permission::Edit);
        s.can_reshare = true;
        share_file(&db, &alice.id, s, now).unwrap();
        assert!(matches!(
            share_file(&db, &bob.id, share(&file, &carol, Permission::Full), now),
            Err(Error::Forbidden)
        ));
        let shared = share_file(&db, &bob.id, share(&file, &carol, Permission::View), now).unwrap();
        assert_eq!(bob.id, shared.shared_by);
        assert_eq!(2, load_shares(&db, &bob.id).unwrap().len());

        assert!(unshare_file(&db, &"eve".into(), &shared.id).is_err());
        unshare_file(&db, &alice.id, &shared.id).unwrap();
        assert_eq!(1, load_shares(&db, &bob.id).unwrap().len());
    }

    #[test]
    fn delete_removes_shares() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let now = Timestamp::now();
        let file = create_file(&db, &alice.id, new_file("a.png"), now).unwrap();
        share_file(&db, &alice.id, share(&file, &bob, Permission::View), now).unwrap();
        let deleted = delete_file(&db, &alice.id, &file.id, now).unwrap();
        assert_eq!(file.storage_path, deleted.storage_path);
        assert!(db.shared_files.borrow().is_empty());
    }
}
