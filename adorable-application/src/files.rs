use adorable_core::gateways::storage::FileStorage;

use super::{dispatch::EventDispatcher, *};

/// Stores the content and the metadata of a new file.
///
/// The size is taken from the content.
pub fn upload_file(
    connections: &sqlite::Connections,
    storage: &dyn FileStorage,
    dispatcher: &EventDispatcher,
    owner_id: &Id,
    mut new_file: usecases::NewFile,
    content: &[u8],
) -> Result<File> {
    let now = Timestamp::now();
    new_file.size = content.len() as u64;
    let file = connections.exclusive()?.transaction(|conn| {
        let file = usecases::create_file(conn, owner_id, new_file, now)?;
        // The metadata is rolled back if the content could not be stored
        storage
            .store(&file.storage_path, content)
            .map_err(RepoError::Other)?;
        Ok::<_, usecases::Error>(file)
    })?;
    info!("Uploaded file {} ({} bytes)", file.id, file.size);
    if file.file_type == FileType::Image {
        dispatcher.dispatch(vec![Event::ImageUploaded {
            file_id: file.id.clone(),
            avatar_of: None,
        }]);
    }
    Ok(file)
}

pub fn delete_file(
    connections: &sqlite::Connections,
    storage: &dyn FileStorage,
    user_id: &Id,
    id: &Id,
) -> Result<()> {
    let now = Timestamp::now();
    let file = connections
        .exclusive()?
        .transaction(|conn| usecases::delete_file(conn, user_id, id, now))?;
    if let Err(err) = storage.remove(&file.storage_path) {
        warn!("Failed to remove content of deleted file {}: {err}", file.id);
    }
    Ok(())
}

/// Counts the download and returns the file with its content.
pub fn download_file(
    connections: &sqlite::Connections,
    storage: &dyn FileStorage,
    user_id: &Id,
    id: &Id,
    password: Option<&str>,
) -> Result<(File, Vec<u8>)> {
    let now = Timestamp::now();
    let file = connections
        .exclusive()?
        .transaction(|conn| usecases::download_file(conn, user_id, id, password, now))?;
    let content = storage.read(&file.storage_path).map_err(|err| {
        error!("Missing content of file {}: {err}", file.id);
        err
    })?;
    Ok((file, content))
}

pub fn share_file(
    connections: &sqlite::Connections,
    dispatcher: &EventDispatcher,
    user_id: &Id,
    share: usecases::ShareFile,
) -> Result<SharedFile> {
    let now = Timestamp::now();
    let (shared, events) = connections.exclusive()?.transaction(|conn| {
        let shared = usecases::share_file(conn, user_id, share, now)?;
        let events = fanout::on_file_shared(conn, &shared)?;
        Ok::<_, usecases::Error>((shared, events))
    })?;
    dispatcher.dispatch(events);
    Ok(shared)
}
