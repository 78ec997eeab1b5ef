use super::*;

impl<C> FileRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn create_file(&self, file: &File) -> Result<()> {
        create_file(&mut self.sqlite_conn(), file)
    }
    fn update_file(&self, file: &File) -> Result<()> {
        update_file(&mut self.sqlite_conn(), file)
    }
    fn delete_file(&self, id: &Id) -> Result<()> {
        delete_file(&mut self.sqlite_conn(), id)
    }
    fn get_file(&self, id: &Id) -> Result<File> {
        get_file(&mut self.sqlite_conn(), id)
    }
    fn load_files_of_owner(&self, owner_id: &Id) -> Result<Vec<File>> {
        load_files_of_owner(&mut self.sqlite_conn(), owner_id)
    }
    fn load_files_shared_with(&self, user_id: &Id, now: Timestamp) -> Result<Vec<File>> {
        load_files_shared_with(&mut self.sqlite_conn(), user_id, now)
    }
    fn record_download(&self, id: &Id, at: Timestamp) -> Result<()> {
        record_download(&mut self.sqlite_conn(), id, at)
    }
}

impl<C> SharedFileRepo for DbConnection<C>
where
    C: DerefMut<Target = SqliteConnection>,
{
    fn create_shared_file(&self, share: &SharedFile) -> Result<()> {
        create_shared_file(&mut self.sqlite_conn(), share)
    }
    fn update_shared_file(&self, share: &SharedFile) -> Result<()> {
        update_shared_file(&mut self.sqlite_conn(), share)
    }
    fn delete_shared_file(&self, id: &Id) -> Result<()> {
        delete_shared_file(&mut self.sqlite_conn(), id)
    }
    fn get_shared_file(&self, id: &Id) -> Result<SharedFile> {
        get_shared_file(&mut self.sqlite_conn(), id)
    }
    fn try_get_shared_file(&self, file_id: &Id, shared_with: &Id) -> Result<Option<SharedFile>> {
        try_get_shared_file(&mut self.sqlite_conn(), file_id, shared_with)
    }
    fn load_shares_of_user(&self, user_id: &Id) -> Result<Vec<SharedFile>> {
        load_shares_of_user(&mut self.sqlite_conn(), user_id)
    }
}

impl From<&File> for models::FileEntity {
    fn from(f: &File) -> Self {
        Self {
            id: f.id.to_string(),
            owner_id: f.owner_id.to_string(),
            storage_path: f.storage_path.clone(),
            file_type: f.file_type.as_ref().to_owned(),
            original_name: f.original_name.clone(),
            size: f.size as i64,
            mime_type: f.mime_type.clone(),
            title: f.title.clone(),
            description: f.description.clone(),
            is_public: f.is_public,
            password: f.password.as_ref().map(|p| p.as_hash().to_owned()),
            download_count: f.download_count as i64,
            last_accessed: f.last_accessed.map(Timestamp::as_millis),
            created_at: f.created_at.as_millis(),
            updated_at: f.updated_at.as_millis(),
        }
    }
}

fn load_file(conn: &mut SqliteConnection, file: models::FileEntity) -> Result<File> {
    use schema::file_tags::dsl;
    let models::FileEntity {
        id,
        owner_id,
        storage_path,
        file_type,
        original_name,
        size,
        mime_type,
        title,
        description,
        is_public,
        password,
        download_count,
        last_accessed,
        created_at,
        updated_at,
    } = file;
    let tags = dsl::file_tags
        .select(dsl::tag)
        .filter(dsl::file_id.eq(&id))
        .order_by(dsl::tag)
        .load::<String>(conn)
        .map_err(from_diesel_err)?;
    Ok(File {
        id: id.into(),
        owner_id: owner_id.into(),
        storage_path,
        file_type: parse_enum(&file_type)?,
        original_name,
        size: size.max(0) as u64,
        mime_type,
        title,
        description,
        tags,
        is_public,
        password: password.map(Password::from_hash),
        download_count: download_count.max(0) as u64,
        last_accessed: last_accessed.map(Timestamp::from_millis),
        created_at: Timestamp::from_millis(created_at),
        updated_at: Timestamp::from_millis(updated_at),
    })
}

fn load_files(conn: &mut SqliteConnection, files: Vec<models::FileEntity>) -> Result<Vec<File>> {
    files.into_iter().map(|f| load_file(conn, f)).collect()
}

fn store_file_tags(conn: &mut SqliteConnection, file_id: &str, tags: &[String]) -> Result<()> {
    use schema::file_tags::dsl;
    diesel::delete(dsl::file_tags.filter(dsl::file_id.eq(file_id)))
        .execute(conn)
        .map_err(from_diesel_err)?;
    if tags.is_empty() {
        return Ok(());
    }
    let rows: Vec<_> = tags
        .iter()
        .map(|tag| models::FileTag {
            file_id: file_id.to_owned(),
            tag: tag.clone(),
        })
        .collect();
    diesel::insert_or_ignore_into(schema::file_tags::table)
        .values(&rows)
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn create_file(conn: &mut SqliteConnection, file: &File) -> Result<()> {
    let entity = models::FileEntity::from(file);
    diesel::insert_into(schema::files::table)
        .values(&entity)
        .execute(conn)
        .map_err(from_diesel_err)?;
    store_file_tags(conn, &entity.id, &file.tags)
}

fn update_file(conn: &mut SqliteConnection, file: &File) -> Result<()> {
    use schema::files::dsl;
    let entity = models::FileEntity::from(file);
    let count = diesel::update(dsl::files.filter(dsl::id.eq(&entity.id)))
        .set(&entity)
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)?;
    store_file_tags(conn, &entity.id, &file.tags)
}

fn delete_file(conn: &mut SqliteConnection, id: &Id) -> Result<()> {
    use schema::files::dsl;
    let count = diesel::delete(dsl::files.filter(dsl::id.eq(id.as_str())))
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn get_file(conn: &mut SqliteConnection, id: &Id) -> Result<File> {
    use schema::files::dsl;
    let file = dsl::files
        .filter(dsl::id.eq(id.as_str()))
        .first::<models::FileEntity>(conn)
        .map_err(from_diesel_err)?;
    load_file(conn, file)
}

fn load_files_of_owner(conn: &mut SqliteConnection, owner_id: &Id) -> Result<Vec<File>> {
    use schema::files::dsl;
    let files = dsl::files
        .filter(dsl::owner_id.eq(owner_id.as_str()))
        .order_by(dsl::created_at.desc())
        .load::<models::FileEntity>(conn)
        .map_err(from_diesel_err)?;
    load_files(conn, files)
}

fn load_files_shared_with(
    conn: &mut SqliteConnection,
    user_id: &Id,
    now: Timestamp,
) -> Result<Vec<File>> {
    use schema::{files::dsl as f_dsl, shared_files::dsl as s_dsl};
    let files = f_dsl::files
        .inner_join(s_dsl::shared_files)
        .select(schema::files::all_columns)
        .filter(s_dsl::shared_with.eq(user_id.as_str()))
        .filter(
            s_dsl::expires_at
                .is_null()
                .nullable()
                .or(s_dsl::expires_at.gt(now.as_millis())),
        )
        .order_by(f_dsl::created_at.desc())
        .load::<models::FileEntity>(conn)
        .map_err(from_diesel_err)?;
    load_files(conn, files)
}

fn record_download(conn: &mut SqliteConnection, id: &Id, at: Timestamp) -> Result<()> {
    use schema::files::dsl;
    let count = diesel::update(dsl::files.filter(dsl::id.eq(id.as_str())))
        .set((
            dsl::download_count.eq(dsl::download_count + 1_i64),
            dsl::last_accessed.eq(Some(at.as_millis())),
        ))
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)
}

impl From<&SharedFile> for models::SharedFileEntity {
    fn from(s: &SharedFile) -> Self {
        Self {
            id: s.id.to_string(),
            file_id: s.file_id.to_string(),
            shared_by: s.shared_by.to_string(),
            shared_with: s.shared_with.to_string(),
            permission: s.permission.as_ref().to_owned(),
            can_reshare: s.can_reshare,
            expires_at: s.expires_at.map(Timestamp::as_millis),
            created_at: s.created_at.as_millis(),
            updated_at: s.updated_at.as_millis(),
        }
    }
}

impl TryFrom<models::SharedFileEntity> for SharedFile {
    type Error = repo::Error;

    fn try_from(from: models::SharedFileEntity) -> Result<Self> {
        let models::SharedFileEntity {
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
        Ok(Self {
            id: id.into(),
            file_id: file_id.into(),
            shared_by: shared_by.into(),
            shared_with: shared_with.into(),
            permission: parse_enum(&permission)?,
            can_reshare,
            expires_at: expires_at.map(Timestamp::from_millis),
            created_at: Timestamp::from_millis(created_at),
            updated_at: Timestamp::from_millis(updated_at),
        })
    }
}

fn create_shared_file(conn: &mut SqliteConnection, share: &SharedFile) -> Result<()> {
    diesel::insert_into(schema::shared_files::table)
        .values(&models::SharedFileEntity::from(share))
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn update_shared_file(conn: &mut SqliteConnection, share: &SharedFile) -> Result<()> {
    use schema::shared_files::dsl;
    let entity = models::SharedFileEntity::from(share);
    let count = diesel::update(dsl::shared_files.filter(dsl::id.eq(&entity.id)))
        .set(&entity)
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn delete_shared_file(conn: &mut SqliteConnection, id: &Id) -> Result<()> {
    use schema::shared_files::dsl;
    let count = diesel::delete(dsl::shared_files.filter(dsl::id.eq(id.as_str())))
        .execute(conn)
        .map_err(from_diesel_err)?;
    expect_affected(count)
}

fn get_shared_file(conn: &mut SqliteConnection, id: &Id) -> Result<SharedFile> {
    use schema::shared_files::dsl;
    dsl::shared_files
        .filter(dsl::id.eq(id.as_str()))
        .first::<models::SharedFileEntity>(conn)
        .map_err(from_diesel_err)?
        .try_into()
}

fn try_get_shared_file(
    conn: &mut SqliteConnection,
    file_id: &Id,
    shared_with: &Id,
) -> Result<Option<SharedFile>> {
    use schema::shared_files::dsl;
    dsl::shared_files
        .filter(dsl::file_id.eq(file_id.as_str()))
        .filter(dsl::shared_with.eq(shared_with.as_str()))
        .first::<models::SharedFileEntity>(conn)
        .optional()
        .map_err(from_diesel_err)?
        .map(TryInto::try_into)
        .transpose()
}

fn load_shares_of_user(conn: &mut SqliteConnection, user_id: &Id) -> Result<Vec<SharedFile>> {
    use schema::shared_files::dsl;
    dsl::shared_files
        .filter(
            dsl::shared_by
                .eq(user_id.as_str())
                .or(dsl::shared_with.eq(user_id.as_str())),
        )
        .order_by(dsl::created_at.desc())
        .load::<models::SharedFileEntity>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}
