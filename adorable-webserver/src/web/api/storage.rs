use rocket::{
    data::{Data, ToByteUnit},
    http::ContentType,
    Responder,
};

use super::*;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[get("/storage/files")]
pub fn get_files(
    connections: sqlite::Connections,
    account: Account,
    storage: &State<Storage>,
) -> Result<Vec<json::File>> {
    let files = usecases::load_files(&connections.shared()?, account.id(), Timestamp::now())?;
    Ok(Json(
        files
            .into_iter()
            .map(|file| to_json::file(file, &*storage.0))
            .collect(),
    ))
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[allow(clippy::too_many_arguments)]
#[post(
    "/storage/files?<name>&<title>&<description>&<tags>&<is_public>&<password>",
    data = "<data>"
)]
pub async fn post_file(
    connections: sqlite::Connections,
    account: Account,
    storage: &State<Storage>,
    dispatcher: &State<EventDispatcher>,
    content_type: Option<&ContentType>,
    name: &str,
    title: Option<String>,
    description: Option<String>,
    tags: Option<&str>,
    is_public: Option<bool>,
    password: Option<String>,
    data: Data<'_>,
) -> Result<json::File> {
    let content = data.open(File::MAX_SIZE.bytes()).into_bytes().await?;
    if !content.is_complete() {
        return Err(usecases::Error::FileSize.into());
    }
    let new_file = usecases::NewFile {
        original_name: name.to_owned(),
        // Taken from the content
        size: 0,
        mime_type: content_type
            .map(ToString::to_string)
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.into()),
        title,
        description: description.unwrap_or_default(),
        tags: tags.map(split_tags).unwrap_or_default(),
        is_public: is_public.unwrap_or(false),
        password: password.filter(|pw| !pw.is_empty()),
    };
    let file = flows::upload_file(
        &connections,
        &*storage.0,
        dispatcher,
        account.id(),
        new_file,
        &content,
    )?;
    Ok(Json(to_json::file(file, &*storage.0)))
}

#[get("/storage/files/<id>")]
pub fn get_file(
    connections: sqlite::Connections,
    account: Account,
    storage: &State<Storage>,
    id: &str,
) -> Result<json::File> {
    let file = usecases::get_file(
        &connections.shared()?,
        account.id(),
        &id.into(),
        Timestamp::now(),
    )?;
    Ok(Json(to_json::file(file, &*storage.0)))
}

#[put("/storage/files/<id>", format = "application/json", data = "<update>")]
pub fn put_file(
    connections: sqlite::Connections,
    account: Account,
    storage: &State<Storage>,
    id: &str,
    update: JsonResult<json::UpdateFile>,
) -> Result<json::File> {
    let update = from_json::update_file(update?.into_inner());
    let file = connections.transaction(|db| {
        usecases::update_file(db, account.id(), &id.into(), update, Timestamp::now())
    })?;
    Ok(Json(to_json::file(file, &*storage.0)))
}

#[delete("/storage/files/<id>")]
pub fn delete_file(
    connections: sqlite::Connections,
    account: Account,
    storage: &State<Storage>,
    id: &str,
) -> StatusResult {
    flows::delete_file(&connections, &*storage.0, account.id(), &id.into())?;
    Ok(Status::NoContent)
}

#[derive(Responder)]
pub struct Download {
    content: (ContentType, Vec<u8>),
    disposition: Header<'static>,
}

fn content_disposition(file_name: &str) -> Header<'static> {
    let file_name = file_name.replace(['"', '\\', '\r', '\n'], "_");
    Header::new(
        "Content-Disposition",
        format!("attachment; filename=\"{file_name}\""),
    )
}

#[post("/storage/files/<id>/download?<password>")]
pub fn post_download(
    connections: sqlite::Connections,
    account: Account,
    storage: &State<Storage>,
    id: &str,
    password: Option<&str>,
) -> result::Result<Download, ApiError> {
    let (file, content) =
        flows::download_file(&connections, &*storage.0, account.id(), &id.into(), password)?;
    let content_type = ContentType::parse_flexible(&file.mime_type).unwrap_or(ContentType::Binary);
    Ok(Download {
        content: (content_type, content),
        disposition: content_disposition(&file.original_name),
    })
}

#[get("/storage/shared")]
pub fn get_shares(
    connections: sqlite::Connections,
    account: Account,
) -> Result<Vec<json::SharedFile>> {
    let shares = usecases::load_shares(&connections.shared()?, account.id())?;
    Ok(Json(shares.into_iter().map(Into::into).collect()))
}

#[post("/storage/shared", format = "application/json", data = "<share>")]
pub fn post_share(
    connections: sqlite::Connections,
    account: Account,
    dispatcher: &State<EventDispatcher>,
    share: JsonResult<json::NewShare>,
) -> Result<json::SharedFile> {
    let share = from_json::new_share(share?.into_inner());
    let shared = flows::share_file(&connections, dispatcher, account.id(), share)?;
    Ok(Json(shared.into()))
}

#[delete("/storage/shared/<id>")]
pub fn delete_share(
    connections: sqlite::Connections,
    account: Account,
    id: &str,
) -> StatusResult {
    connections.transaction(|db| usecases::unshare_file(db, account.id(), &id.into()))?;
    Ok(Status::NoContent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::{
        api::tests::prelude::*,
        tests::{login, register_user},
    };

    #[test]
    fn split_comma_separated_tags() {
        assert_eq!(vec!["a", "b c"], split_tags(" a,, b c ,"));
        assert!(split_tags("").is_empty());
    }

    fn upload(client: &Client, token: &str, query: &str, body: &'static [u8]) -> json::File {
        let res = client
            .post(format!("/storage/files?{query}"))
            .header(ContentType::Plain)
            .header(bearer(token))
            .body(body)
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        res.into_json().unwrap()
    }

    #[test]
    fn upload_and_download_files() {
        let (client, db) = setup();
        register_user(&db, "alice", "alice@example.com", "secret123");
        register_user(&db, "bob", "bob@example.com", "secret123");
        let alice = login(&client, "alice@example.com", "secret123");
        let bob = login(&client, "bob@example.com", "secret123");

        let file = upload(
            &client,
            &alice,
            "name=notes.txt&tags=work,todo&is_public=true&password=s3cret",
            b"hello world",
        );
        assert_eq!(11, file.size);
        assert_eq!(json::FileType::Document, file.file_type);
        assert_eq!(vec!["work", "todo"], file.tags);
        assert!(file.password_protected);
        assert_eq!("notes.txt", file.title);

        // Public, but protected by a password
        let res = client
            .post(format!("/storage/files/{}/download", file.id))
            .header(bearer(&bob))
            .dispatch();
        assert_eq!(res.status(), Status::Forbidden);
        let res = client
            .post(format!("/storage/files/{}/download?password=s3cret", file.id))
            .header(bearer(&bob))
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        assert_eq!(Some(ContentType::Plain), res.content_type());
        assert_eq!(
            Some("attachment; filename=\"notes.txt\""),
            res.headers().get_one("Content-Disposition")
        );
        assert_eq!(b"hello world".to_vec(), res.into_bytes().unwrap());

        let file: json::File = client
            .get(format!("/storage/files/{}", file.id))
            .header(bearer(&alice))
            .dispatch()
            .into_json()
            .unwrap();
        assert_eq!(1, file.download_count);
        assert!(file.last_accessed.is_some());

        let res = client
            .put(format!("/storage/files/{}", file.id))
            .header(ContentType::JSON)
            .header(bearer(&bob))
            .body(r#"{"title":"Mine"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Forbidden);

        let res = client
            .delete(format!("/storage/files/{}", file.id))
            .header(bearer(&alice))
            .dispatch();
        assert_eq!(res.status(), Status::NoContent);
        let res = client
            .get(format!("/storage/files/{}", file.id))
            .header(bearer(&alice))
            .dispatch();
        assert_eq!(res.status(), Status::NotFound);
    }

    #[test]
    fn share_private_files() {
        let (client, db) = setup();
        register_user(&db, "alice", "alice@example.com", "secret123");
        let bob = register_user(&db, "bob", "bob@example.com", "secret123");
        let alice = login(&client, "alice@example.com", "secret123");
        let bob_token = login(&client, "bob@example.com", "secret123");
        let file = upload(&client, &alice, "name=plan.txt&title=Plan", b"secret plan");
        assert_eq!("Plan", file.title);

        let res = client
            .get(format!("/storage/files/{}", file.id))
            .header(bearer(&bob_token))
            .dispatch();
        assert_eq!(res.status(), Status::NotFound);

        let res = client
            .post("/storage/shared")
            .header(ContentType::JSON)
            .header(bearer(&alice))
            .body(format!(
                r#"{{"file_id":"{}","shared_with":"{}","permission":"edit"}}"#,
                file.id, bob.id
            ))
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        let share: json::SharedFile = res.into_json().unwrap();
        assert_eq!(json::Permission::Edit, share.permission);

        let files: Vec<json::File> = client
            .get("/storage/files")
            .header(bearer(&bob_token))
            .dispatch()
            .into_json()
            .unwrap();
        assert_eq!(1, files.len());
        let res = client
            .put(format!("/storage/files/{}", file.id))
            .header(ContentType::JSON)
            .header(bearer(&bob_token))
            .body(r#"{"description":"Updated by bob"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Ok);

        let shares: Vec<json::SharedFile> = client
            .get("/storage/shared")
            .header(bearer(&bob_token))
            .dispatch()
            .into_json()
            .unwrap();
        assert_eq!(1, shares.len());

        let res = client
            .delete(format!("/storage/shared/{}", share.id))
            .header(bearer(&bob_token))
            .dispatch();
        assert_eq!(res.status(), Status::NoContent);
        let res = client
            .get(format!("/storage/files/{}", file.id))
            .header(bearer(&bob_token))
            .dispatch();
        assert_eq!(res.status(), Status::NotFound);
    }
}
