use super::*;

#[get("/chats")]
pub fn get_chats(connections: sqlite::Connections, account: Account) -> Result<Vec<json::Chat>> {
    let chats = usecases::load_chats(&connections.shared()?, account.id())?;
    Ok(Json(chats.into_iter().map(Into::into).collect()))
}

/// Responds with `201` for new chats and with `200` if an
/// existing direct chat is returned.
#[post("/chats", format = "application/json", data = "<chat>")]
pub fn post_chat(
    connections: sqlite::Connections,
    account: Account,
    dispatcher: &State<EventDispatcher>,
    chat: JsonResult<json::NewChat>,
) -> result::Result<(Status, Json<json::Chat>), ApiError> {
    let new_chat = from_json::new_chat(chat?.into_inner());
    let (chat, created) = flows::create_chat(&connections, dispatcher, account.id(), new_chat)?;
    let status = if created { Status::Created } else { Status::Ok };
    Ok((status, Json(chat.into())))
}

#[get("/chats/<id>")]
pub fn get_chat(
    connections: sqlite::Connections,
    account: Account,
    id: &str,
) -> Result<json::Chat> {
    let chat = usecases::get_chat(&connections.shared()?, account.id(), &id.into())?;
    Ok(Json(chat.into()))
}

#[post("/chats/<id>/participants", format = "application/json", data = "<participants>")]
pub fn post_participants(
    connections: sqlite::Connections,
    account: Account,
    dispatcher: &State<EventDispatcher>,
    id: &str,
    participants: JsonResult<json::NewParticipants>,
) -> Result<json::Chat> {
    let json::NewParticipants { user_ids } = participants?.into_inner();
    let user_ids: Vec<Id> = user_ids.into_iter().map(Id::from).collect();
    let chat = flows::add_chat_participants(
        &connections,
        dispatcher,
        account.id(),
        &id.into(),
        &user_ids,
    )?;
    Ok(Json(chat.into()))
}

#[get("/chats/<id>/messages?<limit>")]
pub fn get_messages(
    connections: sqlite::Connections,
    account: Account,
    id: &str,
    limit: Option<u32>,
) -> Result<Vec<json::Message>> {
    let messages =
        usecases::load_messages(&connections.shared()?, account.id(), &id.into(), limit)?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

#[post("/chats/<id>/messages", format = "application/json", data = "<message>")]
pub fn post_message(
    connections: sqlite::Connections,
    account: Account,
    dispatcher: &State<EventDispatcher>,
    id: &str,
    message: JsonResult<json::NewMessage>,
) -> Result<json::Message> {
    let new_message = from_json::new_message(message?.into_inner());
    let message =
        flows::post_message(&connections, dispatcher, account.id(), &id.into(), new_message)?;
    Ok(Json(message.into()))
}

#[post("/chats/<id>/read")]
pub fn post_read(connections: sqlite::Connections, account: Account, id: &str) -> StatusResult {
    let count =
        connections.transaction(|db| usecases::mark_chat_read(db, account.id(), &id.into()))?;
    debug!("Marked {count} message(s) of chat {id} as read");
    Ok(Status::NoContent)
}
