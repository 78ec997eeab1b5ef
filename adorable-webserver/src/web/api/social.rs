use super::*;

// ---   follows   --- //

#[get("/social/follows")]
pub fn get_follows(connections: sqlite::Connections, account: Account) -> Result<Vec<json::Follow>> {
    let follows = usecases::load_following(&connections.shared()?, account.id())?;
    Ok(Json(follows.into_iter().map(Into::into).collect()))
}

#[post("/social/follows", format = "application/json", data = "<follow>")]
pub fn post_follow(
    connections: sqlite::Connections,
    account: Account,
    dispatcher: &State<EventDispatcher>,
    follow: JsonResult<json::NewFollow>,
) -> Result<json::Follow> {
    let json::NewFollow { user_id } = follow?.into_inner();
    let connection = flows::follow_user(&connections, dispatcher, account.id(), &user_id.into())?;
    Ok(Json(connection.into()))
}

#[delete("/social/follows/<user_id>")]
pub fn delete_follow(
    connections: sqlite::Connections,
    account: Account,
    dispatcher: &State<EventDispatcher>,
    user_id: &str,
) -> StatusResult {
    flows::unfollow_user(&connections, dispatcher, account.id(), &user_id.into())?;
    Ok(Status::NoContent)
}

#[get("/social/follows/followers")]
pub fn get_followers(
    connections: sqlite::Connections,
    account: Account,
) -> Result<Vec<json::Follow>> {
    let followers = usecases::load_followers(&connections.shared()?, account.id())?;
    Ok(Json(followers.into_iter().map(Into::into).collect()))
}

#[get("/social/follows/following")]
pub fn get_following(
    connections: sqlite::Connections,
    account: Account,
) -> Result<Vec<json::Follow>> {
    let following = usecases::load_following(&connections.shared()?, account.id())?;
    Ok(Json(following.into_iter().map(Into::into).collect()))
}

// ---   blocks   --- //

#[get("/social/blocks")]
pub fn get_blocks(connections: sqlite::Connections, account: Account) -> Result<Vec<json::Block>> {
    let blocks = usecases::load_blocks(&connections.shared()?, account.id())?;
    Ok(Json(blocks.into_iter().map(Into::into).collect()))
}

#[post("/social/blocks", format = "application/json", data = "<block>")]
pub fn post_block(
    connections: sqlite::Connections,
    account: Account,
    dispatcher: &State<EventDispatcher>,
    block: JsonResult<json::NewBlock>,
) -> Result<json::Block> {
    let json::NewBlock { user_id, reason } = block?.into_inner();
    let block = flows::block_user(&connections, dispatcher, account.id(), &user_id.into(), reason)?;
    Ok(Json(block.into()))
}

#[delete("/social/blocks/<user_id>")]
pub fn delete_block(
    connections: sqlite::Connections,
    account: Account,
    user_id: &str,
) -> StatusResult {
    connections.transaction(|db| usecases::unblock_user(db, account.id(), &user_id.into()))?;
    Ok(Status::NoContent)
}

// ---   reports   --- //

#[get("/social/reports")]
pub fn get_reports(connections: sqlite::Connections, account: Account) -> Result<Vec<json::Report>> {
    let reports = usecases::load_reports(&connections.shared()?, account.user())?;
    Ok(Json(reports.into_iter().map(Into::into).collect()))
}

#[post("/social/reports", format = "application/json", data = "<report>")]
pub fn post_report(
    connections: sqlite::Connections,
    account: Account,
    report: JsonResult<json::NewReport>,
) -> Result<json::Report> {
    let new_report = from_json::new_report(report?.into_inner());
    let report = connections.transaction(|db| {
        usecases::report_user(db, account.id(), new_report, Timestamp::now())
    })?;
    Ok(Json(report.into()))
}

#[post("/social/reports/<id>/status", format = "application/json", data = "<change>")]
pub fn post_report_status(
    connections: sqlite::Connections,
    staff: Staff,
    id: &str,
    change: JsonResult<json::ChangeReportStatus>,
) -> Result<json::Report> {
    let json::ChangeReportStatus {
        status,
        admin_notes,
    } = change?.into_inner();
    let report = connections.transaction(|db| {
        usecases::change_report_status(
            db,
            staff.user(),
            &id.into(),
            status.into(),
            admin_notes,
            Timestamp::now(),
        )
    })?;
    Ok(Json(report.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::{
        api::tests::prelude::*,
        tests::{login, register_staff, register_user},
    };

    fn follow(client: &Client, token: &str, user_id: &str) -> LocalResponse<'_> {
        client
            .post("/social/follows")
            .header(ContentType::JSON)
            .header(bearer(token))
            .body(format!(r#"{{"user_id":"{user_id}"}}"#))
            .dispatch()
    }

    #[test]
    fn follow_back_makes_the_edges_mutual() {
        let (client, db) = setup();
        let alice = register_user(&db, "alice", "alice@example.com", "secret123");
        let bob = register_user(&db, "bob", "bob@example.com", "secret123");
        let alice_token = login(&client, "alice@example.com", "secret123");
        let bob_token = login(&client, "bob@example.com", "secret123");

        let res = follow(&client, &alice_token, bob.id.as_str());
        assert_eq!(res.status(), Status::Ok);
        let edge: json::Follow = res.into_json().unwrap();
        assert!(!edge.is_mutual);

        let res = follow(&client, &alice_token, bob.id.as_str());
        assert_eq!(res.status(), Status::BadRequest);
        let res = follow(&client, &alice_token, alice.id.as_str());
        assert_eq!(res.status(), Status::BadRequest);

        let edge: json::Follow = follow(&client, &bob_token, alice.id.as_str())
            .into_json()
            .unwrap();
        assert!(edge.is_mutual);

        let followers: Vec<json::Follow> = client
            .get("/social/follows/followers")
            .header(bearer(&alice_token))
            .dispatch()
            .into_json()
            .unwrap();
        assert_eq!(1, followers.len());
        assert_eq!(bob.id.as_str(), followers[0].follower_id);

        let res = client
            .delete(format!("/social/follows/{}", bob.id))
            .header(bearer(&alice_token))
            .dispatch();
        assert_eq!(res.status(), Status::NoContent);
        let following: Vec<json::Follow> = client
            .get("/social/follows/following")
            .header(bearer(&bob_token))
            .dispatch()
            .into_json()
            .unwrap();
        assert_eq!(1, following.len());
        assert!(!following[0].is_mutual);
    }

    #[test]
    fn blocked_users_cannot_follow() {
        let (client, db) = setup();
        let alice = register_user(&db, "alice", "alice@example.com", "secret123");
        let bob = register_user(&db, "bob", "bob@example.com", "secret123");
        let alice_token = login(&client, "alice@example.com", "secret123");
        let bob_token = login(&client, "bob@example.com", "secret123");
        follow(&client, &bob_token, alice.id.as_str());

        let res = client
            .post("/social/blocks")
            .header(ContentType::JSON)
            .header(bearer(&alice_token))
            .body(format!(r#"{{"user_id":"{}","reason":"spam"}}"#, bob.id))
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        let followers: Vec<json::Follow> = client
            .get("/social/follows/followers")
            .header(bearer(&alice_token))
            .dispatch()
            .into_json()
            .unwrap();
        assert!(followers.is_empty());

        let res = follow(&client, &bob_token, alice.id.as_str());
        assert_eq!(res.status(), Status::Forbidden);

        let res = client
            .delete(format!("/social/blocks/{}", bob.id))
            .header(bearer(&alice_token))
            .dispatch();
        assert_eq!(res.status(), Status::NoContent);
        let blocks: Vec<json::Block> = client
            .get("/social/blocks")
            .header(bearer(&alice_token))
            .dispatch()
            .into_json()
            .unwrap();
        assert!(blocks.is_empty());
        assert_eq!(
            Status::Ok,
            follow(&client, &bob_token, alice.id.as_str()).status()
        );
    }

    #[test]
    fn staff_handles_reports() {
        let (client, db) = setup();
        let alice = register_user(&db, "alice", "alice@example.com", "secret123");
        register_user(&db, "bob", "bob@example.com", "secret123");
        register_staff(&db, "carol", "carol@example.com", "secret123");
        let bob = login(&client, "bob@example.com", "secret123");
        let carol = login(&client, "carol@example.com", "secret123");

        let res = client
            .post("/social/reports")
            .header(ContentType::JSON)
            .header(bearer(&bob))
            .body(format!(
                r#"{{"reported_user_id":"{}","reason":"harassment","description":"rude"}}"#,
                alice.id
            ))
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        let report: json::Report = res.into_json().unwrap();
        assert_eq!(json::ReportStatus::Pending, report.status);

        let res = client
            .post(format!("/social/reports/{}/status", report.id))
            .header(ContentType::JSON)
            .header(bearer(&bob))
            .body(r#"{"status":"dismissed"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Forbidden);

        let res = client
            .post(format!("/social/reports/{}/status", report.id))
            .header(ContentType::JSON)
            .header(bearer(&carol))
            .body(r#"{"status":"resolved","admin_notes":"warned"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
        let report: json::Report = res.into_json().unwrap();
        assert_eq!(json::ReportStatus::Resolved, report.status);
        assert_eq!(Some("warned".to_string()), report.admin_notes);

        let all: Vec<json::Report> = client
            .get("/social/reports")
            .header(bearer(&carol))
            .dispatch()
            .into_json()
            .unwrap();
        assert_eq!(1, all.len());
        let own: Vec<json::Report> = client
            .get("/social/reports")
            .header(bearer(&bob))
            .dispatch()
            .into_json()
            .unwrap();
        assert_eq!(1, own.len());
    }
}
