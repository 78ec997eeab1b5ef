use super::prelude::*;

/// Creates the edge `follower -> following`.
///
/// The mutual flag and the notifications are derived afterwards.
pub fn follow_user<R>(repo: &R, follower_id: &Id, following_id: &Id, now: Timestamp) -> Result<Connection>
where
    R: UserRepo + ConnectionRepo + BlockRepo,
{
    if follower_id == following_id {
        return Err(Error::FollowSelf);
    }
    // The user must exist
    repo.get_user(following_id)?;
    if repo.is_blocked_either_way(follower_id, following_id)? {
        return Err(Error::Blocked);
    }
    if repo.try_get_connection(follower_id, following_id)?.is_some() {
        return Err(Error::AlreadyFollowing);
    }
    let connection = Connection {
        id: Id::new(),
        follower_id: follower_id.clone(),
        following_id: following_id.clone(),
        is_mutual: false,
        created_at: now,
    };
    repo.create_connection(&connection)
        .map_err(|err| match err {
            RepoError::AlreadyExists => Error::AlreadyFollowing,
            err => Error::Repo(err),
        })?;
    Ok(connection)
}

pub fn unfollow_user<R: ConnectionRepo>(repo: &R, follower_id: &Id, following_id: &Id) -> Result<()> {
    repo.delete_connection(follower_id, following_id)
        .map_err(|err| match err {
            RepoError::NotFound => Error::NotFollowing,
            err => Error::Repo(err),
        })
}

pub fn load_followers<R: ConnectionRepo>(repo: &R, user_id: &Id) -> Result<Vec<Connection>> {
    Ok(repo.load_followers(user_id)?)
}

pub fn load_following<R: ConnectionRepo>(repo: &R, user_id: &Id) -> Result<Vec<Connection>> {
    Ok(repo.load_following(user_id)?)
}

/// Blocks a user and removes the follow edges between both users.
///
/// Returns the block and the ids of the removed edges as `(follower, following)`.
pub fn block_user<R>(
    repo: &R,
    blocker_id: &Id,
    blocked_id: &Id,
    reason: Option<String>,
    now: Timestamp,
) -> Result<(Block, Vec<(Id, Id)>)>
where
    R: UserRepo + ConnectionRepo + BlockRepo,
{
    if blocker_id == blocked_id {
        return Err(Error::BlockSelf);
    }
    repo.get_user(blocked_id)?;
    if repo.try_get_block(blocker_id, blocked_id)?.is_some() {
        return Err(Error::AlreadyBlocked);
    }
    let block = Block {
        id: Id::new(),
        blocker_id: blocker_id.clone(),
        blocked_id: blocked_id.clone(),
        reason: validate::non_empty(reason),
        created_at: now,
    };
    repo.create_block(&block)?;
    let mut removed = vec![];
    for (a, b) in [(blocker_id, blocked_id), (blocked_id, blocker_id)] {
        if repo.try_get_connection(a, b)?.is_some() {
            repo.delete_connection(a, b)?;
            removed.push((a.clone(), b.clone()));
        }
    }
    log::debug!(
        "User {blocker_id} blocked {blocked_id}, removed {} connection(s)",
        removed.len()
    );
    Ok((block, removed))
}

pub fn unblock_user<R: BlockRepo>(repo: &R, blocker_id: &Id, blocked_id: &Id) -> Result<()> {
    Ok(repo.delete_block(blocker_id, blocked_id)?)
}

pub fn load_blocks<R: BlockRepo>(repo: &R, blocker_id: &Id) -> Result<Vec<Block>> {
    Ok(repo.load_blocks(blocker_id)?)
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub reported_user_id: Id,
    pub reason: ReportReason,
    pub description: String,
}

pub fn report_user<R>(repo: &R, reporter_id: &Id, new_report: NewReport, now: Timestamp) -> Result<Report>
where
    R: UserRepo + ReportRepo,
{
    let NewReport {
        reported_user_id,
        reason,
        description,
    } = new_report;
    if &reported_user_id == reporter_id {
        return Err(Error::ReportSelf);
    }
    repo.get_user(&reported_user_id)?;
    let report = Report {
        id: Id::new(),
        reporter_id: reporter_id.clone(),
        reported_user_id,
        reason,
        description: description.trim().to_owned(),
        status: ReportStatus::Pending,
        admin_notes: None,
        created_at: now,
        updated_at: now,
    };
    log::info!("User {} has been reported: {}", report.reported_user_id, reason.as_ref());
    repo.create_report(&report)?;
    Ok(report)
}

/// Staff sees all reports, everyone else only their own.
pub fn load_reports<R: ReportRepo>(repo: &R, user: &User) -> Result<Vec<Report>> {
    let mut reports = if user.is_staff() {
        repo.all_reports()?
    } else {
        repo.load_reports_by_reporter(&user.id)?
    };
    reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(reports)
}

/// `admin_notes` replace the previous notes if present.
pub fn change_report_status<R: ReportRepo>(
    repo: &R,
    user: &User,
    id: &Id,
    status: ReportStatus,
    admin_notes: Option<String>,
    now: Timestamp,
) -> Result<Report> {
    if !user.is_staff() {
        return Err(Error::Forbidden);
    }
    let mut report = repo.get_report(id)?;
    report.status = status;
    if admin_notes.is_some() {
        report.admin_notes = validate::non_empty(admin_notes);
    }
    report.updated_at = now;
    repo.update_report(&report)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{super::tests::*, *};

    #[test]
    fn follow_and_unfollow() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let now = Timestamp::now();
        follow_user(&db, &alice.id, &bob.id, now).unwrap();
        assert!(matches!(
            follow_user(&db, &alice.id, &bob.id, now),
            Err(Error::AlreadyFollowing)
        ));
        assert!(matches!(
            follow_user(&db, &alice.id, &alice.id, now),
            Err(Error::FollowSelf)
        ));
        assert!(matches!(
            follow_user(&db, &alice.id, &"nobody".into(), now),
            Err(Error::Repo(RepoError::NotFound))
        ));
        assert_eq!(1, load_followers(&db, &bob.id).unwrap().len());
        unfollow_user(&db, &alice.id, &bob.id).unwrap();
        assert!(matches!(
            unfollow_user(&db, &alice.id, &bob.id),
            Err(Error::NotFollowing)
        ));
    }

    #[test]
    fn blocking_removes_connections_in_both_directions() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let carol = add_user(&db, "carol");
        let now = Timestamp::now();
        follow_user(&db, &alice.id, &bob.id, now).unwrap();
        follow_user(&db, &bob.id, &alice.id, now).unwrap();
        follow_user(&db, &carol.id, &alice.id, now).unwrap();

        let (_, removed) = block_user(&db, &alice.id, &bob.id, Some("spam".into()), now).unwrap();
        assert_eq!(2, removed.len());
        assert!(db.try_get_connection(&alice.id, &bob.id).unwrap().is_none());
        assert!(db.try_get_connection(&bob.id, &alice.id).unwrap().is_none());
        assert!(db.try_get_connection(&carol.id, &alice.id).unwrap().is_some());

        // neither side can follow the other one
        assert!(matches!(
            follow_user(&db, &bob.id, &alice.id, now),
            Err(Error::Blocked)
        ));
        assert!(matches!(
            follow_user(&db, &alice.id, &bob.id, now),
            Err(Error::Blocked)
        ));
        assert!(matches!(
            block_user(&db, &alice.id, &bob.id, None, now),
            Err(Error::AlreadyBlocked)
        ));

        unblock_user(&db, &alice.id, &bob.id).unwrap();
        assert!(follow_user(&db, &bob.id, &alice.id, now).is_ok());
    }

    #[test]
    fn reports() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let staff = add_staff(&db, "staff");
        let now = Timestamp::now();
        let new_report = NewReport {
            reported_user_id: bob.id.clone(),
            reason: ReportReason::Spam,
            description: "ads everywhere".into(),
        };
        let report = report_user(&db, &alice.id, new_report.clone(), now).unwrap();
        assert_eq!(ReportStatus::Pending, report.status);
        assert!(matches!(
            report_user(&db, &bob.id, new_report, now),
            Err(Error::ReportSelf)
        ));

        assert_eq!(1, load_reports(&db, &alice).unwrap().len());
        assert!(load_reports(&db, &bob).unwrap().is_empty());
        assert_eq!(1, load_reports(&db, &staff).unwrap().len());

        assert!(matches!(
            change_report_status(&db, &alice, &report.id, ReportStatus::Dismissed, None, now),
            Err(Error::Forbidden)
        ));
        let changed = change_report_status(
            &db,
            &staff,
            &report.id,
            ReportStatus::Resolved,
            Some("account suspended".into()),
            now,
        )
        .unwrap();
        assert_eq!(ReportStatus::Resolved, changed.status);
        assert_eq!(Some("account suspended"), changed.admin_notes.as_deref());
    }
}
