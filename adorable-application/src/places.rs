use super::{dispatch::EventDispatcher, *};

pub fn create_place(
    connections: &sqlite::Connections,
    dispatcher: &EventDispatcher,
    creator: &User,
    new_place: usecases::NewPlace,
) -> Result<Place> {
    let now = Timestamp::now();
    let place = connections
        .exclusive()?
        .transaction(|conn| usecases::create_place(conn, creator, new_place, now))?;
    dispatcher.dispatch(fanout::on_place_stored(&place));
    Ok(place)
}

pub fn update_place(
    connections: &sqlite::Connections,
    dispatcher: &EventDispatcher,
    user: &User,
    id: &Id,
    update: usecases::NewPlace,
) -> Result<Place> {
    let now = Timestamp::now();
    let place = connections.exclusive()?.transaction(|conn| {
        usecases::update_place(conn, user, id, update, now).inspect_err(|err| {
            warn!("Failed to update place {id}: {err}");
        })
    })?;
    dispatcher.dispatch(fanout::on_place_stored(&place));
    Ok(place)
}

pub fn delete_place(
    connections: &sqlite::Connections,
    dispatcher: &EventDispatcher,
    user: &User,
    id: &Id,
) -> Result<()> {
    connections
        .exclusive()?
        .transaction(|conn| usecases::delete_place(conn, user, id))?;
    dispatcher.dispatch(vec![Event::PlaceChanged(id.clone())]);
    Ok(())
}

pub fn create_review(
    connections: &sqlite::Connections,
    dispatcher: &EventDispatcher,
    user_id: &Id,
    new_review: usecases::NewReview,
) -> Result<PlaceReview> {
    let now = Timestamp::now();
    let (review, events) = connections.exclusive()?.transaction(|conn| {
        let review = usecases::create_review(conn, user_id, new_review, now)?;
        let mut events = fanout::on_review_changed(conn, &review.place_id)?;
        events.extend(fanout::on_review_created(conn, &review)?);
        Ok::<_, usecases::Error>((review, events))
    })?;
    dispatcher.dispatch(events);
    Ok(review)
}

pub fn update_review(
    connections: &sqlite::Connections,
    dispatcher: &EventDispatcher,
    user: &User,
    id: &Id,
    rating: i64,
    text: &str,
) -> Result<PlaceReview> {
    let now = Timestamp::now();
    let (review, events) = connections.exclusive()?.transaction(|conn| {
        let review = usecases::update_review(conn, user, id, rating, text, now)?;
        let events = fanout::on_review_changed(conn, &review.place_id)?;
        Ok::<_, usecases::Error>((review, events))
    })?;
    dispatcher.dispatch(events);
    Ok(review)
}

pub fn delete_review(
    connections: &sqlite::Connections,
    dispatcher: &EventDispatcher,
    user: &User,
    id: &Id,
) -> Result<()> {
    let events = connections.exclusive()?.transaction(|conn| {
        let review = usecases::delete_review(conn, user, id)?;
        Ok::<_, usecases::Error>(fanout::on_review_changed(conn, &review.place_id)?)
    })?;
    dispatcher.dispatch(events);
    Ok(())
}

pub fn save_place(
    connections: &sqlite::Connections,
    dispatcher: &EventDispatcher,
    user_id: &Id,
    place_id: &Id,
    notes: Option<String>,
) -> Result<SavedPlace> {
    let now = Timestamp::now();
    let (saved, events) = connections.exclusive()?.transaction(|conn| {
        let saved = usecases::save_place(conn, user_id, place_id, notes, now)?;
        let events = fanout::on_place_saved(conn, &saved)?;
        Ok::<_, usecases::Error>((saved, events))
    })?;
    dispatcher.dispatch(events);
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::super::tests::prelude::*;

    fn new_review(place_id: &Id, rating: i64) -> usecases::NewReview {
        usecases::NewReview {
            place_id: place_id.clone(),
            rating,
            review: "Nice".into(),
        }
    }

    fn rating_of(fixture: &BackendFixture, id: &Id) -> (f64, u32) {
        let place = fixture.db_connections.shared().unwrap().get_place(id).unwrap();
        (place.rating.into(), place.total_ratings)
    }

    #[test]
    fn create_place_schedules_indexing_and_geocoding() {
        let fixture = BackendFixture::new();
        let user = fixture.create_user("alice", "alice@example.com", "secret123");
        let place = flows::create_place(
            &fixture.db_connections,
            &fixture.dispatcher,
            &user,
            new_place("Cafe", Some("Main Street 1, Berlin")),
        )
        .unwrap();
        assert_eq!(
            vec![
                Job::UpdateSearchIndex {
                    place_id: place.id.clone()
                },
                Job::GeocodePlace {
                    place_id: place.id.clone()
                },
            ],
            fixture.queue.jobs()
        );
    }

    #[test]
    fn rating_follows_reviews() {
        let fixture = BackendFixture::new();
        let owner = fixture.create_user("alice", "alice@example.com", "secret123");
        let bob = fixture.create_user("bob", "bob@example.com", "secret123");
        let carol = fixture.create_user("carol", "carol@example.com", "secret123");
        let place = fixture.create_place(&owner, "Cafe");

        let r1 = flows::create_review(
            &fixture.db_connections,
            &fixture.dispatcher,
            &bob.id,
            new_review(&place.id, 4),
        )
        .unwrap();
        flows::create_review(
            &fixture.db_connections,
            &fixture.dispatcher,
            &carol.id,
            new_review(&place.id, 1),
        )
        .unwrap();
        assert_eq!((2.5, 2), rating_of(&fixture, &place.id));

        // one review per user and place
        assert!(flows::create_review(
            &fixture.db_connections,
            &fixture.dispatcher,
            &bob.id,
            new_review(&place.id, 5),
        )
        .is_err());
        assert_eq!((2.5, 2), rating_of(&fixture, &place.id));

        flows::update_review(
            &fixture.db_connections,
            &fixture.dispatcher,
            &bob,
            &r1.id,
            5,
            "Great",
        )
        .unwrap();
        assert_eq!((3.0, 2), rating_of(&fixture, &place.id));

        flows::delete_review(&fixture.db_connections, &fixture.dispatcher, &bob, &r1.id).unwrap();
        assert_eq!((1.0, 1), rating_of(&fixture, &place.id));
    }

    #[test]
    fn review_notifies_place_creator() {
        let fixture = BackendFixture::new();
        let owner = fixture.create_user("alice", "alice@example.com", "secret123");
        let bob = fixture.create_user("bob", "bob@example.com", "secret123");
        let place = fixture.create_place(&owner, "Cafe");
        fixture.queue.clear();

        flows::create_review(
            &fixture.db_connections,
            &fixture.dispatcher,
            &bob.id,
            new_review(&place.id, 5),
        )
        .unwrap();
        let db = fixture.db_connections.shared().unwrap();
        let notifications = db.load_notifications(&owner.id, false, Some(10)).unwrap();
        assert_eq!(1, notifications.len());
        assert_eq!(NotificationType::PlaceReview, notifications[0].kind);
        let activities = db.load_activities_of_users(&[bob.id.clone()], 10).unwrap();
        assert_eq!(ActivityType::Review, activities[0].kind);
        assert!(fixture
            .realtime
            .paths()
            .contains(&format!("notifications/{}/{}", owner.id, notifications[0].id)));
        assert!(fixture
            .queue
            .jobs()
            .iter()
            .any(|job| matches!(job, Job::SendPush { user_ids, .. } if user_ids == &[owner.id.clone()])));
    }

    #[test]
    fn only_the_creator_may_delete_a_place() {
        let fixture = BackendFixture::new();
        let owner = fixture.create_user("alice", "alice@example.com", "secret123");
        let bob = fixture.create_user("bob", "bob@example.com", "secret123");
        let place = fixture.create_place(&owner, "Cafe");
        assert!(
            flows::delete_place(&fixture.db_connections, &fixture.dispatcher, &bob, &place.id)
                .is_err()
        );
        flows::delete_place(&fixture.db_connections, &fixture.dispatcher, &owner, &place.id)
            .unwrap();
        assert!(matches!(
            fixture.db_connections.shared().unwrap().get_place(&place.id),
            Err(RepoError::NotFound)
        ));
    }

    #[test]
    fn save_place_records_activity() {
        let fixture = BackendFixture::new();
        let owner = fixture.create_user("alice", "alice@example.com", "secret123");
        let place = fixture.create_place(&owner, "Cafe");
        let saved = flows::save_place(
            &fixture.db_connections,
            &fixture.dispatcher,
            &owner.id,
            &place.id,
            Some("for later".into()),
        )
        .unwrap();
        assert_eq!("for later", saved.notes);
        let activities = fixture
            .db_connections
            .shared()
            .unwrap()
            .load_activities_of_users(&[owner.id.clone()], 10)
            .unwrap();
        assert_eq!(ActivityType::SavePlace, activities[0].kind);
    }
}
