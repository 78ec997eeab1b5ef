use super::prelude::*;
use crate::gateways::push::PushMessage;
use std::collections::{BTreeMap, HashMap};
use time::Duration;

/// Reviews within this period count as recent.
pub const RECENT_REVIEW_PERIOD: Duration = Duration::hours(24);

/// Period of unread notifications that are summarized in a digest.
pub const DIGEST_PERIOD: Duration = Duration::days(1);

const TOP_RATED_COUNT: usize = 10;

/// Weighted score of the average rating, the number of reviews
/// and the number of recent reviews.
pub fn ranking_score(avg_rating: f64, total_reviews: usize, recent_reviews: usize) -> f64 {
    avg_rating * 0.5
        + (total_reviews.min(100) as f64 / 100.0) * 0.3
        + (recent_reviews.min(10) as f64 / 10.0) * 0.2
}

/// Recalculates the ranking score of all places.
///
/// Returns the number of places that have been updated.
pub fn update_place_rankings<R>(repo: &R, now: Timestamp) -> Result<usize>
where
    R: PlaceRepo + ReviewRepo,
{
    let since = now - RECENT_REVIEW_PERIOD;
    let mut count = 0;
    for mut place in repo.all_places()? {
        let recent = repo.count_reviews_of_place_since(&place.id, since)?;
        let score = ranking_score(place.rating.into(), place.total_ratings as usize, recent);
        if (score - place.ranking_score).abs() > f64::EPSILON {
            place.ranking_score = score;
            repo.update_place(&place)?;
            count += 1;
        }
    }
    log::info!("Updated rankings of {count} place(s)");
    Ok(count)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceStatistics {
    pub total_places: usize,
    pub total_reviews: usize,
    pub places_per_category: BTreeMap<String, usize>,
    /// Best rated places with at least one review.
    pub top_rated: Vec<(Id, String, f64)>,
}

pub fn calculate_place_statistics<R: PlaceRepo>(repo: &R) -> Result<PlaceStatistics> {
    let places = repo.all_places()?;
    let mut places_per_category = BTreeMap::new();
    for place in &places {
        *places_per_category.entry(place.category.clone()).or_insert(0) += 1;
    }
    let total_reviews = places.iter().map(|p| p.total_ratings as usize).sum();
    let mut rated: Vec<_> = places.iter().filter(|p| p.total_ratings > 0).collect();
    rated.sort_by(|a, b| {
        f64::from(b.rating)
            .total_cmp(&f64::from(a.rating))
            .then(b.total_ratings.cmp(&a.total_ratings))
    });
    let top_rated = rated
        .into_iter()
        .take(TOP_RATED_COUNT)
        .map(|p| (p.id.clone(), p.name.clone(), p.rating.into()))
        .collect();
    Ok(PlaceStatistics {
        total_places: places.len(),
        total_reviews,
        places_per_category,
        top_rated,
    })
}

/// Summary of the recent unread notifications of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDigest {
    pub user_id: Id,
    pub counts: BTreeMap<NotificationType, usize>,
    pub notification_ids: Vec<Id>,
}

impl NotificationDigest {
    pub fn total(&self) -> usize {
        self.notification_ids.len()
    }

    pub fn push_message(&self) -> PushMessage {
        let mut data: Payload = self
            .counts
            .iter()
            .map(|(kind, count)| (kind.as_ref().to_owned(), count.to_string()))
            .collect();
        data.insert("type".into(), "digest".into());
        data.insert("count".into(), self.total().to_string());
        PushMessage {
            title: "Daily Updates".into(),
            body: format!("You have {} new notifications", self.total()),
            data,
        }
    }
}

/// Groups the unread notifications of the last day by user and type.
///
/// Users that disabled digests are skipped.
pub fn prepare_notification_digests<R>(repo: &R, now: Timestamp) -> Result<Vec<NotificationDigest>>
where
    R: UserRepo + NotificationRepo,
{
    let mut by_user: HashMap<Id, Vec<Notification>> = HashMap::new();
    for n in repo.load_unread_notifications_since(now - DIGEST_PERIOD)? {
        by_user.entry(n.user_id.clone()).or_default().push(n);
    }
    let user_ids: Vec<_> = by_user.keys().cloned().collect();
    let mut digests: Vec<_> = repo
        .get_users(&user_ids)?
        .into_iter()
        .filter(|u| u.notifications.digest_enabled)
        .filter_map(|u| by_user.remove(&u.id).map(|n| (u.id, n)))
        .map(|(user_id, notifications)| {
            let mut counts = BTreeMap::new();
            for n in &notifications {
                *counts.entry(n.kind).or_insert(0) += 1;
            }
            NotificationDigest {
                user_id,
                counts,
                notification_ids: notifications.into_iter().map(|n| n.id).collect(),
            }
        })
        .collect();
    digests.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    Ok(digests)
}

/// Marks the summarized notifications as read.
pub fn mark_digest_sent<R: NotificationRepo>(repo: &R, digest: &NotificationDigest) -> Result<usize> {
    Ok(repo.mark_notifications_read(&digest.notification_ids)?)
}

#[cfg(test)]
mod tests {
    use super::{super::tests::*, *};

    #[test]
    fn calculate_ranking_score() {
        assert_eq!(0.0, ranking_score(0.0, 0, 0));
        assert!((ranking_score(4.0, 50, 5) - (2.0 + 0.15 + 0.1)).abs() < 1e-9);
        // capped counts
        assert!((ranking_score(5.0, 1000, 50) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn rankings_consider_recent_reviews() {
        let db = MockDb::default();
        let now = Timestamp::from_secs(1_000_000);
        for id in ["a", "b"] {
            let mut place = Place::build().id(id).name(id).finish();
            place.rating = 4.0.into();
            place.total_ratings = 1;
            db.places.borrow_mut().push(place);
        }
        for (place, created_at) in [("a", now - Duration::hours(1)), ("b", now - Duration::days(2))] {
            db.reviews.borrow_mut().push(PlaceReview {
                id: Id::new(),
                place_id: place.into(),
                user_id: "u".into(),
                rating: RatingValue::try_from(4).unwrap(),
                review: "".into(),
                created_at,
                updated_at: created_at,
            });
        }
        assert_eq!(2, update_place_rankings(&db, now).unwrap());
        let a = db.get_place(&"a".into()).unwrap();
        let b = db.get_place(&"b".into()).unwrap();
        assert!((a.ranking_score - (2.0 + 0.003 + 0.02)).abs() < 1e-9);
        assert!((b.ranking_score - (2.0 + 0.003)).abs() < 1e-9);
        // nothing changed
        assert_eq!(0, update_place_rankings(&db, now).unwrap());
    }

    #[test]
    fn place_statistics() {
        let db = MockDb::default();
        for (id, category, rating, total) in [
            ("a", "cafe", 3.0, 2),
            ("b", "cafe", 4.5, 4),
            ("c", "bar", 0.0, 0),
        ] {
            let mut place = Place::build().id(id).name(id).category(category).finish();
            place.rating = rating.into();
            place.total_ratings = total;
            db.places.borrow_mut().push(place);
        }
        let stats = calculate_place_statistics(&db).unwrap();
        assert_eq!(3, stats.total_places);
        assert_eq!(6, stats.total_reviews);
        assert_eq!(Some(&2), stats.places_per_category.get("cafe"));
        let top: Vec<_> = stats.top_rated.iter().map(|(id, _, _)| id.as_str()).collect();
        assert_eq!(vec!["b", "a"], top);
    }

    #[test]
    fn group_digests_by_user_and_type() {
        let db = MockDb::default();
        let alice = add_user(&db, "alice");
        let mut bob = add_user(&db, "bob");
        bob.notifications.digest_enabled = false;
        db.update_user(&bob).unwrap();
        let now = Timestamp::from_secs(1_000_000);
        let notify = |user: &User, kind, age: Duration| {
            db.create_notification(&Notification {
                id: Id::new(),
                user_id: user.id.clone(),
                kind,
                title: "".into(),
                message: "".into(),
                data: Payload::new(),
                is_read: false,
                action_url: None,
                created_at: now - age,
            })
            .unwrap();
        };
        notify(&alice, NotificationType::NewFollower, Duration::hours(1));
        notify(&alice, NotificationType::NewFollower, Duration::hours(2));
        notify(&alice, NotificationType::NewMessage, Duration::hours(3));
        notify(&alice, NotificationType::NewMessage, Duration::days(3));
        notify(&bob, NotificationType::NewMessage, Duration::hours(1));

        let digests = prepare_notification_digests(&db, now).unwrap();
        assert_eq!(1, digests.len());
        let digest = &digests[0];
        assert_eq!(alice.id, digest.user_id);
        assert_eq!(3, digest.total());
        assert_eq!(Some(&2), digest.counts.get(&NotificationType::NewFollower));

        let msg = digest.push_message();
        assert_eq!("You have 3 new notifications", msg.body);
        assert_eq!(Some("2"), msg.data.get("new_follower").map(String::as_str));
        assert_eq!(Some("digest"), msg.data.get("type").map(String::as_str));

        assert_eq!(3, mark_digest_sent(&db, digest).unwrap());
        assert!(prepare_notification_digests(&db, now).unwrap().is_empty());
    }
}
