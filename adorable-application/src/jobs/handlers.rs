use adorable_core::{
    gateways::{
        geocode::GeoCodingGateway,
        image::ImageProcessor,
        push::{PushGateway, PushMessage, PushReport, MAX_PUSH_BATCH_SIZE},
        storage::FileStorage,
    },
    jobs::Job,
};
use anyhow::{anyhow, bail, Result as Fallible};
use std::sync::Arc;

use super::super::*;

const THUMBNAIL_SIZE: u32 = 300;

/// Everything the job handlers need.
pub struct JobContext {
    pub connections: sqlite::Connections,
    pub index: Arc<dyn PlaceIndexer + Send + Sync>,
    pub geocoder: Option<Arc<dyn GeoCodingGateway + Send + Sync>>,
    pub push: Option<Arc<dyn PushGateway + Send + Sync>>,
    pub storage: Arc<dyn FileStorage + Send + Sync>,
    pub images: Arc<dyn ImageProcessor + Send + Sync>,
}

pub(super) fn run(ctx: &JobContext, job: &Job) -> Fallible<()> {
    match job {
        Job::ProcessImage { file_id, avatar_of } => process_image(ctx, file_id, avatar_of.as_ref()),
        Job::GeocodePlace { place_id } => geocode_place(ctx, place_id),
        Job::SendPush { user_ids, message } => send_push(ctx, user_ids, message).map(|_| ()),
        Job::UpdateSearchIndex { place_id } => update_search_index(ctx, place_id),
        Job::CleanupExpiredTokens => cleanup_expired_tokens(ctx),
        Job::UpdatePlaceRankings => update_place_rankings(ctx),
        Job::SendNotificationDigests => send_notification_digests(ctx),
        Job::CalculatePlaceStatistics => calculate_place_statistics(ctx),
    }
}

fn thumbnail_path(storage_path: &str) -> String {
    match storage_path.rsplit_once('/') {
        Some((dir, name)) => format!("{dir}/thumb_{name}"),
        None => format!("thumb_{storage_path}"),
    }
}

fn process_image(ctx: &JobContext, file_id: &Id, avatar_of: Option<&Id>) -> Fallible<()> {
    let file = ctx.connections.shared()?.get_file(file_id)?;
    if file.file_type != FileType::Image {
        bail!("File {file_id} is not an image");
    }
    let thumb_path = thumbnail_path(&file.storage_path);
    let (Some(src), Some(dst)) = (
        ctx.storage.local_path(&file.storage_path),
        ctx.storage.local_path(&thumb_path),
    ) else {
        bail!("Thumbnails can only be created from local files");
    };
    ctx.images
        .thumbnail(&src, &dst, THUMBNAIL_SIZE, THUMBNAIL_SIZE)?;
    debug!("Created thumbnail {thumb_path}");
    if let Some(user_id) = avatar_of {
        let url = ctx.storage.url(&thumb_path);
        ctx.connections.exclusive()?.transaction(|conn| {
            usecases::set_avatar_url(conn, user_id, url, Timestamp::now())
        })?;
        info!("Updated avatar of user {user_id}");
    }
    Ok(())
}

fn geocode_place(ctx: &JobContext, place_id: &Id) -> Fallible<()> {
    let Some(geocoder) = &ctx.geocoder else {
        bail!("No geocoding service available");
    };
    let place = ctx.connections.shared()?.get_place(place_id)?;
    if !place.needs_geocoding() {
        debug!("Place {place_id} has already been located");
        return Ok(());
    }
    let pos = geocoder
        .resolve_address(&place.address)
        .ok_or_else(|| anyhow!("Unable to resolve address of place {place_id}"))?;
    let place = ctx.connections.exclusive()?.transaction(|conn| {
        // Reload to not overwrite concurrent modifications
        let mut place = conn.get_place(place_id)?;
        place.pos = Some(pos);
        place.updated_at = Timestamp::now();
        conn.update_place(&place)?;
        Ok::<_, RepoError>(place)
    })?;
    ctx.index.add_or_update_place(&place)?;
    ctx.index.flush_index()?;
    info!(
        "Located place {place_id} at ({}, {})",
        pos.lat(),
        pos.lng()
    );
    Ok(())
}

fn send_push(ctx: &JobContext, user_ids: &[Id], message: &PushMessage) -> Fallible<PushReport> {
    let Some(push) = &ctx.push else {
        bail!("No push service available");
    };
    let tokens: Vec<_> = {
        let db = ctx.connections.shared()?;
        let recipients: Vec<_> = db
            .get_users(user_ids)?
            .into_iter()
            .filter(|u| u.notifications.push_enabled)
            .map(|u| u.id)
            .collect();
        if recipients.is_empty() {
            return Ok(PushReport::default());
        }
        db.load_device_tokens(&recipients)?
            .into_iter()
            .map(|t| t.token)
            .collect()
    };
    let mut report = PushReport::default();
    for batch in tokens.chunks(MAX_PUSH_BATCH_SIZE) {
        report += push.send_multicast(batch, message)?;
    }
    debug!(
        "Sent push message to {} device(s), {} failed",
        report.success_count, report.failure_count
    );
    Ok(report)
}

fn update_search_index(ctx: &JobContext, place_id: &Id) -> Fallible<()> {
    match ctx.connections.shared()?.get_place(place_id) {
        Ok(place) => ctx.index.add_or_update_place(&place)?,
        Err(RepoError::NotFound) => {
            debug!("Removing deleted place {place_id} from the index");
            ctx.index.remove_place_by_id(place_id)?;
        }
        Err(err) => return Err(err.into()),
    }
    ctx.index.flush_index()
}

fn cleanup_expired_tokens(ctx: &JobContext) -> Fallible<()> {
    let count = ctx
        .connections
        .exclusive()?
        .transaction(|conn| usecases::delete_expired_user_tokens(conn, Timestamp::now()))?;
    info!("Deleted {count} expired user token(s)");
    Ok(())
}

fn update_place_rankings(ctx: &JobContext) -> Fallible<()> {
    ctx.connections
        .exclusive()?
        .transaction(|conn| usecases::update_place_rankings(conn, Timestamp::now()))?;
    // The ranking score is part of the index
    for place in ctx.connections.shared()?.all_places()? {
        ctx.index.add_or_update_place(&place)?;
    }
    ctx.index.flush_index()
}

fn send_notification_digests(ctx: &JobContext) -> Fallible<()> {
    let digests = usecases::prepare_notification_digests(
        &ctx.connections.shared()?,
        Timestamp::now(),
    )?;
    let mut sent = 0;
    for digest in digests {
        let report = send_push(ctx, std::slice::from_ref(&digest.user_id), &digest.push_message());
        match report {
            Ok(_) => {
                ctx.connections
                    .exclusive()?
                    .transaction(|conn| usecases::mark_digest_sent(conn, &digest))?;
                sent += 1;
            }
            Err(err) => {
                // The notifications stay unread and will be
                // summarized again next time.
                warn!("Failed to send digest to user {}: {err}", digest.user_id);
            }
        }
    }
    info!("Sent {sent} notification digest(s)");
    Ok(())
}

fn calculate_place_statistics(ctx: &JobContext) -> Fallible<()> {
    let stats = usecases::calculate_place_statistics(&ctx.connections.shared()?)?;
    info!(
        "{} place(s) with {} review(s) in {} categories",
        stats.total_places,
        stats.total_reviews,
        stats.places_per_category.len()
    );
    for (id, name, rating) in &stats.top_rated {
        debug!("Top rated: {name} ({id}) with {rating:.2}");
    }
    Ok(())
}
