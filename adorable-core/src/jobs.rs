//! Background jobs and their retry policies.

use crate::{entities::*, gateways::push::PushMessage};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Creates a thumbnail of an uploaded image.
    /// If `avatar_of` is set the thumbnail becomes the avatar of that user.
    ProcessImage {
        file_id: Id,
        avatar_of: Option<Id>,
    },
    GeocodePlace {
        place_id: Id,
    },
    SendPush {
        user_ids: Vec<Id>,
        message: PushMessage,
    },
    UpdateSearchIndex {
        place_id: Id,
    },
    CleanupExpiredTokens,
    UpdatePlaceRankings,
    SendNotificationDigests,
    CalculatePlaceStatistics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Fixed delay between two attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, backoff_secs: u64) -> Self {
        Self {
            max_retries,
            backoff: Duration::from_secs(backoff_secs),
        }
    }

    /// Delay before the next attempt after `attempts` failed ones,
    /// or `None` if the job has to be given up.
    pub fn next_attempt(&self, attempts: u32) -> Option<Duration> {
        (attempts <= self.max_retries).then_some(self.backoff)
    }
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProcessImage { .. } => "process_image",
            Self::GeocodePlace { .. } => "geocode_place",
            Self::SendPush { .. } => "send_push_notification",
            Self::UpdateSearchIndex { .. } => "update_search_index",
            Self::CleanupExpiredTokens => "cleanup_expired_tokens",
            Self::UpdatePlaceRankings => "update_place_rankings",
            Self::SendNotificationDigests => "send_notification_digests",
            Self::CalculatePlaceStatistics => "calculate_place_statistics",
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::ProcessImage { .. } => RetryPolicy::new(3, 60),
            Self::GeocodePlace { .. } => RetryPolicy::new(3, 300),
            Self::SendPush { .. } => RetryPolicy::new(5, 60),
            Self::UpdateSearchIndex { .. } => RetryPolicy::new(3, 300),
            Self::CleanupExpiredTokens
            | Self::UpdatePlaceRankings
            | Self::SendNotificationDigests
            | Self::CalculatePlaceStatistics => RetryPolicy::new(3, 60),
        }
    }

    /// Short human readable description of the arguments.
    pub fn payload(&self) -> String {
        match self {
            Self::ProcessImage { file_id, avatar_of } => match avatar_of {
                Some(user_id) => format!("file={file_id} avatar_of={user_id}"),
                None => format!("file={file_id}"),
            },
            Self::GeocodePlace { place_id } | Self::UpdateSearchIndex { place_id } => {
                format!("place={place_id}")
            }
            Self::SendPush { user_ids, message } => {
                format!("users={} title={}", user_ids.len(), message.title)
            }
            Self::CleanupExpiredTokens
            | Self::UpdatePlaceRankings
            | Self::SendNotificationDigests
            | Self::CalculatePlaceStatistics => String::new(),
        }
    }

    /// The jobs that can be triggered by name, i.e. without arguments.
    pub fn scheduled_by_name(name: &str) -> Option<Self> {
        match name {
            "cleanup_expired_tokens" => Some(Self::CleanupExpiredTokens),
            "update_place_rankings" => Some(Self::UpdatePlaceRankings),
            "send_notification_digests" => Some(Self::SendNotificationDigests),
            "calculate_place_statistics" => Some(Self::CalculatePlaceStatistics),
            _ => None,
        }
    }

    pub fn outcome(&self, attempts: u32, last_error: Option<String>) -> JobResult {
        JobResult {
            id: Id::new(),
            job_name: self.name().to_owned(),
            payload: self.payload(),
            attempts,
            status: if last_error.is_some() {
                JobStatus::Failed
            } else {
                JobStatus::Succeeded
            },
            last_error,
            finished_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_policies() {
        let push = Job::SendPush {
            user_ids: vec![],
            message: PushMessage {
                title: "t".into(),
                body: "b".into(),
                data: Default::default(),
            },
        };
        assert_eq!(RetryPolicy::new(5, 60), push.retry_policy());
        let geocode = Job::GeocodePlace {
            place_id: "p".into(),
        };
        assert_eq!(Duration::from_secs(300), geocode.retry_policy().backoff);
    }

    #[test]
    fn give_up_after_max_retries() {
        let policy = RetryPolicy::new(3, 60);
        assert_eq!(Some(Duration::from_secs(60)), policy.next_attempt(1));
        assert_eq!(Some(Duration::from_secs(60)), policy.next_attempt(3));
        // initial attempt + 3 retries
        assert_eq!(None, policy.next_attempt(4));
        assert_eq!(None, RetryPolicy::new(0, 1).next_attempt(1));
    }

    #[test]
    fn scheduled_jobs_by_name() {
        assert_eq!(
            Some(Job::UpdatePlaceRankings),
            Job::scheduled_by_name("update_place_rankings")
        );
        assert_eq!(None, Job::scheduled_by_name("geocode_place"));
        for job in [
            Job::CleanupExpiredTokens,
            Job::UpdatePlaceRankings,
            Job::SendNotificationDigests,
            Job::CalculatePlaceStatistics,
        ] {
            assert_eq!(Some(job.clone()), Job::scheduled_by_name(job.name()));
        }
    }

    #[test]
    fn failed_outcome() {
        let job = Job::UpdateSearchIndex {
            place_id: "p1".into(),
        };
        let res = job.outcome(4, Some("index unavailable".into()));
        assert_eq!(JobStatus::Failed, res.status);
        assert_eq!("update_search_index", res.job_name);
        assert_eq!("place=p1", res.payload);
        assert_eq!(JobStatus::Succeeded, job.outcome(1, None).status);
    }
}
