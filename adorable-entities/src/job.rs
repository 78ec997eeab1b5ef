use strum::{AsRefStr, EnumString};

use crate::{id::Id, time::Timestamp};

/// The persisted outcome of a background job.
#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub id          : Id,
    pub job_name    : String,
    pub payload     : String,
    pub attempts    : u32,
    pub status      : JobStatus,
    pub last_error  : Option<String>,
    pub finished_at : Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Succeeded,
    Failed,
}
