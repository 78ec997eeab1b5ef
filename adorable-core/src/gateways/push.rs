use adorable_entities::notification::Payload;

/// Max. number of device tokens per multicast request.
pub const MAX_PUSH_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub data: Payload,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushReport {
    pub success_count: usize,
    pub failure_count: usize,
}

impl std::ops::AddAssign for PushReport {
    fn add_assign(&mut self, rhs: Self) {
        self.success_count += rhs.success_count;
        self.failure_count += rhs.failure_count;
    }
}

pub trait PushGateway {
    /// At most [`MAX_PUSH_BATCH_SIZE`] tokens per call.
    fn send_multicast(&self, tokens: &[String], message: &PushMessage) -> anyhow::Result<PushReport>;
}
