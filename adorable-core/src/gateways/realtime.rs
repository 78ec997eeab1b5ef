use adorable_entities::notification::Payload;

/// A hierarchical realtime store that clients subscribe to.
pub trait RealtimeGateway {
    fn set(&self, path: &str, value: &Payload) -> anyhow::Result<()>;
}
