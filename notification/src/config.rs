use std::time::Duration;

pub const DEFAULT_INGRESS_CAPACITY: usize = 100;
pub const DEFAULT_STALE_THRESHOLD: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_BUFFER_SIZE: usize = 2048;

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub ingress_capacity: usize,
    /// A registrant silent for longer than this is removed by the reaper.
    pub stale_threshold: Duration,
    pub reap_interval: Duration,
    /// Receive buffer; longer datagrams are truncated and fail to decode.
    pub buffer_size: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            ingress_capacity: DEFAULT_INGRESS_CAPACITY,
            stale_threshold: DEFAULT_STALE_THRESHOLD,
            reap_interval: DEFAULT_REAP_INTERVAL,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}
