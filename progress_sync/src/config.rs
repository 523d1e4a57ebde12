use std::time::Duration;

pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SESSION_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_INGRESS_CAPACITY: usize = 100;
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Time allowed between accept and a valid `auth` frame.
    pub auth_timeout: Duration,
    /// Upper bound for a single frame write before the session is evicted.
    pub write_timeout: Duration,
    /// Outbound frames buffered per session before it counts as a slow consumer.
    pub session_queue_capacity: usize,
    /// Events buffered ahead of the fan-out task before publications are dropped.
    pub ingress_capacity: usize,
    /// Longest accepted line, in bytes.
    pub max_line_length: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            session_queue_capacity: DEFAULT_SESSION_QUEUE_CAPACITY,
            ingress_capacity: DEFAULT_INGRESS_CAPACITY,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}
