pub const DEFAULT_ROOM: &str = "general";
pub const DEFAULT_MEMBER_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_INGRESS_CAPACITY: usize = 256;
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Room for members that connect without one.
    pub default_room: String,
    /// Frames buffered per member before it is evicted as a slow consumer.
    pub member_queue_capacity: usize,
    /// Commands buffered ahead of the hub task.
    pub ingress_capacity: usize,
    pub max_message_size: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_room: DEFAULT_ROOM.to_string(),
            member_queue_capacity: DEFAULT_MEMBER_QUEUE_CAPACITY,
            ingress_capacity: DEFAULT_INGRESS_CAPACITY,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}
