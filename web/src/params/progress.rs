use crate::Error;
use chrono::{DateTime, Utc};
use progress_sync::Identity;
use serde::Deserialize;
use wire::progress::{ProgressEvent, ReadingStatus};

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateParams {
    pub(crate) manga_id: String,
    #[serde(default)]
    pub(crate) manga_title: String,
    pub(crate) current_chapter: u32,
    #[serde(default)]
    pub(crate) status: ReadingStatus,
}

impl UpdateParams {
    /// Stamps the update with the caller's identity and the server time.
    pub(crate) fn into_event(
        self,
        user: Identity,
        now: DateTime<Utc>,
    ) -> Result<ProgressEvent, Error> {
        if self.manga_id.trim().is_empty() {
            return Err(Error::invalid("manga_id is required"));
        }

        Ok(ProgressEvent {
            user_id: user.user_id,
            username: user.username,
            manga_id: self.manga_id,
            manga_title: self.manga_title,
            current_chapter: self.current_chapter,
            status: self.status,
            timestamp: now,
        })
    }
}
