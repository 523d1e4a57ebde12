use crate::Error;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use wire::notification::Notification;

#[derive(Debug, Deserialize)]
pub(crate) struct CreateParams {
    pub(crate) manga_id: String,
    pub(crate) manga_title: String,
    pub(crate) chapter_number: u32,
    pub(crate) chapter_title: Option<String>,
    pub(crate) release_date: Option<DateTime<Utc>>,
    pub(crate) message: Option<String>,
}

impl CreateParams {
    /// Builds the release event, filling the release date with `now` and the
    /// message with a default announcement when either is absent.
    pub(crate) fn into_notification(self, now: DateTime<Utc>) -> Result<Notification, Error> {
        if self.manga_id.trim().is_empty() {
            return Err(Error::invalid("manga_id is required"));
        }
        if self.manga_title.trim().is_empty() {
            return Err(Error::invalid("manga_title is required"));
        }

        let message = self
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| {
                format!("{} chapter {} is out", self.manga_title, self.chapter_number)
            });

        Ok(Notification {
            manga_id: self.manga_id,
            manga_title: self.manga_title,
            chapter_number: self.chapter_number,
            chapter_title: self.chapter_title,
            release_date: self.release_date.unwrap_or(now),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn params() -> CreateParams {
        CreateParams {
            manga_id: "one-piece".to_string(),
            manga_title: "One Piece".to_string(),
            chapter_number: 1100,
            chapter_title: None,
            release_date: None,
            message: None,
        }
    }

    #[test]
    fn test_defaults_fill_release_date_and_message() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let notification = params().into_notification(now).unwrap();

        assert_eq!(notification.release_date, now);
        assert_eq!(notification.message, "One Piece chapter 1100 is out");
    }

    #[test]
    fn test_explicit_values_are_kept() {
        let now = Utc::now();
        let release = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let notification = CreateParams {
            release_date: Some(release),
            message: Some("Out now!".to_string()),
            chapter_title: Some("Joy Boy".to_string()),
            ..params()
        }
        .into_notification(now)
        .unwrap();

        assert_eq!(notification.release_date, release);
        assert_eq!(notification.message, "Out now!");
        assert_eq!(notification.chapter_title.as_deref(), Some("Joy Boy"));
    }

    #[test]
    fn test_blank_manga_id_is_rejected() {
        let result = CreateParams {
            manga_id: "  ".to_string(),
            ..params()
        }
        .into_notification(Utc::now());

        assert!(result.is_err());
    }
}
