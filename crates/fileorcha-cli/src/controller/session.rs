use fileorcha_core::UploadResult;

use super::countdown::{Countdown, CountdownHandle};

/// State of the most recent successful upload.
///
/// Reset points: a new upload replaces it, `clear` drops it (upload another,
/// escape back to the upload form). At most one countdown is alive at a time.
#[derive(Default)]
pub struct SessionState {
    current: Option<UploadResult>,
    share_url: Option<String>,
    countdown: Option<CountdownHandle>,
}

impl SessionState {
    pub fn set_upload(&mut self, result: UploadResult, share_url: String) {
        self.current = Some(result);
        self.share_url = Some(share_url);
    }

    /// Cancel any running countdown before starting the new one.
    pub fn start_countdown(&mut self, countdown: Countdown) {
        self.cancel_countdown();
        self.countdown = Some(CountdownHandle::start(countdown));
    }

    pub fn cancel_countdown(&mut self) {
        if self.countdown.take().is_some() {
            tracing::debug!("Countdown cancelled");
        }
    }

    pub fn clear(&mut self) {
        self.cancel_countdown();
        self.current = None;
        self.share_url = None;
    }

    pub fn current(&self) -> Option<&UploadResult> {
        self.current.as_ref()
    }

    pub fn share_url(&self) -> Option<&str> {
        self.share_url.as_deref()
    }

    pub fn countdown(&self) -> Option<&CountdownHandle> {
        self.countdown.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Utc;
    use fileorcha_core::{FileId, FileSource, UploadRequest};

    fn result() -> UploadResult {
        let request = UploadRequest::new(
            FileSource::new("a.txt", "text/plain", Bytes::from_static(b"a")),
            1,
        )
        .with_expiry(5);
        UploadResult::from_request(FileId::parse("abc").unwrap(), &request, Utc::now())
    }

    #[tokio::test]
    async fn new_countdown_replaces_the_old_one() {
        let mut session = SessionState::default();
        let first = Countdown::new(Utc::now() + chrono::Duration::minutes(5));
        let second = Countdown::new(Utc::now() + chrono::Duration::minutes(10));

        session.start_countdown(first);
        session.start_countdown(second);
        assert_eq!(session.countdown().unwrap().countdown(), second);
    }

    #[tokio::test]
    async fn clear_resets_everything() {
        let mut session = SessionState::default();
        session.set_upload(result(), "http://h/download.html?id=abc".to_string());
        session.start_countdown(Countdown::new(Utc::now() + chrono::Duration::minutes(5)));

        session.clear();
        assert!(session.current().is_none());
        assert!(session.share_url().is_none());
        assert!(session.countdown().is_none());
    }
}
