//! UI controller.
//!
//! Owns every piece of front-end state and sequences each user action as
//! validation, then transfer, then session update, then preview and
//! notification. Network calls are split into `begin_*` and `finish_*` so the
//! shell can run the transfer on its own task while the controller stays
//! responsive. The `submit_*` helpers run both halves inline.

pub mod countdown;
pub mod forms;
pub mod notify;
pub mod request;
pub mod section;
pub mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use fileorcha_api_client::{ProgressCallback, ShareLink, Transfer};
use fileorcha_core::format::{format_expiry_minutes, format_file_size};
use fileorcha_core::validation::sanitize_filename;
use fileorcha_core::{
    ClientConfig, ClientError, DownloadQuery, DownloadedFile, ErrorMetadata, FileId, FileSource,
    LogLevel, Preview, PreviewMetadata, PreviewRenderer, TransferError, UploadRequest,
    UploadResult, ValidationRules,
};
use tokio::io::AsyncWriteExt;

use crate::media::{MediaHandle, MediaRegistry};
use crate::preferences::{PreferenceStore, Preferences, Theme};
use crate::qr;

use countdown::{Countdown, CountdownDisplay};
use forms::{DownloadForm, UploadForm};
use notify::{NotificationKind, Notifications};
use request::{RequestKind, RequestToken, RequestTracker};
use section::{Accelerator, Controls, Section};
use session::SessionState;

/// Deployment choices the controller needs, taken from [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub rules: ValidationRules,
    pub public_origin: String,
    pub share_password_in_link: bool,
    pub echo_password: bool,
    pub notification_ttl: Duration,
    pub text_preview_chars: usize,
    pub download_dir: PathBuf,
    pub preferences_path: PathBuf,
}

impl ControllerSettings {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            rules: config.validation_rules(),
            public_origin: config.public_origin.clone(),
            share_password_in_link: config.share_password_in_link,
            echo_password: config.echo_password,
            notification_ttl: Duration::from_secs(config.notification_ttl_secs),
            text_preview_chars: config.text_preview_chars,
            download_dir: config.download_dir.clone(),
            preferences_path: config.preferences_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewSource {
    /// A file picked for upload, previewed from local bytes.
    Local,
    Remote(FileId),
}

/// The open preview surface.
#[derive(Debug)]
pub struct OpenPreview {
    pub preview: Preview,
    pub metadata: PreviewMetadata,
    pub media: Option<MediaHandle>,
    pub source: PreviewSource,
}

/// Outcome of a `finish_*` call whose request succeeded.
#[derive(Debug, PartialEq, Eq)]
pub enum Completion<T> {
    Applied(T),
    /// A newer request of the same kind superseded this one.
    Stale,
}

#[derive(Debug)]
pub struct PendingUpload {
    pub token: RequestToken,
    pub request: UploadRequest,
}

#[derive(Debug)]
pub struct PendingRetrieval {
    pub token: RequestToken,
    pub query: DownloadQuery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Everything the success section displays.
#[derive(Debug, Clone)]
pub struct SuccessView {
    pub file_name: String,
    pub size: String,
    pub downloads_left: u32,
    pub expiry: Option<String>,
    pub countdown: Option<CountdownDisplay>,
    pub share_url: String,
    pub file_id: String,
    pub uploaded_at: DateTime<Utc>,
}

pub struct Controller<T: Transfer + ?Sized> {
    transport: Arc<T>,
    settings: ControllerSettings,
    renderer: PreviewRenderer,
    section: Section,
    controls: Controls,
    upload_form: UploadForm,
    download_form: DownloadForm,
    session: SessionState,
    preview: Option<OpenPreview>,
    media: MediaRegistry,
    requests: RequestTracker,
    notifications: Notifications,
    preferences: Preferences,
    preference_store: PreferenceStore,
}

impl<T: Transfer + ?Sized> Controller<T> {
    pub fn new(transport: Arc<T>, settings: ControllerSettings) -> Self {
        Self::with_media(transport, settings, MediaRegistry::new())
    }

    pub fn with_media(transport: Arc<T>, settings: ControllerSettings, media: MediaRegistry) -> Self {
        let preference_store = PreferenceStore::new(&settings.preferences_path);
        let preferences = preference_store.load();
        Self {
            transport,
            renderer: PreviewRenderer::new(settings.text_preview_chars),
            notifications: Notifications::new(settings.notification_ttl),
            settings,
            section: Section::Upload,
            controls: Controls::default(),
            upload_form: UploadForm::default(),
            download_form: DownloadForm::default(),
            session: SessionState::default(),
            preview: None,
            media,
            requests: RequestTracker::default(),
            preferences,
            preference_store,
        }
    }

    pub fn transport(&self) -> Arc<T> {
        Arc::clone(&self.transport)
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn upload_form(&self) -> &UploadForm {
        &self.upload_form
    }

    pub fn upload_form_mut(&mut self) -> &mut UploadForm {
        &mut self.upload_form
    }

    pub fn download_form(&self) -> &DownloadForm {
        &self.download_form
    }

    pub fn download_form_mut(&mut self) -> &mut DownloadForm {
        &mut self.download_form
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn preview(&self) -> Option<&OpenPreview> {
        self.preview.as_ref()
    }

    pub fn media(&self) -> &MediaRegistry {
        &self.media
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    pub fn theme(&self) -> Theme {
        self.preferences.theme
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    // ---- upload -------------------------------------------------------------

    /// Pick the file to upload and preview it locally.
    pub fn select_file(&mut self, file: FileSource) {
        let metadata = PreviewMetadata {
            name: file.name.clone(),
            content_type: file.content_type.clone(),
            size: file.size(),
            downloads_left: None,
            content_included: true,
            has_password: None,
        };
        let bytes = file.bytes.clone();
        self.upload_form.file = Some(file);

        self.close_preview();
        self.open_preview(bytes, metadata, PreviewSource::Local);
    }

    /// Validate the upload form and issue a request token. Validation failures
    /// are reported and nothing is sent.
    pub fn begin_upload(&mut self) -> Result<PendingUpload, ClientError> {
        let request = match self.upload_form.to_request(&self.settings.rules) {
            Ok(request) => request,
            Err(e) => return Err(self.report(e.into(), None)),
        };

        let token = self.requests.begin(RequestKind::Upload);
        self.controls.upload_enabled = false;
        tracing::debug!(
            seq = token.seq,
            file_name = %request.file.name,
            size = request.file.size(),
            "Upload started"
        );
        Ok(PendingUpload { token, request })
    }

    pub fn finish_upload(
        &mut self,
        token: RequestToken,
        outcome: Result<UploadResult, TransferError>,
    ) -> Result<Completion<UploadResult>, ClientError> {
        if !self.requests.complete(token) {
            tracing::debug!(seq = token.seq, "Discarding stale upload result");
            return Ok(Completion::Stale);
        }
        self.controls.upload_enabled = true;

        let result = match outcome {
            Ok(result) => result,
            Err(e) => return Err(self.report(e.into(), Some("Upload failed"))),
        };

        let password = self
            .settings
            .share_password_in_link
            .then(|| result.password.clone())
            .flatten();
        let share_url = match ShareLink::new(result.id.clone(), password)
            .to_url(&self.settings.public_origin)
        {
            Ok(url) => url,
            Err(e) => return Err(self.report(ClientError::Internal(e.to_string()), None)),
        };

        self.enter_success(result.clone(), share_url);
        self.notifications
            .push(NotificationKind::Success, "File uploaded successfully!");
        Ok(Completion::Applied(result))
    }

    pub async fn submit_upload(
        &mut self,
        progress: Option<ProgressCallback>,
    ) -> Result<Completion<UploadResult>, ClientError> {
        let pending = self.begin_upload()?;
        let outcome = self.transport.upload(&pending.request, progress).await;
        self.finish_upload(pending.token, outcome)
    }

    fn enter_success(&mut self, result: UploadResult, share_url: String) {
        let expires_at = result.expires_at();
        self.session.set_upload(result, share_url);
        match expires_at {
            Some(target) => self.session.start_countdown(Countdown::new(target)),
            None => self.session.cancel_countdown(),
        }
        self.upload_form = UploadForm::default();
        self.section = Section::Success;
    }

    // ---- download -----------------------------------------------------------

    pub fn begin_download(&mut self) -> Result<PendingRetrieval, ClientError> {
        let query = match self.download_form.to_query() {
            Ok(query) => query,
            Err(e) => return Err(self.report(e.into(), None)),
        };
        let token = self.requests.begin(RequestKind::Download);
        self.controls.download_enabled = false;
        Ok(PendingRetrieval { token, query })
    }

    /// Save a downloaded file into the download directory. The section does
    /// not change either way.
    pub async fn finish_download(
        &mut self,
        token: RequestToken,
        outcome: Result<DownloadedFile, TransferError>,
    ) -> Result<Completion<SavedFile>, ClientError> {
        if !self.requests.complete(token) {
            tracing::debug!(seq = token.seq, "Discarding stale download result");
            return Ok(Completion::Stale);
        }
        self.controls.download_enabled = true;

        let file = match outcome {
            Ok(file) => file,
            Err(e) => return Err(self.report(e.into(), Some("Download failed"))),
        };

        match save_to_dir(&self.settings.download_dir, &file).await {
            Ok(saved) => {
                tracing::info!(path = %saved.path.display(), size = saved.size, "File saved");
                self.notifications
                    .push(NotificationKind::Success, "File downloaded successfully!");
                Ok(Completion::Applied(saved))
            }
            Err(e) => Err(self.report(e.into(), Some("Download failed"))),
        }
    }

    pub async fn submit_download(&mut self) -> Result<Completion<SavedFile>, ClientError> {
        let pending = self.begin_download()?;
        let outcome = self.transport.download(&pending.query).await;
        self.finish_download(pending.token, outcome).await
    }

    // ---- preview ------------------------------------------------------------

    /// Preview the uploaded file from the success section, otherwise the file
    /// named in the download form.
    pub fn begin_preview(&mut self) -> Result<PendingRetrieval, ClientError> {
        let from_session = match (self.section, self.session.current()) {
            (Section::Success, Some(current)) => Some(DownloadQuery::new(
                current.id.clone(),
                current.password.clone(),
            )),
            _ => None,
        };
        let query = match from_session.map(Ok).unwrap_or_else(|| self.download_form.to_query()) {
            Ok(query) => query,
            Err(e) => return Err(self.report(e.into(), None)),
        };
        let token = self.requests.begin(RequestKind::Preview);
        self.controls.preview_enabled = false;
        Ok(PendingRetrieval { token, query })
    }

    pub fn finish_preview(
        &mut self,
        token: RequestToken,
        id: FileId,
        outcome: Result<(Bytes, PreviewMetadata), TransferError>,
    ) -> Result<Completion<()>, ClientError> {
        if !self.requests.complete(token) {
            tracing::debug!(seq = token.seq, "Discarding stale preview result");
            return Ok(Completion::Stale);
        }
        self.controls.preview_enabled = true;

        let (bytes, metadata) = match outcome {
            Ok(found) => found,
            Err(e) => return Err(self.report(e.into(), Some("Preview failed"))),
        };

        self.release_preview();
        self.open_preview(bytes, metadata, PreviewSource::Remote(id));
        Ok(Completion::Applied(()))
    }

    pub async fn submit_preview(&mut self) -> Result<Completion<()>, ClientError> {
        let pending = self.begin_preview()?;
        let outcome = self.transport.fetch_preview(&pending.query).await;
        self.finish_preview(pending.token, pending.query.id, outcome)
    }

    fn open_preview(&mut self, bytes: Bytes, metadata: PreviewMetadata, source: PreviewSource) {
        let mut preview = if metadata.content_included {
            self.renderer
                .render(bytes, &metadata.content_type, &metadata.name)
        } else {
            Preview::Unsupported {
                file_name: metadata.name.clone(),
            }
        };

        let mut media = None;
        if let Some(payload) = preview.media() {
            match self.media.materialize(payload) {
                Ok(handle) => media = Some(handle),
                Err(e) => {
                    self.report(ClientError::PreviewRender(e.to_string()), None);
                    preview = Preview::Unsupported {
                        file_name: metadata.name.clone(),
                    };
                }
            }
        }

        tracing::debug!(kind = ?preview.kind(), name = %metadata.name, "Preview opened");
        self.preview = Some(OpenPreview {
            preview,
            metadata,
            media,
            source,
        });
    }

    /// Close the preview surface. A preview still in flight is discarded when
    /// it arrives; the media handle of the open preview is revoked.
    pub fn close_preview(&mut self) {
        self.requests.invalidate(RequestKind::Preview);
        self.controls.preview_enabled = true;
        self.release_preview();
    }

    fn release_preview(&mut self) {
        if let Some(open) = self.preview.take() {
            if let Some(handle) = &open.media {
                self.media.revoke(handle);
            }
        }
    }

    // ---- navigation ---------------------------------------------------------

    /// Switch to the upload form, resetting it and the session.
    pub fn show_upload(&mut self) {
        self.session.clear();
        self.upload_form = UploadForm::default();
        self.close_preview();
        self.section = Section::Upload;
    }

    pub fn show_download(&mut self) {
        self.download_form = DownloadForm::default();
        self.section = Section::Download;
    }

    pub fn upload_another(&mut self) {
        self.show_upload();
    }

    /// Pre-fill the download form from the last upload and switch to it.
    pub fn test_download(&mut self) -> bool {
        let Some(current) = self.session.current() else {
            self.notifications
                .push(NotificationKind::Warning, "No file uploaded yet");
            return false;
        };
        let password = self
            .settings
            .echo_password
            .then(|| current.password.clone())
            .flatten();
        let form = DownloadForm::new(current.id.as_str(), password);

        self.show_download();
        self.download_form = form;
        self.notifications.push(
            NotificationKind::Success,
            "Download form pre-filled with your file details",
        );
        true
    }

    /// Close an open preview first; otherwise leave the success or download
    /// section for the upload form.
    pub fn escape(&mut self) {
        if self.preview.is_some() {
            self.close_preview();
        } else if self.section != Section::Upload {
            self.show_upload();
        }
    }

    pub fn accelerator(&mut self, accelerator: Accelerator) {
        match accelerator {
            Accelerator::UploadMode => self.show_upload(),
            Accelerator::DownloadMode => self.show_download(),
            Accelerator::Escape => self.escape(),
        }
    }

    /// Handle a share link: pre-fill the download form and switch to it.
    pub fn open_share_link(&mut self, link: &str) -> Result<(), ClientError> {
        let link = match ShareLink::parse(link) {
            Ok(link) => link,
            Err(e) => return Err(self.report(ClientError::Internal(e.to_string()), None)),
        };
        self.show_download();
        self.download_form = DownloadForm::new(link.id.as_str(), link.password);
        self.notifications.push(
            NotificationKind::Success,
            "Download link detected. Form pre-filled.",
        );
        Ok(())
    }

    // ---- success extras -----------------------------------------------------

    pub fn copy_link(&self) -> Option<String> {
        self.session.share_url().map(str::to_string)
    }

    pub fn copy_id(&self) -> Option<String> {
        self.session.current().map(|c| c.id.to_string())
    }

    pub fn success_view(&self) -> Option<SuccessView> {
        let current = self.session.current()?;
        Some(SuccessView {
            file_name: current.file_name.clone(),
            size: format_file_size(current.size),
            downloads_left: current.downloads,
            expiry: current.expiry_minutes.map(format_expiry_minutes),
            countdown: self.session.countdown().map(|c| c.current()),
            share_url: self.session.share_url().unwrap_or_default().to_string(),
            file_id: current.id.to_string(),
            uploaded_at: current.uploaded_at,
        })
    }

    /// QR code of the share link, drawn for the current theme.
    pub fn qr_terminal(&self) -> Option<String> {
        let url = self.session.share_url()?;
        match qr::render_terminal(url, !self.preferences.theme.is_dark()) {
            Ok(rendered) => Some(rendered),
            Err(e) => {
                tracing::warn!(error = %e, "QR rendering failed");
                None
            }
        }
    }

    /// Write the share link's QR code as `qr-code-{id}.svg` into `dir`.
    pub fn save_qr(&mut self, dir: &Path) -> Result<PathBuf, ClientError> {
        let (Some(url), Some(current)) = (self.session.share_url(), self.session.current()) else {
            return Err(self.report(
                ClientError::Internal("No file uploaded yet".to_string()),
                None,
            ));
        };
        match qr::save_svg(dir, current.id.as_str(), url) {
            Ok(path) => {
                self.notifications.push(
                    NotificationKind::Success,
                    format!("QR code saved to {}", path.display()),
                );
                Ok(path)
            }
            Err(e) => Err(self.report(ClientError::Internal(format!("{:#}", e)), None)),
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.preferences.theme = self.preferences.theme.toggled();
        if let Err(e) = self.preference_store.save(&self.preferences) {
            tracing::warn!(error = %e, "Failed to persist theme");
            self.notifications
                .push(NotificationKind::Warning, "Theme change could not be saved");
        }
        let message = if self.preferences.theme.is_dark() {
            "Dark mode enabled"
        } else {
            "Light mode enabled"
        };
        self.notifications.push(NotificationKind::Success, message);
        self.preferences.theme
    }

    /// Log an error at its level and surface it as a notification.
    fn report(&mut self, error: ClientError, prefix: Option<&str>) -> ClientError {
        let code = error.error_code();
        match error.log_level() {
            LogLevel::Debug => tracing::debug!(code, error = %error, "Action rejected"),
            LogLevel::Warn => tracing::warn!(code, error = %error, "Action failed"),
            LogLevel::Error => tracing::error!(code, error = %error, "Action failed"),
        }

        let message = match prefix {
            Some(prefix) => format!("{}: {}", prefix, error.user_message()),
            None => error.user_message(),
        };
        let kind = if matches!(error, ClientError::PreviewRender(_)) {
            NotificationKind::Warning
        } else {
            NotificationKind::Error
        };
        self.notifications.push(kind, message);
        error
    }
}

/// Write `file` under `dir` with a sanitized name, adding ` (n)` before the
/// extension when the name is taken.
async fn save_to_dir(dir: &Path, file: &DownloadedFile) -> std::io::Result<SavedFile> {
    tokio::fs::create_dir_all(dir).await?;

    let name = sanitize_filename(&file.filename);
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{}", ext)),
        _ => (name.clone(), String::new()),
    };

    let mut attempt = 0u32;
    loop {
        let candidate = if attempt == 0 {
            dir.join(&name)
        } else {
            dir.join(format!("{} ({}){}", stem, attempt, ext))
        };
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(mut out) => {
                out.write_all(&file.bytes).await?;
                out.flush().await?;
                return Ok(SavedFile {
                    path: candidate,
                    size: file.bytes.len() as u64,
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempt < 1000 => {
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory transport with canned responses.
    #[derive(Default)]
    struct FakeTransfer {
        upload_id: Mutex<Option<String>>,
        download: Mutex<Option<Result<DownloadedFile, TransferError>>>,
        preview: Mutex<Option<Result<(Bytes, PreviewMetadata), TransferError>>>,
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl Transfer for FakeTransfer {
        async fn upload(
            &self,
            request: &UploadRequest,
            progress: Option<ProgressCallback>,
        ) -> Result<UploadResult, TransferError> {
            self.calls.lock().unwrap().push("upload");
            if let Some(progress) = progress {
                progress(0.5);
                progress(1.0);
            }
            let id = self
                .upload_id
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| TransferError::Server {
                    status: 500,
                    body: "disk full".to_string(),
                })?;
            Ok(UploadResult::from_request(
                FileId::parse(&id).unwrap(),
                request,
                Utc::now(),
            ))
        }

        async fn download(&self, _query: &DownloadQuery) -> Result<DownloadedFile, TransferError> {
            self.calls.lock().unwrap().push("download");
            self.download
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Err(TransferError::NotFound))
        }

        async fn fetch_preview(
            &self,
            _query: &DownloadQuery,
        ) -> Result<(Bytes, PreviewMetadata), TransferError> {
            self.calls.lock().unwrap().push("preview");
            self.preview
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Err(TransferError::NotFound))
        }
    }

    struct Fixture {
        controller: Controller<FakeTransfer>,
        transport: Arc<FakeTransfer>,
        dir: TempDir,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let settings = ControllerSettings {
            rules: ValidationRules::default(),
            public_origin: "http://localhost:8080".to_string(),
            share_password_in_link: false,
            echo_password: true,
            notification_ttl: Duration::from_secs(5),
            text_preview_chars: 500,
            download_dir: dir.path().join("downloads"),
            preferences_path: dir.path().join("config").join("preferences.json"),
        };
        let transport = Arc::new(FakeTransfer::default());
        let media = MediaRegistry::in_dir(dir.path());
        let controller = Controller::with_media(Arc::clone(&transport), settings, media);
        Fixture {
            controller,
            transport,
            dir,
        }
    }

    fn photo() -> FileSource {
        FileSource::new("photo.png", "image/png", Bytes::from(vec![7u8; 2 * 1024 * 1024]))
    }

    fn png_metadata() -> PreviewMetadata {
        PreviewMetadata {
            name: "photo.png".to_string(),
            content_type: "image/png".to_string(),
            size: 4,
            downloads_left: Some(3),
            content_included: true,
            has_password: None,
        }
    }

    fn last_message(controller: &Controller<FakeTransfer>) -> String {
        controller.notifications().latest().unwrap().message.clone()
    }

    #[tokio::test]
    async fn upload_scenario_enters_success_with_countdown() {
        let mut f = fixture();
        *f.transport.upload_id.lock().unwrap() = Some("a1b2c3".to_string());

        f.controller.select_file(photo());
        {
            let form = f.controller.upload_form_mut();
            form.downloads = 3;
            form.expiry_minutes = 60;
        }

        let progress: Arc<Mutex<Vec<f64>>> = Arc::default();
        let sink = Arc::clone(&progress);
        let callback: ProgressCallback = Arc::new(move |p| sink.lock().unwrap().push(p));

        let outcome = f.controller.submit_upload(Some(callback)).await.unwrap();
        assert!(matches!(outcome, Completion::Applied(_)));
        assert_eq!(*progress.lock().unwrap(), vec![0.5, 1.0]);

        assert_eq!(f.controller.section(), Section::Success);
        assert!(f.controller.controls().upload_enabled);

        let view = f.controller.success_view().unwrap();
        assert_eq!(view.file_name, "photo.png");
        assert_eq!(view.size, "2 MB");
        assert_eq!(view.downloads_left, 3);
        assert_eq!(view.expiry.as_deref(), Some("60 minutes"));
        assert_eq!(
            view.share_url,
            "http://localhost:8080/download.html?id=a1b2c3"
        );
        let countdown = view.countdown.unwrap().to_string();
        assert!(
            countdown == "60m 0s" || countdown == "59m 59s" || countdown == "59m 58s",
            "unexpected countdown {}",
            countdown
        );
        assert!(f.controller.session().countdown().unwrap().is_running());
        assert_eq!(last_message(&f.controller), "File uploaded successfully!");
        assert!(f.controller.qr_terminal().is_some());
    }

    #[tokio::test]
    async fn invalid_upload_never_reaches_the_network() {
        let mut f = fixture();
        f.controller.upload_form_mut().downloads = 0;
        f.controller.select_file(photo());

        let err = f.controller.submit_upload(None).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(f.transport.calls.lock().unwrap().is_empty());
        assert_eq!(f.controller.section(), Section::Upload);
        assert!(f.controller.controls().upload_enabled);
        assert_eq!(
            last_message(&f.controller),
            "Downloads must be between 1 and 10"
        );
    }

    #[tokio::test]
    async fn upload_failure_is_reported_and_control_reenabled() {
        let mut f = fixture();
        f.controller.select_file(photo());

        let err = f.controller.submit_upload(None).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Transfer(TransferError::Server { status: 500, .. })
        ));
        assert!(f.controller.controls().upload_enabled);
        assert_eq!(f.controller.section(), Section::Upload);
        assert!(last_message(&f.controller).starts_with("Upload failed: Server error: 500"));
    }

    #[tokio::test]
    async fn gone_file_reports_no_downloads_left() {
        let mut f = fixture();
        *f.transport.download.lock().unwrap() = Some(Err(TransferError::NoDownloadsLeft));

        f.controller.show_download();
        f.controller.download_form_mut().file_id = "abc123".to_string();

        let pending = f.controller.begin_download().unwrap();
        assert!(!f.controller.controls().download_enabled);
        let outcome = f.transport.download(&pending.query).await;
        let err = f
            .controller
            .finish_download(pending.token, outcome)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClientError::Transfer(TransferError::NoDownloadsLeft)
        ));
        assert_eq!(
            last_message(&f.controller),
            "Download failed: No downloads left"
        );
        assert!(f.controller.controls().download_enabled);
        assert_eq!(f.controller.section(), Section::Download);
    }

    #[tokio::test]
    async fn download_saves_under_unique_sanitized_name() {
        let mut f = fixture();
        *f.transport.download.lock().unwrap() = Some(Ok(DownloadedFile {
            bytes: Bytes::from_static(b"hello"),
            filename: "../notes.txt".to_string(),
        }));
        f.controller.show_download();
        f.controller.download_form_mut().file_id = "abc".to_string();

        let first = f.controller.submit_download().await.unwrap();
        let second = f.controller.submit_download().await.unwrap();

        let downloads = f.dir.path().join("downloads");
        assert_eq!(
            first,
            Completion::Applied(SavedFile {
                path: downloads.join("notes.txt"),
                size: 5
            })
        );
        assert_eq!(
            second,
            Completion::Applied(SavedFile {
                path: downloads.join("notes (1).txt"),
                size: 5
            })
        );
        assert_eq!(
            std::fs::read(downloads.join("notes (1).txt")).unwrap(),
            b"hello"
        );
        assert_eq!(last_message(&f.controller), "File downloaded successfully!");
    }

    #[tokio::test]
    async fn missing_file_id_is_a_validation_error() {
        let mut f = fixture();
        f.controller.show_download();
        assert!(f.controller.submit_download().await.is_err());
        assert_eq!(last_message(&f.controller), "Please enter a file ID");
        assert!(f.transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn closing_image_preview_revokes_media_handle() {
        let mut f = fixture();
        *f.transport.preview.lock().unwrap() =
            Some(Ok((Bytes::from_static(b"\x89PNG"), png_metadata())));
        f.controller.show_download();
        f.controller.download_form_mut().file_id = "abc".to_string();

        f.controller.submit_preview().await.unwrap();
        let path = {
            let open = f.controller.preview().unwrap();
            assert!(matches!(open.preview, Preview::Image(_)));
            assert_eq!(open.source, PreviewSource::Remote(FileId::parse("abc").unwrap()));
            open.media.as_ref().unwrap().path().to_path_buf()
        };
        assert!(path.exists());
        assert_eq!(f.controller.media().live_count(), 1);

        f.controller.close_preview();
        assert!(f.controller.preview().is_none());
        assert_eq!(f.controller.media().live_count(), 0);
        assert!(!path.exists());
        assert_eq!(f.controller.section(), Section::Download);
    }

    #[tokio::test]
    async fn repeated_previews_keep_one_live_handle() {
        let mut f = fixture();
        *f.transport.preview.lock().unwrap() =
            Some(Ok((Bytes::from_static(b"\x89PNG"), png_metadata())));
        f.controller.show_download();
        f.controller.download_form_mut().file_id = "abc".to_string();

        for _ in 0..3 {
            f.controller.submit_preview().await.unwrap();
        }
        assert_eq!(f.controller.media().live_count(), 1);
    }

    #[tokio::test]
    async fn preview_arriving_after_close_is_discarded() {
        let mut f = fixture();
        f.controller.show_download();
        f.controller.download_form_mut().file_id = "abc".to_string();

        let pending = f.controller.begin_preview().unwrap();
        f.controller.close_preview();

        let outcome = Ok((Bytes::from_static(b"\x89PNG"), png_metadata()));
        let completion = f
            .controller
            .finish_preview(pending.token, pending.query.id, outcome)
            .unwrap();
        assert_eq!(completion, Completion::Stale);
        assert!(f.controller.preview().is_none());
        assert_eq!(f.controller.media().live_count(), 0);
    }

    #[tokio::test]
    async fn superseded_download_result_is_ignored() {
        let mut f = fixture();
        f.controller.show_download();
        f.controller.download_form_mut().file_id = "abc".to_string();

        let first = f.controller.begin_download().unwrap();
        let second = f.controller.begin_download().unwrap();

        let stale = f
            .controller
            .finish_download(first.token, Err(TransferError::NotFound))
            .await
            .unwrap();
        assert_eq!(stale, Completion::Stale);
        assert!(f.controller.notifications().latest().is_none());
        assert!(!f.controller.controls().download_enabled);

        let err = f
            .controller
            .finish_download(second.token, Err(TransferError::WrongPassword))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transfer(TransferError::WrongPassword)));
        assert!(f.controller.controls().download_enabled);
    }

    #[tokio::test]
    async fn large_file_preview_shows_placeholder() {
        let mut f = fixture();
        let metadata = PreviewMetadata {
            name: "movie.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            size: 10 * 1024 * 1024,
            downloads_left: Some(2),
            content_included: false,
            has_password: Some(false),
        };
        *f.transport.preview.lock().unwrap() = Some(Ok((Bytes::new(), metadata)));
        f.controller.show_download();
        f.controller.download_form_mut().file_id = "abc".to_string();

        f.controller.submit_preview().await.unwrap();
        let open = f.controller.preview().unwrap();
        assert_eq!(
            open.preview,
            Preview::Unsupported {
                file_name: "movie.mp4".to_string()
            }
        );
        assert!(open.media.is_none());
    }

    #[tokio::test]
    async fn selecting_a_text_file_previews_locally() {
        let mut f = fixture();
        f.controller.select_file(FileSource::new(
            "notes.txt",
            "text/plain",
            Bytes::from_static(b"<b>hi</b>"),
        ));
        let open = f.controller.preview().unwrap();
        assert_eq!(open.source, PreviewSource::Local);
        assert!(matches!(open.preview, Preview::Text { truncated: false, .. }));
        assert!(f.transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_prefills_id_and_password() {
        let mut f = fixture();
        *f.transport.upload_id.lock().unwrap() = Some("xyz789".to_string());
        f.controller.select_file(photo());
        f.controller.upload_form_mut().password = "secret".to_string();
        f.controller.submit_upload(None).await.unwrap();

        assert_eq!(
            f.controller.copy_link().as_deref(),
            Some("http://localhost:8080/download.html?id=xyz789")
        );
        assert_eq!(f.controller.copy_id().as_deref(), Some("xyz789"));

        assert!(f.controller.test_download());
        assert_eq!(f.controller.section(), Section::Download);
        assert_eq!(f.controller.download_form().file_id, "xyz789");
        assert_eq!(f.controller.download_form().password, "secret");
        assert_eq!(
            last_message(&f.controller),
            "Download form pre-filled with your file details"
        );
        // Session survives until the user goes back to the upload form.
        assert!(f.controller.session().current().is_some());
    }

    #[tokio::test]
    async fn upload_another_clears_session_and_stops_countdown() {
        let mut f = fixture();
        *f.transport.upload_id.lock().unwrap() = Some("abc".to_string());
        f.controller.select_file(photo());
        f.controller.submit_upload(None).await.unwrap();
        assert!(f.controller.session().countdown().is_some());

        f.controller.upload_another();
        assert_eq!(f.controller.section(), Section::Upload);
        assert!(f.controller.session().current().is_none());
        assert!(f.controller.session().countdown().is_none());
        assert!(f.controller.success_view().is_none());
        assert_eq!(*f.controller.upload_form(), UploadForm::default());
    }

    #[tokio::test]
    async fn escape_closes_preview_then_returns_to_upload() {
        let mut f = fixture();
        f.controller.show_download();
        f.controller.select_file(FileSource::new(
            "a.json",
            "application/json",
            Bytes::from_static(b"{\"a\":1}"),
        ));
        assert!(f.controller.preview().is_some());

        f.controller.accelerator(Accelerator::Escape);
        assert!(f.controller.preview().is_none());
        assert_eq!(f.controller.section(), Section::Download);

        f.controller.accelerator(Accelerator::Escape);
        assert_eq!(f.controller.section(), Section::Upload);

        f.controller.accelerator(Accelerator::DownloadMode);
        assert_eq!(f.controller.section(), Section::Download);
        f.controller.accelerator(Accelerator::UploadMode);
        assert_eq!(f.controller.section(), Section::Upload);
    }

    #[tokio::test]
    async fn share_link_prefills_download_form() {
        let mut f = fixture();
        f.controller
            .open_share_link("http://localhost:8080/download.html?id=abc123&password=pw")
            .unwrap();
        assert_eq!(f.controller.section(), Section::Download);
        assert_eq!(f.controller.download_form().file_id, "abc123");
        assert_eq!(f.controller.download_form().password, "pw");
        assert_eq!(
            last_message(&f.controller),
            "Download link detected. Form pre-filled."
        );

        assert!(f.controller.open_share_link("http://h/download.html").is_err());
        assert_eq!(f.controller.section(), Section::Download);
    }

    #[tokio::test]
    async fn theme_toggle_persists() {
        let mut f = fixture();
        assert_eq!(f.controller.theme(), Theme::Light);
        assert_eq!(f.controller.toggle_theme(), Theme::Dark);
        assert_eq!(last_message(&f.controller), "Dark mode enabled");

        let reloaded = PreferenceStore::new(&f.controller.settings().preferences_path).load();
        assert_eq!(reloaded.theme, Theme::Dark);
    }

    #[tokio::test]
    async fn save_qr_writes_svg_named_after_id() {
        let mut f = fixture();
        assert!(f.controller.save_qr(f.dir.path()).is_err());

        *f.transport.upload_id.lock().unwrap() = Some("abc123".to_string());
        f.controller.select_file(photo());
        f.controller.submit_upload(None).await.unwrap();

        let path = f.controller.save_qr(f.dir.path()).unwrap();
        assert_eq!(path, f.dir.path().join("qr-code-abc123.svg"));
        assert!(path.exists());
    }
}
