//! Domain methods for the FileOrcha API client.
//!
//! Endpoints: `POST /upload`, `GET /file/{id}`, `GET /preview/{id}`,
//! `GET /meta/{id}` and `GET /health`.

use chrono::Utc;
use fileorcha_core::{
    DownloadQuery, DownloadedFile, FileId, FileMeta, PreviewMetadata, TransferError,
    UploadRequest, UploadResult,
};
use reqwest::multipart::{Form, Part};

use crate::progress::{progress_body, ProgressCallback, ProgressReporter};
use crate::response::{extract_file_id, filename_from_headers, preview_from_response};
use crate::{network_error, ApiClient};
use bytes::Bytes;

impl ApiClient {
    /// Upload a file as multipart form data.
    ///
    /// Fields: `file`, `downloads`, and when set `expiry`, `password`, `slug`.
    pub async fn upload_file(
        &self,
        request: &UploadRequest,
        progress: Option<ProgressCallback>,
    ) -> Result<UploadResult, TransferError> {
        let reporter = ProgressReporter::new(request.file.size(), progress);

        let body = progress_body(&request.file.bytes, reporter.clone());
        let part = Part::stream_with_length(body, request.file.size())
            .file_name(request.file.name.clone());
        let part = match part.mime_str(&request.file.content_type) {
            Ok(part) => part,
            Err(err) => {
                tracing::debug!(
                    content_type = %request.file.content_type,
                    error = %err,
                    "Unusable content type, sending file part without one"
                );
                Part::stream_with_length(
                    progress_body(&request.file.bytes, reporter.clone()),
                    request.file.size(),
                )
                .file_name(request.file.name.clone())
            }
        };

        let mut form = Form::new()
            .part("file", part)
            .text("downloads", request.downloads.to_string());
        if let Some(expiry) = request.expiry_minutes {
            form = form.text("expiry", expiry.to_string());
        }
        if let Some(password) = &request.password {
            form = form.text("password", password.clone());
        }
        if let Some(slug) = &request.slug {
            form = form.text("slug", slug.clone());
        }

        tracing::info!(
            file_name = %request.file.name,
            size = request.file.size(),
            downloads = request.downloads,
            expiry_minutes = ?request.expiry_minutes,
            has_password = request.password.is_some(),
            slug = ?request.slug,
            "Uploading file"
        );

        let response = self
            .client()
            .post(self.build_url("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;

        if !status.is_success() {
            return Err(TransferError::Server {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let id = extract_file_id(&body)
            .ok_or_else(|| TransferError::MissingIdentifier(body.trim().to_string()))?;
        reporter.finish();

        tracing::info!(file_id = %id, "Upload complete");
        Ok(UploadResult::from_request(id, request, Utc::now()))
    }

    /// Download a file. The filename comes from `Content-Disposition`.
    pub async fn download_file(
        &self,
        query: &DownloadQuery,
    ) -> Result<DownloadedFile, TransferError> {
        let (headers, bytes) = self.retrieve("file", query).await?;
        let filename = filename_from_headers(&headers);
        tracing::info!(file_id = %query.id, filename = %filename, size = bytes.len(), "Downloaded file");
        Ok(DownloadedFile { bytes, filename })
    }

    /// Fetch a file for previewing.
    pub async fn preview_file(
        &self,
        query: &DownloadQuery,
    ) -> Result<(Bytes, PreviewMetadata), TransferError> {
        let (headers, bytes) = self.retrieve("preview", query).await?;
        preview_from_response(&query.id, &headers, bytes)
    }

    /// Share-card metadata for a file.
    pub async fn fetch_meta(&self, id: &FileId) -> Result<FileMeta, TransferError> {
        self.get_json(&format!("/meta/{}", urlencoding::encode(id.as_str())), &[])
            .await
    }

    /// Whether the server answers its health check.
    pub async fn health(&self) -> Result<bool, TransferError> {
        let response = self
            .client()
            .get(self.build_url("/health"))
            .send()
            .await
            .map_err(network_error)?;
        Ok(response.status().is_success())
    }

    async fn retrieve(
        &self,
        endpoint: &str,
        query: &DownloadQuery,
    ) -> Result<(reqwest::header::HeaderMap, Bytes), TransferError> {
        let url = self.build_url(&format!(
            "/{}/{}",
            endpoint,
            urlencoding::encode(query.id.as_str())
        ));
        let mut request = self.client().get(&url);
        if let Some(password) = &query.password {
            request = request.query(&[("password", password.as_str())]);
        }

        let response = request.send().await.map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            let err = TransferError::from_retrieval_status(status.as_u16());
            tracing::warn!(file_id = %query.id, status = status.as_u16(), error = %err, "Retrieval refused");
            return Err(err);
        }

        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(network_error)?;
        Ok((headers, bytes))
    }
}
