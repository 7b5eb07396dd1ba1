//! Detection service endpoints

use super::{ClientError, XmClient};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Upload payload for the multipart endpoints
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime: mime.into(),
        }
    }

    fn into_form(self) -> Result<Form, ClientError> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime)?;
        Ok(Form::new().part("file", part))
    }
}

/// Body of `POST /detect_frame_base64`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameBase64Request {
    pub image: String,
    pub options: Map<String, Value>,
}

impl XmClient {
    /// `GET /health`
    pub async fn check_health(&self) -> Result<Value, ClientError> {
        self.send(self.get("/health")).await
    }

    /// `GET /model_details`
    pub async fn model_details(&self) -> Result<Value, ClientError> {
        self.send(self.get("/model_details")).await
    }

    /// `GET /api/status`
    pub async fn api_status(&self) -> Result<Value, ClientError> {
        self.send(self.get("/api/status")).await
    }

    /// `GET /api/info`
    pub async fn api_info(&self) -> Result<Value, ClientError> {
        self.send(self.get("/api/info")).await
    }

    /// Upload a file to `POST /detect`
    pub async fn detect_file(&self, file: UploadFile) -> Result<Value, ClientError> {
        self.upload("/detect", file).await
    }

    /// Upload a single frame to `POST /detect_frame`
    pub async fn detect_frame(&self, file: UploadFile) -> Result<Value, ClientError> {
        self.upload("/detect_frame", file).await
    }

    /// Upload a video to `POST /stream_video` for streamed processing
    pub async fn upload_video_for_stream(&self, file: UploadFile) -> Result<Value, ClientError> {
        self.upload("/stream_video", file).await
    }

    /// Run detection on every image in a server-side folder
    pub async fn detect_batch(&self, folder_path: &str) -> Result<Value, ClientError> {
        let request = self.get("/detect_batch").query("folder_path", folder_path);
        self.send(request).await
    }

    /// Detect a base64-encoded frame; `options` defaults to `{}`
    pub async fn detect_frame_base64(
        &self,
        image_base64: impl Into<String>,
        options: Option<Map<String, Value>>,
    ) -> Result<Value, ClientError> {
        let body = FrameBase64Request {
            image: image_base64.into(),
            options: options.unwrap_or_default(),
        };
        debug!(image_len = body.image.len(), "Sending base64 frame");
        self.post_json("/detect_frame_base64", &body).await
    }

    /// Download a processed result from `GET /result/{filename}`
    ///
    /// An `.mp4` whose first 32 bytes lack the `ftyp` box marker is returned
    /// as-is but logged as likely corrupt.
    pub async fn result_file(&self, filename: &str) -> Result<Bytes, ClientError> {
        let data = self.send_raw(self.get(&format!("/result/{filename}"))).await?;
        debug!(filename, size = data.len(), "Downloaded result file");

        if filename.to_ascii_lowercase().ends_with(".mp4") && !has_mp4_marker(&data) {
            warn!(filename, "MP4 result is missing the ftyp marker, file may be corrupt");
        }

        Ok(data)
    }

    /// Upload a local video file to `POST /detect`
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn detect_video_file(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Value, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_string());

        self.detect_file(UploadFile::new(file_name, bytes, "video/mp4"))
            .await
    }

    /// Whether `GET /health` answers at all
    pub async fn is_reachable(&self) -> bool {
        self.check_health().await.is_ok()
    }

    /// Whether `GET /api/status` reports `status: "running"`
    pub async fn is_stream_service_running(&self) -> bool {
        self.api_status()
            .await
            .is_ok_and(|status| status.get("status").and_then(Value::as_str) == Some("running"))
    }

    async fn upload(&self, path: &str, file: UploadFile) -> Result<Value, ClientError> {
        debug!(path, file_name = %file.file_name, size = file.bytes.len(), "Uploading file");
        let request = self.post(path).multipart(file.into_form()?);
        self.send(request).await
    }
}

fn has_mp4_marker(data: &[u8]) -> bool {
    data[..data.len().min(32)]
        .windows(4)
        .any(|window| window == b"ftyp")
}
