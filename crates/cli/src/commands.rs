//! CLI commands

use anyhow::{Context as _, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Subcommand;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use xm_core::{JsonFileStore, KeyValueStore, StoredUser};
use xm_http::{LoginRedirect, UploadFile, XmClient, XmClientBuilder};

use crate::config;
use crate::navigation::ConsoleNavigator;

/// Settings shared by every command
pub struct Context {
    pub data_dir: PathBuf,
    pub base_url: Option<String>,
    pub config_file: Option<PathBuf>,
    pub timeout: Option<u64>,
}

impl Context {
    fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::new(JsonFileStore::new(config::credentials_path(&self.data_dir)))
    }

    fn client(&self) -> Result<XmClient> {
        let config = config::load_client_config(
            self.config_file.as_deref(),
            self.base_url.clone(),
            self.timeout,
        )?;

        let client = XmClientBuilder::from_config(&config)
            .storage(self.store())
            .on_unauthorized(Arc::new(LoginRedirect::new(ConsoleNavigator)))
            .build()?;
        Ok(client)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a session token for subsequent requests
    Login {
        /// Token issued by the backend
        #[arg(long)]
        token: String,

        /// Username to keep alongside the token
        #[arg(long)]
        username: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the stored user, without the token
    Whoami,

    /// Check backend health
    Health,

    /// Show details of the loaded detection model
    ModelDetails,

    /// Show API information
    ApiInfo,

    /// Show the stream service status
    Status,

    /// Send a GET request to an arbitrary path and print the normalized body
    Get {
        /// Path relative to the base URL, e.g. `/user/selectAll`
        path: String,
    },

    /// Upload a file for detection
    Detect {
        file: PathBuf,

        /// Upload a frame to the single-frame endpoint instead
        #[arg(long)]
        frame: bool,
    },

    /// Run detection on a folder on the server
    DetectBatch {
        /// Folder path as seen by the server
        folder: String,
    },

    /// Send a local image as a base64 frame
    DetectFrame {
        image: PathBuf,

        /// Detection options as a JSON object
        #[arg(long)]
        options: Option<String>,
    },

    /// Upload a video for streamed processing
    Stream { file: PathBuf },

    /// Download a processed result file
    Result {
        /// Result file name
        name: String,

        /// Output path (defaults to the file name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    pub async fn execute(self, context: Context) -> Result<()> {
        match self {
            Self::Login { token, username } => login(&context, token, username),
            Self::Logout => logout(&context),
            Self::Whoami => whoami(&context),
            Self::Health => print_json(&context.client()?.check_health().await?),
            Self::ModelDetails => print_json(&context.client()?.model_details().await?),
            Self::ApiInfo => print_json(&context.client()?.api_info().await?),
            Self::Status => print_json(&context.client()?.api_status().await?),
            Self::Get { path } => {
                let client = context.client()?;
                print_json(&client.send(client.get(&path)).await?)
            }
            Self::Detect { file, frame } => {
                let client = context.client()?;
                let upload = read_upload(&file).await?;
                let result = if frame {
                    client.detect_frame(upload).await?
                } else {
                    client.detect_file(upload).await?
                };
                print_json(&result)
            }
            Self::DetectBatch { folder } => {
                print_json(&context.client()?.detect_batch(&folder).await?)
            }
            Self::DetectFrame { image, options } => {
                let client = context.client()?;
                let options = options.as_deref().map(parse_options).transpose()?;
                let bytes = tokio::fs::read(&image)
                    .await
                    .with_context(|| format!("failed to read {}", image.display()))?;
                let result = client
                    .detect_frame_base64(STANDARD.encode(bytes), options)
                    .await?;
                print_json(&result)
            }
            Self::Stream { file } => {
                let client = context.client()?;
                let upload = read_upload(&file).await?;
                print_json(&client.upload_video_for_stream(upload).await?)
            }
            Self::Result { name, output } => {
                let client = context.client()?;
                let data = client.result_file(&name).await?;
                let output = output.unwrap_or_else(|| PathBuf::from(&name));
                tokio::fs::write(&output, &data)
                    .await
                    .with_context(|| format!("failed to write {}", output.display()))?;
                println!("Saved {} bytes to {}", data.len(), output.display());
                Ok(())
            }
        }
    }
}

fn login(context: &Context, token: String, username: Option<String>) -> Result<()> {
    let mut user = StoredUser::with_token(token);
    if let Some(username) = username {
        user.extra.insert("username".to_string(), Value::String(username));
    }
    user.save(context.store().as_ref())?;

    let path = config::credentials_path(&context.data_dir);
    info!(path = %path.display(), "Stored session");
    println!("Logged in, credentials stored in {}", path.display());
    Ok(())
}

fn logout(context: &Context) -> Result<()> {
    StoredUser::clear(context.store().as_ref())?;
    println!("Logged out");
    Ok(())
}

fn whoami(context: &Context) -> Result<()> {
    let user = StoredUser::load(context.store().as_ref())?;
    if user.token.is_none() {
        println!("Not logged in");
        return Ok(());
    }
    print_json(&Value::Object(user.extra))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_options(raw: &str) -> Result<Map<String, Value>> {
    serde_json::from_str(raw).context("--options must be a JSON object")
}

async fn read_upload(path: &Path) -> Result<UploadFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
    Ok(UploadFile::new(file_name, bytes, mime_for(path)))
}

fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("bmp") => "image/bmp",
        Some("mp4") => "video/mp4",
        Some("avi") => "video/x-msvideo",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    }
}
