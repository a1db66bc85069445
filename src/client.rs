//! Command-line client for a running gateway.
//!
//! Speaks the same contract as the browser UI: a multipart POST to
//! `/api/upload` and a GET to `/api/search?q=`. The only client-side rule is
//! that an upload needs a file.

use crate::models::image::{ImageItem, SearchResponse};
use anyhow::{Context, Result, anyhow, bail};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    missing: Option<Vec<String>>,
}

impl ErrorBody {
    fn describe(self) -> String {
        let mut text = self.error;
        if let Some(missing) = self.missing {
            text.push_str(&format!(" (missing: {})", missing.join(", ")));
        }
        if let Some(details) = self.details {
            text.push_str(&format!(": {}", details));
        }
        text
    }
}

#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Upload `file` with comma-separated `keywords`.
    ///
    /// Fails without contacting the gateway when no file is given.
    pub async fn upload(&self, file: Option<&Path>, keywords: &str) -> Result<ImageItem> {
        let Some(path) = file else {
            bail!("select an image file to upload");
        };

        let data = fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".into());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let part = Part::bytes(data)
            .file_name(filename)
            .mime_str(mime.as_ref())?;
        let form = Form::new()
            .part("image", part)
            .text("keywords", keywords.to_string());

        let response = self
            .http
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .context("sending upload request")?;

        Self::read_json(response, "Upload failed").await
    }

    /// Search by keyword substring; an empty query lists everything.
    pub async fn search(&self, query: &str) -> Result<Vec<ImageItem>> {
        let response = self
            .http
            .get(format!("{}/api/search", self.base_url))
            .query(&[("q", query)])
            .send()
            .await
            .context("sending search request")?;

        let body: SearchResponse = Self::read_json(response, "Search failed").await?;
        Ok(body.items)
    }

    async fn read_json<T>(response: reqwest::Response, fallback: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.context("decoding gateway response");
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.describe(),
            Err(_) => fallback.to_string(),
        };
        Err(anyhow!("{} ({})", message, status))
    }
}

/// One line per item: key, URL, then the keywords as a caption.
pub fn render_item(item: &ImageItem) -> String {
    format!("{}  {}  [{}]", item.key, item.url, item.keywords.join(", "))
}
