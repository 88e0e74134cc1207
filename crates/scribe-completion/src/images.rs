//! Loading attached images so they can be inlined into a request.
//!
//! Image URLs handed out by the chat platform embed the bot credential, so
//! URLs are never logged and never appear in error text.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use crate::error::{CompletionError, Result};
use crate::request::InlineImage;

const FALLBACK_MIME: &str = "image/jpeg";

/// Loads an image by URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<InlineImage>;
}

/// Fetches images over HTTP.
#[derive(Clone, Default)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<InlineImage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CompletionError::ImageFetch(describe_transport_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompletionError::ImageFetch(format!("HTTP {}", status.as_u16())));
        }

        let header_mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
            .filter(|v| v.starts_with("image/"));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CompletionError::ImageFetch(describe_transport_error(&e)))?;
        if bytes.is_empty() {
            return Err(CompletionError::ImageFetch("empty body".to_string()));
        }

        let mime_type = header_mime
            .or_else(|| mime_from_path(url).map(str::to_string))
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        debug!(mime = %mime_type, size = bytes.len(), "Image fetched");

        Ok(InlineImage {
            mime_type,
            data: STANDARD.encode(&bytes),
        })
    }
}

// reqwest errors print the request URL; keep only the kind.
fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "timed out".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else if e.is_body() || e.is_decode() {
        "body read failed".to_string()
    } else {
        "request failed".to_string()
    }
}

/// Guess a MIME type from the URL's file extension.
fn mime_from_path(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
