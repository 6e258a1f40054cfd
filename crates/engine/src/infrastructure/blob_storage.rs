//! Object storage client over an Azure-Blob-style REST surface.
//!
//! Auth is a pre-issued SAS token appended as a query string, so requests
//! need no request signing. Blob URLs have the shape
//! `{base}/{container}/{blob}`; the SAS suffix is stripped from returned
//! public URLs.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

use crate::infrastructure::ports::{StorageError, StoragePort};

#[derive(Clone)]
pub struct BlobStorageClient {
    client: Client,
    base_url: String,
    sas_token: String,
}

impl BlobStorageClient {
    pub fn new(base_url: &str, sas_token: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            sas_token: sas_token.trim_start_matches('?').to_string(),
        }
    }

    fn blob_url(&self, container: &str, blob: &str) -> String {
        format!("{}/{}/{}", self.base_url, container, blob)
    }

    fn signed_url(&self, container: &str, blob: &str) -> String {
        if self.sas_token.is_empty() {
            self.blob_url(container, blob)
        } else {
            format!("{}?{}", self.blob_url(container, blob), self.sas_token)
        }
    }
}

/// Recover `(container, blob)` from a stored blob URL.
///
/// The deletion flow persists full public URLs on entity rows and must map
/// them back to storage coordinates.
pub fn parse_blob_path(image_url: &str) -> Result<(String, String), StorageError> {
    let url = Url::parse(image_url).map_err(|e| StorageError::InvalidPath(e.to_string()))?;

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() < 2 {
        return Err(StorageError::InvalidPath(format!(
            "expected /container/blob in {image_url}"
        )));
    }

    // The container is the first path segment; everything after it is the
    // blob name, which may itself contain slashes.
    let container = segments[0].to_string();
    let blob = segments[1..].join("/");

    Ok((container, blob))
}

#[async_trait]
impl StoragePort for BlobStorageClient {
    async fn upload(
        &self,
        container: &str,
        blob: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let response = self
            .client
            .put(self.signed_url(container, blob))
            .header("x-ms-blob-type", "BlockBlob")
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::RequestFailed(format!(
                "upload of {container}/{blob} failed: {status} {body}"
            )));
        }

        Ok(self.blob_url(container, blob))
    }

    async fn download(&self, container: &str, blob: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get(self.signed_url(container, blob))
            .send()
            .await
            .map_err(|e| StorageError::RequestFailed(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(format!("{container}/{blob}")));
        }

        if !response.status().is_success() {
            return Err(StorageError::RequestFailed(format!(
                "download of {container}/{blob} failed: {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| StorageError::RequestFailed(e.to_string()))
    }

    async fn exists(&self, container: &str, blob: &str) -> Result<bool, StorageError> {
        let response = self
            .client
            .head(self.signed_url(container, blob))
            .send()
            .await
            .map_err(|e| StorageError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => Err(StorageError::RequestFailed(format!(
                "existence check for {container}/{blob} failed: {s}"
            ))),
        }
    }

    async fn delete(&self, container: &str, blob: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(self.signed_url(container, blob))
            .send()
            .await
            .map_err(|e| StorageError::RequestFailed(e.to_string()))?;

        // Already-absent blobs count as deleted.
        if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }

        Err(StorageError::RequestFailed(format!(
            "delete of {container}/{blob} failed: {}",
            response.status()
        )))
    }

    fn url_for(&self, container: &str, blob: &str) -> String {
        self.blob_url(container, blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_container_and_blob_from_url() {
        let (container, blob) =
            parse_blob_path("https://storage.example.com/scenarios/old-village.png")
                .expect("parsable");
        assert_eq!(container, "scenarios");
        assert_eq!(blob, "old-village.png");
    }

    #[test]
    fn ignores_query_suffix() {
        let (container, blob) =
            parse_blob_path("https://storage.example.com/stories/fox-tale.png?t=1712000000")
                .expect("parsable");
        assert_eq!(container, "stories");
        assert_eq!(blob, "fox-tale.png");
    }

    #[test]
    fn keeps_every_segment_of_a_nested_blob_name() {
        let (container, blob) =
            parse_blob_path("https://storage.example.com/scenarios/villages/old/map.png")
                .expect("parsable");
        assert_eq!(container, "scenarios");
        assert_eq!(blob, "villages/old/map.png");
    }

    #[test]
    fn rejects_urls_without_a_blob_segment() {
        assert!(parse_blob_path("https://storage.example.com/").is_err());
        assert!(parse_blob_path("not a url at all").is_err());
    }
}
