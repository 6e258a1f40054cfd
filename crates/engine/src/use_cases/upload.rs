//! Source-text upload, the first half of the upload-then-ingest flow.
//!
//! The blob name echoes back so a failed ingestion can be retried without
//! re-uploading the file.

use std::sync::Arc;

use serde::Serialize;

use crate::infrastructure::ports::{StorageError, StoragePort};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Uploaded {
    pub file_url: String,
    pub blob_name: String,
}

pub struct UploadFile {
    storage: Arc<dyn StoragePort>,
}

impl UploadFile {
    pub fn new(storage: Arc<dyn StoragePort>) -> Self {
        Self { storage }
    }

    pub async fn execute(
        &self,
        container: &str,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<Uploaded, StorageError> {
        let url = self
            .storage
            .upload(container, file_name, bytes, content_type)
            .await?;

        tracing::info!(container, blob = file_name, "file uploaded");
        Ok(Uploaded {
            file_url: url,
            blob_name: file_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockStoragePort;

    #[tokio::test]
    async fn upload_echoes_the_blob_name() {
        let mut storage = MockStoragePort::new();
        storage
            .expect_upload()
            .withf(|container, blob, bytes, content_type| {
                container == "stories"
                    && blob == "fable.txt"
                    && bytes == b"once upon a time"
                    && content_type == "text/plain"
            })
            .returning(|c, b, _, _| Ok(format!("https://storage.example.com/{c}/{b}")));

        let upload = UploadFile::new(Arc::new(storage));
        let uploaded = upload
            .execute("stories", "fable.txt", b"once upon a time".to_vec(), "text/plain")
            .await
            .expect("uploads");

        assert_eq!(uploaded.blob_name, "fable.txt");
        assert!(uploaded.file_url.ends_with("/stories/fable.txt"));
    }
}
