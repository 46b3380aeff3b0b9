//! Payment receipt storage (S3 / MinIO).

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

/// Receipts above this size are rejected before upload.
pub const MAX_RECEIPT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ReceiptUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ReceiptUpload {
    /// Images and PDFs only, non-empty, at most `MAX_RECEIPT_BYTES`.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.bytes.is_empty() {
            return Err(AppError::Validation(
                "Upload the payment receipt before submitting".to_string(),
            ));
        }
        if self.bytes.len() > MAX_RECEIPT_BYTES {
            return Err(AppError::Validation(format!(
                "Receipt exceeds {} MiB",
                MAX_RECEIPT_BYTES / (1024 * 1024)
            )));
        }
        let accepted =
            self.content_type.starts_with("image/") || self.content_type == "application/pdf";
        if !accepted {
            return Err(AppError::Validation(format!(
                "Unsupported receipt type '{}': use JPG, PNG or PDF",
                self.content_type
            )));
        }
        Ok(())
    }

    fn extension(&self) -> &str {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(char::is_alphanumeric))
            .unwrap_or("bin")
    }
}

#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Stores the receipt and returns a URL the admin can open.
    async fn upload(&self, user_id: Uuid, upload: &ReceiptUpload) -> Result<String, AppError>;
}

pub struct S3ReceiptStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    endpoint: String,
}

impl S3ReceiptStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, endpoint: String) -> Self {
        Self {
            client,
            bucket,
            endpoint,
        }
    }
}

pub fn receipt_key(user_id: Uuid, upload: &ReceiptUpload) -> String {
    format!(
        "receipts/{}/{}.{}",
        user_id,
        Uuid::new_v4(),
        upload.extension().to_ascii_lowercase()
    )
}

#[async_trait]
impl ReceiptStore for S3ReceiptStore {
    async fn upload(&self, user_id: Uuid, upload: &ReceiptUpload) -> Result<String, AppError> {
        let key = receipt_key(user_id, upload);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(upload.bytes.clone()))
            .content_type(&upload.content_type)
            .send()
            .await
            .map_err(|e| AppError::S3(format!("Receipt upload failed: {e}")))?;

        info!("Uploaded receipt to s3://{}/{}", self.bucket, key);
        Ok(format!(
            "{}/{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.bucket,
            key
        ))
    }
}
