//! S3-based file storage implementation
//!
//! Stores objects in AWS S3 (or S3-compatible services like MinIO) under the
//! key handed in by the file service. URLs are presigned GET requests.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;

use super::error::FileStorageError;
use super::storage::{FileStorage, validate_key};

/// S3-based file storage
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3 storage with the given configuration
    pub async fn new(
        bucket: String,
        region: Option<String>,
        endpoint: Option<String>,
    ) -> Result<Self, FileStorageError> {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = region {
            config_loader = config_loader.region(aws_sdk_s3::config::Region::new(region));
        }

        let config = config_loader.load().await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&config);

        if let Some(endpoint_url) = endpoint {
            // Path-style addressing for S3-compatible services
            s3_config = s3_config.endpoint_url(endpoint_url).force_path_style(true);
        }

        let client = Client::from_conf(s3_config.build());

        tracing::debug!(bucket = %bucket, "S3 storage initialized");

        Ok(Self { client, bucket })
    }
}

#[async_trait]
impl FileStorage for S3Storage {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn store(
        &self,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), FileStorageError> {
        validate_key(key)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_content_type(content_type.map(str::to_string))
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| FileStorageError::Backend(format!("S3 put_object error: {}", e)))?;

        tracing::debug!(key, size = data.len(), "File stored in S3");

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, FileStorageError> {
        validate_key(key)?;

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    FileStorageError::NotFound {
                        key: key.to_string(),
                    }
                } else {
                    FileStorageError::Backend(format!("S3 get_object error: {}", service_err))
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| FileStorageError::Backend(format!("S3 body read error: {}", e)))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn exists(&self, key: &str) -> Result<bool, FileStorageError> {
        validate_key(key)?;

        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(FileStorageError::Backend(format!(
                        "S3 head_object error: {}",
                        service_err
                    )))
                }
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), FileStorageError> {
        validate_key(key)?;

        // delete_object succeeds for missing keys
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| FileStorageError::Backend(format!("S3 delete_object error: {}", e)))?;

        tracing::debug!(key, "File deleted from S3");

        Ok(())
    }

    async fn url(&self, key: &str, expires_in: Duration) -> Result<String, FileStorageError> {
        validate_key(key)?;

        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| FileStorageError::Backend(format!("S3 presign config error: {}", e)))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| FileStorageError::Backend(format!("S3 presign error: {}", e)))?;

        tracing::trace!(key, expires_secs = expires_in.as_secs(), "Presigned S3 URL");

        Ok(request.uri().to_string())
    }
}
