use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::config::BlobConfig;
use crate::storage::{BlobRef, BlobStore, StorageError};

/// Blob store on S3 or MinIO. A container is a key prefix inside the bucket.
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    endpoint: String,
}

impl S3BlobStore {
    /// Constructs an S3 client configured for MinIO (local) or AWS (production).
    pub async fn connect(config: &BlobConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "grant-assistant-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn ensure_container(&self, _container: &str) -> Result<(), StorageError> {
        if self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
        {
            return Ok(());
        }

        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::Blob(format!("create bucket failed: {e}")))?;

        info!("Created bucket {}", self.bucket);
        Ok(())
    }

    async fn upload(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<BlobRef, StorageError> {
        let key = format!("{container}/{name}");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Blob(format!("S3 upload failed: {e}")))?;

        info!("Uploaded blob to s3://{}/{}", self.bucket, key);

        Ok(BlobRef {
            url: self.object_url(&key),
        })
    }
}
