use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client as S3Client;
use std::time::Duration;

/// Object-storage client over an S3-compatible (MinIO-style) endpoint.
///
/// Two logical buckets: `avatars` holds one `{profile_id}.png` object per
/// profile, `gallery` holds `{profile_id}_{sequence}.png` objects keyed by
/// the profile's monotonic upload counter.
#[derive(Clone)]
pub struct StorageClient {
    client: S3Client,
    pub avatars_bucket: String,
    pub gallery_bucket: String,
}

impl StorageClient {
    pub async fn new(
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        avatars_bucket: &str,
        gallery_bucket: &str,
    ) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "minio");

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(endpoint)
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = S3Client::from_conf(config);

        // Ensure both buckets exist
        for bucket in [avatars_bucket, gallery_bucket] {
            let _ = client.create_bucket().bucket(bucket).send().await;
        }

        tracing::info!(endpoint = %endpoint, "object storage client initialized");

        Self {
            client,
            avatars_bucket: avatars_bucket.to_string(),
            gallery_bucket: gallery_bucket.to_string(),
        }
    }

    pub async fn upload(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), String> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body.into())
            .content_type("image/png")
            .send()
            .await
            .map_err(|e| format!("upload failed: {e}"))?;

        Ok(())
    }

    /// Generate a time-limited retrieval URL for an object.
    pub async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_secs: u64,
    ) -> Result<String, String> {
        let presign_config = PresigningConfig::builder()
            .expires_in(Duration::from_secs(expires_secs))
            .build()
            .map_err(|e| format!("presign config error: {e}"))?;

        let url = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| format!("presign error: {e}"))?
            .uri()
            .to_string();

        Ok(url)
    }

    pub async fn delete(&self, bucket: &str, key: &str) -> Result<(), String> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| format!("delete failed: {e}"))?;

        Ok(())
    }
}
