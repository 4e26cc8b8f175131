//! R2 client implementation.

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Lifetime of presigned GET URLs handed back for uploaded artifacts.
pub const PRESIGNED_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Configuration for R2 client.
#[derive(Debug, Clone)]
pub struct R2Config {
    /// R2 endpoint URL (S3 API endpoint)
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region (usually "auto" for R2)
    pub region: String,
    /// Public base URL of the bucket (custom domain or r2.dev); presigned URLs otherwise
    pub public_url: Option<String>,
}

impl R2Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StorageResult<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| StorageError::config_error(format!("{} not set", key)))
        };

        Ok(Self {
            endpoint_url: required("R2_ENDPOINT_URL")?,
            access_key_id: required("R2_ACCESS_KEY_ID")?,
            secret_access_key: required("R2_SECRET_ACCESS_KEY")?,
            bucket_name: required("R2_BUCKET_NAME")?,
            region: lookup("R2_REGION").unwrap_or_else(|| "auto".to_string()),
            public_url: lookup("R2_PUBLIC_URL").filter(|v| !v.is_empty()),
        })
    }
}

/// Cloudflare R2 storage client.
#[derive(Clone)]
pub struct R2Client {
    client: Client,
    bucket: String,
    public_url: Option<String>,
}

impl R2Client {
    /// Create a new R2 client from configuration.
    pub async fn new(config: R2Config) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = Client::from_conf(sdk_config);

        Ok(Self {
            client,
            bucket: config.bucket_name,
            public_url: config.public_url,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = R2Config::from_env()?;
        Self::new(config).await
    }

    /// Upload a file to R2.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        let size = tokio::fs::metadata(path).await?.len();
        debug!("Uploading {} ({} bytes) to {}", path.display(), size, key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    /// Generate a presigned URL for GET (temporary, signed URL via S3 API).
    pub async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    /// URL a consumer can fetch `key` from.
    pub async fn object_url(&self, key: &str) -> StorageResult<String> {
        match public_object_url(self.public_url.as_deref(), key) {
            Some(url) => Ok(url),
            None => self.presign_get(key, PRESIGNED_URL_TTL).await,
        }
    }
}

fn public_object_url(base: Option<&str>, key: &str) -> Option<String> {
    base.map(|base| format!("{}/{}", base.trim_end_matches('/'), key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_env() -> HashMap<String, String> {
        vars(&[
            ("R2_ENDPOINT_URL", "https://account.r2.cloudflarestorage.com"),
            ("R2_ACCESS_KEY_ID", "key"),
            ("R2_SECRET_ACCESS_KEY", "secret"),
            ("R2_BUCKET_NAME", "vsplit-test"),
        ])
    }

    #[test]
    fn test_config_defaults_region_and_public_url() {
        let env = full_env();
        let config = R2Config::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.bucket_name, "vsplit-test");
        assert_eq!(config.region, "auto");
        assert!(config.public_url.is_none());
    }

    #[test]
    fn test_config_requires_credentials() {
        let mut env = full_env();
        env.remove("R2_SECRET_ACCESS_KEY");
        let err = R2Config::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("R2_SECRET_ACCESS_KEY not set"));
    }

    #[test]
    fn test_public_object_url_joins_without_double_slash() {
        assert_eq!(
            public_object_url(Some("https://media.example.com/"), "splits/a_split_1.mp4"),
            Some("https://media.example.com/splits/a_split_1.mp4".to_string())
        );
        assert_eq!(public_object_url(None, "splits/a.mp4"), None);
    }

    #[tokio::test]
    async fn test_object_url_prefers_public_base() {
        let mut env = full_env();
        env.insert("R2_PUBLIC_URL".into(), "https://media.example.com".into());
        let config = R2Config::from_lookup(|k| env.get(k).cloned()).unwrap();
        let client = R2Client::new(config).await.unwrap();

        let url = client.object_url("splits/job_split_1.mp4").await.unwrap();
        assert_eq!(url, "https://media.example.com/splits/job_split_1.mp4");
    }

    #[tokio::test]
    async fn test_object_url_falls_back_to_presigned() {
        let env = full_env();
        let config = R2Config::from_lookup(|k| env.get(k).cloned()).unwrap();
        let client = R2Client::new(config).await.unwrap();

        let url = client.object_url("splits/job_split_1.mp4").await.unwrap();
        assert!(url.contains("/vsplit-test/splits/job_split_1.mp4"));
        assert!(url.contains("X-Amz-Signature="));
        assert!(url.contains("X-Amz-Expires=604800"));
    }
}
