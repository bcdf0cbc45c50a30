use crate::error::StoreError;
use crate::image_processing::extension_for;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::sync::Mutex;

/// Stores one image blob and hands back a publicly resolvable URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError>;
}

pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
    prefix: String,
    public_base_url: Option<String>,
}

impl S3BlobStore {
    pub fn new(
        client: S3Client,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        public_base_url: Option<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
            public_base_url,
        }
    }

    fn public_url(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base, key),
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket, key),
        }
    }
}

/// S3 key: {prefix}/{YYYY}/{MM}/{DD}/image_{YYYYmmddHHMMSS}_{uuid}.{ext}
pub fn object_key(prefix: &str, now: chrono::NaiveDateTime, content_type: &str) -> String {
    let name = format!(
        "image_{}_{}.{}",
        now.format("%Y%m%d%H%M%S"),
        uuid::Uuid::new_v4(),
        extension_for(content_type)
    );
    let dated = format!("{}/{}", now.format("%Y/%m/%d"), name);
    if prefix.is_empty() {
        dated
    } else {
        format!("{}/{}", prefix, dated)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError> {
        let key = object_key(&self.prefix, chrono::Local::now().naive_local(), content_type);
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("S3 put_object failed for {}: {}", key, e);
                StoreError::S3(e.to_string())
            })?;

        tracing::info!("Uploaded photo {} ({} bytes)", key, size);
        Ok(self.public_url(&key))
    }
}

/// Keeps uploads in memory; URLs point at a fake host.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
    fail: Mutex<bool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        *self.fail.lock().unwrap_or_else(|e| e.into_inner()) = fail;
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError> {
        if *self.fail.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(StoreError::Injected("upload refused".to_string()));
        }
        let mut uploads = self.uploads.lock().unwrap_or_else(|e| e.into_inner());
        let url = format!(
            "https://blobs.local/photo-{}.{}",
            uploads.len() + 1,
            extension_for(content_type)
        );
        uploads.push((url.clone(), bytes));
        Ok(url)
    }
}
