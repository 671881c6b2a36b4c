//! Supabase Storage client for uploaded PDFs and images.
//!
//! Files live in public buckets; rows store the public URL. Uploads never
//! overwrite an existing object, so every upload gets a fresh key.

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use thiserror::Error;
use url::Url;

use bultex_core::extension_for;

use crate::config::SupabaseConfig;

/// Buckets used by the admin.
pub mod buckets {
    pub const CATALOGS: &str = "catalogs";
    pub const PRODUCTS: &str = "products";
    pub const CATEGORIES: &str = "categories";
    pub const SITE_IMAGES: &str = "site-images";
}

/// Errors that can occur when talking to object storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The URL does not point into the expected bucket.
    #[error("URL de archivo inválida")]
    InvalidUrl,
}

/// A file received from a form, already validated.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Upload {
    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::try_from(self.bytes.len()).unwrap_or(u64::MAX)
    }
}

/// The object-storage operations the admin needs.
pub trait ObjectStore: Send + Sync {
    /// Store `upload` at `bucket/path` and return its public URL.
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        upload: &Upload,
    ) -> impl Future<Output = Result<String, StorageError>> + Send;

    fn delete(&self, bucket: &str, path: &str)
    -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Object path inside `bucket` for one of its public URLs.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidUrl`] when `url` is not in the bucket.
    fn path_from_public_url(&self, bucket: &str, url: &str) -> Result<String, StorageError> {
        path_in_bucket(bucket, url)
    }
}

/// Extract the object path that follows `/{bucket}/` in a public URL.
fn path_in_bucket(bucket: &str, url: &str) -> Result<String, StorageError> {
    let parsed = Url::parse(url).map_err(|_| StorageError::InvalidUrl)?;
    let marker = format!("/{bucket}/");
    let path = parsed.path();

    let start = path.find(&marker).ok_or(StorageError::InvalidUrl)? + marker.len();
    let object = path.get(start..).unwrap_or_default();
    if object.is_empty() {
        return Err(StorageError::InvalidUrl);
    }

    urlencoding::decode(object)
        .map(|p| p.into_owned())
        .map_err(|_| StorageError::InvalidUrl)
}

/// Fresh object key: `{prefix}/{unix millis}-{random}.{ext}`.
#[must_use]
pub fn object_key(prefix: &str, content_type: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(7)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!(
        "{prefix}/{}-{suffix}.{}",
        chrono::Utc::now().timestamp_millis(),
        extension_for(content_type)
    )
}

/// New files uploaded for one row, plus the files they will replace.
///
/// Stage every upload first, then write the row, then either
/// [`commit`](Self::commit) (old files removed) or
/// [`discard`](Self::discard) (new files removed, old files untouched). The
/// row never points at a deleted object, whichever step fails.
#[derive(Debug)]
pub struct StagedFiles {
    bucket: &'static str,
    uploaded: Vec<String>,
    replaced: Vec<String>,
}

impl StagedFiles {
    #[must_use]
    pub const fn new(bucket: &'static str) -> Self {
        Self {
            bucket,
            uploaded: Vec::new(),
            replaced: Vec::new(),
        }
    }

    /// Upload `upload` to `path` and return its public URL. `old_url`, when
    /// set, is only removed by a later [`commit`](Self::commit).
    ///
    /// # Errors
    ///
    /// Returns the upload error. Files staged earlier stay staged; call
    /// [`discard`](Self::discard) to remove them.
    pub async fn stage<S: ObjectStore>(
        &mut self,
        store: &S,
        old_url: Option<&str>,
        path: &str,
        upload: &Upload,
    ) -> Result<String, StorageError> {
        let url = store.upload(self.bucket, path, upload).await?;
        self.uploaded.push(url.clone());
        if let Some(old_url) = old_url.filter(|u| !u.is_empty()) {
            self.replaced.push(old_url.to_string());
        }
        Ok(url)
    }

    /// The row now references the new files: remove the replaced ones.
    /// Failures are logged and leave the old files orphaned.
    pub async fn commit<S: ObjectStore>(self, store: &S) {
        for url in &self.replaced {
            delete_by_url(store, self.bucket, url).await;
        }
    }

    /// The row was not written: remove everything uploaded so far.
    pub async fn discard<S: ObjectStore>(self, store: &S) {
        for url in &self.uploaded {
            delete_by_url(store, self.bucket, url).await;
        }
    }
}

/// Request deletion of the file behind `url`, logging any failure.
///
/// Returns whether the file was deleted.
pub async fn delete_by_url<S: ObjectStore>(store: &S, bucket: &str, url: &str) -> bool {
    let result = match store.path_from_public_url(bucket, url) {
        Ok(path) => store.delete(bucket, &path).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, bucket, url, "Failed to delete stored file, leaving it orphaned");
            false
        }
    }
}

/// Supabase Storage API client.
#[derive(Clone)]
pub struct SupabaseStorage {
    inner: Arc<SupabaseStorageInner>,
}

struct SupabaseStorageInner {
    client: reqwest::Client,
    base_url: String,
    service_role_key: SecretString,
}

impl SupabaseStorage {
    /// Create a new storage client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            inner: Arc::new(SupabaseStorageInner {
                client,
                base_url: format!("{}/storage/v1", config.url),
                service_role_key: config.service_role_key.clone(),
            }),
        })
    }

    /// Public URL of an object in a public bucket.
    #[must_use]
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/object/public/{bucket}/{path}", self.inner.base_url)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let key = self.inner.service_role_key.expose_secret();
        self.inner
            .client
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(key)
    }

    async fn check(response: reqwest::Response) -> Result<(), StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(StorageError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl ObjectStore for SupabaseStorage {
    #[tracing::instrument(skip(self, upload), fields(size = upload.size()))]
    async fn upload(&self, bucket: &str, path: &str, upload: &Upload) -> Result<String, StorageError> {
        let response = self
            .request(
                reqwest::Method::POST,
                format!("{}/object/{bucket}/{path}", self.inner.base_url),
            )
            .header(reqwest::header::CONTENT_TYPE, &upload.content_type)
            .header("x-upsert", "false")
            .body(upload.bytes.clone())
            .send()
            .await?;
        Self::check(response).await?;

        tracing::info!(bucket, path, "File uploaded");
        Ok(self.public_url(bucket, path))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        let response = self
            .request(
                reqwest::Method::DELETE,
                format!("{}/object/{bucket}", self.inner.base_url),
            )
            .json(&json!({ "prefixes": [path] }))
            .send()
            .await?;
        Self::check(response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// In-memory store that records calls and can be told to fail.
    #[derive(Default)]
    pub(crate) struct FakeStore {
        pub uploads: Mutex<Vec<String>>,
        pub deletes: Mutex<Vec<String>>,
        pub fail_upload: bool,
        /// Fail every upload after this many have succeeded.
        pub fail_upload_after: Option<usize>,
        pub fail_delete: bool,
    }

    impl ObjectStore for FakeStore {
        async fn upload(&self, bucket: &str, path: &str, _upload: &Upload) -> Result<String, StorageError> {
            let mut uploads = self.uploads.lock().unwrap();
            if self.fail_upload || self.fail_upload_after.is_some_and(|n| uploads.len() >= n) {
                return Err(StorageError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            uploads.push(format!("{bucket}/{path}"));
            Ok(format!(
                "https://abc.supabase.co/storage/v1/object/public/{bucket}/{path}"
            ))
        }

        async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
            if self.fail_delete {
                return Err(StorageError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            self.deletes.lock().unwrap().push(format!("{bucket}/{path}"));
            Ok(())
        }
    }

    pub(crate) fn pdf() -> Upload {
        Upload {
            file_name: "linea-2026.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF-1.7"),
        }
    }

    const OLD_URL: &str = "https://abc.supabase.co/storage/v1/object/public/catalogs/pdfs/1700000000000-abc1234.pdf";

    #[test]
    fn test_path_from_public_url() {
        let store = FakeStore::default();
        assert_eq!(
            store.path_from_public_url("catalogs", OLD_URL).unwrap(),
            "pdfs/1700000000000-abc1234.pdf"
        );
    }

    #[test]
    fn test_path_from_public_url_rejects_other_bucket() {
        let store = FakeStore::default();
        let err = store.path_from_public_url("products", OLD_URL).unwrap_err();
        assert_eq!(err.to_string(), "URL de archivo inválida");
        assert!(store.path_from_public_url("catalogs", "not a url").is_err());
        assert!(
            store
                .path_from_public_url("catalogs", "https://abc.supabase.co/storage/v1/object/public/catalogs/")
                .is_err()
        );
    }

    #[test]
    fn test_path_from_public_url_decodes() {
        let url = "https://abc.supabase.co/storage/v1/object/public/products/fotos/camisa%20azul.jpg";
        assert_eq!(path_in_bucket("products", url).unwrap(), "fotos/camisa azul.jpg");
    }

    #[test]
    fn test_object_key_shape() {
        let key = object_key("thumbnails", "image/png");
        let name = key.strip_prefix("thumbnails/").unwrap();
        let (stamp, rest) = name.split_once('-').unwrap();
        assert!(stamp.parse::<i64>().is_ok());
        assert_eq!(rest.len(), "abcdefg.png".len());
        assert!(rest.ends_with(".png"));
        assert_ne!(key, object_key("thumbnails", "image/png"));
    }

    fn thumbnail() -> Upload {
        Upload {
            file_name: "portada.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: Bytes::from_static(b"png"),
        }
    }

    #[tokio::test]
    async fn test_commit_deletes_replaced_files_only() {
        let store = FakeStore::default();
        let mut staged = StagedFiles::new("catalogs");
        let url = staged
            .stage(&store, Some(OLD_URL), "pdfs/new.pdf", &pdf())
            .await
            .unwrap();
        assert!(url.ends_with("/catalogs/pdfs/new.pdf"));
        // Nothing is deleted until the row is written
        assert!(store.deletes.lock().unwrap().is_empty());

        staged.commit(&store).await;
        assert_eq!(*store.uploads.lock().unwrap(), ["catalogs/pdfs/new.pdf"]);
        assert_eq!(
            *store.deletes.lock().unwrap(),
            ["catalogs/pdfs/1700000000000-abc1234.pdf"]
        );
    }

    #[tokio::test]
    async fn test_second_upload_failure_keeps_old_files() {
        let store = FakeStore {
            fail_upload_after: Some(1),
            ..FakeStore::default()
        };
        let mut staged = StagedFiles::new("catalogs");
        staged
            .stage(&store, Some(OLD_URL), "pdfs/new.pdf", &pdf())
            .await
            .unwrap();
        let thumb = staged
            .stage(&store, None, "thumbnails/new.png", &thumbnail())
            .await;
        assert!(thumb.is_err());

        staged.discard(&store).await;
        // Only the new PDF is removed; the one the row points at survives
        assert_eq!(*store.deletes.lock().unwrap(), ["catalogs/pdfs/new.pdf"]);
    }

    #[tokio::test]
    async fn test_failed_delete_on_commit_is_tolerated() {
        let store = FakeStore {
            fail_delete: true,
            ..FakeStore::default()
        };
        let mut staged = StagedFiles::new("catalogs");
        staged
            .stage(&store, Some(OLD_URL), "pdfs/new.pdf", &pdf())
            .await
            .unwrap();
        staged.commit(&store).await;
        assert!(store.deletes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stage_without_previous_file() {
        let store = FakeStore::default();
        let mut staged = StagedFiles::new("catalogs");
        staged
            .stage(&store, None, "pdfs/new.pdf", &pdf())
            .await
            .unwrap();
        staged.commit(&store).await;
        assert!(store.deletes.lock().unwrap().is_empty());
    }
}
