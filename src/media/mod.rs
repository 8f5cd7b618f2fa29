//! Remote media host: storage trait, object naming and URL parsing.
//!
//! Uploaded files live on a Cloudinary-compatible host. Local records keep only
//! the delivery URL (and, for newer rows, the storage class), so deletion has to
//! reconstruct the host's public id from the URL.

pub mod cloudinary;

use std::fmt;
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use cloudinary::CloudinaryStore;

/// Path segment that separates the delivery prefix from the object path.
const UPLOAD_MARKER: &str = "/upload/";

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));
static VERSION_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v\d+$").expect("static regex"));
/// Delivery transformation such as `c_fill,w_200` or `fl_attachment`.
static TRANSFORMATION_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{1,3}_[^,/]+(,[a-z]{1,3}_[^,/]+)*$").expect("static regex")
});

/// Media host classification of an object; deletion must address the same class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageClass {
    Image,
    Raw,
}

impl StorageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Raw => "raw",
        }
    }

    pub fn alternate(self) -> Self {
        match self {
            Self::Image => Self::Raw,
            Self::Raw => Self::Image,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "image" => Some(Self::Image),
            "raw" => Some(Self::Raw),
            _ => None,
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file to push to the media host.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub folder: String,
    pub public_id: String,
    pub class: StorageClass,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// What the media host reports after a successful upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub secure_url: String,
    pub public_id: String,
    /// The class the host actually stored the object under.
    pub class: StorageClass,
    pub bytes: u64,
    pub version: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    Deleted,
    NotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("request to media host failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("media host returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed media URL: {0}")]
    MalformedUrl(String),
}

/// Remote blob store used by the asset managers.
#[async_trait]
pub trait MediaStore: Send + Sync + fmt::Debug {
    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, MediaError>;

    async fn destroy(
        &self,
        public_id: &str,
        class: StorageClass,
    ) -> Result<DestroyOutcome, MediaError>;
}

/// Result of a best-effort remote delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCleanup {
    Deleted(StorageClass),
    NotFound,
    Failed,
}

impl RemoteCleanup {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Deleted(_))
    }
}

/// Delete a remote object without ever failing the caller.
///
/// With a recorded storage class there is exactly one attempt. Without one,
/// `preferred` is tried first and the alternate class only when the first
/// attempt does not report a deletion: the host may have stored the object
/// under a different class than the upload requested.
pub async fn destroy_best_effort(
    store: &dyn MediaStore,
    public_id: &str,
    recorded: Option<StorageClass>,
    preferred: StorageClass,
) -> RemoteCleanup {
    if let Some(class) = recorded {
        return attempt_destroy(store, public_id, class).await;
    }

    match attempt_destroy(store, public_id, preferred).await {
        RemoteCleanup::Deleted(class) => RemoteCleanup::Deleted(class),
        first => match attempt_destroy(store, public_id, preferred.alternate()).await {
            RemoteCleanup::Deleted(class) => RemoteCleanup::Deleted(class),
            RemoteCleanup::NotFound if first == RemoteCleanup::NotFound => RemoteCleanup::NotFound,
            _ => RemoteCleanup::Failed,
        },
    }
}

async fn attempt_destroy(
    store: &dyn MediaStore,
    public_id: &str,
    class: StorageClass,
) -> RemoteCleanup {
    match store.destroy(public_id, class).await {
        Ok(DestroyOutcome::Deleted) => {
            tracing::info!(public_id, class = %class, "Deleted remote object");
            RemoteCleanup::Deleted(class)
        }
        Ok(DestroyOutcome::NotFound) => {
            tracing::warn!(public_id, class = %class, "Remote object not found");
            RemoteCleanup::NotFound
        }
        Err(e) => {
            tracing::warn!(public_id, class = %class, error = %e, "Remote delete failed");
            RemoteCleanup::Failed
        }
    }
}

/// Reconstruct the host's public id from a delivery URL.
///
/// `https://res.example/<cloud>/raw/upload/v1712/syllabi/p1/intro.pdf`
/// yields `syllabi/p1/intro`.
pub fn public_id_from_url(url: &str) -> Result<String, MediaError> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let (_, rest) = without_query
        .split_once(UPLOAD_MARKER)
        .ok_or_else(|| MediaError::MalformedUrl(url.to_string()))?;

    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    // A version only counts right after `/upload/` or after transformations;
    // a `v2` folder deeper in the path stays part of the public id.
    let transforms = segments
        .iter()
        .take_while(|s| TRANSFORMATION_SEGMENT.is_match(s))
        .count();
    let path = match segments.get(transforms) {
        Some(s) if VERSION_SEGMENT.is_match(s) => &segments[transforms + 1..],
        _ => &segments[..],
    };

    let (last, dirs) = path
        .split_last()
        .ok_or_else(|| MediaError::MalformedUrl(url.to_string()))?;
    let stem = match last.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => last,
    };

    let mut public_id = dirs.join("/");
    if !public_id.is_empty() {
        public_id.push('/');
    }
    public_id.push_str(stem);
    Ok(public_id)
}

/// Lower-case, hyphen-separated form of a display name.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_ALNUM
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Object name for a program syllabus; the timestamp keeps re-uploads distinct.
pub fn syllabus_object_name(program_name: &str, at: DateTime<Utc>) -> String {
    let slug = match slugify(program_name) {
        s if s.is_empty() => "program".to_string(),
        s => s,
    };
    format!("{slug}-syllabus-{}", at.timestamp_millis())
}

/// Object name for a university image.
pub fn university_image_object_name(university_name: &str, at: DateTime<Utc>) -> String {
    let slug = match slugify(university_name) {
        s if s.is_empty() => "university".to_string(),
        s => s,
    };
    format!("{slug}-{}", at.timestamp_millis())
}

#[cfg(test)]
pub mod testing {
    //! Recording in-memory store for unit tests.

    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    pub struct RecordingStore {
        pub uploads: Mutex<Vec<UploadRequest>>,
        pub destroys: Mutex<Vec<(String, StorageClass)>>,
        /// Classes under which `destroy` reports a deletion.
        pub deletable: Vec<StorageClass>,
        pub fail_destroy: bool,
    }

    #[async_trait]
    impl MediaStore for RecordingStore {
        async fn upload(&self, request: UploadRequest) -> Result<StoredObject, MediaError> {
            let stored = StoredObject {
                secure_url: format!(
                    "https://res.example/demo/{}/upload/v1/{}/{}",
                    request.class, request.folder, request.public_id
                ),
                public_id: format!("{}/{}", request.folder, request.public_id),
                class: request.class,
                bytes: request.data.len() as u64,
                version: Some(1),
            };
            self.uploads.lock().unwrap().push(request);
            Ok(stored)
        }

        async fn destroy(
            &self,
            public_id: &str,
            class: StorageClass,
        ) -> Result<DestroyOutcome, MediaError> {
            self.destroys
                .lock()
                .unwrap()
                .push((public_id.to_string(), class));
            if self.fail_destroy {
                return Err(MediaError::Rejected {
                    status: 500,
                    body: "boom".into(),
                });
            }
            if self.deletable.contains(&class) {
                Ok(DestroyOutcome::Deleted)
            } else {
                Ok(DestroyOutcome::NotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingStore;
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn slug_strips_punctuation_and_case() {
        assert_eq!(slugify("Intro to AI!!"), "intro-to-ai");
        assert_eq!(slugify("  M.Sc. Data -- Science "), "m-sc-data-science");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn syllabus_name_matches_expected_shape() {
        let at = Utc.timestamp_millis_opt(1_717_000_000_123).unwrap();
        assert_eq!(
            syllabus_object_name("Intro to AI!!", at),
            "intro-to-ai-syllabus-1717000000123"
        );
        assert_eq!(syllabus_object_name("???", at), "program-syllabus-1717000000123");
    }

    #[test]
    fn public_id_strips_marker_version_and_extension() {
        let url = "https://res.cloudinary.com/demo/raw/upload/v1712345678/syllabi/p1/intro-to-ai-syllabus-1.pdf";
        assert_eq!(
            public_id_from_url(url).unwrap(),
            "syllabi/p1/intro-to-ai-syllabus-1"
        );
    }

    #[test]
    fn public_id_without_version_segment() {
        let url = "https://res.cloudinary.com/demo/image/upload/universities/u1/campus.jpg";
        assert_eq!(public_id_from_url(url).unwrap(), "universities/u1/campus");
    }

    #[test]
    fn public_id_skips_transformations_and_query() {
        let url = "https://res.cloudinary.com/demo/image/upload/c_fill,w_300/v17/universities/u1/campus.webp?_a=x";
        assert_eq!(public_id_from_url(url).unwrap(), "universities/u1/campus");
    }

    #[test]
    fn version_like_folder_is_kept_when_unversioned() {
        let url = "https://res.cloudinary.com/demo/raw/upload/syllabi/v2/intro-syllabus-1.pdf";
        assert_eq!(public_id_from_url(url).unwrap(), "syllabi/v2/intro-syllabus-1");

        let versioned = "https://res.cloudinary.com/demo/raw/upload/v99/syllabi/v2/intro-syllabus-1.pdf";
        assert_eq!(public_id_from_url(versioned).unwrap(), "syllabi/v2/intro-syllabus-1");
    }

    #[test]
    fn public_id_requires_upload_marker() {
        let err = public_id_from_url("https://example.com/files/syllabus.pdf").unwrap_err();
        assert!(matches!(err, MediaError::MalformedUrl(_)));
    }

    #[test]
    fn public_id_rejects_empty_path() {
        assert!(public_id_from_url("https://res.example/demo/raw/upload/v12/").is_err());
    }

    #[test]
    fn storage_class_alternates() {
        assert_eq!(StorageClass::Raw.alternate(), StorageClass::Image);
        assert_eq!(StorageClass::parse("image"), Some(StorageClass::Image));
        assert_eq!(StorageClass::parse("video"), None);
    }

    #[tokio::test]
    async fn recorded_class_is_tried_once() {
        let store = RecordingStore::default();
        let outcome = destroy_best_effort(&store, "a/b", Some(StorageClass::Image), StorageClass::Raw).await;
        assert_eq!(outcome, RemoteCleanup::NotFound);
        assert_eq!(store.destroys.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn falls_back_to_alternate_class() {
        let store = RecordingStore {
            deletable: vec![StorageClass::Image],
            ..Default::default()
        };
        let outcome = destroy_best_effort(&store, "a/b", None, StorageClass::Raw).await;
        assert_eq!(outcome, RemoteCleanup::Deleted(StorageClass::Image));
        let calls = store.destroys.lock().unwrap();
        assert_eq!(calls[0].1, StorageClass::Raw);
        assert_eq!(calls[1].1, StorageClass::Image);
    }

    #[tokio::test]
    async fn no_fallback_after_success() {
        let store = RecordingStore {
            deletable: vec![StorageClass::Raw],
            ..Default::default()
        };
        let outcome = destroy_best_effort(&store, "a/b", None, StorageClass::Raw).await;
        assert!(outcome.succeeded());
        assert_eq!(store.destroys.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failures_are_absorbed() {
        let store = RecordingStore {
            fail_destroy: true,
            ..Default::default()
        };
        let outcome = destroy_best_effort(&store, "a/b", None, StorageClass::Raw).await;
        assert_eq!(outcome, RemoteCleanup::Failed);
        assert_eq!(store.destroys.lock().unwrap().len(), 2);
    }
}
