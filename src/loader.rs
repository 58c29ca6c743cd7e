#![cfg(feature = "web")]

use crate::dataset::StudentsDataset;
use reqwest::Url;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Location of the data file when none is configured.
pub const DEFAULT_DATA_URL: &str = "/data/students_65_67.json";

/// Why the dataset could not be loaded.
///
/// Every variant renders as a single human-readable line; the page shows
/// it verbatim in the error banner.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("โหลดข้อมูลไม่สำเร็จ: {0}")]
    Request(#[from] reqwest::Error),

    #[error("โหลดข้อมูลไม่สำเร็จ: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("โหลดข้อมูลไม่สำเร็จ: อ่านไฟล์ {} ไม่ได้: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("โหลดข้อมูลไม่สำเร็จ: รูปแบบ JSON ไม่ถูกต้อง: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("โหลดข้อมูลไม่สำเร็จ: ที่อยู่ข้อมูลไม่ถูกต้อง: {0}")]
    InvalidLocation(String),
}

/// Where the dataset is read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    Remote(Url),
    File(PathBuf),
}

impl DataSource {
    /// Interprets a configured data location.
    ///
    /// * absolute `http`/`https` URLs are fetched as-is
    /// * `file://` URLs and plain paths are read from disk
    /// * paths starting with `/` are resolved against `base`, the address
    ///   the dashboard itself is served from
    ///
    /// # Examples
    /// ```
    /// use enrollment_dashboard::loader::DataSource;
    /// use reqwest::Url;
    ///
    /// let base = Url::parse("http://127.0.0.1:3000").unwrap();
    /// let source = DataSource::resolve("/data/students_65_67.json", &base).unwrap();
    /// assert_eq!(
    ///     source,
    ///     DataSource::Remote(Url::parse("http://127.0.0.1:3000/data/students_65_67.json").unwrap())
    /// );
    /// ```
    pub fn resolve(location: &str, base: &Url) -> Result<Self, LoadError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(LoadError::InvalidLocation("(empty)".to_string()));
        }

        if let Ok(url) = Url::parse(location) {
            return match url.scheme() {
                "http" | "https" => Ok(DataSource::Remote(url)),
                "file" => url
                    .to_file_path()
                    .map(DataSource::File)
                    .map_err(|_| LoadError::InvalidLocation(location.to_string())),
                _ => Err(LoadError::InvalidLocation(location.to_string())),
            };
        }

        if location.starts_with('/') {
            return base
                .join(location)
                .map(DataSource::Remote)
                .map_err(|_| LoadError::InvalidLocation(location.to_string()));
        }

        Ok(DataSource::File(PathBuf::from(location)))
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Remote(url) => write!(f, "{}", url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Parses a dataset document.
pub fn parse_dataset(bytes: &[u8]) -> Result<StudentsDataset, LoadError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Fetches the dataset over HTTP.
///
/// The request asks every cache on the way to revalidate. There is no
/// retry and no timeout; a non-2xx answer becomes [`LoadError::Status`].
pub async fn load(url: &Url) -> Result<StudentsDataset, LoadError> {
    let client = reqwest::Client::new();
    let resp = client
        .get(url.clone())
        .header(CACHE_CONTROL, "no-cache, no-store")
        .header(PRAGMA, "no-cache")
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    let body = resp.bytes().await?;
    parse_dataset(&body)
}

/// Reads the dataset from a local file.
pub async fn load_file(path: impl AsRef<Path>) -> Result<StudentsDataset, LoadError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dataset(&bytes)
}

pub async fn load_source(source: &DataSource) -> Result<StudentsDataset, LoadError> {
    match source {
        DataSource::Remote(url) => load(url).await,
        DataSource::File(path) => load_file(path).await,
    }
}
