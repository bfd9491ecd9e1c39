//! Settings for the Finance Service client.

use std::{path::PathBuf, time::Duration};

use reqwest::Url;

use crate::{CacheConfig, Error, timezone::get_local_offset};

/// The API URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// The default location of the stored credentials, relative to the working directory.
pub const DEFAULT_CREDENTIALS_PATH: &str = ".finboard/credentials.json";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to talk to the Finance Service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The base URL that endpoint paths are appended to, without a trailing slash.
    api_url: String,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// Where the session token is stored between runs.
    pub credentials_path: PathBuf,

    /// How long cached query results are considered fresh and kept around.
    pub cache: CacheConfig,

    /// How long to wait for the Finance Service before giving up on a request.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Create a config for the Finance Service at `api_url`.
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns [Error::InvalidBaseUrl] if `api_url` is not an absolute http(s) URL, or
    /// [Error::InvalidTimezone] if `local_timezone` is not a known timezone.
    pub fn new(api_url: &str, local_timezone: &str) -> Result<Self, Error> {
        let parsed = Url::parse(api_url).map_err(|_| Error::InvalidBaseUrl(api_url.to_owned()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidBaseUrl(api_url.to_owned()));
        }

        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezone(local_timezone.to_owned()));
        }

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_owned(),
            local_timezone: local_timezone.to_owned(),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            cache: CacheConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Replace where credentials are stored.
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    /// Replace the cache timings.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// The base URL of the Finance Service, without a trailing slash.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// The full URL for an endpoint path such as `/transactions`.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}
