//! Backend access layer: base URL resolution, failure classification and
//! retry with exponential backoff.

mod base_url;
mod client;
mod error;
mod retry;

pub use base_url::{
    ALLOWED_BACKEND_HOSTS, DEFAULT_API_BASE_URL, join_url, path_with_segment, resolve_base_url,
};
pub use client::{ApiClient, ClientConfig, DEFAULT_ORIGIN};
pub use error::{ApiError, ErrorCode, Failure, classify};
pub use retry::{
    DEFAULT_RETRIES, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT, RequestOptions, RequestPolicy,
    backoff_delay, with_retry, with_retry_using,
};
