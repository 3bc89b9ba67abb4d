//! HTTP client module
//!
//! Single-request plumbing used by the paginated fetcher. Requests are
//! issued one at a time and a non-2xx response is always an error.

mod client;

pub use client::{
    HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig, DEFAULT_BASE_URL,
};
