// SPDX-License-Identifier: GPL-3.0-or-later

//! iTunes Search API client.
//!
//! Provides search and batched lookup against the public iTunes Search API
//! with a shared token-bucket rate limiter, automatic retry of HTTP 429
//! responses that carry `Retry-After`, JSONP unwrapping, and reconciliation
//! of track IDs the lookup endpoint silently drops.

pub mod app_store;
pub mod batch;
pub mod chunk;
pub mod client;
pub mod decoder;
pub mod error;
pub mod logger;
pub mod models;
pub mod query;
pub mod rate_limiter;

pub use app_store::AppStoreUrl;
pub use client::{ItunesClient, ItunesClientBuilder};
pub use error::{ItunesError, NotFoundError, Result};
pub use logger::{RequestLogger, TracingLogger};
pub use models::{
    ContentResponse, ContentResult, LookupOutcome, LookupRequest, LookupSelector, PartialLookup,
    SearchRequest,
};
pub use rate_limiter::TokenBucket;
pub use tokio_util::sync::CancellationToken;
