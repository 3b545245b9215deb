// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ItunesError>;

#[derive(Debug, Error)]
pub enum ItunesError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("received 429 Too Many Requests with no valid Retry-After header")]
    RateLimited,

    #[error("exceeded maximum retries ({attempts}) for rate-limited requests")]
    RetriesExhausted { attempts: u32 },

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("error decoding API response: {0}")]
    Decode(String),

    #[error("error decoding API response: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ItunesError {
    /// True for both flavours of upstream throttling.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited | Self::RetriesExhausted { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited | Self::RetriesExhausted { .. } => Some(429),
            Self::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Requested identifiers or store URLs the lookup endpoint returned nothing for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotFoundError {
    pub missing_ids: Vec<i64>,
    pub missing_urls: Vec<String>,
}

impl NotFoundError {
    pub fn is_empty(&self) -> bool {
        self.missing_ids.is_empty() && self.missing_urls.is_empty()
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.missing_urls.is_empty() {
            write!(f, "the following URLs were not found: {:?}", self.missing_urls)
        } else {
            write!(f, "the following IDs were not found: {:?}", self.missing_ids)
        }
    }
}

impl std::error::Error for NotFoundError {}
